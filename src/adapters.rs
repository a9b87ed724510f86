pub mod http;
pub mod messages;
pub mod xml_signature;
