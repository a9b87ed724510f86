//! The three merchant/acquirer document families, version 3.3.1.

pub mod builder;
pub mod extractor;

pub use builder::{CanonicalDocument, MessageBuilder, format_amount, format_timestamp};
