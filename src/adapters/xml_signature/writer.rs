//! XML writer that never produces empty-element tags.
//!
//! Digests and signatures are computed over serialized bytes, and the acquirer
//! expects `<Transform Algorithm=".."></Transform>` rather than
//! `<Transform Algorithm=".."/>`. Everything that ends up under a digest or a
//! signature goes through [`CanonicalWriter`].

use quick_xml::Reader;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("XML serialization failed: {0}")]
pub struct WriteError(pub String);

pub type WriteResult<T> = Result<T, WriteError>;

/// Serializer emitting explicit open/close pairs for every element.
///
/// Text is escaped like exclusive C14N renders text nodes (`&`, `<`, `>`), and
/// nothing is indented.
pub struct CanonicalWriter {
    writer: quick_xml::Writer<Vec<u8>>,
}

impl Default for CanonicalWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self {
            writer: quick_xml::Writer::new(Vec::new()),
        }
    }

    /// Write `<name attr="..">`
    pub fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> WriteResult<&mut Self> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.emit(Event::Start(start))?;
        Ok(self)
    }

    /// Write `</name>`
    pub fn close(&mut self, name: &str) -> WriteResult<&mut Self> {
        self.emit(Event::End(BytesEnd::new(name)))?;
        Ok(self)
    }

    /// Write `<name attr="..">text</name>`, also when `text` is empty
    pub fn element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> WriteResult<&mut Self> {
        self.open(name, attributes)?;
        self.emit(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        self.close(name)
    }

    /// Write `<name>text</name>`
    pub fn leaf(&mut self, name: &str, text: &str) -> WriteResult<&mut Self> {
        self.element(name, &[], text)
    }

    /// Write a parsed event, splitting an empty-element tag into an open/close pair
    pub fn write_event(&mut self, event: Event<'_>) -> WriteResult<()> {
        match event {
            Event::Empty(start) => {
                let end = start.to_end().into_owned();
                let content = std::str::from_utf8(&start)
                    .map_err(|e| WriteError(format!("Element is not UTF-8: {e}")))?;
                let name_len = start.name().as_ref().len();
                let start = BytesStart::from_content(content.trim_end().to_string(), name_len);

                self.emit(Event::Start(start))?;
                self.emit(Event::End(end))
            }
            other => self.emit(other),
        }
    }

    pub fn into_string(self) -> WriteResult<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| WriteError(format!("Output is not UTF-8: {e}")))
    }

    fn emit(&mut self, event: Event<'_>) -> WriteResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| WriteError(e.to_string()))
    }
}

/// Re-serialize `fragment`, turning every `<x .../>` into `<x ...></x>`.
///
/// Text, attributes and whitespace are copied through unchanged.
pub fn expand_empty_elements(fragment: &str) -> WriteResult<String> {
    let mut reader = Reader::from_str(fragment);
    let mut writer = CanonicalWriter::new();

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => {
                return Err(WriteError(format!(
                    "Cannot parse XML at position {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    writer.into_string()
}
