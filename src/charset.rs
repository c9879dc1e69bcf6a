//! Named character encodings for reading and writing resources.

use crate::errors::ProfileError;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fmt;
use std::io;

/// A character encoding resolved from a WHATWG label such as `utf-8`,
/// `latin1` or `utf-16le`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Default for Charset {
    fn default() -> Self {
        Charset(UTF_8)
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Charset {
    /// Resolves a charset label, case-insensitively.
    pub fn for_label(label: &str) -> Result<Self, ProfileError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Charset)
            .ok_or_else(|| ProfileError::UnsupportedCharset(label.to_string()))
    }

    /// The canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Decodes `bytes` strictly; malformed input is an `InvalidData` error
    /// rather than being replaced with U+FFFD.
    ///
    /// A byte order mark is kept as a leading U+FEFF so that writing the
    /// text back reproduces it.
    pub fn decode(&self, bytes: &[u8]) -> io::Result<String> {
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("content is not valid {}", self.name()),
                )
            })
    }

    /// Encodes `text`, failing if a character has no mapping in this charset.
    pub fn encode(&self, text: &str) -> io::Result<Vec<u8>> {
        // encoding_rs only encodes UTF-16 as UTF-8, so these two are done by hand.
        if self.0 == UTF_16LE {
            return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
        }
        if self.0 == UTF_16BE {
            return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
        }

        let (bytes, _, unmappable) = self.0.encode(text);
        if unmappable {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("text contains characters not representable in {}", self.name()),
            ));
        }
        Ok(bytes.into_owned())
    }
}
