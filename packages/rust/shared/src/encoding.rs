//! Text encodings for reading sources and writing the merged output.
//!
//! Labels follow the WHATWG Encoding Standard as implemented by `encoding_rs`,
//! with one addition: `ascii` / `us-ascii` resolve to a strict 7-bit encoding
//! (WHATWG maps those labels to windows-1252, which is not what users mean).

use encoding_rs::Encoding;

use crate::error::{MergeError, Result};

/// A resolved text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict 7-bit ASCII.
    Ascii,
    /// Any encoding known to `encoding_rs`.
    Whatwg(&'static Encoding),
}

impl TextEncoding {
    /// UTF-8, the default for both input and output.
    pub const UTF_8: Self = Self::Whatwg(encoding_rs::UTF_8);

    /// Resolve an encoding label for decoding input.
    pub fn for_label(label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        if normalized == "ascii" || normalized == "us-ascii" {
            return Ok(Self::Ascii);
        }
        Encoding::for_label(normalized.as_bytes())
            .map(Self::Whatwg)
            .ok_or_else(|| MergeError::config(format!("unknown encoding label '{label}'")))
    }

    /// Resolve an encoding label for encoding output.
    ///
    /// Rejects encodings `encoding_rs` cannot produce (UTF-16, `replacement`).
    pub fn for_output_label(label: &str) -> Result<Self> {
        let encoding = Self::for_label(label)?;
        if let Self::Whatwg(enc) = encoding {
            if enc.output_encoding() != enc {
                return Err(MergeError::config(format!(
                    "encoding '{label}' is not supported for output"
                )));
            }
        }
        Ok(encoding)
    }

    /// Canonical name (`UTF-8`, `windows-1252`, `ascii`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Whatwg(enc) => enc.name(),
        }
    }

    /// Strictly decode `bytes`, removing a matching byte-order mark.
    ///
    /// Returns `None` if any byte sequence is malformed for this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Ascii => {
                if bytes.is_ascii() {
                    String::from_utf8(bytes.to_vec()).ok()
                } else {
                    None
                }
            }
            Self::Whatwg(enc) => {
                let payload = match Encoding::for_bom(bytes) {
                    Some((bom_enc, bom_len)) if bom_enc == *enc => &bytes[bom_len..],
                    _ => bytes,
                };
                enc.decode_without_bom_handling_and_without_replacement(payload)
                    .map(|text| text.into_owned())
            }
        }
    }

    /// Encode `text`, failing if any character is unmappable.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Ascii => match text.char_indices().find(|(_, c)| !c.is_ascii()) {
                None => Ok(text.as_bytes().to_vec()),
                Some((offset, c)) => Err(MergeError::encode(
                    self.name(),
                    format!("character {c:?} at byte {offset}"),
                )),
            },
            Self::Whatwg(enc) => {
                let (bytes, _, had_unmappable) = enc.encode(text);
                if had_unmappable {
                    let offending = text
                        .chars()
                        .find(|c| {
                            let mut buf = [0u8; 4];
                            enc.encode(c.encode_utf8(&mut buf)).2
                        })
                        .map(|c| format!("character {c:?}"))
                        .unwrap_or_else(|| "unmappable character".to_string());
                    return Err(MergeError::encode(self.name(), offending));
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_labels_are_strict() {
        let ascii = TextEncoding::for_label("US-ASCII").unwrap();
        assert_eq!(ascii, TextEncoding::Ascii);
        assert_eq!(ascii.decode(b"plain"), Some("plain".to_string()));
        assert_eq!(ascii.decode("caf\u{e9}".as_bytes()), None);
        assert!(ascii.encode("caf\u{e9}").is_err());
    }

    #[test]
    fn utf8_decode_strips_bom_and_rejects_garbage() {
        let utf8 = TextEncoding::for_label("utf-8").unwrap();
        assert_eq!(utf8.decode(b"\xEF\xBB\xBF# Hi"), Some("# Hi".to_string()));
        assert_eq!(utf8.decode(b"bad \xFF byte"), None);
    }

    #[test]
    fn legacy_encoding_roundtrips_latin1_text() {
        let cp1252 = TextEncoding::for_label("windows-1252").unwrap();
        assert_eq!(cp1252.decode(b"caf\xE9"), Some("caf\u{e9}".to_string()));
        assert_eq!(cp1252.encode("caf\u{e9}").unwrap(), b"caf\xE9".to_vec());
        let err = cp1252.encode("\u{4e2d}").unwrap_err();
        assert!(err.to_string().contains("windows-1252"));
    }

    #[test]
    fn unknown_and_output_only_labels_rejected() {
        assert!(TextEncoding::for_label("klingon").is_err());
        assert!(TextEncoding::for_label("utf-16le").is_ok());
        assert!(TextEncoding::for_output_label("utf-16le").is_err());
    }
}
