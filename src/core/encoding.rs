//! Output encodings
//!
//! Serialized XML is produced as UTF-8 text; this module converts it to
//! the byte encoding requested for output, and decodes input files back to
//! text by byte order mark or declared encoding.

use crate::core::error::{XmlError, XmlResult};

/// Supported output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8
    Utf8,
    /// 7-bit US-ASCII
    Ascii,
    /// ISO-8859-1 (Latin-1)
    Latin1,
    /// UTF-16 without an explicit byte order; written big endian
    Utf16,
    /// UTF-16, little endian
    Utf16Le,
    /// UTF-16, big endian
    Utf16Be,
}

impl Encoding {
    /// Look up an encoding by its label, case-insensitively
    pub fn for_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "us-ascii" | "ascii" => Some(Encoding::Ascii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Some(Encoding::Latin1),
            "utf-16" | "utf16" => Some(Encoding::Utf16),
            "utf-16le" => Some(Encoding::Utf16Le),
            "utf-16be" => Some(Encoding::Utf16Be),
            _ => None,
        }
    }

    /// Canonical label
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Ascii => "US-ASCII",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Utf16 => "UTF-16",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
        }
    }

    /// Whether `self` and `other` produce the same bytes
    pub fn same_as(&self, other: Encoding) -> bool {
        let canonical = |e: Encoding| match e {
            Encoding::Utf16 => Encoding::Utf16Be,
            e => e,
        };
        canonical(*self) == canonical(other)
    }

    /// Encode `text`, failing on characters the encoding cannot represent
    ///
    /// UTF-16 output always starts with a byte order mark.
    pub fn encode(&self, text: &str) -> XmlResult<Vec<u8>> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => Self::encode_single_byte(text, 0x7F, self.label()),
            Encoding::Latin1 => Self::encode_single_byte(text, 0xFF, self.label()),
            Encoding::Utf16 | Encoding::Utf16Be => Ok(std::iter::once(BOM)
                .chain(text.encode_utf16())
                .flat_map(u16::to_be_bytes)
                .collect()),
            Encoding::Utf16Le => Ok(std::iter::once(BOM)
                .chain(text.encode_utf16())
                .flat_map(u16::to_le_bytes)
                .collect()),
        }
    }

    /// Decode `bytes` to text, dropping a leading byte order mark
    pub fn decode(&self, bytes: &[u8]) -> XmlResult<String> {
        let text = match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| XmlError::Encoding(format!("invalid UTF-8 input: {}", e)))?,
            Encoding::Ascii => bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        Ok(b as char)
                    } else {
                        Err(XmlError::Encoding(format!(
                            "byte 0x{:02X} is not valid US-ASCII",
                            b
                        )))
                    }
                })
                .collect::<XmlResult<String>>()?,
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Utf16 | Encoding::Utf16Be => Self::decode_utf16(bytes, u16::from_be_bytes)?,
            Encoding::Utf16Le => Self::decode_utf16(bytes, u16::from_le_bytes)?,
        };
        Ok(match text.strip_prefix('\u{FEFF}') {
            Some(rest) => rest.to_string(),
            None => text,
        })
    }

    /// Work out the encoding of an XML byte stream
    ///
    /// A byte order mark wins, then the UTF-16 pattern of `<?`, then the
    /// `encoding` of the XML declaration. Anything else is UTF-8.
    pub fn sniff(bytes: &[u8]) -> XmlResult<Self> {
        match bytes {
            [0xEF, 0xBB, 0xBF, ..] => return Ok(Encoding::Utf8),
            [0xFE, 0xFF, ..] | [0x00, b'<', 0x00, b'?', ..] => return Ok(Encoding::Utf16Be),
            [0xFF, 0xFE, ..] | [b'<', 0x00, b'?', 0x00, ..] => return Ok(Encoding::Utf16Le),
            _ => {}
        }

        let Some(label) = declared_encoding(bytes) else {
            return Ok(Encoding::Utf8);
        };
        match Encoding::for_label(&label) {
            // Without a byte order mark the input is single-byte compatible
            Some(Encoding::Utf16 | Encoding::Utf16Le | Encoding::Utf16Be) => Ok(Encoding::Utf8),
            Some(encoding) => Ok(encoding),
            None => Err(XmlError::Encoding(format!("Unsupported encoding '{}'", label))),
        }
    }

    fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> XmlResult<String> {
        if bytes.len() % 2 != 0 {
            return Err(XmlError::Encoding(
                "UTF-16 input has an odd number of bytes".to_string(),
            ));
        }
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| unit([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units)
            .map_err(|e| XmlError::Encoding(format!("invalid UTF-16 input: {}", e)))
    }

    fn encode_single_byte(text: &str, max: u32, label: &str) -> XmlResult<Vec<u8>> {
        text.chars()
            .map(|ch| {
                let code = ch as u32;
                if code <= max {
                    Ok(code as u8)
                } else {
                    Err(XmlError::Encoding(format!(
                        "character {:?} (U+{:04X}) cannot be represented in {}",
                        ch, code, label
                    )))
                }
            })
            .collect()
    }
}

/// Byte order mark
const BOM: u16 = 0xFEFF;

// `encoding` pseudo-attribute of a leading XML declaration, read as ASCII
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = bytes.strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let (_, rest) = decl.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| value[..end].to_string())
}

/// Decode an XML byte stream to text, see [`Encoding::sniff`]
pub fn decode(bytes: &[u8]) -> XmlResult<String> {
    Encoding::sniff(bytes)?.decode(bytes)
}

/// Encode `text` using the encoding named by `label`
pub fn encode(text: &str, label: &str) -> XmlResult<Vec<u8>> {
    let encoding = Encoding::for_label(label)
        .ok_or_else(|| XmlError::Encoding(format!("Unsupported encoding '{}'", label)))?;
    encoding.encode(text)
}
