//! BER-TLV Parser
//!
//! Parses BER-TLV (Basic Encoding Rules - Tag Length Value) structures as
//! returned by GET DATA on a GlobalPlatform security domain. Unlike a
//! best-effort reader, every malformed element is reported: the decoders
//! built on top never see a half-parsed tree.

use thiserror::Error;

/// Errors that can occur during TLV parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TLVError {
    #[error("Unexpected end of data while parsing tag at offset {0}")]
    UnexpectedEndTag(usize),

    #[error("Unexpected end of data while parsing length at offset {0}")]
    UnexpectedEndLength(usize),

    #[error("Value at offset {offset} needs {needed} bytes but only {available} remain")]
    UnexpectedEndValue {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Read past end of buffer at offset {offset} (buffer is {len} bytes)")]
    Truncated { offset: usize, len: usize },

    #[error("Tag 0x{tag:02X} not found after offset {start}")]
    TagNotFound { tag: u8, start: usize },

    #[error("Indefinite length encoding not supported")]
    IndefiniteLength,

    #[error("Length too large: {0} length bytes")]
    LengthTooLarge(usize),

    #[error("Constructed tags nested too deeply at offset {0}")]
    TooDeep(usize),
}

/// Deepest nesting of constructed tags accepted by [`parse`]
pub const MAX_DEPTH: usize = 32;

/// A TLV (Tag-Length-Value) structure
///
/// - `tag`: The tag value (stored as u32 to support 1-3 byte tags)
/// - `value`: The actual data bytes
/// - `subs`: Child TLVs for constructed data objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TLV {
    /// The tag (1-3 bytes encoded as u32)
    pub tag: u32,
    /// The raw value bytes
    pub value: Vec<u8>,
    /// Child TLVs if this is a constructed tag
    pub subs: Vec<TLV>,
}

impl TLV {
    /// Create a new primitive TLV
    pub fn new(tag: u32, value: Vec<u8>) -> Self {
        Self {
            tag,
            value,
            subs: Vec::new(),
        }
    }

    /// Check if this is a constructed (container) tag based on the tag bits
    pub fn is_constructed(&self) -> bool {
        is_constructed_tag(self.tag)
    }

    /// Recursively search for a tag (depth-first), starting with `self`
    pub fn find(&self, tag: u32) -> Option<&TLV> {
        if self.tag == tag {
            return Some(self);
        }
        self.subs.iter().find_map(|child| child.find(tag))
    }

    /// Find a direct child by tag (non-recursive)
    pub fn find_child(&self, tag: u32) -> Option<&TLV> {
        self.subs.iter().find(|c| c.tag == tag)
    }

    /// All direct children carrying `tag`, in encounter order
    pub fn children_with(&self, tag: u32) -> impl Iterator<Item = &TLV> {
        self.subs.iter().filter(move |c| c.tag == tag)
    }

    /// Value interpreted as a big-endian unsigned integer.
    ///
    /// Only the trailing four bytes contribute; longer values wrap the same
    /// way a `u32` shift register would.
    pub fn int_value(&self) -> u32 {
        self.value
            .iter()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
    }
}

/// Search a list of sibling trees for `tag`, depth-first
pub fn find_in(tlvs: &[TLV], tag: u32) -> Option<&TLV> {
    tlvs.iter().find_map(|t| t.find(tag))
}

/// Parse every TLV in `data`, descending into constructed tags.
///
/// Filler bytes (0x00, 0xFF) between elements are skipped, as ISO 7816-4
/// allows. Any truncated tag, length or value fails the whole parse, as
/// does nesting beyond [`MAX_DEPTH`].
pub fn parse(data: &[u8]) -> Result<Vec<TLV>, TLVError> {
    parse_at(data, 0, 0)
}

fn parse_at(data: &[u8], base: usize, depth: usize) -> Result<Vec<TLV>, TLVError> {
    let mut result = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        if data[offset] == 0x00 || data[offset] == 0xFF {
            offset += 1;
            continue;
        }
        let (tlv, consumed) = read_single_at(&data[offset..], base + offset, depth)?;
        result.push(tlv);
        offset += consumed;
    }

    Ok(result)
}

/// Parse a single TLV from the start of `data`.
///
/// Returns the TLV and the number of bytes it occupied.
pub fn read_single(data: &[u8]) -> Result<(TLV, usize), TLVError> {
    read_single_at(data, 0, 0)
}

fn read_single_at(data: &[u8], base: usize, depth: usize) -> Result<(TLV, usize), TLVError> {
    let mut offset = 0;

    let (tag, tag_len) = parse_tag(data, base)?;
    offset += tag_len;

    let (length, len_len) = parse_length(&data[offset..], base + offset)?;
    offset += len_len;

    let available = data.len() - offset;
    if length > available {
        return Err(TLVError::UnexpectedEndValue {
            offset: base + offset,
            needed: length,
            available,
        });
    }
    let value = data[offset..offset + length].to_vec();

    let subs = if is_constructed_tag(tag) && !value.is_empty() {
        if depth >= MAX_DEPTH {
            return Err(TLVError::TooDeep(base));
        }
        parse_at(&value, base + offset, depth + 1)?
    } else {
        Vec::new()
    };
    offset += length;

    Ok((TLV { tag, value, subs }, offset))
}

/// Check the constructed bit of the leading tag byte
pub fn is_constructed_tag(tag: u32) -> bool {
    let first_byte = if tag > 0xFFFF {
        (tag >> 16) & 0xFF
    } else if tag > 0xFF {
        (tag >> 8) & 0xFF
    } else {
        tag & 0xFF
    };
    (first_byte & 0x20) != 0
}

/// Parse a BER tag (1-3 bytes)
fn parse_tag(data: &[u8], base: usize) -> Result<(u32, usize), TLVError> {
    let first = *data.first().ok_or(TLVError::UnexpectedEndTag(base))?;

    // Low 5 bits all set means the tag number continues
    if (first & 0x1F) != 0x1F {
        return Ok((first as u32, 1));
    }

    let second = *data.get(1).ok_or(TLVError::UnexpectedEndTag(base + 1))?;
    if (second & 0x80) == 0 {
        return Ok((((first as u32) << 8) | (second as u32), 2));
    }

    let third = *data.get(2).ok_or(TLVError::UnexpectedEndTag(base + 2))?;
    let tag = ((first as u32) << 16) | ((second as u32) << 8) | (third as u32);
    Ok((tag, 3))
}

/// Parse a BER length (1-5 bytes)
fn parse_length(data: &[u8], base: usize) -> Result<(usize, usize), TLVError> {
    let first = *data.first().ok_or(TLVError::UnexpectedEndLength(base))?;

    // Short form (0-127)
    if (first & 0x80) == 0 {
        return Ok((first as usize, 1));
    }

    let num_bytes = (first & 0x7F) as usize;
    if num_bytes == 0 {
        return Err(TLVError::IndefiniteLength);
    }
    if num_bytes > 4 {
        return Err(TLVError::LengthTooLarge(num_bytes));
    }
    if data.len() < 1 + num_bytes {
        return Err(TLVError::UnexpectedEndLength(base + data.len()));
    }

    let length = data[1..=num_bytes]
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | (*b as usize));
    Ok((length, 1 + num_bytes))
}
