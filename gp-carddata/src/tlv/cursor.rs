//! Offset-based TLV cursor
//!
//! Stateless primitives over a borrowed buffer for the simple layouts found
//! in GlobalPlatform responses: one tag byte, one length byte (0-255), then
//! the value. Nothing here allocates; every read is bounds checked and a
//! read past the end is a [`TLVError::Truncated`].

use super::TLVError;

fn byte_at(data: &[u8], offset: usize) -> Result<u8, TLVError> {
    data.get(offset).copied().ok_or(TLVError::Truncated {
        offset,
        len: data.len(),
    })
}

/// `offset + n`, an offset past `usize::MAX` being as unreadable as any
/// other beyond the buffer
fn advance(data: &[u8], offset: usize, n: usize) -> Result<usize, TLVError> {
    offset.checked_add(n).ok_or(TLVError::Truncated {
        offset,
        len: data.len(),
    })
}

/// Read the tag byte at `offset`
pub fn tag_at(data: &[u8], offset: usize) -> Result<u8, TLVError> {
    byte_at(data, offset)
}

/// Read the single length byte that follows the tag at `offset`
pub fn length_at(data: &[u8], offset: usize) -> Result<usize, TLVError> {
    byte_at(data, advance(data, offset, 1)?).map(usize::from)
}

/// Value slice of the element at `offset`
pub fn value_at(data: &[u8], offset: usize) -> Result<&[u8], TLVError> {
    let len = length_at(data, offset)?;
    let start = advance(data, offset, 2)?;
    let end = advance(data, start, len)?;
    data.get(start..end).ok_or(TLVError::Truncated {
        offset: end,
        len: data.len(),
    })
}

/// The complete tag+length+value slice of the element at `offset`
pub fn tlv_at(data: &[u8], offset: usize) -> Result<&[u8], TLVError> {
    let len = length_at(data, offset)?;
    let end = advance(data, offset, 2 + len)?;
    data.get(offset..end).ok_or(TLVError::Truncated {
        offset: end,
        len: data.len(),
    })
}

/// Offset of the sibling following the element at `offset`.
///
/// The returned offset may equal `data.len()` when the element is the last
/// one in the buffer.
pub fn skip(data: &[u8], offset: usize) -> Result<usize, TLVError> {
    Ok(offset + tlv_at(data, offset)?.len())
}

/// Scan siblings starting at `start` until one carries `tag`.
///
/// Running off the end of the buffer is [`TLVError::TagNotFound`]; a
/// sibling whose declared length overruns the buffer is
/// [`TLVError::Truncated`].
pub fn find_tag(data: &[u8], start: usize, tag: u8) -> Result<usize, TLVError> {
    let mut offset = start;
    while offset < data.len() {
        if data[offset] == tag {
            return Ok(offset);
        }
        offset = skip(data, offset)?;
    }
    Err(TLVError::TagNotFound { tag, start })
}
