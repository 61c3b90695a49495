//! BER-TLV Encoder
//!
//! Encodes tag-value pairs to bytes. The decoders use it to rebuild the
//! `06 LL` header of tag-less OID values; tests use [`TLVBuilder`] to
//! assemble GET DATA fixtures.

/// TLV Encoder for building BER-TLV structures
pub struct TLVEncoder;

impl TLVEncoder {
    /// Encode a tag-value pair to bytes
    pub fn encode(tag: u32, value: &[u8]) -> Vec<u8> {
        let mut result = Self::encode_tag(tag);
        result.extend(Self::encode_length(value.len()));
        result.extend_from_slice(value);
        result
    }

    /// Encode just the tag bytes
    pub fn encode_tag(tag: u32) -> Vec<u8> {
        if tag > 0xFFFF {
            vec![(tag >> 16) as u8, (tag >> 8) as u8, tag as u8]
        } else if tag > 0xFF {
            vec![(tag >> 8) as u8, tag as u8]
        } else {
            vec![tag as u8]
        }
    }

    /// Encode just the length bytes
    pub fn encode_length(length: usize) -> Vec<u8> {
        if length < 0x80 {
            vec![length as u8]
        } else if length <= 0xFF {
            vec![0x81, length as u8]
        } else if length <= 0xFFFF {
            vec![0x82, (length >> 8) as u8, length as u8]
        } else if length <= 0xFF_FFFF {
            vec![0x83, (length >> 16) as u8, (length >> 8) as u8, length as u8]
        } else {
            vec![
                0x84,
                (length >> 24) as u8,
                (length >> 16) as u8,
                (length >> 8) as u8,
                length as u8,
            ]
        }
    }
}

/// Builder for constructing nested TLV structures
pub struct TLVBuilder {
    data: Vec<u8>,
}

impl TLVBuilder {
    /// Create a new TLV builder
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Add a primitive TLV
    pub fn add(mut self, tag: u32, value: &[u8]) -> Self {
        self.data.extend(TLVEncoder::encode(tag, value));
        self
    }

    /// Add raw bytes (pre-encoded TLV)
    pub fn add_raw(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    /// Wrap current content in a constructed tag
    pub fn wrap(self, tag: u32) -> Self {
        Self {
            data: TLVEncoder::encode(tag, &self.data),
        }
    }

    /// Build the final byte vector
    pub fn build(self) -> Vec<u8> {
        self.data
    }

    /// Get current length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for TLVBuilder {
    fn default() -> Self {
        Self::new()
    }
}
