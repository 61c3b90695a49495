//! APDU (Application Protocol Data Unit) handling
//!
//! Command encoding for the GET DATA requests issued against a security
//! domain, plus the response and status word types they come back with.
//!
//! # Example
//! ```ignore
//! use gp_carddata::apdu::{APDU, cla, ins};
//!
//! let cmd = APDU::get_data(cla::GP, 0x9F, 0x7F);
//! assert_eq!(cmd.to_bytes(), vec![0x80, 0xCA, 0x9F, 0x7F, 0x00]);
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::{sw_to_string, SW};

use thiserror::Error;

/// Errors that can occur while parsing responses
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum APDUError {
    #[error("Response too short: expected at least 2 status bytes, got {0}")]
    ResponseTooShort(usize),
}

/// A command APDU
///
/// # Fields
/// - `cla`: Class byte (GlobalPlatform proprietary 0x80 or ISO 0x00)
/// - `ins`: Instruction byte
/// - `p1`, `p2`: Parameter bytes (the object tag for GET DATA)
/// - `data`: Command data (may be empty)
/// - `le`: Expected response length, 1 to 256 (None if not specified)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    pub le: Option<u32>,
}

impl APDU {
    /// Create a new APDU with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// GET DATA for the object addressed by P1/P2, asking for up to 256 bytes
    pub fn get_data(cla: u8, p1: u8, p2: u8) -> Self {
        Self {
            le: Some(GET_DATA_LE),
            ..Self::new(cla, ins::GET_DATA, p1, p2)
        }
    }

    /// Get P1-P2 combined as a u16
    pub fn p1p2(&self) -> u16 {
        ((self.p1 as u16) << 8) | (self.p2 as u16)
    }

    /// Encode for transmission as a short APDU.
    ///
    /// GET DATA never carries more than 255 bytes of data nor asks for more
    /// than 256, so the extended form is not needed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.cla, self.ins, self.p1, self.p2];
        if !self.data.is_empty() {
            out.push(self.data.len() as u8);
            out.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            // 256 wraps to 00
            out.push(le as u8);
        }
        out
    }
}

/// Expected length requested by every GET DATA issued here
pub const GET_DATA_LE: u32 = 256;

/// Class bytes
pub mod cla {
    /// ISO 7816 inter-industry class
    pub const ISO7816: u8 = 0x00;
    /// GlobalPlatform proprietary class
    pub const GP: u8 = 0x80;
}

/// Instruction bytes
pub mod ins {
    pub const GET_DATA: u8 = 0xCA;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_encoding() {
        let cmd = APDU::get_data(cla::GP, 0x9F, 0x7F);
        assert_eq!(cmd.to_bytes(), vec![0x80, 0xCA, 0x9F, 0x7F, 0x00]);
        assert_eq!(cmd.p1p2(), crate::tlv::tags::CPLC);
    }

    #[test]
    fn test_encode_without_le() {
        let mut cmd = APDU::get_data(cla::ISO7816, 0x00, 0x66);
        cmd.le = None;
        assert_eq!(cmd.to_bytes(), vec![0x00, 0xCA, 0x00, 0x66]);
        cmd.le = Some(0x20);
        assert_eq!(cmd.to_bytes(), vec![0x00, 0xCA, 0x00, 0x66, 0x20]);
    }

    #[test]
    fn test_encode_with_data() {
        let mut cmd = APDU::new(cla::GP, ins::GET_DATA, 0x00, 0xE0);
        cmd.data = vec![0x5C, 0x01, 0xC0];
        assert_eq!(cmd.to_bytes(), hex::decode("80CA00E0035C01C0").unwrap());
    }
}
