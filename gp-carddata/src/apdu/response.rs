//! APDU Response handling
//!
//! A Response contains data bytes plus SW1/SW2 status words.

use super::status::SW;
use super::APDUError;

/// A smartcard response
///
/// # Example
/// ```ignore
/// let response = Response::from_bytes(&[0x01, 0x02, 0x90, 0x00]).unwrap();
/// assert!(response.is_success());
/// assert_eq!(response.data, vec![0x01, 0x02]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response data (without status words)
    pub data: Vec<u8>,
    /// Status word 1 (SW1)
    pub sw1: u8,
    /// Status word 2 (SW2)
    pub sw2: u8,
}

impl Response {
    /// Create a new response with data and status word
    pub fn new(data: Vec<u8>, sw: u16) -> Self {
        Self {
            data,
            sw1: (sw >> 8) as u8,
            sw2: sw as u8,
        }
    }

    /// Create a success response (0x9000) with data
    pub fn success(data: Vec<u8>) -> Self {
        Self::new(data, SW::SUCCESS)
    }

    /// Create an error response (no data)
    pub fn error(sw: u16) -> Self {
        Self::new(Vec::new(), sw)
    }

    /// Split raw card output into data and the trailing SW1 SW2
    pub fn from_bytes(raw: &[u8]) -> Result<Self, APDUError> {
        match raw {
            [data @ .., sw1, sw2] => Ok(Self {
                data: data.to_vec(),
                sw1: *sw1,
                sw2: *sw2,
            }),
            _ => Err(APDUError::ResponseTooShort(raw.len())),
        }
    }

    /// Exactly 0x9000. GET DATA does not chain, so 61xx is not treated as
    /// success here.
    pub fn is_success(&self) -> bool {
        self.sw() == SW::SUCCESS
    }

    /// Get the combined status word as u16
    pub fn sw(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Convert to raw bytes (data + SW1 + SW2)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.data.len() + 2);
        result.extend_from_slice(&self.data);
        result.push(self.sw1);
        result.push(self.sw2);
        result
    }
}

impl From<u16> for Response {
    /// Create an error response from a status word
    fn from(sw: u16) -> Self {
        Self::error(sw)
    }
}
