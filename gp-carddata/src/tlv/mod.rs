//! TLV (Tag-Length-Value) encoding and decoding
//!
//! Two layers live here:
//!
//! - [`cursor`]: offset-based primitives over single-byte tags and lengths
//!   for flat layouts.
//! - [`parse`]: a strict BER-TLV tree parser (multi-byte tags and lengths)
//!   used by the GlobalPlatform decoders.
//!
//! # Example
//! ```ignore
//! use gp_carddata::tlv::{self, tags};
//!
//! let data = hex::decode("E006C00401018820").unwrap();
//! let tlvs = tlv::parse(&data).unwrap();
//! let keys = tlv::find_in(&tlvs, tags::KEY_INFO_TEMPLATE as u32).unwrap();
//! assert_eq!(keys.subs.len(), 1);
//! ```

pub mod cursor;
mod encoder;
mod parser;

pub use encoder::{TLVBuilder, TLVEncoder};
pub use parser::{find_in, is_constructed_tag, parse, read_single, TLVError, MAX_DEPTH, TLV};

/// Convert a byte slice to an uppercase hex string without separators
pub fn hexify(value: &[u8]) -> String {
    hex::encode_upper(value)
}

/// GlobalPlatform tag constants
pub mod tags {
    // GET DATA objects
    pub const CPLC: u16 = 0x9F7F;
    pub const IIN: u16 = 0x0042;
    pub const CIN: u16 = 0x0045;
    pub const CARD_DATA: u8 = 0x66;
    pub const CARD_CAPABILITIES: u8 = 0x67;
    pub const KEY_INFO_TEMPLATE: u8 = 0xE0;

    // Card Data
    pub const CARD_RECOGNITION_DATA: u8 = 0x73;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;

    // Key Information Template
    pub const KEY_INFO_DATA: u8 = 0xC0;

    // Card Capabilities
    pub const SCP_INFORMATION: u8 = 0xA0;
    pub const SCP_IDENTIFIER: u8 = 0x80;
    pub const SCP_OPTIONS: u8 = 0x81;
    pub const SCP_KEY_LENGTHS: u8 = 0x82;
    pub const SD_PRIVILEGES: u8 = 0x81;
    pub const APP_PRIVILEGES: u8 = 0x82;
}
