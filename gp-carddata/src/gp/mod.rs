//! GlobalPlatform data object decoders
//!
//! Pure functions from GET DATA payloads to structured records:
//!
//! - [`cplc`]: Card Production Life Cycle (tag 9F7F)
//! - [`card_data`]: Card Data / Card Recognition Data OIDs (tag 66)
//! - [`capabilities`]: Card Capabilities (tag 67)
//! - [`keys`]: Key Information Template (tag E0)
//! - [`privileges`]: privilege bitmasks referenced by the capabilities
//!
//! Absence of an optional object is `Ok(None)` (or an empty list);
//! malformed input is always a [`GPDataError`].

pub mod capabilities;
pub mod card_data;
pub mod cplc;
pub mod keys;
pub mod privileges;

pub use capabilities::{Capability, CardCapabilities, ScpCapability};
pub use card_data::{oid_to_string, oid_to_version, CardData, CardDataEntry, GPSpec, OidClass};
pub use cplc::{Cplc, CplcField};
pub use keys::{key_template_list, KeyInfo, KeyTemplate, KeyType};
pub use privileges::{Privilege, Privileges};

use thiserror::Error;

use crate::card::TransportError;
use crate::tlv::TLVError;

/// Errors raised while retrieving or decoding GlobalPlatform data objects
#[derive(Debug, Error)]
pub enum GPDataError {
    #[error("Malformed TLV: {0}")]
    Tlv(#[from] TLVError),

    #[error("Input can't be valid CPLC if length is only {0}")]
    CplcLength(usize),

    #[error("Unexpected CPLC header {0}")]
    CplcHeader(String),

    #[error("Invalid CPLC date format: {0}")]
    InvalidDate(String),

    #[error("Key info template shorter than 4 bytes: {0}")]
    ShortKeyTemplate(String),

    #[error("Extended key template not yet supported: {0}")]
    ExtendedKeyFormat(String),

    #[error("Could not parse OID from {0}")]
    InvalidOid(String),

    #[error("Unknown GP version OID: {0}")]
    UnknownVersionOid(String),

    #[error("Mandatory tag 0x{tag:02X} missing in 0x{parent:02X}")]
    MissingTag { tag: u32, parent: u32 },

    #[error("Privileges must be at most 3 bytes: {0}")]
    InvalidPrivileges(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
