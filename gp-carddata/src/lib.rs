//! Decoders for GlobalPlatform card metadata
//!
//! A GlobalPlatform security domain exposes a handful of data objects through
//! GET DATA that describe the card itself:
//!
//! - CPLC (tag 9F7F), the Card Production Life Cycle record
//! - Card Data (tag 66), OIDs naming the platform and its secure channels
//! - Card Capabilities (tag 67), supported SCP options and privileges
//! - Key Information Template (tag E0), the keys present on the card
//!
//! The [`gp`] decoders are pure functions over response bytes. The [`card`]
//! module fetches the objects over any [`CardChannel`] and collects them into
//! a [`CardReport`].
//!
//! # Example
//! ```ignore
//! use gp_carddata::gp::key_template_list;
//!
//! let keys = key_template_list(&[0xE0, 0x06, 0xC0, 0x04, 0x01, 0x01, 0x88, 0x20])?;
//! assert_eq!(keys[0].key_type, 0x88);
//! ```

pub mod apdu;
pub mod card;
pub mod gp;
pub mod tlv;

pub use apdu::{sw_to_string, Response, APDU, SW};
pub use card::{CardChannel, CardDataReader, CardReport, GetDataConfig, TransportError};
pub use gp::GPDataError;
