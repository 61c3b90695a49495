//! Card Capabilities (GET DATA 0067, GP 2.2.1 H.4)
//!
//! ```text
//! 67 L
//!    A0 L 80 01 <scp> 81 n <options..> [82 01 <aes key lengths>]
//!    ...
//!    81 L <privileges an SD may be granted>
//!    82 L <privileges an application may be granted>
//! ```

use std::fmt;

use log::debug;
use serde::Serialize;

use super::privileges::Privileges;
use super::GPDataError;
use crate::tlv::{self, cursor, tags, TLV};

const AES_128: u32 = 0x01;
const AES_192: u32 = 0x02;
const AES_256: u32 = 0x04;

/// Secure channel protocol support announced in an `A0` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScpCapability {
    pub scp: u32,
    /// Supported implementation options ("i" parameters)
    pub options: Vec<u8>,
    /// AES key length bitmask, if present
    pub aes_key_lengths: Option<u32>,
}

impl ScpCapability {
    fn from_tlv(entry: &TLV) -> Result<Self, GPDataError> {
        let missing = |tag: u8| GPDataError::MissingTag {
            tag: tag as u32,
            parent: entry.tag,
        };
        let scp = entry
            .find(tags::SCP_IDENTIFIER as u32)
            .ok_or_else(|| missing(tags::SCP_IDENTIFIER))?
            .int_value();
        let options = entry
            .find(tags::SCP_OPTIONS as u32)
            .ok_or_else(|| missing(tags::SCP_OPTIONS))?
            .value
            .clone();
        let aes_key_lengths = entry
            .find(tags::SCP_KEY_LENGTHS as u32)
            .map(TLV::int_value);

        Ok(Self {
            scp,
            options,
            aes_key_lengths,
        })
    }

    /// Labels of the AES key lengths announced in the bitmask
    pub fn aes_labels(&self) -> Vec<&'static str> {
        let mask = self.aes_key_lengths.unwrap_or(0);
        [(AES_128, "AES-128"), (AES_192, "AES-192"), (AES_256, "AES-256")]
            .iter()
            .filter(|(bit, _)| mask & bit == *bit)
            .map(|(_, label)| *label)
            .collect()
    }
}

impl fmt::Display for ScpCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Supports: SCP{:02X}", self.scp)?;
        for i in &self.options {
            write!(f, " i={:02X}", i)?;
        }
        if self.aes_key_lengths.is_some() {
            write!(f, " with")?;
            for label in self.aes_labels() {
                write!(f, " {}", label)?;
            }
        }
        Ok(())
    }
}

/// One classified entry of the Card Capabilities object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Capability {
    SecureChannel(ScpCapability),
    DomainPrivileges(Privileges),
    ApplicationPrivileges(Privileges),
    /// Entry with none of the known sub-tags
    Unrecognized(u32),
}

impl Capability {
    /// Classify one child of tag 67; the first matching sub-tag wins
    fn from_tlv(entry: &TLV) -> Result<Self, GPDataError> {
        if let Some(scp) = entry.find(tags::SCP_INFORMATION as u32) {
            return Ok(Self::SecureChannel(ScpCapability::from_tlv(scp)?));
        }
        if let Some(privs) = entry.find(tags::SD_PRIVILEGES as u32) {
            return Ok(Self::DomainPrivileges(Privileges::from_bytes(&privs.value)?));
        }
        if let Some(privs) = entry.find(tags::APP_PRIVILEGES as u32) {
            return Ok(Self::ApplicationPrivileges(Privileges::from_bytes(&privs.value)?));
        }
        Ok(Self::Unrecognized(entry.tag))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecureChannel(scp) => write!(f, "{}", scp),
            Self::DomainPrivileges(p) => write!(f, "Available DOM privileges: {}", p),
            Self::ApplicationPrivileges(p) => write!(f, "Available APP privileges: {}", p),
            Self::Unrecognized(_) => Ok(()),
        }
    }
}

/// Decoded Card Capabilities object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardCapabilities {
    pub entries: Vec<Capability>,
}

impl CardCapabilities {
    /// Decode a GET DATA 0067 response.
    ///
    /// Some cards answer with the object wrapped twice (`67 L 67 L ...`); the
    /// outer wrapper is dropped first. Returns `Ok(None)` without tag 67.
    pub fn from_bytes(data: &[u8]) -> Result<Option<Self>, GPDataError> {
        let data = if double_wrapped(data) {
            debug!("Dropping doubled Card Capabilities wrapper");
            &data[2..]
        } else {
            data
        };

        let tlvs = tlv::parse(data)?;
        let caps = match tlv::find_in(&tlvs, tags::CARD_CAPABILITIES as u32) {
            Some(caps) => caps,
            None => return Ok(None),
        };

        let entries = caps
            .subs
            .iter()
            .map(Capability::from_tlv)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Self { entries }))
    }

    /// All secure channel protocols the card announces
    pub fn secure_channels(&self) -> impl Iterator<Item = &ScpCapability> {
        self.entries.iter().filter_map(|e| match e {
            Capability::SecureChannel(scp) => Some(scp),
            _ => None,
        })
    }
}

impl fmt::Display for CardCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            if !matches!(entry, Capability::Unrecognized(_)) {
                writeln!(f, "{}", entry)?;
            }
        }
        Ok(())
    }
}

fn double_wrapped(data: &[u8]) -> bool {
    let tag = tags::CARD_CAPABILITIES;
    matches!(
        (cursor::tag_at(data, 0), cursor::tag_at(data, 2)),
        (Ok(a), Ok(b)) if a == tag && b == tag
    )
}
