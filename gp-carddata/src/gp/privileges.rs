//! Privilege bitmasks (GP 2.2.1 section 11.1.2, Table 11-7)
//!
//! Up to three bytes. A single byte is the GP 2.1.1 encoding; the second and
//! third bytes were added in 2.2. Some privileges are composite: DAP
//! Verification, Delegated Management and Mandated DAP Verification all
//! imply the Security Domain bit.

use std::fmt;

use serde::{Serialize, Serializer};

use super::GPDataError;
use crate::tlv::hexify;

/// A single GlobalPlatform privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Privilege {
    SecurityDomain,
    DAPVerification,
    DelegatedManagement,
    CardLock,
    CardTerminate,
    CardReset,
    CVMManagement,
    MandatedDAPVerification,
    TrustedPath,
    AuthorizedManagement,
    TokenVerification,
    GlobalDelete,
    GlobalLock,
    GlobalRegistry,
    FinalApplication,
    GlobalService,
    ReceiptGeneration,
    CipheredLoadFileDataBlock,
    ContactlessActivation,
    ContactlessSelfActivation,
}

impl Privilege {
    /// Every privilege, in bit order
    pub const ALL: [Privilege; 20] = [
        Privilege::SecurityDomain,
        Privilege::DAPVerification,
        Privilege::DelegatedManagement,
        Privilege::CardLock,
        Privilege::CardTerminate,
        Privilege::CardReset,
        Privilege::CVMManagement,
        Privilege::MandatedDAPVerification,
        Privilege::TrustedPath,
        Privilege::AuthorizedManagement,
        Privilege::TokenVerification,
        Privilege::GlobalDelete,
        Privilege::GlobalLock,
        Privilege::GlobalRegistry,
        Privilege::FinalApplication,
        Privilege::GlobalService,
        Privilege::ReceiptGeneration,
        Privilege::CipheredLoadFileDataBlock,
        Privilege::ContactlessActivation,
        Privilege::ContactlessSelfActivation,
    ];

    /// Byte index and the mask that must be fully set in that byte
    fn mask(self) -> (usize, u8) {
        match self {
            Self::SecurityDomain => (0, 0x80),
            Self::DAPVerification => (0, 0xC0),
            Self::DelegatedManagement => (0, 0xA0),
            Self::CardLock => (0, 0x10),
            Self::CardTerminate => (0, 0x08),
            Self::CardReset => (0, 0x04),
            Self::CVMManagement => (0, 0x02),
            Self::MandatedDAPVerification => (0, 0xC1),
            Self::TrustedPath => (1, 0x80),
            Self::AuthorizedManagement => (1, 0x40),
            Self::TokenVerification => (1, 0x20),
            Self::GlobalDelete => (1, 0x10),
            Self::GlobalLock => (1, 0x08),
            Self::GlobalRegistry => (1, 0x04),
            Self::FinalApplication => (1, 0x02),
            Self::GlobalService => (1, 0x01),
            Self::ReceiptGeneration => (2, 0x80),
            Self::CipheredLoadFileDataBlock => (2, 0x40),
            Self::ContactlessActivation => (2, 0x20),
            Self::ContactlessSelfActivation => (2, 0x10),
        }
    }
}

/// A decoded privilege set, kept in bit order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Privileges {
    set: Vec<Privilege>,
}

impl Privileges {
    /// Decode a one to three byte privilege mask
    pub fn from_bytes(data: &[u8]) -> Result<Self, GPDataError> {
        if data.len() > 3 {
            return Err(GPDataError::InvalidPrivileges(hexify(data)));
        }
        let mut raw = [0u8; 3];
        raw[..data.len()].copy_from_slice(data);

        let set = Privilege::ALL
            .iter()
            .copied()
            .filter(|p| {
                let (idx, mask) = p.mask();
                raw[idx] & mask == mask
            })
            .collect();
        Ok(Self { set })
    }

    pub fn contains(&self, privilege: Privilege) -> bool {
        self.set.contains(&privilege)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Privilege> {
        self.set.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Three byte GP 2.2 encoding
    pub fn to_bytes(&self) -> [u8; 3] {
        let mut raw = [0u8; 3];
        for p in &self.set {
            let (idx, mask) = p.mask();
            raw[idx] |= mask;
        }
        raw
    }
}

impl FromIterator<Privilege> for Privileges {
    fn from_iter<I: IntoIterator<Item = Privilege>>(iter: I) -> Self {
        let wanted: Vec<Privilege> = iter.into_iter().collect();
        let set = Privilege::ALL
            .iter()
            .copied()
            .filter(|p| wanted.contains(p))
            .collect();
        Self { set }
    }
}

impl fmt::Display for Privileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.set.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", p)?;
        }
        write!(f, "]")
    }
}

impl Serialize for Privileges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.set.iter())
    }
}
