//! GET DATA retrieval
//!
//! Every object of interest is fetched with a single GET DATA (INS CA)
//! addressed by its tag in P1/P2. Cards that reject the GlobalPlatform class
//! byte for an object may still answer with the ISO class byte, so callers
//! can ask for exactly one fallback attempt.

use log::{debug, trace, warn};

use super::channel::{CardChannel, TransportError};
use crate::apdu::{cla, sw_to_string, APDU, SW};
use crate::tlv::tags;

/// Environment variable overriding the class byte of the first attempt
pub const CLA_ENV: &str = "GPDATA_CLA";

/// Class bytes used for GET DATA; Le is always 256
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetDataConfig {
    pub cla: u8,
    pub fallback_cla: u8,
}

impl Default for GetDataConfig {
    fn default() -> Self {
        Self {
            cla: cla::GP,
            fallback_cla: cla::ISO7816,
        }
    }
}

impl GetDataConfig {
    /// Defaults, with the primary class byte taken from `GPDATA_CLA` (hex)
    /// when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(CLA_ENV) {
            match parse_cla(&value) {
                Some(cla) => config.cla = cla,
                None => warn!("Ignoring invalid {}={:?}", CLA_ENV, value),
            }
        }
        config
    }
}

fn parse_cla(value: &str) -> Option<u8> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u8::from_str_radix(digits, 16).ok()
}

/// The data objects this crate knows how to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataObject {
    Cplc,
    Iin,
    Cin,
    CardData,
    CardCapabilities,
    KeyInfoTemplate,
}

impl DataObject {
    pub const ALL: [DataObject; 6] = [
        DataObject::Cplc,
        DataObject::Iin,
        DataObject::Cin,
        DataObject::CardData,
        DataObject::CardCapabilities,
        DataObject::KeyInfoTemplate,
    ];

    /// P1/P2 of the GET DATA command
    pub fn tag(self) -> u16 {
        match self {
            Self::Cplc => tags::CPLC,
            Self::Iin => tags::IIN,
            Self::Cin => tags::CIN,
            Self::CardData => u16::from(tags::CARD_DATA),
            Self::CardCapabilities => u16::from(tags::CARD_CAPABILITIES),
            Self::KeyInfoTemplate => u16::from(tags::KEY_INFO_TEMPLATE),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cplc => "CPLC",
            Self::Iin => "IIN",
            Self::Cin => "CIN",
            Self::CardData => "Card Data",
            Self::CardCapabilities => "Card Capabilities",
            Self::KeyInfoTemplate => "Key Info Template",
        }
    }

    /// Whether a failed first attempt is retried with the fallback class.
    /// Only CPLC is known to be served under the ISO class on some cards.
    pub fn failsafe(self) -> bool {
        matches!(self, Self::Cplc)
    }
}

/// Issue GET DATA for P1/P2.
///
/// - 9000: the response data
/// - 6A88: `None`, the object simply does not exist
/// - anything else: `None` with a warning
///
/// With `failsafe` set, a non-9000 first answer triggers exactly one more
/// attempt with `config.fallback_cla`; its outcome is final. Only transport
/// failures are errors.
pub fn get_data<C: CardChannel + ?Sized>(
    channel: &mut C,
    config: &GetDataConfig,
    p1: u8,
    p2: u8,
    name: &str,
    failsafe: bool,
) -> Result<Option<Vec<u8>>, TransportError> {
    trace!("GET DATA({}) {:02X}{:02X} CLA={:02X}", name, p1, p2, config.cla);
    let mut resp = channel.transmit(&APDU::get_data(config.cla, p1, p2))?;

    if failsafe && !resp.is_success() {
        debug!(
            "GET DATA({}) returned {}, retrying with CLA={:02X}",
            name,
            sw_to_string(resp.sw()),
            config.fallback_cla
        );
        resp = channel.transmit(&APDU::get_data(config.fallback_cla, p1, p2))?;
    }

    match resp.sw() {
        SW::SUCCESS => Ok(Some(resp.data)),
        SW::REFERENCED_DATA_NOT_FOUND => {
            debug!("GET DATA({}): N/A", name);
            Ok(None)
        }
        sw => {
            warn!("GET DATA({}) not supported: {}", name, sw_to_string(sw));
            Ok(None)
        }
    }
}

/// [`get_data`] for a known object, with its own failsafe policy
pub fn fetch<C: CardChannel + ?Sized>(
    channel: &mut C,
    config: &GetDataConfig,
    object: DataObject,
) -> Result<Option<Vec<u8>>, TransportError> {
    let [p1, p2] = object.tag().to_be_bytes();
    get_data(channel, config, p1, p2, object.name(), object.failsafe())
}
