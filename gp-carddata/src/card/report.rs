//! Card metadata dump
//!
//! [`CardDataReader`] fetches every known data object from a selected
//! security domain and decodes it. The result is a [`CardReport`] that prints
//! as the classic text dump or serializes to JSON.

use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};

use super::channel::{CardChannel, TransportError};
use super::getdata::{fetch, DataObject, GetDataConfig};
use crate::gp::{CardCapabilities, CardData, Cplc, GPDataError, KeyTemplate};
use crate::tlv::hexify;

/// Reads and decodes GlobalPlatform data objects over a channel.
///
/// The channel must already have the (I)SD selected.
pub struct CardDataReader<C> {
    channel: C,
    config: GetDataConfig,
}

impl<C: CardChannel> CardDataReader<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, GetDataConfig::default())
    }

    pub fn with_config(channel: C, config: GetDataConfig) -> Self {
        Self { channel, config }
    }

    pub fn config(&self) -> &GetDataConfig {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Raw payload of an object, `None` when the card does not provide it
    pub fn fetch_raw(&mut self, object: DataObject) -> Result<Option<Vec<u8>>, TransportError> {
        fetch(&mut self.channel, &self.config, object)
    }

    pub fn fetch_cplc(&mut self) -> Result<Option<Cplc>, GPDataError> {
        self.fetch_raw(DataObject::Cplc)?
            .map(|data| Cplc::from_bytes(&data))
            .transpose()
    }

    pub fn fetch_iin(&mut self) -> Result<Option<Vec<u8>>, GPDataError> {
        Ok(self.fetch_raw(DataObject::Iin)?)
    }

    pub fn fetch_cin(&mut self) -> Result<Option<Vec<u8>>, GPDataError> {
        Ok(self.fetch_raw(DataObject::Cin)?)
    }

    pub fn fetch_card_data(&mut self) -> Result<Option<CardData>, GPDataError> {
        match self.fetch_raw(DataObject::CardData)? {
            Some(data) => CardData::from_bytes(&data),
            None => Ok(None),
        }
    }

    pub fn fetch_card_capabilities(&mut self) -> Result<Option<CardCapabilities>, GPDataError> {
        match self.fetch_raw(DataObject::CardCapabilities)? {
            Some(data) => CardCapabilities::from_bytes(&data),
            None => Ok(None),
        }
    }

    pub fn fetch_key_template(&mut self) -> Result<Option<KeyTemplate>, GPDataError> {
        self.fetch_raw(DataObject::KeyInfoTemplate)?
            .map(|data| KeyTemplate::from_bytes(&data))
            .transpose()
    }

    /// Fetch and decode everything, in the order the objects are printed
    pub fn dump(&mut self) -> Result<CardReport, GPDataError> {
        let report = CardReport {
            cplc: self.fetch_cplc()?,
            iin: self.fetch_iin()?,
            cin: self.fetch_cin()?,
            card_data: self.fetch_card_data()?,
            card_capabilities: self.fetch_card_capabilities()?,
            key_template: self.fetch_key_template()?,
        };
        debug!(
            "Card report: cplc={} card_data={} capabilities={} keys={}",
            report.cplc.is_some(),
            report.card_data.is_some(),
            report.card_capabilities.is_some(),
            report.key_template.as_ref().map_or(0, |t| t.keys.len())
        );
        Ok(report)
    }
}

/// Everything a card told us about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardReport {
    pub cplc: Option<Cplc>,
    #[serde(serialize_with = "hex_opt")]
    pub iin: Option<Vec<u8>>,
    #[serde(serialize_with = "hex_opt")]
    pub cin: Option<Vec<u8>>,
    pub card_data: Option<CardData>,
    pub card_capabilities: Option<CardCapabilities>,
    pub key_template: Option<KeyTemplate>,
}

fn hex_opt<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(bytes) => serializer.serialize_some(&hexify(bytes)),
        None => serializer.serialize_none(),
    }
}

impl fmt::Display for CardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cplc) = &self.cplc {
            write!(f, "{}", cplc)?;
        }
        if let Some(iin) = &self.iin {
            writeln!(f, "IIN: {}", hexify(iin))?;
        }
        if let Some(cin) = &self.cin {
            writeln!(f, "CIN: {}", hexify(cin))?;
        }
        writeln!(f, "Card Data: ")?;
        if let Some(card_data) = &self.card_data {
            write!(f, "{}", card_data)?;
        }
        writeln!(f, "Card Capabilities: ")?;
        if let Some(caps) = &self.card_capabilities {
            write!(f, "{}", caps)?;
        }
        if let Some(keys) = &self.key_template {
            write!(f, "{}", keys)?;
        }
        Ok(())
    }
}
