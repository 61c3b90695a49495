//! Card Data (GET DATA 0066)
//!
//! Tag 66 wraps the Card Recognition Data (tag 73): a list of entries each
//! carrying an OID (tag 06) that names the platform, its GlobalPlatform
//! version and the secure channel protocols it implements.
//!
//! Layout, GP 2.1.1 F.2 Table F-1:
//! ```text
//! 66 L
//!    73 L
//!       06 L <1.2.840.114283.1>            GlobalPlatform card
//!       60 L 06 L <1.2.840.114283.2.v>     GP version
//!       64 L 06 L <1.2.840.114283.4.s.i>   SCP s, option i
//!       ...
//! ```

use std::fmt;

use der::asn1::ObjectIdentifier;
use der::Decode;
use log::debug;
use serde::Serialize;

use super::GPDataError;
use crate::tlv::{self, hexify, tags, TLVEncoder};

/// OID announcing a GlobalPlatform card
pub const GP_CARD_OID: &str = "1.2.840.114283.1";
const GP_VERSION_PREFIX: &str = "1.2.840.114283.2.";
const GP_SCP_PREFIX: &str = "1.2.840.114283.4.";
const GP_SCP80_OID: &str = "1.2.840.114283.4.0";
const JAVACARD_PREFIX: &str = "1.3.6.1.4.1.42.2.110.1.";

/// GlobalPlatform specification versions distinguished by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GPSpec {
    GP211,
    GP22,
}

impl GPSpec {
    /// Map a GP version OID to the specification it announces
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            "1.2.840.114283.2.2.1.1" => Some(Self::GP211),
            // 2.2 and 2.2.1 are handled identically
            "1.2.840.114283.2.2.2" | "1.2.840.114283.2.2.2.1" => Some(Self::GP22),
            _ => None,
        }
    }
}

impl fmt::Display for GPSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GP211 => write!(f, "GP 2.1.1"),
            Self::GP22 => write!(f, "GP 2.2"),
        }
    }
}

/// What a Card Data OID says about the card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OidClass {
    /// The card is a GlobalPlatform card
    GlobalPlatform,
    /// GlobalPlatform version, e.g. "2.1.1"
    GpVersion { version: String },
    /// Secure channel protocol and its implementation option
    SecureChannel { scp: u32, option: u32 },
    /// SCP80 (encoded as the single arc .4.0)
    Scp80,
    /// Java Card platform version label
    JavaCard { version: String },
}

impl fmt::Display for OidClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GlobalPlatform => write!(f, "Global Platform card"),
            Self::GpVersion { version } => write!(f, "GP Version: {}", version),
            // The protocol number is printed after a literal 0 ("SCP03"), even past 9
            Self::SecureChannel { scp, option } => write!(f, "GP SCP0{} i={:02x}", scp, option),
            Self::Scp80 => write!(f, "GP SCP80 i=00"),
            Self::JavaCard { version } => write!(f, "JavaCard v{}", version),
        }
    }
}

/// Classify a dotted OID string; `None` for OIDs with no known meaning
pub fn classify(oid: &str) -> Option<OidClass> {
    if oid == GP_CARD_OID {
        return Some(OidClass::GlobalPlatform);
    }
    if let Some(rest) = oid.strip_prefix(GP_VERSION_PREFIX) {
        return Some(OidClass::GpVersion {
            version: rest.to_string(),
        });
    }
    if oid.starts_with(GP_SCP_PREFIX) {
        let parts: Vec<&str> = oid[GP_SCP_PREFIX.len()..].split('.').collect();
        return match parts.as_slice() {
            [scp, option] => Some(OidClass::SecureChannel {
                scp: scp.parse().ok()?,
                option: option.parse().ok()?,
            }),
            _ if oid == GP_SCP80_OID => Some(OidClass::Scp80),
            _ => None,
        };
    }
    if let Some(rest) = oid.strip_prefix(JAVACARD_PREFIX) {
        if rest.len() == 1 {
            return Some(OidClass::JavaCard {
                version: rest.to_string(),
            });
        }
    }
    None
}

/// Decode the content octets of an OID (no tag, no length) to dotted form
pub fn oid_to_string(value: &[u8]) -> Result<String, GPDataError> {
    let encoded = TLVEncoder::encode(tags::OBJECT_IDENTIFIER as u32, value);
    ObjectIdentifier::from_der(&encoded)
        .map(|oid| oid.to_string())
        .map_err(|_| GPDataError::InvalidOid(hexify(value)))
}

/// Map the content octets of a GP version OID to a [`GPSpec`]
pub fn oid_to_version(value: &[u8]) -> Result<GPSpec, GPDataError> {
    let oid = oid_to_string(value)?;
    GPSpec::from_oid(&oid).ok_or(GPDataError::UnknownVersionOid(oid))
}

/// One OID-carrying entry of the Card Recognition Data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDataEntry {
    /// Tag of the entry inside 73 (06 when the OID sits there directly)
    pub tag: u32,
    /// Dotted OID
    pub oid: String,
    /// Interpretation, if the OID is known
    pub class: Option<OidClass>,
}

impl fmt::Display for CardDataEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag {:x}: {}", self.tag, self.oid)?;
        if let Some(class) = &self.class {
            write!(f, "\n-> {}", class)?;
        }
        Ok(())
    }
}

/// Decoded Card Data object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardData {
    pub entries: Vec<CardDataEntry>,
}

impl CardData {
    /// Decode a GET DATA 0066 response.
    ///
    /// Returns `Ok(None)` when there is no constructed tag 66.
    pub fn from_bytes(data: &[u8]) -> Result<Option<Self>, GPDataError> {
        let tlvs = tlv::parse(data)?;
        let card_data = match tlv::find_in(&tlvs, tags::CARD_DATA as u32) {
            Some(cd) if cd.is_constructed() => cd,
            _ => {
                debug!("No Card Data");
                return Ok(None);
            }
        };

        let mut entries = Vec::new();
        if let Some(recognition) = card_data.find(tags::CARD_RECOGNITION_DATA as u32) {
            for entry in &recognition.subs {
                if let Some(oid) = entry.find(tags::OBJECT_IDENTIFIER as u32) {
                    let oid = oid_to_string(&oid.value)?;
                    entries.push(CardDataEntry {
                        tag: entry.tag,
                        class: classify(&oid),
                        oid,
                    });
                }
            }
        }
        debug!("Card Data: {} OID entries", entries.len());
        Ok(Some(Self { entries }))
    }

    /// GlobalPlatform version announced by the card, if recognised
    pub fn gp_spec(&self) -> Option<GPSpec> {
        self.entries.iter().find_map(|e| GPSpec::from_oid(&e.oid))
    }
}

impl fmt::Display for CardData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::TLVBuilder;

    // GP 2.1.1 card with SCP02 i=15 and Java Card 2.x
    const CARD_DATA_211: &str = concat!(
        "664C734A06072A864886FC6B01600C060A2A864886FC6B02020101630906072A864886FC6B03",
        "640B06092A864886FC6B040215650B06092B8510864864020103660C060A2B060104012A026E0102"
    );

    #[test]
    fn test_decode_card_data() {
        let data = hex::decode(CARD_DATA_211).unwrap();
        let cd = CardData::from_bytes(&data).unwrap().unwrap();
        let oids: Vec<&str> = cd.entries.iter().map(|e| e.oid.as_str()).collect();
        assert_eq!(
            oids,
            vec![
                "1.2.840.114283.1",
                "1.2.840.114283.2.2.1.1",
                "1.2.840.114283.3",
                "1.2.840.114283.4.2.21",
                "1.3.656.840.100.2.1.3",
                "1.3.6.1.4.1.42.2.110.1.2",
            ]
        );
        let tags: Vec<u32> = cd.entries.iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![0x06, 0x60, 0x63, 0x64, 0x65, 0x66]);

        assert_eq!(cd.entries[0].class, Some(OidClass::GlobalPlatform));
        assert_eq!(
            cd.entries[1].class,
            Some(OidClass::GpVersion { version: "2.1.1".into() })
        );
        assert_eq!(cd.entries[2].class, None);
        assert_eq!(cd.entries[3].class, Some(OidClass::SecureChannel { scp: 2, option: 0x15 }));
        assert_eq!(cd.entries[4].class, None);
        assert_eq!(cd.entries[5].class, Some(OidClass::JavaCard { version: "2".into() }));
        assert_eq!(cd.gp_spec(), Some(GPSpec::GP211));
    }

    // GP 2.2 card with SCP03 i=70 and SCP80, the latter in its non-minimal
    // two byte arc encoding (80 00)
    const CARD_DATA_22: &str = concat!(
        "6657735506072A864886FC6B01600B06092A864886FC6B020202630906072A864886FC6B03",
        "640B06092A864886FC6B040370640B06092A864886FC6B048000650A06082A864886FC6B0504",
        "660C060A2B060104012A026E0103"
    );

    #[test]
    fn test_decode_gp22_card_data() {
        let data = hex::decode(CARD_DATA_22).unwrap();
        let cd = CardData::from_bytes(&data).unwrap().unwrap();
        let oids: Vec<&str> = cd.entries.iter().map(|e| e.oid.as_str()).collect();
        assert_eq!(
            oids,
            vec![
                "1.2.840.114283.1",
                "1.2.840.114283.2.2.2",
                "1.2.840.114283.3",
                "1.2.840.114283.4.3.112",
                "1.2.840.114283.4.0",
                "1.2.840.114283.5.4",
                "1.3.6.1.4.1.42.2.110.1.3",
            ]
        );
        assert_eq!(cd.entries[3].class, Some(OidClass::SecureChannel { scp: 3, option: 0x70 }));
        assert_eq!(cd.entries[4].class, Some(OidClass::Scp80));
        assert_eq!(cd.entries[5].class, None);
        assert_eq!(cd.entries[6].class, Some(OidClass::JavaCard { version: "3".into() }));
        assert_eq!(cd.gp_spec(), Some(GPSpec::GP22));

        let text = cd.to_string();
        assert!(text.contains("Tag 64: 1.2.840.114283.4.3.112\n-> GP SCP03 i=70\n"));
        assert!(text.contains("Tag 64: 1.2.840.114283.4.0\n-> GP SCP80 i=00\n"));
    }

    #[test]
    fn test_pretty_print() {
        let data = hex::decode(CARD_DATA_211).unwrap();
        let text = CardData::from_bytes(&data).unwrap().unwrap().to_string();
        let expected = "Tag 6: 1.2.840.114283.1\n\
                        -> Global Platform card\n\
                        Tag 60: 1.2.840.114283.2.2.1.1\n\
                        -> GP Version: 2.1.1\n\
                        Tag 63: 1.2.840.114283.3\n\
                        Tag 64: 1.2.840.114283.4.2.21\n\
                        -> GP SCP02 i=15\n\
                        Tag 65: 1.3.656.840.100.2.1.3\n\
                        Tag 66: 1.3.6.1.4.1.42.2.110.1.2\n\
                        -> JavaCard v2\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_scp80_and_scp03_entries() {
        let data = TLVBuilder::new()
            .add_raw(&TLVBuilder::new().add(0x06, &hex::decode("2A864886FC6B040370").unwrap()).wrap(0x64).build())
            .add_raw(&TLVBuilder::new().add(0x06, &hex::decode("2A864886FC6B0400").unwrap()).wrap(0x64).build())
            .wrap(0x73)
            .wrap(0x66)
            .build();
        let cd = CardData::from_bytes(&data).unwrap().unwrap();
        assert_eq!(cd.entries[0].class, Some(OidClass::SecureChannel { scp: 3, option: 0x70 }));
        assert_eq!(cd.entries[1].class, Some(OidClass::Scp80));
        assert_eq!(cd.gp_spec(), None);
    }

    #[test]
    fn test_absent_card_data() {
        assert_eq!(CardData::from_bytes(&[]).unwrap(), None);
        assert_eq!(CardData::from_bytes(&hex::decode("4F0101").unwrap()).unwrap(), None);
        // 66 present but without 73: present and empty
        let cd = CardData::from_bytes(&hex::decode("66034F0101").unwrap()).unwrap().unwrap();
        assert!(cd.entries.is_empty());
    }

    #[test]
    fn test_malformed_card_data() {
        let data = hex::decode("664C734A06072A86").unwrap();
        assert!(matches!(CardData::from_bytes(&data), Err(GPDataError::Tlv(_))));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("1.2.840.114283.4.0"), Some(OidClass::Scp80));
        assert_eq!(
            classify("1.2.840.114283.4.3.55"),
            Some(OidClass::SecureChannel { scp: 3, option: 55 })
        );
        assert_eq!(
            classify("1.2.840.114283.4.3.55").unwrap().to_string(),
            "GP SCP03 i=37"
        );
        assert_eq!(
            classify("1.2.840.114283.4.16.1").unwrap().to_string(),
            "GP SCP016 i=01"
        );
        assert_eq!(classify("1.2.840.114283.4.1.2.3"), None);
        assert_eq!(
            classify("1.2.840.114283.2.2.2").unwrap().to_string(),
            "GP Version: 2.2"
        );
        assert_eq!(classify("1.3.6.1.4.1.42.2.110.1.3").unwrap().to_string(), "JavaCard v3");
        assert_eq!(classify("1.3.6.1.4.1.42.2.110.1.30"), None);
        assert_eq!(classify("1.2.840.114283"), None);
    }

    #[test]
    fn test_oid_to_string() {
        assert_eq!(
            oid_to_string(&hex::decode("2A864886FC6B01").unwrap()).unwrap(),
            GP_CARD_OID
        );
        assert!(matches!(oid_to_string(&[]), Err(GPDataError::InvalidOid(_))));
        // Last arc never terminates
        assert!(matches!(oid_to_string(&[0x2A, 0x86]), Err(GPDataError::InvalidOid(s)) if s == "2A86"));
    }

    #[test]
    fn test_oid_to_version() {
        let gp211 = hex::decode("2A864886FC6B02020101").unwrap();
        let gp22 = hex::decode("2A864886FC6B020202").unwrap();
        let gp221 = hex::decode("2A864886FC6B02020201").unwrap();
        assert_eq!(oid_to_version(&gp211).unwrap(), GPSpec::GP211);
        assert_eq!(oid_to_version(&gp22).unwrap(), GPSpec::GP22);
        assert_eq!(oid_to_version(&gp221).unwrap(), GPSpec::GP22);

        let gp23 = hex::decode("2A864886FC6B02020203").unwrap();
        assert!(matches!(
            oid_to_version(&gp23),
            Err(GPDataError::UnknownVersionOid(oid)) if oid == "1.2.840.114283.2.2.2.3"
        ));
    }

    #[test]
    fn test_serialize_entry() {
        let entry = CardDataEntry {
            tag: 0x64,
            oid: "1.2.840.114283.4.2.21".into(),
            class: classify("1.2.840.114283.4.2.21"),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["class"]["kind"], "secure_channel");
        assert_eq!(json["class"]["scp"], 2);
    }
}
