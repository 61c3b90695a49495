//! Key Information Template (GET DATA 00E0)
//!
//! GP 2.1.1 9.3.3.1, GP 2.2.1 11.1.8. Each `C0` entry describes one key:
//!
//! ```text
//! E0 L
//!    C0 04 <id> <version> <type> <length>
//!    C0 00                                  empty slot, skipped
//!    ...
//! ```

use std::fmt;

use log::{debug, info};
use serde::Serialize;

use super::GPDataError;
use crate::tlv::{self, hexify, tags};

/// Key type byte announcing the extended (GP 2.2) template format
pub const EXTENDED_FORMAT: u8 = 0xFF;

/// Broad key family derived from the key type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyType {
    DES,
    DES3,
    AES,
    RSAPUB,
    PSK,
    HMAC,
    Other(u8),
}

impl From<u8> for KeyType {
    fn from(value: u8) -> Self {
        match value {
            0x80 | 0x83 | 0x84 => Self::DES,
            0x81 | 0x82 => Self::DES3,
            0x85 => Self::PSK,
            0x88 => Self::AES,
            0x90 | 0x91 => Self::HMAC,
            0xA0 | 0xA1 => Self::RSAPUB,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DES => f.pad("DES"),
            Self::DES3 => f.pad("DES3"),
            Self::AES => f.pad("AES"),
            Self::RSAPUB => f.pad("RSAPUB"),
            Self::PSK => f.pad("PSK"),
            Self::HMAC => f.pad("HMAC"),
            Self::Other(b) => f.pad(&format!("{:02X}", b)),
        }
    }
}

/// Key type coding, GP 2.2.1 Table 11-16
pub fn key_type_description(key_type: u8) -> &'static str {
    match key_type {
        0x00..=0x7F => "Reserved for private use",
        0x80 => "DES - mode (ECB/CBC) implicitly known",
        0x81 => "Reserved (Triple DES)",
        0x82 => "Triple DES in CBC mode",
        0x83 => "DES in ECB mode",
        0x84 => "DES in CBC mode",
        0x85 => "Pre-Shared Key for Transport Layer Security",
        0x88 => "AES (16, 24, or 32 long keys)",
        0x90 => "HMAC-SHA1 - length of HMAC is implicitly known",
        0x91 => "MAC-SHA1-160 - length of HMAC is 160 bits",
        0x86 | 0x87 | 0x89..=0x8F | 0x92..=0x9F => "RFU (asymmetric algorithms)",
        0xA0 => "RSA Public Key - public exponent e component (clear text)",
        0xA1 => "RSA Public Key - modulus N component (clear text)",
        0xA2 => "RSA Private Key - modulus N component",
        0xA3 => "RSA Private Key - private exponent d component",
        0xA4 => "RSA Private Key - Chinese Remainder P component",
        0xA5 => "RSA Private Key - Chinese Remainder Q component",
        0xA6 => "RSA Private Key - Chinese Remainder PQ component",
        0xA7 => "RSA Private Key - Chinese Remainder DP1 component",
        0xA8 => "RSA Private Key - Chinese Remainder DQ1 component",
        0xA9..=0xFE => "RFU (asymmetric algorithms)",
        0xFF => "Extended Format",
    }
}

/// One key descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub id: u8,
    pub version: u8,
    pub key_type: u8,
    /// Key length in bytes
    pub length: u8,
}

impl KeyInfo {
    pub fn kind(&self) -> KeyType {
        KeyType::from(self.key_type)
    }

    pub fn description(&self) -> &'static str {
        key_type_description(self.key_type)
    }

    /// Version 0x00 and 0xFF are only ever seen on unpersonalized cards
    pub fn is_factory(&self) -> bool {
        self.version == 0x00 || self.version == 0xFF
    }
}

impl fmt::Display for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = u32::from(self.length) * 8;
        let nice = match self.kind() {
            KeyType::RSAPUB => format!("(RSA-{} public)", bits),
            KeyType::AES => format!("(AES-{})", bits),
            _ => String::new(),
        };
        write!(
            f,
            "Version: {:3} (0x{:02X}) ID: {:3} (0x{:02X}) type: {:<4} length: {:3} {}",
            self.version,
            self.version,
            self.id,
            self.id,
            self.kind(),
            self.length,
            nice
        )
    }
}

/// Decode the `C0` entries of a Key Information Template.
///
/// A missing or primitive `E0` yields an empty list.
pub fn key_template_list(data: &[u8]) -> Result<Vec<KeyInfo>, GPDataError> {
    let tlvs = tlv::parse(data)?;
    let template = match tlv::find_in(&tlvs, tags::KEY_INFO_TEMPLATE as u32) {
        Some(t) if t.is_constructed() => t,
        _ => return Ok(Vec::new()),
    };

    let mut keys = Vec::new();
    for entry in template.children_with(tags::KEY_INFO_DATA as u32) {
        let tmpl = entry.value.as_slice();
        match tmpl {
            [] => {
                // Fresh SSD
                info!("Key template has zero length (empty). Skipping.");
            }
            [_, _, key_type, _, ..] if *key_type == EXTENDED_FORMAT => {
                return Err(GPDataError::ExtendedKeyFormat(hexify(tmpl)));
            }
            [id, version, key_type, length, ..] => keys.push(KeyInfo {
                id: *id,
                version: *version,
                key_type: *key_type,
                length: *length,
            }),
            _ => return Err(GPDataError::ShortKeyTemplate(hexify(tmpl))),
        }
    }
    debug!("Key template: {} keys", keys.len());
    Ok(keys)
}

/// A decoded key template, for printing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyTemplate {
    pub keys: Vec<KeyInfo>,
}

impl KeyTemplate {
    pub fn from_bytes(data: &[u8]) -> Result<Self, GPDataError> {
        Ok(Self {
            keys: key_template_list(data)?,
        })
    }

    pub fn has_factory_keys(&self) -> bool {
        self.keys.iter().any(KeyInfo::is_factory)
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            writeln!(f, "{}", key)?;
        }
        if self.has_factory_keys() {
            writeln!(f, "Key version suggests factory keys")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::TLVError;

    const TEMPLATE: &str = "E020C00401018820C00402018820C00403018820C0060170A180A003C00401718010";

    #[test]
    fn test_nested_templates_are_rejected() {
        let mut data = hex::decode("C00401018820").unwrap();
        for _ in 0..5000 {
            let mut outer = vec![0xE0, 0x84];
            outer.extend((data.len() as u32).to_be_bytes());
            outer.extend(data);
            data = outer;
        }
        assert!(matches!(
            key_template_list(&data),
            Err(GPDataError::Tlv(TLVError::TooDeep(_)))
        ));
    }

    #[test]
    fn test_single_aes_key() {
        let keys = key_template_list(&hex::decode("E006C00401018820").unwrap()).unwrap();
        assert_eq!(
            keys,
            vec![KeyInfo {
                id: 0x01,
                version: 0x01,
                key_type: 0x88,
                length: 0x20
            }]
        );
        assert_eq!(keys[0].kind(), KeyType::AES);
    }

    #[test]
    fn test_empty_slot_skipped() {
        let plain = key_template_list(&hex::decode("E00CC00401018820C00402018820").unwrap()).unwrap();
        let with_empty =
            key_template_list(&hex::decode("E00EC00401018820C000C00402018820").unwrap()).unwrap();
        assert_eq!(plain, with_empty);
        assert_eq!(with_empty.len(), 2);
    }

    #[test]
    fn test_decode_template() {
        let keys = key_template_list(&hex::decode(TEMPLATE).unwrap()).unwrap();
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[3].version, 0x70);
        assert_eq!(keys[3].kind(), KeyType::RSAPUB);
        assert_eq!(keys[3].length, 0x80);
        assert_eq!(keys[4].kind(), KeyType::DES);
    }

    #[test]
    fn test_pretty_print() {
        let template = KeyTemplate::from_bytes(&hex::decode(TEMPLATE).unwrap()).unwrap();
        let expected = "Version:   1 (0x01) ID:   1 (0x01) type: AES  length:  32 (AES-256)\n\
                        Version:   1 (0x01) ID:   2 (0x02) type: AES  length:  32 (AES-256)\n\
                        Version:   1 (0x01) ID:   3 (0x03) type: AES  length:  32 (AES-256)\n\
                        Version: 112 (0x70) ID:   1 (0x01) type: RSAPUB length: 128 (RSA-1024 public)\n\
                        Version: 113 (0x71) ID:   1 (0x01) type: DES  length:  16 \n";
        assert_eq!(template.to_string(), expected);
        assert!(!template.has_factory_keys());
    }

    #[test]
    fn test_factory_keys_note() {
        let template = KeyTemplate::from_bytes(&hex::decode("E012C00401FF8010C00402FF8010C00403FF8010").unwrap()).unwrap();
        assert!(template.has_factory_keys());
        assert!(template.to_string().ends_with("Key version suggests factory keys\n"));
    }

    #[test]
    fn test_short_entry() {
        let err = key_template_list(&hex::decode("E005C003010188").unwrap()).unwrap_err();
        assert!(matches!(err, GPDataError::ShortKeyTemplate(ref s) if s == "010188"));
    }

    #[test]
    fn test_extended_format() {
        let err = key_template_list(&hex::decode("E006C0040101FF20").unwrap()).unwrap_err();
        assert!(matches!(err, GPDataError::ExtendedKeyFormat(_)));
    }

    #[test]
    fn test_absent_template() {
        assert!(key_template_list(&[]).unwrap().is_empty());
        assert!(key_template_list(&hex::decode("C00401018820").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_key_type_description() {
        assert_eq!(key_type_description(0x10), "Reserved for private use");
        assert_eq!(key_type_description(0x88), "AES (16, 24, or 32 long keys)");
        assert_eq!(key_type_description(0x8A), "RFU (asymmetric algorithms)");
        assert_eq!(key_type_description(0xFF), "Extended Format");
        assert_eq!(KeyType::from(0xA2), KeyType::Other(0xA2));
        assert_eq!(format!("{:<4}", KeyType::Other(0xA2)), "A2  ");
    }
}
