//! Card Production Life Cycle (CPLC) data
//!
//! GET DATA 9F7F returns 42 bytes of fixed-width manufacturing provenance,
//! usually wrapped in a `9F 7F 2A` header. Dates inside are packed BCD
//! `Ydddd`: one year digit counted from 2010 and a three digit day of year.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, Utc};
use log::warn;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::GPDataError;
use crate::tlv::hexify;

/// Length of the CPLC payload without its tag and length
pub const CPLC_LEN: usize = 0x2A;

/// Tag and length prefix some cards include in the GET DATA response
pub const CPLC_HEADER: [u8; 3] = [0x9F, 0x7F, 0x2A];

/// First year of the single digit year encoding used in CPLC dates
pub const EPOCH_YEAR: i32 = 2010;

/// Text substituted for dates that cannot be decoded
pub const INVALID_DATE: &str = "invalid date format";

/// CPLC fields in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CplcField {
    ICFabricator,
    ICType,
    OperatingSystemID,
    OperatingSystemReleaseDate,
    OperatingSystemReleaseLevel,
    ICFabricationDate,
    ICSerialNumber,
    ICBatchIdentifier,
    ICModuleFabricator,
    ICModulePackagingDate,
    ICCManufacturer,
    ICEmbeddingDate,
    ICPrePersonalizer,
    ICPrePersonalizationEquipmentDate,
    ICPrePersonalizationEquipmentID,
    ICPersonalizer,
    ICPersonalizationDate,
    ICPersonalizationEquipmentID,
}

impl CplcField {
    /// Every field, in the order they appear on the wire
    pub const ALL: [CplcField; 18] = [
        Self::ICFabricator,
        Self::ICType,
        Self::OperatingSystemID,
        Self::OperatingSystemReleaseDate,
        Self::OperatingSystemReleaseLevel,
        Self::ICFabricationDate,
        Self::ICSerialNumber,
        Self::ICBatchIdentifier,
        Self::ICModuleFabricator,
        Self::ICModulePackagingDate,
        Self::ICCManufacturer,
        Self::ICEmbeddingDate,
        Self::ICPrePersonalizer,
        Self::ICPrePersonalizationEquipmentDate,
        Self::ICPrePersonalizationEquipmentID,
        Self::ICPersonalizer,
        Self::ICPersonalizationDate,
        Self::ICPersonalizationEquipmentID,
    ];

    /// Field name as printed in dumps
    pub fn name(self) -> &'static str {
        match self {
            Self::ICFabricator => "ICFabricator",
            Self::ICType => "ICType",
            Self::OperatingSystemID => "OperatingSystemID",
            Self::OperatingSystemReleaseDate => "OperatingSystemReleaseDate",
            Self::OperatingSystemReleaseLevel => "OperatingSystemReleaseLevel",
            Self::ICFabricationDate => "ICFabricationDate",
            Self::ICSerialNumber => "ICSerialNumber",
            Self::ICBatchIdentifier => "ICBatchIdentifier",
            Self::ICModuleFabricator => "ICModuleFabricator",
            Self::ICModulePackagingDate => "ICModulePackagingDate",
            Self::ICCManufacturer => "ICCManufacturer",
            Self::ICEmbeddingDate => "ICEmbeddingDate",
            Self::ICPrePersonalizer => "ICPrePersonalizer",
            Self::ICPrePersonalizationEquipmentDate => "ICPrePersonalizationEquipmentDate",
            Self::ICPrePersonalizationEquipmentID => "ICPrePersonalizationEquipmentID",
            Self::ICPersonalizer => "ICPersonalizer",
            Self::ICPersonalizationDate => "ICPersonalizationDate",
            Self::ICPersonalizationEquipmentID => "ICPersonalizationEquipmentID",
        }
    }

    /// Width of the field in bytes
    pub fn len(self) -> usize {
        match self {
            Self::ICSerialNumber
            | Self::ICPrePersonalizationEquipmentID
            | Self::ICPersonalizationEquipmentID => 4,
            _ => 2,
        }
    }

    /// Whether the field holds a BCD date
    pub fn is_date(self) -> bool {
        matches!(
            self,
            Self::OperatingSystemReleaseDate
                | Self::ICFabricationDate
                | Self::ICModulePackagingDate
                | Self::ICEmbeddingDate
                | Self::ICPrePersonalizationEquipmentDate
                | Self::ICPersonalizationDate
        )
    }
}

impl fmt::Display for CplcField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded CPLC record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cplc {
    pub ic_fabricator: [u8; 2],
    pub ic_type: [u8; 2],
    pub os_id: [u8; 2],
    pub os_release_date: [u8; 2],
    pub os_release_level: [u8; 2],
    pub ic_fabrication_date: [u8; 2],
    pub ic_serial_number: [u8; 4],
    pub ic_batch_identifier: [u8; 2],
    pub ic_module_fabricator: [u8; 2],
    pub ic_module_packaging_date: [u8; 2],
    pub icc_manufacturer: [u8; 2],
    pub ic_embedding_date: [u8; 2],
    pub ic_pre_personalizer: [u8; 2],
    pub ic_pre_personalization_equipment_date: [u8; 2],
    pub ic_pre_personalization_equipment_id: [u8; 4],
    pub ic_personalizer: [u8; 2],
    pub ic_personalization_date: [u8; 2],
    pub ic_personalization_equipment_id: [u8; 4],
}

/// Sequential fixed-width reader over a buffer already checked to be
/// `CPLC_LEN` bytes long
struct FieldReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl FieldReader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        out
    }
}

impl Cplc {
    /// Decode a GET DATA 9F7F response.
    ///
    /// Accepts the bare 42 byte payload, or 45 bytes starting with
    /// `9F 7F 2A`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, GPDataError> {
        let body = if data.len() == CPLC_LEN {
            data
        } else if let Some(rest) = data.strip_prefix(&CPLC_HEADER[..]) {
            if rest.len() != CPLC_LEN {
                return Err(GPDataError::CplcLength(rest.len()));
            }
            rest
        } else if data.len() < CPLC_LEN {
            return Err(GPDataError::CplcLength(data.len()));
        } else {
            return Err(GPDataError::CplcHeader(hexify(&data[..3])));
        };

        let mut r = FieldReader { data: body, offset: 0 };
        Ok(Self {
            ic_fabricator: r.take(),
            ic_type: r.take(),
            os_id: r.take(),
            os_release_date: r.take(),
            os_release_level: r.take(),
            ic_fabrication_date: r.take(),
            ic_serial_number: r.take(),
            ic_batch_identifier: r.take(),
            ic_module_fabricator: r.take(),
            ic_module_packaging_date: r.take(),
            icc_manufacturer: r.take(),
            ic_embedding_date: r.take(),
            ic_pre_personalizer: r.take(),
            ic_pre_personalization_equipment_date: r.take(),
            ic_pre_personalization_equipment_id: r.take(),
            ic_personalizer: r.take(),
            ic_personalization_date: r.take(),
            ic_personalization_equipment_id: r.take(),
        })
    }

    /// Raw bytes of one field
    pub fn get(&self, field: CplcField) -> &[u8] {
        match field {
            CplcField::ICFabricator => &self.ic_fabricator,
            CplcField::ICType => &self.ic_type,
            CplcField::OperatingSystemID => &self.os_id,
            CplcField::OperatingSystemReleaseDate => &self.os_release_date,
            CplcField::OperatingSystemReleaseLevel => &self.os_release_level,
            CplcField::ICFabricationDate => &self.ic_fabrication_date,
            CplcField::ICSerialNumber => &self.ic_serial_number,
            CplcField::ICBatchIdentifier => &self.ic_batch_identifier,
            CplcField::ICModuleFabricator => &self.ic_module_fabricator,
            CplcField::ICModulePackagingDate => &self.ic_module_packaging_date,
            CplcField::ICCManufacturer => &self.icc_manufacturer,
            CplcField::ICEmbeddingDate => &self.ic_embedding_date,
            CplcField::ICPrePersonalizer => &self.ic_pre_personalizer,
            CplcField::ICPrePersonalizationEquipmentDate => {
                &self.ic_pre_personalization_equipment_date
            }
            CplcField::ICPrePersonalizationEquipmentID => &self.ic_pre_personalization_equipment_id,
            CplcField::ICPersonalizer => &self.ic_personalizer,
            CplcField::ICPersonalizationDate => &self.ic_personalization_date,
            CplcField::ICPersonalizationEquipmentID => &self.ic_personalization_equipment_id,
        }
    }

    /// The 42 byte payload, without header
    pub fn to_bytes(&self) -> Vec<u8> {
        CplcField::ALL
            .iter()
            .flat_map(|f| self.get(*f).iter().copied())
            .collect()
    }

    /// Single line `[CPLC: Field=HEX, ...]` form
    pub fn summary(&self) -> String {
        let fields: Vec<String> = CplcField::ALL
            .iter()
            .map(|f| format!("{}={}", f, hexify(self.get(*f))))
            .collect();
        format!("[CPLC: {}]", fields.join(", "))
    }
}

impl fmt::Display for Cplc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in CplcField::ALL.iter().enumerate() {
            let value = self.get(*field);
            let prefix = if i == 0 { "CPLC: " } else { "      " };
            write!(f, "{}{}={}", prefix, field, hexify(value))?;
            if field.is_date() {
                write!(f, " ({})", to_date_failsafe(value))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Serialize for Cplc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CplcField::ALL.len()))?;
        for field in CplcField::ALL {
            map.serialize_entry(field.name(), &hexify(self.get(field)))?;
        }
        map.end()
    }
}

/// Decode a 2 byte BCD `Ydddd` CPLC date.
///
/// A day of 000 is read as the first day of the year. Day 366 of a
/// non-leap year rolls over into January 1st of the next one.
pub fn decode_date(value: &[u8]) -> Result<NaiveDate, GPDataError> {
    let invalid = || GPDataError::InvalidDate(hexify(value));
    if value.len() != 2 {
        return Err(invalid());
    }

    let digits = [value[0] >> 4, value[0] & 0x0F, value[1] >> 4, value[1] & 0x0F];
    if digits.iter().any(|d| *d > 9) {
        return Err(invalid());
    }
    let year = EPOCH_YEAR + i32::from(digits[0]);
    let day = u64::from(digits[1]) * 100 + u64::from(digits[2]) * 10 + u64::from(digits[3]);
    if day > 366 {
        return Err(invalid());
    }

    NaiveDate::from_yo_opt(year, 1)
        .and_then(|jan1| jan1.checked_add_days(Days::new(day.max(1) - 1)))
        .ok_or_else(invalid)
}

/// Decode a CPLC date as `YYYY-MM-DD`
pub fn to_date_string(value: &[u8]) -> Result<String, GPDataError> {
    decode_date(value).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Like [`to_date_string`], but yields [`INVALID_DATE`] instead of failing
pub fn to_date_failsafe(value: &[u8]) -> String {
    match to_date_string(value) {
        Ok(s) => s,
        Err(_) => {
            warn!("Invalid CPLC date: {}", hexify(value));
            INVALID_DATE.to_string()
        }
    }
}

/// Encode a calendar date in CPLC BCD form.
///
/// Only the last digit of the year offset survives, so years outside
/// 2010-2019 wrap around the decade.
pub fn encode_date(date: NaiveDate) -> [u8; 2] {
    let year = (date.year() - EPOCH_YEAR).rem_euclid(10) as u8;
    let day = date.ordinal() as u16;
    let (h, t, u) = ((day / 100) as u8, ((day / 10) % 10) as u8, (day % 10) as u8);
    [(year << 4) | h, (t << 4) | u]
}

/// Today's date (UTC) in CPLC BCD form
pub fn today() -> [u8; 2] {
    encode_date(Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CPLC_HEX: &str = concat!(
        "9F7F2A479050734791516151005248C71A6D4EA183479122070310301201070000",
        "8B3F48120000000000000000"
    );

    fn cplc_bytes() -> Vec<u8> {
        hex::decode(CPLC_HEX).unwrap()
    }

    #[test]
    fn test_decode_with_header() {
        let cplc = Cplc::from_bytes(&cplc_bytes()).unwrap();
        assert_eq!(cplc.ic_fabricator, [0x47, 0x90]);
        assert_eq!(cplc.ic_type, [0x50, 0x73]);
        assert_eq!(cplc.os_id, [0x47, 0x91]);
        assert_eq!(cplc.os_release_date, [0x51, 0x61]);
        assert_eq!(cplc.ic_serial_number, [0xC7, 0x1A, 0x6D, 0x4E]);
        assert_eq!(cplc.ic_personalization_equipment_id, [0, 0, 0, 0]);
        assert_eq!(cplc.get(CplcField::ICBatchIdentifier), &[0xA1, 0x83]);
    }

    #[test]
    fn test_header_is_stripped() {
        let full = cplc_bytes();
        assert_eq!(
            Cplc::from_bytes(&full).unwrap(),
            Cplc::from_bytes(&full[3..]).unwrap()
        );
    }

    #[test]
    fn test_too_short() {
        let full = cplc_bytes();
        assert!(matches!(Cplc::from_bytes(&full[3..44]), Err(GPDataError::CplcLength(41))));
        assert!(matches!(Cplc::from_bytes(&full[..44]), Err(GPDataError::CplcLength(41))));
        assert!(matches!(Cplc::from_bytes(&[]), Err(GPDataError::CplcLength(0))));
    }

    #[test]
    fn test_unexpected_header() {
        let mut data = cplc_bytes();
        data[2] = 0x2B;
        assert!(matches!(Cplc::from_bytes(&data), Err(GPDataError::CplcHeader(h)) if h == "9F7F2B"));
    }

    #[test]
    fn test_field_widths() {
        let total: usize = CplcField::ALL.iter().map(|f| f.len()).sum();
        assert_eq!(total, CPLC_LEN);
        assert_eq!(CplcField::ALL.iter().filter(|f| f.is_date()).count(), 6);
    }

    #[test]
    fn test_pretty_print() {
        let cplc = Cplc::from_bytes(&cplc_bytes()).unwrap();
        let text = cplc.to_string();
        assert!(text.starts_with("CPLC: ICFabricator=4790\n      ICType=5073\n"));
        assert!(text.contains("OperatingSystemReleaseDate=5161 (2015-06-10)\n"));
        assert!(text.contains("ICPersonalizationDate=0000 (2010-01-01)\n"));
        assert_eq!(text.lines().count(), 18);
        assert!(cplc.summary().starts_with("[CPLC: ICFabricator=4790, ICType=5073"));
    }

    #[test]
    fn test_serialize_as_hex_map() {
        let cplc = Cplc::from_bytes(&cplc_bytes()).unwrap();
        let json = serde_json::to_value(&cplc).unwrap();
        assert_eq!(json["ICSerialNumber"], "C71A6D4E");
        assert_eq!(json.as_object().unwrap().len(), 18);
    }

    #[test]
    fn test_decode_dates() {
        assert_eq!(to_date_string(&[0x51, 0x61]).unwrap(), "2015-06-10");
        assert_eq!(to_date_string(&[0x00, 0x01]).unwrap(), "2010-01-01");
        assert_eq!(to_date_string(&[0x23, 0x66]).unwrap(), "2012-12-31");
        // 2011 is not a leap year
        assert_eq!(to_date_string(&[0x13, 0x66]).unwrap(), "2012-01-01");
    }

    #[test]
    fn test_day_zero_is_day_one() {
        assert_eq!(decode_date(&[0x40, 0x00]).unwrap(), decode_date(&[0x40, 0x01]).unwrap());
    }

    #[test]
    fn test_invalid_dates() {
        assert!(matches!(decode_date(&[0x03, 0x67]), Err(GPDataError::InvalidDate(s)) if s == "0367"));
        assert!(decode_date(&[0x09, 0x99]).is_err());
        assert!(decode_date(&[0x0A, 0x01]).is_err());
        assert!(decode_date(&[0xF0, 0x01]).is_err());
        assert!(decode_date(&[0x01]).is_err());
    }

    #[test]
    fn test_failsafe() {
        assert_eq!(to_date_failsafe(&[0x51, 0x61]), "2015-06-10");
        assert_eq!(to_date_failsafe(&[0x04, 0x00]), INVALID_DATE);
    }

    #[test]
    fn test_encode_date() {
        let date = NaiveDate::from_ymd_opt(2015, 6, 10).unwrap();
        assert_eq!(encode_date(date), [0x51, 0x61]);
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(encode_date(date), [0x60, 0x32]);
        assert!(decode_date(&today()).is_ok());
    }

    #[test]
    fn test_every_valid_day_round_trips() {
        for offset in 0..10 {
            for day in 1..=366 {
                if let Some(date) = NaiveDate::from_yo_opt(EPOCH_YEAR + offset, day) {
                    assert_eq!(decode_date(&encode_date(date)).unwrap(), date);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_fields_reserialize(payload in prop::collection::vec(any::<u8>(), CPLC_LEN)) {
            let cplc = Cplc::from_bytes(&payload).unwrap();
            prop_assert_eq!(cplc.to_bytes(), payload.clone());

            let mut wrapped = CPLC_HEADER.to_vec();
            wrapped.extend_from_slice(&payload);
            prop_assert_eq!(Cplc::from_bytes(&wrapped).unwrap(), cplc);
        }

        #[test]
        fn prop_short_input_rejected(payload in prop::collection::vec(any::<u8>(), 0..CPLC_LEN)) {
            prop_assert!(Cplc::from_bytes(&payload).is_err());
        }

        #[test]
        fn prop_bcd_date_decodes(year in 0u8..10, day in 0u16..=366) {
            let bcd = [
                (year << 4) | (day / 100) as u8,
                ((((day / 10) % 10) as u8) << 4) | (day % 10) as u8,
            ];
            let date = decode_date(&bcd).unwrap();
            prop_assert!(date.year() == EPOCH_YEAR + i32::from(year) || date.ordinal() == 1);
            prop_assert_eq!(to_date_string(&bcd).unwrap(), date.format("%Y-%m-%d").to_string());
        }
    }
}
