//! Status Word (SW) constants for APDU responses
//!
//! ISO 7816-4 status words, plus the diagnostic texts GlobalPlatform
//! attaches to them (GP Card Specification 2.3, chapter 11).

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Status Word constants
pub struct SW;

impl SW {
    // Success
    pub const SUCCESS: u16 = 0x9000;

    // Warnings
    pub const CARD_LOCKED: u16 = 0x6283;

    // Execution errors
    pub const NO_SPECIFIC_DIAGNOSIS: u16 = 0x6400;
    pub const MEMORY_FAILURE: u16 = 0x6581;

    // Checking errors
    pub const WRONG_LENGTH: u16 = 0x6700;
    pub const SECURE_MESSAGING_NOT_SUPPORTED: u16 = 0x6882;
    pub const SECURITY_STATUS_NOT_SATISFIED: u16 = 0x6982;
    pub const CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
    pub const WRONG_DATA: u16 = 0x6A80;
    pub const FUNCTION_NOT_SUPPORTED: u16 = 0x6A81;
    pub const FILE_NOT_FOUND: u16 = 0x6A82;
    pub const NOT_ENOUGH_MEMORY: u16 = 0x6A84;
    pub const INCORRECT_P1_P2: u16 = 0x6A86;
    pub const REFERENCED_DATA_NOT_FOUND: u16 = 0x6A88;
    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;
    pub const CLA_NOT_SUPPORTED: u16 = 0x6E00;

    /// GlobalPlatform diagnostic text for a status word, if it has one
    pub fn describe(sw: u16) -> Option<&'static str> {
        DIAGNOSTICS.get(&sw).copied()
    }
}

static DIAGNOSTICS: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (SW::NO_SPECIFIC_DIAGNOSIS, "No specific diagnosis"),
        (SW::WRONG_LENGTH, "Wrong length (Lc)"),
        (SW::INS_NOT_SUPPORTED, "Invalid INStruction"),
        (SW::CLA_NOT_SUPPORTED, "Invalid CLAss"),
        (SW::CARD_LOCKED, "Card Life Cycle State is CARD_LOCKED"),
        (SW::MEMORY_FAILURE, "Memory failure"),
        (SW::SECURE_MESSAGING_NOT_SUPPORTED, "Secure messaging not supported"),
        (SW::SECURITY_STATUS_NOT_SATISFIED, "Security status not satisfied"),
        (SW::CONDITIONS_NOT_SATISFIED, "Conditions of use not satisfied"),
        (SW::WRONG_DATA, "Wrong data/incorrect values in data"),
        (
            SW::FUNCTION_NOT_SUPPORTED,
            "Function not supported e.g. card Life Cycle State is CARD_LOCKED",
        ),
        (SW::FILE_NOT_FOUND, "Application/file not found"),
        (SW::NOT_ENOUGH_MEMORY, "Not enough memory space"),
        (SW::INCORRECT_P1_P2, "Incorrect P1/P2"),
        (SW::REFERENCED_DATA_NOT_FOUND, "Referenced data not found"),
    ])
});

/// Render a status word as `0xXXXX`, with the diagnostic text in
/// parentheses when one is known
pub fn sw_to_string(sw: u16) -> String {
    match SW::describe(sw) {
        Some(msg) => format!("0x{:04X} ({})", sw, msg),
        None => format!("0x{:04X}", sw),
    }
}
