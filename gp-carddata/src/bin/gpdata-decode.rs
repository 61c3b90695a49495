//! Offline decoder for GlobalPlatform GET DATA responses
//!
//! Usage: gpdata-decode <cplc|card-data|capabilities|keys|sw> <hex> [--json]
//!
//! Paste the response data (without SW1 SW2) as captured from a trace:
//!   gpdata-decode keys E006C00401018820
//!   gpdata-decode sw 6A88

use std::env;
use std::process;

use gp_carddata::apdu::{sw_to_string, SW};
use gp_carddata::gp::{key_template_list, CardCapabilities, CardData, Cplc, GPDataError, KeyTemplate};
use serde::Serialize;

const USAGE: &str = "Usage: gpdata-decode <cplc|card-data|capabilities|keys|sw> <hex> [--json]";

fn main() {
    let mut json = false;
    let mut positional = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return;
            }
            _ => positional.push(arg),
        }
    }

    let (mode, input) = match positional.as_slice() {
        [mode, rest @ ..] if !rest.is_empty() => (mode.as_str(), rest.concat()),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    let data = match decode_hex(&input) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: invalid hex input: {}", e);
            process::exit(2);
        }
    };

    let result = match mode {
        "cplc" => Cplc::from_bytes(&data).map(|c| render(&c, json)),
        "card-data" => CardData::from_bytes(&data).map(|cd| match cd {
            Some(cd) => render(&cd, json),
            None => absent("Card Data", json),
        }),
        "capabilities" => CardCapabilities::from_bytes(&data).map(|caps| match caps {
            Some(caps) => render(&caps, json),
            None => absent("Card Capabilities", json),
        }),
        "keys" => key_template_list(&data).map(|keys| render(&KeyTemplate { keys }, json)),
        "sw" => decode_sw(&data, json),
        other => {
            eprintln!("Error: unknown object type '{}'", other);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Hex with optional whitespace or colon separators
fn decode_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(cleaned)
}

fn render<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> String {
    if !json {
        return value.to_string();
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => format!("{}\n", s),
        Err(e) => {
            eprintln!("Error: failed to serialize: {}", e);
            process::exit(1);
        }
    }
}

fn absent(name: &str, json: bool) -> String {
    if json {
        "null\n".to_string()
    } else {
        format!("No {}\n", name)
    }
}

fn decode_sw(data: &[u8], json: bool) -> Result<String, GPDataError> {
    let sw = match data {
        [sw1, sw2] => u16::from_be_bytes([*sw1, *sw2]),
        _ => {
            eprintln!("Error: a status word is exactly 2 bytes");
            process::exit(2);
        }
    };
    if json {
        let value = serde_json::json!({
            "sw": format!("{:04X}", sw),
            "success": sw == SW::SUCCESS,
            "description": SW::describe(sw),
        });
        Ok(format!("{}\n", value))
    } else {
        Ok(format!("{}\n", sw_to_string(sw)))
    }
}
