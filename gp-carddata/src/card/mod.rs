//! Talking to a card
//!
//! The transport trait, GET DATA retrieval with its fallback policy, and the
//! reader that turns a selected security domain into a [`CardReport`].

pub mod channel;
pub mod getdata;
pub mod report;

pub use channel::{CardChannel, RawChannel, TransportError};
pub use getdata::{fetch, get_data, DataObject, GetDataConfig};
pub use report::{CardDataReader, CardReport};
