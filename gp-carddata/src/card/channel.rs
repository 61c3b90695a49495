//! Card transport abstraction
//!
//! The decoders never talk to a reader themselves. Anything that can carry a
//! command APDU to a card and bring back the response implements
//! [`CardChannel`]; PC/SC bindings, a remote reader or a test script alike.

use log::trace;
use thiserror::Error;

use crate::apdu::{APDUError, Response, APDU};
use crate::tlv::hexify;

/// Failure below the APDU layer
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    Response(#[from] APDUError),

    #[error("Transport error: {0}")]
    Other(String),
}

/// A channel to a selected application on a card
pub trait CardChannel {
    /// Send one command and wait for its response
    fn transmit(&mut self, apdu: &APDU) -> Result<Response, TransportError>;
}

impl<C: CardChannel + ?Sized> CardChannel for &mut C {
    fn transmit(&mut self, apdu: &APDU) -> Result<Response, TransportError> {
        (**self).transmit(apdu)
    }
}

/// Adapter for transports that speak raw bytes: the closure receives the
/// serialized command and returns response data followed by SW1 SW2.
pub struct RawChannel<F> {
    transmit: F,
}

impl<F> RawChannel<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, TransportError>,
{
    pub fn new(transmit: F) -> Self {
        Self { transmit }
    }
}

impl<F> CardChannel for RawChannel<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, TransportError>,
{
    fn transmit(&mut self, apdu: &APDU) -> Result<Response, TransportError> {
        let command = apdu.to_bytes();
        trace!(">> {}", hexify(&command));
        let raw = (self.transmit)(&command)?;
        trace!("<< {}", hexify(&raw));
        Ok(Response::from_bytes(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_channel() {
        let mut seen = Vec::new();
        let mut channel = RawChannel::new(|cmd: &[u8]| {
            seen.push(cmd.to_vec());
            Ok(vec![0x42, 0x90, 0x00])
        });
        let resp = channel.transmit(&APDU::get_data(0x80, 0x9F, 0x7F)).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.data, vec![0x42]);
        drop(channel);
        assert_eq!(seen, vec![vec![0x80, 0xCA, 0x9F, 0x7F, 0x00]]);
    }

    #[test]
    fn test_raw_channel_short_response() {
        let mut channel = RawChannel::new(|_: &[u8]| Ok(vec![0x90]));
        let err = channel.transmit(&APDU::get_data(0x80, 0x00, 0x66)).unwrap_err();
        assert!(matches!(err, TransportError::Response(APDUError::ResponseTooShort(1))));
    }

    #[test]
    fn test_raw_channel_io_error() {
        let mut channel = RawChannel::new(|_: &[u8]| {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "reader removed").into())
        });
        let err = channel.transmit(&APDU::get_data(0x80, 0x00, 0x66)).unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
