//! Wire formats for the anycast protocol.
//!
//! Two packet kinds travel over the mesh primitive, distinguished by a
//! single flag byte:
//!
//! - [`ResponsePacket`] (flag `0`) — a server announcing it can serve an
//!   address, sent back to the flood originator.
//! - [`DataPacket`] (flag `1`) — the actual application payload, sent once
//!   the client has learned which node to talk to.

mod address;
mod data;
mod response;

pub use address::{AnycastAddress, AnycastAddressError, NodeAddress};
pub use data::DataPacket;
pub use response::ResponsePacket;

use thiserror::Error;

/// Maximum payload length carried by a single [`DataPacket`].
///
/// The original source used `103` in one header and `50` elsewhere; this
/// implementation fixes a single value.
pub const PAYLOAD_MAX: usize = 64;

pub(crate) const FLAG_RESPONSE: u8 = 0;
pub(crate) const FLAG_DATA: u8 = 1;

/// Decoding and encoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("packet is shorter than the minimum frame size")]
    TooShort,
    #[error("unrecognized flag byte: {0}")]
    UnknownFlag(u8),
    #[error("data packet is missing its NUL terminator")]
    Unterminated,
    #[error("payload of {0} bytes exceeds the {max} byte limit", max = PAYLOAD_MAX)]
    PayloadTooLong(usize),
    #[error("anycast address {0} is out of the valid 1..=254 range")]
    InvalidAddress(u8),
}

/// The result of classifying a received mesh packet by its flag byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Response(ResponsePacket),
    Data(DataPacket),
}

/// Classify and decode a mesh packet's first byte.
///
/// # Examples
///
/// ```
/// use anycast_codec::{decode, DecodeResult, ResponsePacket, AnycastAddress};
///
/// let addr = AnycastAddress::new(7).unwrap();
/// let packet = ResponsePacket::new(42, addr);
/// let bytes = packet.encode();
///
/// match decode(&bytes).unwrap() {
///     DecodeResult::Response(r) => assert_eq!(r, packet),
///     DecodeResult::Data(_) => panic!("expected a response"),
/// }
/// ```
pub fn decode(bytes: &[u8]) -> Result<DecodeResult, Error> {
    let flag = *bytes.first().ok_or(Error::TooShort)?;
    match flag {
        FLAG_RESPONSE => ResponsePacket::decode(bytes).map(DecodeResult::Response),
        FLAG_DATA => DataPacket::decode(bytes).map(DecodeResult::Data),
        other => Err(Error::UnknownFlag(other)),
    }
}
