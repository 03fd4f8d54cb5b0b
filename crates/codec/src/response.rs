use bytes::{BufMut, BytesMut};

use crate::{address::AnycastAddress, Error, FLAG_RESPONSE};

/// Sent by a server back to a flood originator: "I can serve this address."
///
/// Wire layout (3 bytes): `[flag=0][seq][address]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePacket {
    pub seq: u8,
    pub address: AnycastAddress,
}

impl ResponsePacket {
    pub fn new(seq: u8, address: AnycastAddress) -> Self {
        Self { seq, address }
    }

    pub fn encode(&self) -> BytesMut {
        let mut bytes = BytesMut::with_capacity(3);
        bytes.put_u8(FLAG_RESPONSE);
        bytes.put_u8(self.seq);
        bytes.put_u8(self.address.get());
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 3 {
            return Err(Error::TooShort);
        }

        let seq = bytes[1];
        let address = AnycastAddress::new(bytes[2]).map_err(|e| Error::InvalidAddress(e.0))?;

        Ok(Self { seq, address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let addr = AnycastAddress::new(10).unwrap();
        let packet = ResponsePacket::new(200, addr);
        let bytes = packet.encode();
        assert_eq!(ResponsePacket::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(ResponsePacket::decode(&[0, 1]), Err(Error::TooShort));
    }

    #[test]
    fn rejects_invalid_address() {
        assert_eq!(
            ResponsePacket::decode(&[0, 1, 0]),
            Err(Error::InvalidAddress(0))
        );
    }
}
