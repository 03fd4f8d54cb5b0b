use bytes::{BufMut, BytesMut};

use crate::{address::AnycastAddress, Error, FLAG_DATA, PAYLOAD_MAX};

/// Application data, delivered once a server has been located.
///
/// Wire layout: `[flag=1][address][payload...][0x00]`. The payload is
/// NUL-terminated rather than length-prefixed, matching the original
/// source's framing; a payload may not itself contain a NUL byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub address: AnycastAddress,
    pub payload: Vec<u8>,
}

impl DataPacket {
    pub fn new(address: AnycastAddress, payload: &[u8]) -> Result<Self, Error> {
        if payload.len() > PAYLOAD_MAX {
            return Err(Error::PayloadTooLong(payload.len()));
        }

        Ok(Self {
            address,
            payload: payload.to_vec(),
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut bytes = BytesMut::with_capacity(2 + self.payload.len() + 1);
        bytes.put_u8(FLAG_DATA);
        bytes.put_u8(self.address.get());
        bytes.extend_from_slice(&self.payload);
        bytes.put_u8(0);
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 3 {
            return Err(Error::TooShort);
        }

        let address = AnycastAddress::new(bytes[1]).map_err(|e| Error::InvalidAddress(e.0))?;

        let body = &bytes[2..];
        let nul_at = body.iter().position(|&b| b == 0).ok_or(Error::Unterminated)?;
        let payload = body[..nul_at].to_vec();

        if payload.len() > PAYLOAD_MAX {
            return Err(Error::PayloadTooLong(payload.len()));
        }

        Ok(Self { address, payload })
    }
}
