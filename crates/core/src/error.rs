use thiserror::Error;

/// Failures returned synchronously from application-facing calls.
///
/// Address-range validation is not one of these: `AnycastAddress` is a
/// validated newtype, so an out-of-range address cannot be constructed in
/// the first place and the original source's address-range-check bug has no
/// counterpart here. Remote unavailability is not represented here either —
/// it is reported later, out of band, via [`crate::ConnectionHandler::timedout`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    #[error("payload of {0} bytes exceeds the payload limit")]
    PayloadTooLong(usize),
    #[error("pending-send buffer is full")]
    BufferFull,
    #[error("connection is closed")]
    Closed,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ListenError {
    #[error("bind table is full")]
    TableFull,
    #[error("connection is closed")]
    Closed,
}

/// The two failure modes a client-initiated send can time out with.
///
/// Mirrors `ERR_NO_SERVER_FOUND` / `ERR_NO_ROUTE` from the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeoutReason {
    NoServerFound = 0,
    NoRoute = 1,
}
