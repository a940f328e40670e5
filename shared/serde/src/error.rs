use thiserror::Error;

/// Returned when a read would run past the end of the bit stream, or when the
/// bits read do not describe a valid value (bad enum index, invalid UTF-8).
///
/// Either case means the sender and receiver disagree about the layout of the
/// stream, so the remainder of the packet cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed bit stream: value could not be read")]
pub struct SerdeErr;
