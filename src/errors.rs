/// All error types that can occur when talking to LIFX devices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network socket operation failed while communicating with devices.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// A frame handed to the codec could not be decoded.
    #[error("frame decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// A color or temperature value lies outside the range accepted for its scale.
    #[error("{field} value {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new out of range error
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Error::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }
}

/// Errors produced while decoding a datagram into a [`crate::Frame`].
///
/// Devices on a shared broadcast domain send plenty of traffic this crate does
/// not understand, so the receive loops drop these silently. They only reach
/// the caller through [`crate::decode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer is too short or its contents are structurally invalid.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The size declared in the header disagrees with the buffer length.
    #[error("frame size mismatch: header declares {declared} bytes, buffer holds {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    /// The message type is not one the codec recognizes.
    #[error("unknown message type {0}")]
    UnknownMessageType(u16),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::MalformedFrame(format!("truncated payload: {err}"))
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
