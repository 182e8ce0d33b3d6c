use std::{error, fmt};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The identity register did not report the expected device address.
    AddressMismatch,
    /// Bus or serial I/O failure underneath the register read.
    Transport,
    /// The sensor did not answer within the response window.
    Timeout,
    /// The response frame came back malformed: bad CRC, wrong station,
    /// a Modbus exception, or a truncated payload.
    InvalidResponse,
}

#[derive(Debug, thiserror::Error)]
pub struct Error {
    kind: ErrorKind,
    repr: Option<Box<dyn error::Error + Send + Sync>>,
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Error
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self::_new(kind, error.into())
    }

    fn _new(kind: ErrorKind, error: Box<dyn error::Error + Send + Sync>) -> Error {
        Error {
            repr: Some(error),
            kind,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(value: ErrorKind) -> Self {
        Error {
            kind: value,
            repr: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Some(e) => write!(f, "{}: {}", self.kind.as_str(), e),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            AddressMismatch => "identity register does not match the expected device address",
            Transport => "transport i/o failure",
            Timeout => "no response from the sensor within the timeout",
            InvalidResponse => "malformed response frame",
        }
    }
}
