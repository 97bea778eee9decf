use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidPriority(String),
    PayloadTooLarge(usize),
    InvalidText(&'static str),
    InvalidKey(&'static str),
    QueueNotFound,
    QueueFull,
    QueueRemoved,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::InvalidPriority(value) => {
                write!(f, "invalid priority (expected 1..=3): {value}")
            }
            Error::PayloadTooLarge(len) => write!(f, "payload too large: {len} bytes"),
            Error::InvalidText(msg) => write!(f, "invalid message text: {msg}"),
            Error::InvalidKey(msg) => write!(f, "invalid queue key: {msg}"),
            Error::QueueNotFound => write!(f, "message queue not found"),
            Error::QueueFull => write!(f, "message queue full"),
            Error::QueueRemoved => write!(f, "message queue removed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
