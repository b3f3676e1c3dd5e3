use std::fmt;


/// Errors raised while loading data, setting up training or
/// persisting parameters.
///
/// Shape mismatches inside tensor math are not reported here.
/// They are programming errors and panic right away.

#[derive(Debug)]
pub enum Error {
  Io(std::io::Error),
  Format(String),
  InvalidData(String),
  Serialize(postcard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Io(err) => write!(f, "io error: {err}"),
      Error::Format(msg) => write!(f, "invalid format: {msg}"),
      Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
      Error::Serialize(err) => write!(f, "serialization failed: {err}"),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Error::Io(err) => Some(err),
      Error::Serialize(err) => Some(err),
      _ => None,
    }
  }
}

impl From<std::io::Error> for Error {
  fn from(err: std::io::Error) -> Self {
    Error::Io(err)
  }
}

impl From<postcard::Error> for Error {
  fn from(err: postcard::Error) -> Self {
    Error::Serialize(err)
  }
}
