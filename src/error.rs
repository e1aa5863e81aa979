use std::{error, fmt, io};

use crate::packet;

/// Errors returned by the resolver client, the fetch client and the session loop.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The name entered by the user is not a valid domain name.
    InvalidName(packet::Error),
    /// The resolver sent a reply that could not be decoded.
    Decode(packet::Error),
    /// A socket could not be opened, connected, or written to.
    Connection(io::Error),
    /// A connect or receive operation did not complete within the configured timeout.
    Timeout,
    /// Reading from or writing to the console failed.
    Io(io::Error),
}

/// The category of an [`Error`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidName,
    Decode,
    Connection,
    Timeout,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName(_) => ErrorKind::InvalidName,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Timeout => ErrorKind::Timeout,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Classifies an I/O error raised by a network socket.
    ///
    /// Sockets with a read timeout report expiry as either `WouldBlock` or `TimedOut`, depending
    /// on the platform.
    pub(crate) fn from_socket(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout,
            _ => Error::Connection(e),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidName(e) => write!(f, "invalid domain name: {}", e),
            Error::Decode(e) => write!(f, "malformed resolver reply: {}", e),
            Error::Connection(e) => write!(f, "connection error: {}", e),
            Error::Timeout => f.write_str("timed out waiting for a reply"),
            Error::Io(e) => write!(f, "console i/o error: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::InvalidName(e) | Error::Decode(e) => Some(e),
            Error::Connection(e) | Error::Io(e) => Some(e),
            Error::Timeout => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Connection(e) | Error::Io(e) => e,
            Error::Timeout => io::Error::new(io::ErrorKind::TimedOut, Error::Timeout),
            Error::InvalidName(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
            Error::Decode(_) => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_errors() {
        let e = Error::from_socket(io::ErrorKind::WouldBlock.into());
        assert_eq!(e.kind(), ErrorKind::Timeout);
        let e = Error::from_socket(io::ErrorKind::TimedOut.into());
        assert_eq!(e.kind(), ErrorKind::Timeout);
        let e = Error::from_socket(io::ErrorKind::ConnectionRefused.into());
        assert_eq!(e.kind(), ErrorKind::Connection);
    }

    #[test]
    fn into_io_error() {
        let e: io::Error = Error::Decode(packet::Error::Eof).into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        assert_eq!(e.to_string(), "malformed resolver reply: unexpected end of data");

        let e: io::Error = Error::Timeout.into();
        assert_eq!(e.kind(), io::ErrorKind::TimedOut);
    }
}
