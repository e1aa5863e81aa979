use std::{fmt, io};

/// Errors that may occur while encoding or decoding a DNS message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// The end of the message was reached while more data was expected.
    Eof,
    /// A domain name pointer pointed into itself or further into the message.
    PointerLoop,
    /// A field was set to an invalid (reserved or unexpected) value.
    InvalidValue,
    /// The message was not a response, although a response was expected.
    NotAResponse,
    /// Only returned from [`MessageEncoder::finish`], indicates that there was not enough space in
    /// the provided buffer to fit the entire message.
    ///
    /// [`MessageEncoder::finish`]: super::encoder::MessageEncoder::finish
    Truncated,
    /// An empty label was encountered where it is not allowed.
    InvalidEmptyLabel,
    /// A label exceeded the maximum allowable length of a label.
    LabelTooLong,
    /// A domain name exceeded 255 bytes in its wire encoding.
    NameTooLong,
}

impl Error {
    fn description(&self) -> &str {
        match self {
            Error::Eof => "unexpected end of data",
            Error::PointerLoop => "encountered domain name pointer loop",
            Error::InvalidValue => "invalid value",
            Error::NotAResponse => "message is not a response",
            Error::Truncated => "packet truncated",
            Error::InvalidEmptyLabel => "invalid empty label",
            Error::LabelTooLong => "label too long",
            Error::NameTooLong => "domain name too long",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for Error {}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Eof => io::ErrorKind::UnexpectedEof.into(),
            Error::PointerLoop | Error::InvalidValue | Error::NotAResponse => {
                io::Error::new(io::ErrorKind::InvalidData, e)
            }
            Error::InvalidEmptyLabel | Error::LabelTooLong | Error::NameTooLong => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            Error::Truncated => io::Error::new(io::ErrorKind::WriteZero, e),
        }
    }
}
