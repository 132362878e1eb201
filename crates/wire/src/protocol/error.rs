use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("read error: {source}")]
    ReadError {
        #[from]
        source: ParseError,
    },

    #[error("write error: {source}")]
    WriteError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("body size too large, declared: {length} exceed the limit {max_size}")]
    TooLargeBody { length: u64, max_size: u64 },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {version:?}")]
    InvalidVersion { version: String },

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid http status: {status:?}")]
    InvalidStatus { status: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("unsupported charset: {charset:?}")]
    UnsupportedCharset { charset: String },

    #[error("a timeout of {timeout:?} has occurred while reading an http message")]
    Timeout { timeout: Duration },

    #[error("malformed http message: {source}")]
    Malformed {
        #[source]
        source: Box<ParseError>,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_large_body(length: u64, max_size: u64) -> Self {
        Self::TooLargeBody { length, max_size }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_version<S: ToString>(str: S) -> Self {
        Self::InvalidVersion { version: str.to_string() }
    }

    pub fn invalid_status<S: ToString>(str: S) -> Self {
        Self::InvalidStatus { status: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unsupported_charset<S: ToString>(str: S) -> Self {
        Self::UnsupportedCharset { charset: str.to_string() }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn malformed(source: ParseError) -> Self {
        Self::Malformed { source: Box::new(source) }
    }

    /// Returns true if the read was cancelled by its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the read failed for any reason other than its deadline.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("response stream has been closed")]
    Disposed,

    #[error("response stream does not support {operation}")]
    Unsupported { operation: &'static str },

    #[error("invalid response head: {reason}")]
    InvalidHead { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    pub fn invalid_head<S: ToString>(str: S) -> Self {
        Self::InvalidHead { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

impl From<SendError> for io::Error {
    fn from(e: SendError) -> Self {
        match e {
            SendError::Io { source } => source,
            SendError::Disposed => io::Error::new(io::ErrorKind::BrokenPipe, e),
            SendError::Unsupported { .. } => io::Error::new(io::ErrorKind::Unsupported, e),
            SendError::InvalidHead { .. } => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
