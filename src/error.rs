use std::fmt;

use thiserror::Error;

/// Error type for peck.
///
/// Every error is fatal to the stream it occurred on. Once a parser has
/// returned an error, further calls to [`advance`][crate::Parser::advance]
/// return the same error without consuming input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("the {0} callback failed")]
    Callback(Callback),

    #[error("stream ended at an invalid point in the message")]
    InvalidEofState,

    #[error("combined header size exceeds the limit")]
    HeaderOverflow,

    #[error("data received after a completed non keep-alive message")]
    ClosedConnection,

    #[error("invalid http version")]
    InvalidVersion,

    #[error("invalid response status")]
    InvalidStatus,

    #[error("invalid request method")]
    InvalidMethod,

    #[error("invalid url")]
    InvalidUrl,

    #[error("invalid character in host")]
    InvalidHost,

    #[error("invalid character in port")]
    InvalidPort,

    #[error("invalid character in path")]
    InvalidPath,

    #[error("invalid character in query string")]
    InvalidQueryString,

    #[error("invalid character in fragment")]
    InvalidFragment,

    #[error("expected lf after cr")]
    LfExpected,

    #[error("invalid character in header")]
    InvalidHeaderToken,

    #[error("invalid character in content-length")]
    InvalidContentLength,

    #[error("invalid character in chunk size")]
    InvalidChunkSize,

    #[error("unexpected character where a constant was expected")]
    InvalidConstant,

    #[error("parser is in an invalid internal state")]
    InvalidInternalState,

    #[error("input rejected in strict parsing mode")]
    Strict,

    #[error("unknown error")]
    Unknown,
}

impl Error {
    /// Stable uppercase identifier for the error, such as `HEADER_OVERFLOW`
    /// or `CB_header_value`. Useful for logs and metrics where the human
    /// readable `Display` text is too loose.
    pub fn name(&self) -> &'static str {
        match self {
            Error::Callback(c) => c.error_name(),
            Error::InvalidEofState => "INVALID_EOF_STATE",
            Error::HeaderOverflow => "HEADER_OVERFLOW",
            Error::ClosedConnection => "CLOSED_CONNECTION",
            Error::InvalidVersion => "INVALID_VERSION",
            Error::InvalidStatus => "INVALID_STATUS",
            Error::InvalidMethod => "INVALID_METHOD",
            Error::InvalidUrl => "INVALID_URL",
            Error::InvalidHost => "INVALID_HOST",
            Error::InvalidPort => "INVALID_PORT",
            Error::InvalidPath => "INVALID_PATH",
            Error::InvalidQueryString => "INVALID_QUERY_STRING",
            Error::InvalidFragment => "INVALID_FRAGMENT",
            Error::LfExpected => "LF_EXPECTED",
            Error::InvalidHeaderToken => "INVALID_HEADER_TOKEN",
            Error::InvalidContentLength => "INVALID_CONTENT_LENGTH",
            Error::InvalidChunkSize => "INVALID_CHUNK_SIZE",
            Error::InvalidConstant => "INVALID_CONSTANT",
            Error::InvalidInternalState => "INVALID_INTERNAL_STATE",
            Error::Strict => "STRICT",
            Error::Unknown => "UNKNOWN",
        }
    }
}

/// Identifies which [`Handler`][crate::Handler] callback refused to
/// continue. Carried inside [`Error::Callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    MessageBegin,
    Url,
    HeaderField,
    HeaderValue,
    HeadersComplete,
    Body,
    MessageComplete,
}

impl Callback {
    /// The callback name as it appears on the [`Handler`][crate::Handler]
    /// trait.
    pub fn name(&self) -> &'static str {
        match self {
            Callback::MessageBegin => "on_message_begin",
            Callback::Url => "on_url",
            Callback::HeaderField => "on_header_field",
            Callback::HeaderValue => "on_header_value",
            Callback::HeadersComplete => "on_headers_complete",
            Callback::Body => "on_body",
            Callback::MessageComplete => "on_message_complete",
        }
    }

    fn error_name(&self) -> &'static str {
        match self {
            Callback::MessageBegin => "CB_message_begin",
            Callback::Url => "CB_url",
            Callback::HeaderField => "CB_header_field",
            Callback::HeaderValue => "CB_header_value",
            Callback::HeadersComplete => "CB_headers_complete",
            Callback::Body => "CB_body",
            Callback::MessageComplete => "CB_message_complete",
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
