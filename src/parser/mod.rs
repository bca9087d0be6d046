//! The byte-by-byte message parser.

use crate::error::{Callback, Error};
use crate::handler::{Handler, HeadersEnd};
use crate::method::Method;
use crate::tables;


const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Hard ceiling over the combined header region of one message, in bytes.
///
/// Start line, header names and header values all count towards this limit.
/// Crossing it fails the stream with [`Error::HeaderOverflow`]. This is the
/// guard that stops a remote peer from tying up a connection with a
/// never-ending header section.
pub const MAX_HEADER_SIZE: usize = 80 * 1024;

/// What kind of stream the parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Parse requests, i.e. the server side of a connection.
    Request,
    /// Parse responses, i.e. the client side of a connection.
    Response,
    /// Decide from the first bytes of the stream. Collapses to `Request`
    /// or `Response` on the first decisive byte and stays collapsed for
    /// subsequent messages on the stream.
    Either,
}

/// Parser states.
///
/// The variant order is significant: every state up to and including
/// `HeadersDone` is part of the header region, which is what the
/// [`MAX_HEADER_SIZE`] accounting keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum State {
    Dead,

    StartReqOrRes,
    ResOrRespH,

    StartRes,
    ResH,
    ResHT,
    ResHTT,
    ResHTTP,
    ResFirstHttpMajor,
    ResHttpMajor,
    ResFirstHttpMinor,
    ResHttpMinor,
    ResFirstStatusCode,
    ResStatusCode,
    ResStatus,
    ResLineAlmostDone,

    StartReq,
    ReqMethod,
    ReqSpacesBeforeUrl,
    ReqSchema,
    ReqSchemaSlash,
    ReqSchemaSlashSlash,
    ReqHost,
    ReqPort,
    ReqPath,
    ReqQueryStringStart,
    ReqQueryString,
    ReqFragmentStart,
    ReqFragment,
    ReqHttpStart,
    ReqHttpH,
    ReqHttpHT,
    ReqHttpHTT,
    ReqHttpHTTP,
    ReqFirstHttpMajor,
    ReqHttpMajor,
    ReqFirstHttpMinor,
    ReqHttpMinor,
    ReqLineAlmostDone,

    HeaderFieldStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    HeaderAlmostDone,
    HeaderValueLws,
    HeadersAlmostDone,
    HeadersDone,

    ChunkSizeStart,
    ChunkSize,
    ChunkParameters,
    ChunkSizeAlmostDone,
    ChunkData,
    ChunkDataAlmostDone,
    ChunkDataDone,
    BodyIdentity,
    BodyIdentityEof,
    MessageDone,
}

impl State {
    fn in_header_region(self) -> bool {
        self != State::Dead && self <= State::HeadersDone
    }

    fn in_url(self) -> bool {
        (State::ReqSchema..=State::ReqFragment).contains(&self)
    }
}

/// Sub-state for the streaming header name/value matcher.
///
/// Runs in lockstep with the `HeaderField`/`HeaderValue` states and prefix
/// matches the handful of header names that affect framing, without ever
/// buffering the name. A mismatch at any position collapses to `General`
/// and the rest of the header is passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    General,
    C,
    Co,
    Con,
    MatchingConnection,
    MatchingProxyConnection,
    MatchingContentLength,
    MatchingTransferEncoding,
    MatchingUpgrade,
    Connection,
    ContentLength,
    TransferEncoding,
    Upgrade,
    MatchingTransferEncodingChunked,
    MatchingConnectionKeepAlive,
    MatchingConnectionClose,
    TransferEncodingChunked,
    ConnectionKeepAlive,
    ConnectionClose,
}

/// Per-message framing facts picked up while parsing headers.
#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    chunked: bool,
    keep_alive: bool,
    close: bool,
    trailing: bool,
    upgrade: bool,
    skip_body: bool,
}

/// An incremental parser for HTTP/1.x messages.
///
/// One parser instance is bound to one logical byte stream, such as one TCP
/// connection, and is reused across successive pipelined messages on that
/// stream. Feed it input as it arrives with [`Parser::advance`]; syntactic
/// elements are reported to a [`Handler`] as slices of the input buffer,
/// without any internal buffering or allocation.
///
/// The parser can be suspended at every byte: `advance` consumes whatever
/// is available and picks up mid-element on the next call.
#[derive(Debug)]
pub struct Parser {
    kind: Kind,
    strict: bool,
    state: State,
    header_state: HeaderState,
    flags: Flags,
    /// Position within the method name or matched header name.
    index: usize,
    /// Bytes consumed in the current header region.
    nread: u32,
    /// Announced body length, remaining body bytes, or remaining chunk
    /// bytes, depending on state. `None` means no length is known.
    content_length: Option<u64>,
    http_major: u16,
    http_minor: u16,
    status_code: u16,
    method: Option<Method>,
    upgrade: bool,
    error: Option<Error>,
}

impl Parser {
    /// Create a parser in the lenient parsing profile.
    ///
    /// The lenient profile accepts a bare LF where CRLF is expected, `_` in
    /// hostnames and bytes with the high bit set in urls.
    pub fn new(kind: Kind) -> Self {
        Self::with_profile(kind, false)
    }

    /// Create a parser that rejects the liberal inputs the lenient profile
    /// lets through, with [`Error::Strict`]. A strict parser also refuses
    /// further messages after a non keep-alive message completed.
    pub fn strict(kind: Kind) -> Self {
        Self::with_profile(kind, true)
    }

    fn with_profile(kind: Kind, strict: bool) -> Self {
        let state = match kind {
            Kind::Request => State::StartReq,
            Kind::Response => State::StartRes,
            Kind::Either => State::StartReqOrRes,
        };

        Parser {
            kind,
            strict,
            state,
            header_state: HeaderState::General,
            flags: Flags::default(),
            index: 0,
            nread: 0,
            content_length: None,
            http_major: 0,
            http_minor: 0,
            status_code: 0,
            method: None,
            upgrade: false,
            error: None,
        }
    }

    /// The kind this parser reads. [`Kind::Either`] collapses once the
    /// first message starts.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The request method. `None` until recognized, and always `None` on
    /// response streams.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    /// The response status code. Valid from headers complete onward.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The response status as an `http` crate status code.
    pub fn status(&self) -> Option<http::StatusCode> {
        http::StatusCode::from_u16(self.status_code).ok()
    }

    /// Major http version. Valid from headers complete onward.
    pub fn http_major(&self) -> u16 {
        self.http_major
    }

    /// Minor http version. Valid from headers complete onward.
    pub fn http_minor(&self) -> u16 {
        self.http_minor
    }

    /// The version as an `http` crate version, for the versions that have a
    /// representation there.
    pub fn version(&self) -> Option<http::Version> {
        let v = match (self.http_major, self.http_minor) {
            (0, 9) => http::Version::HTTP_09,
            (1, 0) => http::Version::HTTP_10,
            (1, 1) => http::Version::HTTP_11,
            _ => return None,
        };
        Some(v)
    }

    /// The announced `Content-Length`, if one was parsed for the current
    /// message. While the body is being consumed this counts down to 0.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// True when the current message ends in a protocol upgrade (an
    /// `Upgrade` header or a CONNECT request). Bytes following the header
    /// terminator are not http and are left unconsumed by
    /// [`Parser::advance`] for the caller to take over.
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// The sticky error, if parsing has failed.
    pub fn error(&self) -> Option<Error> {
        self.error
    }

    /// Whether the connection can be reused for another message once the
    /// current message completes.
    ///
    /// HTTP/1.1 and later persist unless the message said
    /// `Connection: close`. HTTP/1.0 and earlier persist only if it said
    /// `Connection: keep-alive`.
    pub fn should_keep_alive(&self) -> bool {
        if self.http_major > 1 || (self.http_major == 1 && self.http_minor >= 1) {
            !self.flags.close
        } else {
            self.flags.keep_alive
        }
    }

    /// Feed the parser the next chunk of the stream.
    ///
    /// Callbacks on `handler` fire in input order as elements are
    /// recognized. The returned count is the number of bytes consumed. It
    /// is less than `input.len()` in exactly one non-error case: an upgrade
    /// boundary was reached (see [`Parser::is_upgrade`]), and the tail of
    /// the buffer belongs to the caller.
    ///
    /// An empty `input` signals end-of-stream. That is a valid end for a
    /// message whose body runs to eof, and an error
    /// ([`Error::InvalidEofState`]) in the middle of a message.
    ///
    /// Errors are sticky. After an `Err`, every later call returns the same
    /// error and consumes nothing; the stream must be closed.
    pub fn advance<H: Handler>(&mut self, handler: &mut H, input: &[u8]) -> Result<usize, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }

        if input.is_empty() {
            return self.end_of_stream(handler);
        }

        trace!("Advance {} bytes from {:?}", input.len(), self.state);

        // Spans interrupted by the end of the previous buffer continue at
        // the start of this one.
        let mut url_mark: Option<usize> = None;
        let mut header_field_mark: Option<usize> = None;
        let mut header_value_mark: Option<usize> = None;
        let mut body_mark: Option<usize> = None;

        match self.state {
            State::HeaderField => header_field_mark = Some(0),
            State::HeaderValue => header_value_mark = Some(0),
            s if s.in_url() => url_mark = Some(0),
            _ => {}
        }

        let mut i = 0;

        while i < input.len() {
            let b = input[i];

            if self.state.in_header_region() {
                self.nread += 1;
                if self.nread as usize > MAX_HEADER_SIZE {
                    return Err(self.fail(Error::HeaderOverflow));
                }
            }

            // The inner loop re-dispatches the same byte after a state
            // change that must observe it again (`continue`). Falling out
            // of the match moves on to the next byte.
            loop {
                match self.state {
                    State::Dead => {
                        // Stray crlf after a terminal message is tolerated.
                        if b != CR && b != LF {
                            return Err(self.fail(Error::ClosedConnection));
                        }
                    }

                    // ///////////////////////////////////////// start lines

                    State::StartReqOrRes => {
                        if b != CR && b != LF {
                            self.begin_message();

                            if b == b'H' {
                                // "H" starts both HTTP/ and HEAD. Decided
                                // by the next byte.
                                self.state = State::ResOrRespH;
                                if !handler.on_message_begin() {
                                    return Err(self.fail(Error::Callback(Callback::MessageBegin)));
                                }
                            } else {
                                self.kind = Kind::Request;
                                self.state = State::StartReq;
                                continue;
                            }
                        }
                    }

                    State::ResOrRespH => {
                        if b == b'T' {
                            self.kind = Kind::Response;
                            self.state = State::ResHT;
                        } else if b == b'E' {
                            self.kind = Kind::Request;
                            self.method = Some(Method::Head);
                            self.index = 2;
                            self.state = State::ReqMethod;
                        } else {
                            return Err(self.fail(Error::InvalidConstant));
                        }
                    }

                    State::StartRes => match b {
                        b'H' => {
                            self.begin_message();
                            self.state = State::ResH;
                            if !handler.on_message_begin() {
                                return Err(self.fail(Error::Callback(Callback::MessageBegin)));
                            }
                        }
                        CR | LF => {}
                        _ => return Err(self.fail(Error::InvalidConstant)),
                    },

                    State::ResH => {
                        if self.strict && b != b'T' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ResHT;
                    }

                    State::ResHT => {
                        if self.strict && b != b'T' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ResHTT;
                    }

                    State::ResHTT => {
                        if self.strict && b != b'P' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ResHTTP;
                    }

                    State::ResHTTP => {
                        if self.strict && b != b'/' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ResFirstHttpMajor;
                    }

                    State::ResFirstHttpMajor => {
                        if !(b'1'..=b'9').contains(&b) {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                        self.http_major = u16::from(b - b'0');
                        self.state = State::ResHttpMajor;
                    }

                    State::ResHttpMajor => {
                        if b == b'.' {
                            self.state = State::ResFirstHttpMinor;
                        } else if tables::is_num(b) {
                            self.http_major = self.http_major * 10 + u16::from(b - b'0');
                            if self.http_major > 999 {
                                return Err(self.fail(Error::InvalidVersion));
                            }
                        } else {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                    }

                    State::ResFirstHttpMinor => {
                        if !tables::is_num(b) {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                        self.http_minor = u16::from(b - b'0');
                        self.state = State::ResHttpMinor;
                    }

                    State::ResHttpMinor => {
                        if b == b' ' {
                            self.state = State::ResFirstStatusCode;
                        } else if tables::is_num(b) {
                            self.http_minor = self.http_minor * 10 + u16::from(b - b'0');
                            if self.http_minor > 999 {
                                return Err(self.fail(Error::InvalidVersion));
                            }
                        } else {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                    }

                    State::ResFirstStatusCode => {
                        if tables::is_num(b) {
                            self.status_code = u16::from(b - b'0');
                            self.state = State::ResStatusCode;
                        } else if b != b' ' {
                            return Err(self.fail(Error::InvalidStatus));
                        }
                    }

                    State::ResStatusCode => {
                        if tables::is_num(b) {
                            self.status_code = self.status_code * 10 + u16::from(b - b'0');
                            if self.status_code > 999 {
                                return Err(self.fail(Error::InvalidStatus));
                            }
                        } else {
                            match b {
                                b' ' => self.state = State::ResStatus,
                                CR => self.state = State::ResLineAlmostDone,
                                LF => self.state = State::HeaderFieldStart,
                                _ => return Err(self.fail(Error::InvalidStatus)),
                            }
                        }
                    }

                    State::ResStatus => {
                        // The human readable reason phrase. Skipped.
                        if b == CR {
                            self.state = State::ResLineAlmostDone;
                        } else if b == LF {
                            self.state = State::HeaderFieldStart;
                        }
                    }

                    State::ResLineAlmostDone => {
                        if self.strict && b != LF {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::HeaderFieldStart;
                    }

                    State::StartReq => {
                        if b != CR && b != LF {
                            self.begin_message();

                            let m = match Method::tentative(b) {
                                Some(v) => v,
                                None => return Err(self.fail(Error::InvalidMethod)),
                            };
                            self.method = Some(m);
                            self.index = 1;
                            self.state = State::ReqMethod;

                            if !handler.on_message_begin() {
                                return Err(self.fail(Error::Callback(Callback::MessageBegin)));
                            }
                        }
                    }

                    State::ReqMethod => {
                        let m = match self.method {
                            Some(v) => v,
                            None => return Err(self.fail(Error::InvalidInternalState)),
                        };
                        let name = m.as_str().as_bytes();

                        if b == b' ' && self.index == name.len() {
                            self.state = State::ReqSpacesBeforeUrl;
                        } else if self.index < name.len() && b == name[self.index] {
                            // still on the tentative method
                        } else if m == Method::Connect && self.index == 1 && b == b'H' {
                            self.method = Some(Method::Checkout);
                        } else if m == Method::Connect && self.index == 2 && b == b'P' {
                            self.method = Some(Method::Copy);
                        } else if m == Method::Mkcol && self.index == 1 && b == b'O' {
                            self.method = Some(Method::Move);
                        } else if m == Method::Mkcol && self.index == 1 && b == b'E' {
                            self.method = Some(Method::Merge);
                        } else if m == Method::Mkcol && self.index == 1 && b == b'-' {
                            self.method = Some(Method::MSearch);
                        } else if m == Method::Mkcol && self.index == 2 && b == b'A' {
                            self.method = Some(Method::Mkactivity);
                        } else if m == Method::Post && self.index == 1 && b == b'R' {
                            self.method = Some(Method::Propfind);
                        } else if m == Method::Post && self.index == 1 && b == b'U' {
                            self.method = Some(Method::Put);
                        } else if m == Method::Post && self.index == 1 && b == b'A' {
                            self.method = Some(Method::Patch);
                        } else if m == Method::Propfind && self.index == 4 && b == b'P' {
                            self.method = Some(Method::Proppatch);
                        } else if m == Method::Unlock && self.index == 2 && b == b'S' {
                            self.method = Some(Method::Unsubscribe);
                        } else {
                            return Err(self.fail(Error::InvalidMethod));
                        }

                        self.index += 1;
                    }

                    // ///////////////////////////////////////////////// url

                    State::ReqSpacesBeforeUrl => {
                        if b == b' ' {
                            // nothing
                        } else if self.method == Some(Method::Connect) {
                            // CONNECT takes an authority, not a full url.
                            if tables::is_host_char(b, self.strict) {
                                url_mark = Some(i);
                                self.state = State::ReqHost;
                            } else {
                                return Err(self.fail(Error::InvalidUrl));
                            }
                        } else if b == b'/' || b == b'*' {
                            url_mark = Some(i);
                            self.state = State::ReqPath;
                        } else if tables::is_alpha(b) {
                            url_mark = Some(i);
                            self.state = State::ReqSchema;
                        } else {
                            return Err(self.fail(Error::InvalidUrl));
                        }
                    }

                    State::ReqSchema => {
                        if tables::is_alpha(b) {
                            // still in the schema
                        } else if b == b':' {
                            self.state = State::ReqSchemaSlash;
                        } else {
                            return Err(self.fail(Error::InvalidUrl));
                        }
                    }

                    State::ReqSchemaSlash => {
                        if self.strict && b != b'/' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ReqSchemaSlashSlash;
                    }

                    State::ReqSchemaSlashSlash => {
                        if self.strict && b != b'/' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ReqHost;
                    }

                    State::ReqHost => {
                        if !tables::is_host_char(b, self.strict) {
                            match b {
                                b':' => self.state = State::ReqPort,
                                b'/' => self.state = State::ReqPath,
                                b'?' => self.state = State::ReqQueryStringStart,
                                b' ' => {
                                    // "GET http://host.test HTTP/1.1"
                                    self.state = State::ReqHttpStart;
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                _ => return Err(self.fail(Error::InvalidHost)),
                            }
                        }
                    }

                    State::ReqPort => {
                        if !tables::is_num(b) {
                            match b {
                                b'/' => self.state = State::ReqPath,
                                b'?' => self.state = State::ReqQueryStringStart,
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                _ => return Err(self.fail(Error::InvalidPort)),
                            }
                        }
                    }

                    State::ReqPath => {
                        if !tables::is_url_char(b, self.strict) {
                            match b {
                                b'?' => self.state = State::ReqQueryStringStart,
                                b'#' => self.state = State::ReqFragmentStart,
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                CR | LF => {
                                    // No version at all: HTTP/0.9.
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = if b == CR {
                                        State::ReqLineAlmostDone
                                    } else {
                                        State::HeaderFieldStart
                                    };
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                _ => return Err(self.fail(Error::InvalidPath)),
                            }
                        }
                    }

                    State::ReqQueryStringStart | State::ReqQueryString => {
                        if tables::is_url_char(b, self.strict) {
                            self.state = State::ReqQueryString;
                        } else {
                            match b {
                                // Extra '?' stays part of the query.
                                b'?' => {}
                                b'#' => self.state = State::ReqFragmentStart,
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                CR | LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = if b == CR {
                                        State::ReqLineAlmostDone
                                    } else {
                                        State::HeaderFieldStart
                                    };
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                _ => return Err(self.fail(Error::InvalidQueryString)),
                            }
                        }
                    }

                    State::ReqFragmentStart | State::ReqFragment => {
                        if tables::is_url_char(b, self.strict) {
                            self.state = State::ReqFragment;
                        } else {
                            match b {
                                b'?' => self.state = State::ReqFragment,
                                b'#' => {}
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                CR | LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = if b == CR {
                                        State::ReqLineAlmostDone
                                    } else {
                                        State::HeaderFieldStart
                                    };
                                    if let Some(mark) = url_mark.take() {
                                        if !handler.on_url(&input[mark..i]) {
                                            return Err(self.fail(Error::Callback(Callback::Url)));
                                        }
                                    }
                                }
                                _ => return Err(self.fail(Error::InvalidFragment)),
                            }
                        }
                    }

                    // //////////////////////////////////// request version

                    State::ReqHttpStart => match b {
                        b'H' => self.state = State::ReqHttpH,
                        b' ' => {}
                        _ => return Err(self.fail(Error::InvalidConstant)),
                    },

                    State::ReqHttpH => {
                        if self.strict && b != b'T' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ReqHttpHT;
                    }

                    State::ReqHttpHT => {
                        if self.strict && b != b'T' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ReqHttpHTT;
                    }

                    State::ReqHttpHTT => {
                        if self.strict && b != b'P' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ReqHttpHTTP;
                    }

                    State::ReqHttpHTTP => {
                        if self.strict && b != b'/' {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ReqFirstHttpMajor;
                    }

                    State::ReqFirstHttpMajor => {
                        if !(b'1'..=b'9').contains(&b) {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                        self.http_major = u16::from(b - b'0');
                        self.state = State::ReqHttpMajor;
                    }

                    State::ReqHttpMajor => {
                        if b == b'.' {
                            self.state = State::ReqFirstHttpMinor;
                        } else if tables::is_num(b) {
                            self.http_major = self.http_major * 10 + u16::from(b - b'0');
                            if self.http_major > 999 {
                                return Err(self.fail(Error::InvalidVersion));
                            }
                        } else {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                    }

                    State::ReqFirstHttpMinor => {
                        if !tables::is_num(b) {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                        self.http_minor = u16::from(b - b'0');
                        self.state = State::ReqHttpMinor;
                    }

                    State::ReqHttpMinor => {
                        if b == CR {
                            self.state = State::ReqLineAlmostDone;
                        } else if b == LF {
                            self.state = State::HeaderFieldStart;
                        } else if tables::is_num(b) {
                            self.http_minor = self.http_minor * 10 + u16::from(b - b'0');
                            if self.http_minor > 999 {
                                return Err(self.fail(Error::InvalidVersion));
                            }
                        } else {
                            return Err(self.fail(Error::InvalidVersion));
                        }
                    }

                    State::ReqLineAlmostDone => {
                        if b != LF {
                            return Err(self.fail(Error::LfExpected));
                        }
                        self.state = State::HeaderFieldStart;
                    }

                    // ///////////////////////////////////////////// headers

                    State::HeaderFieldStart => {
                        if b == CR {
                            self.state = State::HeadersAlmostDone;
                        } else if b == LF {
                            // A bare lf ends the header section too.
                            self.state = State::HeadersAlmostDone;
                            continue;
                        } else {
                            let c = tables::token(b, self.strict);
                            if c == 0 {
                                return Err(self.fail(Error::InvalidHeaderToken));
                            }

                            header_field_mark = Some(i);
                            self.index = 0;
                            self.state = State::HeaderField;

                            self.header_state = match c {
                                b'c' => HeaderState::C,
                                b'p' => HeaderState::MatchingProxyConnection,
                                b't' => HeaderState::MatchingTransferEncoding,
                                b'u' => HeaderState::MatchingUpgrade,
                                _ => HeaderState::General,
                            };
                        }
                    }

                    State::HeaderField => {
                        let c = tables::token(b, self.strict);

                        if c != 0 {
                            match self.header_state {
                                HeaderState::General => {}

                                HeaderState::C => {
                                    self.index += 1;
                                    self.header_state = if c == b'o' {
                                        HeaderState::Co
                                    } else {
                                        HeaderState::General
                                    };
                                }

                                HeaderState::Co => {
                                    self.index += 1;
                                    self.header_state = if c == b'n' {
                                        HeaderState::Con
                                    } else {
                                        HeaderState::General
                                    };
                                }

                                HeaderState::Con => {
                                    self.index += 1;
                                    self.header_state = match c {
                                        b'n' => HeaderState::MatchingConnection,
                                        b't' => HeaderState::MatchingContentLength,
                                        _ => HeaderState::General,
                                    };
                                }

                                HeaderState::MatchingConnection => {
                                    self.index += 1;
                                    const NAME: &[u8] = b"connection";
                                    if self.index >= NAME.len() || c != NAME[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == NAME.len() - 1 {
                                        self.header_state = HeaderState::Connection;
                                    }
                                }

                                HeaderState::MatchingProxyConnection => {
                                    self.index += 1;
                                    const NAME: &[u8] = b"proxy-connection";
                                    if self.index >= NAME.len() || c != NAME[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == NAME.len() - 1 {
                                        // Treated exactly like connection.
                                        self.header_state = HeaderState::Connection;
                                    }
                                }

                                HeaderState::MatchingContentLength => {
                                    self.index += 1;
                                    const NAME: &[u8] = b"content-length";
                                    if self.index >= NAME.len() || c != NAME[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == NAME.len() - 1 {
                                        self.header_state = HeaderState::ContentLength;
                                    }
                                }

                                HeaderState::MatchingTransferEncoding => {
                                    self.index += 1;
                                    const NAME: &[u8] = b"transfer-encoding";
                                    if self.index >= NAME.len() || c != NAME[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == NAME.len() - 1 {
                                        self.header_state = HeaderState::TransferEncoding;
                                    }
                                }

                                HeaderState::MatchingUpgrade => {
                                    self.index += 1;
                                    const NAME: &[u8] = b"upgrade";
                                    if self.index >= NAME.len() || c != NAME[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == NAME.len() - 1 {
                                        self.header_state = HeaderState::Upgrade;
                                    }
                                }

                                HeaderState::Connection
                                | HeaderState::ContentLength
                                | HeaderState::TransferEncoding
                                | HeaderState::Upgrade => {
                                    // Trailing spaces keep the match.
                                    if b != b' ' {
                                        self.header_state = HeaderState::General;
                                    }
                                }

                                _ => return Err(self.fail(Error::InvalidInternalState)),
                            }
                        } else if b == b':' {
                            self.state = State::HeaderValueStart;
                            if let Some(mark) = header_field_mark.take() {
                                if !handler.on_header_field(&input[mark..i]) {
                                    return Err(self.fail(Error::Callback(Callback::HeaderField)));
                                }
                            }
                        } else {
                            return Err(self.fail(Error::InvalidHeaderToken));
                        }
                    }

                    State::HeaderValueStart => {
                        if b != b' ' && b != b'\t' {
                            header_value_mark = Some(i);
                            self.state = State::HeaderValue;
                            self.index = 0;

                            if b == CR {
                                // Empty value.
                                self.state = State::HeaderAlmostDone;
                                self.header_state = HeaderState::General;
                                if let Some(mark) = header_value_mark.take() {
                                    if !handler.on_header_value(&input[mark..i]) {
                                        return Err(
                                            self.fail(Error::Callback(Callback::HeaderValue))
                                        );
                                    }
                                }
                            } else if b == LF {
                                self.state = State::HeaderFieldStart;
                                if let Some(mark) = header_value_mark.take() {
                                    if !handler.on_header_value(&input[mark..i]) {
                                        return Err(
                                            self.fail(Error::Callback(Callback::HeaderValue))
                                        );
                                    }
                                }
                            } else {
                                let c = tables::lower(b);

                                match self.header_state {
                                    HeaderState::Upgrade => {
                                        // The value itself does not matter.
                                        self.flags.upgrade = true;
                                        self.header_state = HeaderState::General;
                                    }

                                    HeaderState::TransferEncoding => {
                                        self.header_state = if c == b'c' {
                                            HeaderState::MatchingTransferEncodingChunked
                                        } else {
                                            HeaderState::General
                                        };
                                    }

                                    HeaderState::ContentLength => {
                                        if !tables::is_num(b) {
                                            return Err(self.fail(Error::InvalidContentLength));
                                        }
                                        self.content_length = Some(u64::from(b - b'0'));
                                    }

                                    HeaderState::Connection => {
                                        self.header_state = match c {
                                            b'k' => HeaderState::MatchingConnectionKeepAlive,
                                            b'c' => HeaderState::MatchingConnectionClose,
                                            _ => HeaderState::General,
                                        };
                                    }

                                    _ => self.header_state = HeaderState::General,
                                }
                            }
                        }
                    }

                    State::HeaderValue => {
                        if b == CR {
                            self.state = State::HeaderAlmostDone;
                            if let Some(mark) = header_value_mark.take() {
                                if !handler.on_header_value(&input[mark..i]) {
                                    return Err(self.fail(Error::Callback(Callback::HeaderValue)));
                                }
                            }
                        } else if b == LF {
                            self.state = State::HeaderAlmostDone;
                            if let Some(mark) = header_value_mark.take() {
                                if !handler.on_header_value(&input[mark..i]) {
                                    return Err(self.fail(Error::Callback(Callback::HeaderValue)));
                                }
                            }
                            continue;
                        } else {
                            let c = tables::lower(b);

                            match self.header_state {
                                HeaderState::General => {}

                                HeaderState::ContentLength => {
                                    if !tables::is_num(b) {
                                        return Err(self.fail(Error::InvalidContentLength));
                                    }
                                    let digit = u64::from(b - b'0');
                                    let next = self
                                        .content_length
                                        .unwrap_or(0)
                                        .checked_mul(10)
                                        .and_then(|v| v.checked_add(digit));
                                    match next {
                                        Some(v) => self.content_length = Some(v),
                                        None => {
                                            return Err(self.fail(Error::InvalidContentLength))
                                        }
                                    }
                                }

                                HeaderState::MatchingTransferEncodingChunked => {
                                    self.index += 1;
                                    const VALUE: &[u8] = b"chunked";
                                    if self.index >= VALUE.len() || c != VALUE[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == VALUE.len() - 1 {
                                        self.header_state = HeaderState::TransferEncodingChunked;
                                    }
                                }

                                HeaderState::MatchingConnectionKeepAlive => {
                                    self.index += 1;
                                    const VALUE: &[u8] = b"keep-alive";
                                    if self.index >= VALUE.len() || c != VALUE[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == VALUE.len() - 1 {
                                        self.header_state = HeaderState::ConnectionKeepAlive;
                                    }
                                }

                                HeaderState::MatchingConnectionClose => {
                                    self.index += 1;
                                    const VALUE: &[u8] = b"close";
                                    if self.index >= VALUE.len() || c != VALUE[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == VALUE.len() - 1 {
                                        self.header_state = HeaderState::ConnectionClose;
                                    }
                                }

                                HeaderState::TransferEncodingChunked
                                | HeaderState::ConnectionKeepAlive
                                | HeaderState::ConnectionClose => {
                                    // Anything but trailing space voids the
                                    // match. "close, upgrade" is not close.
                                    if b != b' ' {
                                        self.header_state = HeaderState::General;
                                    }
                                }

                                _ => self.header_state = HeaderState::General,
                            }
                        }
                    }

                    State::HeaderAlmostDone => {
                        if self.strict && b != LF {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::HeaderValueLws;
                    }

                    State::HeaderValueLws => {
                        if b == b' ' || b == b'\t' {
                            // Continuation line, folded into the value.
                            self.state = State::HeaderValueStart;
                            continue;
                        }

                        // The header is finished. A whole-value match on a
                        // framing token becomes a flag.
                        match self.header_state {
                            HeaderState::ConnectionKeepAlive => self.flags.keep_alive = true,
                            HeaderState::ConnectionClose => self.flags.close = true,
                            HeaderState::TransferEncodingChunked => self.flags.chunked = true,
                            _ => {}
                        }

                        self.state = State::HeaderFieldStart;
                        continue;
                    }

                    State::HeadersAlmostDone => {
                        if self.strict && b != LF {
                            return Err(self.fail(Error::Strict));
                        }

                        if self.flags.trailing {
                            // Trailer section of a chunked body done, and
                            // with it the message.
                            self.nread = 0;
                            self.state = self.next_message_state();
                            trace!("Chunked message complete");
                            if !handler.on_message_complete() {
                                return Err(self.fail(Error::Callback(Callback::MessageComplete)));
                            }
                        } else {
                            self.state = State::HeadersDone;
                            self.upgrade =
                                self.flags.upgrade || self.method == Some(Method::Connect);

                            match handler.on_headers_complete() {
                                HeadersEnd::Continue => {}
                                HeadersEnd::SkipBody => self.flags.skip_body = true,
                                HeadersEnd::Abort => {
                                    return Err(
                                        self.fail(Error::Callback(Callback::HeadersComplete))
                                    );
                                }
                            }

                            // Select body framing on this same byte.
                            continue;
                        }
                    }

                    State::HeadersDone => {
                        self.nread = 0;

                        trace!(
                            "Headers done: content_length={:?} chunked={} upgrade={}",
                            self.content_length,
                            self.flags.chunked,
                            self.upgrade
                        );

                        if self.upgrade {
                            // Whatever follows is no longer http. Complete
                            // the message and hand the rest of the buffer
                            // back to the caller.
                            self.state = self.next_message_state();
                            if !handler.on_message_complete() {
                                return Err(self.fail(Error::Callback(Callback::MessageComplete)));
                            }
                            return Ok(i + 1);
                        }

                        if self.flags.skip_body {
                            self.state = self.next_message_state();
                            if !handler.on_message_complete() {
                                return Err(self.fail(Error::Callback(Callback::MessageComplete)));
                            }
                        } else if self.flags.chunked {
                            self.state = State::ChunkSizeStart;
                        } else {
                            match self.content_length {
                                Some(0) => {
                                    self.state = self.next_message_state();
                                    if !handler.on_message_complete() {
                                        return Err(
                                            self.fail(Error::Callback(Callback::MessageComplete))
                                        );
                                    }
                                }
                                Some(_) => self.state = State::BodyIdentity,
                                None => {
                                    if self.kind == Kind::Request || self.should_keep_alive() {
                                        // No length anywhere: assume a
                                        // zero length body.
                                        self.state = self.next_message_state();
                                        if !handler.on_message_complete() {
                                            return Err(self
                                                .fail(Error::Callback(Callback::MessageComplete)));
                                        }
                                    } else {
                                        self.state = State::BodyIdentityEof;
                                    }
                                }
                            }
                        }
                    }

                    // //////////////////////////////////////////////// body

                    State::BodyIdentity => {
                        let left = match self.content_length {
                            Some(v) if v > 0 => v,
                            _ => return Err(self.fail(Error::InvalidInternalState)),
                        };

                        let to_read = left.min((input.len() - i) as u64) as usize;

                        if body_mark.is_none() {
                            body_mark = Some(i);
                        }

                        let left = left - to_read as u64;
                        self.content_length = Some(left);
                        i += to_read - 1;

                        if left == 0 {
                            self.state = State::MessageDone;

                            // The body span includes the current byte.
                            // Flush it before running message-done on this
                            // same byte.
                            if let Some(mark) = body_mark.take() {
                                if !handler.on_body(&input[mark..i + 1]) {
                                    return Err(self.fail(Error::Callback(Callback::Body)));
                                }
                            }
                            continue;
                        }
                    }

                    State::BodyIdentityEof => {
                        // Everything up to eof is body.
                        if body_mark.is_none() {
                            body_mark = Some(i);
                        }
                        i = input.len() - 1;
                    }

                    State::MessageDone => {
                        self.state = self.next_message_state();
                        if !handler.on_message_complete() {
                            return Err(self.fail(Error::Callback(Callback::MessageComplete)));
                        }
                    }

                    // ///////////////////////////////////////////// chunked

                    State::ChunkSizeStart => {
                        debug_assert!(self.flags.chunked);

                        let v = tables::unhex(b);
                        if v == -1 {
                            return Err(self.fail(Error::InvalidChunkSize));
                        }
                        self.content_length = Some(v as u64);
                        self.state = State::ChunkSize;
                    }

                    State::ChunkSize => {
                        debug_assert!(self.flags.chunked);

                        if b == CR {
                            self.state = State::ChunkSizeAlmostDone;
                        } else {
                            let v = tables::unhex(b);
                            if v == -1 {
                                if b == b';' || b == b' ' {
                                    self.state = State::ChunkParameters;
                                } else {
                                    return Err(self.fail(Error::InvalidChunkSize));
                                }
                            } else {
                                let next = self
                                    .content_length
                                    .unwrap_or(0)
                                    .checked_mul(16)
                                    .and_then(|x| x.checked_add(v as u64));
                                match next {
                                    Some(x) => self.content_length = Some(x),
                                    None => return Err(self.fail(Error::InvalidChunkSize)),
                                }
                            }
                        }
                    }

                    State::ChunkParameters => {
                        // Chunk extensions are skipped, not parsed.
                        if b == CR {
                            self.state = State::ChunkSizeAlmostDone;
                        }
                    }

                    State::ChunkSizeAlmostDone => {
                        if self.strict && b != LF {
                            return Err(self.fail(Error::Strict));
                        }

                        self.nread = 0;

                        if self.content_length == Some(0) {
                            // The last chunk. Trailers may follow before
                            // the final empty line.
                            self.flags.trailing = true;
                            self.state = State::HeaderFieldStart;
                        } else {
                            self.state = State::ChunkData;
                        }
                    }

                    State::ChunkData => {
                        let left = match self.content_length {
                            Some(v) if v > 0 => v,
                            _ => return Err(self.fail(Error::InvalidInternalState)),
                        };

                        let to_read = left.min((input.len() - i) as u64) as usize;

                        if body_mark.is_none() {
                            body_mark = Some(i);
                        }

                        let left = left - to_read as u64;
                        self.content_length = Some(left);
                        i += to_read - 1;

                        if left == 0 {
                            self.state = State::ChunkDataAlmostDone;
                        }
                    }

                    State::ChunkDataAlmostDone => {
                        debug_assert_eq!(self.content_length, Some(0));

                        if self.strict && b != CR {
                            return Err(self.fail(Error::Strict));
                        }
                        self.state = State::ChunkDataDone;

                        if let Some(mark) = body_mark.take() {
                            if !handler.on_body(&input[mark..i]) {
                                return Err(self.fail(Error::Callback(Callback::Body)));
                            }
                        }
                    }

                    State::ChunkDataDone => {
                        if self.strict && b != LF {
                            return Err(self.fail(Error::Strict));
                        }
                        self.nread = 0;
                        self.state = State::ChunkSizeStart;
                    }
                }

                break;
            }

            i += 1;
        }

        // The buffer ran out with a span still open. Emit what we have;
        // the state is unchanged, so the next call re-marks at offset 0
        // and the span continues seamlessly.
        if let Some(mark) = header_field_mark {
            if !handler.on_header_field(&input[mark..]) {
                return Err(self.fail(Error::Callback(Callback::HeaderField)));
            }
        }
        if let Some(mark) = header_value_mark {
            if !handler.on_header_value(&input[mark..]) {
                return Err(self.fail(Error::Callback(Callback::HeaderValue)));
            }
        }
        if let Some(mark) = url_mark {
            if !handler.on_url(&input[mark..]) {
                return Err(self.fail(Error::Callback(Callback::Url)));
            }
        }
        if let Some(mark) = body_mark {
            if !handler.on_body(&input[mark..]) {
                return Err(self.fail(Error::Callback(Callback::Body)));
            }
        }

        Ok(input.len())
    }

    /// Reset per-message state. The first byte of the message is being
    /// parsed, so the header byte count starts at 1.
    fn begin_message(&mut self) {
        self.flags = Flags::default();
        self.content_length = None;
        self.upgrade = false;
        self.nread = 1;
    }

    fn end_of_stream<H: Handler>(&mut self, handler: &mut H) -> Result<usize, Error> {
        match self.state {
            State::BodyIdentityEof => {
                trace!("Message ended by eof");
                self.state = self.next_message_state();
                if !handler.on_message_complete() {
                    return Err(self.fail(Error::Callback(Callback::MessageComplete)));
                }
                Ok(0)
            }

            // Nothing in flight. A close here is unremarkable.
            State::Dead | State::StartReqOrRes | State::StartReq | State::StartRes => Ok(0),

            _ => Err(self.fail(Error::InvalidEofState)),
        }
    }

    /// Where to go once a message completes.
    fn next_message_state(&self) -> State {
        if self.strict && !self.should_keep_alive() {
            State::Dead
        } else {
            self.start_state()
        }
    }

    fn start_state(&self) -> State {
        match self.kind {
            Kind::Request => State::StartReq,
            Kind::Response => State::StartRes,
            Kind::Either => State::StartReqOrRes,
        }
    }

    fn fail(&mut self, e: Error) -> Error {
        self.error = Some(e);
        e
    }
}
