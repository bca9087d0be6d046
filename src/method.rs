use std::fmt;

/// Request methods recognized by the parser.
///
/// The set matches what the parser's streaming matcher can recognize: the
/// RFC 2616 methods plus the WebDAV and UPnP extensions commonly seen on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Method {
    Delete,
    Get,
    Head,
    Post,
    Put,
    Connect,
    Options,
    Trace,
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    Report,
    Mkactivity,
    Checkout,
    Merge,
    MSearch,
    Notify,
    Subscribe,
    Unsubscribe,
    Patch,
}

impl Method {
    /// All recognized methods.
    pub const ALL: [Method; 24] = [
        Method::Delete,
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Copy,
        Method::Lock,
        Method::Mkcol,
        Method::Move,
        Method::Propfind,
        Method::Proppatch,
        Method::Unlock,
        Method::Report,
        Method::Mkactivity,
        Method::Checkout,
        Method::Merge,
        Method::MSearch,
        Method::Notify,
        Method::Subscribe,
        Method::Unsubscribe,
        Method::Patch,
    ];

    /// The method name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Copy => "COPY",
            Method::Lock => "LOCK",
            Method::Mkcol => "MKCOL",
            Method::Move => "MOVE",
            Method::Propfind => "PROPFIND",
            Method::Proppatch => "PROPPATCH",
            Method::Unlock => "UNLOCK",
            Method::Report => "REPORT",
            Method::Mkactivity => "MKACTIVITY",
            Method::Checkout => "CHECKOUT",
            Method::Merge => "MERGE",
            Method::MSearch => "M-SEARCH",
            Method::Notify => "NOTIFY",
            Method::Subscribe => "SUBSCRIBE",
            Method::Unsubscribe => "UNSUBSCRIBE",
            Method::Patch => "PATCH",
        }
    }

    /// The tentative method selected by the first byte of the request line.
    ///
    /// Methods sharing an initial are disambiguated by the matcher as later
    /// bytes arrive.
    pub(crate) fn tentative(first: u8) -> Option<Method> {
        let m = match first {
            b'C' => Method::Connect,
            b'D' => Method::Delete,
            b'G' => Method::Get,
            b'H' => Method::Head,
            b'L' => Method::Lock,
            b'M' => Method::Mkcol,
            b'N' => Method::Notify,
            b'O' => Method::Options,
            b'P' => Method::Post,
            b'R' => Method::Report,
            b'S' => Method::Subscribe,
            b'T' => Method::Trace,
            b'U' => Method::Unlock,
            _ => return None,
        };
        Some(m)
    }

    /// Convert to the `http` crate method.
    pub fn to_http(self) -> http::Method {
        match self {
            Method::Delete => http::Method::DELETE,
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Connect => http::Method::CONNECT,
            Method::Options => http::Method::OPTIONS,
            Method::Trace => http::Method::TRACE,
            Method::Patch => http::Method::PATCH,
            // The extension methods are all valid tokens.
            m => http::Method::from_bytes(m.as_str().as_bytes()).expect("a valid method token"),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
