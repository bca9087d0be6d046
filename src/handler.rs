/// Receiver of parse events.
///
/// All callbacks have no-op defaults, so an implementation only picks up the
/// events it cares about. Callbacks are invoked synchronously from
/// [`Parser::advance`][crate::Parser::advance], in input order.
///
/// Data callbacks receive a slice of the caller's input buffer. The slice is
/// only valid for the duration of the call; copy it out if it needs to be
/// retained. A single logical element (url, header name, header value, body)
/// can arrive split over several calls when it straddles input buffers —
/// concatenating the slices reconstructs it byte for byte.
///
/// Returning `false` from a callback aborts parsing. The parser records the
/// matching [`Error::Callback`][crate::Error::Callback] code and refuses all
/// further input.
pub trait Handler {
    /// A new message has started.
    fn on_message_begin(&mut self) -> bool {
        true
    }

    /// A piece of the request url. Requests only.
    fn on_url(&mut self, raw: &[u8]) -> bool {
        let _ = raw;
        true
    }

    /// A piece of a header name.
    fn on_header_field(&mut self, raw: &[u8]) -> bool {
        let _ = raw;
        true
    }

    /// A piece of a header value.
    fn on_header_value(&mut self, raw: &[u8]) -> bool {
        let _ = raw;
        true
    }

    /// The header section is complete.
    ///
    /// At this point the scalar readouts on the parser (method, status,
    /// version, content length) are populated. The return value lets the
    /// handler steer body handling, which is how responses to HEAD requests
    /// are dealt with: the parser cannot know the request method for a
    /// response stream, but the caller does, and answers
    /// [`HeadersEnd::SkipBody`] for messages that carry framing headers but
    /// no body.
    fn on_headers_complete(&mut self) -> HeadersEnd {
        HeadersEnd::Continue
    }

    /// A piece of the message body.
    fn on_body(&mut self, raw: &[u8]) -> bool {
        let _ = raw;
        true
    }

    /// The message is complete. On a reusable stream the parser is ready
    /// for the next message once this fires.
    fn on_message_complete(&mut self) -> bool {
        true
    }
}

/// Answer from [`Handler::on_headers_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadersEnd {
    /// Proceed normally.
    Continue,
    /// This message has no body, regardless of its framing headers.
    SkipBody,
    /// Abort parsing with [`Error::Callback`][crate::Error::Callback].
    Abort,
}
