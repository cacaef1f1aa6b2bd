//! Reply descriptor produced by mock handlers, and its body.

use std::fmt;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{HeaderMap, HeaderName, HeaderValue};
use hyper::body::{Body, Buf, Bytes, Frame, SizeHint};

const CHUNK_SIZE: usize = 8 * 1024;

enum Kind {
    Empty,
    Full(Bytes),
    Reader(Box<dyn Read + Send>),
}

/// Body of a reply.
///
/// Readable synchronously through [`Read`] and asynchronously as an
/// [`http_body`](hyper::body::Body) stream. Trailers, when present, are
/// yielded as the last frame of the stream.
pub struct ReplyBody {
    kind: Kind,
    length: Option<u64>,
    trailers: Option<HeaderMap>,
}

impl ReplyBody {
    pub fn empty() -> Self {
        Self {
            kind: Kind::Empty,
            length: None,
            trailers: None,
        }
    }

    /// A fixed-length body holding `s`.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from(Bytes::from(s.into()))
    }

    /// A body streamed out of `reader`. The reader is dropped with the body.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            kind: Kind::Reader(Box::new(reader)),
            length: None,
            trailers: None,
        }
    }

    /// The declared content length, if the reply set one.
    pub fn content_length(&self) -> Option<u64> {
        self.length
    }

    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.trailers.as_ref()
    }

    pub(crate) fn set_length(&mut self, length: Option<u64>) {
        self.length = length;
    }

    pub(crate) fn set_trailers(&mut self, trailers: Option<HeaderMap>) {
        self.trailers = trailers;
    }

    /// Read the remaining body into memory.
    pub fn into_bytes(mut self) -> io::Result<Bytes> {
        match std::mem::replace(&mut self.kind, Kind::Empty) {
            Kind::Empty => Ok(Bytes::new()),
            Kind::Full(bytes) => Ok(bytes),
            Kind::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Read the remaining body as UTF-8 text.
    pub fn into_string(self) -> io::Result<String> {
        let bytes = self.into_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Default for ReplyBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ReplyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Empty => "empty".to_string(),
            Kind::Full(bytes) => format!("{} bytes", bytes.len()),
            Kind::Reader(_) => "reader".to_string(),
        };
        f.debug_struct("ReplyBody")
            .field("kind", &kind)
            .field("length", &self.length)
            .field("trailers", &self.trailers)
            .finish()
    }
}

impl From<Bytes> for ReplyBody {
    fn from(bytes: Bytes) -> Self {
        Self {
            kind: Kind::Full(bytes),
            length: None,
            trailers: None,
        }
    }
}

impl From<Vec<u8>> for ReplyBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for ReplyBody {
    fn from(s: String) -> Self {
        Self::from(Bytes::from(s))
    }
}

impl From<&str> for ReplyBody {
    fn from(s: &str) -> Self {
        Self::from(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl Read for ReplyBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Empty => Ok(0),
            Kind::Full(bytes) => {
                let n = buf.len().min(bytes.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                bytes.advance(n);
                Ok(n)
            }
            Kind::Reader(reader) => reader.read(buf),
        }
    }
}

impl Body for ReplyBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match std::mem::replace(&mut this.kind, Kind::Empty) {
            Kind::Empty => {}
            Kind::Full(bytes) => {
                if !bytes.is_empty() {
                    return Poll::Ready(Some(Ok(Frame::data(bytes))));
                }
            }
            Kind::Reader(mut reader) => {
                let mut chunk = vec![0u8; CHUNK_SIZE];
                match reader.read(&mut chunk) {
                    Ok(0) => {}
                    Ok(n) => {
                        chunk.truncate(n);
                        this.kind = Kind::Reader(reader);
                        return Poll::Ready(Some(Ok(Frame::data(Bytes::from(chunk)))));
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                        this.kind = Kind::Reader(reader);
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    Err(e) => return Poll::Ready(Some(Err(e))),
                }
            }
        }
        Poll::Ready(this.trailers.take().map(|t| Ok(Frame::trailers(t))))
    }

    fn is_end_stream(&self) -> bool {
        matches!(self.kind, Kind::Empty) && self.trailers.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match (&self.kind, self.length) {
            (Kind::Empty, _) => SizeHint::with_exact(0),
            (Kind::Full(bytes), _) => SizeHint::with_exact(bytes.len() as u64),
            (Kind::Reader(_), Some(length)) => SizeHint::with_exact(length),
            (Kind::Reader(_), None) => SizeHint::default(),
        }
    }
}

/// What a handler answers with.
///
/// Ownership passes to the response builder once the handler returns.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    pub trailers: Option<HeaderMap>,
    pub body: ReplyBody,
    /// Declared content length, copied to the response untouched.
    pub length: Option<u64>,
}

impl Reply {
    /// An empty reply with `status`.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            trailers: None,
            body: ReplyBody::empty(),
            length: None,
        }
    }

    /// A text reply whose declared length is the length of `msg`.
    pub fn text(status: u16, msg: impl Into<String>) -> Self {
        Self::new(status).with_body(Bytes::from(msg.into()))
    }

    /// Set a fixed body and declare its length.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.length = Some(body.len() as u64);
        self.body = ReplyBody::from(body);
        self
    }

    /// Set a streamed body, leaving the declared length as it is.
    pub fn with_stream(mut self, body: ReplyBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_trailer(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.trailers
            .get_or_insert_with(HeaderMap::new)
            .append(name, value);
        self
    }
}
