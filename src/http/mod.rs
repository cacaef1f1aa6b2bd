//! HTTP-facing types of the mock transport.
//!
//! # Data Flow
//! ```text
//! http::Request<B>
//!     → transport.rs (tower::Service entry, body collected into Bytes)
//!     → [router resolves a handler]
//!     → call.rs (URL + request handed to the handler)
//!     → reply.rs (status, headers, body, trailers from the handler)
//!     → response.rs (reply + request → http::Response<ReplyBody>)
//! ```
//!
//! # Design Decisions
//! - Responses never carry compression or TLS metadata
//! - Reserved statuses live in status.rs, never reused by handlers
//! - Body is readable both as `io::Read` and as a hyper `Body`

pub mod call;
pub mod headers;
pub mod reply;
pub mod response;
pub mod status;
pub mod transport;

pub use call::Call;
pub use headers::{equal_headers, HeaderMismatch};
pub use reply::{Reply, ReplyBody};
pub use response::{InterceptedRequest, ResponseBuilder};
pub use transport::MockTransport;
