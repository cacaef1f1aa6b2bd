//! Response construction.
//!
//! # Responsibilities
//! - Turn a handler's reply into an `http::Response`
//! - Stamp the configured protocol version
//! - Move trailers and the declared length into the response body
//! - Record which request produced the response
//!
//! # Design Decisions
//! - Headers are copied verbatim; nothing is added or stripped
//! - Reserved 59x codes pass through unchanged
//! - No compression and no TLS state is ever attached

use http::{Method, Request, Response, StatusCode, Uri, Version};

use crate::error::{Error, Result};
use crate::http::reply::{Reply, ReplyBody};

/// Response extension naming the request a mock response answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub method: Method,
    pub uri: Uri,
}

/// Builds responses from replies.
#[derive(Debug, Clone, Copy)]
pub struct ResponseBuilder {
    version: Version,
}

impl ResponseBuilder {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Build the response for `reply`, answering `request`.
    ///
    /// Fails when the reply carries a status outside `100..=999`.
    pub fn build<B>(&self, reply: Reply, request: &Request<B>) -> Result<Response<ReplyBody>> {
        let status = StatusCode::from_u16(reply.status).map_err(|e| {
            tracing::error!(status = reply.status, "Reply carries an invalid status code");
            Error::ResponseBuild(format!(
                "invalid reply status {} for {} {}: {}",
                reply.status,
                request.method(),
                request.uri(),
                e
            ))
        })?;

        tracing::debug!(
            status = status.as_u16(),
            length = ?reply.length,
            "Building response"
        );

        let Reply {
            headers,
            trailers,
            mut body,
            length,
            ..
        } = reply;
        body.set_length(length);
        body.set_trailers(trailers);

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.version_mut() = self.version;
        *response.headers_mut() = headers;
        response.extensions_mut().insert(InterceptedRequest {
            method: request.method().clone(),
            uri: request.uri().clone(),
        });
        Ok(response)
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new(Version::HTTP_11)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderName, HeaderValue};

    fn request() -> Request<()> {
        Request::builder()
            .method(Method::GET)
            .uri("https://hello.world/")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_build_copies_reply() {
        let msg = "the quick brown fox jumped over the hen house to escape the farmer";
        let reply = Reply::text(200, msg)
            .with_header(HeaderName::from_static("x-msg"), HeaderValue::from_static("hi"))
            .with_trailer(HeaderName::from_static("x-done"), HeaderValue::from_static("1"));

        let response = ResponseBuilder::default().build(reply, &request()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.version(), Version::HTTP_11);
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get("x-msg").unwrap(), "hi");
        assert_eq!(
            response.extensions().get::<InterceptedRequest>().unwrap().uri,
            "https://hello.world/"
        );

        let body = response.into_body();
        assert_eq!(body.content_length(), Some(msg.len() as u64));
        assert_eq!(body.trailers().unwrap().get("x-done").unwrap(), "1");
        assert_eq!(body.into_string().unwrap(), msg);
    }

    #[test]
    fn test_build_keeps_reserved_status() {
        for code in [405, 595, 596, 597] {
            let response = ResponseBuilder::default()
                .build(Reply::new(code), &request())
                .unwrap();
            assert_eq!(response.status().as_u16(), code);
        }
    }

    #[test]
    fn test_build_uses_configured_version() {
        let response = ResponseBuilder::new(Version::HTTP_2)
            .build(Reply::new(204), &request())
            .unwrap();
        assert_eq!(response.version(), Version::HTTP_2);
    }

    #[test]
    fn test_build_rejects_invalid_status() {
        for code in [0, 42, 1000] {
            let result = ResponseBuilder::default().build(Reply::new(code), &request());
            assert!(matches!(result, Err(Error::ResponseBuild(_))));
        }
    }
}
