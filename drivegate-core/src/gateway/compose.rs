//! Response composition
//!
//! Headers are accumulated in a [`HeaderDraft`] and only turned into a
//! response once the pipeline knows everything it needs (for streamed files,
//! after the content type has been sniffed).

use crate::archive::ByteStream;
use crate::content::accept_wants_html;
use crate::error::GatewayError;
use bytes::Bytes;
use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::{
    HeaderName, HeaderValue, ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL,
    CONTENT_LENGTH, CONTENT_RANGE, CONTENT_SECURITY_POLICY, CONTENT_TYPE, LOCATION,
};
use hyper::{HeaderMap, Response, StatusCode};

use super::range::RangePlan;

pub type RespBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub fn full(chunk: impl Into<Bytes>) -> RespBody {
    Full::new(chunk.into()).map_err(|never| match never {}).boxed_unsync()
}

pub fn empty() -> RespBody {
    full(Bytes::new())
}

pub fn streamed(stream: ByteStream) -> RespBody {
    StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
}

/// Status and headers of a response that has not been sent yet
#[derive(Debug, Clone)]
pub struct HeaderDraft {
    status: StatusCode,
    headers: HeaderMap,
}

impl HeaderDraft {
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new() }
    }

    /// Length and range headers for a planned entry
    pub fn for_range(plan: &RangePlan) -> Self {
        let mut draft = Self::new(plan.status);
        draft.set(ACCEPT_RANGES, "bytes");
        if let Some(content_range) = &plan.content_range {
            draft.set(CONTENT_RANGE, content_range);
        }
        if let Some(len) = plan.content_length {
            draft.set(CONTENT_LENGTH, len.to_string());
        }
        draft
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header, replacing any earlier value.
    ///
    /// Values that are not valid header text are dropped with a warning.
    pub fn set(&mut self, name: HeaderName, value: impl AsRef<str>) -> &mut Self {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(_) => {
                log::warn!(target: "drivegate::compose", "dropping invalid {} header value", name);
            }
        }
        self
    }

    pub fn remove(&mut self, name: &HeaderName) {
        self.headers.remove(name);
    }

    /// Security policy, permissive CORS and disabled caching
    pub fn with_policy(mut self, csp: &str) -> Self {
        self.set(CONTENT_SECURITY_POLICY, csp)
            .set(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .set(CACHE_CONTROL, "no-cache");
        self
    }

    pub fn commit(self, body: RespBody) -> Response<RespBody> {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// 303 to `location` with an empty body
pub fn redirect(location: &str) -> Response<RespBody> {
    let mut draft = HeaderDraft::new(StatusCode::SEE_OTHER);
    draft.set(LOCATION, location);
    draft.commit(empty())
}

/// Inline document with a fixed content type
pub fn inline(draft: HeaderDraft, content_type: &str, content: impl Into<Bytes>) -> Response<RespBody> {
    let mut draft = draft;
    draft.set(CONTENT_TYPE, content_type);
    let content: Bytes = content.into();
    if draft.status() == StatusCode::OK {
        draft.set(CONTENT_LENGTH, content.len().to_string());
    }
    draft.commit(full(content))
}

/// Error response: a themed page for clients that want HTML, a bare status
/// code otherwise
pub fn error_response(
    err: &GatewayError,
    accept: Option<&str>,
    request_url: &str,
    error_page_csp: &str,
) -> Response<RespBody> {
    let status = err.status();
    if !accept_wants_html(accept) {
        return HeaderDraft::new(status).commit(empty());
    }

    let mut draft = HeaderDraft::new(status);
    draft
        .set(CONTENT_TYPE, "text/html")
        .set(CONTENT_SECURITY_POLICY, error_page_csp)
        .set(ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    draft.commit(full(err.page(request_url).render()))
}
