//! The `dat://` request pipeline
//!
//! ```text
//! validate -> resolve name -> open drive -> checkout -> manifest
//!          -> negotiate handler -> (handler shell | zip | entry)
//!          -> resolve path -> range -> serve
//! ```
//!
//! A [`DeadlineGuard`] races the whole pipeline. The pipeline runs in its
//! own task so that an expired deadline can abort it, and both sides report
//! through one [`ResponseSlot`], so a request always gets exactly one
//! response.

pub mod compose;
pub mod deadline;
pub mod handler;
pub mod manifest;
pub mod range;
pub mod resolve;
pub mod serve;
pub mod zip;

pub use compose::{HeaderDraft, RespBody};
pub use deadline::{DeadlineGuard, ResponseSlot};
pub use handler::{Negotiation, StaticTypeRegistry, TypeRegistry, WEBSITE_HANDLER};
pub use manifest::Manifest;
pub use range::{ByteRange, RangePlan};
pub use resolve::{DefaultPathResolver, PathResolver};

use crate::archive::{ArchiveStore, SessionCache};
use crate::config::GatewayConfig;
use crate::content::accept_wants_html;
use crate::dns::{resolve_host, NameResolver, StaticNameResolver};
use crate::error::GatewayError;
use crate::url::{DriveUrl, UrlError};
use futures::FutureExt;
use hyper::header::{HeaderName, HeaderValue, ACCEPT, RANGE};
use hyper::{HeaderMap, Method, Response, StatusCode};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::AbortHandle;

/// Query parameter that selects an export format
pub const DOWNLOAD_AS_PARAM: &str = "download_as";

/// One incoming request
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
}

impl GatewayRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, headers: HeaderMap::new() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Add a header; invalid values are ignored
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn accept(&self) -> Option<&str> {
        self.headers.get(ACCEPT).and_then(|v| v.to_str().ok())
    }

    pub fn range(&self) -> Option<&str> {
        self.headers.get(RANGE).and_then(|v| v.to_str().ok())
    }
}

struct Inner {
    resolver: Arc<dyn NameResolver>,
    sessions: SessionCache,
    registry: Arc<dyn TypeRegistry>,
    paths: Arc<dyn PathResolver>,
    config: GatewayConfig,
}

/// The gateway. Cheap to clone; clones share the session cache.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

pub struct GatewayBuilder {
    store: Arc<dyn ArchiveStore>,
    resolver: Option<Arc<dyn NameResolver>>,
    registry: Option<Arc<dyn TypeRegistry>>,
    paths: Option<Arc<dyn PathResolver>>,
    config: GatewayConfig,
}

impl GatewayBuilder {
    pub fn resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn path_resolver(mut self, paths: Arc<dyn PathResolver>) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Gateway {
        let config = self.config;
        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(StaticTypeRegistry::new(
                config.default_handler.clone(),
                config.type_handlers.clone(),
            ))
        });
        Gateway {
            inner: Arc::new(Inner {
                resolver: self.resolver.unwrap_or_else(|| Arc::new(StaticNameResolver::new())),
                sessions: SessionCache::new(self.store),
                registry,
                paths: self.paths.unwrap_or_else(|| Arc::new(DefaultPathResolver)),
                config,
            }),
        }
    }
}

/// Aborts the pipeline if the caller stops waiting for it
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Gateway {
    pub fn builder(store: Arc<dyn ArchiveStore>) -> GatewayBuilder {
        GatewayBuilder {
            store,
            resolver: None,
            registry: None,
            paths: None,
            config: GatewayConfig::default(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.inner.sessions
    }

    /// Run one request to its single response
    pub async fn handle(&self, request: GatewayRequest) -> Response<RespBody> {
        let started = Instant::now();
        let (slot, response) = ResponseSlot::new();

        let guard = Arc::new(DeadlineGuard::start(self.inner.config.request_timeout(), {
            let slot = slot.clone();
            let url = request.url.clone();
            let accept = request.accept().map(str::to_string);
            let csp = self.inner.config.error_page_csp.clone();
            move |resource| {
                log::debug!(target: "drivegate::gateway", "timed out searching for {} ({})", resource, url);
                let err = GatewayError::Timeout(resource);
                slot.emit(compose::error_response(&err, accept.as_deref(), &url, &csp));
            }
        }));

        let task = tokio::spawn({
            let inner = self.inner.clone();
            let guard = guard.clone();
            async move {
                let result = AssertUnwindSafe(inner.pipeline(&request, &guard))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        log::error!(target: "drivegate::gateway", "pipeline panicked on {}", request.url);
                        Err(GatewayError::Internal("request handler panicked".to_string()))
                    });
                // A response is decided; nothing left to wait for
                guard.cancel();
                let response = result.unwrap_or_else(|err| {
                    log::debug!(target: "drivegate::gateway", "{} {}: {}", request.method, request.url, err);
                    compose::error_response(
                        &err,
                        request.accept(),
                        &request.url,
                        &inner.config.error_page_csp,
                    )
                });
                slot.emit(response);
            }
        });
        guard.watch(task.abort_handle());
        let _abort = AbortOnDrop(task.abort_handle());

        let response = match response.await {
            Ok(response) => response,
            Err(_) => {
                log::error!(target: "drivegate::gateway", "request ended without a response");
                HeaderDraft::new(StatusCode::INTERNAL_SERVER_ERROR).commit(compose::empty())
            }
        };
        log::debug!(
            target: "drivegate::gateway",
            "response {} decided in {:?}",
            response.status(),
            started.elapsed()
        );
        response
    }
}

impl Inner {
    async fn pipeline(
        &self,
        request: &GatewayRequest,
        guard: &DeadlineGuard,
    ) -> Result<Response<RespBody>, GatewayError> {
        let url = DriveUrl::parse(&request.url).map_err(|reason| match reason {
            // The drive is addressable; only the file name is unusable
            UrlError::InvalidPath(path) => GatewayError::NotFound { path },
            reason => GatewayError::InvalidUrl { url: request.url.clone(), reason },
        })?;

        let head = match request.method {
            Method::GET => false,
            Method::HEAD => true,
            ref other => return Err(GatewayError::MethodNotSupported(other.clone())),
        };

        let key = resolve_host(self.resolver.as_ref(), &url.host)
            .await
            .map_err(|source| GatewayError::NameResolutionFailed { host: url.host.clone(), source })?;

        let session = self.sessions.get_or_load(key).await.map_err(|source| {
            log::warn!(target: "drivegate::gateway", "failed to open drive {}: {}", key, source);
            GatewayError::ArchiveLoadFailed { key, source }
        })?;
        guard.mark_archive_found();

        let view = session.checkout(url.version_selector().as_ref()).await.map_err(|source| {
            log::warn!(target: "drivegate::gateway", "failed to check out {}: {}", url.origin(), source);
            GatewayError::CheckoutFailed { key, source }
        })?;

        let manifest = manifest::read_manifest(view.as_ref()).await;
        let negotiation =
            handler::negotiate(self.registry.as_ref(), &request.url, manifest.as_ref()).await;
        let accept = request.accept();
        let wants_html = accept_wants_html(accept);

        if negotiation.has_application() && wants_html {
            log::debug!(
                target: "drivegate::gateway",
                "{} handled by {}",
                url.origin(),
                negotiation.handler
            );
            return Ok(compose::inline(
                HeaderDraft::new(StatusCode::OK),
                "text/html",
                handler::handler_shell(&negotiation.handler),
            ));
        }

        let csp = manifest
            .as_ref()
            .and_then(|m| m.content_security_policy.as_deref())
            .unwrap_or(&self.config.default_csp);

        if url.query_param(DOWNLOAD_AS_PARAM) == Some(zip::ZIP_QUERY_VALUE) {
            return Ok(zip::zip_response(
                view,
                &url.path,
                manifest.as_ref(),
                csp,
                &self.config.zip_fallback_name,
                head,
            ));
        }

        let entry = match self.paths.resolve(view.as_ref(), manifest.as_ref(), &url, accept).await {
            Some(entry) if entry.is_directory() => {
                if !url.has_trailing_slash {
                    return Ok(compose::redirect(&url.with_trailing_slash()));
                }
                None
            }
            other => other,
        };
        let entry = entry.ok_or_else(|| GatewayError::NotFound { path: url.path.clone() })?;

        let range_header = request.range();
        let plan = RangePlan::for_entry(entry.size, range_header);
        let params = serve::ServeParams {
            draft: HeaderDraft::for_range(&plan).with_policy(csp),
            csp,
            can_execute_html: negotiation.can_execute_html,
            head,
            sniff_bytes: self.config.sniff_bytes,
        };

        if range_header.is_none() && entry.path.ends_with(".md") && wants_html {
            return serve::serve_markdown(view.as_ref(), &entry, params).await;
        }
        serve::serve_stream(view, &entry, plan.range, params).await
    }
}
