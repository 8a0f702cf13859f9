use super::{build_gateway, DriveSpec};
use anyhow::{Context, Result};
use drivegate_core::config::DrivegateConfig;
use drivegate_core::logging::init_logging;
use drivegate_core::GatewayRequest;
use http_body_util::BodyExt;
use hyper::header::{ACCEPT, RANGE};
use hyper::Method;
use std::io::Write;

pub struct FetchRequest {
    pub method: String,
    pub accept: Option<String>,
    pub range: Option<String>,
    pub url: String,
}

impl FetchRequest {
    fn into_gateway_request(self) -> Result<GatewayRequest> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("Invalid method: {}", self.method))?;
        let mut request = GatewayRequest::new(method, self.url);
        if let Some(accept) = &self.accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(range) = &self.range {
            request = request.header(RANGE, range);
        }
        Ok(request)
    }
}

pub async fn run(config: DrivegateConfig, drives: &[DriveSpec], request: FetchRequest) -> Result<()> {
    config.validate()?;
    init_logging(&config.logging);

    let (gateway, _) = build_gateway(&config, drives).await?;
    let response = gateway.handle(request.into_gateway_request()?).await;

    let (parts, body) = response.into_parts();
    let body = body.collect().await.context("Failed to read response body")?.to_bytes();

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", parts.status)?;
    for (name, value) in &parts.headers {
        writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
    }
    writeln!(out)?;
    out.write_all(&body)?;
    out.flush()?;
    Ok(())
}
