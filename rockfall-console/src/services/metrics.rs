use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    access_denied_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Register the console's collectors. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let access_denied_total = IntCounterVec::new(
        Opts::new("access_denied_total", "Dashboard requests rejected by the view guard"),
        &["view"],
    )?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration_seconds.clone()))?;
    registry.register(Box::new(access_denied_total.clone()))?;

    // Losing a concurrent init race is fine; the winner's collectors are used.
    let _ = METRICS.set(Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        access_denied_total,
    });
    Ok(())
}

pub fn record_access_denied(view: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics.access_denied_total.with_label_values(&[view]).inc();
    }
}

/// Prometheus text exposition, or `None` before [`init_metrics`].
pub fn get_metrics() -> Option<Result<String, prometheus::Error>> {
    let metrics = METRICS.get()?;
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    Some(
        encoder
            .encode(&metrics.registry.gather(), &mut buffer)
            .map(|()| String::from_utf8_lossy(&buffer).into_owned()),
    )
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route templates keep label cardinality bounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    if let Some(metrics) = METRICS.get() {
        let status = response.status().as_u16().to_string();
        let labels = [method.as_str(), path.as_str(), status.as_str()];
        metrics.http_requests_total.with_label_values(&labels).inc();
        metrics
            .http_request_duration_seconds
            .with_label_values(&labels)
            .observe(start.elapsed().as_secs_f64());
    }

    response
}
