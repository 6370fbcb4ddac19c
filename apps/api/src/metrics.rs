use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::{metrics::MeterProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider},
    Resource,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ErrorKind;

pub struct Metrics {
    pub requests: opentelemetry::metrics::Counter<u64>,
    pub request_duration: opentelemetry::metrics::Histogram<f64>,
    pub store_errors: opentelemetry::metrics::Counter<u64>,
}

impl Metrics {
    pub fn new(provider: &SdkMeterProvider) -> Self {
        let meter = provider.meter("firegloss-api");

        Self {
            requests: meter
                .u64_counter("firegloss_http_requests_total")
                .with_description("HTTP requests by route, method and status")
                .build(),
            request_duration: meter
                .f64_histogram("firegloss_http_request_duration_milliseconds")
                .with_description("HTTP request duration")
                .build(),
            store_errors: meter
                .u64_counter("firegloss_store_errors_total")
                .with_description("Failed requests by error kind")
                .build(),
        }
    }
}

/// Meter provider with an OTLP reader when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, otherwise one
/// that records into nothing.
pub fn init_metrics() -> Result<(SdkMeterProvider, Metrics), anyhow::Error> {
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "firegloss-api".to_string());

    let resource = Resource::new(vec![KeyValue::new("service.name", service_name)]);
    let mut builder = MeterProviderBuilder::default().with_resource(resource);

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build()?;

        let reader = PeriodicReader::builder(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_interval(Duration::from_secs(15))
            .build();

        builder = builder.with_reader(reader);
    }

    let provider = builder.build();
    let metrics = Metrics::new(&provider);

    Ok((provider, metrics))
}

/// Records one request: count and duration by route, plus the error kind of failed requests.
pub async fn track_requests(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let labels = [KeyValue::new("route", route), KeyValue::new("method", method)];
    metrics.request_duration.record(start.elapsed().as_secs_f64() * 1000.0, &labels);

    let mut with_status = labels.to_vec();
    with_status.push(KeyValue::new("status", i64::from(response.status().as_u16())));
    metrics.requests.add(1, &with_status);

    if let Some(ErrorKind(kind)) = response.extensions().get::<ErrorKind>() {
        metrics.store_errors.add(1, &[KeyValue::new("kind", *kind)]);
    }

    response
}
