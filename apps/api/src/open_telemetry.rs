use opentelemetry::{global, trace::TracerProvider, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    logs::LoggerProvider as SdkLoggerProvider,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider as SdkTracerProvider},
    Resource,
};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "docstore=debug,firegloss_api=debug,axum=info,tower_http=info";

/// Install the global subscriber: env filter plus console output, and OTLP export of traces and
/// logs when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "firegloss-api".to_string());
    let resource = Resource::new(vec![KeyValue::new("service.name", service_name.clone())]);

    let (tracer, logger_provider) = match env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(otlp_endpoint) => {
            global::set_text_map_propagator(TraceContextPropagator::new());

            let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(&otlp_endpoint)
                .build()?;

            let tracer_provider = SdkTracerProvider::builder()
                .with_batch_exporter(trace_exporter, runtime::Tokio)
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource.clone())
                .build();

            // Take the tracer before the provider moves into the global slot.
            let tracer = tracer_provider.tracer(service_name);
            global::set_tracer_provider(tracer_provider);

            let log_exporter = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(&otlp_endpoint)
                .build()?;

            let logger_provider = SdkLoggerProvider::builder()
                .with_batch_exporter(log_exporter, runtime::Tokio)
                .with_resource(resource)
                .build();

            (Some(tracer), Some(logger_provider))
        }
        Err(_) => (None, None),
    };

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
    let log_layer = logger_provider.as_ref().map(OpenTelemetryTracingBridge::new);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .with(log_layer)
        .init();

    Ok(())
}
