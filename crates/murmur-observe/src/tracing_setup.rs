//! Tracing initialization.
//!
//! Installs the global subscriber: an env-filtered `fmt` layer, plus an
//! OpenTelemetry bridge when requested. The OTel pipeline exports spans to
//! stdout, which is enough to inspect GenAI span attributes locally; wiring
//! a collector means swapping the exporter, nothing else.
//!
//! `init_tracing` hands back a [`TracingGuard`]. Hold it for the life of
//! the process; dropping it flushes buffered spans and shuts the exporter
//! down.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps the OTel export pipeline alive until dropped.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("otel shutdown: {e}");
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the service logs at `info` with its
/// own crates at `debug`. Span close events are emitted so request timing
/// shows up without extra instrumentation.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    enable_otel: bool,
) -> Result<TracingGuard, Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,murmur_api=debug,murmur_core=debug,murmur_infra=debug")
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    if !enable_otel {
        registry.try_init()?;
        return Ok(TracingGuard { provider: None });
    }

    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .build();
    opentelemetry::global::set_tracer_provider(provider.clone());

    registry
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("murmur")))
        .try_init()?;

    Ok(TracingGuard {
        provider: Some(provider),
    })
}
