use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		Aggregation, Instrument, MeterProviderBuilder, PeriodicReader, SdkMeterProvider, Stream,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TraceConfig;

/// Constructs a [`Resource`] which describes the service.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(
				DEPLOYMENT_ENVIRONMENT,
				if cfg!(debug_assertions) {
					"development"
				} else {
					"production"
				},
			),
		],
		SCHEMA_URL,
	)
}

/// Constructs an [`SdkMeterProvider`] with a custom view for latency metrics.
fn init_meter_provider() -> Result<SdkMeterProvider, opentelemetry::metrics::MetricsError> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(std::time::Duration::from_secs(5))
		.build();

	// For debugging in development
	#[cfg(debug_assertions)]
	let stdout_reader = PeriodicReader::builder(
		opentelemetry_stdout::MetricsExporter::default(),
		runtime::Tokio,
	)
	.build();

	let view_latency = |instrument: &Instrument| -> Option<Stream> {
		if instrument.name == "latency_ms" {
			Some(
				Stream::new()
					.name("latency_ms")
					.aggregation(Aggregation::Default),
			)
		} else {
			None
		}
	};

	let meter_provider = MeterProviderBuilder::default();
	#[cfg(debug_assertions)]
	let meter_provider = meter_provider.with_reader(stdout_reader);

	let meter_provider = meter_provider
		.with_resource(resource())
		.with_reader(reader)
		.with_view(view_latency)
		.build();

	global::set_meter_provider(meter_provider.clone());

	Ok(meter_provider)
}

/// Constructs a [`Tracer`] with a custom sampling strategy and exporter.
fn init_tracer() -> Result<Tracer, opentelemetry::trace::TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(opentelemetry_otlp::new_exporter().tonic())
		.install_batch(runtime::Tokio)
}

/// Initializes the global tracing subscriber.
///
/// Logs always go to stdout at the configured level. When OTLP export is enabled,
/// spans and metrics are also exported and the returned guard flushes them on drop.
/// If the exporters cannot be built, the error is logged and only stdout is used.
pub fn init_tracing_subscriber(config: &TraceConfig) -> Option<OtelGuard> {
	let filter = LevelFilter::from_level(config.level);
	let fmt = tracing_subscriber::fmt::layer().with_ansi(true);

	if !config.otel {
		tracing_subscriber::registry().with(filter).with(fmt).init();
		return None;
	}

	let otel = init_meter_provider()
		.map_err(|error| error.to_string())
		.and_then(|meter_provider| {
			init_tracer()
				.map(|tracer| (meter_provider, tracer))
				.map_err(|error| error.to_string())
		});

	match otel {
		Ok((meter_provider, tracer)) => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt)
				.with(MetricsLayer::new(meter_provider.clone()))
				.with(tracing_opentelemetry::layer().with_tracer(tracer))
				.init();

			Some(OtelGuard { meter_provider })
		}
		Err(error) => {
			tracing_subscriber::registry().with(filter).with(fmt).init();
			tracing::error!(%error, "failed to start OpenTelemetry export, logging to stdout only");

			None
		}
	}
}

pub struct OtelGuard {
	meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if let Err(err) = self.meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		opentelemetry::global::shutdown_tracer_provider();
	}
}
