//! Subscriber setup.
//!
//! Composes the env filter, the console layers and, with the `otlp`
//! feature, an OpenTelemetry layer exporting spans over OTLP.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::logging::{console_layers, BoxedLayer};
use crate::{TelemetryConfig, TelemetryError};

/// Guard that shuts down the tracer provider on drop.
pub struct TracingGuard {
    #[cfg(feature = "otlp")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        #[cfg(feature = "otlp")]
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Error shutting down tracer provider: {:?}", e);
            }
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set or the filter is invalid.
pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    #[allow(unused_mut)]
    let mut layers: Vec<BoxedLayer<Registry>> = console_layers(config);

    #[cfg(feature = "otlp")]
    let provider = if config.otlp_enabled {
        let (layer, provider) = otlp::layer(config)?;
        layers.push(layer);
        Some(provider)
    } else {
        None
    };

    #[cfg(not(feature = "otlp"))]
    if config.otlp_enabled {
        eprintln!("QN_OTLP_ENABLED is set but the `otlp` feature is not compiled in");
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        otlp = config.otlp_enabled,
        "Tracing initialized"
    );

    Ok(TracingGuard {
        #[cfg(feature = "otlp")]
        provider,
    })
}

#[cfg(feature = "otlp")]
mod otlp {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{
        runtime,
        trace::{self, RandomIdGenerator, Sampler},
        Resource,
    };
    use tracing_subscriber::{Layer, Registry};

    use crate::logging::BoxedLayer;
    use crate::{TelemetryConfig, TelemetryError};

    pub(super) fn layer(
        config: &TelemetryConfig,
    ) -> Result<(BoxedLayer<Registry>, opentelemetry_sdk::trace::TracerProvider), TelemetryError>
    {
        let otlp_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(&config.otlp_endpoint);

        let provider = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(otlp_exporter)
            .with_trace_config(
                trace::Config::default()
                    .with_sampler(Sampler::AlwaysOn)
                    .with_id_generator(RandomIdGenerator::default())
                    .with_resource(Resource::new(vec![
                        KeyValue::new("service.name", config.service_name.clone()),
                        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    ])),
            )
            .install_batch(runtime::Tokio)
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

        let tracer = provider.tracer(config.service_name.clone());
        let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();
        Ok((layer, provider))
    }
}
