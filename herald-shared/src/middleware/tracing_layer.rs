use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// JSON lines in production, human-readable output everywhere else.
    pub fn for_env(herald_env: Option<&str>) -> Self {
        match herald_env {
            Some(env) if env.eq_ignore_ascii_case("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Default directives when `RUST_LOG` is unset: debug for the service's own
/// crate, info for everything else.
pub fn default_filter(service_name: &str) -> String {
    let crate_target = service_name.replace('-', "_");
    format!("info,{crate_target}=debug,tower_http=debug")
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `HERALD_ENV=production` switches to JSON lines. A second call is a no-op.
pub fn init_tracing(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

    let format = LogFormat::for_env(std::env::var("HERALD_ENV").ok().as_deref());

    let installed = match format {
        LogFormat::Json => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    if installed.is_ok() {
        tracing::info!(service = service_name, format = ?format, "tracing initialized");
    }
}
