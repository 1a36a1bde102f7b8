use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "ecotrack_backend=debug,tower_http=debug,info",
        Environment::Staging => "ecotrack_backend=debug,tower_http=info,info",
        Environment::Prod => "ecotrack_backend=info,tower_http=info,warn",
    }
}

/// Install the global subscriber: JSON lines in prod, pretty output elsewhere.
pub fn init_logging(env: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    let verbose = env.is_dev();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(verbose)
        .with_line_number(verbose);

    let registry = tracing_subscriber::registry().with(filter);
    match env {
        Environment::Prod => registry.with(fmt_layer.json()).init(),
        Environment::Dev | Environment::Staging => registry.with(fmt_layer.pretty()).init(),
    }

    tracing::info!(env = ?env, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            let directives = default_directives(&env);
            assert!(directives.starts_with("ecotrack_backend="));
            assert!(EnvFilter::try_new(directives).is_ok());
        }
    }
}
