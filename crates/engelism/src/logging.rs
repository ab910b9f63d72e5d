//! Logging setup on top of `tracing`.
//!
//! Logs always go to stderr; stdout carries protocols and batch progress.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbose` when set.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(console::colors_enabled_stderr()),
            )
            .init();
    }
}

/// Install the subscriber from the `[logging]` section, letting CLI flags win.
pub fn init_from_config(
    config: &engelism_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let (verbose, json_format) = resolve_flags(config, verbose_override, json_logs_override);
    init(verbose, json_format);
}

fn resolve_flags(
    config: &engelism_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) -> (bool, bool) {
    let verbose =
        verbose_override || matches!(config.logging.level.as_str(), "debug" | "trace");
    let json_format = json_logs_override || config.logging.format == "json";
    (verbose, json_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engelism_core::Config;

    #[test]
    fn test_defaults_are_quiet_and_pretty() {
        assert_eq!(resolve_flags(&Config::default(), false, false), (false, false));
    }

    #[test]
    fn test_config_level_enables_verbose() {
        let mut config = Config::default();
        config.logging.level = "trace".to_string();
        config.logging.format = "json".to_string();
        assert_eq!(resolve_flags(&config, false, false), (true, true));
    }

    #[test]
    fn test_cli_flags_override_config() {
        assert_eq!(resolve_flags(&Config::default(), true, true), (true, true));
    }
}
