pub mod capabilities;
pub mod email;
pub mod kube;
pub mod run;
pub mod slack;

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use taskhooks_adapters::{connection_store_from_config, DynConnectionStore, HooksConfig};

/// Install the global tracing subscriber, filtered by [`log_filter`].
pub fn init_logging(verbose: bool, json: bool) {
    let directives = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, &directives))
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// `RUST_LOG`-style `directives`, `info` when empty. `verbose` raises the
/// global level to debug.
pub fn log_filter(verbose: bool, directives: &str) -> tracing_subscriber::EnvFilter {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(directives);
    if verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    }
}

/// Configuration and connection lookup shared by every command.
pub struct Session {
    pub config: HooksConfig,
    pub store: DynConnectionStore,
}

impl Session {
    pub fn load(root: &ArgMatches) -> anyhow::Result<Self> {
        let path = root.get_one::<String>("config").map(Path::new);
        let config = HooksConfig::load(path).context("failed to load configuration")?;
        let store = connection_store_from_config(&config.connections);
        tracing::debug!(
            env_connections = config.connections.env_enabled,
            connections_file = ?config.connections.file,
            "configuration loaded"
        );
        Ok(Self { config, store })
    }
}

/// Split `KEY=VALUE`.
pub fn parse_key_value(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => anyhow::bail!("expected KEY=VALUE, got '{}'", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_level_is_kept() {
        assert_eq!(log_filter(false, "warn").to_string(), "warn");
        assert_eq!(log_filter(false, "trace").to_string(), "trace");
    }

    #[test]
    fn default_level_is_info_and_verbose_is_debug() {
        assert_eq!(log_filter(false, "").to_string(), "info");
        assert_eq!(log_filter(true, "").to_string(), "debug");
        assert_eq!(log_filter(true, "warn").to_string(), "debug");
    }

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
