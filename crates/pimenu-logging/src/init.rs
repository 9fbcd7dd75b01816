use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::targets::T_ACTIONS;

pub const ACTIONS_LOG: &str = "actions.log";

pub struct LoggingGuards {
    _file_guards: Vec<WorkerGuard>,
}

pub fn init(component: &str, root: &Path, cfg: &LoggingConfig) -> Result<LoggingGuards> {
    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact();

    let log_dir = root.join("logs");

    let base = tracing_subscriber::registry()
        .with(build_filter(cfg))
        .with(ErrorLayer::default())
        .with(stdout_layer);

    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        base.try_init().ok();
        let _ = LogTracer::init();
        tracing::warn!("File logging disabled ({}): {}", log_dir.display(), err);
        return Ok(LoggingGuards {
            _file_guards: Vec::new(),
        });
    }

    let component_appender =
        tracing_appender::rolling::daily(&log_dir, component_log_name(component));
    let (component_writer, component_guard) = tracing_appender::non_blocking(component_appender);
    let component_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_writer(component_writer)
        .with_filter(component_targets());

    let (actions_layer, actions_guard) = subsystem_layer(&log_dir, ACTIONS_LOG, T_ACTIONS);

    base.with(component_layer)
        .with(actions_layer)
        .try_init()
        .ok();
    let _ = LogTracer::init();

    Ok(LoggingGuards {
        _file_guards: vec![component_guard, actions_guard],
    })
}

fn build_filter(cfg: &LoggingConfig) -> EnvFilter {
    if !cfg.enabled {
        return EnvFilter::new("off");
    }
    EnvFilter::try_new(cfg.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub(crate) fn component_log_name(component: &str) -> String {
    format!("{component}.log")
}

fn component_targets() -> Targets {
    Targets::new()
        .with_default(LevelFilter::TRACE)
        .with_target(T_ACTIONS, LevelFilter::OFF)
}

fn subsystem_layer<S>(
    log_dir: &Path,
    filename: &str,
    target: &'static str,
) -> (
    impl tracing_subscriber::Layer<S> + Send + Sync,
    WorkerGuard,
)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let appender = tracing_appender::rolling::daily(log_dir, filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_writer(writer)
        .with_filter(Targets::new().with_target(target, LevelFilter::TRACE));
    (layer, guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_log_file_is_named_after_component() {
        assert_eq!(component_log_name("pimenu"), "pimenu.log");
    }

    #[test]
    fn disabled_config_turns_everything_off() {
        let cfg = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&cfg).to_string(), "off");
    }

    #[test]
    fn bad_level_falls_back_to_info() {
        let cfg = LoggingConfig {
            level: "pimenu=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter(&cfg).to_string(), "info");
    }
}
