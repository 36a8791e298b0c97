use slog::{Drain, Level, Logger};

/// Builds the default root logger: a terminal-formatted drain fed through
/// an async wrapper, the standard pairing for a `slog` consumer — `riker`
/// itself threads a `slog::Logger` through every subsystem but never pins
/// down which concrete drain to use, so this crate picks the conventional
/// one.
pub fn default_log(cfg: &crate::config::RuntimeConfig) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let level = parse_level(&cfg.log_level);
    let drain = slog::LevelFilter::new(drain, level).fuse();
    Logger::root(drain, slog::o!())
}

/// A silent logger, used by tests that don't want runtime chatter mixed
/// into their output.
pub fn discard_log() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

fn parse_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "critical" => Level::Critical,
        "error" => Level::Error,
        "warning" | "warn" => Level::Warning,
        "info" => Level::Info,
        "debug" => Level::Debug,
        "trace" => Level::Trace,
        _ => Level::Debug,
    }
}
