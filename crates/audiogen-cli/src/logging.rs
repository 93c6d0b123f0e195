//! Logging setup shared by every binary.

use tracing_subscriber::EnvFilter;

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "AUDIOGEN_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive: `AUDIOGEN_LOG`, then `RUST_LOG`, then `warn`.
#[must_use]
pub fn filter_directive(audiogen_log: Option<String>, rust_log: Option<String>) -> String {
    audiogen_log
        .into_iter()
        .chain(rust_log)
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install a stderr `fmt` subscriber. Later calls are ignored.
pub fn init() {
    let directive = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        assert_eq!(
            filter_directive(Some("debug".into()), Some("info".into())),
            "debug"
        );
        assert_eq!(filter_directive(None, Some("info".into())), "info");
        assert_eq!(filter_directive(Some(" ".into()), None), "warn");
        assert_eq!(filter_directive(None, None), "warn");
    }

    #[test]
    fn test_init_twice() {
        init();
        init();
    }
}
