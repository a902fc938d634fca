//! Logging setup. Everything goes to stderr so stdout stays clean for
//! command output.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "TAGRELEASE_LOG";
pub const ENV_LOG_FORMAT: &str = "TAGRELEASE_LOG_FORMAT";

/// Filter directives come from `TAGRELEASE_LOG`, then `RUST_LOG`.
fn filter_var(lookup: impl Fn(&str) -> Option<String>) -> &'static str {
    if lookup(ENV_LOG).is_some() {
        ENV_LOG
    } else {
        EnvFilter::DEFAULT_ENV
    }
}

fn wants_json(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup(ENV_LOG_FORMAT).is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let lookup = |key: &str| std::env::var(key).ok();
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(filter_var(lookup))
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if wants_json(lookup) {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_variable_wins_over_rust_log() {
        assert_eq!(filter_var(|k| (k == ENV_LOG).then(|| "debug".into())), ENV_LOG);
        assert_eq!(filter_var(|_| None), "RUST_LOG");
    }

    #[test]
    fn json_format_is_opt_in() {
        assert!(wants_json(|_| Some("JSON".into())));
        assert!(!wants_json(|_| Some("text".into())));
        assert!(!wants_json(|_| None));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init();
        init();
    }
}
