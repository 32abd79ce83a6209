//! Log output for the binary and for anyone embedding the library.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset, by `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "data_analyst=warn",
        1 => "data_analyst=info",
        2 => "data_analyst=debug",
        _ => "data_analyst=trace",
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Calling this twice is harmless; the second call returns `false`.
pub fn init_tracing(verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_levels() {
        assert_eq!(default_directive(0), "data_analyst=warn");
        assert_eq!(default_directive(2), "data_analyst=debug");
        assert_eq!(default_directive(9), "data_analyst=trace");
    }

    #[test]
    fn test_second_init_is_noop() {
        init_tracing(1);
        assert!(!init_tracing(1));
    }
}
