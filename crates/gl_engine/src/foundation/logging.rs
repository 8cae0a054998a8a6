//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace, LevelFilter};

/// Initialize the logging system
///
/// With `None` the level comes from `RUST_LOG`, falling back to `info`.
/// An explicit level always wins over the environment.
pub fn init(level: Option<LevelFilter>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    // A second init (tests, embedding hosts) keeps the first logger.
    let _ = builder.try_init();
}

/// Map the demo's numeric verbosity argument onto a level filter
///
/// `0` debug, `1` info, `2` warn, `3` error. Anything else is rejected.
pub fn level_from_arg(arg: &str) -> Option<LevelFilter> {
    match arg.trim().parse::<u8>().ok()? {
        0 => Some(LevelFilter::Debug),
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Warn),
        3 => Some(LevelFilter::Error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_arg() {
        assert_eq!(level_from_arg("0"), Some(LevelFilter::Debug));
        assert_eq!(level_from_arg("1"), Some(LevelFilter::Info));
        assert_eq!(level_from_arg(" 2 "), Some(LevelFilter::Warn));
        assert_eq!(level_from_arg("3"), Some(LevelFilter::Error));
        assert_eq!(level_from_arg("4"), None);
        assert_eq!(level_from_arg("loud"), None);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(Some(LevelFilter::Warn));
        init(None);
    }
}
