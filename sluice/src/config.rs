//! Configuration shared by every worker of a pipeline.

use std::thread;

#[cfg(feature = "getopts")]
use crate::error::{Error, Result};

/// Configures how a pipeline spawns and reports on its workers.
///
/// A configuration is installed when the cancellation signal is created (see
/// [`cancel::channel_with`](crate::cancel::channel_with)) and travels with that signal to
/// every combinator built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix for worker thread names.
    pub name: String,
    /// Stack size for worker threads, or the platform default.
    pub stack_size: Option<usize>,
    /// Print worker lifecycle events to stderr.
    pub log_stderr: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: "sluice".to_owned(),
            stack_size: None,
            log_stderr: false,
        }
    }
}

impl Config {
    /// Installs options into a [`getopts::Options`] struct that correspond
    /// to the parameters in the configuration.
    ///
    /// It is the caller's responsibility to ensure that the installed options
    /// do not conflict with any other options that may exist in `opts`, or
    /// that may be installed into `opts` in the future.
    ///
    /// This method is only available if the `getopts` feature is enabled, which
    /// it is by default.
    #[cfg(feature = "getopts")]
    pub fn install_options(opts: &mut getopts::Options) {
        opts.optopt("n", "name", "prefix for worker thread names", "NAME");
        opts.optopt("s", "stack-size", "worker thread stack size in bytes", "BYTES");
        opts.optflag("l", "log", "print worker lifecycle events to stderr");
    }

    /// Instantiates a configuration based upon the parsed options in `matches`.
    ///
    /// The `matches` object must have been constructed from a
    /// [`getopts::Options`] which contained at least the options installed by
    /// [`Self::install_options`].
    ///
    /// This method is only available if the `getopts` feature is enabled, which
    /// it is by default.
    #[cfg(feature = "getopts")]
    pub fn from_matches(matches: &getopts::Matches) -> Result<Config> {
        let mut config = Config::default();
        if let Some(name) = matches.opt_str("n") {
            config.name = name;
        }
        config.stack_size = matches
            .opt_get("s")
            .map_err(|e| Error::Config(format!("stack-size: {}", e)))?;
        config.log_stderr = matches.opt_present("l");
        Ok(config)
    }

    /// Constructs a new configuration by parsing the supplied text arguments.
    ///
    /// Most commonly, callers supply `std::env::args()` as the iterator.
    ///
    /// This method is only available if the `getopts` feature is enabled, which
    /// it is by default.
    #[cfg(feature = "getopts")]
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config> {
        let mut opts = getopts::Options::new();
        Config::install_options(&mut opts);
        let matches = opts
            .parse(args)
            .map_err(|e| Error::Config(e.to_string()))?;
        Config::from_matches(&matches)
    }

    /// The thread builder for the `index`-th worker, which performs a `kind` role.
    pub fn thread_builder(&self, kind: &str, index: usize) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("{}-{}-{}", self.name, kind, index));
        match self.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}

#[cfg(all(test, feature = "getopts"))]
mod tests {
    use super::Config;

    fn args(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn defaults_without_arguments() {
        assert_eq!(Config::from_args(Vec::new()).unwrap(), Config::default());
    }

    #[test]
    fn parses_every_option() {
        let config = Config::from_args(args("--name primes -s 65536 --log")).unwrap();
        assert_eq!(config.name, "primes");
        assert_eq!(config.stack_size, Some(65536));
        assert!(config.log_stderr);
    }

    #[test]
    fn rejects_malformed_stack_size() {
        assert!(Config::from_args(args("--stack-size lots")).is_err());
        assert!(Config::from_args(args("--frobnicate")).is_err());
    }

    #[test]
    fn names_worker_threads() {
        let config = Config { name: "test".to_owned(), ..Config::default() };
        let handle = config
            .thread_builder("relay", 7)
            .spawn(|| std::thread::current().name().map(String::from))
            .unwrap();
        assert_eq!(handle.join().unwrap().as_deref(), Some("test-relay-7"));
    }
}
