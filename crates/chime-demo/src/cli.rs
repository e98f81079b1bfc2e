#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `CHIME_DEMO_*` prefix; flags win over the
//! environment.

use std::env;
use std::process;

use chime_date::Date;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
chime demo: concurrent writers updating an observable date

USAGE:
    chime-demo [OPTIONS]

OPTIONS:
    --start=YYYY-MM-DD   Initial date (default: 2023-01-01)
    --observers=N        Number of registered observers (default: 2)
    --years=LIST         Comma-separated year deltas, one writer thread each
                         (default: 1,2,3)
    --always-notify      Notify even when a write stores an equal date
    --json               Print the summary as JSON
    --log-json           Emit log events as JSON lines
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    CHIME_LOG                  Log filter directives (default: info)
    CHIME_DEMO_START           Override --start
    CHIME_DEMO_OBSERVERS       Override --observers
    CHIME_DEMO_YEARS           Override --years
    CHIME_DEMO_ALWAYS_NOTIFY   Override --always-notify (1/true to enable)
    CHIME_DEMO_JSON            Override --json (1/true to enable)
    CHIME_DEMO_LOG_JSON        Override --log-json (1/true to enable)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Date the observable value starts at.
    pub start: Date,
    /// Number of observers registered before the writers start.
    pub observers: usize,
    /// One writer thread per entry; each adds its delta in years.
    pub years: Vec<i32>,
    /// Use `ChangePolicy::AlwaysNotify` instead of skipping equal writes.
    pub always_notify: bool,
    /// Print the run summary as JSON.
    pub json: bool,
    /// Format log events as JSON.
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            start: Date::new(2023, 1, 1).unwrap_or_default(),
            observers: 2,
            years: vec![1, 2, 3],
            always_notify: false,
            json: false,
            log_json: false,
        }
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags. Exits the process on `--help`,
    /// `--version`, or a parse failure.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("chime-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first; malformed values are ignored.
        if let Some(val) = get_env("CHIME_DEMO_START")
            && let Ok(date) = val.trim().parse()
        {
            opts.start = date;
        }
        if let Some(val) = get_env("CHIME_DEMO_OBSERVERS")
            && let Ok(n) = val.trim().parse()
        {
            opts.observers = n;
        }
        if let Some(val) = get_env("CHIME_DEMO_YEARS")
            && let Some(years) = parse_years(&val)
        {
            opts.years = years;
        }
        if let Some(val) = get_env("CHIME_DEMO_ALWAYS_NOTIFY") {
            opts.always_notify = is_truthy(&val);
        }
        if let Some(val) = get_env("CHIME_DEMO_JSON") {
            opts.json = is_truthy(&val);
        }
        if let Some(val) = get_env("CHIME_DEMO_LOG_JSON") {
            opts.log_json = is_truthy(&val);
        }

        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--always-notify" => opts.always_notify = true,
                "--json" => opts.json = true,
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--start=") {
                        opts.start = val.parse().map_err(|_| ParseError::InvalidValue {
                            flag: "--start",
                            value: val.to_string(),
                        })?;
                    } else if let Some(val) = other.strip_prefix("--observers=") {
                        opts.observers = val.parse().map_err(|_| ParseError::InvalidValue {
                            flag: "--observers",
                            value: val.to_string(),
                        })?;
                    } else if let Some(val) = other.strip_prefix("--years=") {
                        opts.years = parse_years(val).ok_or_else(|| ParseError::InvalidValue {
                            flag: "--years",
                            value: val.to_string(),
                        })?;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}

/// Parse a comma-separated list of year deltas. Empty entries are skipped;
/// an empty list is accepted (no writers).
fn parse_years(raw: &str) -> Option<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with_env<I, S>(
        args: I,
        env_pairs: &[(&'static str, &'static str)],
    ) -> Result<Opts, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = std::collections::HashMap::new();
        for (key, value) in env_pairs {
            map.insert(*key, *value);
        }
        Opts::parse_from_env_and_args(args, |key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.start.to_string(), "2023-01-01");
        assert_eq!(opts.observers, 2);
        assert_eq!(opts.years, vec![1, 2, 3]);
        assert!(!opts.always_notify);
        assert!(!opts.json);
        assert!(!opts.log_json);
    }

    #[test]
    fn no_args_no_env_is_default() {
        let opts = parse_with_env(Vec::<String>::new(), &[]).expect("parse");
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn version_string_nonempty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn help_text_lists_flags_and_env_vars() {
        for needle in [
            "--start=",
            "--observers=",
            "--years=",
            "--always-notify",
            "--log-json",
            "CHIME_LOG",
            "CHIME_DEMO_START",
            "CHIME_DEMO_YEARS",
        ] {
            assert!(HELP_TEXT.contains(needle), "help text missing {needle}");
        }
    }

    #[test]
    fn help_and_version_flags() {
        assert_eq!(parse_with_env(["--help"], &[]), Err(ParseError::Help));
        assert_eq!(parse_with_env(["-h"], &[]), Err(ParseError::Help));
        assert_eq!(parse_with_env(["-V"], &[]), Err(ParseError::Version));
    }

    #[test]
    fn env_overrides_apply() {
        let env = [
            ("CHIME_DEMO_START", "2000-02-29"),
            ("CHIME_DEMO_OBSERVERS", "5"),
            ("CHIME_DEMO_YEARS", "4, 8"),
            ("CHIME_DEMO_ALWAYS_NOTIFY", "true"),
            ("CHIME_DEMO_LOG_JSON", "1"),
        ];
        let opts = parse_with_env(Vec::<String>::new(), &env).expect("parse");
        assert_eq!(opts.start, Date::new(2000, 2, 29).unwrap());
        assert_eq!(opts.observers, 5);
        assert_eq!(opts.years, vec![4, 8]);
        assert!(opts.always_notify);
        assert!(opts.log_json);
        assert!(!opts.json);
    }

    #[test]
    fn malformed_env_is_ignored() {
        let env = [
            ("CHIME_DEMO_START", "yesterday"),
            ("CHIME_DEMO_OBSERVERS", "many"),
            ("CHIME_DEMO_YEARS", "1,x"),
            ("CHIME_DEMO_ALWAYS_NOTIFY", "0"),
        ];
        let opts = parse_with_env(Vec::<String>::new(), &env).expect("parse");
        assert_eq!(opts, Opts::default());
    }

    #[test]
    fn args_override_env() {
        let env = [("CHIME_DEMO_OBSERVERS", "5"), ("CHIME_DEMO_YEARS", "9")];
        let args = ["--observers=1", "--years=2,3", "--start=1999-12-31", "--json"];
        let opts = parse_with_env(args, &env).expect("parse");
        assert_eq!(opts.observers, 1);
        assert_eq!(opts.years, vec![2, 3]);
        assert_eq!(opts.start, Date::new(1999, 12, 31).unwrap());
        assert!(opts.json);
    }

    #[test]
    fn empty_years_means_no_writers() {
        let opts = parse_with_env(["--years="], &[]).expect("parse");
        assert!(opts.years.is_empty());
    }

    #[test]
    fn negative_years_accepted() {
        let opts = parse_with_env(["--years=-1,1"], &[]).expect("parse");
        assert_eq!(opts.years, vec![-1, 1]);
    }

    #[test]
    fn invalid_value_reports_flag() {
        let cases = [
            ("--start=2023-02-30", "--start"),
            ("--observers=-1", "--observers"),
            ("--years=1,two", "--years"),
        ];
        for (arg, flag) in cases {
            let err = parse_with_env([arg], &[]);
            assert!(
                matches!(err, Err(ParseError::InvalidValue { flag: f, .. }) if f == flag),
                "arg={arg:?} expected InvalidValue for {flag}, got {err:?}"
            );
        }
    }

    #[test]
    fn unknown_arg_reports_error() {
        let err = parse_with_env(["--mystery-flag"], &[]);
        assert!(
            matches!(err, Err(ParseError::UnknownArg(ref arg)) if arg == "--mystery-flag"),
            "expected UnknownArg for --mystery-flag, got {err:?}"
        );
    }

    #[test]
    fn truthy_values() {
        for raw in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(is_truthy(raw), "{raw:?}");
        }
        for raw in ["0", "false", "", "nope"] {
            assert!(!is_truthy(raw), "{raw:?}");
        }
    }
}
