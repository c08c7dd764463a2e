//! Command-line interface for session-keeper.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Session save path (overrides config file).
    pub save_path: Option<PathBuf>,
    /// Session directives given as `NAME=VALUE`, in order.
    pub options: Vec<(String, String)>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Print the recognized directives and exit.
    pub list_options: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("save-path") => {
                result.save_path = Some(parser.value()?.parse()?);
            }
            Short('o') | Long("option") => {
                let value: String = parser.value()?.parse()?;
                let (name, val) = value
                    .split_once('=')
                    .filter(|(name, _)| !name.is_empty())
                    .ok_or_else(|| ArgsError::InvalidValue("option", value.clone()))?;
                result.options.push((name.to_string(), val.to_string()));
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("list-options") => {
                result.list_options = true;
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-keeper {version}
Validate a session configuration and run a session smoke cycle

USAGE:
    session-keeper [OPTIONS]

OPTIONS:
    -c, --config <FILE>         Path to configuration file (JSON)
    -s, --save-path <DIR>       Session save path
    -o, --option <NAME=VALUE>   Session directive (repeatable)
    -l, --log-level <LVL>       Log level (error, warn, info, debug, trace)
        --list-options          Print recognized session directives
    -h, --help                  Print help
    -V, --version               Print version

ENVIRONMENT VARIABLES:
    SESSION_KEEPER_SAVE_PATH    Save path (overrides config)
    SESSION_KEEPER_LOG_LEVEL    Log level (overrides config)
    RUST_LOG                    Alternative log level setting

EXAMPLES:
    # Check a configuration file
    session-keeper -c /etc/session-keeper/config.json

    # Try directives directly
    session-keeper -o name=APPSESSID -o use_strict_mode=1 -s /var/lib/sessions
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-keeper {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error("{0}")]
    Lexopt(#[from] lexopt::Error),
    /// Invalid argument value.
    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("session-keeper")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.config.is_none());
        assert!(result.save_path.is_none());
        assert!(result.options.is_empty());
        assert!(!result.list_options);
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_save_path() {
        let result = parse_args_from(args(&["--save-path", "/var/lib/sessions"])).unwrap();
        assert_eq!(result.save_path, Some(PathBuf::from("/var/lib/sessions")));
    }

    #[test]
    fn test_options_repeatable() {
        let result = parse_args_from(args(&[
            "-o",
            "name=APPSESSID",
            "--option",
            "cookie_path=/app",
        ]))
        .unwrap();
        assert_eq!(
            result.options,
            vec![
                ("name".to_string(), "APPSESSID".to_string()),
                ("cookie_path".to_string(), "/app".to_string()),
            ]
        );
    }

    #[test]
    fn test_option_value_may_contain_equals() {
        let result = parse_args_from(args(&["-o", "trans_sid_tags=a=href,form="])).unwrap();
        assert_eq!(result.options[0].1, "a=href,form=");
    }

    #[test]
    fn test_option_empty_value() {
        let result = parse_args_from(args(&["-o", "cookie_domain="])).unwrap();
        assert_eq!(result.options[0], ("cookie_domain".to_string(), String::new()));
    }

    #[test]
    fn test_invalid_option() {
        assert!(parse_args_from(args(&["-o", "no-equals-sign"])).is_err());
        assert!(parse_args_from(args(&["-o", "=value"])).is_err());
    }

    #[test]
    fn test_list_options() {
        let result = parse_args_from(args(&["--list-options"])).unwrap();
        assert!(result.list_options);
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["stray"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }

    #[test]
    fn test_unknown_flag() {
        let result = parse_args_from(args(&["--bogus"]));
        assert!(matches!(result, Err(ArgsError::Lexopt(_))));
    }
}
