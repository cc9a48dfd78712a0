//! Command-line interface handling for the Glance host shim.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Every option except `--config` and `--list-adapters` overrides the
/// matching configuration file setting.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the host version string
    pub host_version: Option<String>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Print the bundled adapters as JSON and exit
    pub list_adapters: bool,
}

impl CliArgs {
    fn command() -> Command {
        Command::new("glance")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Binds the Glance adapter matching the running host version")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("glance.toml"),
            )
            .arg(
                Arg::new("host-version")
                    .long("host-version")
                    .value_name("VERSION")
                    .help("Host version string (e.g., 1.21.1-R0.1-SNAPSHOT)"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("list-adapters")
                    .long("list-adapters")
                    .help("Print the bundled adapters as JSON and exit")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("glance.toml")),
            host_version: matches.get_one::<String>("host-version").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            list_adapters: matches.get_flag("list-adapters"),
        }
    }

    /// Parses the process arguments; exits with usage on invalid input.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["glance"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("glance.toml"));
        assert!(args.host_version.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
        assert!(!args.list_adapters);
    }

    #[test]
    fn test_all_options() {
        let args = CliArgs::try_parse_from([
            "glance",
            "--config",
            "test.toml",
            "--host-version",
            "1.20.6-R0.1-SNAPSHOT",
            "-l",
            "debug",
            "--json-logs",
            "--list-adapters",
        ])
        .unwrap();

        assert_eq!(args.config_path, PathBuf::from("test.toml"));
        assert_eq!(args.host_version.as_deref(), Some("1.20.6-R0.1-SNAPSHOT"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert!(args.list_adapters);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(CliArgs::try_parse_from(["glance", "--plugins", "dir"]).is_err());
    }
}
