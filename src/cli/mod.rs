//! Command-line interface for driver-export
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and merging with arguments
//! - Default output file naming
//! - Auxiliary subcommands (version, completion, config, cities)

pub mod completion;

use chrono::{DateTime, Local};
use clap::error::{ContextKind, ErrorKind};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::{Config, ExportConfig, LogLevel, OutputFormat};
use crate::error::{ConfigError, InputError, Result};
use crate::formatter::{TableFormatter, TableStyle};
use crate::query::{FilterSpec, KNOWN_CITIES};

/// Export driver device tokens from ClickHouse to CSV
#[derive(Parser, Debug)]
#[command(
    name = "export",
    version,
    about = "Export driver device tokens from ClickHouse to CSV",
    long_about = "Runs one parameterized query against ClickHouse selecting drivers of a city
and vehicle variant, and writes driverId/token pairs to a CSV file.",
    args_conflicts_with_subcommands = true
)]
pub struct CliArgs {
    /// City name or city code (e.g. Delhi, std:011)
    #[arg(value_name = "CITY")]
    pub city: Option<String>,

    /// Vehicle variant (ALL, CAB, AUTO_RICKSHAW, BIKE, ...)
    #[arg(value_name = "VARIANT")]
    pub variant: Option<String>,

    /// Output file; defaults to <city>_<variant>_<timestamp>.csv
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Full HTTP endpoint of the server
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Server to connect to
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// HTTP interface port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Use HTTPS
    #[arg(long)]
    pub secure: bool,

    /// Username for authentication
    #[arg(short = 'u', long, value_name = "USERNAME")]
    pub user: Option<String>,

    /// Password for authentication
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Database holding the driver tables
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// Query timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the statement and bound parameters without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Print the first N exported rows as a table
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,

    /// Summary output format
    #[arg(long, value_name = "FORMAT", value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for export
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// List known city codes
    Cities,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = Self::accept_args(CliArgs::try_parse())?;
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Turn a clap parse outcome into arguments or an input error
    ///
    /// Help and version requests are printed by clap, which exits with 0.
    /// Every other usage error becomes `InputError::InvalidValue` so the
    /// process exits with 1 like any other failure.
    fn accept_args(parsed: std::result::Result<CliArgs, clap::Error>) -> Result<CliArgs> {
        match parsed {
            Ok(args) => Ok(args),
            Err(e) if is_informational(e.kind()) => e.exit(),
            Err(e) => {
                tracing::debug!("Argument parsing failed: {}", e.render());
                Err(usage_error(&e).into())
            }
        }
    }

    /// Load configuration from file and environment, then apply arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Merged configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        config.apply_env()?;
        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Whether colored output is enabled
    pub fn use_colors(&self) -> bool {
        self.config.display.color_output
    }

    /// Whether user feedback beyond results is suppressed
    pub fn is_quiet(&self) -> bool {
        self.args.quiet
    }

    /// Build the filter from the positional arguments
    ///
    /// A missing city is reported as invalid input rather than a usage error.
    pub fn filter_spec(&self) -> Result<FilterSpec> {
        FilterSpec::create(
            self.args.city.as_deref().unwrap_or_default(),
            self.args.variant.as_deref(),
        )
    }

    /// Output path from the arguments, or a generated one
    ///
    /// # Arguments
    /// * `spec` - Validated filter, used in the generated name
    ///
    /// # Returns
    /// * `Result<PathBuf>` - Destination of the export
    pub fn output_path(&self, spec: &FilterSpec) -> Result<PathBuf> {
        match &self.args.output {
            Some(path) => Ok(path.clone()),
            None => default_output_path(spec, &self.config.export, Local::now()),
        }
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_display_args(config, args);
        Self::apply_logging_args(config, args);
        Self::apply_connection_args(config, args);
    }

    /// Apply display-related CLI arguments to configuration
    fn apply_display_args(config: &mut Config, args: &CliArgs) {
        if let Some(format) = args.format {
            config.display.format = format;
        }

        if args.no_color {
            config.display.color_output = false;
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Apply connection-related CLI arguments to configuration
    fn apply_connection_args(config: &mut Config, args: &CliArgs) {
        let conn = &mut config.connection;

        if let Some(url) = &args.url {
            conn.url = Some(url.clone());
        }
        if let Some(host) = &args.host {
            conn.host = host.clone();
            // an explicit host wins over a configured url
            if args.url.is_none() {
                conn.url = None;
            }
        }
        if let Some(port) = args.port {
            conn.port = port;
        }
        if args.secure {
            conn.secure = true;
        }
        if let Some(user) = &args.user {
            conn.user = user.clone();
        }
        if let Some(password) = &args.password {
            conn.password = password.clone();
        }
        if let Some(database) = &args.database {
            conn.database = database.clone();
        }
        if let Some(timeout) = args.timeout {
            conn.timeout = timeout;
        }
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to continue
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                completion::generate_completion(shell)?;
                Ok(true)
            }
            Some(Commands::Config { show, validate }) => {
                self.handle_config_command(*show, *validate)?;
                Ok(true)
            }
            Some(Commands::Cities) => {
                let table = TableFormatter::with_colors(self.use_colors())
                    .with_style(TableStyle::Psql)
                    .format_cities(KNOWN_CITIES);
                println!("{table}");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show version information
    fn show_version(&self) {
        println!("export version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config()?;
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate the effective configuration
    fn validate_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist, defaults apply");
        }

        self.config.validate()?;
        println!("Configuration is valid");
        Ok(())
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        let path = self.get_config_path();
        println!("# Configuration file: {}", path.display());
        println!();
        println!("{}", self.config.to_toml_masked()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn get_config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }
}

/// Generated output path `<output_dir>/<city>_<variant>_<timestamp>.csv`
///
/// # Arguments
/// * `spec` - Filter whose city and variant name the file
/// * `export` - Output directory and timestamp format
/// * `now` - Time stamped into the name
///
/// # Returns
/// * `Result<PathBuf>` - Path, or error if the timestamp format is invalid
pub fn default_output_path(
    spec: &FilterSpec,
    export: &ExportConfig,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let mut timestamp = String::new();
    write!(timestamp, "{}", now.format(&export.timestamp_format)).map_err(|_| {
        ConfigError::InvalidValue {
            field: "export.timestamp_format".to_string(),
            value: export.timestamp_format.clone(),
        }
    })?;

    let name = format!(
        "{}_{}_{}.csv",
        file_component(spec.city()),
        file_component(spec.variant()),
        timestamp
    );
    Ok(join_output(&export.output_dir, name))
}

fn join_output(dir: &Path, name: String) -> PathBuf {
    if dir.as_os_str().is_empty() || dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}

/// Whether clap reports a help or version request rather than a mistake
fn is_informational(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

/// Describe a clap usage error as invalid input
///
/// # Arguments
/// * `err` - Error returned by clap
///
/// # Returns
/// * `InputError` - The offending argument and value, or clap's own message
fn usage_error(err: &clap::Error) -> InputError {
    let context = |kind| err.get(kind).map(|value| value.to_string());

    let field = context(ContextKind::InvalidArg).unwrap_or_else(|| "arguments".to_string());
    let value = context(ContextKind::InvalidValue)
        .or_else(|| context(ContextKind::InvalidSubcommand))
        .unwrap_or_else(|| {
            let rendered = err.render().to_string();
            let first = rendered.lines().next().unwrap_or_default();
            first.trim_start_matches("error: ").trim().to_string()
        });

    InputError::InvalidValue { field, value }
}

/// Replace path separators so a value stays a single file name component
fn file_component(value: &str) -> String {
    value.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::error::{ExportError, InputError};

    fn interface(argv: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(argv).unwrap();
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        CliInterface { args, config }
    }

    #[test]
    fn test_positional_arguments() {
        let args = CliArgs::try_parse_from(["export", "Delhi", "CAB", "out.csv"]).unwrap();
        assert_eq!(args.city.as_deref(), Some("Delhi"));
        assert_eq!(args.variant.as_deref(), Some("CAB"));
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert!(args.command.is_none());
    }

    #[test]
    fn test_city_only() {
        let cli = interface(&["export", "Delhi"]);
        let spec = cli.filter_spec().unwrap();
        assert_eq!(spec.city(), "Delhi");
        assert_eq!(spec.variant(), "ALL");
    }

    #[test]
    fn test_missing_city_is_invalid_input() {
        let cli = interface(&["export"]);
        let err = cli.filter_spec().unwrap_err();
        assert!(matches!(
            err,
            ExportError::InvalidInput(InputError::MissingCity)
        ));
    }

    #[test]
    fn test_subcommands() {
        let args = CliArgs::try_parse_from(["export", "config", "--show"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::Config {
                show: true,
                validate: false
            })
        ));

        let args = CliArgs::try_parse_from(["export", "completion", "zsh"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Completion { .. })));
    }

    #[test]
    fn test_connection_args_override_config() {
        let cli = interface(&[
            "export",
            "--host",
            "ch.internal",
            "--port",
            "8443",
            "--secure",
            "-u",
            "reader",
            "--password",
            "pw",
            "--timeout",
            "30",
            "Delhi",
        ]);
        let conn = &cli.config().connection;
        assert_eq!(conn.endpoint(), "https://ch.internal:8443");
        assert_eq!(conn.user, "reader");
        assert_eq!(conn.password, "pw");
        assert_eq!(conn.timeout, 30);
    }

    #[test]
    fn test_display_and_logging_args() {
        let cli = interface(&["export", "--format", "json", "--no-color", "--vv", "Delhi"]);
        assert_eq!(cli.config().display.format, OutputFormat::Json);
        assert!(!cli.use_colors());
        assert_eq!(cli.config().logging.level, LogLevel::Trace);

        let cli = interface(&["export", "-q", "Delhi"]);
        assert!(cli.is_quiet());
        assert_eq!(cli.config().logging.level, LogLevel::Error);
    }

    #[test]
    fn test_default_output_path() {
        let spec = FilterSpec::create("Delhi", Some("bike")).unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

        let path = default_output_path(&spec, &ExportConfig::default(), now).unwrap();
        assert_eq!(path, PathBuf::from("Delhi_BIKE_20240305_140709.csv"));

        let export = ExportConfig {
            output_dir: PathBuf::from("/tmp/exports"),
            ..ExportConfig::default()
        };
        let path = default_output_path(&spec, &export, now).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/tmp/exports/Delhi_BIKE_20240305_140709.csv")
        );
    }

    #[test]
    fn test_output_name_strips_separators() {
        let spec = FilterSpec::create("Kochi/Ernakulam", None).unwrap();
        let now = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let path = default_output_path(&spec, &ExportConfig::default(), now).unwrap();
        assert_eq!(path, PathBuf::from("Kochi_Ernakulam_ALL_20240101_000000.csv"));
    }

    #[test]
    fn test_bad_option_value_is_invalid_input() {
        let parsed = CliArgs::try_parse_from(["export", "--port", "abc", "Delhi"]);
        let err = CliInterface::accept_args(parsed).unwrap_err();

        match err {
            ExportError::InvalidInput(InputError::InvalidValue { field, value }) => {
                assert!(field.contains("--port"));
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extra_positional_is_invalid_input() {
        let parsed = CliArgs::try_parse_from(["export", "Delhi", "ALL", "out.csv", "extra"]);
        let err = CliInterface::accept_args(parsed).unwrap_err();

        assert_eq!(err.phase(), "input");
        assert!(matches!(
            err,
            ExportError::InvalidInput(InputError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_help_and_version_are_informational() {
        let help = CliArgs::try_parse_from(["export", "--help"]).unwrap_err();
        assert!(is_informational(help.kind()));

        let version = CliArgs::try_parse_from(["export", "--version"]).unwrap_err();
        assert!(is_informational(version.kind()));

        let bad = CliArgs::try_parse_from(["export", "--timeout", "soon"]).unwrap_err();
        assert!(!is_informational(bad.kind()));
    }

    #[test]
    fn test_explicit_output_path() {
        let cli = interface(&["export", "Delhi", "CAB", "/data/out.csv"]);
        let spec = cli.filter_spec().unwrap();
        assert_eq!(cli.output_path(&spec).unwrap(), PathBuf::from("/data/out.csv"));
    }
}
