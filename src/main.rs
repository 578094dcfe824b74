//! driver-export
//!
//! Exports driver device tokens from ClickHouse to a CSV file, selecting
//! drivers by operating city and vehicle variant.
//!
//! # Usage
//!
//! ```bash
//! # All variants in Delhi, file name generated
//! export Delhi
//!
//! # Bike drivers in Bangalore (city code accepted) into a chosen file
//! export std:080 BIKE bangalore_bikes.csv
//!
//! # Show the query and bound values without connecting
//! export --dry-run Delhi CAB
//! ```

use std::io::IsTerminal;

use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use driver_export::cli::CliInterface;
use driver_export::config::OutputFormat;
use driver_export::connection::ClickHouseClient;
use driver_export::error::{ErrorReport, ExportError, Result};
use driver_export::executor::export::ProgressTracker;
use driver_export::executor::{CsvWriter, ExportDriver};
use driver_export::formatter::{SummaryFormatter, TableFormatter};
use driver_export::query::QueryBuilder;

/// Application entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match CliInterface::new() {
        Ok(cli) => cli,
        Err(e) => exit_with(&e, OutputFormat::Text),
    };

    initialize_logging(&cli);

    if let Err(e) = run(&cli).await {
        exit_with(&e, cli.config().display.format);
    }
}

/// Main application logic
///
/// This function orchestrates one run:
/// 1. Handle subcommands
/// 2. Validate configuration and filter input
/// 3. Print the plan for a dry run, or export and print the summary
///
/// # Returns
/// * `Result<()>` - Success or the error of the failing phase
async fn run(cli: &CliInterface) -> Result<()> {
    if cli.handle_subcommand()? {
        return Ok(());
    }

    let config = cli.config();
    config.validate()?;

    let spec = cli.filter_spec()?;
    let builder = QueryBuilder::new(&config.connection.database)?;
    let formatter = SummaryFormatter::new(config.display.format, cli.use_colors());

    let driver = ExportDriver::new(builder);
    if cli.args().dry_run {
        let plan = driver.plan(&spec)?;
        println!("{}", formatter.format_plan(&plan)?);
        return Ok(());
    }

    let output = cli.output_path(&spec)?;
    info!("Fetching data for {}", spec);

    let client = ClickHouseClient::new(&config.connection)?;
    let mut sink = CsvWriter::new(output).with_delimiter(config.export.delimiter_byte()?);

    let show_progress = !cli.is_quiet() && std::io::stderr().is_terminal();
    let preview_rows = cli.args().preview.unwrap_or(0);
    let driver = driver
        .with_progress(ProgressTracker::new(show_progress))
        .with_preview(preview_rows);

    let summary = driver.run(&client, &spec, &mut sink).await?;

    let text_mode = config.display.format == OutputFormat::Text;
    if !(cli.is_quiet() && text_mode) {
        println!("{}", formatter.format_summary(&summary)?);
    }
    if text_mode && preview_rows > 0 {
        let table = TableFormatter::with_colors(cli.use_colors())
            .format_rows(&summary.columns, &summary.preview);
        println!("{table}");
    }

    Ok(())
}

/// Report a fatal error and terminate with exit code 1
fn exit_with(err: &ExportError, format: OutputFormat) -> ! {
    tracing::debug!("{} phase failed: {:?}", err.phase(), err);

    let report = ErrorReport::from_error(err);
    match format {
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error: {}", report.to_text()),
        },
        OutputFormat::Text => eprintln!("Error: {}", report.to_text()),
    }
    std::process::exit(1);
}

/// Initialize logging system based on verbosity level
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    // Build subscriber writing to stderr so stdout carries only results
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
