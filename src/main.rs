/// dsd_service command line
///
/// Usage: dsd_service <records.json> [station-id]
///
/// Reads a JSON array of `{ "time": RFC3339, "raw": [[u32; 20]; 22] }`
/// records, computes N(D), bulk variables and events, and writes the
/// labeled report as JSON to stdout.
///
/// Environment (also read from `.env`):
/// - `DSD_CONFIG`   — configuration file; must exist when set
///                  (otherwise `./dsd.toml` if present, else defaults)
/// - `DSD_LOG_FILE` — overrides `logging.file`

use std::env;
use std::fs;

use dsd_service::config;
use dsd_service::logging::{self, Stage};
use dsd_service::model::RawRecord;
use dsd_service::pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .ok_or("usage: dsd_service <records.json> [station-id]")?;
    let station = args.next();

    let config_path = env::var("DSD_CONFIG").ok();
    let mut config = config::resolve_config(config_path.as_deref())?;
    if let Ok(log_file) = env::var("DSD_LOG_FILE") {
        config.logging.file = Some(log_file);
    }
    config.logging.init()?;
    logging::debug(Stage::Config, None, &format!("Configuration: {:?}", config));

    let text = fs::read_to_string(&input)?;
    let records: Vec<RawRecord> = serde_json::from_str(&text)?;
    logging::info(
        Stage::System,
        station.as_deref(),
        &format!("Loaded {} records from {}", records.len(), input),
    );

    let report = match pipeline::process_records(station.as_deref(), records, &config) {
        Ok(report) => report,
        Err(e) => {
            logging::error(Stage::System, station.as_deref(), &e.to_string());
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
