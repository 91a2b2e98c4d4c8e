use clap::Parser;
use flexi_logger::{FileSpec, Logger, WriteMode};
use lib_reverso::prelude::*;

fn main() -> Result<()> {
    // Initialize program options and environment.
    dotenvy::dotenv().ok();
    let options = RefereeOptions::parse();
    let _logger = Logger::try_with_env_or_str("info")?
        .log_to_file(FileSpec::try_from(options.log_file.clone())?)
        .write_mode(WriteMode::BufferAndFlush)
        .start()?;

    // Play one game against the referee.
    let mut client = RefereeClient::connect(&options)?;
    let result = client.run();
    if let Err(error) = &result {
        log::error!("fatal error: {error:#}");
    }
    result
}
