use anyhow::Result;

use budgetpulse::config::Config;
use budgetpulse::{logging, run};

fn main() -> Result<()> {
    let mut config = Config::load()?;
    let args: Vec<String> = std::env::args().collect();
    let args = config.apply_args(&args)?;
    logging::init(&config.log_filter);
    run::as_cli(&args, &config)
}
