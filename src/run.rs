mod cli;

pub use cli::as_cli;

use anyhow::Result;
use tracing::info;

use crate::api::{FinanceApi, HttpApi, LocalApi};
use crate::config::Config;

/// The remote API when a URL is configured, otherwise the local store.
pub fn connect(config: &Config) -> Result<Box<dyn FinanceApi>> {
    match &config.api_url {
        Some(url) => {
            let mut api = HttpApi::new(url)?;
            if let Some(token) = &config.api_token {
                api = api.with_token(token.clone());
            }
            info!(%url, authenticated = api.token().is_some(), "using remote api");
            Ok(Box::new(api))
        }
        None => Ok(Box::new(LocalApi::open(&config.database_path)?)),
    }
}
