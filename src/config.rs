//! Command line and environment configuration for the server binary.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "car-price-api", version, about = "Serve car price predictions over HTTP")]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, env = "CAR_PRICE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CAR_PRICE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Path to the fitted model artifact
    #[arg(long, env = "CAR_PRICE_MODEL", default_value = "LinearRegressionModel.json")]
    pub model_path: PathBuf,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
