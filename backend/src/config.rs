use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Mock,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Result<Self, String> {
        match name.trim().to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(format!("Invalid PRICE_PROVIDER: {}. Must be 'yahoo' or 'mock'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    /// Yahoo symbol for the S&P 500 by default.
    pub benchmark_symbol: String,
    pub benchmark_name: String,
    pub default_ticker: String,
    pub export_enabled: bool,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            provider: ProviderKind::Yahoo,
            benchmark_symbol: "^GSPC".to_string(),
            benchmark_name: "S&P 500".to_string(),
            default_ticker: "AAPL".to_string(),
            export_enabled: false,
            export_dir: PathBuf::from("data"),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("Invalid {} '{}': expected 'true' or 'false'", key, value)),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|e| format!("Invalid BIND_ADDR '{}': {}", addr, e))?,
            None => defaults.bind_addr,
        };
        let provider = match lookup("PRICE_PROVIDER") {
            Some(name) => ProviderKind::parse(&name)?,
            None => defaults.provider,
        };
        let export_enabled = match lookup("EXPORT_ENABLED") {
            Some(flag) => parse_flag("EXPORT_ENABLED", &flag)?,
            None => defaults.export_enabled,
        };

        let config = Self {
            bind_addr,
            provider,
            benchmark_symbol: lookup("BENCHMARK_SYMBOL").unwrap_or(defaults.benchmark_symbol),
            benchmark_name: lookup("BENCHMARK_NAME").unwrap_or(defaults.benchmark_name),
            default_ticker: lookup("DEFAULT_TICKER").unwrap_or(defaults.default_ticker),
            export_enabled,
            export_dir: lookup("EXPORT_DIR").map(PathBuf::from).unwrap_or(defaults.export_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.benchmark_symbol.trim().is_empty() {
            return Err("BENCHMARK_SYMBOL must not be empty".to_string());
        }
        if self.export_enabled && self.export_dir.as_os_str().is_empty() {
            return Err("EXPORT_ENABLED is true but EXPORT_DIR is empty".to_string());
        }
        Ok(())
    }
}
