use anyhow::{anyhow, Context, Result};
use std::env;

use crate::domain::CoefficientTable;
use crate::services::GeminiConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Gemini
    pub gemini: GeminiConfig,

    // Emission factors
    pub coefficients: CoefficientTable,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Environment::from_str(&var("ENV").unwrap_or_else(|| "dev".to_string()));
        let server_addr = var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:10000".to_string());

        // CORS
        let cors_allow_origins = var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Gemini
        let gemini = GeminiConfig {
            api_key: var("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            timeout_seconds: var("GEMINI_TIMEOUT_SECONDS")
                .map(|s| {
                    s.trim()
                        .parse()
                        .with_context(|| format!("GEMINI_TIMEOUT_SECONDS is not a number: {s}"))
                })
                .transpose()?,
        };

        // Emission factors
        let defaults = CoefficientTable::default();
        let travel = match var("EMISSION_FACTORS_TRAVEL") {
            Some(spec) => parse_travel_factors(&spec)?,
            None => defaults
                .travel_factors()
                .map(|(mode, factor)| (mode.to_string(), factor))
                .collect(),
        };
        let electricity = factor_var(&var, "EMISSION_FACTOR_ELECTRICITY", defaults.electricity_factor())?;
        let food = factor_var(&var, "EMISSION_FACTOR_FOOD", defaults.food_factor())?;
        let shopping = factor_var(&var, "EMISSION_FACTOR_SHOPPING", defaults.shopping_factor())?;

        let coefficients = CoefficientTable::new(travel, electricity, food, shopping)
            .context("Invalid emission factor configuration")?;

        Ok(Settings {
            env,
            server_addr,
            cors_allow_origins,
            gemini,
            coefficients,
        })
    }
}

fn factor_var<F>(var: &F, key: &str, default: f64) -> Result<f64>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(s) => s
            .trim()
            .parse()
            .with_context(|| format!("{key} is not a number: {s}")),
        None => Ok(default),
    }
}

/// Parse `car=0.192,bus=0.105` into travel factors.
fn parse_travel_factors(spec: &str) -> Result<Vec<(String, f64)>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (mode, factor) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("EMISSION_FACTORS_TRAVEL entry '{entry}' must be mode=factor"))?;
            let factor = factor
                .trim()
                .parse()
                .with_context(|| format!("EMISSION_FACTORS_TRAVEL factor for '{}' is not a number", mode.trim()))?;
            Ok((mode.trim().to_string(), factor))
        })
        .collect()
}
