use std::path::Path;

use anyhow::{Context, Result};
use pcb_digikey::{DEFAULT_ATTEMPTS, Locale};
use serde::Deserialize;

/// Contents of an optional `--config` TOML file.
///
/// ```toml
/// quantities = [10, 100, 1000]
/// retries = 2
///
/// [locale]
/// site = "DE"
/// currency = "EUR"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub quantities: Option<Vec<u64>>,
    pub retries: Option<u32>,
    pub locale: Option<Locale>,
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Values given on the command line. `None` falls through to the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub quantities: Option<Vec<u64>>,
    pub retries: Option<u32>,
    pub locale_site: Option<String>,
    pub locale_language: Option<String>,
    pub locale_currency: Option<String>,
    pub customer_id: Option<String>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Target PCB build quantities. Empty disables COGS analysis.
    pub quantities: Vec<u64>,
    /// Total search attempts per BOM line.
    pub attempts: u32,
    pub locale: Locale,
}

impl Settings {
    pub fn resolve(config: ReportConfig, overrides: Overrides) -> Self {
        let mut locale = config.locale.unwrap_or_default();
        if let Some(site) = overrides.locale_site {
            locale.site = site;
        }
        if let Some(language) = overrides.locale_language {
            locale.language = language;
        }
        if let Some(currency) = overrides.locale_currency {
            locale.currency = currency;
        }
        if let Some(customer_id) = overrides.customer_id {
            locale.customer_id = customer_id;
        }

        let mut quantities = overrides
            .quantities
            .or(config.quantities)
            .unwrap_or_default();
        quantities.retain(|&q| q > 0);
        quantities.sort_unstable();
        quantities.dedup();

        let attempts = overrides
            .retries
            .or(config.retries)
            .map(|r| r.saturating_add(1))
            .unwrap_or(DEFAULT_ATTEMPTS);

        Self {
            quantities,
            attempts,
            locale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(ReportConfig::default(), Overrides::default());
        assert!(settings.quantities.is_empty());
        assert_eq!(settings.attempts, DEFAULT_ATTEMPTS);
        assert_eq!(settings.locale, Locale::default());
    }

    #[test]
    fn test_config_file() {
        let config = ReportConfig::from_toml_str(
            r#"
            quantities = [1000, 10, 100, 10]
            retries = 0

            [locale]
            site = "DE"
            currency = "EUR"
            "#,
        )
        .unwrap();
        let settings = Settings::resolve(config, Overrides::default());
        assert_eq!(settings.quantities, vec![10, 100, 1000]);
        assert_eq!(settings.attempts, 1);
        assert_eq!(settings.locale.site, "DE");
        assert_eq!(settings.locale.currency, "EUR");
        assert_eq!(settings.locale.language, "en");
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = ReportConfig::from_toml_str(
            "quantities = [5]\nretries = 4\n[locale]\ncurrency = \"EUR\"\n",
        )
        .unwrap();
        let overrides = Overrides {
            quantities: Some(vec![50]),
            locale_currency: Some("GBP".into()),
            customer_id: Some("1234".into()),
            ..Default::default()
        };
        let settings = Settings::resolve(config, overrides);
        assert_eq!(settings.quantities, vec![50]);
        assert_eq!(settings.attempts, 5);
        assert_eq!(settings.locale.currency, "GBP");
        assert_eq!(settings.locale.customer_id, "1234");
    }

    #[test]
    fn test_unknown_config_key() {
        assert!(ReportConfig::from_toml_str("quantity = [1]").is_err());
    }
}
