use anyhow::{Context, Result};

pub const DEFAULT_CURRENCY: &str = "POGs";
pub const DEFAULT_ATTRIBUTE_PREVIEW: usize = 3;

/// Presentation-facing settings of the storefront.
///
/// Reads `NM_CURRENCY` and `NM_ATTRIBUTE_PREVIEW` from the environment, falling back to the
/// defaults above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Label appended to every price.
    pub currency: String,
    /// Number of attributes shown on a catalog card.
    pub attribute_preview: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_owned(),
            attribute_preview: DEFAULT_ATTRIBUTE_PREVIEW,
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(currency) = lookup("NM_CURRENCY").filter(|v| !v.trim().is_empty()) {
            config.currency = currency.trim().to_owned();
        }

        if let Some(raw) = lookup("NM_ATTRIBUTE_PREVIEW") {
            config.attribute_preview = raw
                .trim()
                .parse()
                .with_context(|| format!("NM_ATTRIBUTE_PREVIEW must be a count, got '{raw}'"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.currency, "POGs");
        assert_eq!(config.attribute_preview, 3);
    }

    #[test]
    fn overrides_from_environment() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("NM_CURRENCY", " Y2K "),
            ("NM_ATTRIBUTE_PREVIEW", "5"),
        ]))
        .unwrap();
        assert_eq!(config.currency, "Y2K");
        assert_eq!(config.attribute_preview, 5);
    }

    #[test]
    fn rejects_non_numeric_preview() {
        let err = StorefrontConfig::from_lookup(lookup(&[("NM_ATTRIBUTE_PREVIEW", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("NM_ATTRIBUTE_PREVIEW"));
    }
}
