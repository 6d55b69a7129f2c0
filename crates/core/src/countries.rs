//! Transformation functions for REST Countries API responses

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::serde_util::{lenient, lenient_map};

/// Placeholder shown for any value the API left out.
pub const PLACEHOLDER: &str = "N/A";

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Country object from the `/v3.1/all` endpoint
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawCountry {
    #[serde(default, deserialize_with = "lenient")]
    pub name: RawCountryName,
    /// Keyed by ISO 4217 code, kept in document order.
    #[serde(default, deserialize_with = "lenient_map")]
    pub currencies: IndexMap<String, RawCurrency>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawCountryName {
    #[serde(default, deserialize_with = "lenient")]
    pub common: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawCurrency {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub symbol: Option<String>,
}

// =============================================================================
// Output Types
// =============================================================================

/// A currency as shown to the user
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub name: String,
    pub symbol: String,
}

impl CurrencyInfo {
    /// `Name (symbol)`
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

/// View model for one country
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    pub currencies: Vec<CurrencyInfo>,
}

impl From<&RawCountry> for Country {
    fn from(raw: &RawCountry) -> Self {
        Self {
            name: country_name(raw).to_string(),
            currencies: raw
                .currencies
                .values()
                .map(|currency| CurrencyInfo {
                    name: or_placeholder(&currency.name),
                    symbol: or_placeholder(&currency.symbol),
                })
                .collect(),
        }
    }
}

fn or_placeholder(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Common name of a country, or the placeholder.
pub fn country_name(raw: &RawCountry) -> &str {
    raw.name.common.as_deref().unwrap_or(PLACEHOLDER)
}

/// Build the view models for every fetched country, preserving order.
pub fn transform_countries(raw: &[RawCountry]) -> Vec<Country> {
    raw.iter().map(Country::from).collect()
}

/// Format a country as `name: Currency (symbol), Currency (symbol)`.
///
/// A country without currencies yields `name: ` with nothing after the colon.
pub fn format_country_line(country: &Country) -> String {
    let currencies = country
        .currencies
        .iter()
        .map(CurrencyInfo::display)
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}: {}", country.name, currencies)
}

/// Names of the countries with at least one currency whose name contains
/// `filter`, compared case-insensitively.
///
/// Currencies without a name are compared as the empty string, so they only
/// match an empty filter. Each country appears at most once, in input order.
pub fn filter_by_currency(raw: &[RawCountry], filter: &str) -> Vec<String> {
    let needle = filter.to_lowercase();

    raw.iter()
        .filter(|country| {
            country.currencies.values().any(|currency| {
                currency
                    .name
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle)
            })
        })
        .map(|country| country_name(country).to_string())
        .collect()
}

/// Heading printed above a filter report.
pub fn filter_heading(filter: &str) -> String {
    format!("Countries using currency: {}", filter.to_uppercase())
}
