//! Models and aggregations for Open Brewery DB responses

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::serde_util::lenient;

/// Brewery record from the `/breweries` endpoint
///
/// Every field tolerates being absent, `null` or of the wrong type.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Brewery {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub brewery_type: String,
    #[serde(default, deserialize_with = "lenient")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient")]
    pub website_url: Option<String>,
}

impl Brewery {
    pub fn has_website(&self) -> bool {
        self.website_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Brewery type histogram, grouped by city. Keys keep first-seen order.
pub type TypeCountsByCity = IndexMap<String, IndexMap<String, usize>>;

pub fn list_names(breweries: &[Brewery]) -> Vec<String> {
    breweries.iter().map(|b| b.name.clone()).collect()
}

pub fn count(breweries: &[Brewery]) -> usize {
    breweries.len()
}

/// Count breweries per `city`, then per `brewery_type`.
pub fn type_counts_by_city(breweries: &[Brewery]) -> TypeCountsByCity {
    let mut counts = TypeCountsByCity::new();

    for brewery in breweries {
        *counts
            .entry(brewery.city.clone())
            .or_default()
            .entry(brewery.brewery_type.clone())
            .or_default() += 1;
    }

    counts
}

/// Breweries with a non-empty `website_url`, in input order.
pub fn with_website(breweries: &[Brewery]) -> Vec<Brewery> {
    breweries
        .iter()
        .filter(|b| b.has_website())
        .cloned()
        .collect()
}

/// Capitalize the first letter of every alphabetic run and lowercase the rest.
///
/// `new_york` becomes `New_York`.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }

    result
}

/// Everything printed for one state
#[derive(Debug, Serialize, Clone)]
pub struct BreweryReport {
    pub state: String,
    pub names: Vec<String>,
    pub total: usize,
    pub types_by_city: TypeCountsByCity,
    pub with_website: Vec<Brewery>,
}

pub fn build_report(state: &str, breweries: &[Brewery]) -> BreweryReport {
    BreweryReport {
        state: state.to_string(),
        names: list_names(breweries),
        total: count(breweries),
        types_by_city: type_counts_by_city(breweries),
        with_website: with_website(breweries),
    }
}
