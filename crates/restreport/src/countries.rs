use crate::prelude::{eprintln, print, println, *};
use colored::Colorize;
use restreport_core::countries::{
    filter_by_currency, filter_heading, format_country_line, transform_countries, Country,
    RawCountry,
};
use restreport_core::serde_util::lenient_items;

const COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all";

#[derive(Debug, clap::Parser)]
#[command(name = "countries")]
#[command(about = "List countries with their currencies and filter them by currency name")]
pub struct App {
    /// Currency name to filter by (case-insensitive substring, repeatable)
    #[arg(long = "currency", value_name = "NAME")]
    pub currencies: Vec<String>,

    /// Endpoint returning the full country list
    #[arg(long, env = "RESTREPORT_COUNTRIES_URL", default_value = COUNTRIES_URL)]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: App, global: crate::Global, client: reqwest::Client) -> Result<()> {
    if global.verbose {
        println!("REST Countries endpoint: {}", app.url);
        println!();
    }

    let mut reporter = CurrencyReporter::new(client, app.url.clone());
    let fetched = reporter.fetch_all().await.map(|countries| countries.len());

    if let Err(err) = &fetched {
        eprintln!("{}", err.to_string().red());
        if app.json {
            return Ok(());
        }
    }

    let matches = currency_matches(&reporter, &app.currencies);

    if app.json {
        println!("{}", format_json(&reporter, matches)?);
    } else {
        print!("{}", format_text(&reporter, fetched.is_ok(), matches));
    }

    Ok(())
}

/// Filter results for the requested currencies, or for dollar and euro when
/// none were requested.
fn currency_matches(
    reporter: &CurrencyReporter,
    currencies: &[String],
) -> Vec<(String, Result<Vec<String>, Error>)> {
    if currencies.is_empty() {
        return vec![
            ("dollar".to_string(), reporter.dollar_countries()),
            ("euro".to_string(), reporter.euro_countries()),
        ];
    }

    currencies
        .iter()
        .map(|currency| (currency.clone(), reporter.filter_by_currency(currency)))
        .collect()
}

/// Country currency listing backed by a single GET of the full country list
///
/// The fetched list is kept for the lifetime of the reporter; every listing
/// and filter call works on that copy.
pub struct CurrencyReporter {
    client: reqwest::Client,
    url: String,
    data: Option<Vec<RawCountry>>,
}

impl CurrencyReporter {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            data: None,
        }
    }

    /// Fetch every country and keep the result for later calls.
    pub async fn fetch_all(&mut self) -> Result<&[RawCountry], Error> {
        log::debug!("GET {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            log::warn!("request to {} failed: {}", self.url, e);
            Error::from(e)
        })?;

        if !response.status().is_success() {
            log::warn!("{} answered HTTP {}", self.url, response.status());
            return Err(Error::Fetch(format!("HTTP {}", response.status())));
        }

        let values: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to parse country list: {}", e)))?;
        let countries: Vec<RawCountry> = lenient_items(values);

        log::info!("fetched {} countries", countries.len());

        Ok(self.data.insert(countries).as_slice())
    }

    fn data(&self, action: &str) -> Result<&[RawCountry], Error> {
        match self.data.as_deref() {
            Some(countries) if !countries.is_empty() => Ok(countries),
            _ => Err(Error::NotReady(action.to_string())),
        }
    }

    /// View models for every fetched country.
    pub fn countries(&self) -> Result<Vec<Country>, Error> {
        Ok(transform_countries(self.data("display")?))
    }

    /// One `name: Currency (symbol), ...` line per country.
    pub fn list_all(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .countries()?
            .iter()
            .map(format_country_line)
            .collect())
    }

    /// Names of the countries using a currency whose name contains `filter`.
    pub fn filter_by_currency(&self, filter: &str) -> Result<Vec<String>, Error> {
        let names = filter_by_currency(self.data("filter")?, filter);

        if names.is_empty() {
            return Err(Error::EmptyResult {
                what: "countries".to_string(),
                filter: filter.to_string(),
            });
        }

        Ok(names)
    }

    pub fn dollar_countries(&self) -> Result<Vec<String>, Error> {
        self.filter_by_currency("dollar")
    }

    pub fn euro_countries(&self) -> Result<Vec<String>, Error> {
        self.filter_by_currency("euro")
    }
}

/// Render a filter report: heading followed by one country per line.
///
/// Not-ready and empty results are rendered as their diagnostic message.
fn format_filter_report(filter: &str, result: Result<Vec<String>, Error>) -> String {
    let mut output = String::new();

    match result {
        Ok(names) => {
            output.push_str(&format!("\n{}\n", filter_heading(filter).bold()));
            for name in names {
                output.push_str(&format!("{}\n", name));
            }
        }
        Err(err @ Error::EmptyResult { .. }) => {
            output.push_str(&format!("\n{}\n", filter_heading(filter).bold()));
            output.push_str(&format!("{}\n", err.to_string().yellow()));
        }
        Err(err) => {
            output.push_str(&format!("{}\n", err.to_string().yellow()));
        }
    }

    output
}

/// Render the full text report: fetch status, every country line, then one
/// block per currency filter.
fn format_text(
    reporter: &CurrencyReporter,
    fetched: bool,
    matches: Vec<(String, Result<Vec<String>, Error>)>,
) -> String {
    let mut output = String::new();

    if fetched {
        output.push_str("Data fetched successfully.\n");
    }

    match reporter.list_all() {
        Ok(lines) => {
            for line in lines {
                output.push_str(&format!("{}\n", line));
            }
        }
        Err(err) => output.push_str(&format!("{}\n", err.to_string().yellow())),
    }

    for (filter, result) in matches {
        output.push_str(&format_filter_report(&filter, result));
    }

    output
}

/// `{ "countries": [...], "matches": [{ "filter", "countries" }, ...] }`
fn format_json(
    reporter: &CurrencyReporter,
    matches: Vec<(String, Result<Vec<String>, Error>)>,
) -> Result<String> {
    let countries = reporter.countries().unwrap_or_default();
    let matches: Vec<serde_json::Value> = matches
        .into_iter()
        .map(|(filter, result)| {
            serde_json::json!({
                "filter": filter,
                "countries": result.unwrap_or_default(),
            })
        })
        .collect();

    let output = serde_json::json!({ "countries": countries, "matches": matches });

    serde_json::to_string_pretty(&output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}
