use crate::prelude::{eprintln, print, println, *};
use colored::Colorize;
use restreport_core::breweries::{build_report, title_case, Brewery, BreweryReport};
use restreport_core::pagination::{PageCursor, PageQuery};
use restreport_core::serde_util::lenient_items;

const BREWERIES_URL: &str = "https://api.openbrewerydb.org/breweries";

const DEFAULT_STATES: [&str; 3] = ["alaska", "maine", "new_york"];

#[derive(Debug, clap::Parser)]
#[command(name = "breweries")]
#[command(about = "Report breweries per state: names, totals, types by city and websites")]
pub struct App {
    /// States to report on, as accepted by the `by_state` filter
    #[arg(value_name = "STATE", default_values = DEFAULT_STATES)]
    pub states: Vec<String>,

    /// Number of breweries requested per page
    #[arg(
        long,
        env = "RESTREPORT_PER_PAGE",
        default_value_t = 50,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub per_page: u32,

    /// Open Brewery DB collection endpoint
    #[arg(long, env = "RESTREPORT_BREWERIES_URL", default_value = BREWERIES_URL)]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: App, global: crate::Global, client: reqwest::Client) -> Result<()> {
    if global.verbose {
        println!("Open Brewery DB endpoint: {}", app.url);
        println!();
    }

    let api = BreweryApi::new(client, app.url.clone());
    let mut reports = Vec::new();

    let results = state_reports(&api, &app.states, app.per_page, global.verbose).await;

    for (state, result) in results {
        match result {
            Ok(report) if app.json => reports.push(report),
            Ok(report) => print!("{}", format_report_text(&report)),
            Err(err) => eprintln!(
                "{} {}",
                format!("Failed to fetch breweries in {}:", title_case(&state)).red(),
                err
            ),
        }
    }

    if app.json {
        println!("{}", format_reports_json(&reports)?);
    }

    Ok(())
}

/// Fetch and aggregate every state in order.
///
/// A state whose fetch fails keeps its error in place; the remaining states
/// are still fetched.
async fn state_reports(
    api: &BreweryApi,
    states: &[String],
    per_page: u32,
    verbose: bool,
) -> Vec<(String, Result<BreweryReport, Error>)> {
    let mut results = Vec::with_capacity(states.len());

    for state in states {
        if verbose {
            println!("Fetching breweries in {}...", state);
        }

        let result = api
            .fetch_by_state(state, per_page)
            .await
            .map(|breweries| build_report(state, &breweries));

        if let Err(err) = &result {
            log::warn!("skipping {}: {}", state, err);
        }

        results.push((state.clone(), result));
    }

    results
}

fn format_reports_json(reports: &[BreweryReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

/// Client for the Open Brewery DB collection endpoint
pub struct BreweryApi {
    client: reqwest::Client,
    base_url: String,
}

impl BreweryApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch a single page of breweries for `state`.
    pub async fn fetch_page(
        &self,
        state: &str,
        query: PageQuery,
    ) -> Result<Vec<Brewery>, Error> {
        log::debug!(
            "GET {} by_state={} per_page={} page={}",
            self.base_url,
            state,
            query.per_page,
            query.page
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("by_state", state.to_string()),
                ("per_page", query.per_page.to_string()),
                ("page", query.page.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            log::warn!(
                "page {} for {} answered HTTP {}",
                query.page,
                state,
                response.status()
            );
            return Err(Error::Fetch(format!(
                "page {} for {}: HTTP {}",
                query.page,
                state,
                response.status()
            )));
        }

        let values: Vec<serde_json::Value> = response.json().await.map_err(|e| {
            Error::Fetch(format!(
                "Failed to parse page {} for {}: {}",
                query.page, state, e
            ))
        })?;

        Ok(lenient_items(values))
    }

    /// Fetch every brewery in `state`, one page at a time, until a page comes
    /// back empty.
    ///
    /// The first failing page aborts the whole fetch.
    pub async fn fetch_by_state(
        &self,
        state: &str,
        per_page: u32,
    ) -> Result<Vec<Brewery>, Error> {
        let mut cursor = PageCursor::new(per_page);
        let mut breweries = Vec::new();

        while let Some(query) = cursor.next_query() {
            let page = self.fetch_page(state, query).await?;
            log::debug!("page {} for {}: {} records", query.page, state, page.len());

            cursor.advance(page.len());
            breweries.extend(page);
        }

        log::info!("fetched {} breweries in {}", cursor.received(), state);

        Ok(breweries)
    }
}

/// Render the text report for one state.
fn format_report_text(report: &BreweryReport) -> String {
    let state = title_case(&report.state);
    let mut result = String::new();

    result.push_str(&format!(
        "\n{}\n",
        format!("Breweries in {}", state).bright_cyan().bold()
    ));
    for name in &report.names {
        result.push_str(&format!(" - {}\n", name));
    }

    result.push_str(&format!(
        "{}\n",
        format!("Total breweries in {}: {}", state, report.total).bold()
    ));

    result.push_str(&format!(
        "{}\n",
        format!("Brewery types by city in {}: ", state).bold()
    ));
    for (city, types) in &report.types_by_city {
        result.push_str(&format!(" {}:\n", city));
        for (brewery_type, count) in types {
            result.push_str(&format!("    {}: {}\n", brewery_type, count));
        }
    }

    result.push_str(&format!(
        "{}\n",
        format!(
            "Breweries with websites in {} ({}):",
            state,
            report.with_website.len()
        )
        .bold()
    ));
    for brewery in &report.with_website {
        result.push_str(&format!(
            " - {}: {}\n",
            brewery.name,
            brewery.website_url.as_deref().unwrap_or_default()
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-process stand-in for the brewery endpoint
    #[derive(Clone, Default)]
    struct FakeApi {
        /// Records per page, 1-indexed by position. Pages past the end are empty.
        pages: Arc<Vec<Vec<Value>>>,
        /// Page numbers that answer with HTTP 500.
        failing_pages: Arc<Vec<usize>>,
        /// `by_state` values that answer with HTTP 500 on every page.
        failing_states: Arc<Vec<String>>,
        requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    impl FakeApi {
        fn with_pages(pages: Vec<Vec<Value>>) -> Self {
            Self {
                pages: Arc::new(pages),
                ..Default::default()
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn requested_pages(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|params| params.get("page").cloned().unwrap_or_default())
                .collect()
        }
    }

    async fn breweries_handler(
        State(api): State<FakeApi>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let page: usize = params
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let state = params.get("by_state").cloned().unwrap_or_default();
        api.requests.lock().unwrap().push(params);

        if api.failing_pages.contains(&page) || api.failing_states.contains(&state) {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        let records = page
            .checked_sub(1)
            .and_then(|index| api.pages.get(index))
            .cloned()
            .unwrap_or_default();

        Json(Value::Array(records)).into_response()
    }

    async fn serve(api: FakeApi) -> String {
        let router = Router::new()
            .route("/breweries", get(breweries_handler))
            .with_state(api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{}/breweries", addr)
    }

    fn records(count: usize, prefix: &str) -> Vec<Value> {
        (0..count)
            .map(|i| {
                let brewery_type = if i % 2 == 0 { "micro" } else { "brewpub" };
                let city = if i % 3 == 0 { "Anchorage" } else { "Juneau" };
                let website = if i % 4 == 0 {
                    Value::Null
                } else {
                    json!(format!("http://{}{}.com", prefix, i))
                };

                json!({
                    "id": format!("{}-{}", prefix, i),
                    "name": format!("{} Brewing {}", prefix, i),
                    "brewery_type": brewery_type,
                    "city": city,
                    "state": "Alaska",
                    "website_url": website,
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_full_page_then_empty_page() {
        let api = FakeApi::with_pages(vec![records(50, "a"), vec![]]);
        let url = serve(api.clone()).await;

        let breweries = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("alaska", 50)
            .await
            .unwrap();

        assert_eq!(breweries.len(), 50);
        assert_eq!(api.request_count(), 2);
    }

    #[tokio::test]
    async fn test_accumulates_until_first_empty_page() {
        let api = FakeApi::with_pages(vec![
            records(3, "a"),
            records(3, "b"),
            records(1, "c"),
            vec![],
            records(3, "never"),
        ]);
        let url = serve(api.clone()).await;

        let breweries = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("alaska", 3)
            .await
            .unwrap();

        assert_eq!(breweries.len(), 7);
        assert_eq!(api.requested_pages(), vec!["1", "2", "3", "4"]);
        assert_eq!(breweries[0].id, "a-0");
        assert_eq!(breweries[6].id, "c-0");
        assert!(breweries.iter().all(|b| !b.id.starts_with("never")));
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let api = FakeApi::with_pages(vec![]);
        let url = serve(api.clone()).await;

        let breweries = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("maine", 50)
            .await
            .unwrap();

        assert!(breweries.is_empty());
        assert_eq!(api.request_count(), 1);
    }

    #[tokio::test]
    async fn test_sends_query_parameters() {
        let api = FakeApi::with_pages(vec![records(2, "a")]);
        let url = serve(api.clone()).await;

        BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("new_york", 25)
            .await
            .unwrap();

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for (index, params) in requests.iter().enumerate() {
            assert_eq!(params["by_state"], "new_york");
            assert_eq!(params["per_page"], "25");
            assert_eq!(params["page"], (index + 1).to_string());
        }
    }

    #[tokio::test]
    async fn test_failing_page_aborts_fetch() {
        let api = FakeApi {
            failing_pages: Arc::new(vec![2]),
            ..FakeApi::with_pages(vec![records(5, "a"), records(5, "b"), vec![]])
        };
        let url = serve(api.clone()).await;

        let result = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("alaska", 5)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("500"));
        assert_eq!(api.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_fetch_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/breweries", addr);
        let result = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("alaska", 50)
            .await;

        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_tolerates_partial_records() {
        let api = FakeApi::with_pages(vec![vec![
            json!({ "name": "Only Name" }),
            json!({ "id": "x", "city": null, "brewery_type": 7 }),
        ]]);
        let url = serve(api.clone()).await;

        let breweries = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("alaska", 50)
            .await
            .unwrap();

        assert_eq!(breweries.len(), 2);
        assert_eq!(breweries[0].name, "Only Name");
        assert_eq!(breweries[1].city, "");
        assert_eq!(breweries[1].brewery_type, "");
    }

    #[test]
    fn test_format_report_text() {
        colored::control::set_override(false);

        let breweries = vec![
            Brewery {
                name: "Midnight Sun".to_string(),
                brewery_type: "micro".to_string(),
                city: "Anchorage".to_string(),
                website_url: Some("http://midnightsun.com".to_string()),
                ..Default::default()
            },
            Brewery {
                name: "Broken Tooth".to_string(),
                brewery_type: "brewpub".to_string(),
                city: "Anchorage".to_string(),
                ..Default::default()
            },
            Brewery {
                name: "Alaskan".to_string(),
                brewery_type: "regional".to_string(),
                city: "Juneau".to_string(),
                website_url: Some(String::new()),
                ..Default::default()
            },
        ];

        let text = format_report_text(&build_report("new_york", &breweries));

        let expected = "\nBreweries in New_York\n \
             - Midnight Sun\n \
             - Broken Tooth\n \
             - Alaskan\n\
             Total breweries in New_York: 3\n\
             Brewery types by city in New_York: \n \
             Anchorage:\n    \
             micro: 1\n    \
             brewpub: 1\n \
             Juneau:\n    \
             regional: 1\n\
             Breweries with websites in New_York (1):\n \
             - Midnight Sun: http://midnightsun.com\n";

        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_report_text_empty_state() {
        colored::control::set_override(false);

        let text = format_report_text(&build_report("maine", &[]));

        assert_eq!(
            text,
            "\nBreweries in Maine\n\
             Total breweries in Maine: 0\n\
             Brewery types by city in Maine: \n\
             Breweries with websites in Maine (0):\n"
        );
    }

    #[tokio::test]
    async fn test_failed_state_does_not_stop_the_next() {
        let api = FakeApi {
            failing_states: Arc::new(vec!["alaska".to_string()]),
            ..FakeApi::with_pages(vec![records(2, "m")])
        };
        let url = serve(api.clone()).await;
        let brewery_api = BreweryApi::new(reqwest::Client::new(), url);
        let states = vec!["alaska".to_string(), "maine".to_string()];

        let results = state_reports(&brewery_api, &states, 50, false).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "alaska");
        assert!(matches!(results[0].1, Err(Error::Fetch(_))));

        assert_eq!(results[1].0, "maine");
        let maine = results[1].1.as_ref().unwrap();
        assert_eq!(maine.state, "maine");
        assert_eq!(maine.total, 2);

        let maine_requests = api
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|params| params["by_state"] == "maine")
            .count();
        assert_eq!(maine_requests, 2);
    }

    #[tokio::test]
    async fn test_page_with_non_object_elements_is_kept() {
        let api = FakeApi::with_pages(vec![vec![
            json!(null),
            json!({ "id": "ok", "name": "Survivor", "city": "Sitka", "brewery_type": "micro" }),
        ]]);
        let url = serve(api.clone()).await;

        let breweries = BreweryApi::new(reqwest::Client::new(), url)
            .fetch_by_state("alaska", 50)
            .await
            .unwrap();

        assert_eq!(breweries.len(), 2);
        assert_eq!(breweries[0], Brewery::default());
        assert_eq!(breweries[1].name, "Survivor");
        assert_eq!(api.request_count(), 2);
    }

    #[test]
    fn test_format_reports_json_shape() {
        let breweries = vec![
            Brewery {
                name: "Midnight Sun".to_string(),
                brewery_type: "micro".to_string(),
                city: "Anchorage".to_string(),
                website_url: Some("http://midnightsun.com".to_string()),
                ..Default::default()
            },
            Brewery {
                name: "Broken Tooth".to_string(),
                brewery_type: "brewpub".to_string(),
                city: "Anchorage".to_string(),
                ..Default::default()
            },
        ];
        let reports = vec![
            build_report("alaska", &breweries),
            build_report("maine", &[]),
        ];

        let json = format_reports_json(&reports).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["state"], "alaska");
        assert_eq!(array[0]["total"], 2);
        assert_eq!(array[0]["names"], json!(["Midnight Sun", "Broken Tooth"]));
        assert_eq!(
            array[0]["types_by_city"],
            json!({ "Anchorage": { "micro": 1, "brewpub": 1 } })
        );
        assert_eq!(array[0]["with_website"][0]["name"], "Midnight Sun");
        assert_eq!(
            array[0]["with_website"][0]["website_url"],
            "http://midnightsun.com"
        );
        assert_eq!(array[1]["total"], 0);
        assert_eq!(array[1]["types_by_city"], json!({}));
    }
}
