#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Error fetching data: {0}")]
    Fetch(String),

    #[error("No data to {0}. Please fetch data first.")]
    NotReady(String),

    #[error("No {what} found using {filter}.")]
    EmptyResult { what: String, filter: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}
