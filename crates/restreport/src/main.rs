use crate::prelude::*;
use clap::Parser;

mod breweries;
mod countries;
mod error;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Country currency and brewery reports from public REST APIs"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "RESTREPORT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Countries and their currencies (restcountries.com)
    Countries(crate::countries::App),

    /// Breweries per state (openbrewerydb.org)
    Breweries(crate::breweries::App),
}

/// Build the HTTP client shared by every request of a run
fn create_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("restreport/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();
    let client = create_client()?;

    match app.command {
        SubCommands::Countries(sub_app) => {
            crate::countries::run(sub_app, app.global, client).await
        }
        SubCommands::Breweries(sub_app) => {
            crate::breweries::run(sub_app, app.global, client).await
        }
    }
}
