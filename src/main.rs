// src/main.rs
use std::process;

use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{error, info};
use reqwest::Client;

use portfolio_tracker::api;
use portfolio_tracker::client::PortfolioClient;
use portfolio_tracker::config::Config;
use portfolio_tracker::dashboard::price_holdings;
use portfolio_tracker::db;
use portfolio_tracker::prices::{self, PriceFeed};
use portfolio_tracker::service::PortfolioService;
use portfolio_tracker::view::{self, Action, FormField, LoadStatus, ViewState};

#[derive(Parser)]
#[command(name = "portfolio_tracker", about = "Track stock holdings", version)]
struct Cli {
    /// Root of the portfolio REST API
    #[arg(
        long,
        global = true,
        env = "PORTFOLIO_API_URL",
        default_value = "http://127.0.0.1:3030/api"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST server
    Serve,
    #[command(flatten)]
    Client(ClientCommand),
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Print every holding
    List,
    /// Print total value, top stock, distribution and holdings
    Dashboard {
        /// Print the summary and priced holdings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a stock
    Add(FormArgs),
    /// Replace the fields of a stock, keeping unspecified ones
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FormArgs,
    },
    /// Remove a stock
    Delete { id: i64 },
}

#[derive(Args)]
struct FormArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    ticker: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    quantity: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    buy_price: Option<String>,
}

impl FormArgs {
    fn into_actions(self) -> Vec<Action> {
        [
            (FormField::Name, self.name),
            (FormField::Ticker, self.ticker),
            (FormField::Quantity, self.quantity),
            (FormField::BuyPrice, self.buy_price),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| Action::Input(field, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let ok = match cli.command {
        Command::Serve => serve(config).await,
        Command::Client(command) => run_client(command, &cli.api_url, &config).await,
    };
    if !ok {
        process::exit(1);
    }
}

async fn serve(config: Config) -> bool {
    info!("Starting the portfolio tracker...");
    let repo = match db::open(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            error!("Failed to open stock store: {}", e);
            return false;
        }
    };

    let routes = api::routes(PortfolioService::new(repo));
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, shutting down");
    };
    match warp::serve(routes).try_bind_with_graceful_shutdown(config.bind_addr, shutdown) {
        Ok((addr, server)) => {
            info!("Server running on http://{}", addr);
            server.await;
            true
        }
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr, e);
            false
        }
    }
}

async fn run_client(command: ClientCommand, api_url: &str, config: &Config) -> bool {
    let http = Client::new();
    let client = PortfolioClient::new(http.clone(), api_url);
    let feed = prices::from_config(config, http);

    let mut state = refresh(&client, feed.as_ref(), &ViewState::default()).await;

    match command {
        ClientCommand::List => {
            if state.status == LoadStatus::Loaded {
                print!("{}", view::render_table(&state.holdings));
                return true;
            }
        }
        ClientCommand::Dashboard { json: true } if state.status == LoadStatus::Loaded => {
            return match view::render_json(&state) {
                Ok(text) => {
                    println!("{}", text);
                    true
                }
                Err(e) => {
                    error!("Failed to encode dashboard: {}", e);
                    false
                }
            };
        }
        ClientCommand::Dashboard { .. } => {}
        ClientCommand::Add(fields) => {
            state = view::update(&state, Action::OpenCreate);
            state = submit_form(&client, state, fields.into_actions()).await;
        }
        ClientCommand::Edit { id, fields } => {
            state = view::update(&state, Action::OpenEdit(id));
            state = submit_form(&client, state, fields.into_actions()).await;
        }
        ClientCommand::Delete { id } => {
            state = match client.delete_stock(id).await {
                Ok(()) => view::update(&state, Action::Saved),
                Err(e) => view::update(&state, Action::RequestFailed(e.to_string())),
            };
        }
    }

    if state.status == LoadStatus::Loading {
        state = refresh(&client, feed.as_ref(), &state).await;
    }
    print!("{}", view::render(&state));
    state.error.is_none()
}

/// Fetches the list once and prices it.
async fn refresh(client: &PortfolioClient, feed: &dyn PriceFeed, state: &ViewState) -> ViewState {
    let state = view::update(state, Action::Refresh);
    match client.list_stocks().await {
        Ok(stocks) => {
            let holdings = price_holdings(stocks, feed).await;
            view::update(&state, Action::Loaded(holdings))
        }
        Err(e) => view::update(&state, Action::RequestFailed(e.to_string())),
    }
}

async fn submit_form(client: &PortfolioClient, state: ViewState, inputs: Vec<Action>) -> ViewState {
    let state = inputs
        .into_iter()
        .fold(state, |state, input| view::update(&state, input));
    let Some(form) = &state.form else {
        return state;
    };

    match client.submit(&form.submission()).await {
        Ok(stock) => {
            info!("Saved stock {} ({})", stock.id, stock.ticker);
            view::update(&state, Action::Saved)
        }
        Err(e) => view::update(&state, Action::RequestFailed(e.to_string())),
    }
}
