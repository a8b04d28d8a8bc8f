use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, Text};
use weatherlog_core::{
    ApplicationState, Config, Event, ListState, RemoteWeatherClient, ReqwestTransport,
    SqliteStore, Tab, WeatherApp,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherlog", version, about = "Current weather with a local history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the endpoint, API key and API host.
    Configure,

    /// Fetch the current reading, save it and show it on the map tab.
    Request,

    /// Render one tab of the application state.
    Show {
        #[arg(long, value_enum, default_value_t = TabArg::Map)]
        tab: TabArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TabArg {
    Map,
    List,
}

impl From<TabArg> for Tab {
    fn from(value: TabArg) -> Self {
        match value {
            TabArg::Map => Tab::Map,
            TabArg::List => Tab::List,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => {
                configure(&mut config)?;
                config.save()?;
                println!("Saved configuration to {}", Config::config_file_path()?.display());
            }
            Command::Request => {
                if !config.is_api_key_configured() {
                    bail!("No API key configured.\nHint: run `weatherlog configure` first.");
                }

                let mut app = build_app(&config)?;
                app.handle(Event::Request);
                app.settle().await;

                if let Some(alert) = &app.state().request_error {
                    bail!("{alert}");
                }
                render(app.state());
            }
            Command::Show { tab } => {
                let mut app = build_app(&config)?;
                app.handle(Event::ShowTab(tab.into()));
                if app.state().active_tab == Tab::List {
                    app.handle(Event::LoadRecords);
                    app.settle().await;
                }
                render(app.state());
            }
        }

        Ok(())
    }
}

fn configure(config: &mut Config) -> Result<()> {
    let client = &mut config.client;

    client.endpoint_url = Text::new("Endpoint URL:")
        .with_default(&client.endpoint_url)
        .prompt()
        .context("Failed to read endpoint URL")?;

    client.api_host = Text::new("API host:")
        .with_default(&client.api_host)
        .prompt()
        .context("Failed to read API host")?;

    let api_key = Password::new("API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    Ok(())
}

fn build_app(config: &Config) -> Result<WeatherApp> {
    let transport = ReqwestTransport::new(config.client.timeout())
        .context("Failed to build HTTP transport")?;
    let client = RemoteWeatherClient::new(&config.client, Arc::new(transport))
        .context("Invalid client configuration")?;

    let db_path = config.database_file_path()?;
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    Ok(WeatherApp::new(Arc::new(client), Arc::new(store)))
}

fn render(state: &ApplicationState) {
    match state.active_tab {
        Tab::Map => {
            let marker = &state.current_marker;
            println!(
                "{} ({:.6}, {:.6})",
                marker.name, marker.coordinate.latitude, marker.coordinate.longitude
            );
        }
        Tab::List => match &state.list_state {
            ListState::Loading => println!("Loading..."),
            ListState::Error => println!("Could not load the saved readings."),
            ListState::Loaded(records) if records.is_empty() => println!("No readings saved yet."),
            ListState::Loaded(records) => {
                for record in records {
                    let reading = &record.reading;
                    println!(
                        "#{:<4} {}  {}  {}  temp {}  humidity {}%",
                        record.id,
                        record.captured_at.with_timezone(&Local).format("%-m/%-d/%Y %-I:%M:%S %p"),
                        reading.name,
                        reading.weather_summary,
                        reading.temperature_c,
                        reading.humidity_pct,
                    );
                }
            }
        },
    }

    if let Some(err) = &state.load_error {
        eprintln!("warning: {err}");
    }
}
