//! Executes `check`, `discover` and `read`

use crate::catalog::{contacts_stream, Catalog};
use crate::cli::commands::{parse_stream_list, Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::discovery::StreamDiscoveryEngine;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::links::resolve_streams;
use crate::state::StateManager;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

/// Runs one parsed command line
#[derive(Debug)]
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Wrap parsed arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, printing each message to stdout as it is produced
    pub async fn run(&self) -> Result<()> {
        self.execute_with(|msg| self.output_message(&msg)).await
    }

    /// Run the CLI command and return the messages it would print
    pub async fn execute(&self) -> Result<Vec<Value>> {
        let mut messages = Vec::new();
        self.execute_with(|msg| messages.push(msg)).await?;
        Ok(messages)
    }

    /// Run the CLI command, handing each message to `emit` in output order
    pub async fn execute_with<F>(&self, mut emit: F) -> Result<()>
    where
        F: FnMut(Value),
    {
        match &self.cli.command {
            Commands::Check => emit(self.check().await?),
            Commands::Discover => emit(self.discover().await?),
            Commands::Read {
                streams,
                catalog,
                max_records,
            } => {
                self.read(streams.as_deref(), catalog.as_deref(), *max_records, emit)
                    .await?;
            }
        }
        Ok(())
    }

    /// `--config-json` wins over `--config`
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }

        Err(Error::config(
            "Configuration not specified (use --config or --config-json)",
        ))
    }

    /// `--state-json` wins over `--state`; neither means empty in-memory state
    fn load_state(&self) -> Result<StateManager> {
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn build_client(config: &TapConfig) -> Result<HttpClient> {
        HttpClient::with_auth(config.to_http_config(), config.to_auth_config())
    }

    /// Fetch the API root and report a CONNECTION_STATUS
    async fn check(&self) -> Result<Value> {
        let config = self.load_config()?;
        let client = Self::build_client(&config)?;
        info!("Checking connection to {}", config.api_url);

        let status = match client.get_json::<Value>(&config.api_url).await {
            Ok(root) => {
                let streams = resolve_streams(&root);
                json!({
                    "status": "SUCCEEDED",
                    "message": format!("Connection successful, {} stream(s) linked", streams.len())
                })
            }
            Err(e) => {
                warn!("Connection check failed: {e}");
                let message = match e.status() {
                    Some(401 | 403) => format!("Connection failed, token rejected: {e}"),
                    _ => format!("Connection failed: {e}"),
                };
                json!({
                    "status": "FAILED",
                    "message": message
                })
            }
        };

        Ok(json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }))
    }

    /// Print the Singer catalog
    async fn discover(&self) -> Result<Value> {
        let config = self.load_config()?;
        let catalog = Self::discover_catalog(&config).await?;
        Ok(catalog.to_singer_json())
    }

    /// Discovered streams plus the static contacts stream
    async fn discover_catalog(config: &TapConfig) -> Result<Catalog> {
        let client = Self::build_client(config)?;
        let report = StreamDiscoveryEngine::new(client, &config.api_url)
            .with_config(config.discovery_config())
            .discover()
            .await?;

        let issues = report.issues().count();
        if issues > 0 {
            warn!("{issues} sample file issue(s) during discovery");
        }

        let mut catalog = report.into_catalog();
        let contacts = contacts_stream(&config.api_url)?;
        if !catalog.add_if_absent(contacts) {
            warn!("A discovered stream is already named 'contacts'; keeping it");
        }
        Ok(catalog)
    }

    /// Read selected streams from a catalog file or a fresh discovery
    ///
    /// Bookmarks of streams finished before a failure are still saved.
    async fn read<F>(
        &self,
        streams: Option<&str>,
        catalog_path: Option<&Path>,
        max_records: Option<usize>,
        mut emit: F,
    ) -> Result<()>
    where
        F: FnMut(Value),
    {
        let config = self.load_config()?;
        let state = self.load_state()?;

        let catalog = match catalog_path {
            Some(path) => Catalog::from_file(path)?,
            None => Self::discover_catalog(&config).await?,
        };

        let requested = streams.map(parse_stream_list).filter(|s| !s.is_empty());
        let selected = catalog.select(requested.as_deref())?;
        info!(
            "Reading {} stream(s): {:?}",
            selected.len(),
            selected.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
        );

        let mut sync_config = config.sync_config();
        if let Some(max) = max_records {
            sync_config = sync_config.with_max_records(max);
        }

        let mut engine =
            SyncEngine::new(Self::build_client(&config)?, state).with_config(sync_config);
        let result = engine
            .sync_streams(&selected, |msg| emit(msg.to_json()))
            .await;
        engine.state().save().await?;

        if let Some(path) = engine.state().path() {
            info!("State saved to {}", path.display());
        }
        result
    }

    /// One message per line, or indented with `--format pretty`
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
