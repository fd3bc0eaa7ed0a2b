//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{build_confluence_client, load_config, validate_connector_configuration, ConnectorConfig};
use crate::confluence::ConfluenceClient;
use crate::error::{Error, Result, ResultExt};
use crate::types::RecordStream;
use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Check => self.check(&config).await,
            Commands::Cql {
                query,
                expand,
                limit,
                all_expansions,
            } => {
                let client = self.client(&config).await?;
                let records = if *all_expansions {
                    client.cql_paginate_all_expansions(query, expand.as_deref(), *limit)
                } else {
                    client.paginated_cql_retrieval(query, expand.as_deref(), *limit)
                };
                self.emit_records(records).await
            }
            Commands::Users { expand, limit } => {
                let client = self.client(&config).await?;
                self.emit_records(client.paginated_user_retrieval(expand.as_deref(), *limit))
                    .await
            }
            Commands::Groups { limit } => {
                let client = self.client(&config).await?;
                self.emit_records(client.paginated_groups(*limit)).await
            }
            Commands::GroupsByUser { user_id, limit } => {
                let client = self.client(&config).await?;
                self.emit_records(client.paginated_groups_by_user(user_id, *limit))
                    .await
            }
            Commands::Members { group, limit } => {
                let client = self.client(&config).await?;
                self.emit_records(client.paginated_group_members(group, *limit)?)
                    .await
            }
            Commands::SpacePermissions { space_key } => {
                let client = self.client(&config).await?;
                let permissions = client.get_all_space_permissions_server(space_key).await?;
                self.emit_records(stream::iter(permissions.into_iter().map(Ok)).boxed())
                    .await
            }
            Commands::Whoami { expand } => {
                let client = self.client(&config).await?;
                let user = client.get_current_user(expand.as_deref()).await?;
                self.emit_records(stream::iter(vec![Ok(user)]).boxed())
                    .await
            }
        }
    }

    /// Load connector configuration; inline JSON takes precedence
    fn load_config(&self) -> Result<ConnectorConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return ConnectorConfig::from_json_str(json_str);
        }

        match &self.cli.config {
            Some(path) => load_config(path),
            None => Err(Error::config(
                "Connector configuration not specified (use --config or --config-json)",
            )),
        }
    }

    async fn client(&self, config: &ConnectorConfig) -> Result<ConfluenceClient> {
        self.output_log(
            "INFO",
            &format!("Connecting to {} ({})", config.base_url(), config.deployment()),
        );
        build_confluence_client(config).await
    }

    /// Check connection
    async fn check(&self, config: &ConnectorConfig) -> Result<()> {
        self.output_log(
            "INFO",
            &format!("Checking connection to {}", config.base_url()),
        );

        match validate_connector_configuration(config).await {
            Ok(()) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful"
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
            }
        }

        Ok(())
    }

    /// Drain a record stream to stdout, honouring `--max-records`
    async fn emit_records<T: Serialize>(&self, mut records: RecordStream<T>) -> Result<()> {
        let stream_name = self.cli.command.stream_name();
        let started = Instant::now();
        let mut count = 0usize;

        while let Some(record) = records.try_next().await? {
            let data = serde_json::to_value(&record)
                .with_context(|| format!("Failed to serialize {stream_name} record"))?;
            self.output_message(&json!({
                "type": "RECORD",
                "record": {
                    "stream": stream_name,
                    "data": data,
                    "emitted_at": chrono::Utc::now().timestamp_millis()
                }
            }));
            count += 1;
            if self.cli.max_records.is_some_and(|max| count >= max) {
                break;
            }
        }

        self.output_log(
            "INFO",
            &format!(
                "Emitted {count} {stream_name} records in {:.2}s",
                started.elapsed().as_secs_f64()
            ),
        );
        Ok(())
    }

    fn output_log(&self, level: &str, message: &str) {
        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": level,
                "message": message
            }
        }));
    }

    /// Output a message
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
