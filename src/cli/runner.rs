//! CLI runner - executes commands

use crate::auth::bearer_credential;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{AppConfig, UpstreamConfig};
use crate::error::{Error, Result};
use crate::graphql::GraphqlClient;
use crate::sources::{parse_date, parse_id_list, PullFilters, PullRequest, Puller, SourceKind};
use crate::warehouse::WarehouseEngine;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

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
        match &self.cli.command {
            Commands::Serve { port } => {
                let mut config = self.load_config()?;
                if let Some(port) = port {
                    config.server.port = *port;
                }
                crate::cli::serve(config).await
            }
            Commands::Pull {
                source,
                start,
                end,
                api_key,
                campaign_ids,
                tracker_ids,
                granularity,
                output,
            } => {
                let request = PullRequest::new(
                    *source,
                    bearer_credential(api_key),
                    parse_date("start", start)?,
                    parse_date("end", end)?,
                )
                .with_filters(PullFilters {
                    campaign_ids: parse_id_list(campaign_ids.as_deref()),
                    tracker_ids: parse_id_list(tracker_ids.as_deref()),
                    granularity: granularity.clone(),
                });
                self.pull(&request, output.as_deref()).await
            }
            Commands::Sources => self.sources(),
            Commands::Validate { check_warehouse } => self.validate(*check_warehouse),
        }
    }

    /// Load the config file named by `--config`
    fn load_config(&self) -> Result<AppConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        AppConfig::from_file(path)
    }

    /// Upstream settings from `--config`, or defaults without one
    fn upstream(&self) -> Result<UpstreamConfig> {
        match &self.cli.config {
            Some(_) => Ok(self.load_config()?.upstream),
            None => Ok(UpstreamConfig::default()),
        }
    }

    /// Pull one source
    async fn pull(&self, request: &PullRequest, output: Option<&Path>) -> Result<()> {
        let upstream = self.upstream()?;
        let client = GraphqlClient::new(upstream.client_config())?;
        let puller = Puller::new(client, upstream.page_size, upstream.retry_policy());

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling pull");
                on_interrupt.cancel();
            }
        });

        let started = Instant::now();
        let result = puller.pull(request, &cancel).await?;
        info!(
            "Pull finished in {:.1}s: {} pages, {} requests, {} retries",
            started.elapsed().as_secs_f64(),
            result.stats.pages,
            result.stats.requests,
            result.stats.retries
        );

        let count = result.records.len();
        let body = json!({
            "#records": count,
            "data": result.records,
        });

        match output {
            Some(path) => {
                fs::write(path, self.render(&body))?;
                info!("Wrote {} records to {}", count, path.display());
            }
            None => println!("{}", self.render(&body)),
        }

        Ok(())
    }

    /// List built-in sources
    fn sources(&self) -> Result<()> {
        let sources: Vec<Value> = SourceKind::all()
            .map(|kind| {
                let def = kind.definition();
                json!({
                    "name": def.name,
                    "route": def.route,
                    "resource": def.resource,
                    "layout": def.layout,
                    "description": def.description,
                })
            })
            .collect();

        println!("{}", self.render(&json!({ "sources": sources })));
        Ok(())
    }

    /// Validate the configuration file
    fn validate(&self, check_warehouse: bool) -> Result<()> {
        let config = self.load_config()?;

        if check_warehouse {
            let warehouse = config
                .warehouse
                .as_ref()
                .ok_or_else(|| Error::config("No warehouse section to check"))?;
            WarehouseEngine::open(warehouse)?.check_connection()?;
        }

        println!(
            "{}",
            self.render(&json!({
                "valid": true,
                "users": config.users.len(),
                "endpoint": config.upstream.endpoint,
                "warehouse": config.warehouse.as_ref().map(|w| w.connection_info()),
            }))
        );
        Ok(())
    }

    fn render(&self, value: &Value) -> String {
        match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value).unwrap_or_default(),
            OutputFormat::Pretty => serde_json::to_string_pretty(value).unwrap_or_default(),
        }
    }
}
