//! Shopgraph CLI
//!
//! Loads source options from a JSON config file and/or flags, runs the
//! ingestion pipeline against the Storefront API, and prints a
//! per-collection summary of the resulting node graph.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use shopgraph_client::StorefrontClient;
use shopgraph_source::{Source, SourceConfig};
use shopgraph_store::ShopStore;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shopgraph", about = "Ingest a Shopify Storefront catalog into a node graph")]
struct Cli {
    /// JSON config file with source options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store name (becomes https://{name}.myshopify.com)
    #[arg(long)]
    store_name: Option<String>,

    /// Full store URL, overrides --store-name
    #[arg(long)]
    store_url: Option<String>,

    /// Storefront access token; falls back to SHOPIFY_STOREFRONT_TOKEN
    #[arg(long)]
    token: Option<String>,

    /// Entity types to ingest (repeatable); default is all
    #[arg(long = "type")]
    types: Vec<String>,

    /// Nodes per page request
    #[arg(long)]
    per_page: Option<u32>,

    /// Display type-name prefix
    #[arg(long)]
    type_name: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<SourceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => SourceConfig::default(),
        };

        if let Some(name) = self.store_name {
            config.store_name = name;
        }
        if let Some(url) = self.store_url {
            config.store_url = url;
        }
        if let Some(token) = self.token {
            config.storefront_token = token;
        } else if config.storefront_token.is_empty() {
            if let Ok(token) = env::var("SHOPIFY_STOREFRONT_TOKEN") {
                config.storefront_token = token;
            }
        }
        if !self.types.is_empty() {
            config.types = self.types;
        }
        if let Some(per_page) = self.per_page {
            config.per_page = per_page;
        }
        if let Some(type_name) = self.type_name {
            config.type_name = type_name;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_config()?.resolve()?;

    let client = StorefrontClient::new(&config.store_url, &config.storefront_token)?;
    let source = Source::new(config);
    let mut store = ShopStore::new();

    println!(
        "Loading catalog from {}",
        source.config().store_url.bold()
    );
    source.run(&client, &mut store).await?;

    for collection in store.collections() {
        println!(
            "  {} {}",
            format!("{:>6}", collection.len()).green(),
            collection.type_name()
        );
    }
    Ok(())
}
