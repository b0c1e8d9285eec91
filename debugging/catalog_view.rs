//! Load a catalog view through a running gateway and print it as JSON.
//! Usage:
//!   cargo run --bin catalog_view -- <view>            (home, movies, tv, my-list, profile)
//!   cargo run --bin catalog_view -- search <query>
//!   cargo run --bin catalog_view -- details <movie|tv> <tmdb_id>
//!   cargo run --bin catalog_view -- season <tmdb_id> <season_number>
//! Reads GATEWAY_URL (default http://127.0.0.1:3146) and DHAVAFLIX_DATA_DIR (.env supported).

use anyhow::{bail, Context, Result};
use dhavaflix::catalog::Catalog;
use dhavaflix::config::default_timeout;
use dhavaflix::details;
use dhavaflix::fetch::{CatalogSource, GatewayClient};
use dhavaflix::models::MediaKind;
use dhavaflix::store::{FileBackend, PreferenceStore};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;

const DEFAULT_GATEWAY: &str = "http://127.0.0.1:3146";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        bail!("usage: catalog_view <view> | search <query> | details <movie|tv> <id> | season <id> <n>");
    }

    let gateway = env::var("GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY.to_string());
    let data_dir = env::var("DHAVAFLIX_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let source: Arc<dyn CatalogSource> = Arc::new(GatewayClient::new(&gateway, default_timeout())?);
    let store = Arc::new(PreferenceStore::open(FileBackend::new(&data_dir)?));
    let catalog = Catalog::new(source.clone(), store);

    let output = match args[0].as_str() {
        "search" => {
            let query = args[1..].join(" ");
            serde_json::to_value(catalog.search(&query).await)?
        }
        "details" => {
            let kind: MediaKind = args.get(1).context("missing kind")?.parse()?;
            let id: i64 = args.get(2).context("missing id")?.parse().context("invalid id")?;
            serde_json::to_value(catalog.details(kind, id).await)?
        }
        "season" => {
            let id: i64 = args.get(1).context("missing id")?.parse().context("invalid id")?;
            let n: u32 = args.get(2).context("missing season")?.parse().context("invalid season")?;
            serde_json::to_value(details::season(source.as_ref(), id, n).await)?
        }
        view => serde_json::to_value(catalog.load_view(view).await)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
