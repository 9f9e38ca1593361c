use anyhow::Context;
use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use dns_core_roa_census::io::background_updater;
use dns_core_roa_census::{AppConfig, AppState, ReportCache};
use std::env;
use std::path::Path;
use std::sync::RwLock;
use tracing::{error, info};

const CONFIG_PATH: &str = "config.json";

fn init_default_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let default_config = AppConfig::default();

    let config_json = serde_json::to_string_pretty(&default_config)?;

    std::fs::write(config_path, config_json)
        .with_context(|| format!("Failed to write default configuration to {:?}", config_path))?;

    info!("Wrote default configuration to {:?}", config_path);

    Ok(default_config)
}

fn init_app_state() -> anyhow::Result<AppState> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| CONFIG_PATH.to_string());

    let config_path = Path::new(config_path.as_str());

    let app_config = if config_path.exists() {
        let file = std::fs::File::open(config_path)
            .with_context(|| format!("Failed to open configuration {:?}", config_path))?;

        let config: AppConfig = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        info!("Loaded configuration from {:?}", config_path);

        config
    } else {
        info!("Configuration file {:?} does not exist. Using default configuration.", config_path);

        init_default_config(config_path)?
    };

    Ok(AppState {
        config: std::sync::Arc::new(app_config),
        ..Default::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app_state = init_app_state()?;

    let update_task_app_state = app_state.clone();

    tokio::spawn(async move { background_updater(update_task_app_state).await; });

    let config = &app_state.config;

    let app = Router::new()
        .route(&config.coverage_endpoint, get(get_coverage_json))
        .route(&config.houses_endpoint, get(get_houses_json))
        .route(&config.houses_table_endpoint, get(get_houses_table))
        .route(&config.houses_detailed_table_endpoint, get(get_houses_detailed_table))
        .route(&config.asns_endpoint, get(get_asns_json))
        .route(&config.asns_table_endpoint, get(get_asns_table))
        .with_state(app_state.clone());

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_address))?;

    info!("Listening on: {}", &config.listen_address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn cached_response(
    cache: &RwLock<ReportCache>,
    content_type: &'static str,
    select: impl FnOnce(&ReportCache) -> String,
) -> Response<Body> {
    let data = match cache.read() {
        Ok(data) => data,
        Err(_) => {
            error!("Report cache lock is poisoned");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    ([("Content-Type", content_type)], select(&*data)).into_response()
}

async fn get_coverage_json(State(state): State<AppState>) -> Response<Body> {
    cached_response(&state.coverage_data, "application/json", |data| data.json_content.clone())
}

async fn get_houses_json(State(state): State<AppState>) -> Response<Body> {
    cached_response(&state.house_data, "application/json", |data| data.json_content.clone())
}

async fn get_houses_table(State(state): State<AppState>) -> Response<Body> {
    cached_response(&state.house_data, "text/plain", |data| data.table_content.clone())
}

async fn get_houses_detailed_table(State(state): State<AppState>) -> Response<Body> {
    cached_response(&state.house_data, "text/plain", |data| data.detailed_table_content.clone())
}

async fn get_asns_json(State(state): State<AppState>) -> Response<Body> {
    cached_response(&state.asn_data, "application/json", |data| data.json_content.clone())
}

async fn get_asns_table(State(state): State<AppState>) -> Response<Body> {
    cached_response(&state.asn_data, "text/plain", |data| data.table_content.clone())
}
