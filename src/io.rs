use crate::model::census::{AddressesDocument, Census, NameserversDocument, ZonesDocument};
use crate::task::asn::AsnReportTask;
use crate::task::coverage::CoverageSummaryTask;
use crate::task::house::HouseReportTask;
use crate::task::Task;
use crate::{AppConfig, AppState};
use anyhow::Context;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open census file {:?}", path))?;

    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse census file {:?}", path))
}

pub fn load_census(config: &AppConfig) -> anyhow::Result<Census> {
    let directory = Path::new(&config.census_directory);

    let zones: ZonesDocument = read_document(&directory.join(&config.zones_file))?;
    let nameservers: NameserversDocument = read_document(&directory.join(&config.nameservers_file))?;
    let addresses: AddressesDocument = read_document(&directory.join(&config.addresses_file))?;

    let census = Census::from_documents(zones, nameservers, addresses)
        .with_context(|| format!("Invalid census in {:?}", directory))?;

    info!(
        "[CENSUS] Loaded snapshot of {}: {} zones, {} nameservers, {} addresses.",
        census.date,
        census.zones.len(),
        census.nameservers.len(),
        census.addresses.len()
    );

    Ok(census)
}

/// Writes `content` to `<results_directory>/<date>/<file_name>` when result
/// files are enabled.
pub fn write_result(config: &AppConfig, date: NaiveDate, file_name: &str, content: &str) -> anyhow::Result<()> {
    if !config.write_results {
        return Ok(());
    }

    let directory = Path::new(&config.results_directory).join(date.format("%Y-%m-%d").to_string());

    fs::create_dir_all(&directory).with_context(|| format!("Failed to create results directory {:?}", directory))?;

    let path = directory.join(file_name);

    fs::write(&path, content).with_context(|| format!("Failed to write result file {:?}", path))?;

    info!("Wrote {:?}", path);

    Ok(())
}

fn run_update(state: &AppState, tasks: &[Box<dyn Task>]) {
    let census = match load_census(&state.config) {
        Ok(census) => census,
        Err(e) => {
            error!("Error loading census: {:?}", e);
            return;
        }
    };

    for task in tasks {
        info!("Running task: {}", task.name());

        if let Err(e) = task.run(&census) {
            error!("Error running task '{}': {:?}", task.name(), e);
        } else {
            info!("Successfully completed task: {}", task.name());
        }
    }
}

pub async fn background_updater(state: AppState) {
    let update_interval = std::time::Duration::from_secs(state.config.update_interval_seconds);

    let tasks: Arc<Vec<Box<dyn Task>>> = Arc::new(vec![
        Box::new(CoverageSummaryTask::new(state.clone())),
        Box::new(HouseReportTask::new(state.clone())),
        Box::new(AsnReportTask::new(state.clone())),
    ]);

    loop {
        info!("Starting background update of census reports.");

        let update_state = state.clone();
        let update_tasks = tasks.clone();

        if let Err(e) = tokio::task::spawn_blocking(move || run_update(&update_state, &update_tasks)).await {
            error!("Background update did not finish: {:?}", e);
        }

        info!("Waiting for {:?} before next update.", update_interval);

        tokio::time::sleep(update_interval).await;
    }
}
