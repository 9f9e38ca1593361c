use crate::io::write_result;
use crate::model::census::Census;
use crate::report::{coverage_summaries, wrap};
use crate::task::{update_cache, Task};
use crate::AppState;
use tracing::info;

pub struct CoverageSummaryTask {
    app_state: AppState,
}

impl CoverageSummaryTask {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl Task for CoverageSummaryTask {
    fn name(&self) -> &str {
        "Coverage Summaries"
    }

    fn run(&self, census: &Census) -> anyhow::Result<()> {
        let state = &self.app_state;

        let summaries = coverage_summaries(census, &state.config.registries, state.config.workers());

        for summary in &summaries {
            info!(
                "[{}] {} of {} route origins covered, {} zones",
                summary.title, summary.with_roa, summary.route_origins, summary.zones
            );
        }

        let json_content = serde_json::to_string_pretty(&wrap(census, summaries))?;

        write_result(&state.config, census.date, "coverage.json", &json_content)?;

        update_cache(&state.coverage_data, |data| {
            data.json_content = json_content;
        })
    }
}
