use crate::asn::build_as_infos_parallel;
use crate::formatter::table::format_asn_table;
use crate::io::write_result;
use crate::model::census::Census;
use crate::report::{asn_rows, wrap};
use crate::task::{update_cache, Task};
use crate::AppState;
use tracing::info;

pub struct AsnReportTask {
    app_state: AppState,
}

impl AsnReportTask {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl Task for AsnReportTask {
    fn name(&self) -> &str {
        "Origin AS Report"
    }

    fn run(&self, census: &Census) -> anyhow::Result<()> {
        let state = &self.app_state;

        let infos = build_as_infos_parallel(census, state.config.workers());
        let rows = asn_rows(&infos);

        info!("Built {} AS rows.", rows.len());

        let table_content = format_asn_table(&rows);
        let json_content = serde_json::to_string_pretty(&wrap(census, rows))?;

        write_result(&state.config, census.date, "ASN-roas.txt", &table_content)?;
        write_result(&state.config, census.date, "ASN-roas.json", &json_content)?;

        update_cache(&state.asn_data, |data| {
            data.json_content = json_content;
            data.table_content = table_content;
        })
    }
}
