use crate::cluster::build_houses;
use crate::fingerprint::resolve_zone_colors;
use crate::formatter::table::{format_house_detailed_table, format_house_table};
use crate::io::write_result;
use crate::model::census::Census;
use crate::report::{house_rows, wrap};
use crate::task::{update_cache, Task};
use crate::AppState;
use tracing::info;

pub struct HouseReportTask {
    app_state: AppState,
}

impl HouseReportTask {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl Task for HouseReportTask {
    fn name(&self) -> &str {
        "DNS Houses"
    }

    fn run(&self, census: &Census) -> anyhow::Result<()> {
        let state = &self.app_state;

        let colors = resolve_zone_colors(&census.zones);
        let houses = build_houses(&colors, state.config.cluster_strategy);

        let rows = house_rows(census, &houses, state.config.workers());
        let without_routes = rows.iter().filter(|row| !row.percentage.is_defined()).count();

        info!(
            "Built {} houses from {} zones, {} without route origins.",
            rows.len(),
            colors.len(),
            without_routes
        );

        let table_content = format_house_table(&rows);
        let detailed_table_content = format_house_detailed_table(&rows);
        let json_content = serde_json::to_string_pretty(&wrap(census, rows))?;

        write_result(&state.config, census.date, "DNShouse-roas.txt", &table_content)?;
        write_result(&state.config, census.date, "DNShouse-Detailed-roas.txt", &detailed_table_content)?;
        write_result(&state.config, census.date, "DNShouse-Detailed-roas.json", &json_content)?;

        update_cache(&state.house_data, |data| {
            data.json_content = json_content;
            data.table_content = table_content;
            data.detailed_table_content = detailed_table_content;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::census::testing::CensusBuilder;
    use crate::model::census::ZoneCategory;

    #[test]
    fn test_run_fills_cache() {
        let census = CensusBuilder::new()
            .zone("a.", ZoneCategory::CcTld, "hostmaster.a.", Some("Shared Ops"))
            .zone("b.", ZoneCategory::GTld, "hostmaster.b.", Some("Shared Ops"))
            .zone("quiet.", ZoneCategory::CcTld, "nic.quiet.", None)
            .serve("a.", "ns.shared.", &["192.0.2.1"])
            .serve("b.", "ns.shared.", &["192.0.2.1"])
            .route("192.0.2.1", "192.0.2.0/24", Some(64500), "SHARED-AS", false)
            .build();

        let state = AppState::default();
        HouseReportTask::new(state.clone()).run(&census).unwrap();

        let data = state.house_data.read().unwrap();
        let json: serde_json::Value = serde_json::from_str(&data.json_content).unwrap();

        assert_eq!(json["metadata"]["counts"], 2);

        let table: Vec<&str> = data.table_content.lines().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1], "     2|     1|     1|     0|  0.0%|hostmaster.a./hostmaster.b.");

        assert!(data.detailed_table_content.starts_with("TLDs  |ccTLDs|gTLDs |revMap|Zones "));
    }
}
