use crate::asn::AsInfo;
use crate::cluster::House;
use crate::coverage::{measure_coverage_batch, Coverage, FilterSpec};
use crate::formatter::house_title::{display_name, short_name};
use crate::model::census::{Census, ZoneCategory};
use crate::model::output::{AsnRow, CoverageSummary, HouseRow, Metadata, Report};
use crate::model::prefix::AddressFamily;
use crate::RegistryContact;
use std::collections::BTreeMap;

const UNSET_OPERATOR: &str = "Unset";

pub fn metadata(census: &Census, counts: usize) -> Metadata {
    Metadata {
        build_time: chrono::Utc::now().to_rfc3339(),
        snapshot_date: census.date.format("%Y-%m-%d").to_string(),
        counts: counts as u64,
    }
}

pub fn wrap<T>(census: &Census, rows: Vec<T>) -> Report<T> {
    Report {
        metadata: metadata(census, rows.len()),
        rows,
    }
}

/// The standard views: the DNS core as a whole, per address family, per
/// category group and per registry contact.
pub fn summary_filters(registries: &[RegistryContact]) -> Vec<(String, FilterSpec)> {
    let mut filters = vec![
        (
            "DNS Core".to_string(),
            FilterSpec::all().with_categories([
                ZoneCategory::CcTld,
                ZoneCategory::GTld,
                ZoneCategory::RevMap,
                ZoneCategory::SubCcTld,
                ZoneCategory::SubGTld,
            ]),
        ),
        ("IPv4".to_string(), FilterSpec::all().with_families([AddressFamily::V4])),
        ("IPv6".to_string(), FilterSpec::all().with_families([AddressFamily::V6])),
        (
            "ccTLD".to_string(),
            FilterSpec::all().with_categories([ZoneCategory::CcTld, ZoneCategory::SubCcTld]),
        ),
        (
            "gTLD".to_string(),
            FilterSpec::all().with_categories([ZoneCategory::GTld, ZoneCategory::SubGTld]),
        ),
        ("reverse map".to_string(), FilterSpec::all().with_categories([ZoneCategory::RevMap])),
    ];

    for registry in registries {
        filters.push((registry.name.clone(), FilterSpec::all().with_registrants([&registry.rname])));
    }

    filters
}

fn summarize(title: String, coverage: Coverage) -> CoverageSummary {
    CoverageSummary {
        title,
        with_roa: coverage.with_roa,
        without_roa: coverage.without_roa,
        route_origins: coverage.route_origins(),
        percentage: coverage.percentage(),
        zones: coverage.zones,
        top_level_zones: coverage.top_level_zones,
        nameservers: coverage.nameservers,
        addresses: coverage.addresses,
        zone_percentages: coverage.zone_percentages,
        top_level_percentages: coverage.top_level_percentages,
    }
}

pub fn coverage_summaries(census: &Census, registries: &[RegistryContact], workers: usize) -> Vec<CoverageSummary> {
    let (titles, filters): (Vec<String>, Vec<FilterSpec>) = summary_filters(registries).into_iter().unzip();

    let results = measure_coverage_batch(census, &filters, workers);

    titles
        .into_iter()
        .zip(results)
        .map(|(title, coverage)| summarize(title, coverage))
        .collect()
}

/// One row per house, measured over exactly the house's zones.
pub fn house_rows(census: &Census, houses: &[House], workers: usize) -> Vec<HouseRow> {
    let filters: Vec<FilterSpec> = houses
        .iter()
        .map(|house| FilterSpec::all().with_zones(house.zones()))
        .collect();

    let results = measure_coverage_batch(census, &filters, workers);

    houses
        .iter()
        .zip(results)
        .map(|(house, coverage)| HouseRow {
            name: display_name(house),
            short_name: short_name(house),
            with_roa: coverage.with_roa,
            without_roa: coverage.without_roa,
            total: coverage.route_origins(),
            percentage: coverage.percentage(),
            zone_count: house.zone_count(),
            top_level_count: house.top_level_zones().len(),
            cc_tld_count: house.count(&ZoneCategory::CcTld),
            g_tld_count: house.count(&ZoneCategory::GTld),
            rev_map_count: house.count(&ZoneCategory::RevMap),
            nameserver_count: coverage.nameservers,
            address_count: coverage.addresses,
        })
        .collect()
}

pub fn asn_rows(infos: &BTreeMap<u32, AsInfo>) -> Vec<AsnRow> {
    infos
        .values()
        .map(|info| AsnRow {
            asn: info.asn,
            operator: info.operator.clone().unwrap_or_else(|| UNSET_OPERATOR.to_string()),
            with_roa: info.prefixes_with_roa.len(),
            without_roa: info.prefixes_without_roa.len(),
            total: info.total_prefixes(),
            percentage: info.percentage(),
            zone_count: info.zone_count(),
            top_level_count: info.top_level_count(),
            address_count: info.addresses.len(),
            nameserver_count: info.nameservers.len(),
        })
        .collect()
}
