use crate::model::output::{AsnRow, HouseRow};
use std::cmp::Reverse;
use tracing::debug;

fn join_sorted_descending(header: String, mut rows: Vec<(usize, String)>) -> String {
    rows.sort_by_key(|(sort_key, line)| Reverse((*sort_key, line.clone())));

    let mut buffer = header;
    buffer.push('\n');

    for (_, line) in rows {
        buffer.push_str(&line);
        buffer.push('\n');
    }

    buffer
}

/// `TLDs|ccTLDs|gTLDs|revMap|Cover|House`, largest houses first. Houses
/// without any route origin are left out.
pub fn format_house_table(rows: &[HouseRow]) -> String {
    let header = format!(
        "{:6}|{:6}|{:6}|{:6}|{:6}|{:6}",
        "TLDs", "ccTLDs", "gTLDs", "revMap", "Cover", "House"
    );

    let lines = rows
        .iter()
        .filter_map(|row| {
            let Some(pct) = row.percentage.value() else {
                debug!("No routes for house {}", row.short_name);
                return None;
            };

            Some((
                row.top_level_count,
                format!(
                    "{:6}|{:6}|{:6}|{:6}|{:5.1}%|{}",
                    row.top_level_count, row.cc_tld_count, row.g_tld_count, row.rev_map_count, pct, row.short_name
                ),
            ))
        })
        .collect();

    join_sorted_descending(header, lines)
}

pub fn format_house_detailed_table(rows: &[HouseRow]) -> String {
    let header = format!(
        "{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}",
        "TLDs", "ccTLDs", "gTLDs", "revMap", "Zones", "NSRR", "AddrRR", "RteOri", "ROAs", "Cover", "House"
    );

    let lines = rows
        .iter()
        .filter_map(|row| {
            let pct = row.percentage.value()?;

            Some((
                row.top_level_count,
                format!(
                    "{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:6}|{:5.1}%|{}",
                    row.top_level_count,
                    row.cc_tld_count,
                    row.g_tld_count,
                    row.rev_map_count,
                    row.zone_count,
                    row.nameserver_count,
                    row.address_count,
                    row.total,
                    row.with_roa,
                    pct,
                    row.short_name
                ),
            ))
        })
        .collect();

    join_sorted_descending(header, lines)
}

/// `AutNum|TLDs|Prefix|Addr|Cover|Operator`, AS numbers serving the most
/// top-level zones first.
pub fn format_asn_table(rows: &[AsnRow]) -> String {
    let header = format!(
        "{:7}|{:7}|{:7}|{:7}|{:7}|{}",
        "AutNum", "TLDs", "Prefix", "Addr", "Cover", "Operator"
    );

    let lines = rows
        .iter()
        .filter_map(|row| {
            let pct = row.percentage.value()?;

            Some((
                row.top_level_count,
                format!(
                    "{:7}|{:7}|{:7}|{:7}|{:6.1}%|{}",
                    row.asn, row.top_level_count, row.total, row.address_count, pct, row.operator
                ),
            ))
        })
        .collect();

    join_sorted_descending(header, lines)
}
