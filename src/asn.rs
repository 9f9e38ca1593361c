use crate::model::census::{Address, Census, ZoneCategory};
use crate::model::output::Percentage;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Census data attributed to one origin AS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsInfo {
    pub asn: u32,
    /// Operator name of the last origination seen for this AS.
    pub operator: Option<String>,
    pub prefixes_with_roa: BTreeSet<String>,
    pub prefixes_without_roa: BTreeSet<String>,
    pub addresses: BTreeSet<String>,
    pub nameservers: BTreeSet<String>,
    pub zones_by_category: BTreeMap<ZoneCategory, BTreeSet<String>>,
}

impl AsInfo {
    pub fn new(asn: u32) -> Self {
        AsInfo {
            asn,
            operator: None,
            prefixes_with_roa: BTreeSet::new(),
            prefixes_without_roa: BTreeSet::new(),
            addresses: BTreeSet::new(),
            nameservers: BTreeSet::new(),
            zones_by_category: BTreeMap::new(),
        }
    }

    // A prefix is in exactly one of the two sets, the latest observation wins.
    fn record_prefix(&mut self, prefix: &str, has_roa: bool) {
        let (target, other) = if has_roa {
            (&mut self.prefixes_with_roa, &mut self.prefixes_without_roa)
        } else {
            (&mut self.prefixes_without_roa, &mut self.prefixes_with_roa)
        };

        other.remove(prefix);
        target.insert(prefix.to_string());
    }

    /// Folds in the result of a partition walked after this one.
    fn absorb(&mut self, later: AsInfo) {
        for prefix in &later.prefixes_with_roa {
            self.record_prefix(prefix, true);
        }
        for prefix in &later.prefixes_without_roa {
            self.record_prefix(prefix, false);
        }

        self.operator = later.operator;
        self.addresses.extend(later.addresses);
        self.nameservers.extend(later.nameservers);

        for (category, zones) in later.zones_by_category {
            self.zones_by_category.entry(category).or_default().extend(zones);
        }
    }

    pub fn total_prefixes(&self) -> usize {
        self.prefixes_with_roa.len() + self.prefixes_without_roa.len()
    }

    pub fn percentage(&self) -> Percentage {
        Percentage::of(self.prefixes_with_roa.len(), self.total_prefixes())
    }

    pub fn zone_count(&self) -> usize {
        self.zones_by_category.values().map(BTreeSet::len).sum()
    }

    pub fn top_level_count(&self) -> usize {
        self.zones_by_category
            .iter()
            .filter(|(category, _)| category.is_top_level())
            .map(|(_, zones)| zones.len())
            .sum()
    }
}

fn walk_addresses<'a>(census: &Census, addresses: impl Iterator<Item = (&'a String, &'a Address)>) -> BTreeMap<u32, AsInfo> {
    let mut infos: BTreeMap<u32, AsInfo> = BTreeMap::new();

    for (address_name, address) in addresses {
        for origination in &address.route_originations {
            // origin AS unknown to the routing data
            let Some(asn) = origination.asn else {
                continue;
            };

            let info = infos.entry(asn).or_insert_with(|| AsInfo::new(asn));

            info.operator = origination.operator.clone();
            info.record_prefix(&origination.prefix, origination.has_roa);
            info.addresses.insert(address_name.clone());

            for ns_name in &address.nameservers {
                info.nameservers.insert(ns_name.clone());

                let Some(nameserver) = census.nameservers.get(ns_name) else {
                    continue;
                };

                for zone_name in &nameserver.zones {
                    let Some(zone) = census.zones.get(zone_name) else {
                        continue;
                    };

                    info.zones_by_category
                        .entry(zone.category.clone())
                        .or_default()
                        .insert(zone_name.clone());
                }
            }
        }
    }

    infos
}

/// One record per AS number in ascending address order.
pub fn build_as_infos(census: &Census) -> BTreeMap<u32, AsInfo> {
    walk_addresses(census, census.addresses.iter())
}

/// Same result as `build_as_infos`, with the address collection split into
/// `workers` contiguous partitions merged back in order.
pub fn build_as_infos_parallel(census: &Census, workers: usize) -> BTreeMap<u32, AsInfo> {
    let addresses: Vec<(&String, &Address)> = census.addresses.iter().collect();

    if addresses.is_empty() {
        return BTreeMap::new();
    }

    let chunk_size = addresses.len().div_ceil(workers.max(1));

    let partitions: Vec<BTreeMap<u32, AsInfo>> = std::thread::scope(|scope| {
        let handles: Vec<_> = addresses
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || walk_addresses(census, chunk.iter().copied())))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut merged: BTreeMap<u32, AsInfo> = BTreeMap::new();

    for partition in partitions {
        for (asn, info) in partition {
            match merged.get_mut(&asn) {
                Some(existing) => existing.absorb(info),
                None => {
                    merged.insert(asn, info);
                }
            }
        }
    }

    info!(
        "Aggregated {} addresses into {} AS records on {} partitions.",
        addresses.len(),
        merged.len(),
        addresses.len().div_ceil(chunk_size)
    );

    merged
}
