use crate::model::census::{Address, Census, Zone, ZoneCategory};
use crate::model::output::Percentage;
use crate::model::prefix::AddressFamily;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Predicates selecting the part of the census graph to measure. `None`
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub address_families: Option<BTreeSet<AddressFamily>>,
    pub categories: Option<BTreeSet<ZoneCategory>>,
    pub zones: Option<BTreeSet<String>>,
    /// Lower-cased RNAME values.
    pub registrants: Option<BTreeSet<String>>,
}

impl FilterSpec {
    pub fn all() -> Self {
        FilterSpec::default()
    }

    pub fn with_families(mut self, families: impl IntoIterator<Item = AddressFamily>) -> Self {
        self.address_families = Some(families.into_iter().collect());
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = ZoneCategory>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    pub fn with_zones(mut self, zones: impl IntoIterator<Item = String>) -> Self {
        self.zones = Some(zones.into_iter().collect());
        self
    }

    pub fn with_registrants<S: AsRef<str>>(mut self, registrants: impl IntoIterator<Item = S>) -> Self {
        self.registrants = Some(registrants.into_iter().map(|r| r.as_ref().to_lowercase()).collect());
        self
    }

    fn accepts_zone(&self, name: &str, zone: &Zone) -> bool {
        if let Some(zones) = &self.zones
            && !zones.contains(name)
        {
            return false;
        }

        if let Some(categories) = &self.categories
            && !categories.contains(&zone.category)
        {
            return false;
        }

        if let Some(registrants) = &self.registrants
            && !registrants.contains(&zone.registrant())
        {
            return false;
        }

        true
    }

    fn accepts_address(&self, address: &Address) -> bool {
        match (&self.address_families, address.family) {
            (None, _) => true,
            (Some(families), Some(family)) => families.contains(&family),
            (Some(_), None) => false,
        }
    }
}

/// Deduplicated coverage counts for one filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    pub with_roa: usize,
    pub without_roa: usize,
    pub zones: usize,
    pub top_level_zones: usize,
    pub nameservers: usize,
    pub addresses: usize,
    pub zone_percentages: Vec<u8>,
    pub top_level_percentages: Vec<u8>,
}

impl Coverage {
    pub fn route_origins(&self) -> usize {
        self.with_roa + self.without_roa
    }

    pub fn percentage(&self) -> Percentage {
        Percentage::of(self.with_roa, self.route_origins())
    }
}

type RouteKey<'a> = (&'a str, Option<u32>);

/// ROA state per route origin. An origin seen twice with different flags
/// keeps the flag observed last.
#[derive(Default)]
struct RoaStates<'a>(HashMap<RouteKey<'a>, bool>);

impl<'a> RoaStates<'a> {
    fn observe(&mut self, key: RouteKey<'a>, has_roa: bool) {
        self.0.insert(key, has_roa);
    }

    fn with_roa(&self) -> usize {
        self.0.values().filter(|&&has_roa| has_roa).count()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Walks zone -> nameserver -> address -> route origination in ascending zone
/// order. A zone is counted once at least one of its addresses passes the
/// filter. Dangling identifiers are skipped.
pub fn measure_coverage(census: &Census, filter: &FilterSpec) -> Coverage {
    let zones: Box<dyn Iterator<Item = (&String, &Zone)> + '_> = match &filter.zones {
        Some(wanted) => Box::new(wanted.iter().filter_map(|name| census.zones.get_key_value(name))),
        None => Box::new(census.zones.iter()),
    };

    let mut zone_set: HashSet<&str> = HashSet::new();
    let mut top_level_set: HashSet<&str> = HashSet::new();
    let mut nameserver_set: HashSet<&str> = HashSet::new();
    let mut address_set: HashSet<&str> = HashSet::new();
    let mut routes = RoaStates::default();

    let mut coverage = Coverage::default();

    for (name, zone) in zones {
        if !filter.accepts_zone(name, zone) {
            continue;
        }

        let mut zone_routes = RoaStates::default();

        for ns_name in &zone.nameservers {
            let Some(nameserver) = census.nameservers.get(ns_name) else {
                continue;
            };

            for address_name in &nameserver.addresses {
                let Some(address) = census.addresses.get(address_name) else {
                    continue;
                };

                if !filter.accepts_address(address) {
                    continue;
                }

                zone_set.insert(name);
                if zone.category.is_top_level() {
                    top_level_set.insert(name);
                }
                nameserver_set.insert(ns_name);
                address_set.insert(address_name);

                for origination in &address.route_originations {
                    routes.observe(origination.key(), origination.has_roa);
                    zone_routes.observe(origination.key(), origination.has_roa);
                }
            }
        }

        let total = zone_routes.len();

        if total > 0 {
            let pct = (100 * zone_routes.with_roa() / total) as u8;

            coverage.zone_percentages.push(pct);
            if zone.category.is_top_level() {
                coverage.top_level_percentages.push(pct);
            }
        }
    }

    coverage.with_roa = routes.with_roa();
    coverage.without_roa = routes.len() - coverage.with_roa;
    coverage.zones = zone_set.len();
    coverage.top_level_zones = top_level_set.len();
    coverage.nameservers = nameserver_set.len();
    coverage.addresses = address_set.len();

    coverage
}

/// Evaluates independent filters on up to `workers` threads. Results are in
/// filter order.
pub fn measure_coverage_batch(census: &Census, filters: &[FilterSpec], workers: usize) -> Vec<Coverage> {
    if filters.is_empty() {
        return Vec::new();
    }

    let chunk_size = filters.len().div_ceil(workers.max(1));

    std::thread::scope(|scope| {
        let handles: Vec<_> = filters
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|filter| measure_coverage(census, filter))
                        .collect::<Vec<Coverage>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}
