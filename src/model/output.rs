use serde::{Serialize, Serializer};

/// A coverage ratio. A zero denominator is `Undefined`, which is a different
/// fact from zero coverage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Percentage {
    Undefined,
    Value(f64),
}

impl Percentage {
    pub fn of(part: usize, total: usize) -> Self {
        if total == 0 {
            Percentage::Undefined
        } else {
            Percentage::Value(100.0 * part as f64 / total as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Percentage::Undefined => None,
            Percentage::Value(v) => Some(*v),
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Percentage::Value(_))
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Percentage::Undefined => serializer.serialize_none(),
            Percentage::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

#[derive(Serialize, Debug, Default, Clone)]
pub struct Metadata {
    #[serde(rename = "buildtime")]
    pub build_time: String,
    #[serde(rename = "snapshotdate")]
    pub snapshot_date: String,
    pub counts: u64,
}

#[derive(Serialize, Debug, Default, Clone)]
pub struct Report<T> {
    pub metadata: Metadata,
    pub rows: Vec<T>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CoverageSummary {
    pub title: String,
    #[serde(rename = "yes")]
    pub with_roa: usize,
    #[serde(rename = "no")]
    pub without_roa: usize,
    #[serde(rename = "routeorigins")]
    pub route_origins: usize,
    #[serde(rename = "pct")]
    pub percentage: Percentage,
    #[serde(rename = "zonecount")]
    pub zones: usize,
    #[serde(rename = "tldcount")]
    pub top_level_zones: usize,
    #[serde(rename = "NScount")]
    pub nameservers: usize,
    #[serde(rename = "ADDRcount")]
    pub addresses: usize,
    #[serde(rename = "zonepcts")]
    pub zone_percentages: Vec<u8>,
    #[serde(rename = "tldpcts")]
    pub top_level_percentages: Vec<u8>,
}

#[derive(Serialize, Debug, Clone)]
pub struct HouseRow {
    pub name: String,
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "yes")]
    pub with_roa: usize,
    #[serde(rename = "no")]
    pub without_roa: usize,
    pub total: usize,
    #[serde(rename = "pct")]
    pub percentage: Percentage,
    #[serde(rename = "zonecount")]
    pub zone_count: usize,
    #[serde(rename = "tldcount")]
    pub top_level_count: usize,
    #[serde(rename = "ccTLDcount")]
    pub cc_tld_count: usize,
    #[serde(rename = "gTLDcount")]
    pub g_tld_count: usize,
    #[serde(rename = "revMapcount")]
    pub rev_map_count: usize,
    #[serde(rename = "NScount")]
    pub nameserver_count: usize,
    #[serde(rename = "ADDRcount")]
    pub address_count: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct AsnRow {
    pub asn: u32,
    #[serde(rename = "autnumoperator")]
    pub operator: String,
    #[serde(rename = "HasROA")]
    pub with_roa: usize,
    #[serde(rename = "HasNoROA")]
    pub without_roa: usize,
    #[serde(rename = "Total")]
    pub total: usize,
    #[serde(rename = "pct")]
    pub percentage: Percentage,
    #[serde(rename = "zonecount")]
    pub zone_count: usize,
    #[serde(rename = "tldcount")]
    pub top_level_count: usize,
    #[serde(rename = "addresscount")]
    pub address_count: usize,
    #[serde(rename = "nameservercount")]
    pub nameserver_count: usize,
}
