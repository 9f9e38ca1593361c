use crate::model::prefix::{family_of, AddressFamily};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::EnumString)]
#[serde(from = "String", into = "String")]
pub enum ZoneCategory {
    #[strum(serialize = "ccTLD")]
    CcTld,
    #[strum(serialize = "gTLD")]
    GTld,
    #[strum(serialize = "revMap")]
    RevMap,
    #[strum(serialize = "sub-ccTLD")]
    SubCcTld,
    #[strum(serialize = "sub-gTLD")]
    SubGTld,
    #[strum(serialize = "sub-revMap")]
    SubRevMap,
    #[strum(serialize = "arpa")]
    Arpa,
    #[strum(serialize = "enum")]
    Enum,
    #[strum(serialize = "IETFSpecialUse")]
    IetfSpecialUse,
    #[strum(serialize = "sub-enum")]
    SubEnum,
    #[strum(serialize = "tTLD")]
    TTld,
    #[strum(default)]
    Other(String),
}

impl ZoneCategory {
    pub const TOP_LEVEL: [ZoneCategory; 3] = [ZoneCategory::CcTld, ZoneCategory::GTld, ZoneCategory::RevMap];

    pub fn as_str(&self) -> &str {
        match self {
            ZoneCategory::CcTld => "ccTLD",
            ZoneCategory::GTld => "gTLD",
            ZoneCategory::RevMap => "revMap",
            ZoneCategory::SubCcTld => "sub-ccTLD",
            ZoneCategory::SubGTld => "sub-gTLD",
            ZoneCategory::SubRevMap => "sub-revMap",
            ZoneCategory::Arpa => "arpa",
            ZoneCategory::Enum => "enum",
            ZoneCategory::IetfSpecialUse => "IETFSpecialUse",
            ZoneCategory::SubEnum => "sub-enum",
            ZoneCategory::TTld => "tTLD",
            ZoneCategory::Other(name) => name,
        }
    }

    /// ccTLD, gTLD and revMap zones.
    pub fn is_top_level(&self) -> bool {
        ZoneCategory::TOP_LEVEL.contains(self)
    }

    pub fn is_clusterable(&self) -> bool {
        !matches!(
            self,
            ZoneCategory::Arpa
                | ZoneCategory::Enum
                | ZoneCategory::IetfSpecialUse
                | ZoneCategory::SubEnum
                | ZoneCategory::TTld
        )
    }
}

impl From<String> for ZoneCategory {
    fn from(value: String) -> Self {
        ZoneCategory::from_str(&value).unwrap_or(ZoneCategory::Other(value))
    }
}

impl From<ZoneCategory> for String {
    fn from(value: ZoneCategory) -> Self {
        value.as_str().to_string()
    }
}

impl Display for ZoneCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const ACTIVE_STATUS: &str = "ACTIVE";

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub category: ZoneCategory,
    #[serde(default)]
    pub status: String,
    /// SOA RNAME of the zone.
    #[serde(rename = "RNAME-field", default)]
    pub rname: String,
    /// Technical contact organisation as recorded by the registry.
    #[serde(rename = "IANA-registry-tech", default)]
    pub tech_operator: Option<String>,
    #[serde(rename = "authnameservers", default)]
    pub nameservers: Vec<String>,
}

impl Zone {
    pub fn new(category: ZoneCategory, rname: &str, tech_operator: Option<&str>) -> Self {
        Zone {
            category,
            status: ACTIVE_STATUS.to_string(),
            rname: rname.to_string(),
            tech_operator: tech_operator.map(str::to_string),
            nameservers: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }

    pub fn registrant(&self) -> String {
        self.rname.to_lowercase()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Nameserver {
    #[serde(rename = "authaddresses", default)]
    pub addresses: Vec<String>,
    #[serde(rename = "usedbyzonesinauthority", default)]
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteOrigination {
    #[serde(rename = "Route-Origin-Prefix")]
    pub prefix: String,
    #[serde(rename = "Route-Origin-AutNum", default)]
    pub asn: Option<u32>,
    #[serde(rename = "Route-Origin-AutNumName", default)]
    pub operator: Option<String>,
    #[serde(rename = "Route-Origin-HasROA", default)]
    pub has_roa: bool,
}

impl RouteOrigination {
    /// Two originations with the same prefix and AS number are one event.
    pub fn key(&self) -> (&str, Option<u32>) {
        (&self.prefix, self.asn)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    #[serde(rename = "Route-Originations", default)]
    pub route_originations: Vec<RouteOrigination>,
    #[serde(rename = "Used-in-authoritative-set", default)]
    pub nameservers: Vec<String>,
    #[serde(skip)]
    pub family: Option<AddressFamily>,
}

#[derive(Debug, Deserialize)]
pub struct ZonesDocument {
    #[serde(rename = "Mapping-Work-Started")]
    pub mapping_work_started: String,
    #[serde(rename = "CoreZones")]
    pub zones: BTreeMap<String, Zone>,
}

#[derive(Debug, Deserialize)]
pub struct NameserversDocument {
    #[serde(rename = "CoreNameservers")]
    pub nameservers: BTreeMap<String, Nameserver>,
}

#[derive(Debug, Deserialize)]
pub struct AddressesDocument {
    #[serde(rename = "CoreAddresses")]
    pub addresses: BTreeMap<String, Address>,
}

/// One immutable census snapshot. Collections are keyed by identifier and
/// iterate in ascending identifier order.
#[derive(Debug, Clone)]
pub struct Census {
    pub date: NaiveDate,
    pub zones: BTreeMap<String, Zone>,
    pub nameservers: BTreeMap<String, Nameserver>,
    pub addresses: BTreeMap<String, Address>,
}

impl Census {
    pub fn new(
        date: NaiveDate,
        zones: BTreeMap<String, Zone>,
        nameservers: BTreeMap<String, Nameserver>,
        mut addresses: BTreeMap<String, Address>,
    ) -> Self {
        for (id, address) in addresses.iter_mut() {
            address.family = family_of(id);
        }

        Census {
            date,
            zones,
            nameservers,
            addresses,
        }
    }

    pub fn from_documents(
        zones: ZonesDocument,
        nameservers: NameserversDocument,
        addresses: AddressesDocument,
    ) -> anyhow::Result<Self> {
        let date = parse_snapshot_date(&zones.mapping_work_started)?;

        Ok(Census::new(date, zones.zones, nameservers.nameservers, addresses.addresses))
    }
}

// "2020-06-01T00:00:05Z" -> 2020-06-01
pub fn parse_snapshot_date(started: &str) -> anyhow::Result<NaiveDate> {
    let date_part = started
        .get(..10)
        .with_context(|| format!("Snapshot timestamp {:?} is too short", started))?;

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .with_context(|| format!("Invalid snapshot date {:?}", date_part))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Builds small census graphs for tests, keeping back-references consistent.
    pub(crate) struct CensusBuilder {
        zones: BTreeMap<String, Zone>,
        nameservers: BTreeMap<String, Nameserver>,
        addresses: BTreeMap<String, Address>,
    }

    impl CensusBuilder {
        pub(crate) fn new() -> Self {
            CensusBuilder {
                zones: BTreeMap::new(),
                nameservers: BTreeMap::new(),
                addresses: BTreeMap::new(),
            }
        }

        pub(crate) fn zone(mut self, name: &str, category: ZoneCategory, rname: &str, tech: Option<&str>) -> Self {
            self.zones.insert(name.to_string(), Zone::new(category, rname, tech));
            self
        }

        pub(crate) fn serve(mut self, zone: &str, nameserver: &str, addresses: &[&str]) -> Self {
            if let Some(z) = self.zones.get_mut(zone) {
                z.nameservers.push(nameserver.to_string());
            }

            let ns = self.nameservers.entry(nameserver.to_string()).or_default();
            ns.zones.push(zone.to_string());

            for &address in addresses {
                if !ns.addresses.iter().any(|a| a == address) {
                    ns.addresses.push(address.to_string());
                }

                let addr = self.addresses.entry(address.to_string()).or_default();
                if !addr.nameservers.iter().any(|n| n == nameserver) {
                    addr.nameservers.push(nameserver.to_string());
                }
            }

            self
        }

        pub(crate) fn route(mut self, address: &str, prefix: &str, asn: Option<u32>, operator: &str, has_roa: bool) -> Self {
            self.addresses
                .entry(address.to_string())
                .or_default()
                .route_originations
                .push(RouteOrigination {
                    prefix: prefix.to_string(),
                    asn,
                    operator: Some(operator.to_string()),
                    has_roa,
                });
            self
        }

        pub(crate) fn build(self) -> Census {
            let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
            Census::new(date, self.zones, self.nameservers, self.addresses)
        }
    }
}
