pub mod model;
pub mod io;
pub mod task;

pub mod fingerprint;
pub mod cluster;
pub mod coverage;
pub mod asn;
pub mod report;

pub mod formatter;

use crate::cluster::ClusterStrategy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub coverage_data: Arc<RwLock<ReportCache>>,
    pub house_data: Arc<RwLock<ReportCache>>,
    pub asn_data: Arc<RwLock<ReportCache>>,
}

/// A registry whose reverse-map zones are identified by their SOA contact.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegistryContact {
    pub name: String,
    pub rname: String,
}

impl RegistryContact {
    fn new(name: &str, rname: &str) -> Self {
        RegistryContact {
            name: name.to_string(),
            rname: rname.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub listen_address: String,
    pub coverage_endpoint: String,
    pub houses_endpoint: String,
    pub houses_table_endpoint: String,
    pub houses_detailed_table_endpoint: String,
    pub asns_endpoint: String,
    pub asns_table_endpoint: String,

    pub census_directory: String,
    pub zones_file: String,
    pub nameservers_file: String,
    pub addresses_file: String,

    pub write_results: bool,
    pub results_directory: String,

    pub update_interval_seconds: u64,

    pub cluster_strategy: ClusterStrategy,
    pub aggregation_workers: usize,

    pub registries: Vec<RegistryContact>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            listen_address: "0.0.0.0:8080".to_string(),
            coverage_endpoint: "/coverage.json".to_string(),
            houses_endpoint: "/houses.json".to_string(),
            houses_table_endpoint: "/houses.txt".to_string(),
            houses_detailed_table_endpoint: "/houses-detailed.txt".to_string(),
            asns_endpoint: "/asns.json".to_string(),
            asns_table_endpoint: "/asns.txt".to_string(),

            census_directory: "./census".to_string(),
            zones_file: "allzones.json".to_string(),
            nameservers_file: "allnameservers.json".to_string(),
            addresses_file: "alladdresses.json".to_string(),

            write_results: false,
            results_directory: "./results".to_string(),

            update_interval_seconds: 3600,

            cluster_strategy: ClusterStrategy::Greedy,
            aggregation_workers: 4,

            registries: vec![
                RegistryContact::new("AFRINIC", "dns-admin.afrinic.net."),
                RegistryContact::new("APNIC", "read-txt-record-of-zone-first-dns-admin.apnic.net."),
                RegistryContact::new("RIPE", "dns.ripe.net."),
                RegistryContact::new("LACNIC", "hostmaster.lacnic.net."),
                RegistryContact::new("ARIN", "dns-ops.arin.net."),
            ],
        }
    }
}

impl AppConfig {
    pub fn workers(&self) -> usize {
        self.aggregation_workers.max(1)
    }
}

pub struct ReportCache {
    pub json_content: String,
    pub table_content: String,
    pub detailed_table_content: String,
    pub last_updated: std::time::SystemTime,
}

impl Default for ReportCache {
    fn default() -> Self {
        ReportCache {
            json_content: String::new(),
            table_content: String::new(),
            detailed_table_content: String::new(),
            last_updated: std::time::SystemTime::now(),
        }
    }
}
