use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
pub enum AddressFamily {
    #[strum(serialize = "IPv4")]
    #[serde(rename = "IPv4")]
    V4,
    #[strum(serialize = "IPv6")]
    #[serde(rename = "IPv6")]
    V6,
}

impl From<&IpAddr> for AddressFamily {
    fn from(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

/// An address literal as it appears in the census, either a bare address or
/// `network/len`. A bare address is a host prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    pub network: IpAddr,
    pub prefix_len: u8,
}

impl Prefix {
    pub fn new(network: IpAddr, prefix_len: u8) -> Result<Self, String> {
        let max_len = Self::max_len(&network);

        if prefix_len > max_len {
            return Err(format!("Prefix length {} exceeds {} for {}", prefix_len, max_len, network));
        }

        Ok(Prefix { network, prefix_len })
    }

    fn max_len(network: &IpAddr) -> u8 {
        match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::from(&self.network)
    }
}

impl FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (address_part, len_part) = match s.split_once('/') {
            Some((address, len)) => (address, Some(len)),
            None => (s, None),
        };

        let network = address_part
            .parse::<IpAddr>()
            .map_err(|e| format!("Invalid IP address {:?}: {}", address_part, e))?;

        let prefix_len = match len_part {
            Some(len) => len
                .parse::<u8>()
                .map_err(|e| format!("Invalid prefix length {:?}: {}", len, e))?,
            None => Self::max_len(&network),
        };

        Prefix::new(network, prefix_len)
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Family of a census address identifier, `None` when the literal does not parse.
pub fn family_of(address: &str) -> Option<AddressFamily> {
    Prefix::from_str(address).ok().map(|p| p.family())
}
