use crate::model::census::{Zone, ZoneCategory};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::{debug, info};

pub const RNAME_NOT_AVAILABLE: &str = "rnamenotavailable";

const UNSET_OPERATOR: &str = "UNSET";

/// Smooths over spelling variants of registry technical-operator names.
pub fn normalize(raw: &str) -> String {
    raw.replace('-', "").replace("  ", " ").replace(',', "").to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatorToken {
    /// No technical operator recorded. Never matched as a real token.
    Unset,
    Named(String),
}

impl OperatorToken {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(normalize) {
            Some(token) if !token.trim().is_empty() && token != UNSET_OPERATOR => OperatorToken::Named(token),
            _ => OperatorToken::Unset,
        }
    }
}

/// One identity signal of a house title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentityToken {
    Registrant(String),
    Operator(String),
}

impl IdentityToken {
    pub fn as_str(&self) -> &str {
        match self {
            IdentityToken::Registrant(s) | IdentityToken::Operator(s) => s,
        }
    }
}

impl Display for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub registrant: String,
    pub operator: OperatorToken,
}

/// `None` when the zone does not take part in clustering.
pub fn resolve_fingerprint(zone: &Zone) -> Option<Fingerprint> {
    if !zone.category.is_clusterable() || !zone.is_active() {
        return None;
    }

    let registrant = zone.registrant();

    if registrant == RNAME_NOT_AVAILABLE {
        return None;
    }

    Some(Fingerprint {
        registrant,
        operator: OperatorToken::from_raw(zone.tech_operator.as_deref()),
    })
}

/// A zone's fingerprint after bridge correction, with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneColor {
    pub zone: String,
    pub registrant: String,
    pub operator: OperatorToken,
    pub category: ZoneCategory,
}

impl ZoneColor {
    pub fn identity_tokens(&self) -> Vec<IdentityToken> {
        let mut tokens = vec![IdentityToken::Registrant(self.registrant.clone())];

        if let OperatorToken::Named(operator) = &self.operator {
            tokens.push(IdentityToken::Operator(operator.clone()));
        }

        tokens
    }
}

#[derive(Debug, Default)]
struct BridgeIndex {
    operators_by_registrant: BTreeMap<String, BTreeSet<String>>,
    registrants_by_operator: BTreeMap<String, BTreeSet<String>>,
    zones_by_pair: BTreeMap<(String, String), BTreeSet<String>>,
}

impl BridgeIndex {
    fn observe(&mut self, zone: &str, fingerprint: &Fingerprint) {
        let operators = self
            .operators_by_registrant
            .entry(fingerprint.registrant.clone())
            .or_default();

        if let OperatorToken::Named(operator) = &fingerprint.operator {
            operators.insert(operator.clone());

            self.registrants_by_operator
                .entry(operator.clone())
                .or_default()
                .insert(fingerprint.registrant.clone());

            self.zones_by_pair
                .entry((fingerprint.registrant.clone(), operator.clone()))
                .or_default()
                .insert(zone.to_string());
        }
    }

    /// The operator a bridge zone is reassigned to. A bridge is the only zone
    /// with its (registrant, operator) pair while both the registrant and the
    /// operator are seen with other partners. The replacement is the smallest
    /// of the registrant's other operators.
    fn correction(&self, fingerprint: &Fingerprint) -> Option<&str> {
        let OperatorToken::Named(operator) = &fingerprint.operator else {
            return None;
        };

        let pair_zones = self
            .zones_by_pair
            .get(&(fingerprint.registrant.clone(), operator.clone()))?;
        let registrants = self.registrants_by_operator.get(operator)?;
        let operators = self.operators_by_registrant.get(&fingerprint.registrant)?;

        if pair_zones.len() == 1 && registrants.len() > 1 && operators.len() > 1 {
            operators
                .iter()
                .find(|candidate| *candidate != operator)
                .map(String::as_str)
        } else {
            None
        }
    }
}

/// Resolves the zone colors of every clusterable zone, in ascending zone
/// identifier order.
pub fn resolve_zone_colors(zones: &BTreeMap<String, Zone>) -> Vec<ZoneColor> {
    let mut index = BridgeIndex::default();
    let mut resolved = Vec::with_capacity(zones.len());

    for (name, zone) in zones {
        if let Some(fingerprint) = resolve_fingerprint(zone) {
            index.observe(name, &fingerprint);
            resolved.push((name, zone, fingerprint));
        }
    }

    let mut bridges = 0;

    let colors: Vec<ZoneColor> = resolved
        .into_iter()
        .map(|(name, zone, fingerprint)| {
            let operator = match index.correction(&fingerprint) {
                Some(replacement) => {
                    debug!(
                        "Bridge zone {}: operator {:?} replaced by {:?} for registrant {}",
                        name, fingerprint.operator, replacement, fingerprint.registrant
                    );
                    bridges += 1;
                    OperatorToken::Named(replacement.to_string())
                }
                None => fingerprint.operator,
            };

            ZoneColor {
                zone: name.clone(),
                registrant: fingerprint.registrant,
                operator,
                category: zone.category.clone(),
            }
        })
        .collect();

    info!(
        "Resolved {} zone colors from {} zones ({} bridge corrections).",
        colors.len(),
        zones.len(),
        bridges
    );

    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(entries: &[(&str, &str, Option<&str>)]) -> BTreeMap<String, Zone> {
        entries
            .iter()
            .map(|(name, rname, tech)| (name.to_string(), Zone::new(ZoneCategory::CcTld, rname, *tech)))
            .collect()
    }

    fn color_of<'a>(colors: &'a [ZoneColor], zone: &str) -> &'a ZoneColor {
        colors.iter().find(|c| c.zone == zone).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Neu-Star, Inc."), "NEUSTAR INC.");
        assert_eq!(normalize("Afilias  Limited"), "AFILIAS LIMITED");
        assert_eq!(normalize("already NORMAL"), "ALREADY NORMAL");
    }

    #[test]
    fn test_unset_operator_is_distinguished() {
        assert_eq!(OperatorToken::from_raw(None), OperatorToken::Unset);
        assert_eq!(OperatorToken::from_raw(Some("UNSET")), OperatorToken::Unset);
        assert_eq!(OperatorToken::from_raw(Some("un-set")), OperatorToken::Unset);
        assert_eq!(OperatorToken::from_raw(Some("  ")), OperatorToken::Unset);
        assert_eq!(
            OperatorToken::from_raw(Some("Verisign")),
            OperatorToken::Named("VERISIGN".to_string())
        );
    }

    #[test]
    fn test_excluded_zones() {
        let mut inactive = Zone::new(ZoneCategory::GTld, "a.example.", Some("T"));
        inactive.status = "RETIRED".to_string();
        assert!(resolve_fingerprint(&inactive).is_none());

        let special = Zone::new(ZoneCategory::IetfSpecialUse, "a.example.", Some("T"));
        assert!(resolve_fingerprint(&special).is_none());

        let ttld = Zone::new(ZoneCategory::TTld, "a.example.", Some("T"));
        assert!(resolve_fingerprint(&ttld).is_none());

        let no_rname = Zone::new(ZoneCategory::CcTld, "RNAMENotAvailable", Some("T"));
        assert!(resolve_fingerprint(&no_rname).is_none());

        let kept = Zone::new(ZoneCategory::SubCcTld, "Hostmaster.A.Example.", Some("t-one"));
        assert_eq!(
            resolve_fingerprint(&kept),
            Some(Fingerprint {
                registrant: "hostmaster.a.example.".to_string(),
                operator: OperatorToken::Named("TONE".to_string()),
            })
        );
    }

    #[test]
    fn test_sole_pair_without_bridge_is_unchanged() {
        // Z1 is the only zone with (R1, T1) but T1 has no other registrant.
        let colors = resolve_zone_colors(&zones(&[
            ("z1.", "r1.", Some("T1")),
            ("z2.", "r1.", Some("T9")),
        ]));

        assert_eq!(color_of(&colors, "z1.").operator, OperatorToken::Named("T1".to_string()));
        assert_eq!(color_of(&colors, "z2.").operator, OperatorToken::Named("T9".to_string()));
    }

    #[test]
    fn test_bridge_zone_is_reassigned() {
        // Z2 is the only (R2, T2) zone; T2 is also used by R3, R2 also uses T3.
        let colors = resolve_zone_colors(&zones(&[
            ("z2.", "r2.", Some("T2")),
            ("z3.", "r3.", Some("T2")),
            ("z4.", "r3.", Some("T2")),
            ("z5.", "r2.", Some("T3")),
            ("z6.", "r2.", Some("T3")),
        ]));

        assert_eq!(color_of(&colors, "z2.").operator, OperatorToken::Named("T3".to_string()));
        assert_eq!(color_of(&colors, "z3.").operator, OperatorToken::Named("T2".to_string()));
        assert_eq!(color_of(&colors, "z5.").operator, OperatorToken::Named("T3".to_string()));
    }

    #[test]
    fn test_bridge_tie_break_is_lexicographic() {
        let colors = resolve_zone_colors(&zones(&[
            ("bridge.", "r.", Some("MIDDLE")),
            ("other.", "s.", Some("MIDDLE")),
            ("x.", "r.", Some("ZULU")),
            ("y.", "r.", Some("ALPHA")),
        ]));

        assert_eq!(color_of(&colors, "bridge.").operator, OperatorToken::Named("ALPHA".to_string()));
    }

    #[test]
    fn test_pair_with_two_zones_is_not_a_bridge() {
        let colors = resolve_zone_colors(&zones(&[
            ("a.", "r2.", Some("T2")),
            ("b.", "r2.", Some("T2")),
            ("c.", "r3.", Some("T2")),
            ("d.", "r2.", Some("T3")),
        ]));

        assert_eq!(color_of(&colors, "a.").operator, OperatorToken::Named("T2".to_string()));
        assert_eq!(color_of(&colors, "b.").operator, OperatorToken::Named("T2".to_string()));
    }

    #[test]
    fn test_unset_does_not_count_as_operator() {
        // r1 only has one real operator, so z1 cannot be a bridge.
        let colors = resolve_zone_colors(&zones(&[
            ("z1.", "r1.", Some("T1")),
            ("z2.", "r1.", None),
            ("z3.", "r2.", Some("T1")),
        ]));

        assert_eq!(color_of(&colors, "z1.").operator, OperatorToken::Named("T1".to_string()));
        assert_eq!(color_of(&colors, "z2.").operator, OperatorToken::Unset);
    }

    #[test]
    fn test_identity_tokens() {
        let color = ZoneColor {
            zone: "z.".to_string(),
            registrant: "r.".to_string(),
            operator: OperatorToken::Unset,
            category: ZoneCategory::GTld,
        };
        assert_eq!(color.identity_tokens(), vec![IdentityToken::Registrant("r.".to_string())]);

        let color = ZoneColor {
            operator: OperatorToken::Named("T".to_string()),
            ..color
        };
        assert_eq!(
            color.identity_tokens(),
            vec![IdentityToken::Registrant("r.".to_string()), IdentityToken::Operator("T".to_string())]
        );
    }

    #[test]
    fn test_colors_follow_zone_order() {
        let colors = resolve_zone_colors(&zones(&[
            ("c.", "r.", None),
            ("a.", "r.", None),
            ("b.", "r.", None),
        ]));

        let order: Vec<&str> = colors.iter().map(|c| c.zone.as_str()).collect();
        assert_eq!(order, vec!["a.", "b.", "c."]);
    }
}
