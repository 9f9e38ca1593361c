use crate::fingerprint::{IdentityToken, ZoneColor};
use crate::model::census::ZoneCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

/// Zones believed to be run by the same operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct House {
    pub title: BTreeSet<IdentityToken>,
    pub zones_by_category: BTreeMap<ZoneCategory, BTreeSet<String>>,
}

impl House {
    fn add_zone(&mut self, color: &ZoneColor) {
        self.zones_by_category
            .entry(color.category.clone())
            .or_default()
            .insert(color.zone.clone());
    }

    pub fn zones(&self) -> BTreeSet<String> {
        self.zones_by_category.values().flatten().cloned().collect()
    }

    pub fn top_level_zones(&self) -> BTreeSet<String> {
        self.zones_by_category
            .iter()
            .filter(|(category, _)| category.is_top_level())
            .flat_map(|(_, zones)| zones.iter().cloned())
            .collect()
    }

    pub fn count(&self, category: &ZoneCategory) -> usize {
        self.zones_by_category.get(category).map_or(0, BTreeSet::len)
    }

    pub fn zone_count(&self) -> usize {
        self.zones_by_category.values().map(BTreeSet::len).sum()
    }

    pub fn registrants(&self) -> impl Iterator<Item = &str> {
        self.title.iter().filter_map(|token| match token {
            IdentityToken::Registrant(r) => Some(r.as_str()),
            IdentityToken::Operator(_) => None,
        })
    }

    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.title.iter().filter_map(|token| match token {
            IdentityToken::Operator(o) => Some(o.as_str()),
            IdentityToken::Registrant(_) => None,
        })
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterStrategy {
    /// First house sharing any token absorbs the zone. Order sensitive: two
    /// houses later linked by a third zone are not merged.
    #[default]
    Greedy,
    /// Connected components of the token graph. Order insensitive, and merges
    /// houses the greedy pass keeps apart.
    ConnectedComponents,
}

/// Clusters zone colors in the order given. `resolve_zone_colors` yields them
/// in ascending zone identifier order, which is the order reports rely on.
pub fn build_houses(colors: &[ZoneColor], strategy: ClusterStrategy) -> Vec<House> {
    let houses = match strategy {
        ClusterStrategy::Greedy => build_houses_greedy(colors),
        ClusterStrategy::ConnectedComponents => build_houses_connected(colors),
    };

    info!(
        "Clustered {} zones into {} houses ({:?}).",
        colors.len(),
        houses.len(),
        strategy
    );

    houses
}

pub fn build_houses_greedy(colors: &[ZoneColor]) -> Vec<House> {
    let mut houses: Vec<House> = Vec::new();
    // token -> earliest house whose title contains it
    let mut first_owner: HashMap<IdentityToken, usize> = HashMap::new();

    for color in colors {
        let tokens = color.identity_tokens();

        let index = match tokens.iter().filter_map(|t| first_owner.get(t)).min() {
            Some(&index) => index,
            None => {
                houses.push(House::default());
                houses.len() - 1
            }
        };

        let house = &mut houses[index];

        for token in tokens {
            first_owner
                .entry(token.clone())
                .and_modify(|owner| *owner = (*owner).min(index))
                .or_insert(index);
            house.title.insert(token);
        }

        house.add_zone(color);
    }

    houses
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new() -> Self {
        DisjointSet {
            parent: Vec::new(),
            rank: Vec::new(),
        }
    }

    fn make_set(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));

        if ra == rb {
            return;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Tokens are nodes and each zone joins its tokens. Houses are listed in the
/// order their first zone appears.
pub fn build_houses_connected(colors: &[ZoneColor]) -> Vec<House> {
    let mut sets = DisjointSet::new();
    let mut token_ids: HashMap<IdentityToken, usize> = HashMap::new();
    let mut zone_roots = Vec::with_capacity(colors.len());

    for color in colors {
        let ids: Vec<usize> = color
            .identity_tokens()
            .into_iter()
            .map(|token| *token_ids.entry(token).or_insert_with(|| sets.make_set()))
            .collect();

        for pair in ids.windows(2) {
            sets.union(pair[0], pair[1]);
        }

        zone_roots.push(ids[0]);
    }

    let mut house_of_root: HashMap<usize, usize> = HashMap::new();
    let mut houses: Vec<House> = Vec::new();

    for (color, token_id) in colors.iter().zip(zone_roots) {
        let root = sets.find(token_id);

        let index = *house_of_root.entry(root).or_insert_with(|| {
            houses.push(House::default());
            houses.len() - 1
        });

        houses[index].add_zone(color);
    }

    for (token, id) in token_ids {
        let root = sets.find(id);
        if let Some(&index) = house_of_root.get(&root) {
            houses[index].title.insert(token);
        }
    }

    houses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::OperatorToken;

    fn color(zone: &str, registrant: &str, operator: Option<&str>, category: ZoneCategory) -> ZoneColor {
        ZoneColor {
            zone: zone.to_string(),
            registrant: registrant.to_string(),
            operator: match operator {
                Some(o) => OperatorToken::Named(o.to_string()),
                None => OperatorToken::Unset,
            },
            category,
        }
    }

    fn registrant(r: &str) -> IdentityToken {
        IdentityToken::Registrant(r.to_string())
    }

    fn operator(o: &str) -> IdentityToken {
        IdentityToken::Operator(o.to_string())
    }

    #[test]
    fn test_unset_operators_cluster_by_registrant() {
        let colors = vec![
            color("one.", "a.example.", None, ZoneCategory::CcTld),
            color("two.", "a.example.", None, ZoneCategory::CcTld),
            color("three.", "b.example.", None, ZoneCategory::GTld),
        ];

        let houses = build_houses_greedy(&colors);

        assert_eq!(houses.len(), 2);
        assert_eq!(houses[0].title, BTreeSet::from([registrant("a.example.")]));
        assert_eq!(houses[0].zone_count(), 2);
        assert_eq!(houses[1].title, BTreeSet::from([registrant("b.example.")]));
        assert_eq!(houses[1].zone_count(), 1);
    }

    #[test]
    fn test_shared_operator_merges_registrants() {
        let colors = vec![
            color("a.", "r1.", Some("OPS"), ZoneCategory::CcTld),
            color("b.", "r2.", Some("OPS"), ZoneCategory::SubCcTld),
        ];

        let houses = build_houses_greedy(&colors);

        assert_eq!(houses.len(), 1);
        assert_eq!(
            houses[0].title,
            BTreeSet::from([registrant("r1."), registrant("r2."), operator("OPS")])
        );
        assert_eq!(houses[0].count(&ZoneCategory::CcTld), 1);
        assert_eq!(houses[0].count(&ZoneCategory::SubCcTld), 1);
        assert_eq!(houses[0].count(&ZoneCategory::GTld), 0);
        assert_eq!(houses[0].top_level_zones(), BTreeSet::from(["a.".to_string()]));
    }

    #[test]
    fn test_later_link_does_not_merge_existing_houses() {
        let colors = vec![
            color("z1.", "a.", Some("T1"), ZoneCategory::GTld),
            color("z2.", "b.", Some("T2"), ZoneCategory::GTld),
            color("z3.", "a.", Some("T2"), ZoneCategory::GTld),
        ];

        let greedy = build_houses_greedy(&colors);

        // z3 lands in the first matching house; the second house stays.
        assert_eq!(greedy.len(), 2);
        assert_eq!(greedy[0].zones(), BTreeSet::from(["z1.".to_string(), "z3.".to_string()]));
        assert!(greedy[0].title.contains(&operator("T2")));
        assert_eq!(greedy[1].zones(), BTreeSet::from(["z2.".to_string()]));

        let connected = build_houses_connected(&colors);

        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].zone_count(), 3);
    }

    #[test]
    fn test_first_match_wins_over_best_match() {
        let colors = vec![
            color("z1.", "a.", None, ZoneCategory::GTld),
            color("z2.", "b.", Some("T"), ZoneCategory::GTld),
            color("z3.", "b.", Some("T"), ZoneCategory::GTld),
            // shares one token with house 0 and two with house 1
            color("z4.", "a.", Some("T"), ZoneCategory::GTld),
        ];

        let houses = build_houses_greedy(&colors);

        assert_eq!(houses.len(), 2);
        assert!(houses[0].zones().contains("z4."));
        assert!(!houses[1].zones().contains("z4."));
    }

    #[test]
    fn test_clustering_is_repeatable() {
        let colors = vec![
            color("a.", "r1.", Some("X"), ZoneCategory::CcTld),
            color("b.", "r2.", Some("Y"), ZoneCategory::GTld),
            color("c.", "r3.", Some("X"), ZoneCategory::RevMap),
            color("d.", "r2.", None, ZoneCategory::SubGTld),
            color("e.", "r4.", None, ZoneCategory::CcTld),
        ];

        assert_eq!(build_houses_greedy(&colors), build_houses_greedy(&colors));
        assert_eq!(build_houses_connected(&colors), build_houses_connected(&colors));
    }

    #[test]
    fn test_every_zone_lands_in_exactly_one_house() {
        let colors = vec![
            color("a.", "r1.", Some("X"), ZoneCategory::CcTld),
            color("b.", "r2.", Some("Y"), ZoneCategory::GTld),
            color("c.", "r3.", Some("X"), ZoneCategory::RevMap),
            color("d.", "r2.", None, ZoneCategory::SubGTld),
            color("e.", "r4.", None, ZoneCategory::CcTld),
            color("f.", "r3.", Some("Y"), ZoneCategory::CcTld),
        ];

        for houses in [build_houses_greedy(&colors), build_houses_connected(&colors)] {
            let mut seen = BTreeSet::new();

            for house in &houses {
                for zone in house.zones() {
                    assert!(seen.insert(zone), "zone placed in two houses");
                }

                // every zone of the house shares a token with the final title
                for c in colors.iter().filter(|c| house.zones().contains(&c.zone)) {
                    assert!(c.identity_tokens().iter().any(|t| house.title.contains(t)));
                }
            }

            assert_eq!(seen.len(), colors.len());
        }
    }

    #[test]
    fn test_connected_components_ignore_order() {
        let colors = vec![
            color("z1.", "a.", Some("T1"), ZoneCategory::GTld),
            color("z2.", "b.", Some("T2"), ZoneCategory::GTld),
            color("z3.", "a.", Some("T2"), ZoneCategory::GTld),
            color("z4.", "c.", None, ZoneCategory::CcTld),
        ];
        let mut reversed = colors.clone();
        reversed.reverse();

        let forward: BTreeSet<BTreeSet<String>> = build_houses_connected(&colors).iter().map(House::zones).collect();
        let backward: BTreeSet<BTreeSet<String>> = build_houses_connected(&reversed).iter().map(House::zones).collect();

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_registrants_and_operators() {
        let colors = vec![
            color("a.", "r1.", Some("OPS"), ZoneCategory::CcTld),
            color("b.", "r2.", Some("OPS"), ZoneCategory::CcTld),
        ];

        let houses = build_houses(&colors, ClusterStrategy::Greedy);

        assert_eq!(houses[0].registrants().collect::<Vec<_>>(), vec!["r1.", "r2."]);
        assert_eq!(houses[0].operators().collect::<Vec<_>>(), vec!["OPS"]);
    }
}
