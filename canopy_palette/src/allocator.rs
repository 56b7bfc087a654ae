// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hue assignment per feature name, lightness ramps per value, and the two
//! canonical feature orders.

use std::collections::BTreeMap;

use canopy_model::{FeatureId, FeatureTable};
use canopy_partition::{Partition, SectorKind};
use hashbrown::HashMap;
use log::warn;

use crate::hsl::Hsl;

/// The eight base hues, one per feature name, in assignment order.
const BASE_HUES: [Hsl; 8] = [
    Hsl::new(211.0, 0.65, 0.50),
    Hsl::new(29.0, 0.80, 0.55),
    Hsl::new(0.0, 0.65, 0.55),
    Hsl::new(180.0, 0.45, 0.45),
    Hsl::new(115.0, 0.40, 0.50),
    Hsl::new(52.0, 0.70, 0.50),
    Hsl::new(300.0, 0.35, 0.55),
    Hsl::new(330.0, 0.60, 0.65),
];

/// Lightness step between consecutive values of one feature name.
const LIGHTNESS_GAP: f64 = 0.05;

/// Ceiling for value lightness ramps; ramps that would cross it get evenly
/// divided steps instead.
const MAX_LIGHTNESS: f64 = 0.92;

/// How much lighter each reuse of a base hue starts.
const REUSE_STEP: f64 = 0.12;

/// Reused hues never start above this, so every ramp keeps room below
/// [`MAX_LIGHTNESS`] and values of one name stay distinct.
const REUSE_CEIL: f64 = 0.75;

/// Neutral gray for feature IDs the feature table does not know.
pub const FALLBACK_COLOR: Hsl = Hsl::new(0.0, 0.0, 0.62);

/// Owned color scale and feature ordering, built once per dataset.
///
/// All lookups are pure; nothing here changes when filters or zoom move.
#[derive(Clone, Debug)]
pub struct ColorAllocator {
    colors: HashMap<FeatureId, Hsl>,
    bases: HashMap<String, Hsl>,
    sector_order: Vec<String>,
    feature_order: Vec<FeatureId>,
}

impl ColorAllocator {
    /// Builds the scale from the unfiltered partition's first ring.
    ///
    /// Feature names are weighted by the subtree value of every depth-1
    /// sector using any of their values; names get base hues in
    /// descending-usage order, reusing the least-loaded hue (with a lighter
    /// start) once the eight are taken. Values of a name get a monotone
    /// lightness ramp above the base. IDs present in the trie but absent
    /// from the table are logged and mapped to [`FALLBACK_COLOR`].
    #[must_use]
    pub fn allocate(features: &FeatureTable, partition: &Partition) -> Self {
        let mut id_usage: HashMap<FeatureId, u64> = HashMap::new();
        for &child in partition.children(partition.root()) {
            if let Some(node) = partition.get(child) {
                if let SectorKind::Split(feature) = node.kind {
                    *id_usage.entry(feature).or_insert(0) += node.value;
                }
            }
        }

        let mut colors: HashMap<FeatureId, Hsl> =
            HashMap::with_capacity(features.len() + id_usage.len());
        for &id in id_usage.keys() {
            if features.get(id).is_none() {
                warn!("{id} is used in the trie but missing from the feature table");
                colors.insert(id, FALLBACK_COLOR);
            }
        }

        // Group table entries by feature name; BTreeMap gives name-ascending
        // iteration, the tie-break everywhere below.
        let mut groups: BTreeMap<&str, Vec<(FeatureId, &str, u64)>> = BTreeMap::new();
        for (id, def) in features.iter() {
            let usage = id_usage.get(&id).copied().unwrap_or(0);
            groups
                .entry(def.name.as_str())
                .or_default()
                .push((id, def.value.as_str(), usage));
        }

        // Hue assignment order: total usage descending, name ascending.
        let mut named: Vec<(&str, u64)> = groups
            .iter()
            .map(|(name, values)| (*name, values.iter().map(|v| v.2).sum()))
            .collect();
        named.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut bases: HashMap<String, Hsl> = HashMap::with_capacity(named.len());
        let mut hue_load = [0_usize; BASE_HUES.len()];
        let mut hue_next = BASE_HUES;
        for (rank, &(name, _)) in named.iter().enumerate() {
            let slot = if rank < BASE_HUES.len() {
                rank
            } else {
                // Reuse the hue carrying the fewest value-variants so far.
                (0..BASE_HUES.len())
                    .min_by_key(|&i| (hue_load[i], i))
                    .unwrap_or(0)
            };
            let base = hue_next[slot];
            hue_next[slot] = base.with_lightness((base.l + REUSE_STEP).min(REUSE_CEIL));
            hue_load[slot] += groups[name].len();
            bases.insert(name.to_owned(), base);
        }

        // Per-name value ramps: usage descending, value string ascending.
        for (name, values) in &mut groups {
            let base = bases[*name];
            values.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(b.1)));
            let count = values.len() as f64;
            let step = if base.l + count * LIGHTNESS_GAP <= MAX_LIGHTNESS {
                LIGHTNESS_GAP
            } else {
                (MAX_LIGHTNESS - base.l).max(0.0) / count
            };
            for (k, &(id, ..)) in values.iter().enumerate() {
                colors.insert(id, base.with_lightness(base.l + step * k as f64));
            }
        }

        // Visual sector order: usage desc, name asc, base lightness asc.
        named.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.cmp(b.0))
                .then_with(|| bases[a.0].l.total_cmp(&bases[b.0].l))
        });
        let sector_order: Vec<String> = named.iter().map(|&(name, _)| name.to_owned()).collect();

        // Filter-panel order: sector order, with every value of a name kept
        // contiguous even when it never appears at depth 1.
        let feature_order: Vec<FeatureId> = named
            .iter()
            .flat_map(|&(name, _)| groups[name].iter().map(|&(id, ..)| id))
            .collect();

        Self {
            colors,
            bases,
            sector_order,
            feature_order,
        }
    }

    /// Color of a feature-value pair.
    ///
    /// `None` only for IDs that were neither in the feature table nor in the
    /// trie when the scale was built.
    #[must_use]
    pub fn color_of(&self, id: FeatureId) -> Option<Hsl> {
        self.colors.get(&id).copied()
    }

    /// Base color of a feature name.
    #[must_use]
    pub fn base_color(&self, name: &str) -> Option<Hsl> {
        self.bases.get(name).copied()
    }

    /// Feature names in visual sector order (most used first).
    #[must_use]
    pub fn sector_order(&self) -> &[String] {
        &self.sector_order
    }

    /// Feature IDs in filter-panel order; values of one name are contiguous.
    #[must_use]
    pub fn feature_order(&self) -> &[FeatureId] {
        &self.feature_order
    }
}

#[cfg(test)]
mod tests {
    use canopy_model::{FeatureDef, RuleNode, TreeId, Trie};

    use super::*;

    fn def(name: &str, value: &str) -> FeatureDef {
        FeatureDef {
            name: name.into(),
            value: value.into(),
            short: name.chars().take(3).collect(),
        }
    }

    /// A depth-1 split on `feature` whose subtree holds `paths` leaves.
    fn split(feature: u32, paths: u32, first_tree: u32) -> RuleNode {
        RuleNode::Internal {
            feature: FeatureId(feature),
            children: (0..paths)
                .map(|i| RuleNode::Leaf {
                    tree: TreeId(first_tree + i),
                })
                .collect(),
        }
    }

    /// Three names: `age` (ids 0, 1; 5 paths), `sex` (id 2; 3 paths),
    /// `income` (ids 3, 4; id 4 never appears at depth 1).
    fn fixture() -> (FeatureTable, Partition) {
        let features: FeatureTable = [
            (FeatureId(0), def("age", "<26")),
            (FeatureId(1), def("age", ">=26")),
            (FeatureId(2), def("sex", "male")),
            (FeatureId(3), def("income", "<50k")),
            (FeatureId(4), def("income", ">=50k")),
        ]
        .into_iter()
        .collect();
        let trie = Trie {
            children: vec![
                split(0, 3, 0),
                split(1, 2, 10),
                split(2, 3, 20),
                split(3, 1, 30),
            ],
        };
        (features, Partition::build(&trie))
    }

    #[test]
    fn names_rank_by_usage_then_lexicographically() {
        let (features, partition) = fixture();
        let scale = ColorAllocator::allocate(&features, &partition);
        // age: 5 paths, sex: 3, income: 1.
        assert_eq!(scale.sector_order(), ["age", "sex", "income"]);
        assert_eq!(scale.base_color("age"), Some(BASE_HUES[0]));
        assert_eq!(scale.base_color("sex"), Some(BASE_HUES[1]));
        assert_eq!(scale.base_color("income"), Some(BASE_HUES[2]));
    }

    #[test]
    fn value_ramp_uses_fixed_steps_when_they_fit() {
        let (features, partition) = fixture();
        let scale = ColorAllocator::allocate(&features, &partition);
        // age:<26 (3 paths) ranks above age:>=26 (2 paths).
        let first = scale.color_of(FeatureId(0)).unwrap();
        let second = scale.color_of(FeatureId(1)).unwrap();
        assert_eq!(first.l, BASE_HUES[0].l);
        assert!((second.l - (first.l + LIGHTNESS_GAP)).abs() < 1e-12);
        assert_eq!(first.h, second.h);
    }

    #[test]
    fn crowded_ramps_divide_the_range_evenly() {
        let features: FeatureTable = (0..12)
            .map(|i| (FeatureId(i), def("grade", &format!("{i:02}"))))
            .collect();
        let trie = Trie {
            children: vec![split(0, 2, 0)],
        };
        let scale = ColorAllocator::allocate(&features, &Partition::build(&trie));
        let base = scale.base_color("grade").unwrap();
        // 12 fixed steps would cross the ceiling.
        assert!(base.l + 12.0 * LIGHTNESS_GAP > MAX_LIGHTNESS);
        let mut lightness: Vec<f64> = (0..12)
            .map(|i| scale.color_of(FeatureId(i)).unwrap().l)
            .collect();
        lightness.sort_by(f64::total_cmp);
        for pair in lightness.windows(2) {
            assert!(pair[1] > pair[0], "two values of one name collided");
        }
        assert!(lightness.iter().all(|&l| l < MAX_LIGHTNESS));
    }

    #[test]
    fn values_of_one_name_never_share_a_color() {
        let (features, partition) = fixture();
        let scale = ColorAllocator::allocate(&features, &partition);
        for pair in [[0, 1], [3, 4]] {
            let a = scale.color_of(FeatureId(pair[0])).unwrap();
            let b = scale.color_of(FeatureId(pair[1])).unwrap();
            assert_eq!(a.h, b.h);
            assert!((a.l - b.l).abs() >= LIGHTNESS_GAP - 1e-12);
        }
    }

    #[test]
    fn ninth_name_reuses_the_least_loaded_hue_lighter() {
        let features: FeatureTable = (0..9)
            .map(|i| (FeatureId(i), def(&format!("f{i}"), "yes")))
            .collect();
        // f0 is the heaviest, f8 the lightest used.
        let trie = Trie {
            children: (0..9).map(|i| split(i, 10 - i, i * 100)).collect(),
        };
        let scale = ColorAllocator::allocate(&features, &Partition::build(&trie));
        let first = scale.base_color("f0").unwrap();
        let ninth = scale.base_color("f8").unwrap();
        assert_eq!(ninth.h, first.h);
        assert!((ninth.l - (first.l + REUSE_STEP)).abs() < 1e-12);
    }

    #[test]
    fn feature_order_keeps_same_named_values_contiguous() {
        let (features, partition) = fixture();
        let scale = ColorAllocator::allocate(&features, &partition);
        // income:>=50k (id 4) never appears at depth 1 but stays next to
        // income:<50k (id 3).
        assert_eq!(
            scale.feature_order(),
            [
                FeatureId(0),
                FeatureId(1),
                FeatureId(2),
                FeatureId(3),
                FeatureId(4)
            ]
        );
    }

    #[test]
    fn unknown_trie_features_fall_back_to_neutral() {
        let features: FeatureTable = [(FeatureId(0), def("age", "<26"))].into_iter().collect();
        let trie = Trie {
            children: vec![split(0, 1, 0), split(7, 2, 10)],
        };
        let scale = ColorAllocator::allocate(&features, &Partition::build(&trie));
        assert_eq!(scale.color_of(FeatureId(7)), Some(FALLBACK_COLOR));
        assert_eq!(scale.color_of(FeatureId(99)), None);
    }
}
