use crate::models::action::{ActionCategory, ActionType, ActionWeight, WeightKey};
use std::collections::BTreeMap;

/// Accumulated magnitude per action type, summed over all developers.
pub type TypeTotals = BTreeMap<ActionType, u64>;

/// Recompute category and type weights from cumulative totals.
///
/// Category weight is its share of all actions; type weight is its share
/// within its category. Categories without actions keep their previous
/// weights, so they are absent from the result.
pub fn compute_weights(totals: &TypeTotals, marker: u64, updated_at: i64) -> Vec<ActionWeight> {
    let total: u64 = totals.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut weights = Vec::new();

    for category in ActionCategory::ALL {
        let category_total: u64 = category
            .action_types()
            .map(|action| totals.get(&action).copied().unwrap_or(0))
            .sum();

        if category_total == 0 {
            continue;
        }

        weights.push(ActionWeight {
            key: WeightKey::Category(category),
            weight: share(category_total, total),
            last_update_marker: marker,
            updated_at,
        });

        for action in category.action_types() {
            let type_total = totals.get(&action).copied().unwrap_or(0);
            weights.push(ActionWeight {
                key: WeightKey::Type(action),
                weight: share(type_total, category_total),
                last_update_marker: marker,
                updated_at,
            });
        }
    }

    weights
}

/// Whether enough commits were recorded since the last recomputation.
/// With no recorded recomputation the weights are always due.
pub fn weights_due(commit_sequence: u64, last_marker: Option<u64>, interval: u64) -> bool {
    match last_marker {
        None => true,
        Some(marker) => commit_sequence.saturating_sub(marker) >= interval,
    }
}

fn share(part: u64, whole: u64) -> f64 {
    100.0 * part as f64 / whole as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_of(weights: &[ActionWeight], key: WeightKey) -> Option<f64> {
        weights.iter().find(|w| w.key == key).map(|w| w.weight)
    }

    #[test]
    fn splits_category_total_between_types() {
        let mut totals = TypeTotals::new();
        totals.insert(ActionType::CNS, 10);
        totals.insert(ActionType::CND, 0);
        totals.insert(ActionType::CAL, 40);

        let weights = compute_weights(&totals, 7, 0);

        assert_eq!(weight_of(&weights, WeightKey::Category(ActionCategory::C)), Some(100.0));
        assert_eq!(weight_of(&weights, WeightKey::Type(ActionType::CNS)), Some(20.0));
        assert_eq!(weight_of(&weights, WeightKey::Type(ActionType::CAL)), Some(80.0));
        assert_eq!(weight_of(&weights, WeightKey::Type(ActionType::CND)), Some(0.0));
        assert!(weights.iter().all(|w| w.last_update_marker == 7));
    }

    #[test]
    fn every_type_of_a_populated_category_gets_a_weight() {
        let mut totals = TypeTotals::new();
        totals.insert(ActionType::CBF, 3);

        let weights = compute_weights(&totals, 1, 0);
        let type_weights = weights
            .iter()
            .filter(|w| matches!(w.key, WeightKey::Type(_)))
            .count();
        assert_eq!(type_weights, ActionType::ALL.len());

        let type_sum: f64 = weights
            .iter()
            .filter(|w| matches!(w.key, WeightKey::Type(_)))
            .map(|w| w.weight)
            .sum();
        assert!((type_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_categories_are_skipped() {
        let mut totals = TypeTotals::new();
        totals.insert(ActionType::CEC, 2);

        let weights = compute_weights(&totals, 1, 0);
        assert!(weight_of(&weights, WeightKey::Category(ActionCategory::M)).is_none());
        assert!(weight_of(&weights, WeightKey::Category(ActionCategory::B)).is_none());
    }

    #[test]
    fn no_actions_means_no_weights() {
        assert!(compute_weights(&TypeTotals::new(), 1, 0).is_empty());

        let mut zeros = TypeTotals::new();
        zeros.insert(ActionType::CNS, 0);
        assert!(compute_weights(&zeros, 1, 0).is_empty());
    }

    #[test]
    fn recomputation_is_throttled_by_commit_count() {
        assert!(weights_due(1, None, 150));
        assert!(!weights_due(149, Some(1), 150));
        assert!(weights_due(151, Some(1), 150));
        assert!(!weights_due(0, Some(5), 150));
    }
}
