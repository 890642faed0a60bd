use crate::models::action::{ActionCategory, ActionType, ActionWeight, WeightKey};
use crate::models::score::{ActionContribution, ScoreBreakdown};
use std::collections::{BTreeMap, HashMap};

/// Accumulated magnitude per action type for one developer.
pub type DeveloperTotals = BTreeMap<ActionType, u64>;

/// Per-type terms of a developer's score. Types or categories without a
/// recorded weight contribute nothing and are left out.
pub fn contributions(
    weights: &[ActionWeight],
    totals: &DeveloperTotals,
) -> Vec<ActionContribution> {
    let by_key: HashMap<WeightKey, f64> = weights.iter().map(|w| (w.key, w.weight)).collect();
    let mut out = Vec::new();

    for category in ActionCategory::ALL {
        let Some(&category_weight) = by_key.get(&WeightKey::Category(category)) else {
            continue;
        };

        for action in category.action_types() {
            let Some(&type_weight) = by_key.get(&WeightKey::Type(action)) else {
                continue;
            };
            let total = totals.get(&action).copied().unwrap_or(0);
            let signed = action.polarity().sign() * total as f64;

            out.push(ActionContribution {
                action,
                category,
                category_weight,
                type_weight,
                total,
                contribution: category_weight * type_weight * signed,
            });
        }
    }

    out
}

pub fn developer_score(weights: &[ActionWeight], totals: &DeveloperTotals) -> f64 {
    contributions(weights, totals)
        .iter()
        .map(|c| c.contribution)
        .sum()
}

pub fn breakdown(developer: &str, weights: &[ActionWeight], totals: &DeveloperTotals) -> ScoreBreakdown {
    let contributions = contributions(weights, totals);
    ScoreBreakdown {
        developer: developer.to_string(),
        score: contributions.iter().map(|c| c.contribution).sum(),
        contributions,
    }
}
