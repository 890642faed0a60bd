use crate::models::action::{ActionCategory, ActionType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionContribution {
    pub action: ActionType,
    pub category: ActionCategory,
    pub category_weight: f64,
    pub type_weight: f64,
    pub total: u64,
    /// category_weight * type_weight * signed total
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub developer: String,
    pub score: f64,
    pub contributions: Vec<ActionContribution>,
}
