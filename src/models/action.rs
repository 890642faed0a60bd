use serde::{Deserialize, Serialize};
use std::fmt;

/// A contribution action can fall into one of these categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionCategory {
    /// Code and documentation repository
    C,
    /// Mailing lists and forums
    M,
    /// Bug database
    B,
}

/// Observable behaviours extracted from a single commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionType {
    /// Commit new source file
    CNS,
    /// Commit new directory
    CND,
    /// Commit documentation files
    CDF,
    /// Commit translation files
    CTF,
    /// Commit binary files
    CBF,
    /// Commit with empty commit message
    CEC,
    /// Commit more than the configured number of files in one commit
    CMF,
    /// Commit message includes a bug report number
    CBN,
    /// Commit message awards a pointy hat
    CPH,
    /// Add or remove lines of code
    CAL,
}

/// Whether an action raises or lowers a developer's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 3] = [ActionCategory::C, ActionCategory::M, ActionCategory::B];

    pub fn code(self) -> &'static str {
        match self {
            ActionCategory::C => "C",
            ActionCategory::M => "M",
            ActionCategory::B => "B",
        }
    }

    pub fn from_code(code: &str) -> Option<ActionCategory> {
        ActionCategory::ALL
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(code))
    }

    /// Action types grouped under this category.
    pub fn action_types(self) -> impl Iterator<Item = ActionType> {
        ActionType::ALL
            .into_iter()
            .filter(move |action| action.category() == self)
    }
}

impl ActionType {
    pub const ALL: [ActionType; 10] = [
        ActionType::CNS,
        ActionType::CND,
        ActionType::CDF,
        ActionType::CTF,
        ActionType::CBF,
        ActionType::CEC,
        ActionType::CMF,
        ActionType::CBN,
        ActionType::CPH,
        ActionType::CAL,
    ];

    pub fn category(self) -> ActionCategory {
        match self {
            ActionType::CNS
            | ActionType::CND
            | ActionType::CDF
            | ActionType::CTF
            | ActionType::CBF
            | ActionType::CEC
            | ActionType::CMF
            | ActionType::CBN
            | ActionType::CPH
            | ActionType::CAL => ActionCategory::C,
        }
    }

    /// Empty messages and oversized commits are penalized; everything else counts in favour.
    pub fn polarity(self) -> Polarity {
        match self {
            ActionType::CEC | ActionType::CMF => Polarity::Negative,
            ActionType::CNS
            | ActionType::CND
            | ActionType::CDF
            | ActionType::CTF
            | ActionType::CBF
            | ActionType::CBN
            | ActionType::CPH
            | ActionType::CAL => Polarity::Positive,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ActionType::CNS => "CNS",
            ActionType::CND => "CND",
            ActionType::CDF => "CDF",
            ActionType::CTF => "CTF",
            ActionType::CBF => "CBF",
            ActionType::CEC => "CEC",
            ActionType::CMF => "CMF",
            ActionType::CBN => "CBN",
            ActionType::CPH => "CPH",
            ActionType::CAL => "CAL",
        }
    }

    pub fn from_code(code: &str) -> Option<ActionType> {
        ActionType::ALL
            .into_iter()
            .find(|action| action.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One classified action for one commit. Magnitude is never negative;
/// polarity is applied only when scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionObservation {
    pub developer: String,
    pub commit: String,
    pub action: ActionType,
    pub magnitude: u64,
}

/// Weights are kept per action type and per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeightKey {
    Type(ActionType),
    Category(ActionCategory),
}

impl WeightKey {
    /// Storage form: `type:CNS` or `category:C`.
    pub fn storage_key(self) -> String {
        match self {
            WeightKey::Type(action) => format!("type:{}", action.code()),
            WeightKey::Category(category) => format!("category:{}", category.code()),
        }
    }

    pub fn from_storage_key(raw: &str) -> Option<WeightKey> {
        let (kind, code) = raw.split_once(':')?;
        match kind {
            "type" => ActionType::from_code(code).map(WeightKey::Type),
            "category" => ActionCategory::from_code(code).map(WeightKey::Category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionWeight {
    pub key: WeightKey,
    /// Share of observed actions, 0–100.
    pub weight: f64,
    /// Processed-commit count at the recomputation that produced this weight.
    pub last_update_marker: u64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_type_belongs_to_the_repository_category() {
        let grouped: Vec<ActionType> = ActionCategory::C.action_types().collect();
        assert_eq!(grouped, ActionType::ALL.to_vec());
        assert_eq!(ActionCategory::M.action_types().count(), 0);
        assert_eq!(ActionCategory::B.action_types().count(), 0);
    }

    #[test]
    fn penalized_actions_are_negative() {
        assert_eq!(ActionType::CEC.polarity(), Polarity::Negative);
        assert_eq!(ActionType::CMF.polarity(), Polarity::Negative);
        assert_eq!(ActionType::CAL.polarity(), Polarity::Positive);
        assert_eq!(ActionType::CBN.polarity().sign(), 1.0);
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(ActionType::from_code("cns"), Some(ActionType::CNS));
        assert_eq!(ActionType::from_code("TCO"), None);
        assert_eq!(ActionCategory::from_code("b"), Some(ActionCategory::B));
    }

    #[test]
    fn weight_keys_survive_storage_encoding() {
        let key = WeightKey::Type(ActionType::CPH);
        assert_eq!(key.storage_key(), "type:CPH");
        assert_eq!(WeightKey::from_storage_key("type:CPH"), Some(key));
        assert_eq!(
            WeightKey::from_storage_key("category:M"),
            Some(WeightKey::Category(ActionCategory::M))
        );
        assert_eq!(WeightKey::from_storage_key("bogus"), None);
    }
}
