//! Lending rules configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Loan period, late fee and wear settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LendingConfig {
    /// Days between lending a copy and its due date
    pub loan_period_days: u32,

    /// Fee reported per whole day a copy comes back late
    pub fee_per_day: i64,

    /// Upper bound of the condition loss applied on each return
    pub max_wear: i32,

    /// Condition given to copies added without an explicit value
    pub initial_condition: i32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            loan_period_days: 15,
            fee_per_day: 10,
            max_wear: 2,
            initial_condition: 10,
        }
    }
}

impl ConfigSection for LendingConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.loan_period_days, 1, 365, "lending.loan_period_days"),
            Validator::in_range(self.fee_per_day, 0, 1000, "lending.fee_per_day"),
            Validator::in_range(self.max_wear, 0, 10, "lending.max_wear"),
            Validator::at_least(self.initial_condition, 0, "lending.initial_condition"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.loan_period_days = other.loan_period_days;
        self.fee_per_day = other.fee_per_day;
        self.max_wear = other.max_wear;
        self.initial_condition = other.initial_condition;
    }

    fn section_name(&self) -> &'static str {
        "lending"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LendingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.loan_period_days, 15);
        assert_eq!(config.fee_per_day, 10);
        assert_eq!(config.max_wear, 2);
        assert_eq!(config.initial_condition, 10);
    }

    #[test]
    fn test_loan_period_bounds() {
        let mut config = LendingConfig::default();
        config.loan_period_days = 0;
        assert!(config.validate().is_err());

        config.loan_period_days = 366;
        assert!(config.validate().is_err());

        config.loan_period_days = 365;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_all_invalid_fields_reported() {
        let config = LendingConfig {
            loan_period_days: 0,
            fee_per_day: -1,
            max_wear: 11,
            initial_condition: -5,
        };

        let errors = config.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "lending.loan_period_days",
                "lending.fee_per_day",
                "lending.max_wear",
                "lending.initial_condition",
            ]
        );
    }

    #[test]
    fn test_merge() {
        let mut base = LendingConfig::default();
        base.merge(LendingConfig {
            loan_period_days: 30,
            ..LendingConfig::default()
        });
        assert_eq!(base.loan_period_days, 30);
    }
}
