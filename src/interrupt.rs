//! Early-abandonment policy.
//!
//! A policy is a tree of conditions over live search statistics, read once
//! from configuration and evaluated fresh on every iteration. The tree is
//! plain data: evaluating it twice on the same statistics gives the same
//! answer.
//!
//! The JSON form nests groups and leaves freely:
//!
//! ```json
//! {
//!   "enabled": true,
//!   "condition_set": {
//!     "logic": "OR",
//!     "conditions": [
//!       { "variable": "elapsed_time", "operator": ">", "value": 30 },
//!       { "logic": "AND", "conditions": [
//!         { "variable": "iteration", "operator": ">=", "value": 50000 },
//!         { "variable": "best_g_cost", "operator": "<", "value": 10 }
//!       ] }
//!     ]
//!   }
//! }
//! ```
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Live search statistics a condition can refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Wall-clock seconds since the solve started.
    ElapsedTime,
    /// Nodes popped from the open set so far.
    Iteration,
    OpenSetSize,
    /// Largest g cost (pairs removed) of any node popped so far.
    BestGCost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==", alias = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparison {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Greater => lhs > rhs,
            Comparison::Less => lhs < rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Logic {
    #[serde(rename = "AND", alias = "and", alias = "And")]
    And,
    #[serde(rename = "OR", alias = "or", alias = "Or")]
    Or,
}

/// A node of the condition tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Combines children with AND (all true) or OR (any true). An empty AND
    /// group is true and an empty OR group is false.
    Group {
        logic: Logic,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
    /// Compares one statistic against a threshold.
    Leaf {
        variable: Statistic,
        operator: Comparison,
        value: f64,
    },
}

impl Condition {
    pub fn leaf(variable: Statistic, operator: Comparison, value: f64) -> Self {
        Condition::Leaf {
            variable,
            operator,
            value,
        }
    }

    /// AND group.
    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::Group {
            logic: Logic::And,
            conditions,
        }
    }

    /// OR group.
    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Group {
            logic: Logic::Or,
            conditions,
        }
    }

    /// Evaluates the tree against `stats`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use sigmar_solver::interrupt::{Comparison, Condition, SearchStats, Statistic};
    ///
    /// let stats = SearchStats {
    ///     iterations: 120,
    ///     elapsed: Duration::from_secs(2),
    ///     ..Default::default()
    /// };
    /// let tree = Condition::all(vec![
    ///     Condition::leaf(Statistic::Iteration, Comparison::Greater, 100.0),
    ///     Condition::leaf(Statistic::ElapsedTime, Comparison::LessOrEqual, 5.0),
    /// ]);
    /// assert!(tree.evaluate(&stats));
    /// assert!(Condition::all(vec![]).evaluate(&stats));
    /// assert!(!Condition::any(vec![]).evaluate(&stats));
    /// ```
    pub fn evaluate(&self, stats: &SearchStats) -> bool {
        match self {
            Condition::Leaf {
                variable,
                operator,
                value,
            } => operator.apply(stats.value(*variable), *value),
            Condition::Group { logic, conditions } => match logic {
                Logic::And => conditions.iter().all(|c| c.evaluate(stats)),
                Logic::Or => conditions.iter().any(|c| c.evaluate(stats)),
            },
        }
    }

    /// Rejects thresholds that can never compare meaningfully.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Condition::Leaf {
                variable, value, ..
            } => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err(ConfigError::Invalid(format!(
                        "threshold for {:?} is not a finite number",
                        variable
                    )))
                }
            }
            Condition::Group { conditions, .. } => {
                conditions.iter().try_for_each(Condition::validate)
            }
        }
    }
}

/// Point-in-time statistics of a running search.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchStats {
    pub iterations: u64,
    pub open_set_size: usize,
    pub best_g_cost: u32,
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn value(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::ElapsedTime => self.elapsed.as_secs_f64(),
            Statistic::Iteration => self.iterations as f64,
            Statistic::OpenSetSize => self.open_set_size as f64,
            Statistic::BestGCost => f64::from(self.best_g_cost),
        }
    }
}

/// Interrupt policy with its top-level switch.
///
/// When `enabled` is false the search only ends when it is solved or
/// exhausted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterruptConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub condition_set: Option<Condition>,
}

impl InterruptConfig {
    pub fn disabled() -> Self {
        InterruptConfig::default()
    }

    pub fn new(condition_set: Condition) -> Self {
        InterruptConfig {
            enabled: true,
            condition_set: Some(condition_set),
        }
    }

    /// Adds a wall-clock limit, OR-ed with any active condition tree.
    pub fn with_time_limit(self, seconds: f64) -> Self {
        let limit = Condition::leaf(Statistic::ElapsedTime, Comparison::Greater, seconds);
        let tree = match (self.enabled, self.condition_set) {
            (true, Some(existing)) => Condition::any(vec![existing, limit]),
            _ => limit,
        };
        InterruptConfig::new(tree)
    }

    /// Whether the search should be abandoned given `stats`.
    pub fn should_interrupt(&self, stats: &SearchStats) -> bool {
        self.enabled
            && self
                .condition_set
                .as_ref()
                .map_or(false, |c| c.evaluate(stats))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.condition_set, self.enabled) {
            (None, true) => Err(ConfigError::Invalid(
                "interrupt is enabled but has no condition_set".to_string(),
            )),
            (Some(tree), _) => tree.validate(),
            (None, false) => Ok(()),
        }
    }
}
