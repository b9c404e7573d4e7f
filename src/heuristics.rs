use crate::engine::{BoardState, Element};
use crate::rules;
use serde::{Deserialize, Serialize};

/// Coefficients of the board heuristic.
///
/// `HeuristicWeights::default()` holds the tuned values used when no
/// configuration is supplied. When the weights are read from a JSON mapping
/// every key is optional and a missing key means "no effect" (0.0); unknown
/// keys are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeuristicWeights {
    /// Multiplies the number of marbles still on the board.
    #[serde(default)]
    pub remaining_elements_factor: f64,
    /// Multiplies the number of marbles that cannot be removed right now.
    #[serde(default)]
    pub locked_marbles_penalty: f64,
    /// Subtracted once per salt marble still on the board.
    #[serde(default)]
    pub salt_marbles_reward: f64,
    /// Multiplies the number of metal marbles still on the board.
    #[serde(default)]
    pub metal_marbles_penalty: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        HeuristicWeights {
            remaining_elements_factor: 0.5,
            locked_marbles_penalty: 0.1,
            salt_marbles_reward: 1.0,
            metal_marbles_penalty: 1.5,
        }
    }
}

impl HeuristicWeights {
    /// Weights that make the heuristic constant zero (plain breadth-first by depth).
    pub fn zero() -> Self {
        HeuristicWeights {
            remaining_elements_factor: 0.0,
            locked_marbles_penalty: 0.0,
            salt_marbles_reward: 0.0,
            metal_marbles_penalty: 0.0,
        }
    }

    /// Names accepted by [`HeuristicWeights::get`] and [`HeuristicWeights::set`].
    pub const NAMES: [&'static str; 4] = [
        "remaining_elements_factor",
        "locked_marbles_penalty",
        "salt_marbles_reward",
        "metal_marbles_penalty",
    ];

    /// Reads a weight by its configuration key.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "remaining_elements_factor" => Some(self.remaining_elements_factor),
            "locked_marbles_penalty" => Some(self.locked_marbles_penalty),
            "salt_marbles_reward" => Some(self.salt_marbles_reward),
            "metal_marbles_penalty" => Some(self.metal_marbles_penalty),
            _ => None,
        }
    }

    /// Overwrites a weight by its configuration key. Returns `false` for an
    /// unknown key.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "remaining_elements_factor" => &mut self.remaining_elements_factor,
            "locked_marbles_penalty" => &mut self.locked_marbles_penalty,
            "salt_marbles_reward" => &mut self.salt_marbles_reward,
            "metal_marbles_penalty" => &mut self.metal_marbles_penalty,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Raw feature counts the heuristic is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoardFeatures {
    pub remaining: usize,
    pub locked: usize,
    pub salt: usize,
    pub metal: usize,
}

impl BoardFeatures {
    pub fn of(state: &BoardState) -> Self {
        BoardFeatures {
            remaining: state.present_count(),
            locked: rules::locked_cells(state),
            salt: state.count(Element::Salt),
            metal: state.metal_count(),
        }
    }
}

/// Scores a board; lower is closer to solved.
///
/// The value is the weighted sum of the remaining, locked and metal marble
/// counts minus the weighted salt count, clamped at zero. It is not an
/// admissible estimate, so searches driven by it are greedy best-first rather
/// than optimal.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sigmar_solver::heuristics::{evaluate, HeuristicWeights};
/// use sigmar_solver::topology::Topology;
/// use sigmar_solver::utils::board_from_str;
///
/// let topology = Arc::new(Topology::line(4).unwrap());
/// let board = board_from_str(topology, "FF12").unwrap();
/// let weights = HeuristicWeights {
///     remaining_elements_factor: 1.0,
///     metal_marbles_penalty: 2.0,
///     ..HeuristicWeights::zero()
/// };
/// assert_eq!(evaluate(&board, &weights), 4.0 + 2.0 * 2.0);
/// ```
pub fn evaluate(state: &BoardState, weights: &HeuristicWeights) -> f64 {
    score_features(&BoardFeatures::of(state), weights)
}

/// Applies `weights` to precomputed features.
pub fn score_features(features: &BoardFeatures, weights: &HeuristicWeights) -> f64 {
    let h = features.remaining as f64 * weights.remaining_elements_factor
        + features.locked as f64 * weights.locked_marbles_penalty
        - features.salt as f64 * weights.salt_marbles_reward
        + features.metal as f64 * weights.metal_marbles_penalty;
    h.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;
    use crate::utils::board_from_str;
    use std::sync::Arc;

    fn hexagon(codes: &str) -> BoardState {
        let topology = Arc::new(Topology::hexagon(1).unwrap());
        board_from_str(topology, codes).unwrap()
    }

    #[test]
    fn test_features_of_board() {
        // Centre is enclosed, gold is blocked by lead.
        let board = hexagon("1SFFFF6");
        let features = BoardFeatures::of(&board);
        assert_eq!(
            features,
            BoardFeatures {
                remaining: 7,
                locked: 2,
                salt: 1,
                metal: 2,
            }
        );
    }

    #[test]
    fn test_default_weights() {
        let features = BoardFeatures {
            remaining: 10,
            locked: 4,
            salt: 1,
            metal: 2,
        };
        let h = score_features(&features, &HeuristicWeights::default());
        let expected = 10.0 * 0.5 + 4.0 * 0.1 - 1.0 + 2.0 * 1.5;
        assert!((h - expected).abs() < 1e-9);
    }

    #[test]
    fn test_heuristic_never_negative() {
        let features = BoardFeatures {
            remaining: 2,
            locked: 0,
            salt: 2,
            metal: 0,
        };
        let weights = HeuristicWeights {
            salt_marbles_reward: 10.0,
            ..HeuristicWeights::zero()
        };
        assert_eq!(score_features(&features, &weights), 0.0);
    }

    #[test]
    fn test_empty_board_scores_zero() {
        let board = hexagon(".......");
        assert_eq!(evaluate(&board, &HeuristicWeights::default()), 0.0);
    }

    #[test]
    fn test_missing_json_keys_have_no_effect() {
        let weights: HeuristicWeights =
            serde_json::from_str(r#"{"metal_marbles_penalty": 2.5, "unknown": 9}"#).unwrap();
        assert_eq!(weights.metal_marbles_penalty, 2.5);
        assert_eq!(weights.remaining_elements_factor, 0.0);
        assert_eq!(weights.locked_marbles_penalty, 0.0);
        assert_eq!(weights.salt_marbles_reward, 0.0);
    }

    #[test]
    fn test_get_and_set_by_name() {
        let mut weights = HeuristicWeights::zero();
        for name in HeuristicWeights::NAMES {
            assert!(weights.set(name, 3.0));
            assert_eq!(weights.get(name), Some(3.0));
        }
        assert!(!weights.set("bogus", 1.0));
        assert_eq!(weights.get("bogus"), None);
    }
}
