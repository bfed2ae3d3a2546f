//! Turn-penalty scripting hook (spec §9 Open Question: "the turn-penalty
//! function is obtained from an external scripting hook in the source...
//! the spec requires the hook to be a pure function of the deviation from
//! straight angle").
//!
//! `EdgeBasedGraphFactory` (C5) is generic over this trait rather than
//! calling a hard-coded formula, mirroring the `Router`/`BuildObserver`
//! pluggability pattern used elsewhere in this kernel.

/// A pure function from "how far this turn deviates from going straight
/// ahead" (0° = straight, 180° = a full U-turn) to an additional weight
/// penalty, in the same units as edge weight.
pub trait TurnPenaltySource: Send + Sync {
    fn penalty(&self, deviation_from_straight_degrees: f64) -> u32;
}

/// Penalty grows linearly with deviation, capped at `max_penalty`. A
/// reasonable default when no profile-specific scripting hook is wired up.
pub struct LinearTurnPenalty {
    pub per_degree: f64,
    pub max_penalty: u32,
}

impl Default for LinearTurnPenalty {
    fn default() -> Self {
        Self { per_degree: 3.0, max_penalty: 600 }
    }
}

impl TurnPenaltySource for LinearTurnPenalty {
    fn penalty(&self, deviation_from_straight_degrees: f64) -> u32 {
        let raw = (deviation_from_straight_degrees.max(0.0) * self.per_degree).round();
        if raw >= self.max_penalty as f64 {
            self.max_penalty
        } else {
            raw as u32
        }
    }
}
