use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Decline-control phrase rotation, in the order the designers wrote them.
/// The first entry is the label shown before any attempt.
pub const DEFAULT_PHRASES: &[&str] = &[
    "No",
    "Are you sure?",
    "Really?",
    "Think again!",
    "Wrong button!",
    "Try again!",
    "Nope, try Yes!",
    "Oops!",
    "Not this one!",
    "Missed!",
    "Nice try!",
];

/// Tuning knobs for the evasion/growth widget. Observed variants of the
/// widget differ only in these values, so every one of them is data here
/// rather than behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Decline attempts tolerated before the control vanishes.
    pub max_attempts: u32,
    /// Accept-control growth per attempt: `scale = 1 + n * growth_factor`.
    pub growth_factor: f32,
    /// Decline-control shrink per attempt.
    pub decline_shrink_per_attempt: f32,
    /// Smallest scale the decline control ever renders at.
    pub decline_scale_floor: f32,
    /// Label rotation; re-selection never repeats the current entry.
    pub phrases: Vec<String>,
    /// Delay between the final attempt and the control hiding, so the exit
    /// animation can play.
    pub hide_delay: Duration,
    /// When set, a relocation trigger (hover / touch-start) also advances
    /// the attempt counter. Off by default: only explicit activation counts.
    pub relocation_counts_as_attempt: bool,
    /// Footprint reserved for the decline control when randomizing.
    pub control_footprint: Size,
    /// Extra clearance kept between the control and the container edge.
    pub relocation_margin: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            growth_factor: 0.2,
            decline_shrink_per_attempt: 0.1,
            decline_scale_floor: 0.7,
            phrases: DEFAULT_PHRASES.iter().map(|s| s.to_string()).collect(),
            hide_delay: Duration::from_millis(500),
            relocation_counts_as_attempt: false,
            control_footprint: Size::new(120.0, 44.0),
            relocation_margin: 8.0,
        }
    }
}
