use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::protocol::ProposalRecord;

use crate::{
    config::InteractionConfig,
    geometry::{random_position_within, ContainerBounds, Point},
};

/// Read-only input to the interaction: what the recipient is looking at.
/// Immutable for the lifetime of the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalContent {
    pub valentine_name: String,
    pub custom_message: String,
    pub character_choice: String,
}

impl From<&ProposalRecord> for ProposalContent {
    fn from(record: &ProposalRecord) -> Self {
        Self {
            valentine_name: record.valentine_name.clone(),
            custom_message: record.custom_message.clone(),
            character_choice: record.character_choice.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclinePhase {
    Idle,
    Evading(u32),
    Vanishing,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptPhase {
    Normal,
    Growing(u32),
    Accepted,
}

/// The "Yes/No mischief" state machine. All transitions run synchronously
/// inside the caller's event handlers; time enters only as the elapsed
/// `Duration` the host passes in, so the machine is deterministic under a
/// seeded random source.
#[derive(Debug, Clone)]
pub struct ProposalInteraction {
    config: InteractionConfig,
    content: ProposalContent,
    attempts: u32,
    label_index: usize,
    position: Option<Point>,
    decline_visible: bool,
    hide_at: Option<Duration>,
    accepted: bool,
}

impl ProposalInteraction {
    pub fn new(content: ProposalContent, config: InteractionConfig) -> Self {
        Self {
            config,
            content,
            attempts: 0,
            label_index: 0,
            position: None,
            decline_visible: true,
            hide_at: None,
            accepted: false,
        }
    }

    pub fn content(&self) -> &ProposalContent {
        &self.content
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts
    }

    pub fn decline_label(&self) -> &str {
        self.config
            .phrases
            .get(self.label_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Top-left of the decline control within the reference container.
    /// `None` until the first relocation (the host renders its resting
    /// layout position in the meantime).
    pub fn decline_position(&self) -> Option<Point> {
        self.position
    }

    pub fn decline_visible(&self) -> bool {
        self.decline_visible
    }

    pub fn accepted(&self) -> bool {
        self.accepted
    }

    pub fn accept_scale(&self) -> f32 {
        1.0 + self.attempts as f32 * self.config.growth_factor
    }

    pub fn decline_scale(&self) -> f32 {
        (1.0 - self.attempts as f32 * self.config.decline_shrink_per_attempt)
            .max(self.config.decline_scale_floor)
    }

    pub fn decline_phase(&self) -> DeclinePhase {
        if !self.decline_visible {
            DeclinePhase::Hidden
        } else if self.attempts >= self.config.max_attempts {
            DeclinePhase::Vanishing
        } else if self.attempts == 0 {
            DeclinePhase::Idle
        } else {
            DeclinePhase::Evading(self.attempts)
        }
    }

    pub fn accept_phase(&self) -> AcceptPhase {
        if self.accepted {
            AcceptPhase::Accepted
        } else if self.attempts == 0 {
            AcceptPhase::Normal
        } else {
            AcceptPhase::Growing(self.attempts)
        }
    }

    /// Relocation trigger: the pointer entered the control's bounds or a
    /// touch started on it. Moves the control without consuming an attempt
    /// (unless the coupled-variant flag is configured on).
    pub fn approach<R: Rng>(
        &mut self,
        now: Duration,
        container: Option<ContainerBounds>,
        rng: &mut R,
    ) {
        if self.decline_frozen() {
            return;
        }
        self.relocate(container, rng);
        if self.config.relocation_counts_as_attempt {
            self.advance_attempt(now);
        }
    }

    /// Commit trigger: the decline control was explicitly activated. Label,
    /// growth, and position all change within this one call.
    pub fn commit_decline<R: Rng>(
        &mut self,
        now: Duration,
        container: Option<ContainerBounds>,
        rng: &mut R,
    ) {
        if self.decline_frozen() {
            return;
        }
        self.advance_attempt(now);
        self.reroll_label(rng);
        self.relocate(container, rng);
    }

    /// Accept trigger. Returns `true` exactly once, on the transition into
    /// the terminal accepted state; the host starts the celebration and
    /// fires its collaborator notification precisely then. Every later call
    /// is a no-op returning `false`.
    pub fn accept(&mut self) -> bool {
        if self.accepted {
            return false;
        }
        self.accepted = true;
        self.hide_at = None;
        true
    }

    /// Applies the scheduled hide once its deadline passes. Host calls this
    /// once per frame; dropping the widget cancels the schedule with it.
    pub fn tick(&mut self, now: Duration) {
        if self.accepted {
            return;
        }
        if let Some(deadline) = self.hide_at {
            if now >= deadline {
                self.decline_visible = false;
                self.hide_at = None;
            }
        }
    }

    fn decline_frozen(&self) -> bool {
        self.accepted || !self.decline_visible || self.attempts >= self.config.max_attempts
    }

    fn advance_attempt(&mut self, now: Duration) {
        self.attempts += 1;
        if self.attempts >= self.config.max_attempts {
            self.hide_at = Some(now + self.config.hide_delay);
        }
    }

    fn reroll_label<R: Rng>(&mut self, rng: &mut R) {
        let len = self.config.phrases.len();
        if len < 2 {
            // A one-entry (or empty) list degenerates to keeping the label.
            return;
        }
        let mut index = rng.gen_range(0..len - 1);
        if index >= self.label_index {
            index += 1;
        }
        self.label_index = index;
    }

    fn relocate<R: Rng>(&mut self, container: Option<ContainerBounds>, rng: &mut R) {
        // Unmeasurable geometry skips the move; the next trigger retries.
        let Some(bounds) = container else {
            return;
        };
        self.position = Some(random_position_within(
            bounds,
            self.config.control_footprint,
            self.config.relocation_margin,
            rng,
        ));
    }
}

#[cfg(test)]
#[path = "tests/machine_tests.rs"]
mod tests;
