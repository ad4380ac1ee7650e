//! Interaction core for the proposal card: the evasion/growth state machine
//! behind the "Yes/No" controls and the celebration burst sequencer. No I/O
//! and no clocks live here; hosts inject elapsed time and a random source,
//! which keeps every transition deterministic under a seeded generator.

pub mod celebration;
pub mod config;
pub mod geometry;
pub mod machine;

pub use celebration::{
    Burst, CelebrationConfig, CelebrationSequencer, ParticleShape, Rgb, HEART_PALETTE,
};
pub use config::{InteractionConfig, DEFAULT_PHRASES};
pub use geometry::{ContainerBounds, Point, Size};
pub use machine::{AcceptPhase, DeclinePhase, ProposalContent, ProposalInteraction};
