//! Controller layer: UI events, error classification, and command
//! orchestration between the egui thread and the backend worker.

pub mod events;
pub mod orchestration;
