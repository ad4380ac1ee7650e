use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type Rgb = [u8; 3];

/// Valentine palette shared by every burst.
pub const HEART_PALETTE: [Rgb; 5] = [
    [0xFF, 0x4D, 0x6D],
    [0xFF, 0x8F, 0xA3],
    [0xFF, 0xB6, 0xC1],
    [0xFF, 0x69, 0xB4],
    [0xFF, 0x14, 0x93],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleShape {
    Heart,
    Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelebrationConfig {
    /// Total run time of the side-burst loop after acceptance.
    pub duration: Duration,
    pub opening_particles: u32,
    pub opening_spread_degrees: f32,
    /// Normalized origin of the opening burst, (0,0) top-left, (1,1)
    /// bottom-right of the host surface.
    pub opening_origin: (f32, f32),
    pub opening_scalar: f32,
    pub side_particles: u32,
    /// Emission angle of the left-edge burst; the right edge mirrors it
    /// (180° minus this value). 90° points straight up.
    pub side_angle_degrees: f32,
    pub side_spread_degrees: f32,
    pub side_scalar: f32,
    pub palette: Vec<Rgb>,
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(5000),
            opening_particles: 100,
            opening_spread_degrees: 100.0,
            opening_origin: (0.5, 0.6),
            opening_scalar: 1.5,
            side_particles: 3,
            side_angle_degrees: 60.0,
            side_spread_degrees: 55.0,
            side_scalar: 1.2,
            palette: HEART_PALETTE.to_vec(),
        }
    }
}

/// One emission request handed to the particle backend. Origins are
/// normalized to the host surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub origin: (f32, f32),
    pub angle_degrees: f32,
    pub spread_degrees: f32,
    pub particles: u32,
    pub scalar: f32,
}

/// Plans the post-acceptance confetti: a single wide opening burst, then a
/// pair of symmetric edge bursts every animation frame until the configured
/// duration elapses. Purely a plan; the host owns rendering, and dropping
/// the sequencer cancels everything still pending, so a missing or failed
/// particle backend cannot block the acceptance transition.
#[derive(Debug, Clone)]
pub struct CelebrationSequencer {
    config: CelebrationConfig,
    started_at: Duration,
    opening_emitted: bool,
}

impl CelebrationSequencer {
    pub fn new(config: CelebrationConfig, now: Duration) -> Self {
        Self {
            config,
            started_at: now,
            opening_emitted: false,
        }
    }

    pub fn config(&self) -> &CelebrationConfig {
        &self.config
    }

    pub fn finished(&self, now: Duration) -> bool {
        now.saturating_sub(self.started_at) >= self.config.duration
    }

    /// Emission plan for the current animation frame. The first call after
    /// acceptance carries the opening burst in addition to the side pair;
    /// once the run is over the plan is empty forever. Frame throttling by
    /// the host (e.g. a backgrounded window) just stretches the gaps
    /// between calls, which is acceptable degraded behavior.
    pub fn frame(&mut self, now: Duration) -> Vec<Burst> {
        if self.finished(now) {
            return Vec::new();
        }

        let mut bursts = Vec::with_capacity(3);
        if !self.opening_emitted {
            self.opening_emitted = true;
            bursts.push(Burst {
                origin: self.config.opening_origin,
                angle_degrees: 90.0,
                spread_degrees: self.config.opening_spread_degrees,
                particles: self.config.opening_particles,
                scalar: self.config.opening_scalar,
            });
        }

        bursts.push(Burst {
            origin: (0.0, 0.5),
            angle_degrees: self.config.side_angle_degrees,
            spread_degrees: self.config.side_spread_degrees,
            particles: self.config.side_particles,
            scalar: self.config.side_scalar,
        });
        bursts.push(Burst {
            origin: (1.0, 0.5),
            angle_degrees: 180.0 - self.config.side_angle_degrees,
            spread_degrees: self.config.side_spread_degrees,
            particles: self.config.side_particles,
            scalar: self.config.side_scalar,
        });
        bursts
    }
}

#[cfg(test)]
#[path = "tests/celebration_tests.rs"]
mod tests;
