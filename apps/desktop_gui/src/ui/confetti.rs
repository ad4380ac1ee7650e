//! Particle backend for the celebration sequencer. Bursts arrive as
//! normalized emission specs; this system integrates and paints them. It is
//! cosmetic only; losing it never blocks the acceptance flow.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Vec2};
use interaction::{Burst, ParticleShape, Rgb};
use rand::Rng;

const GRAVITY: f32 = 320.0;
const DRAG: f32 = 0.6;

struct Particle {
    pos: Pos2,
    vel: Vec2,
    color: Rgb,
    shape: ParticleShape,
    size: f32,
    age: f32,
    ttl: f32,
}

#[derive(Default)]
pub struct ConfettiSystem {
    particles: Vec<Particle>,
}

impl ConfettiSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn spawn_burst<R: Rng>(
        &mut self,
        burst: &Burst,
        surface: Rect,
        palette: &[Rgb],
        rng: &mut R,
    ) {
        let origin = Pos2::new(
            surface.min.x + surface.width() * burst.origin.0,
            surface.min.y + surface.height() * burst.origin.1,
        );
        let half_spread = burst.spread_degrees / 2.0;

        for _ in 0..burst.particles {
            let angle =
                (burst.angle_degrees + rng.gen_range(-half_spread..=half_spread)).to_radians();
            let speed = rng.gen_range(280.0..=560.0) * burst.scalar;
            let color = if palette.is_empty() {
                [0xFF, 0x4D, 0x6D]
            } else {
                palette[rng.gen_range(0..palette.len())]
            };
            self.particles.push(Particle {
                pos: origin,
                // Screen y grows downward; emission angles point up.
                vel: Vec2::new(angle.cos() * speed, -angle.sin() * speed),
                color,
                shape: if rng.gen_bool(0.5) {
                    ParticleShape::Heart
                } else {
                    ParticleShape::Circle
                },
                size: rng.gen_range(5.0..=9.0) * burst.scalar,
                age: 0.0,
                ttl: rng.gen_range(1.6..=2.8),
            });
        }
    }

    pub fn update(&mut self, dt: f32, surface: Rect) {
        for particle in &mut self.particles {
            particle.vel.y += GRAVITY * dt;
            particle.vel *= 1.0 - (DRAG * dt).min(0.5);
            particle.pos += particle.vel * dt;
            particle.age += dt;
        }
        self.particles
            .retain(|p| p.age < p.ttl && p.pos.y < surface.max.y + 48.0);
    }

    pub fn paint(&self, painter: &Painter) {
        for particle in &self.particles {
            let fade = (1.0 - particle.age / particle.ttl).clamp(0.0, 1.0);
            let [r, g, b] = particle.color;
            let color = Color32::from_rgba_unmultiplied(r, g, b, (fade * 255.0) as u8);
            match particle.shape {
                ParticleShape::Circle => {
                    painter.circle_filled(particle.pos, particle.size * 0.5, color);
                }
                ParticleShape::Heart => {
                    painter.text(
                        particle.pos,
                        Align2::CENTER_CENTER,
                        "♥",
                        FontId::proportional(particle.size * 1.7),
                        color,
                    );
                }
            }
        }
    }
}
