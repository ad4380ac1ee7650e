//! The proposal card: heading, message, character art, and the mischief
//! controls, all driven by the `interaction` crate. The card owns its
//! random source, celebration handle, and confetti particles, so tearing
//! the card down cancels every pending effect with it.

use std::time::Duration;

use egui::{
    pos2, vec2, Align2, Color32, CornerRadius, FontId, Id, LayerId, Margin, Order, Rect, RichText,
    Sense, Stroke,
};
use interaction::{
    CelebrationConfig, CelebrationSequencer, ContainerBounds, DeclinePhase, InteractionConfig,
    ProposalContent, ProposalInteraction,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::ui::{characters, confetti::ConfettiSystem};

const CARD_FILL: Color32 = Color32::from_rgb(0xFF, 0xF5, 0xF8);
const ACCENT: Color32 = Color32::from_rgb(0xFF, 0x4D, 0x6D);
const SOFT_PINK: Color32 = Color32::from_rgb(0xFF, 0x8F, 0xA3);
const TEXT_DARK: Color32 = Color32::from_rgb(0x4A, 0x40, 0x44);
const CONTROLS_HEIGHT: f32 = 185.0;

pub enum CardSignal {
    Accepted,
}

pub struct ProposalCard {
    interaction: ProposalInteraction,
    celebration: Option<CelebrationSequencer>,
    confetti: ConfettiSystem,
    rng: StdRng,
    epoch: Option<f64>,
    decline_hovered: bool,
    preview: bool,
}

impl ProposalCard {
    pub fn new(content: ProposalContent, preview: bool) -> Self {
        Self {
            interaction: ProposalInteraction::new(content, InteractionConfig::default()),
            celebration: None,
            confetti: ConfettiSystem::new(),
            rng: StdRng::from_entropy(),
            epoch: None,
            decline_hovered: false,
            preview,
        }
    }

    pub fn content(&self) -> &ProposalContent {
        self.interaction.content()
    }

    pub fn accepted(&self) -> bool {
        self.interaction.accepted()
    }

    /// True while something on the card still needs per-frame updates.
    pub fn animating(&self) -> bool {
        self.celebration.is_some()
            || !self.confetti.is_empty()
            || self.interaction.decline_phase() == DeclinePhase::Vanishing
    }

    /// Renders the card and reports the acceptance transition exactly once.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<CardSignal> {
        let clock = ui.input(|i| i.time);
        let epoch = *self.epoch.get_or_insert(clock);
        let now = Duration::from_secs_f64((clock - epoch).max(0.0));

        self.interaction.tick(now);

        let mut signal = None;
        let accepted = self.interaction.accepted();

        egui::Frame::NONE
            .fill(CARD_FILL)
            .stroke(Stroke::new(1.0, SOFT_PINK.gamma_multiply(0.5)))
            .corner_radius(18.0)
            .inner_margin(Margin::symmetric(24, 20))
            .show(ui, |ui| {
                ui.set_width(ui.available_width().clamp(320.0, 460.0));
                ui.vertical_centered(|ui| {
                    if self.preview {
                        ui.label(
                            RichText::new("PREVIEW")
                                .size(11.0)
                                .strong()
                                .color(Color32::WHITE)
                                .background_color(ACCENT),
                        );
                        ui.add_space(6.0);
                    }

                    let art = characters::character_art(&self.content().character_choice);
                    ui.label(RichText::new(art.emoji).size(72.0));
                    ui.add_space(8.0);

                    if !accepted {
                        ui.label(
                            RichText::new(format!("{},", self.content().valentine_name))
                                .size(26.0)
                                .strong()
                                .color(ACCENT),
                        );
                        ui.label(
                            RichText::new(self.content().custom_message.clone())
                                .size(19.0)
                                .color(TEXT_DARK),
                        );
                        ui.add_space(10.0);
                        self.show_controls(ui, now, &mut signal);
                    } else {
                        ui.add_space(6.0);
                        ui.label(RichText::new("Yay! 🎉").size(32.0).strong().color(ACCENT));
                        ui.label(
                            RichText::new("See you on the 14th!")
                                .size(20.0)
                                .color(TEXT_DARK),
                        );
                        ui.add_space(8.0);
                        ui.label(RichText::new("♥").size(64.0).color(ACCENT));
                    }
                });
            });

        self.drive_celebration(ui.ctx(), now);
        signal
    }

    fn show_controls(&mut self, ui: &mut egui::Ui, now: Duration, signal: &mut Option<CardSignal>) {
        let (container, _) = ui.allocate_exact_size(
            vec2(ui.available_width(), CONTROLS_HEIGHT),
            Sense::hover(),
        );
        let bounds = Some(ContainerBounds::new(container.width(), container.height()));

        // Accept control, centered, growing with every dodge.
        let scale = self.interaction.accept_scale();
        let yes_size = vec2(126.0 * scale, 42.0 * scale);
        let yes_rect = Rect::from_center_size(
            pos2(container.center().x, container.min.y + 12.0 + yes_size.y / 2.0),
            yes_size,
        );
        let yes = ui.put(
            yes_rect,
            egui::Button::new(
                RichText::new("Yes! ♥")
                    .size(18.0 * scale)
                    .strong()
                    .color(Color32::WHITE),
            )
            .fill(ACCENT)
            .corner_radius(CornerRadius::same(24)),
        );
        if yes.clicked() && self.interaction.accept() {
            self.celebration = Some(CelebrationSequencer::new(CelebrationConfig::default(), now));
            *signal = Some(CardSignal::Accepted);
        }

        // Decline control: runs away, shrinks, teases, then vanishes.
        if self.interaction.decline_visible() {
            let footprint = self.interaction.config().control_footprint;
            let decline_scale = self.interaction.decline_scale();
            let no_size = vec2(
                footprint.width * decline_scale,
                footprint.height * decline_scale,
            );
            let top_left = match self.interaction.decline_position() {
                Some(p) => container.min + vec2(p.x, p.y),
                None => pos2(
                    container.min.x + container.width() * 0.58,
                    container.min.y + 104.0,
                ),
            };
            let no = ui.put(
                Rect::from_min_size(top_left, no_size),
                egui::Button::new(
                    RichText::new(self.interaction.decline_label())
                        .size(15.0 * decline_scale)
                        .color(Color32::WHITE),
                )
                .fill(SOFT_PINK)
                .corner_radius(CornerRadius::same(20)),
            );

            if no.clicked() {
                self.interaction.commit_decline(now, bounds, &mut self.rng);
                self.decline_hovered = false;
            } else {
                let hovered = no.hovered();
                if hovered && !self.decline_hovered {
                    self.interaction.approach(now, bounds, &mut self.rng);
                }
                self.decline_hovered = hovered;
            }
        } else {
            ui.painter().text(
                pos2(container.center().x, container.max.y - 28.0),
                Align2::CENTER_CENTER,
                "There's only one choice now... 💕",
                FontId::proportional(14.0),
                TEXT_DARK.gamma_multiply(0.6),
            );
        }
    }

    fn drive_celebration(&mut self, ctx: &egui::Context, now: Duration) {
        let surface = ctx.screen_rect();

        if let Some(sequencer) = self.celebration.as_mut() {
            let bursts = sequencer.frame(now);
            let palette = sequencer.config().palette.clone();
            for burst in &bursts {
                self.confetti.spawn_burst(burst, surface, &palette, &mut self.rng);
            }
            if sequencer.finished(now) && self.confetti.is_empty() {
                self.celebration = None;
            }
        }

        if !self.confetti.is_empty() {
            let dt = ctx.input(|i| i.stable_dt).min(0.05);
            self.confetti.update(dt, surface);
            let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("confetti")));
            self.confetti.paint(&painter);
        }

        if self.animating() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}
