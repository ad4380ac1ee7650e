//! Application shell: the builder view (compose + share) and the recipient
//! view (the interactive card), wired to the backend worker over channels.

use arboard::Clipboard;
use crossbeam_channel::{Receiver, Sender};
use egui::{vec2, Color32, CornerRadius, Margin, RichText, Stroke};
use serde::{Deserialize, Serialize};

use client_core::share;
use interaction::ProposalContent;
use shared::{
    domain::ProposalId,
    protocol::{CreateProposalRequest, PricingInfo, ProposalRecord, ServerEvent},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{
    classify_connect_failure, UiErrorCategory, UiErrorContext, UiEvent,
};
use crate::controller::orchestration::dispatch_backend_command as queue_command;
use crate::ui::card::{CardSignal, ProposalCard};
use crate::ui::characters::CHARACTER_CHOICES;

pub const SETTINGS_STORAGE_KEY: &str = "desktop_gui.settings";

const ACCENT: Color32 = Color32::from_rgb(0xFF, 0x4D, 0x6D);
const CHIP_FILL: Color32 = Color32::from_rgb(0xFF, 0xE3, 0xEA);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedGuiSettings {
    pub server_url: String,
    pub last_character: String,
}

impl Default for PersistedGuiSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8470".to_string(),
            last_character: "panda".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppView {
    Build,
    Recipient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

struct GeneratedShare {
    record: ProposalRecord,
    link: String,
    code: String,
    answered: Option<bool>,
}

pub struct ValentineApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    server_url: String,
    connected: bool,
    pricing: Option<PricingInfo>,

    view: AppView,

    valentine_name: String,
    custom_message: String,
    selected_character: String,
    creating: bool,
    generated: Option<GeneratedShare>,
    preview_card: Option<ProposalCard>,

    open_input: String,
    pending_open: Option<ProposalId>,
    loading_proposal: bool,
    recipient_card: Option<ProposalCard>,
    loaded_record: Option<ProposalRecord>,

    status: String,
    status_banner: Option<StatusBanner>,
}

impl ValentineApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedGuiSettings>,
        server_url_override: Option<String>,
        initial_open: Option<String>,
    ) -> Self {
        let persisted = persisted.unwrap_or_default();
        let server_url = server_url_override.unwrap_or(persisted.server_url);

        let mut app = Self {
            cmd_tx,
            ui_rx,
            server_url,
            connected: false,
            pricing: None,
            view: AppView::Build,
            valentine_name: String::new(),
            custom_message: String::new(),
            selected_character: persisted.last_character,
            creating: false,
            generated: None,
            preview_card: None,
            open_input: String::new(),
            pending_open: None,
            loading_proposal: false,
            recipient_card: None,
            loaded_record: None,
            status: "Starting...".to_string(),
            status_banner: None,
        };

        queue_command(
            &app.cmd_tx,
            BackendCommand::Connect {
                server_url: app.server_url.clone(),
            },
            &mut app.status,
        );

        if let Some(target) = initial_open {
            app.view = AppView::Recipient;
            app.open_input = target.clone();
            match share::decode_share_target(&target) {
                Some(id) => app.pending_open = Some(id),
                None => app.status = "Could not read the shared link or code".to_string(),
            }
        }

        app
    }

    pub fn settings(&self) -> PersistedGuiSettings {
        PersistedGuiSettings {
            server_url: self.server_url.clone(),
            last_character: self.selected_character.clone(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Connected { pricing } => {
                    self.connected = true;
                    self.pricing = Some(pricing);
                    self.status = format!("Connected to {}", self.server_url);
                    self.status_banner = None;
                    if let Some(proposal_id) = self.pending_open.take() {
                        self.loading_proposal = true;
                        queue_command(
                            &self.cmd_tx,
                            BackendCommand::FetchProposal { proposal_id },
                            &mut self.status,
                        );
                    }
                }
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::ProposalCreated(record) => {
                    self.creating = false;
                    let link = share::share_link(&self.server_url, &record.id);
                    let code = share::encode_share_code(&record.id);
                    self.status = format!("Proposal link ready for {}", record.valentine_name);
                    self.generated = Some(GeneratedShare {
                        record,
                        link,
                        code,
                        answered: None,
                    });
                }
                UiEvent::ProposalLoaded(record) => {
                    self.loading_proposal = false;
                    if record.paid {
                        self.recipient_card =
                            Some(ProposalCard::new(ProposalContent::from(&record), false));
                        self.status = "Proposal loaded".to_string();
                    } else {
                        self.recipient_card = None;
                        self.status = "This proposal is still awaiting checkout".to_string();
                    }
                    self.loaded_record = Some(record);
                }
                UiEvent::AnswerRecorded(record) => {
                    self.status = if record.accepted == Some(true) {
                        "Answer delivered 💘".to_string()
                    } else {
                        "Answer recorded".to_string()
                    };
                }
                UiEvent::Server(server_event) => {
                    if let ServerEvent::ProposalAnswered {
                        proposal_id,
                        accepted,
                        ..
                    } = server_event
                    {
                        if let Some(generated) = self.generated.as_mut() {
                            if generated.record.id == proposal_id {
                                generated.answered = Some(accepted);
                                self.status = if accepted {
                                    format!("{} said yes! 💘", generated.record.valentine_name)
                                } else {
                                    format!("{} has answered", generated.record.valentine_name)
                                };
                            }
                        }
                    }
                }
                UiEvent::Error(err) => {
                    self.creating = false;
                    self.loading_proposal = false;
                    if err.context() == UiErrorContext::Connect {
                        self.connected = false;
                        self.status = classify_connect_failure(err.message());
                    } else {
                        self.status =
                            format!("{} error: {}", err_label(err.category()), err.message());
                    }
                    if matches!(
                        err.context(),
                        UiErrorContext::Connect
                            | UiErrorContext::CreateProposal
                            | UiErrorContext::BackendStartup
                    ) {
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: self.status.clone(),
                        });
                    }
                }
            }
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    Color32::from_rgb(111, 53, 53),
                    Stroke::new(1.0, Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(RichText::new(&banner.message).color(Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("♥").size(20.0).color(ACCENT));
                ui.label(RichText::new("Valentine Proposal Studio").size(17.0).strong());
                ui.separator();

                ui.selectable_value(&mut self.view, AppView::Build, "Compose");
                ui.selectable_value(&mut self.view, AppView::Recipient, "Open a proposal");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let (dot, color) = if self.connected {
                        ("●", Color32::from_rgb(67, 181, 129))
                    } else {
                        ("●", Color32::GRAY)
                    };
                    ui.label(RichText::new(dot).color(color));
                    if ui.button("Reconnect").clicked() {
                        self.connected = false;
                        queue_command(
                            &self.cmd_tx,
                            BackendCommand::Connect {
                                server_url: self.server_url.clone(),
                            },
                            &mut self.status,
                        );
                    }
                    ui.add(
                        egui::TextEdit::singleline(&mut self.server_url)
                            .id_salt("server_url")
                            .desired_width(220.0),
                    );
                    ui.small("Server");
                });
            });
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.small("Status:");
                ui.small(RichText::new(&self.status).weak());
            });
        });
    }

    fn show_build_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let avail = ui.available_size();
                let card_width = avail.x.clamp(440.0, 560.0);
                ui.add_space((avail.y * 0.06).clamp(10.0, 48.0));

                ui.vertical_centered(|ui| {
                    ui.set_width(card_width);
                    egui::Frame::NONE
                        .fill(ui.visuals().faint_bg_color)
                        .corner_radius(14.0)
                        .stroke(Stroke::new(
                            1.0,
                            ui.visuals().widgets.noninteractive.bg_stroke.color,
                        ))
                        .inner_margin(Margin::symmetric(20, 18))
                        .show(ui, |ui| {
                            ui.style_mut().spacing.item_spacing = vec2(10.0, 10.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new("💌").size(24.0));
                                ui.vertical(|ui| {
                                    ui.heading("Create your proposal");
                                    ui.weak("Fill in the details and share the link.");
                                });
                            });
                            ui.add_space(4.0);
                            self.show_status_banner(ui);

                            if self.generated.is_none() {
                                self.show_builder_form(ui);
                            } else {
                                self.show_share_panel(ui);
                            }
                        });

                    if self.preview_card.is_some() {
                        ui.add_space(14.0);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("Preview").strong());
                            if ui.button("Close preview").clicked() {
                                self.preview_card = None;
                            }
                        });
                        ui.add_space(4.0);
                        if let Some(card) = self.preview_card.as_mut() {
                            // Preview accepts play the full celebration but
                            // never notify the server.
                            let _ = card.show(ui);
                        }
                    }
                });
            });
        });
    }

    fn show_builder_form(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Valentine's name").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.valentine_name)
                .id_salt("valentine_name")
                .hint_text("Enter their name...")
                .desired_width(f32::INFINITY),
        );

        ui.label(RichText::new("Custom message (optional)").strong());
        ui.add(
            egui::TextEdit::multiline(&mut self.custom_message)
                .id_salt("custom_message")
                .hint_text("Will you be my Valentine?")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        ui.label(RichText::new("Choose a character").strong());
        ui.horizontal(|ui| {
            for art in &CHARACTER_CHOICES {
                let selected = self.selected_character == art.key;
                let mut chip = egui::Button::new(
                    RichText::new(format!("{} {}", art.emoji, art.display_name)).size(15.0),
                )
                .corner_radius(CornerRadius::same(12))
                .min_size(vec2(0.0, 34.0));
                if selected {
                    chip = chip.fill(CHIP_FILL).stroke(Stroke::new(1.5, ACCENT));
                }
                if ui.add(chip).clicked() {
                    self.selected_character = art.key.to_string();
                }
            }
        });

        if let Some(pricing) = &self.pricing {
            ui.small(format!(
                "Web checkout price: {} · studio links are free",
                pricing.display_price
            ));
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let can_submit = self.connected && !self.creating;
            let create = egui::Button::new(
                RichText::new(if self.creating {
                    "Creating magic..."
                } else {
                    "♥ Generate proposal link"
                })
                .strong()
                .size(16.0)
                .color(Color32::WHITE),
            )
            .fill(ACCENT)
            .corner_radius(CornerRadius::same(18))
            .min_size(vec2(ui.available_width() * 0.62, 40.0));
            if ui.add_enabled(can_submit, create).clicked() {
                self.try_create_proposal();
            }

            if ui
                .add(egui::Button::new("Preview").min_size(vec2(0.0, 40.0)))
                .clicked()
            {
                self.preview_card = Some(ProposalCard::new(self.draft_content(), true));
            }
        });
    }

    fn show_share_panel(&mut self, ui: &mut egui::Ui) {
        let Some(generated) = self.generated.as_ref() else {
            return;
        };
        let link = generated.link.clone();
        let code = generated.code.clone();
        let record = generated.record.clone();
        let answered = generated.answered;

        ui.vertical_centered(|ui| {
            ui.label(RichText::new("♥").size(40.0).color(ACCENT));
            ui.label(RichText::new("Your proposal is ready!").strong().size(18.0));
            ui.small(format!(
                "Share this link with {} and watch the magic happen. Created {}.",
                record.valentine_name,
                record.created_at.format("%b %e, %Y")
            ));
        });

        egui::Frame::NONE
            .fill(CHIP_FILL.gamma_multiply(0.5))
            .corner_radius(10.0)
            .inner_margin(Margin::symmetric(12, 10))
            .show(ui, |ui| {
                ui.label(RichText::new(&link).monospace().size(13.0));
                ui.small(format!("Share code: {code}"));
            });

        ui.horizontal(|ui| {
            if ui.button("Copy link").clicked() {
                self.copy_to_clipboard(ui, &link, "link");
            }
            if ui.button("Copy share code").clicked() {
                self.copy_to_clipboard(ui, &code, "share code");
            }
            if ui.button("Preview").clicked() {
                self.preview_card =
                    Some(ProposalCard::new(ProposalContent::from(&record), true));
            }
            if ui.button("Open as recipient").clicked() {
                self.view = AppView::Recipient;
                self.open_input = link.clone();
                self.loading_proposal = true;
                queue_command(
                    &self.cmd_tx,
                    BackendCommand::FetchProposal {
                        proposal_id: record.id.clone(),
                    },
                    &mut self.status,
                );
            }
        });

        match answered {
            Some(true) => {
                ui.label(
                    RichText::new(format!("{} said YES! 💘", record.valentine_name))
                        .strong()
                        .size(18.0)
                        .color(ACCENT),
                );
            }
            Some(false) => {
                ui.label(RichText::new("They answered. Ask them about it!").weak());
            }
            None => {
                ui.small("Waiting for an answer... this panel updates live.");
            }
        }

        ui.separator();
        if ui.button("Create another proposal").clicked() {
            self.generated = None;
            self.preview_card = None;
            self.valentine_name.clear();
            self.custom_message.clear();
        }
    }

    fn show_recipient_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                ui.vertical_centered(|ui| {
                    ui.set_width(ui.available_width().clamp(440.0, 560.0));

                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.open_input)
                                .id_salt("open_input")
                                .hint_text("Paste a proposal link or share code...")
                                .desired_width(ui.available_width() - 70.0),
                        );
                        if ui.button("Open").clicked() {
                            self.try_open_proposal();
                        }
                    });
                    ui.add_space(12.0);

                    if self.loading_proposal {
                        ui.spinner();
                        ui.small("Fetching the proposal...");
                    }

                    let mut accepted_id = None;
                    if let Some(card) = self.recipient_card.as_mut() {
                        if let Some(CardSignal::Accepted) = card.show(ui) {
                            accepted_id = self
                                .loaded_record
                                .as_ref()
                                .map(|record| record.id.clone());
                        }
                    } else if let Some(record) = &self.loaded_record {
                        if !record.paid {
                            ui.label(
                                RichText::new(
                                    "This proposal hasn't finished checkout yet. Ask the sender to complete payment.",
                                )
                                .weak(),
                            );
                        }
                    }

                    if let Some(proposal_id) = accepted_id {
                        queue_command(
                            &self.cmd_tx,
                            BackendCommand::AnswerProposal {
                                proposal_id,
                                accepted: true,
                            },
                            &mut self.status,
                        );
                    }
                });
            });
        });
    }

    fn try_create_proposal(&mut self) {
        let name = self.valentine_name.trim().to_string();
        if name.is_empty() {
            self.status = "Please enter your Valentine's name".to_string();
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: "Please enter your Valentine's name.".to_string(),
            });
            return;
        }

        let message = self.custom_message.trim();
        let request = CreateProposalRequest {
            valentine_name: name,
            custom_message: (!message.is_empty()).then(|| message.to_string()),
            character_choice: self.selected_character.clone(),
        };
        self.creating = true;
        self.status_banner = None;
        self.status = "Creating your proposal...".to_string();
        queue_command(
            &self.cmd_tx,
            BackendCommand::CreateProposal { request },
            &mut self.status,
        );
    }

    fn try_open_proposal(&mut self) {
        match share::decode_share_target(&self.open_input) {
            Some(proposal_id) => {
                self.recipient_card = None;
                self.loaded_record = None;
                self.loading_proposal = true;
                queue_command(
                    &self.cmd_tx,
                    BackendCommand::FetchProposal { proposal_id },
                    &mut self.status,
                );
            }
            None => {
                self.status = "Could not read that link or share code".to_string();
            }
        }
    }

    fn draft_content(&self) -> ProposalContent {
        let message = self.custom_message.trim();
        ProposalContent {
            valentine_name: if self.valentine_name.trim().is_empty() {
                "Valentine".to_string()
            } else {
                self.valentine_name.trim().to_string()
            },
            custom_message: if message.is_empty() {
                shared::domain::DEFAULT_CUSTOM_MESSAGE.to_string()
            } else {
                message.to_string()
            },
            character_choice: self.selected_character.clone(),
        }
    }

    fn copy_to_clipboard(&mut self, ui: &egui::Ui, text: &str, label: &str) {
        if let Ok(mut clipboard) = Clipboard::new() {
            if clipboard.set_text(text.to_string()).is_ok() {
                self.status = format!("Copied {label} to clipboard");
                return;
            }
        }
        ui.ctx().copy_text(text.to_string());
        self.status = format!("Copied {label} to clipboard");
    }

    fn animating(&self) -> bool {
        self.preview_card
            .as_ref()
            .map(ProposalCard::animating)
            .unwrap_or(false)
            || self
                .recipient_card
                .as_ref()
                .map(ProposalCard::animating)
                .unwrap_or(false)
    }
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::NotFound => "Lookup",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

impl eframe::App for ValentineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.show_top_bar(ctx);
        match self.view {
            AppView::Build => self.show_build_view(ctx),
            AppView::Recipient => self.show_recipient_view(ctx),
        }

        if self.animating() {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.settings()) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::events::UiError;
    use crossbeam_channel::bounded;
    use shared::domain::PaymentState;

    fn test_app() -> (ValentineApp, Sender<UiEvent>) {
        let (cmd_tx, _cmd_rx) = bounded(16);
        let (ui_tx, ui_rx) = bounded(16);
        let app = ValentineApp::new(cmd_tx, ui_rx, None, None, None);
        (app, ui_tx)
    }

    fn sample_record(id: &str, name: &str) -> ProposalRecord {
        ProposalRecord {
            id: ProposalId(id.to_string()),
            valentine_name: name.to_string(),
            custom_message: "Will you be my Valentine?".to_string(),
            character_choice: "bear".to_string(),
            created_at: "2026-02-10T12:00:00Z".parse().expect("timestamp"),
            accepted: None,
            accepted_at: None,
            paid: true,
            payment_state: PaymentState::Completed,
        }
    }

    #[test]
    fn created_proposal_populates_share_links() {
        let (mut app, ui_tx) = test_app();
        ui_tx
            .send(UiEvent::ProposalCreated(sample_record("abc-1", "Asha")))
            .expect("send");
        app.process_ui_events();

        let generated = app.generated.as_ref().expect("share panel state");
        assert!(generated.link.ends_with("/proposal/abc-1"));
        assert_eq!(
            share::decode_share_target(&generated.code),
            Some(ProposalId("abc-1".to_string()))
        );
        assert!(!app.creating);
    }

    #[test]
    fn live_answer_event_updates_the_generated_share() {
        let (mut app, ui_tx) = test_app();
        ui_tx
            .send(UiEvent::ProposalCreated(sample_record("abc-2", "Mira")))
            .expect("send");
        ui_tx
            .send(UiEvent::Server(ServerEvent::ProposalAnswered {
                proposal_id: ProposalId("abc-2".to_string()),
                accepted: true,
                answered_at: "2026-02-14T18:00:00Z".parse().expect("timestamp"),
            }))
            .expect("send");
        app.process_ui_events();

        assert_eq!(app.generated.as_ref().expect("share").answered, Some(true));
        assert!(app.status.contains("Mira"));
    }

    #[test]
    fn connect_errors_raise_the_status_banner() {
        let (mut app, ui_tx) = test_app();
        ui_tx
            .send(UiEvent::Error(UiError::from_message(
                UiErrorContext::Connect,
                "error sending request: connection refused",
            )))
            .expect("send");
        app.process_ui_events();

        assert!(!app.connected);
        assert!(app.status_banner.is_some());
        assert_eq!(app.status, "Server unreachable; check URL/network and retry.");
    }

    #[test]
    fn unpaid_proposals_do_not_build_a_card() {
        let (mut app, ui_tx) = test_app();
        let mut record = sample_record("abc-3", "Noor");
        record.paid = false;
        record.payment_state = PaymentState::Pending;
        ui_tx.send(UiEvent::ProposalLoaded(record)).expect("send");
        app.process_ui_events();

        assert!(app.recipient_card.is_none());
        assert!(app.loaded_record.is_some());
    }
}
