use clap::Parser;
use crossbeam_channel::bounded;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::spawn_backend_thread;
use controller::events::UiEvent;
use ui::app::{PersistedGuiSettings, ValentineApp, SETTINGS_STORAGE_KEY};

/// Desktop studio for composing and opening Valentine proposals.
#[derive(Debug, Parser)]
#[command(name = "valentine-desktop")]
struct Args {
    /// Proposal server base URL; overrides the persisted setting.
    #[arg(long)]
    server_url: Option<String>,
    /// Proposal link or share code to open straight into the recipient view.
    #[arg(long)]
    open: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    spawn_backend_thread(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Valentine Proposal Studio")
            .with_inner_size([1080.0, 760.0])
            .with_min_inner_size([880.0, 620.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Valentine Proposal Studio",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedGuiSettings>(&text).ok())
            });
            Ok(Box::new(ValentineApp::new(
                cmd_tx,
                ui_rx,
                persisted,
                args.server_url,
                args.open,
            )))
        }),
    )
}
