mod ops;
mod player;
mod types;
mod ui;

use eframe::egui;

use crate::player::transport::Transport;
use crate::types::track::Track;
use crate::ui::app::PlayerApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 380.0]),
        centered: true,
        ..Default::default()
    };

    let app = PlayerApp::new(Transport::new(Track::empty()));
    eframe::run_native("Vinyl", native_options, Box::new(|_cc| Ok(Box::new(app))))?;
    Ok(())
}
