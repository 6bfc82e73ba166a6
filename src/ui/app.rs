use std::path::Path;
use std::time::Duration;

use eframe::egui;
use log::debug;

use crate::player::transport::Transport;
use crate::types::track::Track;

/// UI refresh period while playing.
const TICK_INTERVAL: Duration = Duration::from_millis(300);

const COVER_SIZE: f32 = 256.0;

pub struct PlayerApp {
    transport: Transport,
    cover_texture: Option<egui::TextureHandle>,
}

impl PlayerApp {
    pub fn new(transport: Transport) -> Self {
        PlayerApp {
            transport,
            cover_texture: None,
        }
    }

    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Audio", &["mp3", "wav", "flac", "m4a", "aac", "ogg"])
            .pick_file()
        {
            self.load_track(&path, ctx);
        }
    }

    fn load_track(&mut self, path: &Path, ctx: &egui::Context) {
        let track = Track::probe(path);
        self.cover_texture = load_cover_texture(ctx, track.cover_path.as_deref());
        self.transport.load(track);
    }

    fn header_text(&self) -> String {
        let track = self.transport.track();
        if track.is_empty() {
            "No file loaded".to_string()
        } else {
            track.header_text()
        }
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.transport.toggle_play_pause();
        }

        self.transport.tick();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open").clicked() {
                    self.open_file_dialog(ctx);
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(self.header_text()).strong());
                ui.add_space(4.0);
                match &self.cover_texture {
                    Some(texture) => {
                        ui.add(
                            egui::Image::new(texture)
                                .fit_to_exact_size(egui::vec2(COVER_SIZE, COVER_SIZE)),
                        );
                    }
                    None => cover_placeholder(ui),
                }
            });

            ui.add_space(8.0);

            let duration = self.transport.track().duration.max(0.0);
            ui.horizontal(|ui| {
                // While dragging, preview the slider target instead of the
                // frozen clock.
                let shown = if self.transport.is_seeking() {
                    self.transport.slider_pos
                } else {
                    self.transport.elapsed()
                };
                ui.label(format_time(shown));
                ui.spacing_mut().slider_width = (ui.available_width() - 90.0).max(50.0);
                let response = ui.add(
                    egui::Slider::new(&mut self.transport.slider_pos, 0.0..=duration)
                        .show_value(false),
                );
                if response.drag_started() {
                    self.transport.seek_begin();
                }
                if response.drag_stopped() {
                    let target = self.transport.slider_pos;
                    self.transport.seek_end(target);
                }
                ui.label(format_time(duration));
            });

            ui.add_space(8.0);

            ui.vertical_centered(|ui| {
                let icon = play_icon(self.transport.is_playing());
                if ui.button(egui::RichText::new(icon).size(32.0)).clicked() {
                    self.transport.toggle_play_pause();
                }
            });
        });

        if self.transport.is_playing() {
            ctx.request_repaint_after(TICK_INTERVAL);
        }
    }
}

fn play_icon(playing: bool) -> &'static str {
    if playing { "⏸" } else { "▶" }
}

/// Decode the extracted cover file and upload it as a texture.
fn load_cover_texture(ctx: &egui::Context, cover: Option<&Path>) -> Option<egui::TextureHandle> {
    let path = cover?;
    let decoded = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(err) => {
            debug!("could not decode cover {}: {err}", path.display());
            return None;
        }
    };
    let size = [decoded.width() as usize, decoded.height() as usize];
    let color_img =
        egui::ColorImage::from_rgba_unmultiplied(size, decoded.as_flat_samples().as_slice());
    Some(ctx.load_texture("cover_art", color_img, egui::TextureOptions::LINEAR))
}

fn cover_placeholder(ui: &mut egui::Ui) {
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(COVER_SIZE, COVER_SIZE), egui::Sense::hover());
    ui.painter().rect_filled(
        rect,
        egui::CornerRadius::same(4),
        ui.visuals().extreme_bg_color,
    );
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        "🎵",
        egui::FontId::proportional(72.0),
        ui.visuals().weak_text_color(),
    );
}

/// `HH:MM:SS`, clamped at zero and truncated to whole seconds.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02}")
}
