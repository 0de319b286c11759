//! mosquito-rs - Annoying Mosquito
//!
//! A sound toy: hover the pad to start a whine, move the mouse to change
//! its pitch (faster = higher), click to get a burst of noise.

use eframe::egui;

mod audio;
mod mapping;
mod motion;
mod pad;
mod settings;

use audio::CpalSink;
use motion::Position;
use pad::{PadEvent, PadState, SoundPad};
use settings::AppSettings;

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("Starting mosquito-rs");

    let settings = AppSettings::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_title("annoying mosquito"),
        ..Default::default()
    };

    eframe::run_native(
        "mosquito-rs",
        options,
        Box::new(move |cc| Ok(Box::new(MosquitoApp::new(cc, &settings)))),
    )
}

fn to_position(pos: egui::Pos2) -> Position {
    Position::new(pos.x, pos.y)
}

/// Main application state
struct MosquitoApp {
    pad: SoundPad<CpalSink>,
    /// Whether the pointer was over the pad last frame
    hovered: bool,
    /// Whether the window had focus last frame
    focused: bool,
}

impl MosquitoApp {
    fn new(_cc: &eframe::CreationContext<'_>, settings: &AppSettings) -> Self {
        Self {
            pad: SoundPad::new(
                CpalSink::new(),
                settings.graph_config(),
                settings.mapper(),
                settings.initial_frequency,
            ),
            hovered: false,
            focused: true,
        }
    }

    /// Turn this frame's input over the pad into pad events
    fn pad_events(&mut self, ui: &egui::Ui, response: &egui::Response) -> Vec<PadEvent> {
        let (time, focused, moves) = ui.input(|i| {
            let moves: Vec<egui::Pos2> = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::PointerMoved(pos) => Some(*pos),
                    _ => None,
                })
                .collect();
            (i.time, i.focused, moves)
        });
        let timestamp_ms = time * 1000.0;
        let mut events = Vec::new();

        if self.focused && !focused {
            events.push(PadEvent::FocusLost);
            self.hovered = false;
        }
        self.focused = focused;

        let hovered = focused && response.hovered();
        match (self.hovered, hovered) {
            (false, true) => {
                let position = response
                    .hover_pos()
                    .unwrap_or_else(|| response.rect.center());
                events.push(PadEvent::Enter {
                    position: to_position(position),
                    timestamp_ms,
                });
            }
            (true, false) => events.push(PadEvent::Leave),
            (true, true) => {
                let in_pad = moves
                    .into_iter()
                    .filter(|pos| response.rect.contains(*pos))
                    .map(to_position);
                events.extend(pad::frame_move(in_pad, timestamp_ms));
            }
            (false, false) => {}
        }
        self.hovered = hovered;

        if response.clicked() {
            events.push(PadEvent::Click);
        }

        events
    }

    fn status(&self) -> &'static str {
        if self.pad.audio_unavailable() {
            return "Audio unavailable";
        }
        match self.pad.state() {
            PadState::Uninitialized => "Hover the pad to start audio",
            PadState::Idle => "Ready",
            PadState::Playing => "Playing",
        }
    }
}

impl eframe::App for MosquitoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("annoying mosquito");
                ui.separator();
                ui.label(self.status());
            });
        });

        egui::TopBottomPanel::bottom("debug_panel").show(ctx, |ui| {
            let reading = self.pad.reading();
            ui.horizontal(|ui| {
                ui.small(format!("Distance: {:.0}px", reading.distance));
                ui.separator();
                ui.small(format!("Speed: {:.0}px/s", reading.speed));
                ui.separator();
                ui.small(format!("Frequency: {:.0}Hz", reading.frequency));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui.available_size();
            let response = ui.allocate_response(size, egui::Sense::click());

            for event in self.pad_events(ui, &response) {
                self.pad.handle(event);
            }

            let playing = self.pad.state() == PadState::Playing;
            let fill = if playing {
                egui::Color32::from_rgb(60, 30, 30)
            } else {
                egui::Color32::from_rgb(25, 25, 30)
            };
            let painter = ui.painter_at(response.rect);
            painter.rect_filled(response.rect, 8.0, fill);

            if self.pad.state() == PadState::Uninitialized {
                painter.text(
                    response.rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Move the mouse here to initialize audio",
                    egui::FontId::proportional(18.0),
                    egui::Color32::GRAY,
                );
            }
        });
    }
}

impl Drop for MosquitoApp {
    fn drop(&mut self) {
        self.pad.dispose();
        log::info!("mosquito-rs shut down");
    }
}
