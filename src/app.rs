//! SpeakPad widget — egui/eframe shell around [`SpeechConverter`].
//!
//! The shell owns no speech state of its own.  Once per frame it calls
//! [`SpeechConverter::tick`] with the current time, then renders:
//!
//! | Area | Content |
//! |------|---------|
//! | Header | mic toggle, recording status, copy button + confirmation |
//! | Waveform | smoothed glowing trace while recording, empty while idle |
//! | Transcript | always-editable multiline text box |
//!
//! The waveform placement follows [`CanvasLayout`]: `Overlay` paints it
//! across the whole widget behind the controls, `Inline` gives it a strip
//! of its own.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::audio::waveform;
use crate::config::AppConfig;
use crate::converter::{CanvasLayout, SpeechConverter};

/// Waveform stroke color.
const ACCENT: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);

/// Height of the dedicated waveform strip in the inline layout.
const INLINE_WAVEFORM_HEIGHT: f32 = 56.0;

// ---------------------------------------------------------------------------
// SpeakPadApp
// ---------------------------------------------------------------------------

/// eframe application — the floating speech-to-text pad.
pub struct SpeakPadApp {
    converter: SpeechConverter,
    config: AppConfig,
    /// Last observed window position, persisted on exit.
    window_pos: Option<(f32, f32)>,
}

impl SpeakPadApp {
    pub fn new(converter: SpeechConverter, config: AppConfig) -> Self {
        Self {
            converter,
            config,
            window_pos: None,
        }
    }

    // ── Drawing helpers ──────────────────────────────────────────────────

    /// Stroke the live waveform into `rect`.  While idle there are no bytes
    /// to read and the area stays clear.
    fn draw_waveform(&self, ui: &egui::Ui, rect: egui::Rect) {
        let Some(bytes) = self.converter.waveform_bytes() else {
            return;
        };

        let points = waveform::path(&bytes, rect.width(), rect.height());
        if points.is_empty() {
            return;
        }

        let positions: Vec<egui::Pos2> = points
            .iter()
            .map(|&(x, y)| egui::pos2(rect.left() + x, rect.top() + y))
            .collect();

        let painter = ui.painter_at(rect);

        // Two wider, fainter passes under the core stroke read as a soft
        // outer glow.
        for (width, alpha) in [(12.0, 22), (6.0, 60)] {
            painter.add(egui::Shape::line(
                positions.clone(),
                egui::Stroke::new(
                    width,
                    egui::Color32::from_rgba_unmultiplied(
                        ACCENT.r(),
                        ACCENT.g(),
                        ACCENT.b(),
                        alpha,
                    ),
                ),
            ));
        }
        painter.add(egui::Shape::line(positions, egui::Stroke::new(2.0, ACCENT)));
    }

    /// Header row: mic toggle, status text, copy button with confirmation.
    fn draw_header(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.horizontal(|ui| {
            let recording = self.converter.is_recording();

            let mic_label = if recording {
                egui::RichText::new("■ Stop")
                    .color(egui::Color32::from_rgb(255, 90, 90))
                    .size(14.0)
            } else {
                egui::RichText::new("● Record")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(14.0)
            };
            if ui.add(egui::Button::new(mic_label)).clicked() {
                self.converter.toggle_recording(now);
            }

            let status = if recording {
                egui::RichText::new("listening…").color(egui::Color32::from_rgb(255, 140, 140))
            } else {
                egui::RichText::new("press ● to dictate")
                    .color(egui::Color32::from_rgb(120, 120, 120))
            };
            ui.label(status.size(12.0));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new("Copy").size(12.0)))
                    .clicked()
                {
                    self.converter.copy_to_clipboard(now);
                }
                if self.converter.copied(now) {
                    ui.label(
                        egui::RichText::new("✓ copied")
                            .color(ACCENT)
                            .size(12.0),
                    );
                }
            });
        });
    }

    /// The always-editable transcript box, filling the remaining space.
    fn draw_transcript(&mut self, ui: &mut egui::Ui) {
        let editor = egui::TextEdit::multiline(self.converter.transcript_mut())
            .desired_width(f32::INFINITY)
            .hint_text("Speak, or type here…");
        ui.add_sized([ui.available_width(), ui.available_height()], editor);
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for SpeakPadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.converter.tick(now);

        // Animate at ~60 Hz only while the trace is live; an idle widget
        // repaints on input alone.  The copied confirmation needs a slower
        // wake-up so it disappears without user interaction.
        if self.converter.is_recording() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else if self.converter.copied(now) {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
            self.window_pos = Some((rect.min.x, rect.min.y));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgba_premultiplied(28, 28, 30, 235))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(10));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            let layout = self.converter.options().canvas_layout;

            if layout == CanvasLayout::Overlay {
                self.draw_waveform(ui, ui.max_rect());
            }

            self.draw_header(ui, now);
            ui.separator();

            if layout == CanvasLayout::Inline {
                let (rect, _) = ui.allocate_exact_size(
                    egui::vec2(ui.available_width(), INLINE_WAVEFORM_HEIGHT),
                    egui::Sense::hover(),
                );
                self.draw_waveform(ui, rect);
                ui.add_space(4.0);
            }

            self.draw_transcript(ui);
        });
    }

    /// Persist the window position on exit (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(pos) = self.window_pos {
            self.config.ui.window_position = Some(pos);
        }
        if let Err(e) = self.config.save() {
            log::warn!("failed to save settings on exit: {e}");
        }
        log::info!("SpeakPad closing");
    }
}
