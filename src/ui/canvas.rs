//! Central canvas UI: globe rendering area and status overlay.

use crate::render::{FrameUniforms, GlobeRenderer};
use crate::state::{AppState, LoadStatus};
use eframe::egui::{self, mutex::Mutex, Color32, Rect, RichText, Sense, Vec2};
use std::sync::Arc;

const OVERLAY_COLOR: Color32 = Color32::from_rgb(200, 200, 220);

/// Render the globe canvas filling the window.
///
/// Without a renderer (no GL context, or shader setup failed) only the
/// background and overlay are drawn.
pub fn render_canvas(
    ctx: &egui::Context,
    state: &AppState,
    renderer: Option<&Arc<Mutex<GlobeRenderer>>>,
) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let available_size = ui.available_size();
            let (response, painter) = ui.allocate_painter(available_size, Sense::hover());
            let rect = response.rect;

            painter.rect_filled(rect, 0.0, Color32::BLACK);

            if let Some(renderer) = renderer {
                if rect.width() > 0.0 && rect.height() > 0.0 {
                    let uniforms = FrameUniforms::new(
                        &state.scene,
                        state.rotation_y(),
                        state.config.spin_outlines,
                        rect.aspect_ratio(),
                    );
                    let renderer = renderer.clone();

                    let callback = egui::PaintCallback {
                        rect,
                        callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                            renderer.lock().paint(painter.gl(), &uniforms);
                        })),
                    };
                    painter.add(callback);
                }
            }

            draw_overlay_info(ui, &rect, state, renderer.is_some());
        });
}

fn overlay_label(ui: &mut egui::Ui, text: String) {
    ui.label(
        RichText::new(text)
            .monospace()
            .size(12.0)
            .color(OVERLAY_COLOR),
    );
}

fn draw_overlay_info(ui: &mut egui::Ui, rect: &Rect, state: &AppState, has_renderer: bool) {
    let overlay_pos = rect.left_top() + Vec2::new(10.0, 10.0);
    let overlay_rect = Rect::from_min_size(overlay_pos, Vec2::new(320.0, 90.0));

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        ui.vertical(|ui| {
            if state.is_loading() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    overlay_label(ui, state.status_message.clone());
                });
            } else {
                overlay_label(ui, state.status_message.clone());
            }

            if let LoadStatus::Loaded {
                batches, elapsed, ..
            } = &state.load_status
            {
                overlay_label(
                    ui,
                    format!(
                        "Outlines: {} ({} segments) in {:.0} ms",
                        batches,
                        state.scene.segment_count(),
                        elapsed.as_secs_f64() * 1000.0
                    ),
                );
            }

            if state.animator.is_some() {
                overlay_label(
                    ui,
                    format!("Rotation: {:.1}°", state.rotation_y().to_degrees()),
                );
            }

            if !has_renderer {
                ui.label(
                    RichText::new("OpenGL renderer unavailable")
                        .monospace()
                        .size(12.0)
                        .color(Color32::from_rgb(255, 120, 120)),
                );
            }
        });
    });
}
