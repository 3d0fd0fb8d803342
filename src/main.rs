#![warn(clippy::all)]

//! Country Globe - a rotating 3D globe with country border outlines.
//!
//! Country boundaries are loaded from per-country GeoJSON documents, projected
//! onto a sphere and drawn as line segments over a solid globe that rotates
//! slowly about its vertical axis. Runs in the browser (WebGL2) and natively.

mod animation;
mod config;
mod geo;
mod loader;
mod render;
mod scene;
mod state;
mod ui;

use animation::FrameStep;
use config::GlobeConfig;
use eframe::egui::{self, mutex::Mutex};
use loader::LoadChannel;
use render::GlobeRenderer;
use state::AppState;
use std::sync::Arc;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        depth_buffer: 24,
        ..Default::default()
    };

    eframe::run_native(
        "Country Globe",
        native_options,
        Box::new(|cc| Ok(Box::new(GlobeApp::new(cc)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions {
        depth_buffer: 24,
        ..Default::default()
    };

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("app_canvas")
            .expect("Failed to find app_canvas")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("app_canvas was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(GlobeApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct GlobeApp {
    /// Configuration, scene, load progress and animation
    state: AppState,

    /// Channel for the async region load
    load_channel: LoadChannel,

    /// GPU renderer; `None` when no GL context is available
    renderer: Option<Arc<Mutex<GlobeRenderer>>>,
}

impl GlobeApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = GlobeConfig::load();
        log::info!(
            "Starting globe: {} regions, radius {}, {:?} segments",
            config.regions.len(),
            config.radius,
            config.segment_mode
        );

        let renderer = match cc.gl.as_ref() {
            Some(gl) => match GlobeRenderer::new(gl) {
                Ok(renderer) => Some(Arc::new(Mutex::new(renderer))),
                Err(e) => {
                    log::error!("Failed to create globe renderer: {}", e);
                    None
                }
            },
            None => {
                log::error!("No OpenGL context; the globe will not be drawn");
                None
            }
        };

        let mut load_channel = LoadChannel::new();
        load_channel.start(cc.egui_ctx.clone(), &config);

        Self {
            state: AppState::new(config),
            load_channel,
            renderer,
        }
    }

    /// Uploads any scene objects the renderer has not seen yet.
    fn sync_renderer(&mut self, frame: &eframe::Frame) {
        let (Some(renderer), Some(gl)) = (self.renderer.as_ref(), frame.gl()) else {
            return;
        };

        let mut renderer = renderer.lock();
        if let Err(e) = renderer.sync(gl, &self.state.scene) {
            log::error!("Failed to upload scene: {}", e);
            renderer.destroy(gl);
            drop(renderer);
            self.renderer = None;
        }
    }
}

impl eframe::App for GlobeApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        if let Some(outcome) = self.load_channel.try_recv() {
            self.state.finish_loading(outcome);
        }

        self.sync_renderer(frame);

        ui::render_canvas(ctx, &self.state, self.renderer.as_ref());

        if self.state.step_animation() == FrameStep::Continue {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, gl: Option<&eframe::glow::Context>) {
        if let Some(animator) = &self.state.animator {
            animator.stop_token().stop();
        }

        if let (Some(gl), Some(renderer)) = (gl, self.renderer.as_ref()) {
            renderer.lock().destroy(gl);
        }
    }
}
