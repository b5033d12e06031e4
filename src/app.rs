//! Application shell and eframe integration.
//!
//! Owns the scene and the GL engine, polls input once per frame, and hands
//! the flattened `FrameBundle` to a glow paint callback for the shadow,
//! pick and forward passes. Pick results are read back inside the callback
//! and applied at the start of the next update, one frame late.

use std::sync::Arc;

use eframe::{egui, egui_glow, glow};
use egui::mutex::Mutex;

use crate::camera::KeyState;
use crate::catalog::load_catalog;
use crate::mesh::MeshTable;
use crate::render::{FrameBundle, RenderEngine};
use crate::scene::{Scene, SwapTransition};
use crate::texture::{load_skin, Skin};

pub struct App {
    scene: Scene,
    engine: Arc<Mutex<RenderEngine>>,
    frame: Arc<Mutex<FrameBundle>>,
    /// Cursor position in viewport pixels, set when a click should pick.
    pick_request: Arc<Mutex<Option<(i32, i32)>>>,
    /// Pick outcome written by the paint callback, consumed next update.
    pick_result: Arc<Mutex<Option<Option<usize>>>>,
    pick_button: Option<egui::PointerButton>,
    import_text: String,
    import_status: String,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let gl = cc.gl.as_ref().expect("glow backend required");
        let engine = Arc::new(Mutex::new(RenderEngine::new(gl)));

        {
            let mut engine = engine.lock();
            let meshes = MeshTable::load();
            for id in crate::mesh::MeshId::ALL {
                engine.upload_mesh(gl, id, meshes.vertices(id));
            }
            for skin in Skin::all() {
                engine.upload_texture(gl, skin, &load_skin(skin));
            }
        }

        let (catalog, signs) = load_catalog();
        log::info!("catalog loaded: {} stars, {} constellations", catalog.len(), signs.len());

        Self {
            scene: Scene::new(catalog, signs),
            engine,
            frame: Arc::new(Mutex::new(FrameBundle::default())),
            pick_request: Arc::new(Mutex::new(None)),
            pick_result: Arc::new(Mutex::new(None)),
            pick_button: None,
            import_text: String::new(),
            import_status: String::new(),
        }
    }

    fn poll_keys(&mut self, ctx: &egui::Context) {
        use egui::Key;
        let (keys, boost, action) = ctx.input(|i| {
            (
                KeyState {
                    forward: i.key_down(Key::W),
                    back: i.key_down(Key::S),
                    left: i.key_down(Key::A),
                    right: i.key_down(Key::D),
                    up: i.key_down(Key::E),
                    down: i.key_down(Key::Q),
                    turn_left: i.key_down(Key::ArrowLeft),
                    turn_right: i.key_down(Key::ArrowRight),
                    pitch_up: i.key_down(Key::ArrowUp),
                    pitch_down: i.key_down(Key::ArrowDown),
                },
                i.key_pressed(Key::Space),
                i.key_pressed(Key::P),
            )
        });
        self.scene.camera.keys = keys;
        if boost {
            self.scene.camera.toggle_boost();
        }
        if action {
            self.scene.primary_action();
        }
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("Starscape");
            ui.separator();

            let pause_label = if self.scene.paused { "Resume" } else { "Pause" };
            if ui.button(pause_label).clicked() {
                self.scene.paused = !self.scene.paused;
            }
            ui.horizontal(|ui| {
                ui.label("Speed:");
                ui.add(egui::Slider::new(&mut self.scene.speed, 0.0..=10.0));
            });
            ui.horizontal(|ui| {
                ui.label("Connector color:");
                ui.color_edit_button_rgb(&mut self.scene.connect_color);
            });

            ui.add_space(10.0);
            ui.separator();
            ui.label(format!("Connections: {}", self.scene.connections().len()));
            if ui.button("Export to clipboard").clicked() {
                ctx.copy_text(self.scene.export_connections());
            }
            ui.add(
                egui::TextEdit::singleline(&mut self.import_text)
                    .hint_text("/id1/id2/rrggbb..."),
            );
            if ui.button("Import").clicked() {
                self.import_status = match self.scene.import_connections(&self.import_text) {
                    Ok(added) => format!("imported {} connections", added),
                    Err(err) => err,
                };
            }
            if !self.import_status.is_empty() {
                ui.label(&self.import_status);
            }

            ui.add_space(10.0);
            ui.separator();
            ui.label("Constellations");
            for name in self.scene.sign_names() {
                let mut active = self.scene.sign_active(&name);
                if ui.checkbox(&mut active, &name).changed() {
                    self.scene.set_sign(&name, active);
                }
            }

            ui.add_space(10.0);
            ui.separator();
            if self.scene.transition() != SwapTransition::Idle {
                ui.label("traveling...");
            }
            if !self.scene.info_text.is_empty() {
                ui.label(self.scene.info_text.clone());
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                ui.label(format!("build {}", env!("GIT_HASH")));
                ui.label("WASD/QE move, arrows turn, Space boost");
                ui.label("right-drag to look, click to select");
            });
        });
    }

    fn central_panel(&mut self, ctx: &egui::Context, dt: f32) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

                if response.dragged_by(egui::PointerButton::Secondary) {
                    let delta = response.drag_delta();
                    self.scene.camera.add_mouse_delta(delta.x, delta.y);
                }

                let clicked_button = if response.clicked() {
                    Some(egui::PointerButton::Primary)
                } else if response.clicked_by(egui::PointerButton::Middle) {
                    Some(egui::PointerButton::Middle)
                } else {
                    None
                };
                // Clicks are ignored while a star swap is in flight.
                if let (Some(button), Some(pos), SwapTransition::Idle) = (
                    clicked_button,
                    response.interact_pointer_pos(),
                    self.scene.transition(),
                ) {
                    let ppp = ctx.pixels_per_point();
                    let local = pos - rect.min;
                    *self.pick_request.lock() =
                        Some(((local.x * ppp) as i32, (local.y * ppp) as i32));
                    self.pick_button = Some(button);
                }

                *self.frame.lock() = self.scene.frame(dt);

                let engine = self.engine.clone();
                let frame = self.frame.clone();
                let pick_request = self.pick_request.clone();
                let pick_result = self.pick_result.clone();
                let callback = egui::PaintCallback {
                    rect,
                    callback: Arc::new(egui_glow::CallbackFn::new(move |info, painter| {
                        let gl = painter.gl();
                        let mut engine = engine.lock();
                        let frame = frame.lock().clone();
                        let viewport = info.viewport_in_pixels();

                        engine.shadow_pass(gl, &frame);
                        if let Some((mouse_x, mouse_y)) = pick_request.lock().take() {
                            let hit = engine.pick(
                                gl,
                                &frame,
                                mouse_x,
                                mouse_y,
                                viewport.width_px,
                                viewport.height_px,
                            );
                            *pick_result.lock() = Some(hit);
                        }
                        engine.render(
                            gl,
                            &frame,
                            (
                                viewport.left_px,
                                viewport.from_bottom_px,
                                viewport.width_px,
                                viewport.height_px,
                            ),
                        );
                    })),
                };
                ui.painter().add(callback);
            });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt).min(0.1) * 1000.0;

        // The pick readback from last frame's paint callback.
        if let Some(hit) = self.pick_result.lock().take() {
            self.scene.handle_pick(hit);
            if self.pick_button.take() == Some(egui::PointerButton::Middle) {
                self.scene.connect_selected();
            }
        }

        self.poll_keys(ctx);
        self.side_panel(ctx);
        self.central_panel(ctx, dt);

        ctx.request_repaint();
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl {
            self.engine.lock().destroy(gl);
        }
    }
}
