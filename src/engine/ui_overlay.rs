// egui overlay: start screen, toggles, direction pad, content modal and the F3 stats panel
// `draw` is pure egui so layout and actions can be exercised headless

use egui::epaint::Shadow;

use super::input::{Direction, DirectionFlags};

/// F3 stats panel contents.
pub struct FrameStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub entity_count: usize,
    pub draw_calls: u32,
    pub resolution: (u32, u32),
    pub character_position: glam::Vec3,
    pub on_floor: bool,
    pub view_mode: &'static str,
}

/// Full-screen panel shown before the scene runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScreen<'a> {
    Loading,
    Failed(&'a str),
    /// Scene is ready; waiting for the enter button.
    Ready,
}

/// An open content modal.
#[derive(Debug, Clone, Copy)]
pub struct ModalView<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub link: Option<&'a str>,
}

/// Everything the overlay shows this frame.
pub struct OverlayView<'a> {
    /// `None` once the scene is running.
    pub start_screen: Option<StartScreen<'a>>,
    pub modal: Option<ModalView<'a>>,
    pub dark_theme: bool,
    pub muted: bool,
    pub headset: bool,
    pub show_pad: bool,
    pub stats: Option<&'a FrameStats>,
}

/// What the user did in the overlay this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiActions {
    pub enter: bool,
    pub dismiss_modal: bool,
    pub toggle_theme: bool,
    pub toggle_audio: bool,
    pub toggle_headset: bool,
    /// Pad buttons currently held down under the pointer.
    pub pad: DirectionFlags,
}

const INSTRUCTIONS: &str = "WASD / arrow keys to hop around\n\
    Click the creatures and signs\n\
    R to respawn, F3 for stats";

pub struct UiOverlay {
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl UiOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        let mut visuals = egui::Visuals::light();
        visuals.window_shadow = Shadow::NONE;
        visuals.window_rounding = egui::Rounding::same(12.0);
        egui_ctx.set_visuals(visuals);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // drawn in its own pass after the scene
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Run one egui frame and paint it over `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        overlay: &OverlayView<'_>,
    ) -> UiActions {
        let raw_input = self.egui_state.take_egui_input(window);

        let mut actions = UiActions::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = draw(ctx, overlay);
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        actions
    }
}

/// Lay out the overlay for one frame. Pure egui, so it runs headless in tests.
pub fn draw(ctx: &egui::Context, view: &OverlayView<'_>) -> UiActions {
    let mut actions = UiActions::default();

    if let Some(screen) = view.start_screen {
        actions.enter = start_screen(ctx, screen);
        return actions;
    }

    if let Some(stats) = view.stats {
        stats_panel(ctx, stats);
    }

    // ── Toggle buttons, top right ────────────────────────────────────────
    egui::Area::new(egui::Id::new("toggles"))
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme = if view.dark_theme { "☀ Light" } else { "🌙 Dark" };
                actions.toggle_theme = ui.button(theme).clicked();
                let audio = if view.muted { "🔇 Sound off" } else { "🔊 Sound on" };
                actions.toggle_audio = ui.button(audio).clicked();
                let vr = if view.headset { "Exit VR" } else { "Enter VR" };
                actions.toggle_headset = ui.button(vr).clicked();
            });
        });

    if view.show_pad && view.modal.is_none() {
        actions.pad = direction_pad(ctx);
    }

    if let Some(modal) = view.modal {
        // Dim the scene behind the window; clicking the dimmed area closes it.
        let screen = ctx.screen_rect();
        let backdrop = egui::Area::new(egui::Id::new("modal_bg"))
            .order(egui::Order::Background)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let resp = ui.allocate_rect(screen, egui::Sense::click());
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(110));
                resp.clicked()
            });

        egui::Window::new(modal.title)
            .id(egui::Id::new("modal"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.label(modal.body);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if let Some(link) = modal.link {
                        ui.hyperlink_to("Visit project", link);
                    }
                    actions.dismiss_modal = ui.button("Close").clicked();
                });
            });
        actions.dismiss_modal |= backdrop.inner;
    }

    actions
}

fn start_screen(ctx: &egui::Context, screen: StartScreen<'_>) -> bool {
    let mut enter = false;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.35);
            match screen {
                StartScreen::Loading => {
                    ui.heading("Loading...");
                    ui.spinner();
                }
                StartScreen::Failed(reason) => {
                    ui.heading("The island failed to load");
                    ui.colored_label(egui::Color32::DARK_RED, reason);
                }
                StartScreen::Ready => {
                    enter = ui.button(egui::RichText::new("Enter").size(24.0)).clicked();
                }
            }
            ui.add_space(16.0);
            ui.label(INSTRUCTIONS);
        });
    });
    enter
}

fn direction_pad(ctx: &egui::Context) -> DirectionFlags {
    let mut held = DirectionFlags::default();
    let size = egui::vec2(48.0, 48.0);

    // Held while the pointer is pressed on the button and still over it.
    let mut pad_button = |ui: &mut egui::Ui, label: &str, dir: Direction| {
        let resp = ui.add(egui::Button::new(label).min_size(size));
        if resp.is_pointer_button_down_on() && resp.contains_pointer() {
            held.set(dir, true);
        }
    };

    egui::Area::new(egui::Id::new("direction_pad"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(16.0, -16.0))
        .show(ctx, |ui| {
            egui::Grid::new("pad_grid").spacing([4.0, 4.0]).show(ui, |ui| {
                ui.label("");
                pad_button(ui, "▲", Direction::Up);
                ui.label("");
                ui.end_row();
                pad_button(ui, "◀", Direction::Left);
                ui.label("");
                pad_button(ui, "▶", Direction::Right);
                ui.end_row();
                ui.label("");
                pad_button(ui, "▼", Direction::Down);
                ui.label("");
                ui.end_row();
            });
        });

    held
}

fn stats_panel(ctx: &egui::Context, stats: &FrameStats) {
    egui::Area::new(egui::Id::new("stats_overlay"))
        .fixed_pos(egui::pos2(10.0, 10.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                .inner_margin(egui::Margin::same(8.0))
                .rounding(4.0)
                .show(ui, |ui: &mut egui::Ui| {
                    let text = |s: String| egui::RichText::new(s).monospace().color(egui::Color32::WHITE);
                    ui.label(text(format!("FPS: {}", stats.fps)));
                    ui.label(text(format!(
                        "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                        stats.frame_time_avg_ms, stats.frame_time_min_ms, stats.frame_time_max_ms
                    )));
                    ui.label(text(format!("Entities: {}", stats.entity_count)));
                    ui.label(text(format!("Draw calls: {}", stats.draw_calls)));
                    ui.label(text(format!(
                        "Resolution: {} x {}",
                        stats.resolution.0, stats.resolution.1
                    )));
                    let p = stats.character_position;
                    ui.label(text(format!(
                        "Character: ({:.1}, {:.1}, {:.1})  {}",
                        p.x,
                        p.y,
                        p.z,
                        if stats.on_floor { "grounded" } else { "airborne" }
                    )));
                    ui.label(text(format!("View: {}", stats.view_mode)));
                });
        });
}
