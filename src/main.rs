// Portfolio island: a capsule character hopping around a glTF scene.
// Scene nodes are drawn with per-mesh instancing; egui paints the overlay on top.

mod engine;
mod game;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window},
};

use engine::camera::PresentationMode;
use engine::input::InputState;
use engine::mesh::GpuVertex;
use engine::ui_overlay::{FrameStats, ModalView, OverlayView, StartScreen, UiActions, UiOverlay};
use game::audio::output_sink;
use game::config::SiteConfig;
use game::scene::SceneGraph;
use game::site::Site;
use game::startup::{AppPhase, SceneLoader};
use game::theme::Lighting;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// INSTANCE DATA (per scene node)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

// ============================================================================
// UNIFORM DATA (camera + lights)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    sun_color: [f32; 4],
    sun_dir: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, lighting: &Lighting) -> Self {
        let sun_dir = Vec3::new(280.0, 200.0, -80.0).normalize();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            ambient: lighting.ambient.radiance().extend(1.0).to_array(),
            sun_color: lighting.sun.radiance().extend(1.0).to_array(),
            sun_dir: sun_dir.extend(0.0).to_array(),
        }
    }
}

fn srgb_to_linear(c: f32) -> f64 {
    let c = c as f64;
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

// ============================================================================
// GPU MESHES
// ============================================================================

struct GpuPart {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    color: [f32; 4],
}

/// GPU copies of every scene mesh, indexed like `SceneGraph::meshes`.
fn upload_meshes(device: &wgpu::Device, scene: &SceneGraph) -> Vec<Vec<GpuPart>> {
    scene
        .meshes()
        .iter()
        .map(|mesh| {
            mesh.parts
                .iter()
                .filter(|part| part.mesh.index_count() > 0)
                .map(|part| GpuPart {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(mesh.name.as_str()),
                        contents: part.mesh.vertex_bytes(),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(mesh.name.as_str()),
                        contents: part.mesh.index_bytes(),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: part.mesh.index_count() as u32,
                    color: part.color,
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// RENDERER
// ============================================================================

struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    depth_view: wgpu::TextureView,
    render_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    max_instances: usize,
    meshes: Vec<Vec<GpuPart>>,
}

/// One draw: a mesh part and its slice of the instance buffer.
struct DrawBatch {
    mesh: usize,
    part: usize,
    instances: std::ops::Range<u32>,
}

impl Renderer {
    async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter compatible with the window surface")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .context("requesting GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_scene.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::new(Mat4::IDENTITY, &Lighting::INITIAL)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc(), InstanceData::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Exported scenes are not reliably closed or consistently wound.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let max_instances = 1024;
        let instance_buffer = create_instance_buffer(&device, max_instances);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            render_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            max_instances,
            meshes: Vec::new(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    fn aspect(&self) -> f32 {
        self.size.width.max(1) as f32 / self.size.height.max(1) as f32
    }

    fn upload_scene(&mut self, scene: &SceneGraph) {
        self.meshes = upload_meshes(&self.device, scene);
        log::info!("uploaded {} meshes", self.meshes.len());
    }

    /// Group visible nodes by mesh part and pack their instances.
    fn collect_instances(&self, scene: &SceneGraph) -> (Vec<InstanceData>, Vec<DrawBatch>) {
        let world = scene.world_matrices();
        let mut instances = Vec::new();
        let mut batches = Vec::new();

        for (mesh_idx, parts) in self.meshes.iter().enumerate() {
            let models: Vec<[[f32; 4]; 4]> = scene
                .nodes()
                .iter()
                .enumerate()
                .filter(|(_, node)| node.visible && node.mesh == Some(mesh_idx))
                .map(|(i, _)| world[i].to_cols_array_2d())
                .collect();
            if models.is_empty() {
                continue;
            }
            for (part_idx, part) in parts.iter().enumerate() {
                let start = instances.len() as u32;
                instances.extend(models.iter().map(|&model| InstanceData { model, color: part.color }));
                batches.push(DrawBatch {
                    mesh: mesh_idx,
                    part: part_idx,
                    instances: start..instances.len() as u32,
                });
            }
        }
        (instances, batches)
    }

    /// Draw the scene (if any) and the overlay. Returns the overlay's actions
    /// and the number of scene draw calls.
    fn render(
        &mut self,
        window: &Window,
        overlay: &mut UiOverlay,
        scene: Option<(&SceneGraph, Mat4, Lighting)>,
        view: &OverlayView<'_>,
    ) -> Result<(UiActions, u32), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Buffer writes go in before the render pass.
        let (instances, batches) = match scene {
            Some((graph, view_proj, lighting)) => {
                let uniforms = Uniforms::new(view_proj, &lighting);
                self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
                self.collect_instances(graph)
            }
            None => (Vec::new(), Vec::new()),
        };

        if instances.len() > self.max_instances {
            self.max_instances = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.max_instances);
        }
        if !instances.is_empty() {
            self.queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let bg = Lighting::BACKGROUND;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: srgb_to_linear(bg.x),
                            g: srgb_to_linear(bg.y),
                            b: srgb_to_linear(bg.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for batch in &batches {
                let part = &self.meshes[batch.mesh][batch.part];
                render_pass.set_vertex_buffer(0, part.vertex_buffer.slice(..));
                render_pass.set_index_buffer(part.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..part.index_count, 0, batch.instances.clone());
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        let actions = overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &target,
            &screen_descriptor,
            view,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok((actions, batches.len() as u32))
    }
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ============================================================================
// FRAME TIMING
// ============================================================================

/// Rolling one-second frame statistics for the F3 panel and the FPS log.
struct FrameTimer {
    window_start: Instant,
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
    /// Last completed window: (fps, avg, min, max).
    last: (u32, f32, f32, f32),
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
            last: (0, 0.0, 0.0, 0.0),
        }
    }

    /// Record a frame. Returns true when a one-second window closed.
    fn record(&mut self, dt: f32) -> bool {
        let ms = dt * 1000.0;
        self.frames += 1;
        self.sum_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);

        if self.window_start.elapsed().as_secs_f32() < 1.0 {
            return false;
        }
        self.last = (self.frames, self.sum_ms / self.frames as f32, self.min_ms, self.max_ms);
        *self = Self { last: self.last, ..Self::new() };
        true
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct App {
    window: Arc<Window>,
    renderer: Renderer,
    overlay: UiOverlay,
    input: InputState,
    config: SiteConfig,

    phase: AppPhase,
    loader: Option<SceneLoader>,
    site: Option<Site>,

    last_update: Instant,
    timer: FrameTimer,
    draw_calls: u32,
    show_stats: bool,
    cursor: CursorIcon,
}

impl App {
    async fn new(window: Arc<Window>, config: SiteConfig) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let overlay = UiOverlay::new(&window, &renderer.device, renderer.config.format);

        let mut input = InputState::new();
        let size = window.inner_size();
        input.window_size = (size.width, size.height);

        let loader = SceneLoader::spawn(config.scene.path.clone());

        Ok(Self {
            window,
            renderer,
            overlay,
            input,
            config,
            phase: AppPhase::Loading,
            loader: Some(loader),
            site: None,
            last_update: Instant::now(),
            timer: FrameTimer::new(),
            draw_calls: 0,
            show_stats: false,
            cursor: CursorIcon::Default,
        })
    }

    fn poll_loader(&mut self) {
        let Some(result) = self.loader.as_ref().and_then(SceneLoader::poll) else {
            return;
        };
        self.loader = None;

        let result = result.and_then(|scene| {
            let sink = output_sink(&self.config.audio.asset_dir);
            Site::from_scene(scene, self.config.clone(), sink)
        });
        self.phase = std::mem::replace(&mut self.phase, AppPhase::Loading).loaded(&result);
        match result {
            Ok(site) => {
                self.renderer.upload_scene(site.scene());
                self.site = Some(site);
                log::info!("scene ready");
            }
            Err(e) => log::error!("scene failed to load: {e}"),
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        self.poll_loader();

        if self.timer.record(dt) {
            let (fps, avg, _, _) = self.timer.last;
            log::info!("FPS: {} | frame {:.2} ms | draw calls: {}", fps, avg, self.draw_calls);
        }

        if !self.phase.is_running() {
            self.input.take_gestures();
            return;
        }
        let Some(site) = self.site.as_mut() else {
            return;
        };

        if site.view().mode() == PresentationMode::Headset {
            let s = self.config.camera.headset_look_sensitivity;
            let (dx, dy) = self.input.mouse_delta;
            site.look(-dx * s, -dy * s);
        }

        let report = site.frame(dt, &mut self.input, self.renderer.aspect());
        site.sync_scene();

        let cursor = if report.hovering { CursorIcon::Pointer } else { CursorIcon::Default };
        if cursor != self.cursor {
            self.window.set_cursor(cursor);
            self.cursor = cursor;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let stats = self.site.as_ref().filter(|_| self.show_stats).map(|site| {
            let (fps, avg, min, max) = self.timer.last;
            let character = site.character_transform();
            FrameStats {
                fps,
                frame_time_avg_ms: avg,
                frame_time_min_ms: min,
                frame_time_max_ms: max,
                entity_count: site.entity_count(),
                draw_calls: self.draw_calls,
                resolution: (self.renderer.size.width, self.renderer.size.height),
                character_position: character.position,
                on_floor: site.player().on_floor,
                view_mode: match site.view().mode() {
                    PresentationMode::Desktop => "desktop",
                    PresentationMode::Headset => "headset",
                },
            }
        });

        let start_screen = match &self.phase {
            AppPhase::Loading => Some(StartScreen::Loading),
            AppPhase::LoadFailed(msg) => Some(StartScreen::Failed(msg)),
            AppPhase::Ready => Some(StartScreen::Ready),
            AppPhase::Running => None,
        };

        let site = self.site.as_ref();
        let view = OverlayView {
            start_screen,
            modal: site.and_then(Site::modal).map(|entry| ModalView {
                title: &entry.title,
                body: &entry.body,
                link: entry.link.as_deref(),
            }),
            dark_theme: site.is_some_and(|s| s.theme() == game::theme::Theme::Dark),
            muted: site.is_some_and(Site::is_muted),
            headset: site.is_some_and(|s| s.view().mode() == PresentationMode::Headset),
            show_pad: self.phase.is_running(),
            stats: stats.as_ref(),
        };

        let aspect = self.renderer.aspect();
        let scene = site.map(|s| (s.scene(), s.view_projection(aspect), s.lighting()));
        let (actions, draw_calls) = self.renderer.render(&self.window, &mut self.overlay, scene, &view)?;
        self.draw_calls = draw_calls;

        self.apply_actions(actions);
        Ok(())
    }

    fn apply_actions(&mut self, actions: UiActions) {
        self.input.apply_pad(actions.pad);
        let Some(site) = self.site.as_mut() else {
            return;
        };

        if actions.enter {
            let next = std::mem::replace(&mut self.phase, AppPhase::Loading).entered();
            if next.is_running() {
                site.enter();
                log::info!("entered the island");
            }
            self.phase = next;
        }
        if actions.dismiss_modal {
            site.dismiss_modal();
        }
        if actions.toggle_theme {
            let theme = site.toggle_theme();
            log::info!("theme -> {:?}", theme);
        }
        if actions.toggle_audio {
            site.toggle_audio();
        }
        if actions.toggle_headset {
            site.toggle_presentation();
        }
    }

    fn window_event(&mut self, event: &WindowEvent) {
        let response = self.overlay.handle_window_event(&self.window, event);
        self.input.process_event(event, response.consumed);
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> Result<()> {
    env_logger::init();

    let config = SiteConfig::load().context("loading site configuration")?;

    let event_loop = EventLoop::new().context("creating event loop")?;

    let window_attributes = Window::default_attributes()
        .with_title("Portfolio Island")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(
        event_loop
            .create_window(window_attributes)
            .context("creating window")?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), config))?;

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                app.window_event(event);
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::F3),
                                repeat: false,
                                ..
                            },
                        ..
                    } => app.show_stats = !app.show_stats,
                    WindowEvent::Resized(physical_size) => {
                        app.renderer.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        app.update();
                        match app.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => app.renderer.resize(app.renderer.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::error!("surface error: {:?}", e),
                        }
                        app.input.end_frame();
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
