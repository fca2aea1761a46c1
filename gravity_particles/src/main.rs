//! Real-time N-body gravity visualization
//!
//! Frame sequence: update frame parameters, run the force kernel, run the
//! integration kernel, then upload the settled particle store and render.
//!
//! Controls:
//! - Left mouse drag: orbit camera (view-relative yaw/pitch)
//! - Scroll: smoothed zoom
//! - Space: pause/resume
//! - B: toggle boundary box
//! - R: reset camera

use gravity_particles::controls::{draw_control_panel, ControlResponse, ControlState};
use gravity_particles::physics::{Simulation, DEFAULT_PARTICLE_COUNT};
use gravity_particles::renderer::Renderer;
use gravity_particles::MAX_PARTICLES;

use common::{GraphicsContext, OrbitCamera};
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: Renderer,
    simulation: Simulation,
    camera: OrbitCamera,
    controls: ControlState,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    start_time: std::time::Instant,
    fps: f32,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext, simulation: Simulation) -> Self {
        let renderer = Renderer::new(&ctx, MAX_PARTICLES);
        let camera = OrbitCamera::new(ctx.aspect_ratio());
        let controls = ControlState::new(simulation.particle_count());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            simulation,
            camera,
            controls,
            mouse_pressed: false,
            last_mouse_pos: None,
            start_time: std::time::Instant::now(),
            fps: 0.0,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
        self.renderer
            .resize(&self.ctx.device, new_size.width, new_size.height);
    }

    fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.fps = self.fps * 0.95 + (1.0 / dt) * 0.05;
        }
        self.simulation.step(dt);
        // Rotation applied from events is immediate; only zoom smooths here.
        self.camera.update();
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let time = self.start_time.elapsed().as_secs_f32();
        self.renderer.update_camera(&self.ctx.queue, &self.camera, time);
        let num_particles = self
            .renderer
            .upload_particles(&self.ctx.queue, self.simulation.particles());

        // Build the control panel
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let mut response = ControlResponse::default();
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            response = draw_control_panel(ctx, &mut self.simulation, &mut self.controls, self.fps);
        });

        if response.reset {
            self.simulation.reset();
        }
        if let Some(count) = response.apply_count {
            // The store rebuild is sequenced here, after this frame's
            // kernels finished and before the next dispatch.
            if let Err(err) = self.simulation.set_particle_count(count) {
                log::error!("particle count change rejected: {err}");
                self.controls.pending_particle_count = self.simulation.particle_count();
            }
        }

        self.egui
            .state
            .handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self
            .egui
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui
                .renderer
                .update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer
            .render(&mut encoder, &view, num_particles, self.controls.show_bounds);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui
                .renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key {
            KeyCode::Space => self.simulation.paused = !self.simulation.paused,
            KeyCode::KeyB => self.controls.show_bounds = !self.controls.show_bounds,
            KeyCode::KeyR => self.camera.reset(),
            _ => {}
        }
    }

    fn handle_mouse_move(&mut self, x: f64, y: f64) {
        if self.mouse_pressed {
            if let Some((last_x, last_y)) = self.last_mouse_pos {
                let dx = (x - last_x) as f32;
                let dy = (y - last_y) as f32;
                self.camera.orbit(dx, dy);
            }
            self.last_mouse_pos = Some((x, y));
        }
    }

    fn handle_scroll(&mut self, delta: f32) {
        self.camera.zoom(delta);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui
            .state
            .on_window_event(&self.ctx.window, event)
            .consumed
    }
}

fn main() {
    env_logger::init();

    let (ctx, event_loop) = match pollster::block_on(GraphicsContext::new(
        "Particle Gravity - Rust/wgpu",
        1280,
        720,
    )) {
        Ok(pair) => pair,
        Err(err) => {
            // Missing GPU capability is fatal; nothing to retry.
            log::error!("failed to initialize graphics: {err}");
            std::process::exit(1);
        }
    };

    let simulation = match Simulation::new(DEFAULT_PARTICLE_COUNT) {
        Ok(sim) => sim,
        Err(err) => {
            log::error!("failed to build particle store: {err}");
            std::process::exit(1);
        }
    };

    let mut app = App::new(ctx, simulation);
    let mut last_time = std::time::Instant::now();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { ref event, .. } => {
                    let consumed = app.handle_window_event(event);

                    if !consumed {
                        match event {
                            WindowEvent::CloseRequested => elwt.exit(),
                            WindowEvent::Resized(size) => app.resize(*size),
                            WindowEvent::MouseInput { state, button, .. } => {
                                if *button == MouseButton::Left {
                                    app.mouse_pressed = *state == ElementState::Pressed;
                                    if !app.mouse_pressed {
                                        app.last_mouse_pos = None;
                                    }
                                }
                            }
                            WindowEvent::CursorMoved { position, .. } => {
                                app.handle_mouse_move(position.x, position.y);
                            }
                            WindowEvent::KeyboardInput {
                                event:
                                    KeyEvent {
                                        physical_key: PhysicalKey::Code(key),
                                        state,
                                        ..
                                    },
                                ..
                            } => app.handle_key(*key, *state),
                            WindowEvent::MouseWheel { delta, .. } => {
                                let scroll = match delta {
                                    MouseScrollDelta::LineDelta(_, y) => *y,
                                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                                };
                                app.handle_scroll(scroll);
                            }
                            WindowEvent::RedrawRequested => {
                                let now = std::time::Instant::now();
                                let dt = (now - last_time).as_secs_f32().min(0.1);
                                last_time = now;

                                app.update(dt);
                                match app.render() {
                                    Ok(_) => {}
                                    // The in-flight frame is abandoned;
                                    // particle state stays at the last
                                    // integrated frame.
                                    Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                                    Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                    Err(e) => log::warn!("render error: {e:?}"),
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Event::AboutToWait => {
                    app.ctx.window.request_redraw();
                }
                _ => {}
            }
        })
        .expect("Event loop error");
}
