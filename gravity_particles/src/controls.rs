//! Control panel UI
//!
//! egui sidebar exposing the simulation tunables. Gravity, time scale, and
//! damping write straight into the simulation and take effect on the next
//! frame; the particle count goes through an explicit Apply step because
//! changing it rebuilds the whole store.

use egui::{Color32, Context, RichText};

use crate::particles::MAX_PARTICLES;
use crate::physics::Simulation;

/// UI-side state that must not touch the simulation until applied.
pub struct ControlState {
    pub pending_particle_count: usize,
    pub show_bounds: bool,
}

impl ControlState {
    pub fn new(particle_count: usize) -> Self {
        Self {
            pending_particle_count: particle_count,
            show_bounds: true,
        }
    }
}

/// Actions the frame driver must carry out after the UI pass.
#[derive(Default)]
pub struct ControlResponse {
    pub reset: bool,
    pub apply_count: Option<usize>,
}

pub fn draw_control_panel(
    ctx: &Context,
    sim: &mut Simulation,
    state: &mut ControlState,
    fps: f32,
) -> ControlResponse {
    let mut response = ControlResponse::default();

    egui::SidePanel::right("controls_panel")
        .resizable(true)
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading(RichText::new("Gravity Controls").color(Color32::LIGHT_BLUE));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label("Gravity strength");
                ui.add(egui::Slider::new(&mut sim.gravity_strength, 0.0..=5.0));
                ui.add_space(4.0);

                ui.label("Time scale");
                ui.add(egui::Slider::new(&mut sim.time_scale, 0.0..=4.0));
                ui.add_space(4.0);

                ui.label("Damping");
                ui.add(egui::Slider::new(&mut sim.damping, 0.0..=1.0));
                ui.add_space(8.0);

                ui.label("Particle count");
                ui.add(
                    egui::Slider::new(&mut state.pending_particle_count, 1..=MAX_PARTICLES)
                        .logarithmic(true),
                );
                if state.pending_particle_count != sim.particle_count() {
                    ui.label(
                        RichText::new("Applying rebuilds all particles")
                            .small()
                            .color(Color32::YELLOW),
                    );
                    if ui.button("Apply count").clicked() {
                        response.apply_count = Some(state.pending_particle_count);
                    }
                }
                ui.add_space(8.0);

                ui.checkbox(&mut state.show_bounds, "Show boundary box");
                ui.checkbox(&mut sim.paused, "Paused");
                ui.add_space(8.0);

                if ui.button("Reset simulation").clicked() {
                    response.reset = true;
                }

                ui.add_space(12.0);
                ui.separator();
                egui::Grid::new("stats_grid")
                    .num_columns(2)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Particles");
                        ui.label(format!("{}", sim.particle_count()));
                        ui.end_row();
                        ui.label("Sim time");
                        ui.label(format!("{:.1} s", sim.elapsed_time()));
                        ui.end_row();
                        ui.label("FPS");
                        ui.label(format!("{fps:.0}"));
                        ui.end_row();
                    });
            });
        });

    egui::TopBottomPanel::top("status").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Particles: {}", sim.particle_count()));
            ui.separator();
            ui.label(format!("Time: {:.1}x", sim.time_scale));
            ui.separator();
            if sim.paused {
                ui.label(RichText::new("PAUSED").color(Color32::YELLOW));
            } else {
                ui.label(RichText::new("RUNNING").color(Color32::GREEN));
            }
        });
    });

    response
}
