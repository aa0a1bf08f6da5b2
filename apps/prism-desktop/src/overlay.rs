use egui::Ui;
use glam::{Vec3, Vec4};
use prism_common::FrameTimer;
use prism_ecs::{
    Camera, DirectionalLight, Entity, LightCommon, Material, PointLight, Registry, SpotLight,
    Transform,
};
use prism_render::{DebugOverlay, FrameStats, OverlayContext, RenderSettings};
use prism_render_wgpu::{GpuError, WgpuBackend};
use prism_tools::SceneInspector;
use std::sync::Arc;
use std::time::Duration;
use winit::event::WindowEvent;
use winit::window::Window;

/// egui debug UI drawn on top of the scene pass.
pub struct EguiOverlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    window: Arc<Window>,
    panels: Panels,
}

struct Panels {
    visible: bool,
    show_stats: bool,
    show_inspector: bool,
    selected: Option<Entity>,
    fps: u32,
    frame_times: FrameTimer,
}

impl EguiOverlay {
    pub fn new(window: Arc<Window>, backend: &WgpuBackend) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer =
            egui_wgpu::Renderer::new(backend.device(), backend.surface_format(), None, 1, false);
        Self {
            ctx,
            state,
            renderer,
            window,
            panels: Panels {
                visible: true,
                show_stats: true,
                show_inspector: true,
                selected: None,
                fps: 0,
                frame_times: FrameTimer::new(120),
            },
        }
    }

    /// Returns true when egui wants the event for itself.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.state.on_window_event(&self.window, event).consumed
    }

    pub fn toggle(&mut self) {
        self.panels.visible = !self.panels.visible;
    }

    pub fn record_frame(&mut self, dt: f32, fps: u32) {
        self.panels.fps = fps;
        self.panels.frame_times.record(Duration::from_secs_f32(dt));
    }
}

impl DebugOverlay<WgpuBackend> for EguiOverlay {
    fn draw(&mut self, ctx: OverlayContext<'_>, backend: &mut WgpuBackend) -> Result<(), GpuError> {
        let OverlayContext {
            registry,
            settings,
            stats,
        } = ctx;

        let raw_input = self.state.take_egui_input(&self.window);
        let egui_ctx = self.ctx.clone();
        let output = egui_ctx.run(raw_input, |ui_ctx| {
            self.panels.show(ui_ctx, registry, settings, stats);
        });
        self.state
            .handle_platform_output(&self.window, output.platform_output);
        let jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);

        let Some(target) = backend.overlay_target() else {
            return Ok(());
        };
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: target.size,
            pixels_per_point: output.pixels_per_point,
        };
        for (id, delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }
        let mut encoder = target
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("overlay_encoder"),
            });
        let extra = self.renderer.update_buffers(
            target.device,
            target.queue,
            &mut encoder,
            &jobs,
            &screen,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("overlay_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &jobs, &screen);
        }
        target
            .queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
        Ok(())
    }
}

impl Panels {
    fn show(
        &mut self,
        ctx: &egui::Context,
        registry: &mut Registry,
        settings: &mut RenderSettings,
        stats: &FrameStats,
    ) {
        if !self.visible {
            return;
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_stats, "Stats");
                    ui.checkbox(&mut self.show_inspector, "Inspector");
                    ui.checkbox(&mut settings.wireframe, "Wireframe (F2)");
                });
                ui.separator();
                ui.label("F1: overlay | RMB: look | WASD/QE: move");
            });
        });

        let fps = self.fps;
        let frame_times = &self.frame_times;
        egui::Window::new("Stats")
            .open(&mut self.show_stats)
            .default_pos([12.0, 40.0])
            .show(ctx, |ui| {
                stats_panel(ui, registry, settings, stats, fps);
                ui.label(format!(
                    "Frame time: avg {:.2} ms, max {:.2} ms",
                    frame_times.average().as_secs_f64() * 1000.0,
                    frame_times.max().as_secs_f64() * 1000.0
                ));
            });

        let selected = &mut self.selected;
        egui::Window::new("Inspector")
            .open(&mut self.show_inspector)
            .default_pos([12.0, 320.0])
            .default_width(300.0)
            .show(ctx, |ui| {
                entity_list(ui, registry, selected);
                if let Some(entity) = *selected {
                    ui.separator();
                    if !entity_editor(ui, registry, entity) {
                        *selected = None;
                    }
                }
            });
    }
}

fn stats_panel(
    ui: &mut Ui,
    registry: &mut Registry,
    settings: &mut RenderSettings,
    stats: &FrameStats,
    fps: u32,
) {
    ui.label(format!("FPS: {fps}"));
    ui.label(format!("Frame: {}", stats.frame_index));
    ui.label(format!(
        "Draws: {} (skipped {})",
        stats.draws, stats.skipped_meshes
    ));
    ui.label(format!(
        "Lights: {} (dropped {})",
        stats.lights, stats.dropped_lights
    ));
    ui.label(format!("Entities: {}", registry.entity_count()));
    ui.separator();

    let e = stats.eye;
    let l = stats.look_direction;
    ui.label(format!("Camera: ({:.2}, {:.2}, {:.2})", e.x, e.y, e.z));
    ui.label(format!("Look: ({:.2}, {:.2}, {:.2})", l.x, l.y, l.z));

    let camera = match stats.camera {
        Some(entity) => registry.get_component_mut::<Camera>(entity),
        None => None,
    };
    match camera {
        Some(camera) => {
            let mut fov = camera.fov_y.to_degrees();
            if ui
                .add(egui::Slider::new(&mut fov, 20.0..=120.0).text("FOV"))
                .changed()
            {
                camera.fov_y = fov.to_radians();
            }
            ui.add(egui::Slider::new(&mut camera.move_speed, 0.5..=50.0).text("Speed"));
        }
        None => {
            ui.label("No camera; using fallback view");
        }
    }

    ui.separator();
    ui.checkbox(&mut settings.wireframe, "Wireframe");
    ui.horizontal(|ui| {
        ui.label("Clear color");
        color_edit(ui, &mut settings.clear_color);
    });
}

fn entity_list(ui: &mut Ui, registry: &Registry, selected: &mut Option<Entity>) {
    egui::ScrollArea::vertical()
        .max_height(160.0)
        .show(ui, |ui| {
            for info in SceneInspector::inspect_all(registry) {
                let kinds: Vec<&str> = info.kinds.iter().map(|k| k.name()).collect();
                let label = format!("{} {}", info.entity, kinds.join(" + "));
                let is_selected = *selected == Some(info.entity);
                if ui.selectable_label(is_selected, label).clicked() {
                    *selected = Some(info.entity);
                }
            }
        });
}

/// Returns false once the entity no longer exists.
fn entity_editor(ui: &mut Ui, registry: &mut Registry, entity: Entity) -> bool {
    if !registry.contains(entity) {
        return false;
    }
    ui.horizontal(|ui| {
        ui.heading(format!("Entity {entity}"));
        if ui.button("Destroy").clicked() {
            registry.destroy_entity(entity);
        }
    });
    if !registry.contains(entity) {
        return false;
    }

    if let Some(t) = registry.get_component_mut::<Transform>(entity) {
        egui::CollapsingHeader::new("Transform")
            .default_open(true)
            .show(ui, |ui| {
                vec3_row(ui, "Position", &mut t.position, 0.05);
                let mut degrees = Vec3::new(
                    t.rotation.x.to_degrees(),
                    t.rotation.y.to_degrees(),
                    t.rotation.z.to_degrees(),
                );
                if vec3_row(ui, "Rotation", &mut degrees, 0.5) {
                    t.rotation = Vec3::new(
                        degrees.x.to_radians(),
                        degrees.y.to_radians(),
                        degrees.z.to_radians(),
                    );
                }
                vec3_row(ui, "Scale", &mut t.scale, 0.01);
            });
    }

    if let Some(c) = registry.get_component_mut::<Camera>(entity) {
        egui::CollapsingHeader::new("Camera")
            .default_open(true)
            .show(ui, |ui| {
                vec3_row(ui, "Position", &mut c.position, 0.05);
                let mut look = c.look_direction;
                if vec3_row(ui, "Look", &mut look, 0.01) {
                    if let Some(look) = look.try_normalize() {
                        c.look_direction = look;
                    }
                }
                let mut fov = c.fov_y.to_degrees();
                if ui
                    .add(egui::Slider::new(&mut fov, 20.0..=120.0).text("FOV"))
                    .changed()
                {
                    c.fov_y = fov.to_radians();
                }
                ui.add(
                    egui::DragValue::new(&mut c.near_plane)
                        .speed(0.01)
                        .range(0.001..=c.far_plane)
                        .prefix("Near: "),
                );
                ui.add(
                    egui::DragValue::new(&mut c.far_plane)
                        .speed(1.0)
                        .range(c.near_plane..=10_000.0)
                        .prefix("Far: "),
                );
                ui.add(egui::Slider::new(&mut c.move_speed, 0.5..=50.0).text("Speed"));
            });
    }

    if let Some(m) = registry.get_component_mut::<Material>(entity) {
        egui::CollapsingHeader::new("Material")
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Diffuse");
                    color_edit(ui, &mut m.diffuse_color);
                });
                ui.add(
                    egui::Slider::new(&mut m.specular_power, 1.0..=256.0)
                        .logarithmic(true)
                        .text("Specular"),
                );
                ui.label(format!(
                    "Textures: diffuse={:?} normal={:?}",
                    m.diffuse_texture.map(|t| t.0),
                    m.normal_texture.map(|t| t.0)
                ));
            });
    }

    if let Some(light) = registry.get_component_mut::<DirectionalLight>(entity) {
        egui::CollapsingHeader::new("Directional light")
            .default_open(true)
            .show(ui, |ui| {
                light_common(ui, &mut light.common);
                direction_row(ui, &mut light.direction);
            });
    }

    if let Some(light) = registry.get_component_mut::<PointLight>(entity) {
        egui::CollapsingHeader::new("Point light")
            .default_open(true)
            .show(ui, |ui| {
                light_common(ui, &mut light.common);
                vec3_row(ui, "Position", &mut light.position, 0.05);
                ui.add(egui::Slider::new(&mut light.range, 0.1..=50.0).text("Range"));
            });
    }

    if let Some(light) = registry.get_component_mut::<SpotLight>(entity) {
        egui::CollapsingHeader::new("Spot light")
            .default_open(true)
            .show(ui, |ui| {
                light_common(ui, &mut light.common);
                vec3_row(ui, "Position", &mut light.position, 0.05);
                direction_row(ui, &mut light.direction);
                ui.add(egui::Slider::new(&mut light.range, 0.1..=50.0).text("Range"));
                let mut outer = light.outer_cone.to_degrees();
                let mut inner = light.inner_cone.to_degrees();
                if ui
                    .add(egui::Slider::new(&mut outer, 1.0..=89.0).text("Outer cone"))
                    .changed()
                {
                    light.outer_cone = outer.to_radians();
                    light.inner_cone = light.inner_cone.min((outer - 1.0).to_radians());
                }
                if ui
                    .add(egui::Slider::new(&mut inner, 0.0..=outer - 1.0).text("Inner cone"))
                    .changed()
                {
                    light.inner_cone = inner.to_radians();
                }
            });
    }
    true
}

fn light_common(ui: &mut Ui, common: &mut LightCommon) {
    ui.checkbox(&mut common.enabled, "Enabled");
    ui.add(egui::Slider::new(&mut common.intensity, 0.0..=5.0).text("Intensity"));
    ui.horizontal(|ui| {
        ui.label("Diffuse");
        color_edit(ui, &mut common.diffuse);
        ui.label("Ambient");
        color_edit(ui, &mut common.ambient);
    });
}

fn direction_row(ui: &mut Ui, direction: &mut Vec3) {
    let mut edited = *direction;
    if vec3_row(ui, "Direction", &mut edited, 0.01) {
        if let Some(d) = edited.try_normalize() {
            *direction = d;
        }
    }
}

fn vec3_row(ui: &mut Ui, label: &str, v: &mut Vec3, speed: f32) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        changed |= ui.add(egui::DragValue::new(&mut v.x).speed(speed).prefix("X: ")).changed();
        changed |= ui.add(egui::DragValue::new(&mut v.y).speed(speed).prefix("Y: ")).changed();
        changed |= ui.add(egui::DragValue::new(&mut v.z).speed(speed).prefix("Z: ")).changed();
    });
    changed
}

fn color_edit(ui: &mut Ui, color: &mut Vec4) {
    let mut rgba = color.to_array();
    if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
        *color = Vec4::from_array(rgba);
    }
}
