mod overlay;

use anyhow::{Context as _, Result};
use clap::Parser;
use overlay::EguiOverlay;
use prism_common::FrameClock;
use prism_ecs::Registry;
use prism_input::{Action, InputState, Key};
use prism_render::{FrameOrchestrator, RenderSettings};
use prism_render_wgpu::WgpuBackend;
use prism_scene::{SceneAssets, SceneBuilder, SceneDescription};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "prism-desktop", about = "Prism scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initial window width in physical pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// YAML scene description; the built-in demo scene when omitted
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Start in wireframe mode
    #[arg(long)]
    wireframe: bool,
}

/// GPU-side state, created once the event loop has resumed.
struct Graphics {
    window: Arc<Window>,
    backend: WgpuBackend,
    overlay: EguiOverlay,
    orchestrator: FrameOrchestrator,
}

struct App {
    scene: SceneDescription,
    size: PhysicalSize<u32>,
    wireframe: bool,
    registry: Registry,
    input: InputState,
    clock: FrameClock,
    graphics: Option<Graphics>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(cli: &Cli, scene: SceneDescription) -> Self {
        Self {
            scene,
            size: PhysicalSize::new(cli.width.max(1), cli.height.max(1)),
            wireframe: cli.wireframe,
            registry: Registry::new(),
            input: InputState::new(),
            clock: FrameClock::new(),
            graphics: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let attrs = Window::default_attributes()
            .with_title("Prism")
            .with_inner_size(self.size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let mut backend = WgpuBackend::new(window.clone(), width, height)
            .context("failed to initialize GPU backend")?;
        let info = backend.adapter_info();
        tracing::info!(
            adapter = %info.name,
            backend = info.backend.to_str(),
            wireframe = backend.supports_wireframe(),
            "renderer ready"
        );

        let assets = SceneAssets::load(&mut backend).context("failed to upload scene assets")?;
        SceneBuilder::new(&mut self.registry, &assets)
            .with_aspect_ratio(width as f32 / height as f32)
            .populate(&self.scene)?;

        let orchestrator = FrameOrchestrator::new(width, height)?.with_settings(RenderSettings {
            wireframe: self.wireframe,
            ..RenderSettings::default()
        });
        let overlay = EguiOverlay::new(window.clone(), &backend);

        Ok(Graphics {
            window,
            backend,
            overlay,
            orchestrator,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode, pressed: bool) {
        let Some(key) = map_key(code) else {
            return;
        };
        let Some(action) = self.input.key_event(key, pressed) else {
            return;
        };
        match action {
            Action::Quit => event_loop.exit(),
            Action::ToggleInspector => {
                if let Some(gfx) = &mut self.graphics {
                    gfx.overlay.toggle();
                }
            }
            Action::ToggleWireframe => {
                if let Some(gfx) = &mut self.graphics {
                    let settings = gfx.orchestrator.settings_mut();
                    settings.wireframe = !settings.wireframe;
                    tracing::info!(wireframe = settings.wireframe, "wireframe toggled");
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gfx) = &mut self.graphics else {
            return;
        };
        let dt = self.clock.tick();
        gfx.overlay.record_frame(dt, self.clock.fps());
        let camera_input = self.input.take_camera_input();

        let result = gfx.orchestrator.run_frame(
            &mut self.registry,
            &mut gfx.backend,
            &mut gfx.overlay,
            &camera_input,
            dt,
        );
        gfx.window.request_redraw();
        if let Err(err) = result {
            self.fail(event_loop, err.into());
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(gfx) => {
                gfx.window.request_redraw();
                self.graphics = Some(gfx);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match &mut self.graphics {
            Some(gfx) => gfx.overlay.on_window_event(&event),
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let Some(gfx) = &mut self.graphics else {
                    return;
                };
                // Minimized windows report a zero extent.
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Err(err) = gfx.orchestrator.resize(
                    &mut self.registry,
                    &mut gfx.backend,
                    size.width,
                    size.height,
                ) {
                    tracing::warn!("resize failed: {err}");
                }
            }
            WindowEvent::Focused(false) => self.input.clear(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                // Releases always reach the input state so keys never stick.
                if (consumed && pressed) || repeat {
                    return;
                }
                self.handle_key(event_loop, code, pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                if consumed && pressed {
                    return;
                }
                self.input.set_look_active(pressed);
                if let Some(gfx) = &self.graphics {
                    gfx.window.set_cursor_visible(!pressed);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.mouse_motion(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.graphics {
            gfx.window.request_redraw();
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene = match &cli.scene {
        Some(path) => SceneDescription::load(path)?,
        None => SceneDescription::demo(),
    };
    tracing::info!(scene = %scene.name, "prism-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&cli, scene);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_and_action_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::KeyW), Some(Key::W));
        assert_eq!(map_key(KeyCode::KeyQ), Some(Key::Q));
        assert_eq!(map_key(KeyCode::F2), Some(Key::F2));
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Escape));
        assert_eq!(map_key(KeyCode::Space), None);
    }

    #[test]
    fn cli_defaults_to_720p_demo() {
        let cli = Cli::parse_from(["prism-desktop"]);
        assert_eq!((cli.width, cli.height), (1280, 720));
        assert!(cli.scene.is_none());
        assert!(!cli.wireframe);
    }
}
