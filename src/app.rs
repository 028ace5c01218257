//! The interactive viewer: owns the renderer, camera, and loaded scene, and
//! dispatches window events to them.

use std::time::Duration;

use glam::Vec2;
use tracing::{debug, error, info, warn};
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::camera::Camera;
use crate::controls::{CameraController, FreeLookCameraController};
use crate::renderer::Renderer;
use crate::scene::{self, flatten};
use crate::settings::Settings;
use crate::shapes::TessellationParams;

pub struct ViewerApp<'a> {
    settings: Settings,
    renderer: Renderer<'a>,
    camera: Camera,
    controller: FreeLookCameraController,
    params: TessellationParams,
}

impl<'a> ViewerApp<'a> {
    /// Create the viewer and load its initial scene. Fails if the scene file
    /// cannot be read, since there is nothing to show without one.
    pub fn new(settings: Settings, mut renderer: Renderer<'a>) -> anyhow::Result<Self> {
        let params = settings.tessellation;
        let window_size = renderer.window_size();

        let camera = load_scene(&settings, &mut renderer, window_size.width, window_size.height)?;

        Ok(Self {
            settings,
            renderer,
            camera,
            controller: FreeLookCameraController::new(),
            params,
        })
    }

    pub fn window(&self) -> &winit::window::Window {
        self.renderer.window()
    }

    /// Handle a window event. Returns `true` if the event was consumed.
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        if self.controller.process_input(event) {
            return true;
        }

        if let WindowEvent::KeyboardInput {
            event: key_event, ..
        } = event
        {
            if key_event.state == ElementState::Pressed && !key_event.repeat {
                if let PhysicalKey::Code(code) = key_event.physical_key {
                    return self.handle_key(code);
                }
            }
        }

        false
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::ArrowUp => self.adjust_params(1, 0),
            KeyCode::ArrowDown => self.adjust_params(-1, 0),
            KeyCode::ArrowRight => self.adjust_params(0, 1),
            KeyCode::ArrowLeft => self.adjust_params(0, -1),
            KeyCode::KeyR => self.reload_scene(),
            KeyCode::KeyP => self.export_frame(),
            _ => return false,
        }

        true
    }

    /// Step the tessellation parameters and retessellate. Decrements stop at
    /// the minimum detail for each parameter.
    fn adjust_params(&mut self, delta1: i32, delta2: i32) {
        let adjusted = TessellationParams::new(
            self.params.param1.saturating_add_signed(delta1),
            self.params.param2.saturating_add_signed(delta2),
        )
        .clamped();

        if adjusted == self.params {
            return;
        }

        self.params = adjusted;
        debug!(
            "retessellating with param1 = {}, param2 = {}",
            adjusted.param1, adjusted.param2
        );
        self.renderer.rebuild_meshes(adjusted);
    }

    /// Reload the scene file from disk. On failure the current scene and
    /// camera are left untouched.
    fn reload_scene(&mut self) {
        let window_size = self.renderer.window_size();

        match load_scene(
            &self.settings,
            &mut self.renderer,
            window_size.width,
            window_size.height,
        ) {
            Ok(camera) => {
                self.camera = camera;
                info!("reloaded scene from {}", self.settings.scene_path.display());
            }
            Err(err) => error!("scene reload failed, keeping current scene: {err:#}"),
        }
    }

    /// Export the current frame as a PNG. Failure aborts only the export.
    fn export_frame(&mut self) {
        if let Err(err) = self
            .renderer
            .export_frame(&self.camera, &self.settings.export_path)
        {
            error!("frame export failed: {err:#}");
        }
    }

    pub fn mouse_motion(&mut self, delta: Vec2) {
        self.controller.process_mouse_motion(delta);
    }

    pub fn window_resized(&mut self, new_width: u32, new_height: u32) {
        self.renderer.resize(new_width, new_height);

        if let Err(err) = self.camera.set_viewport_size(new_width, new_height) {
            warn!("{err}");
        }
    }

    /// Advance the camera by one frame's worth of input.
    pub fn update(&mut self, delta: Duration) {
        self.controller.update_camera(&mut self.camera, delta);
    }

    pub fn render(&mut self) {
        match self.renderer.render(&self.camera) {
            Ok(()) => {}
            // Reconfigure the surface when it is lost or outdated.
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, re-applying current window size");
                let window_size = self.renderer.window_size();
                self.renderer.resize(window_size.width, window_size.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("graphics device is out of memory");
            }
            Err(err) => {
                error!("skipping frame after surface error: {err:?}");
            }
        }
    }
}

/// Load, flatten, and install the scene named by `settings`, returning the
/// camera it authors. The renderer's scene is only replaced once the file has
/// parsed successfully.
fn load_scene(
    settings: &Settings,
    renderer: &mut Renderer<'_>,
    viewport_width: u32,
    viewport_height: u32,
) -> anyhow::Result<Camera> {
    let description = scene::file::load(&settings.scene_path)?;
    let flattened = flatten::flatten(&description.root);

    info!(
        "loaded scene with {} shapes and {} lights",
        flattened.shapes.len(),
        flattened.lights.len()
    );

    renderer.set_scene(description.globals, &flattened);

    Ok(Camera::from_scene(
        &description.camera,
        settings.near_plane,
        settings.far_plane,
        viewport_width,
        viewport_height,
    ))
}
