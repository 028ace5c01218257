//! Interactive camera control: keyboard movement plus mouse drag look.

use std::time::Duration;

use glam::{Quat, Vec2, Vec3};
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::camera::Camera;

pub trait CameraController {
    /// Updates the controller state with the given input event. Returns `true`
    /// if `event` was consumed by this controller, otherwise false.
    fn process_input(&mut self, event: &WindowEvent) -> bool;

    /// Accumulates mouse motion deltas until camera updates are applied in
    /// `update_camera`.
    fn process_mouse_motion(&mut self, delta: Vec2);

    /// Applies updates to the camera that reflect the current state of this
    /// controller.
    fn update_camera(&mut self, camera: &mut Camera, delta: Duration);
}

/// A first person controller: W/A/S/D moves in the view plane, Space and
/// Control move along world up and down, and dragging with the left mouse
/// button turns the camera.
pub struct FreeLookCameraController {
    /// Movement speed in world units per second.
    move_speed: f32,
    /// Look speed in radians per pixel of mouse motion.
    look_speed: f32,
    move_forward: bool,
    move_backward: bool,
    move_left: bool,
    move_right: bool,
    move_up: bool,
    move_down: bool,
    /// Mouse motion only turns the camera while the left button is held.
    dragging: bool,
    mouse_delta: Option<Vec2>,
}

impl FreeLookCameraController {
    pub fn new() -> Self {
        Self {
            move_speed: 5.0,
            look_speed: 0.005,
            move_forward: false,
            move_backward: false,
            move_left: false,
            move_right: false,
            move_up: false,
            move_down: false,
            dragging: false,
            mouse_delta: None,
        }
    }
}

impl Default for FreeLookCameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController for FreeLookCameraController {
    fn process_input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event: keyboard_input_event,
                ..
            } => {
                let is_pressed = keyboard_input_event.state == ElementState::Pressed;

                match keyboard_input_event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyW) => {
                        self.move_forward = is_pressed;
                        true
                    }
                    PhysicalKey::Code(KeyCode::KeyS) => {
                        self.move_backward = is_pressed;
                        true
                    }
                    PhysicalKey::Code(KeyCode::KeyA) => {
                        self.move_left = is_pressed;
                        true
                    }
                    PhysicalKey::Code(KeyCode::KeyD) => {
                        self.move_right = is_pressed;
                        true
                    }
                    PhysicalKey::Code(KeyCode::Space) => {
                        self.move_up = is_pressed;
                        true
                    }
                    PhysicalKey::Code(KeyCode::ControlLeft)
                    | PhysicalKey::Code(KeyCode::ControlRight) => {
                        self.move_down = is_pressed;
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = state == &ElementState::Pressed;
                true
            }
            _ => false,
        }
    }

    fn process_mouse_motion(&mut self, delta: Vec2) {
        if self.dragging {
            self.mouse_delta = Some(self.mouse_delta.unwrap_or_default() + delta);
        }
    }

    fn update_camera(&mut self, camera: &mut Camera, delta: Duration) {
        let delta_secs = delta.as_secs_f32();
        let move_amount = self.move_speed * delta_secs;

        let forward = camera.forward();
        let right = Vec3::cross(forward, camera.up()).normalize();

        let mut eye = camera.eye();

        if self.move_forward {
            eye += move_amount * forward;
        }

        if self.move_backward {
            eye -= move_amount * forward;
        }

        if self.move_left {
            eye -= move_amount * right;
        }

        if self.move_right {
            eye += move_amount * right;
        }

        if self.move_up {
            eye += move_amount * camera.world_up();
        }

        if self.move_down {
            eye -= move_amount * camera.world_up();
        }

        // Horizontal drag turns about world up; vertical drag pitches about
        // the camera's right axis.
        let mouse_delta = self.mouse_delta.take().unwrap_or_default();
        let yaw = Quat::from_axis_angle(camera.world_up(), -mouse_delta.x * self.look_speed);
        let pitch = Quat::from_axis_angle(right, -mouse_delta.y * self.look_speed);

        let mut look_dir = pitch * (yaw * forward);

        // Refuse pitch contributions that would flip over the top or bottom.
        if look_dir.dot(camera.world_up()).abs() > 0.99 {
            look_dir = yaw * forward;
        }

        camera.reorient(eye, eye + look_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            f32::to_radians(45.0),
            0.1,
            100.0,
            640,
            480,
        )
    }

    #[test]
    fn forward_key_moves_along_look_direction() {
        let mut camera = test_camera();
        let mut controller = FreeLookCameraController::new();
        controller.move_forward = true;

        controller.update_camera(&mut camera, Duration::from_secs(1));

        // Forward is -z from the starting pose; one second at 5 units/sec.
        assert!(camera.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn vertical_keys_move_along_world_up() {
        let mut camera = test_camera();
        let mut controller = FreeLookCameraController::new();
        controller.move_up = true;

        controller.update_camera(&mut camera, Duration::from_millis(200));

        assert!(camera.eye().abs_diff_eq(Vec3::new(0.0, 1.0, 5.0), 1e-5));
    }

    #[test]
    fn drag_turns_without_moving_the_eye() {
        let mut camera = test_camera();
        let mut controller = FreeLookCameraController::new();
        controller.dragging = true;
        controller.process_mouse_motion(Vec2::new(100.0, 0.0));

        let eye_before = camera.eye();
        let forward_before = camera.forward();

        controller.update_camera(&mut camera, Duration::from_millis(16));

        assert_eq!(camera.eye(), eye_before);
        assert!(camera.forward().dot(forward_before) < 1.0 - 1e-6);
        // Horizontal drag keeps the look direction level.
        assert!(camera.forward().y.abs() < 1e-5);
    }

    #[test]
    fn motion_is_ignored_unless_dragging() {
        let mut camera = test_camera();
        let mut controller = FreeLookCameraController::new();
        controller.process_mouse_motion(Vec2::new(100.0, 50.0));

        let forward_before = camera.forward();
        controller.update_camera(&mut camera, Duration::from_millis(16));

        assert!(camera.forward().abs_diff_eq(forward_before, 1e-6));
    }
}
