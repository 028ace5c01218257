use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::scene::SceneCamera;

/// Perspective camera in a right-handed coordinate system with +Z coming out
/// of the screen. Positive rotations are counterclockwise around the axis of
/// rotation.
///
/// The following transforms points from local space to clip space:
///  `V_clip = M_projection * M_view * M_model * M_local`
///
/// WebGPU clip space is the unit cube from (-1, -1, -1) at the front bottom
/// left to (1, 1, 1) at the back top right, +Z into the screen.
pub struct Camera {
    /// The position of the camera in world space.
    eye: Vec3,
    /// The world space point the center of the view aims at.
    target: Vec3,
    /// The camera's up direction.
    up: Vec3,
    /// World space direction considered straight up, used to rebuild the
    /// camera frame when reorienting.
    world_up: Vec3,
    /// Viewport width divided by viewport height.
    aspect: f32,
    /// Vertical field of view in radians.
    fov_y: f32,
    z_near: f32,
    z_far: f32,
    viewport_width: f32,
    viewport_height: f32,
}

impl Camera {
    /// Create a new camera at `eye` aiming at `target` with `up` as the
    /// camera's upward direction.
    ///
    /// The aspect ratio is set to zero if either viewport dimension is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        z_near: f32,
        z_far: f32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        assert!(fov_y > 0.0);
        assert!(z_near >= 0.0);
        assert!(z_far > z_near);
        assert!(eye != target);

        let up = up.normalize();

        Self {
            eye,
            target,
            up,
            world_up: up,
            aspect: if viewport_width > 0 && viewport_height > 0 {
                viewport_width as f32 / viewport_height as f32
            } else {
                0.0
            },
            fov_y,
            z_near,
            z_far,
            viewport_width: viewport_width as f32,
            viewport_height: viewport_height as f32,
        }
    }

    /// Create a camera from scene file camera parameters. Clip planes come
    /// from viewer settings because scene files do not author them.
    pub fn from_scene(
        scene_camera: &SceneCamera,
        z_near: f32,
        z_far: f32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        Self::new(
            scene_camera.position,
            scene_camera.focus,
            scene_camera.up,
            scene_camera.height_angle,
            z_near,
            z_far,
            viewport_width,
            viewport_height,
        )
    }

    /// Reorient the camera to be located at `eye` and look at `target`. Both
    /// points should be in world space.
    ///
    /// Calling `reorient` rebuilds the camera's local coordinate system with
    /// the Gram-Schmidt process.
    pub fn reorient(&mut self, new_eye: Vec3, new_target: Vec3) {
        self.eye = new_eye;
        self.target = new_target;

        // NOTE: This direction is the _opposite_ of the camera's facing
        // direction (target to eye rather than eye to target) because the view
        // matrix coordinate system has the camera pointing down -Z.
        let new_direction = (self.eye - self.target).normalize();
        let new_right = Vec3::cross(self.world_up, new_direction).normalize();
        let new_up = Vec3::cross(new_direction, new_right);

        self.up = new_up;
    }

    /// Get the camera's view matrix, transforming coordinates from world
    /// space to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Get the camera's perspective projection matrix, transforming
    /// coordinates from view space to clip space.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    /// Resize the camera's viewport.
    pub fn set_viewport_size(
        &mut self,
        new_width: u32,
        new_height: u32,
    ) -> Result<(), InvalidCameraSize> {
        if new_width > 0 && new_height > 0 {
            self.aspect = new_width as f32 / new_height as f32;
            self.viewport_width = new_width as f32;
            self.viewport_height = new_height as f32;
            Ok(())
        } else {
            Err(InvalidCameraSize(new_width, new_height))
        }
    }

    /// Replace the vertical field of view, in radians.
    pub fn set_fov_y(&mut self, fov_y: f32) {
        assert!(fov_y > 0.0);
        self.fov_y = fov_y;
    }

    /// Replace the near and far clip distances.
    pub fn set_clip_planes(&mut self, z_near: f32, z_far: f32) {
        assert!(z_near >= 0.0);
        assert!(z_far > z_near);
        self.z_near = z_near;
        self.z_far = z_far;
    }

    /// Get the vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Get the near clip distance.
    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    /// Get the far clip distance.
    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// Get the world space unit vector pointing from the eye to the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize()
    }

    /// Get the position of the camera in world space.
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Get the point at which the camera is focused on.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Get the camera's up axis.
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Get the camera viewport width in pixels.
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    /// Get the camera viewport height in pixels.
    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Get the world up axis (not the camera's up axis).
    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }
}

#[derive(Debug, Error)]
#[error("camera viewport width and height must be larger than zero but width was {} and height was {}", .0, .1)]
pub struct InvalidCameraSize(pub u32, pub u32);
