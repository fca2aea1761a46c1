//! Orbital camera for the 3D particle view
//!
//! The camera keeps an explicit orthonormal orientation frame and composes
//! every drag as a rotation about its own live right/up axes. Rotating about
//! the camera's current axes (instead of nudging world-space yaw/pitch
//! angles) keeps the controls orientation-independent and avoids the pole
//! flip that Euler-angle orbit cameras hit at high pitch.

use glam::{Mat3, Mat4, Quat, Vec3};

/// Radians of rotation per pixel of drag.
pub const ROTATION_SPEED: f32 = 0.005;
/// Fractional change of the zoom target per wheel/pinch step.
pub const ZOOM_SPEED: f32 = 0.1;
/// Exponential smoothing factor applied to the distance each frame.
pub const ZOOM_SMOOTHING: f32 = 0.1;

pub const MIN_DISTANCE: f32 = 10.0;
pub const MAX_DISTANCE: f32 = 500.0;
pub const DEFAULT_DISTANCE: f32 = 100.0;

/// 3D perspective camera orbiting the origin.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Columns are the camera's right, up, and forward axes.
    orientation: Mat3,
    /// Current (smoothed) distance from the origin.
    pub distance: f32,
    /// Distance the zoom input is steering toward.
    pub target_distance: f32,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            orientation: Mat3::IDENTITY,
            distance: DEFAULT_DISTANCE,
            target_distance: DEFAULT_DISTANCE,
            fov: 45.0f32.to_radians(),
            aspect_ratio,
            near: 0.1,
            far: 2000.0,
        }
    }

    /// Apply a drag of `(dx, dy)` pixels: yaw about the current up axis,
    /// pitch about the current right axis.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let yaw = Mat3::from_axis_angle(self.orientation.y_axis, -dx * ROTATION_SPEED);
        let pitch = Mat3::from_axis_angle(self.orientation.x_axis, -dy * ROTATION_SPEED);
        self.orientation = pitch * yaw * self.orientation;
        // Route through a unit quaternion so accumulated float error cannot
        // drift the frame away from a proper rotation.
        self.orientation = Mat3::from_quat(Quat::from_mat3(&self.orientation).normalize());
    }

    /// Scale the zoom target by one wheel/pinch step. Positive `delta` zooms
    /// in. The smoothed `distance` is untouched until `update()`.
    pub fn zoom(&mut self, delta: f32) {
        let factor = if delta > 0.0 {
            1.0 - ZOOM_SPEED
        } else {
            1.0 + ZOOM_SPEED
        };
        self.target_distance = (self.target_distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Per-frame smoothing step; rotation is immediate, zoom is inertial.
    pub fn update(&mut self) {
        self.distance += (self.target_distance - self.distance) * ZOOM_SMOOTHING;
    }

    /// Restore the identity orientation and the default distance.
    pub fn reset(&mut self) {
        self.orientation = Mat3::IDENTITY;
        self.distance = DEFAULT_DISTANCE;
        self.target_distance = DEFAULT_DISTANCE;
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.orientation.z_axis * self.distance
    }

    pub fn up(&self) -> Vec3 {
        self.orientation.y_axis
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, self.up())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// The raw orientation frame (columns: right, up, forward).
    pub fn orientation(&self) -> Mat3 {
        self.orientation
    }
}

/// Camera uniform data for shaders.
///
/// The view matrix rides along so the vertex shader can billboard quads from
/// its rows; `position_time` packs the camera world position with the
/// animation clock.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub position_time: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &OrbitCamera, time: f32) -> Self {
        let position = camera.position();
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            position_time: [position.x, position.y, position.z, time],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-4;

    fn assert_orthonormal(m: Mat3) {
        assert!((m.x_axis.length() - 1.0).abs() < TOL, "right axis not unit");
        assert!((m.y_axis.length() - 1.0).abs() < TOL, "up axis not unit");
        assert!((m.z_axis.length() - 1.0).abs() < TOL, "forward axis not unit");
        assert!(m.x_axis.dot(m.y_axis).abs() < TOL);
        assert!(m.x_axis.dot(m.z_axis).abs() < TOL);
        assert!(m.y_axis.dot(m.z_axis).abs() < TOL);
        assert!((m.determinant() - 1.0).abs() < TOL, "not a proper rotation");
    }

    #[test]
    fn drag_right_rotates_and_stays_orthonormal() {
        let mut camera = OrbitCamera::new(16.0 / 9.0);
        let initial = camera.position();
        assert!((initial - Vec3::new(0.0, 0.0, DEFAULT_DISTANCE)).length() < TOL);

        camera.orbit(100.0, 0.0);
        for _ in 0..200 {
            camera.update();
        }

        assert_orthonormal(camera.orientation());
        assert!(
            (camera.position() - initial).length() > 1.0,
            "drag should move the camera position"
        );
        // Yaw about the up axis keeps the orbit radius fixed.
        assert!((camera.position().length() - DEFAULT_DISTANCE).abs() < TOL);
    }

    #[test]
    fn orientation_survives_a_long_gesture_session() {
        let mut camera = OrbitCamera::new(1.0);
        for i in 0..5000 {
            let dx = ((i % 17) as f32) - 8.0;
            let dy = ((i % 11) as f32) - 5.0;
            camera.orbit(dx, dy);
        }
        assert_orthonormal(camera.orientation());
    }

    #[test]
    fn zoom_is_smoothed_and_clamped() {
        let mut camera = OrbitCamera::new(1.0);

        camera.zoom(-1.0);
        assert_eq!(camera.distance, DEFAULT_DISTANCE, "zoom must not move distance directly");
        assert!(camera.target_distance > DEFAULT_DISTANCE);

        for _ in 0..500 {
            camera.update();
            assert!(camera.distance >= MIN_DISTANCE && camera.distance <= MAX_DISTANCE);
        }
        assert!((camera.distance - camera.target_distance).abs() < TOL);

        // Repeated zoom-out saturates at the far clamp.
        for _ in 0..200 {
            camera.zoom(-1.0);
        }
        assert_eq!(camera.target_distance, MAX_DISTANCE);
        // And zoom-in saturates at the near clamp.
        for _ in 0..200 {
            camera.zoom(1.0);
        }
        assert_eq!(camera.target_distance, MIN_DISTANCE);
    }

    #[test]
    fn reset_restores_identity_frame() {
        let mut camera = OrbitCamera::new(1.0);
        camera.orbit(37.0, -12.0);
        camera.zoom(-1.0);
        camera.update();

        camera.reset();
        assert_eq!(camera.distance, DEFAULT_DISTANCE);
        assert_eq!(camera.target_distance, DEFAULT_DISTANCE);
        assert!((camera.position() - Vec3::new(0.0, 0.0, DEFAULT_DISTANCE)).length() < TOL);
    }

    #[test]
    fn pitch_does_not_flip_at_the_poles() {
        let mut camera = OrbitCamera::new(1.0);
        // Drag far past vertical; a naive yaw/pitch camera would flip here.
        for _ in 0..100 {
            camera.orbit(0.0, 50.0);
        }
        assert_orthonormal(camera.orientation());
    }
}
