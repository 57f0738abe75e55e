//! Cameras for the backdrop and the globe.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

use glam::{Mat4, Vec2, Vec3};

/// Radians of rotation per pixel dragged, before `rotate_speed`.
const DRAG_SENSITIVITY: f32 = 0.005;

/// Orbit camera.
///
/// Position is given by `yaw` around +Y and `pitch` above the XZ plane, at
/// `distance` from `target`. The globe camera turns on its own and can be
/// dragged, but pitch is clamped and there is no zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Radians per second of automatic yaw (0 disables).
    pub auto_rotate: f32,
    /// Scales drag rotation.
    pub rotate_speed: f32,
    /// Allowed pitch range, radians.
    pub pitch_limits: (f32, f32),
    dragging: bool,
}

impl Camera {
    /// Fixed camera looking down -Z at the particle backdrop.
    pub fn backdrop() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 30.0,
            target: Vec3::ZERO,
            fov_deg: 60.0,
            auto_rotate: 0.0,
            rotate_speed: 0.0,
            pitch_limits: (0.0, 0.0),
            dragging: false,
        }
    }

    /// Orbit camera for the globe.
    ///
    /// The polar angle (from +Y) stays within [π/3, 2π/3], which is a pitch
    /// of ±π/6.
    pub fn globe() -> Self {
        let max_pitch = FRAC_PI_2 - FRAC_PI_3;
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 10.0,
            target: Vec3::ZERO,
            fov_deg: 35.0,
            auto_rotate: std::f32::consts::TAU / 60.0 * 0.3,
            rotate_speed: 0.4,
            pitch_limits: (-max_pitch, max_pitch),
            dragging: false,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Angle between the view direction and +Y.
    pub fn polar_angle(&self) -> f32 {
        FRAC_PI_2 - self.pitch
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), aspect.max(f32::EPSILON), 0.1, 200.0)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Half-size of the visible area on the plane through `target` facing
    /// the camera.
    pub fn visible_half_extents(&self, aspect: f32) -> Vec2 {
        let half_height = (self.fov_deg.to_radians() * 0.5).tan() * self.distance;
        Vec2::new(half_height * aspect.max(f32::EPSILON), half_height)
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Rotate by a pointer drag of `dx`, `dy` pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let k = DRAG_SENSITIVITY * self.rotate_speed;
        self.yaw -= dx * k;
        self.pitch = (self.pitch + dy * k).clamp(self.pitch_limits.0, self.pitch_limits.1);
    }

    /// Apply auto-rotation for `delta` seconds. Paused while dragging.
    pub fn update(&mut self, delta: f32) {
        if !self.dragging {
            self.yaw += self.auto_rotate * delta;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::globe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_polar_clamp() {
        let mut camera = Camera::globe();
        camera.drag(0.0, 1.0e6);
        assert!((camera.polar_angle() - PI / 3.0).abs() < 1e-5);
        camera.drag(0.0, -1.0e6);
        assert!((camera.polar_angle() - 2.0 * PI / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_auto_rotate_pauses_while_dragging() {
        let mut camera = Camera::globe();
        camera.update(1.0);
        let yaw = camera.yaw;
        assert!(yaw > 0.0);

        camera.set_dragging(true);
        camera.update(1.0);
        assert_eq!(camera.yaw, yaw);
    }

    #[test]
    fn test_drag_keeps_distance() {
        let mut camera = Camera::globe();
        camera.drag(120.0, 40.0);
        assert!((camera.position().length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_backdrop_extents() {
        let camera = Camera::backdrop();
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 30.0));
        let half = camera.visible_half_extents(16.0 / 9.0);
        assert!((half.y - 17.320508).abs() < 1e-3);
        assert!((half.x - 30.792015).abs() < 1e-3);
    }
}
