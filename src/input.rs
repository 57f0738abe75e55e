//! Pointer tracking.
//!
//! The scene only reacts to one input: where the cursor is. [`Pointer`]
//! follows `winit` cursor events and exposes the position in pixels, in
//! normalized device coordinates, and mapped into particle space.
//!
//! ```ignore
//! // In the window event handler:
//! pointer.handle_event(&event);
//!
//! // Per frame:
//! let world = pointer.to_world(field.half_extents());
//! ```

use glam::{Vec2, Vec3};
use winit::event::WindowEvent;

/// Cursor state for the current window.
#[derive(Debug, Clone)]
pub struct Pointer {
    position: Vec2,
    ndc: Vec2,
    inside: bool,
    window_size: (u32, u32),
}

impl Pointer {
    /// Create a pointer for a window of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            ndc: Vec2::ZERO,
            inside: false,
            window_size: (width, height),
        }
    }

    /// Cursor position in window pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Cursor position in normalized device coordinates (-1 to 1).
    ///
    /// Origin is at the window center, y increases upward.
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Whether the cursor is currently over the window.
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Map the cursor into particle space.
    ///
    /// `half_extents` is the field's bounding half-size; the cursor lands on
    /// the z = 0 plane. Returns `None` while the cursor is outside the window.
    pub fn to_world(&self, half_extents: Vec3) -> Option<Vec3> {
        if !self.inside {
            return None;
        }
        Some(Vec3::new(
            self.ndc.x * half_extents.x,
            self.ndc.y * half_extents.y,
            0.0,
        ))
    }

    /// Update window size for NDC calculations. Zero sizes are ignored.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.window_size = (width, height);
        }
    }

    /// Move the cursor to a pixel position.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.inside = true;

        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.ndc = Vec2::new(
                (x / w as f32) * 2.0 - 1.0,
                1.0 - (y / h as f32) * 2.0, // Y flipped
            );
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.move_to(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.inside = false;
            }
            WindowEvent::CursorEntered { .. } => {
                self.inside = true;
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
            }
            _ => {}
        }
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_origin() {
        let mut pointer = Pointer::new(800, 600);
        pointer.move_to(400.0, 300.0);

        assert!(pointer.ndc().x.abs() < 1e-6);
        assert!(pointer.ndc().y.abs() < 1e-6);
    }

    #[test]
    fn test_top_right_corner() {
        let mut pointer = Pointer::new(800, 600);
        pointer.move_to(800.0, 0.0);

        assert!((pointer.ndc().x - 1.0).abs() < 1e-6);
        assert!((pointer.ndc().y - 1.0).abs() < 1e-6);

        let world = pointer.to_world(Vec3::new(25.0, 15.0, 10.0)).unwrap();
        assert!((world.x - 25.0).abs() < 1e-4);
        assert!((world.y - 15.0).abs() < 1e-4);
        assert_eq!(world.z, 0.0);
    }

    #[test]
    fn test_absent_until_moved() {
        let pointer = Pointer::new(800, 600);
        assert!(pointer.to_world(Vec3::ONE).is_none());
    }

    #[test]
    fn test_zero_window_size_ignored() {
        let mut pointer = Pointer::new(800, 600);
        pointer.set_window_size(0, 0);
        pointer.move_to(400.0, 300.0);

        assert!(pointer.ndc().is_finite());
        assert!(pointer.ndc().x.abs() < 1e-6);
    }
}
