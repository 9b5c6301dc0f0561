//! # engine_draw
//!
//! Draw-command events for the host renderer. Each type implements
//! [`Event`] under a `Graphics.*` name; a system declares an `EventWriter`
//! for that name and sends one value per draw.

use std::ffi::CStr;

use engine_math::{Color, Transform, Vec2};
use engine_module::Event;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of text inside its bounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A filled circle approximated by `subdivisions` segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrawCircle {
    pub position: Vec2,
    pub z: f32,
    pub radius: f32,
    pub subdivisions: u32,
    /// Rotation in radians; visible only at low subdivision counts.
    pub rotation: f32,
    pub color: Color,
}

impl DrawCircle {
    /// Default segment count for a smooth circle.
    pub const DEFAULT_SUBDIVISIONS: u32 = 32;

    /// A white circle at depth zero.
    #[must_use]
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            z: 0.0,
            radius,
            subdivisions: Self::DEFAULT_SUBDIVISIONS,
            rotation: 0.0,
            color: Color::WHITE,
        }
    }

    #[must_use]
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Event for DrawCircle {
    fn type_name() -> &'static CStr {
        c"Graphics.DrawCircle"
    }
}

/// A line of text laid out inside `bounds`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawText {
    pub text: String,
    pub z: f32,
    pub font_size: f32,
    pub alignment: TextAlignment,
    pub bounds: Vec2,
    pub color: Color,
    pub transform: Transform,
}

impl DrawText {
    /// Left-aligned white text with unbounded layout.
    #[must_use]
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            z: 0.0,
            font_size,
            alignment: TextAlignment::Left,
            bounds: Vec2::ZERO,
            color: Color::WHITE,
            transform: Transform::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: TextAlignment, bounds: Vec2) -> Self {
        self.alignment = alignment;
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Returns `true` if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Event for DrawText {
    fn type_name() -> &'static CStr {
        c"Graphics.DrawText"
    }
}

/// A straight line segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrawLine {
    pub from: Vec2,
    pub to: Vec2,
    pub z: f32,
    pub thickness: f32,
    pub color: Color,
}

impl DrawLine {
    /// A one-unit white line at depth zero.
    #[must_use]
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self {
            from,
            to,
            z: 0.0,
            thickness: 1.0,
            color: Color::WHITE,
        }
    }

    #[must_use]
    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    #[must_use]
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }
}

impl Event for DrawLine {
    fn type_name() -> &'static CStr {
        c"Graphics.DrawLine"
    }
}

/// A unit rectangle mapped through `transform`; scale sets its size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DrawRectangle {
    pub transform: Transform,
    pub color: Color,
}

impl DrawRectangle {
    #[must_use]
    pub fn new(transform: Transform, color: Color) -> Self {
        Self { transform, color }
    }

    /// Width and height in screen units.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.transform.scale
    }
}

impl Event for DrawRectangle {
    fn type_name() -> &'static CStr {
        c"Graphics.DrawRectangle"
    }
}

#[cfg(test)]
mod tests {
    use engine_module::payload;

    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(DrawCircle::identifier().as_c_str(), c"Graphics.DrawCircle");
        assert_eq!(DrawText::identifier().as_c_str(), c"Graphics.DrawText");
        assert_eq!(DrawLine::identifier().as_c_str(), c"Graphics.DrawLine");
        assert_eq!(
            DrawRectangle::identifier().as_c_str(),
            c"Graphics.DrawRectangle"
        );
    }

    #[test]
    fn test_circle_defaults() {
        let circle = DrawCircle::new(Vec2::new(100.0, 100.0), 100.0);
        assert_eq!(circle.subdivisions, 32);
        assert_eq!(circle.color, Color::WHITE);
        assert_eq!(circle.z, 0.0);
    }

    #[test]
    fn test_line_length() {
        let line = DrawLine::new(Vec2::ZERO, Vec2::new(3.0, 4.0)).with_thickness(4.0);
        assert_eq!(line.length(), 5.0);
        assert_eq!(line.thickness, 4.0);
    }

    #[test]
    fn test_rectangle_size_is_scale() {
        let rect = DrawRectangle::new(
            Transform::from_position(Vec2::new(600.0, 600.0)).with_scale(Vec2::new(100.0, 50.0)),
            Color::YELLOW,
        );
        assert_eq!(rect.size(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_text_payload_decodes() {
        let text = DrawText::new("JASON", 64.0)
            .with_alignment(TextAlignment::Center, Vec2::new(200.0, 100.0))
            .with_z(10.0);
        let bytes = payload::encode(&text).unwrap();
        let restored: DrawText = payload::decode(&bytes).unwrap();
        assert_eq!(restored, text);
        assert!(!restored.is_empty());
        assert!(DrawText::new("", 12.0).is_empty());
    }
}
