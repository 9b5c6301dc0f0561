//! 2D transform.
//!
//! [`Transform`] places a drawable in screen space: where it sits, how it is
//! layered, and how it is scaled, skewed and rotated around its pivot.

use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A 2D transform with draw-order depth.
///
/// Composition order is pivot, scale, skew, rotation, then translation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Screen-space position.
    pub position: Vec2,
    /// Draw-order depth; higher values are drawn on top.
    pub z: f32,
    /// Per-axis scale factor.
    pub scale: Vec2,
    /// Shear angles in radians along x and y.
    pub skew: Vec2,
    /// Local-space origin of scaling and rotation.
    pub pivot: Vec2,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
}

impl Transform {
    /// The identity transform: origin, depth zero, unit scale, no skew or rotation.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        z: 0.0,
        scale: Vec2::ONE,
        skew: Vec2::ZERO,
        pivot: Vec2::ZERO,
        rotation: 0.0,
    };

    /// Create a new transform at the given position and default everything else.
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_skew(mut self, skew: Vec2) -> Self {
        self.skew = skew;
        self
    }

    #[must_use]
    pub fn with_pivot(mut self, pivot: Vec2) -> Self {
        self.pivot = pivot;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Translate the transform by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.position += offset;
        self
    }

    /// Rotate the transform by `angle` radians.
    #[must_use]
    pub fn rotated(mut self, angle: f32) -> Self {
        self.rotation += angle;
        self
    }

    /// Compute the 3×3 affine model matrix for this transform. Depth is not
    /// part of the matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Mat3 {
        let skew = Mat3::from_cols(
            Vec3::new(1.0, self.skew.y.tan(), 0.0),
            Vec3::new(self.skew.x.tan(), 1.0, 0.0),
            Vec3::Z,
        );
        Mat3::from_translation(self.position)
            * Mat3::from_angle(self.rotation)
            * skew
            * Mat3::from_scale(self.scale)
            * Mat3::from_translation(-self.pivot)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
