//! # engine_math
//!
//! 2D math value types carried in game-module payloads. Re-exports [`glam`]
//! for vector algebra and defines the [`Transform`] and [`Color`] layouts the
//! host's renderer expects.

pub mod color;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{Mat3, Vec2};

pub use color::Color;
pub use transform::Transform;
