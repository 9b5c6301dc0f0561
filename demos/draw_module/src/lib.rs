//! Demo game module.
//!
//! Declares a single per-frame system with four `EventWriter` arguments and
//! writes one draw command to each of them whenever the host runs it.
//!
//! Build as a `cdylib` and load it from the host; the entry points are
//! generated by [`engine_module::export_module!`].

use std::ffi::c_void;

use engine_draw::{DrawCircle, DrawLine, DrawRectangle, DrawText, TextAlignment};
use engine_math::{Color, Transform, Vec2};
use engine_module::{Event, GameModule, ModuleConfig, ModuleContext, ModuleError, SystemDescriptor};
use tracing::info;

engine_module::export_module!(ModuleContext::new(
    ModuleConfig::new("draw_module"),
    DrawModule
));

/// Catalog index of [`draw_system`].
const DRAW_SYSTEM: usize = 0;

// Argument positions of `draw_system`.
const CIRCLE: usize = 0;
const TEXT: usize = 1;
const LINE: usize = 2;
const RECTANGLE: usize = 3;

/// The demo game.
pub struct DrawModule;

impl GameModule for DrawModule {
    fn systems(&self) -> Result<Vec<SystemDescriptor>, ModuleError> {
        Ok(vec![
            SystemDescriptor::new(draw_system)
                .event_writer(DrawCircle::identifier())
                .event_writer(DrawText::identifier())
                .event_writer(DrawLine::identifier())
                .event_writer(DrawRectangle::identifier()),
        ])
    }
}

#[must_use]
pub fn circle() -> DrawCircle {
    DrawCircle::new(Vec2::new(100.0, 100.0), 100.0).with_z(10.0)
}

#[must_use]
pub fn label() -> DrawText {
    DrawText::new("JASON", 64.0)
        .with_z(10.0)
        .with_alignment(TextAlignment::Center, Vec2::new(200.0, 100.0))
        .with_transform(Transform::from_position(Vec2::new(300.0, 300.0)).with_z(1.0))
}

#[must_use]
pub fn line() -> DrawLine {
    DrawLine::new(Vec2::new(400.0, 400.0), Vec2::new(600.0, 450.0))
        .with_z(1.0)
        .with_thickness(4.0)
        .with_color(Color::new(0.0, 1.0, 1.0, 1.0))
}

#[must_use]
pub fn rectangle() -> DrawRectangle {
    DrawRectangle::new(
        Transform::from_position(Vec2::new(600.0, 600.0))
            .with_z(1.0)
            .with_scale(Vec2::new(100.0, 100.0)),
        Color::YELLOW,
    )
}

/// Emit one frame of draw commands.
///
/// # Safety
///
/// `args` must point to one readable machine word per declared argument.
unsafe extern "C" fn draw_system(args: *const c_void) -> usize {
    // SAFETY: forwarded from the host contract.
    unsafe {
        module().invoke(DRAW_SYSTEM, args, |call| {
            call.send(CIRCLE, &circle())?;
            call.send(TEXT, &label())?;
            call.send(LINE, &line())?;
            call.send(RECTANGLE, &rectangle())?;
            info!(system = DRAW_SYSTEM, "frame drawn");
            Ok(())
        })
    }
}
