//! World Shift - a side-scrolling platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, collisions, scrolling, level generation)
//! - `render`: Rectangle draw lists for an external renderer
//! - `settings`: Data-driven tuning, loading and validation

pub mod render;
pub mod settings;
pub mod sim;

pub use render::{DrawItem, RectInstance, RenderSink, VisualTag};
pub use settings::{Config, ConfigError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate the external frame loop is expected to run at
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Default viewport size (pixels)
    pub const SCREEN_WIDTH: f32 = 1600.0;
    pub const SCREEN_HEIGHT: f32 = 900.0;

    /// Player box size
    pub const PLAYER_SIZE: f32 = 64.0;

    /// Two edges closer than this are treated as touching
    pub const CONTACT_EPSILON: f32 = 1.0e-3;

    /// Smallest divisor accepted by throw / explosion scaling
    pub const MIN_DIVISOR: f32 = 1.0e-3;
}
