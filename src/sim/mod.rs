//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod body;
pub mod collision;
pub mod entities;
pub mod level;
pub mod registry;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use body::{BodyTuning, Control, ControlMap, Controls, KinematicState};
pub use collision::{Axis, Resolution, classify, gather_candidates, resolve, stack_pair};
pub use entities::{
    BlastTarget, Enemy, Explosion, Marker, Patrol, Projectile, ProjectileKind, explosion_impulse,
    launch_velocity,
};
pub use level::{EnemySpawn, Level, Obstacle, ObstacleKind};
pub use registry::{RectHandle, WorldRegistry, scroll_delta};
pub use state::{EndReason, GamePhase, GameState, Player, PlayerStatus, RunStats};
pub use tick::{TickInput, tick};
