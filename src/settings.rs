//! Game tuning and configuration
//!
//! Everything the simulation reads as a constant lives in [`Config`]. A config
//! is loaded from JSON (missing fields fall back to defaults) and must pass
//! [`Config::validate`] before a run starts, so bad ranges fail at load time
//! instead of mid-run.

use std::path::Path;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::body::{BodyTuning, ControlMap};

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Inclusive range with min > max, or a negative lower bound
    InvalidRange {
        field: &'static str,
        min: i32,
        max: i32,
    },
    /// Value that must be strictly positive
    NonPositive { field: &'static str, value: f32 },
    /// Value outside its allowed interval
    OutOfBounds {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::InvalidRange { field, min, max } => {
                write!(f, "{field}: invalid range {min}..={max}")
            }
            Self::NonPositive { field, value } => {
                write!(f, "{field}: must be positive, got {value}")
            }
            Self::OutOfBounds {
                field,
                value,
                min,
                max,
            } => write!(f, "{field}: {value} outside [{min}, {max}]"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Inclusive integer range used for random counts and sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i32,
    pub max: i32,
}

impl IntRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: i32) -> Self {
        Self::new(value, value)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> i32 {
        rng.random_range(self.min..=self.max)
    }

    /// Ranges of counts and widths: non-negative and ordered
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min < 0 || self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Ranges of sizes: strictly positive and ordered
    fn validate_positive(&self, field: &'static str) -> Result<(), ConfigError> {
        self.validate(field)?;
        if self.min == 0 {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Crate / bomb / marker launch parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowTuning {
    /// Launch velocity = (target - origin) / spread_divisor
    pub spread_divisor: f32,
    pub crate_size: Vec2,
    /// Ticks before a crate disappears (None = never)
    pub crate_lifetime: Option<u32>,
    pub bomb_size: Vec2,
    /// Ticks from throw to detonation
    pub bomb_fuse_ticks: u32,
    /// Ticks between prediction markers
    pub marker_interval: u32,
    pub marker_lifetime: u32,
    pub marker_size: Vec2,
}

impl Default for ThrowTuning {
    fn default() -> Self {
        Self {
            spread_divisor: 15.0,
            crate_size: Vec2::splat(32.0),
            crate_lifetime: None,
            bomb_size: Vec2::splat(24.0),
            bomb_fuse_ticks: 90,
            marker_interval: 4,
            marker_lifetime: 30,
            marker_size: Vec2::splat(8.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionTuning {
    pub start_radius: f32,
    /// Radius the blast grows to; nothing at or beyond it is pushed
    pub max_radius: f32,
    /// Radius added per tick
    pub growth: f32,
    pub lifetime_ticks: u32,
    /// Impulse divisor: impulse = (max_radius - distance) / power_border
    pub power_border: f32,
}

impl Default for ExplosionTuning {
    fn default() -> Self {
        Self {
            start_radius: 16.0,
            max_radius: 160.0,
            growth: 24.0,
            lifetime_ticks: 8,
            power_border: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvulnerabilityTuning {
    pub duration_ticks: u32,
    /// Ticks after expiry before it can be activated again
    pub rearm_ticks: u32,
}

impl Default for InvulnerabilityTuning {
    fn default() -> Self {
        Self {
            duration_ticks: 3 * TICKS_PER_SECOND,
            rearm_ticks: 2 * TICKS_PER_SECOND,
        }
    }
}

/// Procedural level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    /// Screen y of the floor's top edge at level start
    pub floor_top: f32,
    pub floor_thickness: f32,
    /// Free vertical space between ceiling and floor
    pub band_height: f32,
    pub ceiling_thickness: f32,
    pub segment_width: IntRange,
    pub hole_width: IntRange,
    pub obstacle_count: IntRange,
    pub obstacle_size: IntRange,
    pub enemy_count: IntRange,
    pub enemy_size: IntRange,
    /// Chance (0-100) that an enemy patrols instead of standing still
    pub patrol_percent: u32,
    pub patrol_speed: f32,
    pub patrol_range: IntRange,
    /// Rejection-sampling tries per placed rectangle
    pub placement_attempts: u32,
    /// The run ends once the floor is this far above the player's top edge
    pub fall_depth: f32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            floor_top: 760.0,
            floor_thickness: 96.0,
            band_height: 640.0,
            ceiling_thickness: 64.0,
            segment_width: IntRange::new(256, 768),
            hole_width: IntRange::new(64, 192),
            obstacle_count: IntRange::new(1, 4),
            obstacle_size: IntRange::new(48, 128),
            enemy_count: IntRange::new(0, 3),
            enemy_size: IntRange::new(32, 48),
            patrol_percent: 50,
            patrol_speed: 2.0,
            patrol_range: IntRange::new(64, 256),
            placement_attempts: 16,
            fall_depth: SCREEN_HEIGHT,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Viewport size; the player is pinned at its horizontal centre
    pub screen: Vec2,
    pub controls: ControlMap,
    pub player: BodyTuning,
    pub crates: BodyTuning,
    pub bombs: BodyTuning,
    pub throw: ThrowTuning,
    pub explosion: ExplosionTuning,
    pub invulnerability: InvulnerabilityTuning,
    pub level: LevelTuning,
}

impl Default for Config {
    fn default() -> Self {
        let projectile = BodyTuning {
            walk_accel: 0.0,
            walk_max: 32.0,
            jump_speed: 0.0,
            gravity: 1.0,
            max_fall_speed: Some(16.0),
            friction: Some(0.8),
            stop_epsilon: 0.1,
        };
        Self {
            screen: Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            controls: ControlMap::default(),
            player: BodyTuning::default(),
            crates: projectile.clone(),
            bombs: BodyTuning {
                friction: None,
                ..projectile
            },
            throw: ThrowTuning::default(),
            explosion: ExplosionTuning::default(),
            invulnerability: InvulnerabilityTuning::default(),
            level: LevelTuning::default(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn positive_size(field: &'static str, size: Vec2) -> Result<(), ConfigError> {
    positive(field, size.x)?;
    positive(field, size.y)
}

fn positive_ticks(field: &'static str, ticks: u32) -> Result<(), ConfigError> {
    positive(field, ticks as f32)
}

fn within(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfBounds {
            field,
            value,
            min,
            max,
        })
    }
}

fn validate_body(prefix: &'static str, tuning: &BodyTuning) -> Result<(), ConfigError> {
    positive(prefix, tuning.walk_max)?;
    within(prefix, tuning.gravity, 0.0, f32::MAX)?;
    within(prefix, tuning.walk_accel, 0.0, f32::MAX)?;
    within(prefix, tuning.jump_speed, 0.0, f32::MAX)?;
    if let Some(max_fall) = tuning.max_fall_speed {
        positive(prefix, max_fall)?;
    }
    if let Some(friction) = tuning.friction {
        // Zero friction would stop bodies dead; above one would accelerate them
        within(prefix, friction, f32::MIN_POSITIVE, 1.0)?;
    }
    Ok(())
}

impl Config {
    /// Parse a JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every range and divisor; fails fast before a run starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_size("screen", self.screen)?;

        validate_body("player", &self.player)?;
        validate_body("crates", &self.crates)?;
        validate_body("bombs", &self.bombs)?;

        let throw = &self.throw;
        positive("throw.spread_divisor", throw.spread_divisor)?;
        positive_size("throw.crate_size", throw.crate_size)?;
        positive_size("throw.bomb_size", throw.bomb_size)?;
        positive_size("throw.marker_size", throw.marker_size)?;
        positive_ticks("throw.bomb_fuse_ticks", throw.bomb_fuse_ticks)?;
        positive_ticks("throw.marker_interval", throw.marker_interval)?;
        positive_ticks("throw.marker_lifetime", throw.marker_lifetime)?;
        if let Some(lifetime) = throw.crate_lifetime {
            positive_ticks("throw.crate_lifetime", lifetime)?;
        }

        let explosion = &self.explosion;
        positive("explosion.start_radius", explosion.start_radius)?;
        within(
            "explosion.max_radius",
            explosion.max_radius,
            explosion.start_radius,
            f32::MAX,
        )?;
        within("explosion.growth", explosion.growth, 0.0, f32::MAX)?;
        positive_ticks("explosion.lifetime_ticks", explosion.lifetime_ticks)?;
        positive("explosion.power_border", explosion.power_border)?;

        positive_ticks(
            "invulnerability.duration_ticks",
            self.invulnerability.duration_ticks,
        )?;

        let level = &self.level;
        positive("level.floor_thickness", level.floor_thickness)?;
        positive("level.ceiling_thickness", level.ceiling_thickness)?;
        positive("level.band_height", level.band_height)?;
        positive("level.fall_depth", level.fall_depth)?;
        level.segment_width.validate_positive("level.segment_width")?;
        level.hole_width.validate("level.hole_width")?;
        level.obstacle_count.validate("level.obstacle_count")?;
        level.obstacle_size.validate_positive("level.obstacle_size")?;
        level.enemy_count.validate("level.enemy_count")?;
        level.enemy_size.validate_positive("level.enemy_size")?;
        level.patrol_range.validate("level.patrol_range")?;
        within("level.patrol_speed", level.patrol_speed, 0.0, f32::MAX)?;
        within("level.patrol_percent", level.patrol_percent as f32, 0.0, 100.0)?;

        // Band contents must fit in the band and in one generated run
        let largest = level.obstacle_size.max.max(level.enemy_size.max) as f32;
        within("level.obstacle_size", largest, 0.0, level.band_height)?;
        within("level.obstacle_size", largest, 0.0, self.screen.x)?;
        within(
            "level.segment_width",
            level.segment_width.max as f32,
            0.0,
            self.screen.x,
        )?;

        Ok(())
    }
}
