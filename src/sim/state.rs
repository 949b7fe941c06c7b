//! Game state and core simulation types
//!
//! `GameState` owns every entity collection and the world registry. Spawn and
//! despawn go through it so registry handles are always released with their
//! entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::body::{Controls, KinematicState};
use super::entities::{Enemy, Explosion, Marker, Projectile, ProjectileKind};
use super::level::{EnemySpawn, Level};
use super::registry::{RectHandle, WorldRegistry};
use crate::consts::PLAYER_SIZE;
use crate::settings::{Config, ConfigError, InvulnerabilityTuning};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The floor scrolled out of reach above the player
    FellOutOfWorld,
    /// Touched an enemy while vulnerable
    StruckByHazard,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    GameOver(EndReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Normal,
    Invulnerable { ticks_left: u32 },
}

/// The controllable body, pinned at the viewport anchor
#[derive(Debug, Clone)]
pub struct Player {
    pub rect: Aabb,
    pub body: KinematicState,
    pub status: PlayerStatus,
    /// Ticks until invulnerability can be activated again
    pub rearm_ticks: u32,
}

impl Player {
    pub fn new(rect: Aabb) -> Self {
        Self {
            rect,
            body: KinematicState::grounded(),
            status: PlayerStatus::Normal,
            rearm_ticks: 0,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        matches!(self.status, PlayerStatus::Invulnerable { .. })
    }

    /// Returns false if already active or still re-arming
    pub fn activate_invulnerability(&mut self, tuning: &InvulnerabilityTuning) -> bool {
        if self.is_invulnerable() || self.rearm_ticks > 0 {
            return false;
        }
        self.status = PlayerStatus::Invulnerable {
            ticks_left: tuning.duration_ticks,
        };
        true
    }

    /// Count down invulnerability; on expiry revert to normal and start re-arming
    pub fn tick_status(&mut self, tuning: &InvulnerabilityTuning) {
        match self.status {
            PlayerStatus::Invulnerable { ticks_left } if ticks_left > 1 => {
                self.status = PlayerStatus::Invulnerable {
                    ticks_left: ticks_left - 1,
                };
            }
            PlayerStatus::Invulnerable { .. } => {
                self.status = PlayerStatus::Normal;
                self.rearm_ticks = tuning.rearm_ticks;
            }
            PlayerStatus::Normal => {
                self.rearm_ticks = self.rearm_ticks.saturating_sub(1);
            }
        }
    }
}

/// Summary of a run for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub ticks: u64,
    pub kills: u32,
    /// Total world translation; the camera travelled the opposite way
    pub camera_offset: Vec2,
    pub obstacles: usize,
    pub outcome: Option<EndReason>,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: Config,
    pub registry: WorldRegistry,
    pub level: Level,
    pub player: Player,
    /// Crates and bombs, in spawn order
    pub projectiles: Vec<Projectile>,
    pub explosions: Vec<Explosion>,
    pub markers: Vec<Marker>,
    pub enemies: Vec<Enemy>,
    /// Trajectory prediction mode
    pub predicting: bool,
    pub kills: u32,
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Controls held last tick, for edge detection
    pub prev_controls: Controls,
    next_id: u32,
}

impl GameState {
    /// Validate the config and build the starting level with the player
    /// standing on the floor at the horizontal centre of the screen.
    pub fn new(config: Config, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut registry = WorldRegistry::new();
        let level = Level::new(&config.level, config.screen.x, &mut registry, seed);

        let size = Vec2::splat(PLAYER_SIZE);
        let mut rect = Aabb::new(Vec2::ZERO, size);
        rect.set_left(config.screen.x / 2.0 - size.x / 2.0);
        rect.set_bottom(config.level.floor_top);

        log::info!("New run (seed {seed}), {} obstacles", level.obstacles().len());

        Ok(Self {
            config,
            registry,
            level,
            player: Player::new(rect),
            projectiles: Vec::new(),
            explosions: Vec::new(),
            markers: Vec::new(),
            enemies: Vec::new(),
            predicting: false,
            kills: 0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            prev_controls: Controls::default(),
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn outcome(&self) -> Option<EndReason> {
        match self.phase {
            GamePhase::Playing => None,
            GamePhase::GameOver(reason) => Some(reason),
        }
    }

    /// First terminal condition wins
    pub fn end_run(&mut self, reason: EndReason) {
        if self.phase == GamePhase::Playing {
            log::info!("Run ended at tick {}: {:?}", self.time_ticks, reason);
            self.phase = GamePhase::GameOver(reason);
        }
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            ticks: self.time_ticks,
            kills: self.kills,
            camera_offset: self.registry.camera_offset(),
            obstacles: self.level.obstacles().len(),
            outcome: self.outcome(),
        }
    }

    pub fn obstacle_rects(&self) -> Vec<Aabb> {
        self.level.obstacle_rects(&self.registry)
    }

    /// Current rectangle behind a handle
    pub fn rect(&self, handle: RectHandle) -> Option<Aabb> {
        self.registry.get(handle).copied()
    }

    pub fn spawn_crate(&mut self, center: Vec2, vel: Vec2) -> u32 {
        let size = self.config.throw.crate_size;
        let lifetime = self.config.throw.crate_lifetime;
        self.spawn_projectile(ProjectileKind::Crate, center, size, vel, lifetime)
    }

    pub fn spawn_bomb(&mut self, center: Vec2, vel: Vec2) -> u32 {
        let size = self.config.throw.bomb_size;
        let fuse = self.config.throw.bomb_fuse_ticks;
        let kind = ProjectileKind::Bomb { landed: false };
        self.spawn_projectile(kind, center, size, vel, Some(fuse))
    }

    fn spawn_projectile(
        &mut self,
        kind: ProjectileKind,
        center: Vec2,
        size: Vec2,
        vel: Vec2,
        lifetime: Option<u32>,
    ) -> u32 {
        let id = self.next_entity_id();
        let handle = self.registry.register(Aabb::from_center(center, size));
        log::debug!("Spawned {kind:?} {id} at {center} with velocity {vel}");
        self.projectiles.push(Projectile {
            id,
            kind,
            handle,
            body: KinematicState::new(vel),
            lifetime,
        });
        id
    }

    pub fn remove_projectile(&mut self, id: u32) -> Option<Projectile> {
        let index = self.projectiles.iter().position(|p| p.id == id)?;
        let projectile = self.projectiles.remove(index);
        self.registry.unregister(projectile.handle);
        Some(projectile)
    }

    pub fn spawn_explosion(&mut self, center: Vec2) -> u32 {
        let id = self.next_entity_id();
        let tuning = &self.config.explosion;
        let rect = Aabb::from_center(center, Vec2::splat(tuning.start_radius * 2.0));
        let handle = self.registry.register(rect);
        let explosion = Explosion::new(id, handle, tuning);
        log::debug!("Explosion {id} at {center}");
        self.explosions.push(explosion);
        id
    }

    pub fn spawn_marker(&mut self, center: Vec2, vel: Vec2) {
        let rect = Aabb::from_center(center, self.config.throw.marker_size);
        let handle = self.registry.register(rect);
        self.markers.push(Marker {
            handle,
            body: KinematicState::new(vel),
            ticks_left: self.config.throw.marker_lifetime,
        });
    }

    pub fn spawn_enemy(&mut self, spawn: EnemySpawn) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            handle: spawn.handle,
            patrol: spawn.patrol,
        });
        id
    }

    pub fn remove_enemy(&mut self, id: u32) -> Option<Enemy> {
        let index = self.enemies.iter().position(|e| e.id == id)?;
        let enemy = self.enemies.remove(index);
        self.registry.unregister(enemy.handle);
        Some(enemy)
    }
}
