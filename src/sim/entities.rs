//! Thrown projectiles, explosions, trajectory markers and hazard enemies

use glam::Vec2;

use super::aabb::Aabb;
use super::body::{BodyTuning, KinematicState};
use super::collision::{gather_candidates, resolve};
use super::registry::{RectHandle, WorldRegistry};
use crate::consts::MIN_DIVISOR;
use crate::settings::ExplosionTuning;

/// Initial velocity of a throw from `origin` toward `target`.
///
/// Dividing the raw offset gives slow, controllable arcs. The divisor is
/// clamped to a small positive minimum; configs reject non-positive values.
pub fn launch_velocity(origin: Vec2, target: Vec2, divisor: f32) -> Vec2 {
    (target - origin) / divisor.max(MIN_DIVISOR)
}

/// Knockback for a body centred at `target` from a blast centred at `center`.
///
/// Points away from the blast; magnitude falls linearly from
/// `max_radius / power_border` at the centre to zero at `max_radius`.
pub fn explosion_impulse(center: Vec2, target: Vec2, max_radius: f32, power_border: f32) -> Vec2 {
    let offset = target - center;
    let distance = offset.length();
    if distance >= max_radius {
        return Vec2::ZERO;
    }
    let dir = offset.try_normalize().unwrap_or(Vec2::NEG_Y);
    dir * (max_radius - distance) / power_border.max(MIN_DIVISOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    /// Collides, slides and stacks
    Crate,
    /// Falls through until it touches an obstacle, then sits until the fuse runs out
    Bomb { landed: bool },
}

/// A thrown crate or bomb
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub handle: RectHandle,
    pub body: KinematicState,
    /// Ticks remaining (None = lives until consumed)
    pub lifetime: Option<u32>,
}

impl Projectile {
    pub fn is_crate(&self) -> bool {
        self.kind == ProjectileKind::Crate
    }

    /// Advance one tick. Returns true when the lifetime ran out this tick.
    pub fn update(
        &mut self,
        registry: &mut WorldRegistry,
        obstacles: &[Aabb],
        tuning: &BodyTuning,
    ) -> bool {
        if let Some(rect) = registry.get_mut(self.handle) {
            match self.kind {
                ProjectileKind::Crate => {
                    self.body.fall(tuning);
                    rect.translate(self.body.vel);
                    let candidates = gather_candidates(rect, obstacles);
                    let res = resolve(rect, self.body.vel, &candidates);
                    *rect = res.rect;
                    self.body.vel = res.vel;
                    self.body.grounded = res.grounded;
                }
                ProjectileKind::Bomb { landed: false } => {
                    self.body.fall(tuning);
                    rect.translate(self.body.vel);
                    if obstacles.iter().any(|o| rect.overlaps(o)) {
                        self.kind = ProjectileKind::Bomb { landed: true };
                        self.body = KinematicState::grounded();
                    }
                }
                ProjectileKind::Bomb { landed: true } => {}
            }
        }

        match self.lifetime.as_mut() {
            Some(ticks) => {
                *ticks = ticks.saturating_sub(1);
                *ticks == 0
            }
            None => false,
        }
    }
}

/// Something an explosion can push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlastTarget {
    Player,
    Projectile(u32),
}

/// A growing blast that pushes each player/crate at most once
#[derive(Debug, Clone)]
pub struct Explosion {
    pub id: u32,
    pub handle: RectHandle,
    pub radius: f32,
    pub ticks_left: u32,
    hit: Vec<BlastTarget>,
}

impl Explosion {
    pub fn new(id: u32, handle: RectHandle, tuning: &ExplosionTuning) -> Self {
        Self {
            id,
            handle,
            radius: tuning.start_radius,
            ticks_left: tuning.lifetime_ticks,
            hit: Vec::new(),
        }
    }

    pub fn center(&self, registry: &WorldRegistry) -> Option<Vec2> {
        registry.get(self.handle).map(Aabb::center)
    }

    pub fn has_hit(&self, target: BlastTarget) -> bool {
        self.hit.contains(&target)
    }

    /// Impulse for `target` if it is inside the current radius and was not hit yet
    pub fn try_hit(
        &mut self,
        target: BlastTarget,
        center: Vec2,
        target_center: Vec2,
        tuning: &ExplosionTuning,
    ) -> Option<Vec2> {
        if self.has_hit(target) || center.distance(target_center) >= self.radius {
            return None;
        }
        self.hit.push(target);
        Some(explosion_impulse(
            center,
            target_center,
            tuning.max_radius,
            tuning.power_border,
        ))
    }

    /// Grow and age by one tick. Returns false once expired.
    pub fn advance(&mut self, registry: &mut WorldRegistry, tuning: &ExplosionTuning) -> bool {
        self.radius = (self.radius + tuning.growth).min(tuning.max_radius);
        if let Some(rect) = registry.get_mut(self.handle) {
            rect.set_size_centered(Vec2::splat(self.radius * 2.0));
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left > 0
    }
}

/// Trajectory preview dot: falls like a crate, vanishes on first contact
#[derive(Debug, Clone)]
pub struct Marker {
    pub handle: RectHandle,
    pub body: KinematicState,
    pub ticks_left: u32,
}

impl Marker {
    /// Advance one tick. Returns false once it touched an obstacle or expired.
    pub fn update(
        &mut self,
        registry: &mut WorldRegistry,
        obstacles: &[Aabb],
        tuning: &BodyTuning,
    ) -> bool {
        let Some(rect) = registry.get_mut(self.handle) else {
            return false;
        };
        self.body.fall(tuning);
        rect.translate(self.body.vel);
        if obstacles.iter().any(|o| rect.overlaps(o)) {
            return false;
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left > 0
    }
}

/// Back-and-forth horizontal movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patrol {
    pub speed: f32,
    pub range: f32,
    pub travelled: f32,
    /// +1 right, -1 left
    pub dir: f32,
}

impl Patrol {
    pub fn new(speed: f32, range: f32, dir: f32) -> Self {
        Self {
            speed,
            range,
            travelled: 0.0,
            dir,
        }
    }

    /// Offset for this tick, turning around at the end of the range
    pub fn step(&mut self) -> f32 {
        let offset = self.speed * self.dir;
        self.travelled += self.speed;
        if self.travelled >= self.range {
            self.travelled = 0.0;
            self.dir = -self.dir;
        }
        offset
    }
}

/// A hazard. Contact removes it; what else happens depends on the player.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub handle: RectHandle,
    pub patrol: Option<Patrol>,
}

impl Enemy {
    pub fn update(&mut self, registry: &mut WorldRegistry) {
        let Some(patrol) = self.patrol.as_mut() else {
            return;
        };
        let offset = patrol.step();
        if let Some(rect) = registry.get_mut(self.handle) {
            rect.translate(Vec2::new(offset, 0.0));
        }
    }
}
