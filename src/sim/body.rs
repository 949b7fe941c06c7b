//! Kinematic bodies: controls, acceleration and velocity integration
//!
//! A body never moves its own rectangle. The player's velocity is consumed by
//! the scroll shifter, projectile velocities by their owners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical controls the input collaborator reports each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    MoveLeft,
    MoveRight,
    Jump,
    FirePrimary,
    FireSecondary,
    TogglePredict,
    Invulnerable,
}

impl Control {
    pub const COUNT: usize = 7;

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Snapshot of which controls are held this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    active: [bool; Control::COUNT],
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot with the given controls held
    pub fn with(controls: &[Control]) -> Self {
        let mut snapshot = Self::default();
        for &control in controls {
            snapshot.set(control, true);
        }
        snapshot
    }

    pub fn set(&mut self, control: Control, active: bool) {
        self.active[control.index()] = active;
    }

    pub fn is_active(&self, control: Control) -> bool {
        self.active[control.index()]
    }

    /// Held now but not in `previous` (rising edge)
    pub fn pressed(&self, previous: &Controls, control: Control) -> bool {
        self.is_active(control) && !previous.is_active(control)
    }
}

/// One entry of the control table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub control: Control,
    pub direction: Vec2,
}

/// Immutable control -> direction table, built once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMap {
    bindings: Vec<Binding>,
}

impl Default for ControlMap {
    fn default() -> Self {
        Self::new(vec![
            Binding {
                control: Control::MoveLeft,
                direction: Vec2::new(-1.0, 0.0),
            },
            Binding {
                control: Control::MoveRight,
                direction: Vec2::new(1.0, 0.0),
            },
            Binding {
                control: Control::Jump,
                direction: Vec2::new(0.0, -1.0),
            },
        ])
    }
}

impl ControlMap {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    /// Directions of every held binding
    pub fn active_directions<'a>(
        &'a self,
        controls: &'a Controls,
    ) -> impl Iterator<Item = Vec2> + 'a {
        self.bindings
            .iter()
            .filter(|b| controls.is_active(b.control))
            .map(|b| b.direction)
    }
}

/// Movement constants for one kind of body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyTuning {
    /// Horizontal acceleration per tick while a move control is held
    pub walk_accel: f32,
    /// Horizontal speed cap
    pub walk_max: f32,
    /// Upward speed set on jump
    pub jump_speed: f32,
    /// Downward acceleration per tick while airborne
    pub gravity: f32,
    /// Optional terminal fall speed
    pub max_fall_speed: Option<f32>,
    /// Ground damping factor applied while grounded (None = no friction)
    pub friction: Option<f32>,
    /// Horizontal speeds below this snap to zero under friction
    pub stop_epsilon: f32,
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            walk_accel: 1.0,
            walk_max: 8.0,
            jump_speed: 20.0,
            gravity: 1.0,
            max_fall_speed: Some(24.0),
            friction: Some(0.85),
            stop_epsilon: 0.1,
        }
    }
}

/// Velocity, per-tick acceleration and support state of one body
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub vel: Vec2,
    /// Acceleration of the current tick only
    pub accel: Vec2,
    pub grounded: bool,
}

impl KinematicState {
    pub fn new(vel: Vec2) -> Self {
        Self {
            vel,
            ..Default::default()
        }
    }

    pub fn grounded() -> Self {
        Self {
            grounded: true,
            ..Default::default()
        }
    }

    /// Integrate one tick of controlled movement
    pub fn step(&mut self, controls: &Controls, map: &ControlMap, tuning: &BodyTuning) {
        self.accel = Vec2::ZERO;

        let mut jump = false;
        for dir in map.active_directions(controls) {
            self.accel.x += dir.x * tuning.walk_accel;
            if dir.y < 0.0 {
                jump = true;
            }
        }

        if self.grounded && jump {
            self.vel.y = -tuning.jump_speed;
            self.grounded = false;
        }

        self.integrate(tuning);
    }

    /// Integrate one tick with no controls (projectiles)
    pub fn fall(&mut self, tuning: &BodyTuning) {
        self.accel = Vec2::ZERO;
        self.integrate(tuning);
    }

    fn integrate(&mut self, tuning: &BodyTuning) {
        if !self.grounded {
            self.accel.y += tuning.gravity;
        }

        self.vel += self.accel;
        self.vel.x = self.vel.x.clamp(-tuning.walk_max, tuning.walk_max);
        if let Some(max_fall) = tuning.max_fall_speed {
            self.vel.y = self.vel.y.min(max_fall);
        }
    }

    /// Add an instantaneous velocity change; any upward push lifts the body off the ground
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.vel += impulse;
        if impulse.y < 0.0 {
            self.grounded = false;
        }
    }

    /// Damp horizontal speed while grounded
    pub fn apply_friction(&mut self, tuning: &BodyTuning) {
        let Some(friction) = tuning.friction else {
            return;
        };
        if !self.grounded {
            return;
        }
        self.vel.x *= friction;
        if self.vel.x.abs() < tuning.stop_epsilon {
            self.vel.x = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tuning() -> BodyTuning {
        BodyTuning {
            walk_accel: 1.0,
            walk_max: 8.0,
            jump_speed: 20.0,
            gravity: 1.0,
            max_fall_speed: None,
            friction: None,
            stop_epsilon: 0.1,
        }
    }

    #[test]
    fn test_gravity_integrates_linearly() {
        let map = ControlMap::default();
        let mut body = KinematicState::default();
        for _ in 0..5 {
            body.step(&Controls::new(), &map, &tuning());
        }
        assert_eq!(body.vel.y, 5.0);
        assert_eq!(body.accel, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_acceleration_resets_each_tick() {
        let map = ControlMap::default();
        let mut body = KinematicState::grounded();
        body.step(&Controls::with(&[Control::MoveRight]), &map, &tuning());
        assert_eq!(body.accel, Vec2::new(1.0, 0.0));
        body.step(&Controls::new(), &map, &tuning());
        assert_eq!(body.accel, Vec2::ZERO);
        assert_eq!(body.vel.x, 1.0);
    }

    #[test]
    fn test_opposing_controls_cancel() {
        let map = ControlMap::default();
        let mut body = KinematicState::grounded();
        body.step(
            &Controls::with(&[Control::MoveLeft, Control::MoveRight]),
            &map,
            &tuning(),
        );
        assert_eq!(body.vel.x, 0.0);
    }

    #[test]
    fn test_jump_sets_velocity_only_when_grounded() {
        let map = ControlMap::default();
        let jump = Controls::with(&[Control::Jump]);

        let mut body = KinematicState::grounded();
        body.vel.y = 3.0;
        body.step(&jump, &map, &tuning());
        assert!(!body.grounded);
        // Set, then gravity for the airborne tick
        assert_eq!(body.vel.y, -20.0 + 1.0);

        let mut airborne = KinematicState::default();
        airborne.step(&jump, &map, &tuning());
        assert_eq!(airborne.vel.y, 1.0);
    }

    #[test]
    fn test_fall_speed_clamp() {
        let mut tuning = tuning();
        tuning.max_fall_speed = Some(3.0);
        let mut body = KinematicState::default();
        for _ in 0..10 {
            body.fall(&tuning);
        }
        assert_eq!(body.vel.y, 3.0);
    }

    #[test]
    fn test_friction_snaps_to_zero() {
        let mut tuning = tuning();
        tuning.friction = Some(0.5);
        let mut body = KinematicState::grounded();
        body.vel.x = 1.0;
        body.apply_friction(&tuning);
        assert_eq!(body.vel.x, 0.5);
        for _ in 0..3 {
            body.apply_friction(&tuning);
        }
        assert_eq!(body.vel.x, 0.0);

        let mut airborne = KinematicState::new(Vec2::new(4.0, 0.0));
        airborne.apply_friction(&tuning);
        assert_eq!(airborne.vel.x, 4.0);
    }

    #[test]
    fn test_upward_impulse_clears_grounded() {
        let mut body = KinematicState::grounded();
        body.apply_impulse(Vec2::new(3.0, 0.0));
        assert!(body.grounded);
        body.apply_impulse(Vec2::new(0.0, -2.0));
        assert!(!body.grounded);
        assert_eq!(body.vel, Vec2::new(3.0, -2.0));
    }

    #[test]
    fn test_pressed_is_rising_edge() {
        let prev = Controls::with(&[Control::FirePrimary]);
        let now = Controls::with(&[Control::FirePrimary, Control::FireSecondary]);
        assert!(!now.pressed(&prev, Control::FirePrimary));
        assert!(now.pressed(&prev, Control::FireSecondary));
    }

    proptest! {
        #[test]
        fn prop_walk_speed_never_exceeds_max(
            ticks in 1usize..200,
            right in any::<bool>(),
            accel in 0.1f32..5.0,
            grounded in any::<bool>(),
        ) {
            let mut tuning = tuning();
            tuning.walk_accel = accel;
            let map = ControlMap::default();
            let control = if right { Control::MoveRight } else { Control::MoveLeft };
            let controls = Controls::with(&[control]);
            let mut body = KinematicState { grounded, ..Default::default() };
            for _ in 0..ticks {
                body.step(&controls, &map, &tuning);
                prop_assert!(body.vel.x.abs() <= tuning.walk_max);
            }
        }
    }
}
