//! Fixed timestep simulation tick
//!
//! Advances the whole world by one step. The player never moves: its velocity
//! and collision corrections are applied to the world registry instead.

use glam::Vec2;

use super::aabb::Aabb;
use super::body::{Control, Controls};
use super::collision::{gather_candidates, resolve, stack_pair};
use super::entities::{BlastTarget, ProjectileKind, launch_velocity};
use super::registry::scroll_delta;
use super::state::{EndReason, GamePhase, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Controls held this tick
    pub controls: Controls,
    /// Throw / prediction target in screen space (mouse position)
    pub aim: Option<Vec2>,
}

impl TickInput {
    pub fn new(controls: Controls) -> Self {
        Self {
            controls,
            aim: None,
        }
    }

    pub fn with_aim(mut self, aim: Vec2) -> Self {
        self.aim = Some(aim);
        self
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.time_ticks += 1;

    let controls = input.controls;
    let prev = state.prev_controls;

    if controls.pressed(&prev, Control::TogglePredict) {
        state.predicting = !state.predicting;
        log::debug!("Trajectory prediction {}", if state.predicting { "on" } else { "off" });
    }
    if controls.pressed(&prev, Control::Invulnerable)
        && state
            .player
            .activate_invulnerability(&state.config.invulnerability)
    {
        log::info!("Invulnerability activated at tick {}", state.time_ticks);
    }

    // Player kinematics, consumed by the world shift
    state
        .player
        .body
        .step(&controls, &state.config.controls, &state.config.player);
    state.registry.shift(scroll_delta(&state.player.body));

    // Player collision: corrections move the world, not the player
    let obstacles = state.obstacle_rects();
    let candidates = gather_candidates(&state.player.rect, &obstacles);
    let res = resolve(&state.player.rect, state.player.body.vel, &candidates);
    state.registry.shift(-res.correction);
    state.player.body.vel = res.vel;
    state.player.body.grounded = res.grounded;
    state.player.body.apply_friction(&state.config.player);

    let obstacles = state.obstacle_rects();

    update_projectiles(state, &obstacles);
    stack_crates(state, &obstacles);
    update_explosions(state);
    update_markers(state, &obstacles);
    update_enemies(state);
    spawn_throws(state, input);

    state.player.tick_status(&state.config.invulnerability);

    for spawn in state.level.maintain(&mut state.registry) {
        state.spawn_enemy(spawn);
    }

    check_fall(state);

    state.prev_controls = controls;
}

/// Move crates and bombs; expired bombs detonate in place
fn update_projectiles(state: &mut GameState, obstacles: &[Aabb]) {
    let mut expired = Vec::new();
    for projectile in &mut state.projectiles {
        let tuning = if projectile.is_crate() {
            &state.config.crates
        } else {
            &state.config.bombs
        };
        if projectile.update(&mut state.registry, obstacles, tuning) {
            expired.push(projectile.id);
        }
    }

    for id in expired {
        let last_rect = state
            .projectiles
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| state.rect(p.handle));
        let Some(projectile) = state.remove_projectile(id) else {
            continue;
        };
        log::debug!("{:?} {} expired", projectile.kind, projectile.id);
        if let (ProjectileKind::Bomb { .. }, Some(rect)) = (projectile.kind, last_rect) {
            state.spawn_explosion(rect.center());
        }
    }
}

/// Pairwise crate-on-crate resolution, then ground friction.
///
/// Crates moved by a pair are resolved against obstacles again so a stack
/// never ends the tick inside the ceiling or a block.
fn stack_crates(state: &mut GameState, obstacles: &[Aabb]) {
    let crates: Vec<usize> = state
        .projectiles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_crate())
        .map(|(i, _)| i)
        .collect();
    let mut moved = Vec::new();

    for (n, &i) in crates.iter().enumerate() {
        for &j in &crates[n + 1..] {
            let (Some(mut a_rect), Some(mut b_rect)) = (
                state.rect(state.projectiles[i].handle),
                state.rect(state.projectiles[j].handle),
            ) else {
                continue;
            };
            let mut a_body = state.projectiles[i].body;
            let mut b_body = state.projectiles[j].body;
            let (a_before, b_before) = (a_rect, b_rect);

            if stack_pair(&mut a_rect, &mut a_body, &mut b_rect, &mut b_body).is_none() {
                continue;
            }

            state.projectiles[i].body = a_body;
            state.projectiles[j].body = b_body;
            for (index, before, after) in [(i, a_before, a_rect), (j, b_before, b_rect)] {
                if after == before {
                    continue;
                }
                if let Some(rect) = state.registry.get_mut(state.projectiles[index].handle) {
                    *rect = after;
                }
                if !moved.contains(&index) {
                    moved.push(index);
                }
            }
        }
    }

    for i in moved {
        let handle = state.projectiles[i].handle;
        let Some(rect) = state.registry.get_mut(handle) else {
            continue;
        };
        let body = &mut state.projectiles[i].body;
        let candidates = gather_candidates(rect, obstacles);
        let res = resolve(rect, body.vel, &candidates);
        *rect = res.rect;
        body.vel = res.vel;
        body.grounded |= res.grounded;
    }

    for &i in &crates {
        state.projectiles[i].body.apply_friction(&state.config.crates);
    }
}

/// Push the player and crates away from every blast, then grow and age blasts
fn update_explosions(state: &mut GameState) {
    let tuning = &state.config.explosion;
    let mut expired = Vec::new();

    for explosion in &mut state.explosions {
        if let Some(center) = explosion.center(&state.registry) {
            let target = state.player.rect.center();
            if let Some(impulse) = explosion.try_hit(BlastTarget::Player, center, target, tuning) {
                state.player.body.apply_impulse(impulse);
            }

            for projectile in state.projectiles.iter_mut().filter(|p| p.is_crate()) {
                let Some(rect) = state.registry.get(projectile.handle) else {
                    continue;
                };
                let target = BlastTarget::Projectile(projectile.id);
                if let Some(impulse) = explosion.try_hit(target, center, rect.center(), tuning) {
                    projectile.body.apply_impulse(impulse);
                }
            }
        }

        if !explosion.advance(&mut state.registry, tuning) {
            expired.push(explosion.id);
        }
    }

    state.explosions.retain(|explosion| {
        if expired.contains(&explosion.id) {
            state.registry.unregister(explosion.handle);
            false
        } else {
            true
        }
    });
}

fn update_markers(state: &mut GameState, obstacles: &[Aabb]) {
    let tuning = &state.config.crates;
    state.markers.retain_mut(|marker| {
        if marker.update(&mut state.registry, obstacles, tuning) {
            true
        } else {
            state.registry.unregister(marker.handle);
            false
        }
    });
}

/// Patrol, then resolve player contact
fn update_enemies(state: &mut GameState) {
    for enemy in &mut state.enemies {
        enemy.update(&mut state.registry);
    }

    let touching: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| {
            state
                .registry
                .get(e.handle)
                .is_some_and(|rect| rect.overlaps(&state.player.rect))
        })
        .map(|e| e.id)
        .collect();

    for id in touching {
        state.remove_enemy(id);
        if state.player.is_invulnerable() {
            state.kills += 1;
            log::info!("Enemy {id} destroyed (kills: {})", state.kills);
        } else {
            state.end_run(EndReason::StruckByHazard);
        }
    }
}

/// Throws on fire edges and periodic trajectory markers, all from the player's centre
fn spawn_throws(state: &mut GameState, input: &TickInput) {
    let Some(aim) = input.aim else {
        return;
    };
    let origin = state.player.rect.center();
    let vel = launch_velocity(origin, aim, state.config.throw.spread_divisor);
    let prev = state.prev_controls;

    if input.controls.pressed(&prev, Control::FirePrimary) {
        state.spawn_crate(origin, vel);
    }
    if input.controls.pressed(&prev, Control::FireSecondary) {
        state.spawn_bomb(origin, vel);
    }

    let interval = u64::from(state.config.throw.marker_interval.max(1));
    if state.predicting && state.time_ticks % interval == 0 {
        state.spawn_marker(origin, vel);
    }
}

/// The run ends once the floor line has scrolled far enough above the player
fn check_fall(state: &mut GameState) {
    let Some(floor_top) = state.level.floor_top(&state.registry) else {
        return;
    };
    if state.player.rect.top() - floor_top > state.config.level.fall_depth {
        state.end_run(EndReason::FellOutOfWorld);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Config;
    use crate::sim::state::PlayerStatus;

    fn held(controls: &[Control]) -> TickInput {
        TickInput::new(Controls::with(controls))
    }

    #[test]
    fn test_tick_counts_and_stops_after_game_over() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);

        state.end_run(EndReason::StruckByHazard);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_walking_scrolls_world_not_player() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        let player_before = state.player.rect;
        let floor_before = state.level.left_frontier(&state.registry).unwrap();

        for _ in 0..10 {
            tick(&mut state, &held(&[Control::MoveRight]));
        }

        assert_eq!(state.player.rect, player_before);
        let floor_after = state.level.left_frontier(&state.registry).unwrap();
        assert!(floor_after.left() < floor_before.left());
        assert_eq!(floor_after.top(), floor_before.top());
        assert!(state.player.body.vel.x > 0.0);
        assert!(state.player.body.grounded);
    }

    #[test]
    fn test_jump_leaves_ground_and_comes_back() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        tick(&mut state, &held(&[Control::Jump]));
        assert!(!state.player.body.grounded);
        assert!(state.player.body.vel.y < 0.0);

        for _ in 0..120 {
            tick(&mut state, &TickInput::default());
        }
        assert!(state.player.body.grounded);
        let floor = state.level.floor_top(&state.registry).unwrap();
        assert_eq!(state.player.rect.bottom(), floor);
    }

    #[test]
    fn test_throw_requires_rising_edge() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        let aim = state.player.rect.center() + Vec2::new(150.0, -150.0);
        let fire = held(&[Control::FirePrimary]).with_aim(aim);

        tick(&mut state, &fire);
        tick(&mut state, &fire);
        assert_eq!(state.projectiles.len(), 1);

        tick(&mut state, &TickInput::default());
        tick(&mut state, &fire);
        assert_eq!(state.projectiles.len(), 2);
    }

    #[test]
    fn test_throw_without_aim_is_ignored() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        tick(&mut state, &held(&[Control::FirePrimary, Control::FireSecondary]));
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_prediction_spawns_markers() {
        let mut config = Config::default();
        config.throw.marker_interval = 2;
        let mut state = GameState::new(config, 12345).unwrap();
        let aim = state.player.rect.center() + Vec2::new(300.0, -300.0);

        tick(&mut state, &held(&[Control::TogglePredict]).with_aim(aim));
        assert!(state.predicting);
        for _ in 0..5 {
            tick(&mut state, &TickInput::default().with_aim(aim));
        }
        // Ticks 2, 4 and 6
        assert_eq!(state.markers.len(), 3);

        tick(&mut state, &held(&[Control::TogglePredict]).with_aim(aim));
        assert!(!state.predicting);
    }

    #[test]
    fn test_invulnerability_activation_and_expiry() {
        let mut config = Config::default();
        config.invulnerability.duration_ticks = 3;
        let mut state = GameState::new(config, 12345).unwrap();

        tick(&mut state, &held(&[Control::Invulnerable]));
        assert!(state.player.is_invulnerable());
        tick(&mut state, &TickInput::default());
        tick(&mut state, &TickInput::default());
        assert_eq!(state.player.status, PlayerStatus::Normal);
    }

    #[test]
    fn test_explosion_pushes_crate_away() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        let floor = state.level.floor_top(&state.registry).unwrap();
        let crate_center = Vec2::new(300.0, floor - 16.0);
        let id = state.spawn_crate(crate_center, Vec2::ZERO);
        state.spawn_explosion(crate_center - Vec2::new(10.0, 0.0));

        tick(&mut state, &TickInput::default());
        let crate_ = state.projectiles.iter().find(|p| p.id == id).unwrap();
        assert!(crate_.body.vel.x > 0.0);
    }

    #[test]
    fn test_stacked_crate_is_kept_out_of_the_ceiling() {
        let mut state = GameState::new(Config::default(), 12345).unwrap();
        let ceiling = state.config.level.floor_top - state.config.level.band_height;
        state.spawn_crate(Vec2::new(316.0, ceiling + 46.0), Vec2::ZERO);
        let upper = state.spawn_crate(Vec2::new(316.0, ceiling + 17.0), Vec2::ZERO);

        tick(&mut state, &TickInput::default());
        let crate_ = state.projectiles.iter().find(|p| p.id == upper).unwrap();
        let rect = state.rect(crate_.handle).unwrap();
        assert!(rect.top() >= ceiling, "crate top {}", rect.top());
        assert_eq!(rect.center().x, 316.0);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(Config::default(), 99999).unwrap();
        let mut state2 = GameState::new(Config::default(), 99999).unwrap();

        let aim = state1.player.rect.center() + Vec2::new(200.0, -100.0);
        let inputs = [
            held(&[Control::MoveRight]),
            held(&[Control::MoveRight, Control::Jump]),
            held(&[Control::FirePrimary]).with_aim(aim),
            TickInput::default(),
            held(&[Control::FireSecondary]).with_aim(aim),
            held(&[Control::MoveLeft]),
        ];

        for _ in 0..100 {
            for input in &inputs {
                tick(&mut state1, input);
                tick(&mut state2, input);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.projectiles.len(), state2.projectiles.len());
        assert_eq!(state1.registry.camera_offset(), state2.registry.camera_offset());
        assert_eq!(state1.obstacle_rects(), state2.obstacle_rects());
        assert_eq!(state1.outcome(), state2.outcome());
    }
}
