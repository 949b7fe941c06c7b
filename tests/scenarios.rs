//! End-to-end runs through the public simulation API

use glam::Vec2;
use world_shift::Config;
use world_shift::settings::IntRange;
use world_shift::sim::{
    Aabb, Control, Controls, EndReason, EnemySpawn, GameState, PlayerStatus, TickInput, tick,
};

fn held(controls: &[Control]) -> TickInput {
    TickInput::new(Controls::with(controls))
}

/// A level with a flat, empty floor in every direction
fn flat_config() -> Config {
    let mut config = Config::default();
    config.level.hole_width = IntRange::fixed(0);
    config.level.obstacle_count = IntRange::fixed(0);
    config.level.enemy_count = IntRange::fixed(0);
    config
}

fn floor_top(state: &GameState) -> f32 {
    state.level.floor_top(&state.registry).unwrap()
}

#[test]
fn resting_player_stays_at_rest() {
    let mut state = GameState::new(Config::default(), 1).unwrap();
    let rect = state.player.rect;
    let floor = floor_top(&state);

    for _ in 0..10 {
        tick(&mut state, &TickInput::default());
        assert_eq!(state.player.body.vel.y, 0.0);
        assert!(state.player.body.grounded);
    }

    assert_eq!(state.player.rect, rect);
    assert_eq!(floor_top(&state), floor);
    assert_eq!(state.registry.camera_offset(), Vec2::ZERO);
}

#[test]
fn airborne_player_integrates_gravity() {
    let mut state = GameState::new(Config::default(), 1).unwrap();
    state.player.rect.translate(Vec2::new(0.0, -300.0));
    state.player.body.grounded = false;

    for _ in 0..5 {
        tick(&mut state, &TickInput::default());
    }

    assert_eq!(state.player.body.vel.y, 5.0);
    assert!(!state.player.body.grounded);
    // The world moved up by 1 + 2 + 3 + 4 + 5
    assert_eq!(state.registry.camera_offset(), Vec2::new(0.0, -15.0));
}

#[test]
fn landing_is_flush_with_the_floor() {
    let mut state = GameState::new(Config::default(), 1).unwrap();
    state.player.rect.translate(Vec2::new(0.0, -100.0));
    state.player.body.grounded = false;

    let mut ticks = 0;
    while !state.player.body.grounded && ticks < 60 {
        tick(&mut state, &TickInput::default());
        ticks += 1;
    }

    assert!(state.player.body.grounded);
    assert_eq!(state.player.rect.bottom(), floor_top(&state));
    assert_eq!(state.player.body.vel.y, 0.0);
}

#[test]
fn thrown_crate_follows_launch_velocity() {
    let mut state = GameState::new(Config::default(), 1).unwrap();
    assert_eq!(state.config.throw.spread_divisor, 15.0);
    let aim = state.player.rect.center() + Vec2::new(150.0, 0.0);

    tick(&mut state, &held(&[Control::FirePrimary]).with_aim(aim));
    assert_eq!(state.projectiles.len(), 1);
    assert!(state.projectiles[0].is_crate());
    assert_eq!(state.projectiles[0].body.vel, Vec2::new(10.0, 0.0));

    tick(&mut state, &TickInput::default());
    assert_eq!(state.projectiles[0].body.vel, Vec2::new(10.0, 1.0));
}

#[test]
fn crate_thrown_straight_up_stops_at_the_ceiling() {
    let mut state = GameState::new(Config::default(), 1).unwrap();
    let center = state.player.rect.center();
    let ceiling = state.config.level.floor_top - state.config.level.band_height;
    tick(
        &mut state,
        &held(&[Control::FirePrimary]).with_aim(center + Vec2::new(0.0, -828.0)),
    );
    let handle = state.projectiles[0].handle;

    let mut hit_ceiling = false;
    for _ in 0..30 {
        tick(&mut state, &TickInput::default());
        let rect = state.rect(handle).unwrap();
        let vel = state.projectiles[0].body.vel;
        assert_eq!(rect.center().x, center.x);
        assert!(rect.top() >= ceiling, "crate top {} inside ceiling", rect.top());
        if rect.top() == ceiling && vel.y == 0.0 {
            hit_ceiling = true;
        }
    }
    assert!(hit_ceiling);
}

#[test]
fn bomb_detonates_exactly_at_fuse_end() {
    let mut config = Config::default();
    config.throw.bomb_fuse_ticks = 5;
    let mut state = GameState::new(config, 1).unwrap();
    let floor = floor_top(&state);
    state.spawn_bomb(Vec2::new(200.0, floor - 12.0), Vec2::ZERO);

    for _ in 0..4 {
        tick(&mut state, &TickInput::default());
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.explosions.is_empty());
    }

    tick(&mut state, &TickInput::default());
    assert!(state.projectiles.is_empty());
    assert_eq!(state.explosions.len(), 1);

    tick(&mut state, &TickInput::default());
    assert_eq!(state.explosions.len(), 1);
}

#[test]
fn explosion_knocks_player_back_once() {
    let mut state = GameState::new(Config::default(), 1).unwrap();
    let center = state.player.rect.center();
    state.spawn_explosion(center - Vec2::new(10.0, 0.0));

    tick(&mut state, &TickInput::default());
    assert!(state.player.body.vel.x > 0.0);

    tick(&mut state, &TickInput::default());
    // Knockback is consumed by the world shift like any other velocity
    assert!(state.registry.camera_offset().x < 0.0);
    assert!(state.player.body.vel.x <= state.config.player.walk_max);
}

#[test]
fn right_frontier_stays_ahead_while_walking_right() {
    let mut config = flat_config();
    config.player.friction = None;
    let mut state = GameState::new(config, 3).unwrap();
    let width = state.config.screen.x;

    for _ in 0..1500 {
        tick(&mut state, &held(&[Control::MoveRight]));
        let frontier = state.level.right_frontier(&state.registry).unwrap();
        let gap = frontier.right() - width;
        assert!(gap >= 0.5 * width - 0.01, "gap {gap}");
        assert!(gap <= 2.0 * width + 0.01, "gap {gap}");
    }
    assert_eq!(state.outcome(), None);
}

#[test]
fn left_frontier_stays_ahead_while_walking_left() {
    let mut config = flat_config();
    config.player.friction = None;
    let mut state = GameState::new(config, 4).unwrap();
    let width = state.config.screen.x;

    for _ in 0..1500 {
        tick(&mut state, &held(&[Control::MoveLeft]));
        let frontier = state.level.left_frontier(&state.registry).unwrap();
        let gap = -frontier.left();
        assert!(gap >= 0.5 * width - 0.01, "gap {gap}");
        assert!(gap <= 2.0 * width + 0.01, "gap {gap}");
    }
    assert_eq!(state.outcome(), None);
}

#[test]
fn enemy_contact_ends_the_run() {
    let mut state = GameState::new(flat_config(), 1).unwrap();
    let handle = state.registry.register(state.player.rect);
    state.spawn_enemy(EnemySpawn {
        handle,
        patrol: None,
    });

    tick(&mut state, &TickInput::default());
    assert_eq!(state.outcome(), Some(EndReason::StruckByHazard));
    assert!(state.enemies.is_empty());
    assert!(!state.registry.contains(handle));

    // Further ticks are no-ops
    let ticks = state.time_ticks;
    tick(&mut state, &TickInput::default());
    assert_eq!(state.time_ticks, ticks);
}

#[test]
fn invulnerable_player_destroys_enemy() {
    let mut state = GameState::new(flat_config(), 1).unwrap();
    let rect = Aabb::from_center(state.player.rect.center(), Vec2::splat(32.0));
    let handle = state.registry.register(rect);
    state.spawn_enemy(EnemySpawn {
        handle,
        patrol: None,
    });

    tick(&mut state, &held(&[Control::Invulnerable]));
    assert_eq!(state.outcome(), None);
    assert_eq!(state.kills, 1);
    assert!(state.enemies.is_empty());
    assert_eq!(state.stats().kills, 1);
}

#[test]
fn invulnerability_wears_off() {
    let mut config = flat_config();
    config.invulnerability.duration_ticks = 10;
    config.invulnerability.rearm_ticks = 5;
    let mut state = GameState::new(config, 1).unwrap();

    tick(&mut state, &held(&[Control::Invulnerable]));
    for _ in 0..9 {
        assert!(state.player.is_invulnerable());
        tick(&mut state, &TickInput::default());
    }
    assert_eq!(state.player.status, PlayerStatus::Normal);

    // Cannot re-activate until the cooldown ran out
    tick(&mut state, &held(&[Control::Invulnerable]));
    assert!(!state.player.is_invulnerable());
    for _ in 0..5 {
        tick(&mut state, &TickInput::default());
    }
    tick(&mut state, &held(&[Control::Invulnerable]));
    assert!(state.player.is_invulnerable());
}

#[test]
fn falling_below_the_floor_ends_the_run() {
    let mut state = GameState::new(flat_config(), 1).unwrap();
    state.player.rect.translate(Vec2::new(0.0, 200.0));
    state.player.body.grounded = false;

    let mut ticks = 0;
    while state.outcome().is_none() && ticks < 200 {
        tick(&mut state, &TickInput::default());
        ticks += 1;
    }

    assert_eq!(state.outcome(), Some(EndReason::FellOutOfWorld));
    let depth = state.player.rect.top() - floor_top(&state);
    assert!(depth > state.config.level.fall_depth);
    assert_eq!(state.stats().outcome, Some(EndReason::FellOutOfWorld));
}

#[test]
fn config_round_trips_through_json() {
    let config = flat_config();
    let json = config.to_json().unwrap();
    let state = GameState::new(Config::from_json(&json).unwrap(), 9).unwrap();
    assert_eq!(state.config, config);
}
