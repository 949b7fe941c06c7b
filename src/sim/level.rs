//! Endless procedural level
//!
//! The level keeps a left and a right frontier floor segment. Whenever a
//! frontier scrolls to within one screen width of the viewport edge, a new run
//! of floor segments and holes is generated beyond it, capped by a ceiling
//! strip and filled with floating obstacles and enemies. Each run brings the
//! frontier back out to exactly two screen widths from the viewport edge.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::aabb::Aabb;
use super::entities::Patrol;
use super::registry::{RectHandle, WorldRegistry};
use crate::consts::CONTACT_EPSILON;
use crate::settings::LevelTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Floor,
    Ceiling,
    Block,
}

/// A static, immovable rectangle
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub handle: RectHandle,
}

/// An enemy placed by the generator, waiting for an id from the game state
#[derive(Debug, Clone, Copy)]
pub struct EnemySpawn {
    pub handle: RectHandle,
    pub patrol: Option<Patrol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Obstacle field plus generation frontiers
#[derive(Debug, Clone)]
pub struct Level {
    tuning: LevelTuning,
    screen_width: f32,
    rng: Pcg32,
    obstacles: Vec<Obstacle>,
    left_frontier: RectHandle,
    right_frontier: RectHandle,
}

impl Level {
    /// Build the safe starting area: one floor segment from -W to 2W under a
    /// matching ceiling, with nothing in between.
    pub fn new(
        tuning: &LevelTuning,
        screen_width: f32,
        registry: &mut WorldRegistry,
        seed: u64,
    ) -> Self {
        let span = screen_width * 3.0;
        let floor = Aabb::new(
            Vec2::new(-screen_width, tuning.floor_top),
            Vec2::new(span, tuning.floor_thickness),
        );
        let ceiling = Aabb::new(
            Vec2::new(
                -screen_width,
                tuning.floor_top - tuning.band_height - tuning.ceiling_thickness,
            ),
            Vec2::new(span, tuning.ceiling_thickness),
        );

        let floor_handle = registry.register(floor);
        let ceiling_handle = registry.register(ceiling);

        Self {
            tuning: tuning.clone(),
            screen_width,
            rng: Pcg32::seed_from_u64(seed),
            obstacles: vec![
                Obstacle {
                    kind: ObstacleKind::Floor,
                    handle: floor_handle,
                },
                Obstacle {
                    kind: ObstacleKind::Ceiling,
                    handle: ceiling_handle,
                },
            ],
            left_frontier: floor_handle,
            right_frontier: floor_handle,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Current rectangles of every obstacle, in generation order
    pub fn obstacle_rects(&self, registry: &WorldRegistry) -> Vec<Aabb> {
        self.obstacles
            .iter()
            .filter_map(|o| registry.get(o.handle).copied())
            .collect()
    }

    pub fn left_frontier(&self, registry: &WorldRegistry) -> Option<Aabb> {
        registry.get(self.left_frontier).copied()
    }

    pub fn right_frontier(&self, registry: &WorldRegistry) -> Option<Aabb> {
        registry.get(self.right_frontier).copied()
    }

    /// Screen y of the floor line (all floor segments scroll together)
    pub fn floor_top(&self, registry: &WorldRegistry) -> Option<f32> {
        self.left_frontier(registry).map(|r| r.top())
    }

    /// Extend either side whose frontier came within one screen width of the
    /// viewport. Returns the enemies placed in the new runs.
    pub fn maintain(&mut self, registry: &mut WorldRegistry) -> Vec<EnemySpawn> {
        let mut spawns = Vec::new();

        if let Some(frontier) = self.left_frontier(registry) {
            let gap = -frontier.left();
            if gap < self.screen_width {
                self.extend(registry, Side::Left, frontier, gap, &mut spawns);
            }
        }

        if let Some(frontier) = self.right_frontier(registry) {
            let gap = frontier.right() - self.screen_width;
            if gap < self.screen_width {
                self.extend(registry, Side::Right, frontier, gap, &mut spawns);
            }
        }

        spawns
    }

    fn extend(
        &mut self,
        registry: &mut WorldRegistry,
        side: Side,
        frontier: Aabb,
        gap: f32,
        spawns: &mut Vec<EnemySpawn>,
    ) {
        // Run length that puts the new frontier exactly 2W from the viewport edge
        let target = 2.0 * self.screen_width - gap;
        let floor_top = frontier.top();
        let thickness = frontier.height();
        let min_segment = self.tuning.segment_width.min as f32;

        let (start, sign) = match side {
            Side::Left => (frontier.left(), -1.0),
            Side::Right => (frontier.right(), 1.0),
        };

        let mut cursor = start;
        let mut remaining = target;
        let mut new_frontier = None;

        while remaining > CONTACT_EPSILON {
            let mut hole = self.tuning.hole_width.sample(&mut self.rng) as f32;
            if hole + min_segment > remaining {
                hole = 0.0;
            }
            let mut segment = (self.tuning.segment_width.sample(&mut self.rng) as f32)
                .min(remaining - hole);
            if remaining - hole - segment < min_segment {
                // Absorb a tail too short for its own segment
                segment = remaining - hole;
            }

            cursor += sign * hole;
            let left = match side {
                Side::Left => cursor - segment,
                Side::Right => cursor,
            };
            cursor += sign * segment;
            remaining -= hole + segment;

            let rect = Aabb::new(Vec2::new(left, floor_top), Vec2::new(segment, thickness));
            new_frontier = Some(self.add_obstacle(registry, ObstacleKind::Floor, rect));
        }

        let Some(new_frontier) = new_frontier else {
            return;
        };
        match side {
            Side::Left => self.left_frontier = new_frontier,
            Side::Right => self.right_frontier = new_frontier,
        }

        let run_left = start.min(cursor);
        let run_width = (cursor - start).abs();
        let band_bottom = floor_top;
        let band_top = floor_top - self.tuning.band_height;

        let ceiling = Aabb::new(
            Vec2::new(run_left, band_top - self.tuning.ceiling_thickness),
            Vec2::new(run_width, self.tuning.ceiling_thickness),
        );
        self.add_obstacle(registry, ObstacleKind::Ceiling, ceiling);

        let blocks = self.populate_blocks(registry, run_left, run_width, band_top, band_bottom);
        let enemies =
            self.populate_enemies(registry, run_left, run_width, band_top, band_bottom, &blocks);

        log::info!(
            "Extended level {:?}: run width {}, {} blocks, {} enemies",
            side,
            run_width,
            blocks.len(),
            enemies.len()
        );
        spawns.extend(enemies);
    }

    fn add_obstacle(
        &mut self,
        registry: &mut WorldRegistry,
        kind: ObstacleKind,
        rect: Aabb,
    ) -> RectHandle {
        let handle = registry.register(rect);
        self.obstacles.push(Obstacle { kind, handle });
        handle
    }

    /// Random box of `size` uniformly inside the band over the run
    fn random_rect(
        &mut self,
        run_left: f32,
        run_width: f32,
        band_top: f32,
        band_bottom: f32,
        size: Vec2,
    ) -> Aabb {
        let x = self.rng.random_range(run_left..=run_left + run_width - size.x);
        let y = self.rng.random_range(band_top..=band_bottom - size.y);
        Aabb::new(Vec2::new(x, y), size)
    }

    fn populate_blocks(
        &mut self,
        registry: &mut WorldRegistry,
        run_left: f32,
        run_width: f32,
        band_top: f32,
        band_bottom: f32,
    ) -> Vec<Aabb> {
        let count = self.tuning.obstacle_count.sample(&mut self.rng);
        let mut placed: Vec<Aabb> = Vec::new();

        for _ in 0..count {
            let size = Vec2::new(
                self.tuning.obstacle_size.sample(&mut self.rng) as f32,
                self.tuning.obstacle_size.sample(&mut self.rng) as f32,
            );
            for _ in 0..self.tuning.placement_attempts {
                let rect = self.random_rect(run_left, run_width, band_top, band_bottom, size);
                if placed.iter().any(|p| p.overlaps(&rect)) {
                    continue;
                }
                debug_assert!(
                    self.obstacle_rects(registry).iter().all(|o| !o.overlaps(&rect)),
                    "generated obstacle overlaps an existing one"
                );
                self.add_obstacle(registry, ObstacleKind::Block, rect);
                placed.push(rect);
                break;
            }
        }

        placed
    }

    fn populate_enemies(
        &mut self,
        registry: &mut WorldRegistry,
        run_left: f32,
        run_width: f32,
        band_top: f32,
        band_bottom: f32,
        blocks: &[Aabb],
    ) -> Vec<EnemySpawn> {
        let count = self.tuning.enemy_count.sample(&mut self.rng);
        let mut spawns = Vec::new();

        for _ in 0..count {
            let size = Vec2::splat(self.tuning.enemy_size.sample(&mut self.rng) as f32);
            for _ in 0..self.tuning.placement_attempts {
                let rect = self.random_rect(run_left, run_width, band_top, band_bottom, size);
                if blocks.iter().any(|b| b.overlaps(&rect)) {
                    continue;
                }

                let patrol = if self.rng.random_range(0..100) < self.tuning.patrol_percent {
                    let range = self.tuning.patrol_range.sample(&mut self.rng) as f32;
                    let dir = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    Some(Patrol::new(self.tuning.patrol_speed, range, dir))
                } else {
                    None
                };

                spawns.push(EnemySpawn {
                    handle: registry.register(rect),
                    patrol,
                });
                break;
            }
        }

        spawns
    }
}
