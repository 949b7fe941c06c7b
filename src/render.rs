//! Draw lists for an external renderer
//!
//! The simulation has no opinion on pixels. Once per tick the caller walks the
//! state and receives one (rectangle, tag) pair per live entity, either through
//! a [`RenderSink`] or as a GPU-ready [`RectInstance`] buffer.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::sim::{Aabb, GameState, ObstacleKind, ProjectileKind};

/// Discrete visual state of a drawn rectangle
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualTag {
    Player = 0,
    PlayerInvulnerable = 1,
    Floor = 2,
    Ceiling = 3,
    Block = 4,
    Crate = 5,
    Bomb = 6,
    Explosion = 7,
    Marker = 8,
    Enemy = 9,
}

impl VisualTag {
    /// Suggested fill color (linear RGBA)
    pub const fn color(self) -> [f32; 4] {
        match self {
            Self::Player => colors::PLAYER,
            Self::PlayerInvulnerable => colors::PLAYER_INVULNERABLE,
            Self::Floor => colors::FLOOR,
            Self::Ceiling => colors::CEILING,
            Self::Block => colors::BLOCK,
            Self::Crate => colors::CRATE,
            Self::Bomb => colors::BOMB,
            Self::Explosion => colors::EXPLOSION,
            Self::Marker => colors::MARKER,
            Self::Enemy => colors::ENEMY,
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const PLAYER: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    pub const PLAYER_INVULNERABLE: [f32; 4] = [0.9, 0.85, 0.3, 1.0];
    pub const FLOOR: [f32; 4] = [0.3, 0.3, 0.4, 1.0];
    pub const CEILING: [f32; 4] = [0.25, 0.25, 0.35, 1.0];
    pub const BLOCK: [f32; 4] = [0.4, 0.7, 1.0, 1.0];
    pub const CRATE: [f32; 4] = [0.6, 0.45, 0.25, 1.0];
    pub const BOMB: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
    pub const EXPLOSION: [f32; 4] = [1.0, 0.4, 0.2, 0.8];
    pub const MARKER: [f32; 4] = [1.0, 1.0, 1.0, 0.6];
    pub const ENEMY: [f32; 4] = [0.9, 0.1, 0.2, 1.0];
}

/// Receives the per-tick draw list
pub trait RenderSink {
    fn draw(&mut self, rect: &Aabb, tag: VisualTag);
}

/// One entry of a collected draw list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawItem {
    pub rect: Aabb,
    pub tag: VisualTag,
}

impl RenderSink for Vec<DrawItem> {
    fn draw(&mut self, rect: &Aabb, tag: VisualTag) {
        self.push(DrawItem { rect: *rect, tag });
    }
}

/// Per-instance data for an instanced quad pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    pub min: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
    pub tag: u32,
    pub _pad: [u32; 3],
}

impl RectInstance {
    pub fn new(rect: &Aabb, tag: VisualTag) -> Self {
        Self {
            min: rect.min.to_array(),
            size: rect.size.to_array(),
            color: tag.color(),
            tag: tag as u32,
            _pad: [0; 3],
        }
    }
}

impl RenderSink for Vec<RectInstance> {
    fn draw(&mut self, rect: &Aabb, tag: VisualTag) {
        self.push(RectInstance::new(rect, tag));
    }
}

/// Emit every live entity, back to front: obstacles, enemies, projectiles,
/// markers, explosions, then the player.
pub fn render<S: RenderSink + ?Sized>(state: &GameState, sink: &mut S) {
    let registry = &state.registry;

    for obstacle in state.level.obstacles() {
        let tag = match obstacle.kind {
            ObstacleKind::Floor => VisualTag::Floor,
            ObstacleKind::Ceiling => VisualTag::Ceiling,
            ObstacleKind::Block => VisualTag::Block,
        };
        if let Some(rect) = registry.get(obstacle.handle) {
            sink.draw(rect, tag);
        }
    }

    for enemy in &state.enemies {
        if let Some(rect) = registry.get(enemy.handle) {
            sink.draw(rect, VisualTag::Enemy);
        }
    }

    for projectile in &state.projectiles {
        let tag = match projectile.kind {
            ProjectileKind::Crate => VisualTag::Crate,
            ProjectileKind::Bomb { .. } => VisualTag::Bomb,
        };
        if let Some(rect) = registry.get(projectile.handle) {
            sink.draw(rect, tag);
        }
    }

    for marker in &state.markers {
        if let Some(rect) = registry.get(marker.handle) {
            sink.draw(rect, VisualTag::Marker);
        }
    }

    for explosion in &state.explosions {
        if let Some(rect) = registry.get(explosion.handle) {
            sink.draw(rect, VisualTag::Explosion);
        }
    }

    let player_tag = if state.player.is_invulnerable() {
        VisualTag::PlayerInvulnerable
    } else {
        VisualTag::Player
    };
    sink.draw(&state.player.rect, player_tag);
}

pub fn draw_list(state: &GameState) -> Vec<DrawItem> {
    let mut items = Vec::new();
    render(state, &mut items);
    items
}

/// Instance buffer contents, ready for `bytemuck::cast_slice`
pub fn instances(state: &GameState) -> Vec<RectInstance> {
    let mut instances = Vec::new();
    render(state, &mut instances);
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Config;
    use glam::Vec2;

    #[test]
    fn test_draw_list_covers_every_entity() {
        let mut state = GameState::new(Config::default(), 7).unwrap();
        state.spawn_crate(Vec2::new(100.0, 100.0), Vec2::ZERO);
        state.spawn_bomb(Vec2::new(200.0, 100.0), Vec2::ZERO);
        state.spawn_explosion(Vec2::new(300.0, 100.0));
        state.spawn_marker(Vec2::new(400.0, 100.0), Vec2::ZERO);

        let items = draw_list(&state);
        // Every registered rectangle plus the unregistered player
        assert_eq!(items.len(), state.registry.len() + 1);
        assert_eq!(items.last().map(|i| i.tag), Some(VisualTag::Player));
        assert!(items.iter().any(|i| i.tag == VisualTag::Floor));
        assert!(items.iter().any(|i| i.tag == VisualTag::Ceiling));
        assert!(items.iter().any(|i| i.tag == VisualTag::Crate));
        assert!(items.iter().any(|i| i.tag == VisualTag::Bomb));
        assert!(items.iter().any(|i| i.tag == VisualTag::Explosion));
        assert!(items.iter().any(|i| i.tag == VisualTag::Marker));
    }

    #[test]
    fn test_invulnerable_player_tag() {
        let mut state = GameState::new(Config::default(), 7).unwrap();
        state
            .player
            .activate_invulnerability(&state.config.invulnerability);
        let items = draw_list(&state);
        assert_eq!(
            items.last().map(|i| i.tag),
            Some(VisualTag::PlayerInvulnerable)
        );
    }

    #[test]
    fn test_instances_are_gpu_layout() {
        assert_eq!(std::mem::size_of::<RectInstance>(), 48);

        let state = GameState::new(Config::default(), 7).unwrap();
        let instances = instances(&state);
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), instances.len() * 48);

        let player = instances.last().unwrap();
        assert_eq!(player.tag, VisualTag::Player as u32);
        assert_eq!(player.size, [64.0, 64.0]);
        assert_eq!(player.color, colors::PLAYER);
    }
}
