//! World registry and scroll shifter
//!
//! Every rectangle that must move with the camera lives in a
//! [`WorldRegistry`] slot. Entities keep the [`RectHandle`] they got on
//! registration and release it when they die. Scrolling translates every live
//! slot by the negative of the player's velocity, so the player's own box never
//! moves.

use glam::Vec2;

use super::aabb::Aabb;
use super::body::KinematicState;

/// Generational handle to a registered rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RectHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    rect: Option<Aabb>,
}

/// Arena of world-space rectangles that scroll with the camera
#[derive(Debug, Clone, Default)]
pub struct WorldRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    /// Total translation applied by `shift` since creation
    camera_offset: Vec2,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rectangle; it will move with every subsequent shift
    pub fn register(&mut self, rect: Aabb) -> RectHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.rect = Some(rect);
            return RectHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            rect: Some(rect),
        });
        RectHandle {
            index,
            generation: 0,
        }
    }

    /// Release a handle. Stale handles return `None`.
    pub fn unregister(&mut self, handle: RectHandle) -> Option<Aabb> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let rect = slot.rect.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(rect)
    }

    pub fn get(&self, handle: RectHandle) -> Option<&Aabb> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.rect.as_ref())
    }

    pub fn get_mut(&mut self, handle: RectHandle) -> Option<&mut Aabb> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.rect.as_mut())
    }

    pub fn contains(&self, handle: RectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live rectangles
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live rectangles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Aabb> {
        self.slots.iter().filter_map(|slot| slot.rect.as_ref())
    }

    /// Translate every registered rectangle
    pub fn shift(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        for rect in self.slots.iter_mut().filter_map(|slot| slot.rect.as_mut()) {
            rect.translate(delta);
        }
        self.camera_offset += delta;
    }

    /// Accumulated world translation (the negative of camera travel)
    pub fn camera_offset(&self) -> Vec2 {
        self.camera_offset
    }
}

/// World translation for one tick of player movement.
///
/// Vertical scrolling is suppressed while grounded so the floor does not jitter.
pub fn scroll_delta(body: &KinematicState) -> Vec2 {
    if body.grounded {
        Vec2::new(-body.vel.x, 0.0)
    } else {
        -body.vel
    }
}
