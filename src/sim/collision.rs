//! Collision detection and response for axis-aligned boxes
//!
//! A moving body is resolved against static obstacles one candidate at a time.
//! Each contact is classified as vertical (landing or ceiling) or horizontal,
//! and the body is pushed out by exactly the penetration depth so it ends the
//! tick flush with the obstacle edge.

use glam::Vec2;

use super::aabb::Aabb;
use super::body::KinematicState;

/// Axis a contact is resolved along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Outcome of resolving one body against its candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Body box after correction
    pub rect: Aabb,
    /// Translation applied to the body (rect.min - body.min)
    pub correction: Vec2,
    pub vel: Vec2,
    /// Set only by a downward contact with an obstacle's top edge
    pub grounded: bool,
    /// Number of candidates that were still touching when processed
    pub contacts: usize,
}

/// Broad phase: obstacles overlapping the body or supporting it from below
pub fn gather_candidates<'a, I>(body: &Aabb, rects: I) -> Vec<Aabb>
where
    I: IntoIterator<Item = &'a Aabb>,
{
    rects
        .into_iter()
        .filter(|r| body.overlaps(r) || body.rests_on(r))
        .copied()
        .collect()
}

/// Pick the resolution axis for an overlapping pair.
///
/// Vertical whenever the body's bottom is in the obstacle's upper half
/// (landing) or its top is in the lower half (ceiling), so running across tile
/// seams never catches on a vertical edge. A body straddling the obstacle's
/// vertical centre is pushed out along whichever axis is shallower: sideways
/// by the nearer side edge, or vertically against its direction of travel.
pub fn classify(body: &Aabb, vel: Vec2, obstacle: &Aabb) -> Axis {
    let mid = obstacle.center().y;
    if body.bottom() <= mid || body.top() >= mid {
        return Axis::Vertical;
    }

    let depth = body.penetration(obstacle);
    let vertical = if vel.y < 0.0 {
        obstacle.bottom() - body.top()
    } else {
        body.bottom() - obstacle.top()
    };
    if depth.x < vertical {
        Axis::Horizontal
    } else {
        Axis::Vertical
    }
}

/// Whether a vertical contact puts the body on top of the obstacle
fn lands_on(body: &Aabb, vel: Vec2, obstacle: &Aabb) -> bool {
    let mid = obstacle.center().y;
    body.bottom() <= mid || (body.top() < mid && vel.y >= 0.0)
}

/// Resolve a body against a set of candidate obstacles.
///
/// The grounded flag starts false and is set only by a landing while moving
/// downward (or at rest). Candidates are processed in order against the
/// progressively corrected box.
pub fn resolve(body: &Aabb, vel: Vec2, obstacles: &[Aabb]) -> Resolution {
    let mut rect = *body;
    let mut vel = vel;
    let mut grounded = false;
    let mut contacts = 0;

    for obstacle in obstacles {
        let overlapping = rect.overlaps(obstacle);
        if !overlapping && !rect.rests_on(obstacle) {
            continue;
        }
        contacts += 1;

        if !overlapping {
            // Flush support, zero depth
            if vel.y >= 0.0 {
                vel.y = 0.0;
                grounded = true;
            }
            continue;
        }

        match classify(&rect, vel, obstacle) {
            Axis::Vertical if lands_on(&rect, vel, obstacle) => {
                rect.set_bottom(obstacle.top());
                if vel.y >= 0.0 {
                    vel.y = 0.0;
                    grounded = true;
                }
            }
            Axis::Vertical => {
                rect.set_top(obstacle.bottom());
                if vel.y < 0.0 {
                    vel.y = 0.0;
                }
            }
            Axis::Horizontal => {
                if rect.right() - obstacle.left() < obstacle.right() - rect.left() {
                    rect.set_right(obstacle.left());
                } else {
                    rect.set_left(obstacle.right());
                }
                vel.x = 0.0;
            }
        }
    }

    Resolution {
        rect,
        correction: rect.min - body.min,
        vel,
        grounded,
        contacts,
    }
}

/// Resolve two movable bodies (crate on crate).
///
/// A body clearly above the other is lifted flush onto it and becomes
/// grounded. Otherwise the faster body is pushed out sideways. Lateral
/// push-out only happens when the centres are vertically close compared to the
/// pair's relative horizontal speed, so a stack does not slide apart.
/// Returns the axis used, or `None` when the bodies do not touch.
pub fn stack_pair(
    a_rect: &mut Aabb,
    a_body: &mut KinematicState,
    b_rect: &mut Aabb,
    b_body: &mut KinematicState,
) -> Option<Axis> {
    let overlapping = a_rect.overlaps(b_rect);
    if !overlapping && !a_rect.rests_on(b_rect) && !b_rect.rests_on(a_rect) {
        return None;
    }

    let a_on_top = a_rect.center().y <= b_rect.center().y;
    let (upper, upper_body, lower, lower_body) = if a_on_top {
        (a_rect, a_body, b_rect, b_body)
    } else {
        (b_rect, b_body, a_rect, a_body)
    };

    let separation = lower.center().y - upper.center().y;
    let relative_speed = (upper_body.vel.x - lower_body.vel.x).abs();
    let clearly_above = upper.bottom() <= lower.center().y;

    if !overlapping {
        if clearly_above && upper_body.vel.y >= 0.0 {
            upper_body.vel.y = 0.0;
            upper_body.grounded = true;
            return Some(Axis::Vertical);
        }
        return None;
    }

    if clearly_above && separation > relative_speed {
        upper.set_bottom(lower.top());
        upper_body.vel.y = 0.0;
        upper_body.grounded = true;
        return Some(Axis::Vertical);
    }

    let upper_moves = upper_body.vel.x.abs() >= lower_body.vel.x.abs();
    let (mover, mover_body, other) = if upper_moves {
        (upper, upper_body, &*lower)
    } else {
        (lower, lower_body, &*upper)
    };
    if mover.center().x < other.center().x {
        mover.set_right(other.left());
    } else {
        mover.set_left(other.right());
    }
    mover_body.vel.x = 0.0;
    Some(Axis::Horizontal)
}
