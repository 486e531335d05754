//! Action economy - AP accounting, movement legality, damage resolution

pub mod action_points;
pub mod damage;
pub mod movement;

pub use action_points::ActionPointState;
pub use damage::{resolve_damage, DamageBreakdown};
pub use movement::{can_move_to, reachable_hexes};
