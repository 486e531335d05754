//! Line of sight via ray sampling along the hex line
//!
//! Any fully blocking hex (opaque terrain or a combatant not excluded)
//! occludes everything beyond it on the ray.

use crate::core::types::CombatantId;
use crate::grid::{HexBattleGrid, HexPosition};

/// A combatant visible from some origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleCombatant {
    pub id: CombatantId,
    pub position: HexPosition,
    pub distance: u32,
}

/// Trace the sampled ray from one hex to another, endpoints included
pub fn trace_path(from: HexPosition, to: HexPosition) -> Vec<HexPosition> {
    from.line_to(&to)
}

/// Check line of sight between two hexes
///
/// Only intermediate hexes block; the endpoints never do. Combatants in
/// `exclude` (normally the attacker and the target) are ignored.
pub fn has_line_of_sight(
    grid: &HexBattleGrid,
    from: HexPosition,
    to: HexPosition,
    exclude: &[CombatantId],
) -> bool {
    let path = trace_path(from, to);

    for hex in path.iter().skip(1).take(path.len().saturating_sub(2)) {
        if grid.terrain_at(*hex).blocks_los() {
            return false;
        }
        if let Some(occupant) = grid.occupant_at(*hex) {
            if !exclude.contains(&occupant) {
                return false;
            }
        }
    }

    true
}

/// All combatants visible from an origin within range
///
/// Output is sorted by distance, then (q, r), so results are stable for a
/// fixed grid.
pub fn visible_combatants(
    grid: &HexBattleGrid,
    origin: HexPosition,
    max_range: u32,
    exclude: &[CombatantId],
) -> Vec<VisibleCombatant> {
    let mut visible: Vec<VisibleCombatant> = grid
        .occupancy_entries()
        .into_iter()
        .filter(|(id, _)| !exclude.contains(id))
        .filter_map(|(id, position)| {
            let distance = origin.distance(&position);
            if distance > max_range {
                return None;
            }
            let mut ignore = exclude.to_vec();
            ignore.push(id);
            if !has_line_of_sight(grid, origin, position, &ignore) {
                return None;
            }
            Some(VisibleCombatant {
                id,
                position,
                distance,
            })
        })
        .collect();

    visible.sort_by_key(|v| (v.distance, v.position.q, v.position.r));
    visible
}
