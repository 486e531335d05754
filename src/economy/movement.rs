//! Movement legality and reachability
//!
//! Cost-limited flood fill where each step costs one AP. Expansion order is
//! deterministic: the frontier is sorted by coordinate before each ring.

use ahash::AHashMap;

use crate::core::config::AP_COST_MOVE_PER_HEX;
use crate::core::error::{EngineError, Result};
use crate::core::types::CombatantId;
use crate::grid::{HexBattleGrid, HexPosition};

/// All hexes a combatant can reach from `origin` within its AP budget
///
/// The origin itself is excluded. Result is sorted by (q, r).
pub fn reachable_hexes(
    grid: &HexBattleGrid,
    id: CombatantId,
    origin: HexPosition,
    ap_available: u8,
) -> Vec<HexPosition> {
    let mut reachable: Vec<HexPosition> =
        flood_rings(grid, id, origin, ap_available / AP_COST_MOVE_PER_HEX)
            .into_iter()
            .flat_map(|(_, ring)| ring)
            .collect();
    reachable.sort_by_key(|p| (p.q, p.r));
    reachable
}

/// Check whether a move is legal and how much AP it costs
pub fn can_move_to(
    grid: &HexBattleGrid,
    id: CombatantId,
    from: HexPosition,
    to: HexPosition,
    ap_available: u8,
) -> Result<u8> {
    if !grid.in_bounds(to) {
        return Err(EngineError::OutOfBounds { q: to.q, r: to.r });
    }
    if to == from {
        return Err(EngineError::InvalidTarget("already at destination".into()));
    }
    if !passable_for(grid, id, to) {
        return Err(EngineError::OccupiedHex { q: to.q, r: to.r });
    }

    let straight_cost = from.distance(&to) as u8 * AP_COST_MOVE_PER_HEX;
    if straight_cost > ap_available {
        return Err(EngineError::InsufficientAp {
            needed: straight_cost,
            available: ap_available,
        });
    }

    // Within budget as the crow flies; the flood fill decides whether
    // obstacles still leave a path.
    let mut path_cost = None;
    for (steps, ring) in flood_rings(grid, id, from, ap_available / AP_COST_MOVE_PER_HEX) {
        if ring.contains(&to) {
            path_cost = Some(steps * AP_COST_MOVE_PER_HEX);
            break;
        }
    }

    path_cost.ok_or(EngineError::NotReachable)
}

/// Flood fill by ring, yielding (step, hexes first reached at that step)
fn flood_rings(
    grid: &HexBattleGrid,
    id: CombatantId,
    origin: HexPosition,
    max_steps: u8,
) -> Vec<(u8, Vec<HexPosition>)> {
    let mut seen: AHashMap<HexPosition, u8> = AHashMap::new();
    seen.insert(origin, 0);

    let mut rings = Vec::new();
    let mut frontier = vec![origin];
    for step in 1..=max_steps {
        let mut ring = Vec::new();
        frontier.sort_by_key(|p| (p.q, p.r));
        for hex in frontier {
            for neighbor in hex.neighbors() {
                if seen.contains_key(&neighbor) {
                    continue;
                }
                if !passable_for(grid, id, neighbor) {
                    continue;
                }
                seen.insert(neighbor, step);
                ring.push(neighbor);
            }
        }
        frontier = ring.clone();
        rings.push((step, ring));
    }
    rings
}

fn passable_for(grid: &HexBattleGrid, id: CombatantId, hex: HexPosition) -> bool {
    if !grid.in_bounds(hex) {
        return false;
    }
    if grid.terrain_at(hex).blocks_movement() {
        return false;
    }
    match grid.occupant_at(hex) {
        Some(occupant) => occupant == id,
        None => true,
    }
}
