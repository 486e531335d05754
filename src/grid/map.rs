//! The battle arena: a bounded hex field with terrain and occupancy
//!
//! Occupancy is bijective: every combatant id maps to exactly one hex and
//! every hex holds at most one combatant. Mutations return a new grid value
//! so the orchestrator remains the single writer of the live copy.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::CombatantId;
use crate::grid::hex::HexPosition;
use crate::grid::terrain::TerrainTag;

/// The full battle arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexBattleGrid {
    /// Hexagonal bound: a hex is valid iff max(|q|, |r|, |s|) <= radius
    pub radius: i32,
    terrain: AHashMap<HexPosition, TerrainTag>,
    positions: AHashMap<CombatantId, HexPosition>,
}

impl HexBattleGrid {
    /// Create an open arena with the given radius
    pub fn new(radius: i32) -> Self {
        Self {
            radius,
            terrain: AHashMap::new(),
            positions: AHashMap::new(),
        }
    }

    /// Create the standard arena: central tower cluster, water at the rim
    pub fn standard_arena(radius: i32) -> Self {
        let mut grid = Self::new(radius);

        for coord in [
            HexPosition::new(0, 0),
            HexPosition::new(1, -1),
            HexPosition::new(0, 1),
        ] {
            grid.terrain.insert(coord, TerrainTag::Tower);
        }

        for coord in HexPosition::new(0, 0).hexes_in_range(radius as u32) {
            if coord.q.abs() == radius || coord.r.abs() == radius || coord.s().abs() == radius {
                grid.terrain.insert(coord, TerrainTag::PerimeterWater);
            }
        }

        grid
    }

    /// Starting row for the first team, facing the second across the tower
    pub fn deployment_row_a(&self, count: usize) -> Vec<HexPosition> {
        Self::deployment_row(count, self.radius / 2)
    }

    /// Starting row for the second team
    pub fn deployment_row_b(&self, count: usize) -> Vec<HexPosition> {
        Self::deployment_row(count, -self.radius / 2)
    }

    fn deployment_row(count: usize, r: i32) -> Vec<HexPosition> {
        // Spread around q = 0: 0, -2, 2, -4, 4, ...
        (0..count)
            .map(|i| {
                let offset = ((i as i32) + 1) / 2 * 2;
                let q = if i % 2 == 0 { -offset } else { offset };
                HexPosition::new(q, r)
            })
            .collect()
    }

    /// Check if a coordinate is within arena bounds
    pub fn in_bounds(&self, pos: HexPosition) -> bool {
        pos.q.abs() <= self.radius && pos.r.abs() <= self.radius && pos.s().abs() <= self.radius
    }

    /// Terrain at a coordinate (open when untagged)
    pub fn terrain_at(&self, pos: HexPosition) -> TerrainTag {
        self.terrain.get(&pos).copied().unwrap_or_default()
    }

    /// The combatant standing on a hex, if any
    pub fn occupant_at(&self, pos: HexPosition) -> Option<CombatantId> {
        self.positions
            .iter()
            .find(|(_, p)| **p == pos)
            .map(|(id, _)| *id)
    }

    /// Where a combatant stands, if placed
    pub fn position_of(&self, id: CombatantId) -> Option<HexPosition> {
        self.positions.get(&id).copied()
    }

    /// A hex a combatant could stand on: in bounds, passable, unoccupied
    pub fn is_free(&self, pos: HexPosition) -> bool {
        self.in_bounds(pos)
            && !self.terrain_at(pos).blocks_movement()
            && self.occupant_at(pos).is_none()
    }

    /// Place a combatant on a hex, returning the updated grid
    pub fn place(&self, id: CombatantId, pos: HexPosition) -> Result<Self> {
        if !self.in_bounds(pos) {
            return Err(EngineError::OutOfBounds { q: pos.q, r: pos.r });
        }
        if self.terrain_at(pos).blocks_movement() || self.occupant_at(pos).is_some() {
            return Err(EngineError::OccupiedHex { q: pos.q, r: pos.r });
        }
        if self.positions.contains_key(&id) {
            return Err(EngineError::InvalidTarget(format!(
                "combatant {:?} is already placed",
                id
            )));
        }

        let mut next = self.clone();
        next.positions.insert(id, pos);
        Ok(next)
    }

    /// Remove a combatant from the arena (defeat, forced removal)
    pub fn remove(&self, id: CombatantId) -> Result<Self> {
        if !self.positions.contains_key(&id) {
            return Err(EngineError::InvalidTarget(format!(
                "combatant {:?} is not on the grid",
                id
            )));
        }
        let mut next = self.clone();
        next.positions.remove(&id);
        Ok(next)
    }

    /// Move a placed combatant to a new hex
    pub fn move_occupant(&self, id: CombatantId, to: HexPosition) -> Result<Self> {
        let from = self.position_of(id).ok_or_else(|| {
            EngineError::InvalidTarget(format!("combatant {:?} is not on the grid", id))
        })?;
        if from == to {
            return Ok(self.clone());
        }
        if !self.in_bounds(to) {
            return Err(EngineError::OutOfBounds { q: to.q, r: to.r });
        }
        if self.terrain_at(to).blocks_movement() || self.occupant_at(to).is_some() {
            return Err(EngineError::OccupiedHex { q: to.q, r: to.r });
        }

        let mut next = self.clone();
        next.positions.insert(id, to);
        Ok(next)
    }

    /// All placed combatants, sorted by id for deterministic iteration
    pub fn occupancy_entries(&self) -> Vec<(CombatantId, HexPosition)> {
        let mut entries: Vec<_> = self.positions.iter().map(|(id, p)| (*id, *p)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Number of placed combatants
    pub fn occupant_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id(n: u128) -> CombatantId {
        CombatantId(Uuid::from_u128(n))
    }

    #[test]
    fn test_bounds_hexagonal() {
        let grid = HexBattleGrid::new(6);
        assert!(grid.in_bounds(HexPosition::new(6, 0)));
        assert!(grid.in_bounds(HexPosition::new(3, 3)));
        assert!(!grid.in_bounds(HexPosition::new(7, 0)));
        assert!(!grid.in_bounds(HexPosition::new(4, 3))); // s = -7
    }

    #[test]
    fn test_place_and_lookup() {
        let grid = HexBattleGrid::new(6);
        let grid = grid.place(id(1), HexPosition::new(2, 2)).unwrap();
        assert_eq!(grid.occupant_at(HexPosition::new(2, 2)), Some(id(1)));
        assert_eq!(grid.position_of(id(1)), Some(HexPosition::new(2, 2)));
    }

    #[test]
    fn test_place_does_not_mutate_original() {
        let grid = HexBattleGrid::new(6);
        let _updated = grid.place(id(1), HexPosition::new(0, 2)).unwrap();
        assert_eq!(grid.occupant_count(), 0);
    }

    #[test]
    fn test_place_occupied_hex_rejected() {
        let grid = HexBattleGrid::new(6)
            .place(id(1), HexPosition::new(1, 1))
            .unwrap();
        let result = grid.place(id(2), HexPosition::new(1, 1));
        assert!(matches!(result, Err(EngineError::OccupiedHex { .. })));
    }

    #[test]
    fn test_place_out_of_bounds_rejected() {
        let grid = HexBattleGrid::new(6);
        let result = grid.place(id(1), HexPosition::new(10, 0));
        assert!(matches!(result, Err(EngineError::OutOfBounds { .. })));
    }

    #[test]
    fn test_place_into_tower_rejected() {
        let grid = HexBattleGrid::standard_arena(6);
        let result = grid.place(id(1), HexPosition::new(0, 0));
        assert!(matches!(result, Err(EngineError::OccupiedHex { .. })));
    }

    #[test]
    fn test_double_placement_rejected() {
        let grid = HexBattleGrid::new(6)
            .place(id(1), HexPosition::new(1, 1))
            .unwrap();
        assert!(grid.place(id(1), HexPosition::new(2, 2)).is_err());
    }

    #[test]
    fn test_move_occupant() {
        let grid = HexBattleGrid::new(6)
            .place(id(1), HexPosition::new(0, 1))
            .unwrap();
        let grid = grid.move_occupant(id(1), HexPosition::new(0, 3)).unwrap();
        assert_eq!(grid.position_of(id(1)), Some(HexPosition::new(0, 3)));
        assert_eq!(grid.occupant_at(HexPosition::new(0, 1)), None);
    }

    #[test]
    fn test_remove_clears_hex() {
        let grid = HexBattleGrid::new(6)
            .place(id(1), HexPosition::new(0, 1))
            .unwrap();
        let grid = grid.remove(id(1)).unwrap();
        assert_eq!(grid.occupant_at(HexPosition::new(0, 1)), None);
        assert_eq!(grid.occupant_count(), 0);
    }

    #[test]
    fn test_standard_arena_perimeter_is_water() {
        let grid = HexBattleGrid::standard_arena(6);
        assert_eq!(
            grid.terrain_at(HexPosition::new(6, 0)),
            TerrainTag::PerimeterWater
        );
        assert_eq!(
            grid.terrain_at(HexPosition::new(0, -6)),
            TerrainTag::PerimeterWater
        );
        assert_eq!(grid.terrain_at(HexPosition::new(2, 0)), TerrainTag::Open);
    }

    #[test]
    fn test_deployment_rows_face_each_other() {
        let grid = HexBattleGrid::standard_arena(6);
        let a = grid.deployment_row_a(3);
        let b = grid.deployment_row_b(3);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        for pos in a.iter().chain(b.iter()) {
            assert!(grid.is_free(*pos), "deployment hex {:?} not free", pos);
        }
        assert!(a[0].r > b[0].r);
    }

    #[test]
    fn test_occupancy_entries_sorted() {
        let grid = HexBattleGrid::new(6)
            .place(id(5), HexPosition::new(0, 1))
            .unwrap()
            .place(id(2), HexPosition::new(1, 1))
            .unwrap();
        let entries = grid.occupancy_entries();
        assert_eq!(entries[0].0, id(2));
        assert_eq!(entries[1].0, id(5));
    }
}
