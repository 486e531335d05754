//! Terrain tags for arena hexes

use serde::{Deserialize, Serialize};

/// Terrain tag for a single hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerrainTag {
    #[default]
    Open,
    /// Central tower cluster: impassable and opaque
    Tower,
    /// Hazard ring at the arena rim: enterable, but it bites
    PerimeterWater,
}

impl TerrainTag {
    /// Does this terrain block movement entirely?
    pub fn blocks_movement(&self) -> bool {
        matches!(self, TerrainTag::Tower)
    }

    /// Does this terrain block line of sight?
    pub fn blocks_los(&self) -> bool {
        matches!(self, TerrainTag::Tower)
    }

    /// Does entering this terrain trigger a hazard?
    pub fn is_hazard(&self) -> bool {
        matches!(self, TerrainTag::PerimeterWater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_benign() {
        assert!(!TerrainTag::Open.blocks_movement());
        assert!(!TerrainTag::Open.blocks_los());
        assert!(!TerrainTag::Open.is_hazard());
    }

    #[test]
    fn test_tower_blocks() {
        assert!(TerrainTag::Tower.blocks_movement());
        assert!(TerrainTag::Tower.blocks_los());
    }

    #[test]
    fn test_water_is_hazard_but_passable() {
        assert!(TerrainTag::PerimeterWater.is_hazard());
        assert!(!TerrainTag::PerimeterWater.blocks_movement());
        assert!(!TerrainTag::PerimeterWater.blocks_los());
    }
}
