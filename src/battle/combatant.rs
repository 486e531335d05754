//! Combatants and teams
//!
//! A team owns its combatants' identity; the grid only references ids for
//! positioning. Stats are a fixed, exhaustively enumerated set — derived
//! values like initiative are computed, never stored.

use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, TeamId};

/// Core combat stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreStats {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub max_health: i32,
}

/// One combatant's battle-scoped state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantState {
    pub id: CombatantId,
    pub team: TeamId,
    pub name: String,
    pub stats: CoreStats,
    pub health: i32,
    /// Propensity to follow the coach's plan, 0-100
    pub adherence: u8,
    /// Braced until the next round reset
    pub defending: bool,
}

impl CombatantState {
    pub fn new(team: TeamId, name: impl Into<String>, stats: CoreStats, adherence: u8) -> Self {
        Self {
            id: CombatantId::new(),
            team,
            name: name.into(),
            stats,
            health: stats.max_health,
            adherence: adherence.min(100),
            defending: false,
        }
    }

    pub fn with_id(mut self, id: CombatantId) -> Self {
        self.id = id;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.stats.max_health <= 0 {
            return 0.0;
        }
        (self.health.max(0) as f32) / (self.stats.max_health as f32)
    }

    /// Apply a signed health delta, clamped to [0, max]
    pub fn apply_health_delta(&mut self, delta: i32) {
        self.health = (self.health + delta).clamp(0, self.stats.max_health);
        if self.health == 0 {
            self.defending = false;
        }
    }
}

/// A team of combatants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub combatants: Vec<CombatantState>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TeamId::new(),
            name: name.into(),
            combatants: Vec::new(),
        }
    }

    pub fn get(&self, id: CombatantId) -> Option<&CombatantState> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut CombatantState> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn living(&self) -> impl Iterator<Item = &CombatantState> {
        self.combatants.iter().filter(|c| c.is_alive())
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    pub fn is_defeated(&self) -> bool {
        self.living_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> CoreStats {
        CoreStats {
            attack: 50,
            defense: 20,
            speed: 90,
            max_health: 100,
        }
    }

    #[test]
    fn test_new_combatant_full_health() {
        let team = TeamId::new();
        let c = CombatantState::new(team, "Achilles", stats(), 80);
        assert_eq!(c.health, 100);
        assert!(c.is_alive());
        assert!(!c.defending);
    }

    #[test]
    fn test_adherence_clamped() {
        let c = CombatantState::new(TeamId::new(), "Zealot", stats(), 250);
        assert_eq!(c.adherence, 100);
    }

    #[test]
    fn test_health_delta_clamps_at_zero() {
        let mut c = CombatantState::new(TeamId::new(), "Achilles", stats(), 80);
        c.apply_health_delta(-250);
        assert_eq!(c.health, 0);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_healing_clamps_at_max() {
        let mut c = CombatantState::new(TeamId::new(), "Achilles", stats(), 80);
        c.apply_health_delta(-30);
        c.apply_health_delta(100);
        assert_eq!(c.health, 100);
    }

    #[test]
    fn test_death_clears_defending() {
        let mut c = CombatantState::new(TeamId::new(), "Achilles", stats(), 80);
        c.defending = true;
        c.apply_health_delta(-100);
        assert!(!c.defending);
    }

    #[test]
    fn test_team_defeated_when_all_down() {
        let mut team = Team::new("Spartans");
        let team_id = team.id;
        team.combatants
            .push(CombatantState::new(team_id, "A", stats(), 80));
        team.combatants
            .push(CombatantState::new(team_id, "B", stats(), 80));
        assert!(!team.is_defeated());

        for c in &mut team.combatants {
            c.apply_health_delta(-999);
        }
        assert!(team.is_defeated());
    }

    #[test]
    fn test_health_fraction() {
        let mut c = CombatantState::new(TeamId::new(), "Achilles", stats(), 80);
        c.apply_health_delta(-75);
        assert!((c.health_fraction() - 0.25).abs() < f32::EPSILON);
    }
}
