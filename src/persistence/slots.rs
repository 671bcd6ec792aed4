//! Per-playthrough save slots for the action prototype

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::sim::CombatLoop;

pub const SLOT_COUNT: u8 = 3;

/// Validated slot number (1..=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u8);

impl SlotId {
    pub fn new(slot: u8) -> Result<Self, PersistenceError> {
        if (1..=SLOT_COUNT).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(PersistenceError::InvalidSlot(slot))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn file_name(self) -> String {
        format!("savegame_{}.json", self.0)
    }

    pub fn all() -> impl Iterator<Item = SlotId> {
        (1..=SLOT_COUNT).map(SlotId)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotData {
    pub level: u32,
    pub score: u64,
    #[serde(alias = "player_position")]
    pub position: Vec2,
    pub health: u32,
    pub silk: u32,
}

impl Default for SlotData {
    fn default() -> Self {
        Self {
            level: 1,
            score: 0,
            position: Vec2::ZERO,
            health: 0,
            silk: 0,
        }
    }
}

impl SlotData {
    /// Fresh playthrough with the fighter's starting resources
    pub fn new_game(combat: &CombatLoop) -> Self {
        Self {
            health: combat.config.max_health,
            position: combat.player.body.center(),
            ..Self::default()
        }
    }

    /// Snapshot the fighter
    pub fn capture(combat: &CombatLoop, level: u32, score: u64) -> Self {
        Self {
            level,
            score,
            position: combat.player.body.center(),
            health: combat.player.health,
            silk: combat.player.silk,
        }
    }

    /// Put the fighter back where the snapshot left it. Documents without a
    /// health field (older saves) leave the fighter at the spawn point.
    pub fn restore(&self, combat: &mut CombatLoop) {
        if self.health == 0 {
            return;
        }
        let p = &mut combat.player;
        p.body.pos = self.position - p.body.size / 2.0;
        p.health = self.health.min(combat.config.max_health);
        p.silk = self.silk.min(combat.config.max_silk);
        p.vel = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::CombatConfig;

    #[test]
    fn test_slot_range() {
        assert!(SlotId::new(0).is_err());
        assert_eq!(SlotId::new(3).unwrap().file_name(), "savegame_3.json");
        assert!(matches!(SlotId::new(4), Err(PersistenceError::InvalidSlot(4))));
        assert_eq!(SlotId::all().count(), 3);
    }

    #[test]
    fn test_capture_and_restore() {
        let mut combat = CombatLoop::new(CombatConfig::default());
        combat.player.silk = 4;
        combat.player.health = 2;
        combat.player.body.pos.x += 100.0;
        let snap = SlotData::capture(&combat, 2, 300);

        let mut fresh = CombatLoop::new(CombatConfig::default());
        snap.restore(&mut fresh);
        assert_eq!(fresh.player.silk, 4);
        assert_eq!(fresh.player.health, 2);
        assert_eq!(fresh.player.body.center(), combat.player.body.center());
    }

    #[test]
    fn test_unplayed_slot_keeps_spawn() {
        let mut combat = CombatLoop::new(CombatConfig::default());
        let spawn = combat.player.body.pos;
        SlotData::default().restore(&mut combat);
        assert_eq!(combat.player.body.pos, spawn);
        assert_eq!(combat.player.health, combat.config.max_health);
    }

    #[test]
    fn test_new_game_restores_to_spawn() {
        let mut combat = CombatLoop::new(CombatConfig::default());
        let spawn = combat.player.body.pos;
        let fresh = SlotData::new_game(&combat);
        assert_eq!(fresh.health, combat.config.max_health);
        assert_eq!(fresh.silk, 0);

        combat.player.body.pos.x += 200.0;
        combat.player.health = 1;
        fresh.restore(&mut combat);
        assert_eq!(combat.player.body.pos, spawn);
        assert_eq!(combat.player.health, combat.config.max_health);
    }

    #[test]
    fn test_legacy_slot_document() {
        let slot: SlotData =
            serde_json::from_str(r#"{"level": 1, "score": 0, "player_position": [0, 0], "inventory": []}"#)
                .unwrap();
        assert_eq!(slot.level, 1);
        assert_eq!(slot.position, Vec2::ZERO);
    }
}
