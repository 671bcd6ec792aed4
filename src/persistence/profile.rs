//! Cross-session profile: currency, upgrades, bests and preferences

use std::collections::BTreeSet;

use log::info;
use serde::{Deserialize, Serialize};

use crate::audio::AudioVolumes;
use crate::settings::Settings;
use crate::sim::{Difficulty, MissionSimulation, Perks};

/// Upgrade cost multiplier per previous purchase
const COST_GROWTH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerkKind {
    CooldownReduction,
    CameraDisableBonus,
    DetectionResistance,
}

impl PerkKind {
    pub const ALL: [PerkKind; 3] = [
        PerkKind::CooldownReduction,
        PerkKind::CameraDisableBonus,
        PerkKind::DetectionResistance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PerkKind::CooldownReduction => "Cooldown Reduction",
            PerkKind::CameraDisableBonus => "Camera Disable Bonus",
            PerkKind::DetectionResistance => "Detection Resistance",
        }
    }

    pub fn base_cost(self) -> u32 {
        match self {
            PerkKind::CooldownReduction => 5,
            PerkKind::CameraDisableBonus => 8,
            PerkKind::DetectionResistance => 12,
        }
    }

    /// Amount added to the matching `Perks` field per purchase
    pub fn increment(self) -> f32 {
        match self {
            PerkKind::CooldownReduction => 0.2,
            PerkKind::CameraDisableBonus => 3.0,
            PerkKind::DetectionResistance => 0.15,
        }
    }

    fn apply(self, perks: &mut Perks) {
        let field = match self {
            PerkKind::CooldownReduction => &mut perks.cooldown_reduction,
            PerkKind::CameraDisableBonus => &mut perks.camera_disable_bonus,
            PerkKind::DetectionResistance => &mut perks.detection_resistance,
        };
        *field += self.increment();
    }
}

/// Purchases made so far, per perk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseCounts {
    pub cooldown_reduction: u32,
    pub camera_disable_bonus: u32,
    pub detection_resistance: u32,
}

impl PurchaseCounts {
    pub fn get(&self, kind: PerkKind) -> u32 {
        match kind {
            PerkKind::CooldownReduction => self.cooldown_reduction,
            PerkKind::CameraDisableBonus => self.camera_disable_bonus,
            PerkKind::DetectionResistance => self.detection_resistance,
        }
    }

    fn increment(&mut self, kind: PerkKind) {
        let count = match kind {
            PerkKind::CooldownReduction => &mut self.cooldown_reduction,
            PerkKind::CameraDisableBonus => &mut self.camera_disable_bonus,
            PerkKind::DetectionResistance => &mut self.detection_resistance,
        };
        *count += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchase {
    Bought { cost: u32 },
    NotEnoughCredits { cost: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub currency: u32,
    pub perks: Perks,
    pub unlocked_perks: BTreeSet<PerkKind>,
    pub upgrade_purchase_count: PurchaseCounts,
    pub best_objectives: u32,
    pub best_time: f32,
    pub difficulty: Difficulty,
    pub audio_settings: AudioVolumes,
    pub game_settings: Settings,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            currency: 0,
            perks: Perks::default(),
            unlocked_perks: BTreeSet::new(),
            upgrade_purchase_count: PurchaseCounts::default(),
            best_objectives: 0,
            best_time: 0.0,
            difficulty: Difficulty::Normal,
            audio_settings: AudioVolumes::default(),
            game_settings: Settings::default(),
        }
    }
}

impl Profile {
    /// `base × 4^purchases`
    pub fn purchase_cost(&self, kind: PerkKind) -> u32 {
        let count = self.upgrade_purchase_count.get(kind);
        kind.base_cost()
            .saturating_mul(COST_GROWTH.saturating_pow(count))
    }

    pub fn purchase(&mut self, kind: PerkKind) -> Purchase {
        let cost = self.purchase_cost(kind);
        if self.currency < cost {
            return Purchase::NotEnoughCredits { cost };
        }
        self.currency -= cost;
        self.upgrade_purchase_count.increment(kind);
        kind.apply(&mut self.perks);
        self.unlocked_perks.insert(kind);
        info!("Purchased {} for {cost}", kind.label());
        Purchase::Bought { cost }
    }

    /// Forget currency, upgrades and bests. Preferences survive.
    pub fn reset_all_progress(&mut self) {
        self.currency = 0;
        self.perks = Perks::default();
        self.unlocked_perks.clear();
        self.upgrade_purchase_count = PurchaseCounts::default();
        self.best_objectives = 0;
        self.best_time = 0.0;
        info!("All progress reset");
    }

    /// Seed a mission with the persisted wallet, upgrades and bests
    pub fn apply_to(&self, sim: &mut MissionSimulation) {
        sim.currency = self.currency;
        sim.perks = self.perks;
        sim.best_objectives = self.best_objectives;
        sim.best_time = self.best_time;
    }

    /// Pull the results of a finished mission back in
    pub fn absorb(&mut self, sim: &MissionSimulation) {
        self.currency = sim.currency;
        self.best_objectives = self.best_objectives.max(sim.best_objectives);
        self.best_time = self.best_time.max(sim.best_time);
        self.difficulty = sim.difficulty;
    }
}
