//! Stealth mission state machine
//!
//! `Menu -> Playing -> {Success | Failure}`. While playing, detection creeps up
//! over time, guards in the danger zone may spot the player, and a security
//! event fires every few seconds. The player spends cooldown-gated actions to
//! push detection back down and hacks to gain objective progress.
//!
//! Terminal evaluation runs at the end of `update`, objective check first.

use glam::Vec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::animation::AnimationPlayer;
use super::collision::Aabb;
use super::guard::Guard;
use super::particles::ParticleSystem;
use super::rng::RandomSource;
use crate::consts::{DEFAULT_PARTICLE_CAP, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::{Rgb, cubic_ease_out};

/// Guard monitor strips: first strip origin, size and vertical stride
const MONITOR_ORIGIN: Vec2 = Vec2::new(100.0, 150.0);
const MONITOR_SIZE: Vec2 = Vec2::new(800.0, 40.0);
const MONITOR_STRIDE: f32 = 60.0;

/// Action button bar layout
const ACTION_BAR_ORIGIN: Vec2 = Vec2::new(100.0, 500.0);
const ACTION_BUTTON_SIZE: Vec2 = Vec2::new(140.0, 50.0);
const ACTION_SPACING: f32 = 160.0;

const END_REVEAL_SECONDS: f32 = 1.5;
const CREDIT_FLASH_SECONDS: f32 = 2.0;
const CAMERA_BLINK_ON_DISABLE: f32 = 0.5;
const CAMERA_BLINK_ON_RESTORE: f32 = 0.3;

const SPOT_SPARK_COLOR: Rgb = Rgb(255, 180, 80);
const EVENT_SPARK_COLOR: Rgb = Rgb(255, 200, 140);
/// Instant jolts at or above this shake the screen
const EVENT_SHAKE_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn guards(self) -> usize {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Normal => 3,
            Difficulty::Hard => 5,
        }
    }

    /// Multiplier on passive accrual and guard-spot increments
    pub fn detection_rate(self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    /// Spread applied to guard patrol periods
    pub fn patrol_randomness(self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    /// Cycle Easy -> Normal -> Hard -> Easy
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Normal,
            Difficulty::Normal => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Tunables for one mission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub mission_time: f32,
    pub objectives_needed: u32,
    pub max_detection: f32,
    /// Objective progress per successful hack
    pub hack_progress_gain: u32,
    /// Detection added by a failed hack (30% of it on success)
    pub hack_detection: f32,
    /// Detection per second before countermeasures
    pub passive_rate: f32,
    pub guard_spot_chance: f32,
    pub guard_spot_increment: f32,
    /// Guards strictly inside (start, end) can spot the player
    pub danger_zone: (f32, f32),
    pub event_interval: f32,
    pub objective_spawn_chance: f32,
    pub objective_click_radius: f32,
    pub particle_capacity: usize,
    pub screen: Vec2,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            mission_time: 60.0,
            objectives_needed: 5,
            max_detection: 100.0,
            hack_progress_gain: 2,
            hack_detection: 15.0,
            passive_rate: 2.0,
            guard_spot_chance: 0.02,
            guard_spot_increment: 5.0,
            danger_zone: (0.4, 0.6),
            event_interval: 5.0,
            objective_spawn_chance: 0.02,
            objective_click_radius: 20.0,
            particle_capacity: DEFAULT_PARTICLE_CAP,
            screen: Vec2::new(SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32),
        }
    }
}

/// Purchased upgrades applied to a mission
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Perks {
    /// Seconds shaved off every action cooldown
    pub cooldown_reduction: f32,
    /// Extra seconds cameras stay down
    pub camera_disable_bonus: f32,
    /// Fraction removed from passive accrual and guard spots
    pub detection_resistance: f32,
}

impl Perks {
    fn resistance_factor(&self) -> f32 {
        (1.0 - self.detection_resistance).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionAction {
    DisableCameras,
    CutLights,
    Distract,
    Hack,
}

impl MissionAction {
    pub const ALL: [MissionAction; 4] = [
        MissionAction::DisableCameras,
        MissionAction::CutLights,
        MissionAction::Distract,
        MissionAction::Hack,
    ];

    pub fn index(self) -> usize {
        match self {
            MissionAction::DisableCameras => 0,
            MissionAction::CutLights => 1,
            MissionAction::Distract => 2,
            MissionAction::Hack => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MissionAction::DisableCameras => "Disable Cams",
            MissionAction::CutLights => "Cut Lights",
            MissionAction::Distract => "Distraction",
            MissionAction::Hack => "Hack System",
        }
    }

    /// Position of this action's button in the action bar
    pub fn button_rect(self) -> Aabb {
        let x = ACTION_BAR_ORIGIN.x + ACTION_SPACING * self.index() as f32;
        Aabb::new(x, ACTION_BAR_ORIGIN.y, ACTION_BUTTON_SIZE.x, ACTION_BUTTON_SIZE.y)
    }
}

/// Remaining cooldown per action
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cooldowns([f32; 4]);

impl Cooldowns {
    pub fn remaining(&self, action: MissionAction) -> f32 {
        self.0[action.index()]
    }

    pub fn is_ready(&self, action: MissionAction) -> bool {
        self.remaining(action) <= 0.0
    }

    pub fn set(&mut self, action: MissionAction, seconds: f32) {
        self.0[action.index()] = seconds;
    }

    pub fn tick(&mut self, dt: f32) {
        for c in &mut self.0 {
            *c = (*c - dt).max(0.0);
        }
    }

    pub fn clear(&mut self) {
        self.0 = [0.0; 4];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    SecuritySweep,
    ShiftChange,
    SystemScan,
}

impl SecurityEventKind {
    pub const ALL: [SecurityEventKind; 3] = [
        SecurityEventKind::SecuritySweep,
        SecurityEventKind::ShiftChange,
        SecurityEventKind::SystemScan,
    ];

    pub fn text(self) -> &'static str {
        match self {
            SecurityEventKind::SecuritySweep => "Security sweep initiated",
            SecurityEventKind::ShiftChange => "Guard shift change",
            SecurityEventKind::SystemScan => "System scan detected",
        }
    }

    pub fn duration(self) -> f32 {
        match self {
            SecurityEventKind::SecuritySweep => 6.0,
            SecurityEventKind::ShiftChange => 8.0,
            SecurityEventKind::SystemScan => 5.0,
        }
    }

    /// Inclusive range of the one-time detection jolt
    pub fn instant_range(self) -> Option<(i32, i32)> {
        match self {
            SecurityEventKind::SecuritySweep => Some((5, 12)),
            SecurityEventKind::ShiftChange => None,
            SecurityEventKind::SystemScan => Some((8, 16)),
        }
    }

    /// Detection per second while active
    pub fn dps(self) -> f32 {
        match self {
            SecurityEventKind::SecuritySweep => 1.0,
            SecurityEventKind::ShiftChange => 0.5,
            SecurityEventKind::SystemScan => 1.5,
        }
    }
}

/// Active security event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecurityEvent {
    pub kind: SecurityEventKind,
    pub instant: i32,
    pub time_left: f32,
}

/// Optional bonus pickup on the terminal screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryObjective {
    pub id: u32,
    pub pos: Vec2,
    pub reward: u32,
    pub time_left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionPhase {
    #[default]
    Menu,
    Playing,
    Success,
    Failure,
}

impl MissionPhase {
    pub fn is_over(self) -> bool {
        matches!(self, MissionPhase::Success | MissionPhase::Failure)
    }
}

/// What happened when the player triggered an action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionResult {
    /// Countermeasure applied with the given (negative) detection delta
    Applied { detection_delta: f32 },
    HackSucceeded { chance: f32 },
    HackFailed { chance: f32 },
    OnCooldown { remaining: f32 },
    /// Not playing, or paused
    Unavailable,
}

/// Things the scene layer reacts to (sound cues, toasts, saves)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissionEvent {
    Started,
    ActionUsed { action: MissionAction },
    HackResolved { success: bool, chance: f32 },
    GuardSpotted { guard_id: u32 },
    SecurityEventStarted { kind: SecurityEventKind, instant: i32 },
    SecurityEventEnded { kind: SecurityEventKind },
    CamerasRestored,
    ObjectiveSpawned { id: u32 },
    ObjectiveExpired { id: u32 },
    ObjectiveCollected { id: u32, reward: u32 },
    Ended { success: bool, credits_banked: u32 },
}

/// Smoothed values shown on the HUD bars
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HudValues {
    pub time: f32,
    pub detection: f32,
    pub objectives: f32,
}

/// Count-up animation on the end screen
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EndReveal {
    pub timer: f32,
    pub objectives: u32,
    pub detection: u32,
    pub time: u32,
}

impl EndReveal {
    pub fn is_done(&self) -> bool {
        self.timer >= END_REVEAL_SECONDS
    }
}

pub struct MissionSimulation {
    pub config: MissionConfig,
    pub difficulty: Difficulty,
    pub perks: Perks,
    pub phase: MissionPhase,
    pub paused: bool,

    pub time_remaining: f32,
    pub detection: f32,
    pub objective_progress: u32,
    pub guards: Vec<Guard>,
    pub secondary_objectives: Vec<SecondaryObjective>,
    pub current_event: Option<SecurityEvent>,
    pub cooldowns: Cooldowns,

    pub cameras_disabled: bool,
    pub camera_disable_time: f32,
    pub lights_disabled: bool,
    pub lights_disable_time: f32,
    /// Remaining camera indicator blink
    pub camera_blink: f32,

    /// Committed credits
    pub currency: u32,
    /// Credits collected this mission, banked only on success
    pub pending_credits: u32,
    pub credit_flash: f32,
    pub credit_flash_amount: u32,
    pub best_objectives: u32,
    pub best_time: f32,

    pub hud: HudValues,
    pub reveal: EndReveal,

    particles: ParticleSystem,
    guard_animation: Option<AnimationPlayer>,
    event_timer: f32,
    next_objective_id: u32,
    events: Vec<MissionEvent>,
}

impl MissionSimulation {
    pub fn new(
        config: MissionConfig,
        difficulty: Difficulty,
        perks: Perks,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let particles = ParticleSystem::new(config.particle_capacity);
        let mut sim = Self {
            time_remaining: config.mission_time,
            hud: HudValues {
                time: config.mission_time,
                ..HudValues::default()
            },
            config,
            difficulty,
            perks,
            phase: MissionPhase::Menu,
            paused: false,
            detection: 0.0,
            objective_progress: 0,
            guards: Vec::new(),
            secondary_objectives: Vec::new(),
            current_event: None,
            cooldowns: Cooldowns::default(),
            cameras_disabled: false,
            camera_disable_time: 0.0,
            lights_disabled: false,
            lights_disable_time: 0.0,
            camera_blink: 0.0,
            currency: 0,
            pending_credits: 0,
            credit_flash: 0.0,
            credit_flash_amount: 0,
            best_objectives: 0,
            best_time: 0.0,
            reveal: EndReveal::default(),
            particles,
            guard_animation: None,
            event_timer: 0.0,
            next_objective_id: 0,
            events: Vec::new(),
        };
        sim.build_guards(rng);
        sim
    }

    /// Clip set cloned into every guard when guards are (re)built
    pub fn set_guard_animation(&mut self, player: Option<AnimationPlayer>) {
        for guard in &mut self.guards {
            guard.set_animation(player.clone());
        }
        self.guard_animation = player;
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<MissionEvent> {
        std::mem::take(&mut self.events)
    }

    fn build_guards(&mut self, rng: &mut dyn RandomSource) {
        let randomness = self.difficulty.patrol_randomness();
        self.guards = (0..self.difficulty.guards())
            .map(|i| {
                let period = (8.0 + rng.range(-2.0, 2.0) * randomness).trunc();
                let route = Aabb {
                    pos: MONITOR_ORIGIN + Vec2::new(0.0, MONITOR_STRIDE * i as f32),
                    size: MONITOR_SIZE,
                };
                let mut guard = Guard::new(i as u32 + 1, period, route);
                guard.set_animation(self.guard_animation.clone());
                guard.reset(rng);
                guard
            })
            .collect();
    }

    /// Change difficulty. Only honoured from the menu.
    pub fn set_difficulty(&mut self, difficulty: Difficulty, rng: &mut dyn RandomSource) -> bool {
        if self.phase != MissionPhase::Menu {
            return false;
        }
        self.difficulty = difficulty;
        self.build_guards(rng);
        true
    }

    /// Put everything back to the pre-mission state and go to the menu
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.phase = MissionPhase::Menu;
        self.paused = false;
        self.time_remaining = self.config.mission_time;
        self.detection = 0.0;
        self.objective_progress = 0;
        self.pending_credits = 0;
        self.credit_flash = 0.0;
        self.credit_flash_amount = 0;
        self.cameras_disabled = false;
        self.camera_disable_time = 0.0;
        self.camera_blink = 0.0;
        self.lights_disabled = false;
        self.lights_disable_time = 0.0;
        self.event_timer = 0.0;
        self.current_event = None;
        self.cooldowns.clear();
        self.secondary_objectives.clear();
        self.hud = HudValues {
            time: self.config.mission_time,
            ..HudValues::default()
        };
        self.reveal = EndReveal::default();
        self.particles.clear();
        self.build_guards(rng);
    }

    /// Reset and begin playing
    pub fn start(&mut self, rng: &mut dyn RandomSource) {
        self.reset(rng);
        self.phase = MissionPhase::Playing;
        self.events.push(MissionEvent::Started);
        info!(
            "Mission started: difficulty={}, guards={}",
            self.difficulty.name(),
            self.guards.len()
        );
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.phase == MissionPhase::Playing {
            self.paused = paused;
        }
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    fn is_live(&self) -> bool {
        self.phase == MissionPhase::Playing && !self.paused
    }

    /// `max(0.4, 0.85 - detection / 120)`
    pub fn hack_success_chance(&self) -> f32 {
        (0.85 - self.detection / 120.0).max(0.4)
    }

    fn clamp_detection(&mut self) {
        self.detection = self.detection.clamp(0.0, self.config.max_detection);
    }

    fn cooldown_after(&self, base: f32, floor: f32) -> f32 {
        (base - self.perks.cooldown_reduction).max(floor)
    }

    /// Trigger a player action if it is off cooldown
    pub fn perform(&mut self, action: MissionAction, rng: &mut dyn RandomSource) -> ActionResult {
        if !self.is_live() {
            return ActionResult::Unavailable;
        }
        if !self.cooldowns.is_ready(action) {
            return ActionResult::OnCooldown {
                remaining: self.cooldowns.remaining(action),
            };
        }

        let anchor = action.button_rect().center();
        self.events.push(MissionEvent::ActionUsed { action });
        let result = match action {
            MissionAction::DisableCameras => {
                self.cameras_disabled = true;
                self.camera_disable_time = 8.0 + self.perks.camera_disable_bonus;
                self.camera_blink = CAMERA_BLINK_ON_DISABLE;
                let cooldown = self.cooldown_after(7.0, 1.0);
                self.cooldowns.set(action, cooldown);
                self.apply_countermeasure(-15.0, anchor, 12, rng)
            }
            MissionAction::CutLights => {
                self.lights_disabled = true;
                self.lights_disable_time = 6.0;
                let cooldown = self.cooldown_after(6.0, 1.0);
                self.cooldowns.set(action, cooldown);
                self.apply_countermeasure(-10.0, anchor, 8, rng)
            }
            MissionAction::Distract => {
                for guard in &mut self.guards {
                    guard.clear_alert();
                }
                let cooldown = self.cooldown_after(10.0, 1.0);
                self.cooldowns.set(action, cooldown);
                self.apply_countermeasure(-20.0, anchor, 14, rng)
            }
            MissionAction::Hack => self.hack(rng),
        };
        debug!(
            "{:?}: {:?}, cooldown {:.2}s",
            action,
            result,
            self.cooldowns.remaining(action)
        );
        result
    }

    fn apply_countermeasure(
        &mut self,
        delta: f32,
        anchor: Vec2,
        smoke: usize,
        rng: &mut dyn RandomSource,
    ) -> ActionResult {
        self.detection = (self.detection + delta).max(0.0);
        self.clamp_detection();
        self.particles.spawn_smoke(anchor, smoke, rng);
        self.particles.add_floating_text(delta as i32, anchor, rng);
        ActionResult::Applied {
            detection_delta: delta,
        }
    }

    fn hack(&mut self, rng: &mut dyn RandomSource) -> ActionResult {
        let chance = self.hack_success_chance();
        let success = rng.next_unit() <= chance;
        if success {
            self.objective_progress += self.config.hack_progress_gain;
            self.detection += self.config.hack_detection * 0.3;
            let cooldown = self.cooldown_after(3.0, 1.0);
            self.cooldowns.set(MissionAction::Hack, cooldown);
        } else {
            self.detection += self.config.hack_detection;
            // Failure keeps a longer floor than success
            let cooldown = self.cooldown_after(5.0, 2.0);
            self.cooldowns.set(MissionAction::Hack, cooldown);
        }
        self.clamp_detection();
        self.events.push(MissionEvent::HackResolved { success, chance });
        if success {
            ActionResult::HackSucceeded { chance }
        } else {
            ActionResult::HackFailed { chance }
        }
    }

    /// Collect a secondary objective within the click radius of `point`
    pub fn collect_at(&mut self, point: Vec2) -> Option<u32> {
        if !self.is_live() {
            return None;
        }
        let radius = self.config.objective_click_radius;
        let idx = self
            .secondary_objectives
            .iter()
            .position(|o| o.pos.distance(point) <= radius)?;
        let obj = self.secondary_objectives.remove(idx);
        self.pending_credits += obj.reward;
        self.credit_flash = CREDIT_FLASH_SECONDS;
        self.credit_flash_amount = obj.reward;
        self.events.push(MissionEvent::ObjectiveCollected {
            id: obj.id,
            reward: obj.reward,
        });
        debug!("Collected objective {} (+{} pending)", obj.id, obj.reward);
        Some(obj.reward)
    }

    pub fn update(&mut self, dt: f32, rng: &mut dyn RandomSource) {
        if self.phase.is_over() {
            self.update_reveal(dt);
            self.particles.update(dt, rng);
            return;
        }
        if !self.is_live() {
            return;
        }

        self.time_remaining -= dt;
        self.update_secondary_objectives(dt, rng);

        if self.credit_flash > 0.0 {
            self.credit_flash -= dt;
            if self.credit_flash <= 0.0 {
                self.credit_flash_amount = 0;
            }
        }

        let k = (dt * 4.0).min(1.0);
        self.hud.time += (self.time_remaining - self.hud.time) * k;
        self.hud.detection += (self.detection - self.hud.detection) * k;
        self.hud.objectives += (self.objective_progress as f32 - self.hud.objectives) * k;

        if self.camera_blink > 0.0 {
            self.camera_blink = (self.camera_blink - dt).max(0.0);
        }
        self.cooldowns.tick(dt);

        if self.camera_disable_time > 0.0 {
            self.camera_disable_time -= dt;
            if self.camera_disable_time <= 0.0 {
                self.camera_disable_time = 0.0;
                self.cameras_disabled = false;
                self.camera_blink = CAMERA_BLINK_ON_RESTORE;
                self.events.push(MissionEvent::CamerasRestored);
            }
        }
        if self.lights_disable_time > 0.0 {
            self.lights_disable_time -= dt;
            if self.lights_disable_time <= 0.0 {
                self.lights_disable_time = 0.0;
                self.lights_disabled = false;
            }
        }

        for guard in &mut self.guards {
            guard.update(dt);
        }

        let scale = self.difficulty.detection_rate() * self.perks.resistance_factor();
        let mut passive = self.config.passive_rate * dt * scale;
        if self.cameras_disabled {
            passive *= 0.3;
        }
        if self.lights_disabled {
            passive *= 0.5;
        }
        self.detection += passive;

        self.roll_guard_spots(scale, rng);

        self.event_timer += dt;
        if self.event_timer >= self.config.event_interval {
            self.event_timer = 0.0;
            self.trigger_security_event(rng);
        }
        if let Some(event) = self.current_event.as_mut() {
            self.detection += event.kind.dps() * dt;
            event.time_left -= dt;
            if event.time_left <= 0.0 {
                let kind = event.kind;
                self.current_event = None;
                self.events.push(MissionEvent::SecurityEventEnded { kind });
            }
        }

        self.particles.update(dt, rng);

        self.clamp_detection();
        self.evaluate_end();
    }

    fn roll_guard_spots(&mut self, scale: f32, rng: &mut dyn RandomSource) {
        let (start, end) = self.config.danger_zone;
        let lights = if self.lights_disabled { 1.0 } else { 2.0 };
        let cameras = if self.cameras_disabled { 1.0 } else { 1.5 };
        let chance = self.config.guard_spot_chance * lights * cameras;
        let increment = self.config.guard_spot_increment * scale;

        for guard in &mut self.guards {
            if !(guard.position > start && guard.position < end) {
                continue;
            }
            if !rng.chance(chance) {
                continue;
            }
            guard.set_alert();
            self.detection += increment;
            let at = guard.world_position();
            self.particles.spawn_sparks(at, 6, SPOT_SPARK_COLOR, rng);
            self.particles.add_floating_text(increment.round() as i32, at, rng);
            self.events.push(MissionEvent::GuardSpotted { guard_id: guard.id });
            debug!("Guard {} spotted the player (+{increment})", guard.id);
        }
    }

    fn trigger_security_event(&mut self, rng: &mut dyn RandomSource) {
        let kind = SecurityEventKind::ALL[rng.index(SecurityEventKind::ALL.len())];
        let instant = kind
            .instant_range()
            .map(|(lo, hi)| rng.range_int(lo, hi))
            .unwrap_or(0);
        if instant > 0 {
            let at = Vec2::new(self.config.screen.x / 2.0, 200.0);
            self.particles.spawn_sparks(at, 18, EVENT_SPARK_COLOR, rng);
            self.particles.add_floating_text(instant, at, rng);
        }
        self.detection += instant as f32;
        if instant >= EVENT_SHAKE_THRESHOLD {
            self.particles.start_shake(9.0, 0.5);
        }
        self.current_event = Some(SecurityEvent {
            kind,
            instant,
            time_left: kind.duration(),
        });
        self.events
            .push(MissionEvent::SecurityEventStarted { kind, instant });
        debug!("Security event: {} (+{instant})", kind.text());
    }

    fn update_secondary_objectives(&mut self, dt: f32, rng: &mut dyn RandomSource) {
        if rng.chance(self.config.objective_spawn_chance) {
            self.next_objective_id += 1;
            let w = self.config.screen.x as i32;
            let obj = SecondaryObjective {
                id: self.next_objective_id,
                pos: Vec2::new(
                    rng.range_int(200, (w - 200).max(200)) as f32,
                    rng.range_int(200, 350) as f32,
                ),
                reward: rng.range_int(1, 3) as u32,
                time_left: rng.range(15.0, 30.0),
            };
            debug!("Secondary objective {} spawned at {}", obj.id, obj.pos);
            self.events.push(MissionEvent::ObjectiveSpawned { id: obj.id });
            self.secondary_objectives.push(obj);
        }

        let events = &mut self.events;
        self.secondary_objectives.retain_mut(|o| {
            o.time_left -= dt;
            if o.time_left <= 0.0 {
                events.push(MissionEvent::ObjectiveExpired { id: o.id });
                false
            } else {
                true
            }
        });
    }

    fn evaluate_end(&mut self) {
        if self.objective_progress >= self.config.objectives_needed {
            self.best_objectives = self.best_objectives.max(self.objective_progress);
            self.best_time = self.best_time.max(self.time_remaining);
            let banked = self.pending_credits;
            self.currency += banked;
            self.pending_credits = 0;
            self.finish(MissionPhase::Success, banked);
        } else if self.detection >= self.config.max_detection || self.time_remaining <= 0.0 {
            self.pending_credits = 0;
            self.finish(MissionPhase::Failure, 0);
        }
    }

    fn finish(&mut self, phase: MissionPhase, credits_banked: u32) {
        self.phase = phase;
        self.paused = false;
        self.reveal = EndReveal::default();
        self.particles.clear();
        let success = phase == MissionPhase::Success;
        self.events.push(MissionEvent::Ended {
            success,
            credits_banked,
        });
        info!(
            "Mission {}: objectives {}/{}, detection {:.1}, time left {:.1}s, banked {}",
            if success { "succeeded" } else { "failed" },
            self.objective_progress,
            self.config.objectives_needed,
            self.detection,
            self.time_remaining,
            credits_banked
        );
    }

    fn update_reveal(&mut self, dt: f32) {
        self.reveal.timer += dt;
        let eased = cubic_ease_out(self.reveal.timer / END_REVEAL_SECONDS);
        self.reveal.objectives = (self.objective_progress as f32 * eased) as u32;
        self.reveal.detection = (self.detection * eased) as u32;
        self.reveal.time = (self.time_remaining.max(0.0) * eased) as u32;
    }
}
