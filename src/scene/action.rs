//! Side-on arena: the fighter against one respawning enemy

use glam::Vec2;
use log::{debug, info};

use super::toast::Toasts;
use super::{Scene, SceneCommand, SceneContext, SceneId};
use crate::Rgb;
use crate::audio::Cue;
use crate::persistence::SlotData;
use crate::platform::{Action, InputState};
use crate::renderer::{Canvas, SpriteBank, draw_combat};
use crate::settings::Settings;
use crate::sim::{
    CombatConfig, CombatEvent, CombatInput, CombatLoop, CombatOutcome, ParticleSystem,
    RandomSource,
};
use crate::transition::{TransitionKind, WipeDirection};

pub const DEFAULT_SLOT: u8 = 1;
const RESPAWN_SECONDS: f32 = 2.0;
const SCORE_PER_KILL: u64 = 100;
const HURT_SHAKE: (f32, f32) = (6.0, 0.25);

pub struct ActionScene {
    combat: CombatLoop,
    input: CombatInput,
    shake_enabled: bool,
    slot: u8,
    respawn_timer: f32,
    level: u32,
    score: u64,
    toasts: Toasts,
}

impl ActionScene {
    pub fn new(settings: &Settings, ember_sprite: Option<String>) -> Self {
        let config = CombatConfig {
            particle_capacity: settings.max_particles(),
            ..CombatConfig::default()
        };
        let mut combat = CombatLoop::new(config);
        let mut particles =
            ParticleSystem::new(settings.max_particles()).with_embers(combat.config.world, ember_sprite);
        particles.set_embers_enabled(settings.embers && settings.quality.embers_enabled());
        *combat.particles_mut() = particles;

        Self {
            combat,
            input: CombatInput::default(),
            shake_enabled: settings.effective_screen_shake(),
            slot: DEFAULT_SLOT,
            respawn_timer: 0.0,
            level: 1,
            score: 0,
            toasts: Toasts::default(),
        }
    }

    pub fn combat(&self) -> &CombatLoop {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut CombatLoop {
        &mut self.combat
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn set_slot(&mut self, slot: u8) {
        self.slot = slot;
    }

    pub fn snapshot(&self) -> SlotData {
        SlotData::capture(&self.combat, self.level, self.score)
    }

    fn restart(&mut self) {
        self.combat.reset();
        self.respawn_timer = 0.0;
        self.level = 1;
        self.score = 0;
        info!("Arena restarted");
    }

    fn on_event(&mut self, event: CombatEvent, ctx: &mut SceneContext) {
        match event {
            CombatEvent::Jumped => ctx.audio.play(Cue::HornetJump),
            CombatEvent::Attacked => ctx.audio.play(Cue::HornetAttack),
            CombatEvent::Dashed => ctx.audio.play(Cue::HornetDash),
            CombatEvent::Special => ctx.audio.play(Cue::HornetSpecial),
            CombatEvent::HealStarted { .. } => ctx.audio.play(Cue::HornetHeal),
            CombatEvent::HealCompleted { health } => {
                self.toasts.push(format!("Healed to {health}"), Rgb::GREEN, 1.5);
            }
            CombatEvent::EnemyDefeated => {
                self.score += SCORE_PER_KILL;
                self.level += 1;
                self.respawn_timer = RESPAWN_SECONDS;
                debug!("Enemy down, score {}", self.score);
            }
            CombatEvent::PlayerHurt { .. } => {
                self.combat.particles_mut().start_shake(HURT_SHAKE.0, HURT_SHAKE.1);
            }
            CombatEvent::PlayerDefeated => {
                self.toasts.push("Defeated", Rgb::RED, 3.0);
                info!("Fighter defeated with score {}", self.score);
            }
            CombatEvent::HealCancelled | CombatEvent::EnemyHit { .. } => {}
        }
    }
}

impl Scene for ActionScene {
    fn id(&self) -> SceneId {
        SceneId::Action
    }

    fn enter(&mut self, ctx: &mut SceneContext) {
        match ctx.store.load_slot(self.slot) {
            Some(data) => {
                data.restore(&mut self.combat);
                self.level = data.level;
                self.score = data.score;
                info!("Resumed slot {} at level {}", self.slot, data.level);
            }
            None => {
                ctx.store.create_slot(self.slot, &self.combat);
            }
        }
        self.input = CombatInput::default();
    }

    fn exit(&mut self, ctx: &mut SceneContext) {
        ctx.store.save_slot(self.slot, &self.snapshot());
    }

    fn handle_input(&mut self, input: &InputState, _ctx: &mut SceneContext) -> SceneCommand {
        if input.just_pressed(Action::Back) {
            return SceneCommand::SwitchTo {
                target: SceneId::Stealth,
                kind: TransitionKind::Wipe {
                    direction: WipeDirection::Right,
                    color: Rgb::BLACK,
                },
            };
        }
        if self.combat.outcome == CombatOutcome::Defeat && input.just_pressed(Action::Confirm) {
            self.restart();
        }
        self.input = input.combat_input();
        SceneCommand::Stay
    }

    fn update(&mut self, dt: f32, ctx: &mut SceneContext) {
        self.combat.update(dt, &self.input, ctx.rng);
        for event in self.combat.drain_events() {
            self.on_event(event, ctx);
        }

        if self.respawn_timer > 0.0 {
            self.respawn_timer -= dt;
            if self.respawn_timer <= 0.0 {
                self.respawn_timer = 0.0;
                self.combat.respawn_enemy();
            }
        }
        self.toasts.update(dt);
    }

    fn draw(&self, canvas: &mut Canvas, sprites: &SpriteBank, rng: &mut dyn RandomSource) {
        let shake = if self.shake_enabled {
            self.combat.particles().shake_offset(rng)
        } else {
            Vec2::ZERO
        };
        draw_combat(canvas, &self.combat, sprites, shake);
        self.toasts.draw(canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioManager, SilentOutput};
    use crate::persistence::{Profile, ProgressStore};
    use crate::records::MissionRecords;
    use crate::sim::SeededRandom;

    struct Harness {
        audio: AudioManager,
        store: ProgressStore,
        profile: Profile,
        records: MissionRecords,
        settings: Settings,
        rng: SeededRandom,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            Self {
                audio: AudioManager::new(None, Box::new(SilentOutput::default())),
                store: ProgressStore::new(dir.path()),
                profile: Profile::default(),
                records: MissionRecords::new(),
                settings: Settings::default(),
                rng: SeededRandom::new(3),
                _dir: dir,
            }
        }

        fn ctx(&mut self) -> SceneContext<'_> {
            SceneContext {
                audio: &mut self.audio,
                store: &self.store,
                profile: &mut self.profile,
                records: &mut self.records,
                settings: &self.settings,
                rng: &mut self.rng,
            }
        }
    }

    #[test]
    fn test_back_wipes_to_stealth() {
        let mut h = Harness::new();
        let mut s = ActionScene::new(&h.settings, None);
        let mut input = InputState::new();
        input.press(Action::Back);
        let cmd = s.handle_input(&input, &mut h.ctx());
        assert!(matches!(
            cmd,
            SceneCommand::SwitchTo {
                target: SceneId::Stealth,
                kind: TransitionKind::Wipe { .. }
            }
        ));
    }

    #[test]
    fn test_kill_scores_and_respawns_after_delay() {
        let mut h = Harness::new();
        let mut s = ActionScene::new(&h.settings, None);
        s.combat_mut().enemy.health = 0;
        s.on_event(CombatEvent::EnemyDefeated, &mut h.ctx());
        s.combat_mut().outcome = CombatOutcome::Victory;
        assert_eq!(s.score(), 100);
        assert_eq!(s.level(), 2);

        for _ in 0..60 {
            s.update(1.0 / 60.0, &mut h.ctx());
        }
        assert_eq!(s.combat().outcome, CombatOutcome::Victory);
        for _ in 0..61 {
            s.update(1.0 / 60.0, &mut h.ctx());
        }
        assert_eq!(s.combat().outcome, CombatOutcome::Ongoing);
        assert!(s.combat().enemy.is_alive());
    }

    #[test]
    fn test_slot_saved_on_exit_and_restored_on_enter() {
        let mut h = Harness::new();
        let mut s = ActionScene::new(&h.settings, None);
        s.enter(&mut h.ctx());
        assert!(h.store.slot_exists(DEFAULT_SLOT));

        s.combat_mut().player.silk = 4;
        s.score = 300;
        s.exit(&mut h.ctx());

        let mut fresh = ActionScene::new(&h.settings, None);
        fresh.enter(&mut h.ctx());
        assert_eq!(fresh.score(), 300);
        assert_eq!(fresh.combat().player.silk, 4);
    }

    #[test]
    fn test_confirm_restarts_after_defeat() {
        let mut h = Harness::new();
        let mut s = ActionScene::new(&h.settings, None);
        s.score = 200;
        s.combat_mut().outcome = CombatOutcome::Defeat;
        let mut input = InputState::new();
        input.press(Action::Confirm);
        s.handle_input(&input, &mut h.ctx());
        assert_eq!(s.combat().outcome, CombatOutcome::Ongoing);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_jump_input_reaches_fighter() {
        let mut h = Harness::new();
        let mut s = ActionScene::new(&h.settings, None);
        for _ in 0..5 {
            s.update(1.0 / 60.0, &mut h.ctx());
        }
        let mut input = InputState::new();
        input.press(Action::Jump);
        s.handle_input(&input, &mut h.ctx());
        s.update(1.0 / 60.0, &mut h.ctx());
        assert!(s.combat().player.vel.y < 0.0);
        assert!(!s.combat().player.on_ground);
    }
}
