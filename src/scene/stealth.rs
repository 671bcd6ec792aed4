//! Infiltration terminal: menu with the upgrade shop, live mission, end screen

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use log::{debug, info};

use super::toast::Toasts;
use super::{Scene, SceneCommand, SceneContext, SceneId};
use crate::Rgb;
use crate::audio::{Cue, MENU_THEME};
use crate::persistence::{PerkKind, Profile, Purchase};
use crate::platform::{Action, InputState};
use crate::records::{RecordEntry, unix_now};
use crate::renderer::draw::draw_meter;
use crate::renderer::{Canvas, SpriteBank, draw_mission};
use crate::settings::Settings;
use crate::sim::{
    Aabb, ActionResult, AnimationPlayer, MissionAction, MissionConfig, MissionEvent, MissionPhase,
    MissionSimulation, RandomSource,
};
use crate::transition::{SlideDirection, TransitionKind};
use crate::ui::{Button, Slider};

const MENU_FADE_IN_MS: u32 = 1000;
const TOAST_SECONDS: f32 = 2.5;
const ACTION_COLORS: [(Rgb, Rgb); 4] = [
    (Rgb(0, 0, 100), Rgb(0, 0, 200)),
    (Rgb(100, 100, 0), Rgb(200, 200, 0)),
    (Rgb(100, 0, 100), Rgb(200, 0, 200)),
    (Rgb(0, 100, 0), Rgb(0, 200, 0)),
];
const HOTKEYS: [&str; 4] = ["1", "2", "3", "H"];
const INFO_COLOR: Rgb = Rgb(0, 200, 255);
const WARN_COLOR: Rgb = Rgb(255, 120, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Master,
    Music,
    Sfx,
}

/// Mixer slider; the callback parks the new level until the scene can reach the audio service
struct VolumeControl {
    channel: Channel,
    slider: Slider,
    pending: Rc<Cell<Option<f32>>>,
}

impl VolumeControl {
    fn new(channel: Channel, index: usize, value: f32) -> Self {
        let label = match channel {
            Channel::Master => "Master",
            Channel::Music => "Music",
            Channel::Sfx => "SFX",
        };
        let pending = Rc::new(Cell::new(None));
        let sink = Rc::clone(&pending);
        let rect = Aabb::new(60.0, 560.0 + index as f32 * 40.0, 200.0, 10.0);
        let slider = Slider::new(rect, 0.0, 1.0, value, label).on_change(move |v| sink.set(Some(v)));
        Self {
            channel,
            slider,
            pending,
        }
    }

    fn apply(&self, ctx: &mut SceneContext) -> bool {
        let Some(level) = self.pending.take() else {
            return false;
        };
        match self.channel {
            Channel::Master => ctx.audio.set_master_volume(level),
            Channel::Music => ctx.audio.set_music_volume(level),
            Channel::Sfx => ctx.audio.set_sfx_volume(level),
        }
        true
    }
}

pub struct StealthScene {
    sim: MissionSimulation,
    start_button: Button,
    action_buttons: Vec<(MissionAction, Button)>,
    shop_buttons: Vec<(PerkKind, Button)>,
    volume_controls: Vec<VolumeControl>,
    toasts: Toasts,
    pointer: Vec2,
    shake_enabled: bool,
    /// Rank of the most recent successful run in the records table
    last_rank: Option<usize>,
}

impl StealthScene {
    pub fn new(profile: &Profile, settings: &Settings, rng: &mut dyn RandomSource) -> Self {
        let config = MissionConfig {
            particle_capacity: settings.max_particles(),
            ..MissionConfig::default()
        };
        let mut sim = MissionSimulation::new(config, profile.difficulty, profile.perks, rng);
        profile.apply_to(&mut sim);

        let action_buttons = MissionAction::ALL
            .iter()
            .zip(ACTION_COLORS)
            .zip(HOTKEYS)
            .map(|((&action, (color, hover)), key)| {
                let button = Button::new(action.button_rect(), action.label(), color, hover)
                    .with_hotkey(key);
                (action, button)
            })
            .collect();

        let shop_buttons = PerkKind::ALL
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let rect = Aabb::new(620.0, 260.0 + i as f32 * 70.0, 300.0, 50.0);
                let button = Button::new(rect, kind.label(), Rgb::DARK_GRAY, Rgb::GRAY)
                    .with_tooltip(format!("+{} per purchase", kind.increment()));
                (kind, button)
            })
            .collect();

        Self {
            sim,
            start_button: Button::new(
                Aabb::new(400.0, 300.0, 200.0, 60.0),
                "Start Mission",
                Rgb::DARK_GREEN,
                Rgb(0, 160, 0),
            ),
            action_buttons,
            shop_buttons,
            volume_controls: [Channel::Master, Channel::Music, Channel::Sfx]
                .into_iter()
                .enumerate()
                .map(|(i, channel)| {
                    let volumes = profile.audio_settings;
                    let value = match channel {
                        Channel::Master => volumes.master,
                        Channel::Music => volumes.music,
                        Channel::Sfx => volumes.sfx,
                    };
                    VolumeControl::new(channel, i, value)
                })
                .collect(),
            toasts: Toasts::default(),
            pointer: Vec2::ZERO,
            shake_enabled: settings.effective_screen_shake(),
            last_rank: None,
        }
    }

    pub fn set_guard_animation(&mut self, player: Option<AnimationPlayer>) {
        self.sim.set_guard_animation(player);
    }

    pub fn sim(&self) -> &MissionSimulation {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut MissionSimulation {
        &mut self.sim
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    fn start_mission(&mut self, ctx: &mut SceneContext) {
        ctx.profile.apply_to(&mut self.sim);
        self.sim.start(ctx.rng);
        self.last_rank = None;
        self.toasts.clear();
    }

    fn buy(&mut self, kind: PerkKind, ctx: &mut SceneContext) {
        match ctx.profile.purchase(kind) {
            Purchase::Bought { cost } => {
                ctx.profile.apply_to(&mut self.sim);
                ctx.audio.play(Cue::ButtonClick);
                self.toasts
                    .push(format!("{} upgraded (-{cost})", kind.label()), INFO_COLOR, TOAST_SECONDS);
                ctx.store.save_progress(ctx.profile);
            }
            Purchase::NotEnoughCredits { cost } => {
                self.toasts
                    .push(format!("Need {cost} credits"), WARN_COLOR, TOAST_SECONDS);
            }
        }
    }

    fn act(&mut self, action: MissionAction, ctx: &mut SceneContext) {
        match self.sim.perform(action, ctx.rng) {
            ActionResult::OnCooldown { remaining } => {
                self.toasts.push(
                    format!("{} ready in {remaining:.1}s", action.label()),
                    WARN_COLOR,
                    TOAST_SECONDS,
                );
            }
            ActionResult::Unavailable => {}
            _ => {
                if let Some((_, button)) = self.action_buttons.iter_mut().find(|(a, _)| *a == action) {
                    button.press();
                }
            }
        }
    }

    fn handle_menu(&mut self, input: &InputState, ctx: &mut SceneContext) -> SceneCommand {
        if input.just_pressed(Action::Back) {
            return SceneCommand::SwitchTo {
                target: SceneId::Action,
                kind: TransitionKind::Slide {
                    direction: SlideDirection::Left,
                    color: Rgb::BLACK,
                    surface: None,
                },
            };
        }
        if input.just_pressed(Action::CycleDifficulty) {
            let next = self.sim.difficulty.next();
            if self.sim.set_difficulty(next, ctx.rng) {
                ctx.profile.difficulty = next;
                info!("Difficulty set to {}", next.name());
            }
        }

        self.handle_volume(input, ctx);

        let mut start = input.just_pressed(Action::Confirm);
        for &click in input.clicks() {
            if self.volume_controls.iter().any(|c| c.slider.rect.contains_point(click)) {
                continue;
            }
            if self.start_button.is_clicked(click) {
                self.start_button.press();
                start = true;
                continue;
            }
            let bought = self
                .shop_buttons
                .iter_mut()
                .find(|(_, b)| b.is_clicked(click))
                .map(|(kind, b)| {
                    b.press();
                    *kind
                });
            if let Some(kind) = bought {
                self.buy(kind, ctx);
            }
        }
        if start {
            ctx.audio.play(Cue::ButtonClick);
            self.start_mission(ctx);
        }
        SceneCommand::Stay
    }

    fn handle_volume(&mut self, input: &InputState, ctx: &mut SceneContext) {
        for control in &mut self.volume_controls {
            for &click in input.clicks() {
                control.slider.pointer_down(click);
            }
            if input.is_pointer_down() {
                control.slider.pointer_moved(input.pointer());
            } else {
                control.slider.pointer_up();
            }
        }
        let mut changed = false;
        for control in &self.volume_controls {
            changed |= control.apply(ctx);
        }
        if changed {
            ctx.profile.audio_settings = ctx.audio.volumes();
            ctx.store.save_progress(ctx.profile);
        }
    }

    fn handle_playing(&mut self, input: &InputState, ctx: &mut SceneContext) {
        if input.just_pressed(Action::Pause) {
            self.sim.toggle_pause();
        }
        let keys = [Action::DisableCameras, Action::CutLights, Action::Distract, Action::Hack];
        for key in keys {
            if let Some(action) = key.mission_action().filter(|_| input.just_pressed(key)) {
                self.act(action, ctx);
            }
        }
        for &click in input.clicks() {
            let hit = self
                .action_buttons
                .iter()
                .find(|(_, b)| b.rect.contains_point(click))
                .map(|(a, _)| *a);
            match hit {
                Some(action) => self.act(action, ctx),
                None => {
                    self.sim.collect_at(click);
                }
            }
        }
    }

    fn handle_over(&mut self, input: &InputState, ctx: &mut SceneContext) {
        if !self.sim.reveal.is_done() {
            return;
        }
        if input.just_pressed(Action::Confirm) || !input.clicks().is_empty() {
            self.sim.reset(ctx.rng);
            ctx.profile.apply_to(&mut self.sim);
        }
    }

    fn on_event(&mut self, event: MissionEvent, ctx: &mut SceneContext) {
        match event {
            MissionEvent::Started => ctx.audio.play(Cue::SystemStartup),
            MissionEvent::ActionUsed { action } => match action {
                MissionAction::DisableCameras => ctx.audio.play(Cue::CameraDisable),
                MissionAction::CutLights => ctx.audio.play(Cue::LightsCut),
                MissionAction::Distract => ctx.audio.play(Cue::Distraction),
                MissionAction::Hack => {}
            },
            MissionEvent::HackResolved { success, .. } => {
                ctx.audio
                    .play(if success { Cue::HackSuccess } else { Cue::HackFail });
            }
            MissionEvent::ObjectiveCollected { reward, .. } => {
                ctx.audio.play(Cue::CoinCollect);
                self.toasts
                    .push(format!("+{reward} credits (pending)"), INFO_COLOR, TOAST_SECONDS);
            }
            MissionEvent::SecurityEventStarted { kind, .. } => {
                self.toasts.push(kind.text(), WARN_COLOR, TOAST_SECONDS);
            }
            MissionEvent::GuardSpotted { .. } => {
                self.toasts.push("Guard spotted you!", Rgb::RED, TOAST_SECONDS);
            }
            MissionEvent::CamerasRestored => {
                self.toasts.push("Cameras back online", WARN_COLOR, TOAST_SECONDS);
            }
            MissionEvent::Ended {
                success,
                credits_banked,
            } => self.on_ended(success, credits_banked, ctx),
            MissionEvent::SecurityEventEnded { .. }
            | MissionEvent::ObjectiveSpawned { .. }
            | MissionEvent::ObjectiveExpired { .. } => {}
        }
    }

    fn on_ended(&mut self, success: bool, credits_banked: u32, ctx: &mut SceneContext) {
        ctx.profile.absorb(&self.sim);
        ctx.profile.audio_settings = ctx.audio.volumes();
        if success {
            self.last_rank = ctx.records.add(RecordEntry {
                time_remaining: self.sim.time_remaining,
                objectives: self.sim.objective_progress,
                detection: self.sim.detection,
                difficulty: self.sim.difficulty,
                timestamp: unix_now(),
            });
            if let Some(rank) = self.last_rank {
                info!("New mission record at rank {rank}");
            }
            self.toasts.push(
                format!("Mission complete! +{credits_banked} credits"),
                Rgb::GREEN,
                TOAST_SECONDS * 2.0,
            );
        } else {
            self.toasts.push("Mission failed", Rgb::RED, TOAST_SECONDS * 2.0);
        }
        ctx.store.save_progress(ctx.profile);
        ctx.store.save_records(ctx.records);
    }

    fn sync_buttons(&mut self, dt: f32) {
        let pointer = self.pointer;
        for (action, button) in &mut self.action_buttons {
            let remaining = self.sim.cooldowns.remaining(*action);
            if remaining > 0.0 && button.cooldown() <= 0.0 {
                button.set_cooldown(remaining);
            } else if remaining <= 0.0 && button.cooldown() > 0.0 {
                button.set_cooldown(0.0);
            }
            button.update(dt, pointer);
        }
        self.start_button.update(dt, pointer);
        for (_, button) in &mut self.shop_buttons {
            button.update(dt, pointer);
        }
    }
}

impl Scene for StealthScene {
    fn id(&self) -> SceneId {
        SceneId::Stealth
    }

    fn enter(&mut self, ctx: &mut SceneContext) {
        if self.sim.phase == MissionPhase::Menu {
            ctx.profile.apply_to(&mut self.sim);
        }
        if !ctx.audio.is_music_playing() {
            ctx.audio.play_music(MENU_THEME, true, MENU_FADE_IN_MS);
        }
        debug!("Stealth scene entered in {:?}", self.sim.phase);
    }

    fn handle_input(&mut self, input: &InputState, ctx: &mut SceneContext) -> SceneCommand {
        self.pointer = input.pointer();
        match self.sim.phase {
            MissionPhase::Menu => return self.handle_menu(input, ctx),
            MissionPhase::Playing => self.handle_playing(input, ctx),
            MissionPhase::Success | MissionPhase::Failure => self.handle_over(input, ctx),
        }
        SceneCommand::Stay
    }

    fn update(&mut self, dt: f32, ctx: &mut SceneContext) {
        self.sim.update(dt, ctx.rng);
        for event in self.sim.drain_events() {
            self.on_event(event, ctx);
        }
        self.sync_buttons(dt);
        self.toasts.update(dt);
    }

    fn draw(&self, canvas: &mut Canvas, sprites: &SpriteBank, rng: &mut dyn RandomSource) {
        let shake = if self.shake_enabled {
            self.sim.particles().shake_offset(rng)
        } else {
            Vec2::ZERO
        };
        draw_mission(canvas, &self.sim, sprites, shake);

        match self.sim.phase {
            MissionPhase::Menu => {
                self.start_button.draw(canvas);
                for (_, button) in &self.shop_buttons {
                    button.draw(canvas);
                }
                for control in &self.volume_controls {
                    control.slider.draw(canvas);
                }
            }
            MissionPhase::Playing => {
                for (_, button) in &self.action_buttons {
                    button.draw(canvas);
                }
                if self.sim.paused {
                    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
                    canvas.fill_rect(0, 0, w, h, Rgb::BLACK, 140);
                }
            }
            MissionPhase::Success | MissionPhase::Failure => {
                let (w, h) = (canvas.width() as i32, canvas.height() as i32);
                canvas.fill_rect(0, 0, w, h, Rgb::BLACK, 160);
                let cfg = &self.sim.config;
                let reveal = &self.sim.reveal;
                let bars = [
                    (reveal.objectives as f32 / cfg.objectives_needed.max(1) as f32, Rgb::GREEN),
                    (reveal.detection as f32 / cfg.max_detection.max(1.0), Rgb::RED),
                    (reveal.time as f32 / cfg.mission_time.max(1.0), INFO_COLOR),
                ];
                for (i, (fraction, color)) in bars.into_iter().enumerate() {
                    let rect = Aabb::new(300.0, 250.0 + i as f32 * 40.0, 400.0, 20.0);
                    draw_meter(canvas, rect, fraction, color);
                }
            }
        }
        self.toasts.draw(canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioManager, AudioService, SilentOutput};
    use crate::persistence::ProgressStore;
    use crate::records::MissionRecords;
    use crate::sim::{Difficulty, ScriptedRandom};

    struct Harness {
        audio: AudioManager,
        store: ProgressStore,
        profile: Profile,
        records: MissionRecords,
        settings: Settings,
        rng: ScriptedRandom,
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
                // Never spawns objectives or guard spots, every hack succeeds
                rng: ScriptedRandom::constant(0.1),
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

    fn press(action: Action) -> InputState {
        let mut input = InputState::new();
        input.press(action);
        input
    }

    fn scene(h: &mut Harness) -> StealthScene {
        let (profile, settings) = (h.profile.clone(), h.settings.clone());
        StealthScene::new(&profile, &settings, &mut h.rng)
    }

    #[test]
    fn test_confirm_starts_mission() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        s.handle_input(&press(Action::Confirm), &mut h.ctx());
        assert_eq!(s.sim().phase, MissionPhase::Playing);
    }

    #[test]
    fn test_cycle_difficulty_updates_profile() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        s.handle_input(&press(Action::CycleDifficulty), &mut h.ctx());
        assert_eq!(s.sim().difficulty, Difficulty::Hard);
        assert_eq!(h.profile.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_shop_purchase_and_refusal() {
        let mut h = Harness::new();
        h.profile.currency = 6;
        let mut s = scene(&mut h);
        let at = s.shop_buttons[0].1.rect.center();

        let mut input = InputState::new();
        input.click(at);
        s.handle_input(&input, &mut h.ctx());
        assert_eq!(h.profile.currency, 1);
        assert!((s.sim().perks.cooldown_reduction - 0.2).abs() < 1e-6);
        assert_eq!(h.store.load_progress().currency, 1);

        s.handle_input(&input, &mut h.ctx());
        assert_eq!(h.profile.currency, 1);
        assert_eq!(s.toasts().latest(), Some("Need 20 credits"));
    }

    #[test]
    fn test_cooldown_click_shows_toast() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        s.handle_input(&press(Action::Confirm), &mut h.ctx());

        let mut input = InputState::new();
        input.press(Action::Distract);
        s.handle_input(&input, &mut h.ctx());
        s.update(1.0 / 60.0, &mut h.ctx());
        input.end_frame();
        input.release(Action::Distract);
        input.end_frame();
        input.press(Action::Distract);
        s.handle_input(&input, &mut h.ctx());
        assert!(s.toasts().latest().is_some_and(|t| t.contains("ready in")));
    }

    #[test]
    fn test_success_banks_and_records() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        s.handle_input(&press(Action::Confirm), &mut h.ctx());
        s.sim_mut().objective_progress = 5;
        s.sim_mut().pending_credits = 4;
        s.update(1.0 / 60.0, &mut h.ctx());

        assert_eq!(s.sim().phase, MissionPhase::Success);
        assert_eq!(h.profile.currency, 4);
        assert_eq!(s.last_rank(), Some(1));
        assert_eq!(h.records.entries.len(), 1);
        assert_eq!(h.store.load_records().entries.len(), 1);
        assert_eq!(h.store.load_progress().currency, 4);
    }

    #[test]
    fn test_over_waits_for_reveal_before_reset() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        s.handle_input(&press(Action::Confirm), &mut h.ctx());
        s.sim_mut().detection = 100.0;
        s.update(1.0 / 60.0, &mut h.ctx());
        assert_eq!(s.sim().phase, MissionPhase::Failure);

        s.handle_input(&press(Action::Confirm), &mut h.ctx());
        assert_eq!(s.sim().phase, MissionPhase::Failure);
        for _ in 0..600 {
            s.update(1.0 / 60.0, &mut h.ctx());
        }
        s.handle_input(&press(Action::Confirm), &mut h.ctx());
        assert_eq!(s.sim().phase, MissionPhase::Menu);
    }

    #[test]
    fn test_volume_slider_reaches_audio_and_profile() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        let track = s.volume_controls[1].slider.rect;
        let mut input = InputState::new();
        input.click(Vec2::new(track.left() + track.size.x * 0.25, track.center().y));
        s.handle_input(&input, &mut h.ctx());

        assert!((h.audio.volumes().music - 0.25).abs() < 1e-4);
        assert!((h.profile.audio_settings.music - 0.25).abs() < 1e-4);
        assert_eq!(s.sim().phase, MissionPhase::Menu);
    }

    #[test]
    fn test_volume_slider_drag_follows_pointer() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        let track = s.volume_controls[2].slider.rect;
        let mut input = InputState::new();
        input.click(s.volume_controls[2].slider.handle_rect().center());
        input.set_pointer_down(true);
        s.handle_input(&input, &mut h.ctx());
        input.end_frame();
        assert!(s.volume_controls[2].slider.is_dragging());

        input.move_pointer(Vec2::new(track.left() + track.size.x * 0.3, track.center().y));
        s.handle_input(&input, &mut h.ctx());
        assert!((h.audio.volumes().sfx - 0.3).abs() < 1e-4);

        input.set_pointer_down(false);
        input.move_pointer(Vec2::new(track.left(), track.center().y));
        s.handle_input(&input, &mut h.ctx());
        assert!(!s.volume_controls[2].slider.is_dragging());
        assert!((h.profile.audio_settings.sfx - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_back_from_menu_switches_to_action() {
        let mut h = Harness::new();
        let mut s = scene(&mut h);
        let cmd = s.handle_input(&press(Action::Back), &mut h.ctx());
        assert!(matches!(
            cmd,
            SceneCommand::SwitchTo {
                target: SceneId::Action,
                ..
            }
        ));
    }
}
