//! Scenes and the root frame driver
//!
//! `Game` owns every long-lived service (audio, save store, profile, RNG) and
//! lends them to the active scene through a `SceneContext` each frame. While
//! a transition is running no scene receives input or updates.

pub mod action;
pub mod stealth;
pub mod toast;

pub use action::ActionScene;
pub use stealth::StealthScene;

use std::path::PathBuf;

use clap::ValueEnum;
use log::{info, warn};

use crate::audio::{AudioManager, AudioService, default_output};
use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::persistence::{Profile, ProgressStore};
use crate::platform::InputState;
use crate::records::MissionRecords;
use crate::renderer::draw::GUARD_SPRITE;
use crate::renderer::{Canvas, SpriteBank, load_image, load_sprite_sheet};
use crate::settings::Settings;
use crate::sim::{AnimationPlayer, Guard, RandomSource, SeededRandom};
use crate::transition::{TransitionKind, TransitionMachine, TransitionOptions, TransitionStatus};

pub const EMBER_SPRITE: &str = "ember";
const GUARD_FRAME: (u32, u32) = (32, 48);
const EMBER_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum SceneId {
    #[value(alias = "mission")]
    Stealth,
    #[value(alias = "combat")]
    Action,
}

impl SceneId {
    pub fn name(self) -> &'static str {
        match self {
            SceneId::Stealth => "stealth",
            SceneId::Action => "action",
        }
    }
}

/// What a scene asks of the driver after handling input
#[derive(Debug, Clone)]
pub enum SceneCommand {
    Stay,
    SwitchTo { target: SceneId, kind: TransitionKind },
    Quit,
}

/// Services lent to the active scene for one call
pub struct SceneContext<'a> {
    pub audio: &'a mut dyn AudioService,
    pub store: &'a ProgressStore,
    pub profile: &'a mut Profile,
    pub records: &'a mut MissionRecords,
    pub settings: &'a Settings,
    pub rng: &'a mut dyn RandomSource,
}

pub trait Scene {
    fn id(&self) -> SceneId;

    /// Called when the scene becomes active (at the transition midpoint)
    fn enter(&mut self, ctx: &mut SceneContext);

    fn handle_input(&mut self, input: &InputState, ctx: &mut SceneContext) -> SceneCommand;

    fn update(&mut self, dt: f32, ctx: &mut SceneContext);

    fn draw(&self, canvas: &mut Canvas, sprites: &SpriteBank, rng: &mut dyn RandomSource);

    /// Called when the scene is switched away from
    fn exit(&mut self, _ctx: &mut SceneContext) {}
}

/// Startup options for the root driver
#[derive(Debug, Clone)]
pub struct GameOptions {
    pub save_dir: PathBuf,
    /// Root of `sprites/`, `sfx/`, `music/`; `None` runs with placeholders only
    pub asset_dir: Option<PathBuf>,
    pub seed: u64,
    pub start_scene: SceneId,
    /// Save slot the arena plays in (1 to 3)
    pub slot: u8,
}

pub struct Game {
    settings: Settings,
    profile: Profile,
    records: MissionRecords,
    store: ProgressStore,
    audio: AudioManager,
    rng: SeededRandom,
    /// Cosmetic rolls at draw time (shake) so rendering never perturbs gameplay
    fx_rng: SeededRandom,
    sprites: SpriteBank,
    transition: TransitionMachine<SceneId>,
    stealth: StealthScene,
    action: ActionScene,
    active: SceneId,
    canvas: Canvas,
    quit: bool,
}

/// Split-borrow `Game` into the active scene and a context over the rest
macro_rules! with_scene {
    ($game:expr, |$scene:ident, $ctx:ident| $body:expr) => {{
        let mut $ctx = SceneContext {
            audio: &mut $game.audio,
            store: &$game.store,
            profile: &mut $game.profile,
            records: &mut $game.records,
            settings: &$game.settings,
            rng: &mut $game.rng,
        };
        let $scene: &mut dyn Scene = match $game.active {
            SceneId::Stealth => &mut $game.stealth,
            SceneId::Action => &mut $game.action,
        };
        $body
    }};
}

impl Game {
    pub fn new(options: GameOptions) -> Self {
        let store = ProgressStore::new(options.save_dir);
        let profile = store.load_progress();
        let records = store.load_records();
        let settings = profile.game_settings.clone();

        let audio_dir = options.asset_dir.clone();
        let mut audio = AudioManager::new(audio_dir, default_output());
        audio.apply_volumes(profile.audio_settings);

        let mut rng = SeededRandom::new(options.seed);
        let (sprites, guard_animation) = load_sprites(options.asset_dir.as_ref());

        let mut stealth = StealthScene::new(&profile, &settings, &mut rng);
        stealth.set_guard_animation(guard_animation);
        let ember_sprite = sprites.get(EMBER_SPRITE).map(|_| EMBER_SPRITE.to_string());
        let mut action = ActionScene::new(&settings, ember_sprite);
        action.set_slot(options.slot);

        info!(
            "Game ready: seed {}, saves in {}",
            options.seed,
            store.dir().display()
        );

        let mut game = Self {
            transition: TransitionMachine::new(SCREEN_WIDTH, SCREEN_HEIGHT, settings.transition_speed),
            canvas: Canvas::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            settings,
            profile,
            records,
            store,
            audio,
            rng,
            fx_rng: SeededRandom::new(options.seed.wrapping_add(1)),
            sprites,
            stealth,
            action,
            active: options.start_scene,
            quit: false,
        };
        with_scene!(game, |scene, ctx| scene.enter(&mut ctx));
        game
    }

    pub fn active_scene(&self) -> SceneId {
        self.active
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn stealth(&self) -> &StealthScene {
        &self.stealth
    }

    pub fn action(&self) -> &ActionScene {
        &self.action
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn records(&self) -> &MissionRecords {
        &self.records
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    /// Run one frame: input, then update. `raw_dt` is the measured frame time.
    pub fn frame(&mut self, raw_dt: f32, input: &InputState) {
        let dt = self.settings.clamp_dt(raw_dt);

        if self.transition.is_active() {
            let status = self.transition.update(dt);
            self.apply_transition(status);
            return;
        }

        let command = with_scene!(self, |scene, ctx| scene.handle_input(input, &mut ctx));
        match command {
            SceneCommand::Stay => {}
            SceneCommand::Quit => {
                info!("Quit requested");
                self.quit = true;
                return;
            }
            SceneCommand::SwitchTo { target, kind } => {
                self.request_switch(target, kind);
                if self.transition.is_active() {
                    return;
                }
            }
        }

        with_scene!(self, |scene, ctx| scene.update(dt, &mut ctx));
    }

    /// Start a transition to `target`. A transition already in flight wins;
    /// one that cannot start (bad asset) degrades to an immediate switch.
    pub fn request_switch(&mut self, target: SceneId, kind: TransitionKind) {
        if target == self.active {
            return;
        }
        let options = TransitionOptions {
            speed: Some(self.settings.transition_speed),
            ..TransitionOptions::default()
        };
        if let Err(e) = self.transition.start(target, kind, options) {
            if self.transition.is_active() {
                return;
            }
            warn!("Skipping transition to {}: {e}", target.name());
            self.switch_scene(target);
        }
    }

    fn apply_transition(&mut self, status: TransitionStatus<SceneId>) {
        if let Some(target) = status.state_changed {
            self.switch_scene(target);
        }
        if status.completed {
            info!("Now in {} scene", self.active.name());
        }
    }

    fn switch_scene(&mut self, target: SceneId) {
        if target == self.active {
            return;
        }
        with_scene!(self, |scene, ctx| scene.exit(&mut ctx));
        info!("Scene {} -> {}", self.active.name(), target.name());
        self.active = target;
        with_scene!(self, |scene, ctx| scene.enter(&mut ctx));
    }

    /// Draw the active scene and any transition overlay
    pub fn render(&mut self) -> &Canvas {
        let scene: &dyn Scene = match self.active {
            SceneId::Stealth => &self.stealth,
            SceneId::Action => &self.action,
        };
        scene.draw(&mut self.canvas, &self.sprites, &mut self.fx_rng);
        self.transition.draw(&mut self.canvas);
        &self.canvas
    }

    /// Persist the profile with the live audio levels
    pub fn save(&mut self) -> bool {
        self.profile.audio_settings = self.audio.volumes();
        self.profile.game_settings = self.settings.clone();
        self.store.save_progress(&self.profile)
    }
}

/// Decode optional art. Anything missing is logged and drawn as a placeholder.
fn load_sprites(asset_dir: Option<&PathBuf>) -> (SpriteBank, Option<AnimationPlayer>) {
    let mut sprites = SpriteBank::new();
    let Some(dir) = asset_dir else {
        return (sprites, None);
    };
    let sprite_dir = dir.join("sprites");

    let mut guard_animation = None;
    match load_sprite_sheet(&sprite_dir.join("guard.png"), GUARD_FRAME.0, GUARD_FRAME.1) {
        Ok((image, sheet)) => {
            guard_animation = Guard::standard_animations(&sheet)
                .inspect_err(|e| warn!("Guard animations unavailable: {e}"))
                .ok();
            sprites.insert(GUARD_SPRITE, image);
        }
        Err(e) => warn!("Guards will draw as circles: {e}"),
    }
    match load_image(&sprite_dir.join("ember.png"), EMBER_SIZE, EMBER_SIZE) {
        Ok(img) => sprites.insert(EMBER_SPRITE, img),
        Err(e) => warn!("Embers will draw as dots: {e}"),
    }
    (sprites, guard_animation)
}
