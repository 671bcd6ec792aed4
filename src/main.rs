//! Shadowsilk entry point
//!
//! Runs the game headless at a fixed 60 Hz with a scripted autopilot standing
//! in for the player, then saves and optionally writes the last frame as PNG.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;
use log::{error, info};

use shadowsilk::consts::FRAME_DT;
use shadowsilk::persistence::ProgressStore;
use shadowsilk::platform::{Action, FrameClock, InputState};
use shadowsilk::scene::{Game, GameOptions, SceneId};
use shadowsilk::sim::{CombatOutcome, MissionAction, MissionPhase};

#[derive(Parser)]
#[command(name = "shadowsilk")]
#[command(about = "Headless run of the stealth mission and action arena")]
struct Args {
    /// Scene to start in
    #[arg(long, value_enum, default_value_t = SceneId::Stealth)]
    scene: SceneId,

    /// Save slot the action arena plays in
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    slot: u8,

    /// RNG seed; the same seed replays the same run
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,

    /// Where profile and save slots live (defaults to the user data dir)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Directory holding sprites/, sfx/ and music/
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    /// Write the final frame to this PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

/// Taps keys the way a cautious player would
#[derive(Default)]
struct Autopilot {
    tapped: Vec<Action>,
    over_frames: u32,
}

impl Autopilot {
    fn tap(&mut self, input: &mut InputState, action: Action) {
        input.press(action);
        self.tapped.push(action);
    }

    /// Release last frame's taps, then decide this frame's input
    fn drive(&mut self, game: &Game, input: &mut InputState) {
        for action in self.tapped.drain(..) {
            input.release(action);
        }
        if game.is_transitioning() {
            return;
        }
        match game.active_scene() {
            SceneId::Stealth => self.drive_stealth(game, input),
            SceneId::Action => self.drive_action(game, input),
        }
    }

    fn drive_stealth(&mut self, game: &Game, input: &mut InputState) {
        let sim = game.stealth().sim();
        match sim.phase {
            MissionPhase::Menu if self.over_frames > 0 => {
                self.over_frames = 0;
                self.tap(input, Action::Back);
            }
            MissionPhase::Menu => self.tap(input, Action::Confirm),
            MissionPhase::Playing => {
                let ready = |a: MissionAction| sim.cooldowns.is_ready(a);
                let pressure = sim.detection / sim.config.max_detection;
                let pick = if pressure > 0.6 && ready(MissionAction::Distract) {
                    Some(Action::Distract)
                } else if pressure > 0.4 && ready(MissionAction::DisableCameras) {
                    Some(Action::DisableCameras)
                } else if pressure > 0.3 && ready(MissionAction::CutLights) {
                    Some(Action::CutLights)
                } else if ready(MissionAction::Hack) {
                    Some(Action::Hack)
                } else {
                    None
                };
                if let Some(action) = pick {
                    self.tap(input, action);
                }
                if let Some(obj) = sim.secondary_objectives.first() {
                    input.click(obj.pos);
                }
            }
            MissionPhase::Success | MissionPhase::Failure => {
                if sim.reveal.is_done() {
                    self.over_frames += 1;
                    self.tap(input, Action::Confirm);
                }
            }
        }
    }

    fn drive_action(&mut self, game: &Game, input: &mut InputState) {
        let combat = game.action().combat();
        if combat.outcome == CombatOutcome::Defeat {
            self.tap(input, Action::Confirm);
            return;
        }
        let player = combat.player.body.center();
        let gap = combat.enemy.body.center().x - player.x;
        let close = gap.abs() < combat.config.attack_range;
        input.set(Action::Right, combat.enemy.is_alive() && gap > 0.0 && !close);
        input.set(Action::Left, combat.enemy.is_alive() && gap < 0.0 && !close);
        if close && combat.enemy.is_alive() && combat.player.attack_timer <= 0.0 {
            self.tap(input, Action::Attack);
        }
        let hurt = combat.player.health < combat.config.max_health;
        if hurt && combat.player.silk >= 3 && !combat.player.healing {
            self.tap(input, Action::Heal);
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let start_scene = args.scene;
    let save_dir = args.save_dir.unwrap_or_else(ProgressStore::default_dir);
    info!("Shadowsilk starting in {} scene", start_scene.name());

    let mut game = Game::new(GameOptions {
        save_dir,
        asset_dir: args.asset_dir,
        seed: args.seed,
        start_scene,
        slot: args.slot,
    });

    let frames = (args.seconds.max(0.0) / FRAME_DT).round() as u32;
    let mut input = InputState::new();
    input.move_pointer(Vec2::ZERO);
    let mut autopilot = Autopilot::default();
    let mut clock = FrameClock::new();

    for _ in 0..frames {
        autopilot.drive(&game, &mut input);
        game.frame(FRAME_DT, &input);
        input.end_frame();
        clock.tick();
        if game.should_quit() {
            break;
        }
    }
    info!(
        "Ran {frames} frames ({} fps wall clock), credits {}, records {}",
        clock.fps(),
        game.profile().currency,
        game.records().entries.len()
    );

    if !game.save() {
        error!("Progress could not be saved");
    }

    if let Some(path) = args.snapshot {
        let canvas = game.render();
        if let Err(e) = canvas.save_png(&path) {
            error!("Failed to write snapshot {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!("Snapshot written to {}", path.display());
    }
    ExitCode::SUCCESS
}
