//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering,
//! audio and platform dependencies:
//! - Randomness only through an injected `RandomSource`
//! - Time only through the `dt` handed to `update`
//! - Side effects reported as typed events for the scene layer to act on

pub mod animation;
pub mod collision;
pub mod combat;
pub mod easing;
pub mod guard;
pub mod mission;
pub mod particles;
pub mod rng;

pub use animation::{AnimationClip, AnimationPlayer, FrameRect, FrameTiming, SpriteSheet};
pub use collision::Aabb;
pub use combat::{CombatConfig, CombatEvent, CombatInput, CombatLoop, CombatOutcome, Enemy, Player};
pub use easing::Easing;
pub use guard::Guard;
pub use mission::{
    ActionResult, Cooldowns, Difficulty, EndReveal, HudValues, MissionAction, MissionConfig,
    MissionEvent, MissionPhase, MissionSimulation, Perks,
    SecondaryObjective, SecurityEvent, SecurityEventKind,
};
pub use particles::{FloatingText, Particle, ParticleKind, ParticleLook, ParticleSystem, ShakeState};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
