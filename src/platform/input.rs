//! Input state tracking
//!
//! The device layer (or a scripted driver) calls `press` / `release` /
//! `click`; scenes only ask boolean questions. `end_frame` must run once per
//! frame after the scene has handled input.

use std::collections::HashSet;

use glam::Vec2;

use crate::sim::{CombatInput, MissionAction};

/// Logical actions, independent of the physical key bound to them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Jump,
    Attack,
    Dash,
    Special,
    Heal,
    LookUp,
    LookDown,
    Pause,
    Confirm,
    Back,
    CycleDifficulty,
    DisableCameras,
    CutLights,
    Distract,
    Hack,
}

impl Action {
    pub fn mission_action(self) -> Option<MissionAction> {
        match self {
            Action::DisableCameras => Some(MissionAction::DisableCameras),
            Action::CutLights => Some(MissionAction::CutLights),
            Action::Distract => Some(MissionAction::Distract),
            Action::Hack => Some(MissionAction::Hack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    previous: HashSet<Action>,
    clicks: Vec<Vec2>,
    pointer: Vec2,
    pointer_down: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn set(&mut self, action: Action, down: bool) {
        if down {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Down now, up last frame
    pub fn just_pressed(&self, action: Action) -> bool {
        self.held.contains(&action) && !self.previous.contains(&action)
    }

    pub fn just_released(&self, action: Action) -> bool {
        !self.held.contains(&action) && self.previous.contains(&action)
    }

    pub fn move_pointer(&mut self, pos: Vec2) {
        self.pointer = pos;
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Register a primary-button click at `pos`
    pub fn click(&mut self, pos: Vec2) {
        self.pointer = pos;
        self.clicks.push(pos);
    }

    /// Primary button state, for drags
    pub fn set_pointer_down(&mut self, down: bool) {
        self.pointer_down = down;
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    /// Clicks since the last `end_frame`
    pub fn clicks(&self) -> &[Vec2] {
        &self.clicks
    }

    /// Held-key snapshot for the combat loop
    pub fn combat_input(&self) -> CombatInput {
        CombatInput {
            left: self.is_held(Action::Left),
            right: self.is_held(Action::Right),
            jump: self.is_held(Action::Jump),
            attack: self.is_held(Action::Attack),
            dash: self.is_held(Action::Dash),
            special: self.is_held(Action::Special),
            heal: self.is_held(Action::Heal),
            look_up: self.is_held(Action::LookUp),
            look_down: self.is_held(Action::LookDown),
        }
    }

    pub fn end_frame(&mut self) {
        self.previous.clone_from(&self.held);
        self.clicks.clear();
    }

    /// Forget everything (e.g. on focus loss)
    pub fn clear(&mut self) {
        self.held.clear();
        self.previous.clear();
        self.clicks.clear();
        self.pointer_down = false;
    }
}
