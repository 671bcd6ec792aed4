//! Transient visual effects: sparks, smoke, embers, floating text and screen shake
//!
//! The system owns every particle outright. Spawn requests past the capacity are
//! truncated silently; nothing is queued.

use glam::Vec2;

use super::rng::RandomSource;
use crate::Rgb;
use crate::consts::DEFAULT_PARTICLE_CAP;

/// Seconds between ambient ember spawns
const EMBER_SPAWN_INTERVAL: f32 = 0.1;
/// Linear shake decay (amplitude units per second) once the countdown is over
const SHAKE_DECAY_RATE: f32 = 8.0;
/// Floating text lifetime in seconds
const FLOATING_TEXT_DURATION: f32 = 1.0;

pub const SPARK_GRAVITY: f32 = 300.0;
pub const SMOKE_GRAVITY: f32 = -20.0;
pub const SMOKE_COLOR: Rgb = Rgb(180, 180, 180);
pub const EMBER_COLOR: Rgb = Rgb(255, 140, 60);

/// Particle behaviour variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleKind {
    Spark,
    Smoke,
    /// Size drifts by `size_rate` per second, clamped to [min_size, max_size]
    Ember {
        size_rate: f32,
        min_size: f32,
        max_size: f32,
    },
}

/// What a particle is drawn with
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleLook {
    Color(Rgb),
    /// Named sprite, tinted fallback colour when the image is unavailable
    Sprite { name: String, fallback: Rgb },
}

impl ParticleLook {
    pub fn color(&self) -> Rgb {
        match self {
            ParticleLook::Color(c) => *c,
            ParticleLook::Sprite { fallback, .. } => *fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub initial_life: f32,
    pub size: f32,
    pub gravity: f32,
    pub kind: ParticleKind,
    pub look: ParticleLook,
}

impl Particle {
    /// Remaining life as a fraction of the initial life
    pub fn life_fraction(&self) -> f32 {
        (self.life / self.initial_life.max(0.001)).clamp(0.0, 1.0)
    }

    /// Draw alpha: sparks fade fully, smoke keeps a faint floor
    pub fn alpha(&self) -> u8 {
        let frac = self.life_fraction();
        match self.kind {
            ParticleKind::Spark => (255.0 * frac) as u8,
            ParticleKind::Smoke => (150.0 * frac).max(20.0) as u8,
            ParticleKind::Ember { .. } => (200.0 * frac).max(40.0) as u8,
        }
    }
}

/// Signed numeric popup that rises and fades out
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub pos: Vec2,
    pub vy: f32,
    pub time: f32,
    pub duration: f32,
    pub color: Rgb,
}

impl FloatingText {
    pub fn alpha(&self) -> u8 {
        (255.0 * (self.time / self.duration.max(0.01))).clamp(0.0, 255.0) as u8
    }
}

/// Decaying screen shake
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShakeState {
    pub amount: f32,
    pub time: f32,
    pub duration: f32,
}

impl ShakeState {
    /// Boost the shake. Amplitude never drops because of a re-trigger.
    pub fn start(&mut self, amount: f32, duration: f32) {
        self.amount = self.amount.max(amount);
        self.time = duration;
        self.duration = duration;
    }

    pub fn update(&mut self, dt: f32) {
        if self.time > 0.0 {
            self.time -= dt;
            if self.time <= 0.0 {
                *self = ShakeState::default();
            }
        } else {
            self.amount = (self.amount - SHAKE_DECAY_RATE * dt).max(0.0);
        }
    }

    pub fn is_shaking(&self) -> bool {
        self.amount > 0.0
    }

    /// Current amplitude scaled by the remaining-time fraction
    pub fn amplitude(&self) -> f32 {
        if self.amount <= 0.0 {
            return 0.0;
        }
        let frac = if self.duration > 0.0 {
            self.time / self.duration.max(0.0001)
        } else {
            0.0
        };
        if frac > 0.0 { self.amount * frac } else { self.amount }
    }

    pub fn offset(&self, rng: &mut dyn RandomSource) -> Vec2 {
        let amp = self.amplitude();
        if amp <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(rng.range(-amp, amp).trunc(), rng.range(-amp, amp).trunc())
    }
}

/// Owner of all transient effects for one scene
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    texts: Vec<FloatingText>,
    shake: ShakeState,
    capacity: usize,
    screen: Vec2,
    embers_enabled: bool,
    ember_timer: f32,
    ember_sprite: Option<String>,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICLE_CAP)
    }
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity.min(DEFAULT_PARTICLE_CAP)),
            texts: Vec::new(),
            shake: ShakeState::default(),
            capacity,
            screen: Vec2::new(
                crate::consts::SCREEN_WIDTH as f32,
                crate::consts::SCREEN_HEIGHT as f32,
            ),
            embers_enabled: false,
            ember_timer: 0.0,
            ember_sprite: None,
        }
    }

    /// Enable ambient embers drifting in from the screen edges
    pub fn with_embers(mut self, screen: Vec2, sprite: Option<String>) -> Self {
        self.screen = screen;
        self.embers_enabled = true;
        self.ember_sprite = sprite;
        self
    }

    pub fn set_embers_enabled(&mut self, enabled: bool) {
        self.embers_enabled = enabled;
        self.ember_timer = 0.0;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn floating_texts(&self) -> &[FloatingText] {
        &self.texts
    }

    pub fn shake(&self) -> &ShakeState {
        &self.shake
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    fn available(&self, requested: usize) -> usize {
        requested.min(self.capacity.saturating_sub(self.particles.len()))
    }

    /// Fast radial burst pulled down by gravity
    pub fn spawn_sparks(&mut self, at: Vec2, count: usize, color: Rgb, rng: &mut dyn RandomSource) {
        for _ in 0..self.available(count) {
            let angle = rng.range(0.0, std::f32::consts::TAU);
            let speed = rng.range(40.0, 220.0);
            let life = rng.range(0.35, 0.9);
            let pos = at + Vec2::new(rng.range(-8.0, 8.0), rng.range(-8.0, 8.0));
            let vel = Vec2::new(
                angle.cos() * speed,
                angle.sin() * speed * 0.6 - rng.range(10.0, 60.0),
            );
            self.particles.push(Particle {
                pos,
                vel,
                life,
                initial_life: life,
                size: rng.range(2.0, 4.0),
                gravity: SPARK_GRAVITY,
                kind: ParticleKind::Spark,
                look: ParticleLook::Color(color),
            });
        }
    }

    /// Slow buoyant puffs
    pub fn spawn_smoke(&mut self, at: Vec2, count: usize, rng: &mut dyn RandomSource) {
        for _ in 0..self.available(count) {
            let life = rng.range(0.9, 2.0);
            let pos = at + Vec2::new(rng.range(-12.0, 12.0), rng.range(-6.0, 6.0));
            let vel = Vec2::new(rng.range(-20.0, 20.0), rng.range(-40.0, -10.0));
            self.particles.push(Particle {
                pos,
                vel,
                life,
                initial_life: life,
                size: rng.range(8.0, 18.0),
                gravity: SMOKE_GRAVITY,
                kind: ParticleKind::Smoke,
                look: ParticleLook::Color(SMOKE_COLOR),
            });
        }
    }

    /// Long-lived diagonal drifters with a breathing size and no gravity
    pub fn spawn_embers(
        &mut self,
        at: Vec2,
        count: usize,
        sprite: Option<&str>,
        rng: &mut dyn RandomSource,
    ) {
        for _ in 0..self.available(count) {
            let life = rng.range(15.0, 20.0);
            let pos = at + Vec2::new(rng.range(-6.0, 6.0), rng.range(-6.0, 6.0));
            let vel = Vec2::new(rng.range(15.0, 45.0), -rng.range(10.0, 35.0));
            let look = match sprite {
                Some(name) => ParticleLook::Sprite {
                    name: name.to_string(),
                    fallback: EMBER_COLOR,
                },
                None => ParticleLook::Color(EMBER_COLOR),
            };
            self.particles.push(Particle {
                pos,
                vel,
                life,
                initial_life: life,
                size: rng.range(1.5, 3.5),
                gravity: 0.0,
                kind: ParticleKind::Ember {
                    size_rate: rng.range(-0.6, 0.6),
                    min_size: 1.0,
                    max_size: 4.0,
                },
                look,
            });
        }
    }

    /// Popup for a detection/health delta. Positive is red "+N", the rest green.
    pub fn add_floating_text(&mut self, delta: i32, at: Vec2, rng: &mut dyn RandomSource) {
        let (text, color) = if delta > 0 {
            (format!("+{delta}"), Rgb::RED)
        } else {
            (delta.to_string(), Rgb::GREEN)
        };
        self.texts.push(FloatingText {
            text,
            pos: at + Vec2::new(rng.range(-12.0, 12.0), rng.range(-6.0, 6.0)),
            vy: -40.0 - rng.range(0.0, 40.0),
            time: FLOATING_TEXT_DURATION,
            duration: FLOATING_TEXT_DURATION,
            color,
        });
    }

    pub fn start_shake(&mut self, amount: f32, duration: f32) {
        self.shake.start(amount, duration);
    }

    pub fn shake_offset(&self, rng: &mut dyn RandomSource) -> Vec2 {
        self.shake.offset(rng)
    }

    pub fn update(&mut self, dt: f32, rng: &mut dyn RandomSource) {
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            p.vel.y += p.gravity * dt;
            if let ParticleKind::Ember {
                size_rate,
                min_size,
                max_size,
            } = p.kind
            {
                p.size = (p.size + size_rate * dt).clamp(min_size, max_size);
            }
            p.life -= dt;
        }
        self.particles.retain(|p| p.life > 0.0);

        for t in &mut self.texts {
            t.pos.y += t.vy * dt;
            t.time -= dt;
        }
        self.texts.retain(|t| t.time > 0.0);

        self.shake.update(dt);

        if self.embers_enabled {
            self.ember_timer += dt;
            while self.ember_timer >= EMBER_SPAWN_INTERVAL {
                self.ember_timer -= EMBER_SPAWN_INTERVAL;
                let origin = self.edge_point(rng);
                let sprite = self.ember_sprite.clone();
                self.spawn_embers(origin, 1, sprite.as_deref(), rng);
            }
        }
    }

    /// Random point on the left or bottom edge, so embers drift across the view
    fn edge_point(&self, rng: &mut dyn RandomSource) -> Vec2 {
        if rng.chance(0.5) {
            Vec2::new(0.0, rng.range(0.0, self.screen.y))
        } else {
            Vec2::new(rng.range(0.0, self.screen.x), self.screen.y)
        }
    }

    /// Drop every particle and text and stop shaking
    pub fn clear(&mut self) {
        self.particles.clear();
        self.texts.clear();
        self.shake = ShakeState::default();
        self.ember_timer = 0.0;
    }
}
