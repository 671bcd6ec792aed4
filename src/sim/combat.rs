//! Side-scrolling action prototype: player physics, silk-gated healing and
//! melee against a patrolling grub
//!
//! Screen coordinates (+y down). Bodies are anchored by their bottom edge on a
//! fixed ground line.

use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::particles::ParticleSystem;
use super::rng::RandomSource;
use crate::Rgb;
use crate::consts::{DEFAULT_PARTICLE_CAP, SCREEN_HEIGHT, SCREEN_WIDTH};

const HIT_SPARK_COLOR: Rgb = Rgb(255, 230, 160);
const HURT_SPARK_COLOR: Rgb = Rgb(255, 80, 80);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub world: Vec2,
    pub ground_y: f32,
    pub player_size: Vec2,
    pub player_spawn_x: f32,
    pub player_speed: f32,
    /// Initial vertical velocity of a jump (negative is up)
    pub jump_velocity: f32,
    pub gravity: f32,
    pub max_health: u32,
    pub max_silk: u32,
    pub silk_per_hit: u32,
    pub heal_amount: u32,
    pub heal_channel: f32,
    pub attack_cooldown: f32,
    pub dash_cooldown: f32,
    pub special_cooldown: f32,
    pub attack_range: f32,
    pub attack_height: f32,
    pub attack_damage: u32,
    pub enemy_size: Vec2,
    pub enemy_spawn_x: f32,
    pub enemy_max_health: u32,
    pub enemy_speed: f32,
    /// Patrol bounds for the enemy's left edge
    pub enemy_bounds: (f32, f32),
    pub contact_damage: u32,
    pub contact_cooldown: f32,
    /// Hold time before look up/down starts panning
    pub look_hold: f32,
    pub look_speed: f32,
    pub max_look: f32,
    pub particle_capacity: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            world: Vec2::new(SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32),
            ground_y: 500.0,
            player_size: Vec2::new(48.0, 72.0),
            player_spawn_x: 200.0,
            player_speed: 300.0,
            jump_velocity: -600.0,
            gravity: 1800.0,
            max_health: 4,
            max_silk: 9,
            silk_per_hit: 1,
            heal_amount: 3,
            heal_channel: 2.0,
            attack_cooldown: 0.18,
            dash_cooldown: 0.22,
            special_cooldown: 0.45,
            attack_range: 60.0,
            attack_height: 40.0,
            attack_damage: 1,
            enemy_size: Vec2::new(56.0, 32.0),
            enemy_spawn_x: 600.0,
            enemy_max_health: 2,
            enemy_speed: 150.0,
            enemy_bounds: (450.0, 800.0),
            contact_damage: 1,
            contact_cooldown: 0.75,
            look_hold: 0.25,
            look_speed: 520.0,
            max_look: 300.0,
            particle_capacity: DEFAULT_PARTICLE_CAP,
        }
    }
}

/// Held-key snapshot for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
    pub dash: bool,
    pub special: bool,
    pub heal: bool,
    pub look_up: bool,
    pub look_down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEvent {
    Jumped,
    Attacked,
    Dashed,
    Special,
    HealStarted { silk_spent: u32 },
    HealCancelled,
    HealCompleted { health: u32 },
    EnemyHit { health_left: u32 },
    EnemyDefeated,
    PlayerHurt { health_left: u32 },
    PlayerDefeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatOutcome {
    #[default]
    Ongoing,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Aabb,
    pub vel: Vec2,
    pub on_ground: bool,
    pub facing_right: bool,
    pub health: u32,
    pub silk: u32,
    pub attack_timer: f32,
    pub dash_timer: f32,
    pub special_timer: f32,
    pub healing: bool,
    pub heal_timer: f32,
    /// Vertical camera offset from looking up/down
    pub look_offset: f32,
    look_hold_timer: f32,
    look_dir: i8,
    heal_was_down: bool,
    attack_pending: bool,
}

impl Player {
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            body: Aabb::from_midbottom(
                Vec2::new(config.player_spawn_x, config.ground_y),
                config.player_size,
            ),
            vel: Vec2::ZERO,
            on_ground: false,
            facing_right: true,
            health: config.max_health,
            silk: 0,
            attack_timer: 0.0,
            dash_timer: 0.0,
            special_timer: 0.0,
            healing: false,
            heal_timer: 0.0,
            look_offset: 0.0,
            look_hold_timer: 0.0,
            look_dir: 0,
            heal_was_down: false,
            attack_pending: false,
        }
    }

    /// Apply held keys. Movement and jumping are ignored while channeling.
    pub fn handle_input(
        &mut self,
        input: &CombatInput,
        config: &CombatConfig,
        events: &mut Vec<CombatEvent>,
    ) {
        self.vel.x = 0.0;
        if !self.healing {
            if input.left {
                self.vel.x = -config.player_speed;
                self.facing_right = false;
            }
            if input.right {
                self.vel.x = config.player_speed;
                self.facing_right = true;
            }
            if input.jump && self.on_ground {
                self.vel.y = config.jump_velocity;
                self.on_ground = false;
                events.push(CombatEvent::Jumped);
            }
        }

        if input.attack && self.attack_timer <= 0.0 {
            self.attack_timer = config.attack_cooldown;
            self.attack_pending = true;
            events.push(CombatEvent::Attacked);
        }
        if input.dash && self.dash_timer <= 0.0 {
            self.dash_timer = config.dash_cooldown;
            events.push(CombatEvent::Dashed);
        }
        if input.special && self.special_timer <= 0.0 {
            self.special_timer = config.special_cooldown;
            events.push(CombatEvent::Special);
        }

        if input.heal && !self.heal_was_down {
            self.try_start_heal(config, events);
        }
        self.heal_was_down = input.heal;

        let dir = match (input.look_up, input.look_down) {
            (true, _) => -1,
            (false, true) => 1,
            _ => 0,
        };
        if dir != self.look_dir {
            self.look_hold_timer = 0.0;
            self.look_dir = dir;
        }
    }

    /// Spend all silk to begin a heal channel
    pub fn try_start_heal(&mut self, config: &CombatConfig, events: &mut Vec<CombatEvent>) -> bool {
        if self.healing || self.silk == 0 || self.health >= config.max_health {
            return false;
        }
        let spent = self.silk;
        self.silk = 0;
        self.healing = true;
        self.heal_timer = config.heal_channel;
        events.push(CombatEvent::HealStarted { silk_spent: spent });
        debug!("Heal channel started ({spent} silk)");
        true
    }

    /// Lose health. Interrupts a heal channel without refunding silk.
    pub fn take_damage(&mut self, amount: u32, events: &mut Vec<CombatEvent>) {
        self.health = self.health.saturating_sub(amount);
        if self.healing {
            self.healing = false;
            self.heal_timer = 0.0;
            events.push(CombatEvent::HealCancelled);
            debug!("Heal channel cancelled by damage");
        }
        events.push(CombatEvent::PlayerHurt {
            health_left: self.health,
        });
    }

    pub fn gain_silk(&mut self, amount: u32, config: &CombatConfig) {
        self.silk = (self.silk + amount).min(config.max_silk);
    }

    /// Melee box extending from the leading edge
    pub fn attack_box(&self, config: &CombatConfig) -> Aabb {
        let y = self.body.center().y - config.attack_height / 2.0;
        let x = if self.facing_right {
            self.body.right()
        } else {
            self.body.left() - config.attack_range
        };
        Aabb::new(x, y, config.attack_range, config.attack_height)
    }

    /// Consume the attack flag set by the last input
    pub fn take_attack(&mut self) -> bool {
        std::mem::take(&mut self.attack_pending)
    }

    pub fn update(&mut self, dt: f32, config: &CombatConfig, events: &mut Vec<CombatEvent>) {
        self.attack_timer = (self.attack_timer - dt).max(0.0);
        self.dash_timer = (self.dash_timer - dt).max(0.0);
        self.special_timer = (self.special_timer - dt).max(0.0);

        if self.healing {
            self.heal_timer -= dt;
            if self.heal_timer <= 0.0 {
                self.healing = false;
                self.heal_timer = 0.0;
                self.health = (self.health + config.heal_amount).min(config.max_health);
                events.push(CombatEvent::HealCompleted {
                    health: self.health,
                });
                debug!("Heal channel completed, health {}", self.health);
            }
        }

        if self.look_dir != 0 {
            self.look_hold_timer += dt;
            if self.look_hold_timer >= config.look_hold {
                self.look_offset = (self.look_offset
                    + self.look_dir as f32 * config.look_speed * dt)
                    .clamp(-config.max_look, config.max_look);
            }
        } else if self.look_offset.abs() > 1.0 {
            self.look_offset *= 0.85;
        } else {
            self.look_offset = 0.0;
        }

        self.vel.y += config.gravity * dt;
        self.body.pos += self.vel * dt;
        self.body.pos.x = self
            .body
            .pos
            .x
            .clamp(0.0, (config.world.x - self.body.size.x).max(0.0));

        if self.body.bottom() >= config.ground_y {
            self.body.set_bottom(config.ground_y);
            self.vel.y = 0.0;
            self.on_ground = true;
        }
        if self.body.top() < 0.0 {
            self.body.pos.y = 0.0;
            self.vel.y = 0.0;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub body: Aabb,
    pub health: u32,
    pub max_health: u32,
    pub speed: f32,
    /// +1 moving right, -1 moving left
    pub direction: f32,
    pub min_x: f32,
    pub max_x: f32,
}

impl Enemy {
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            body: Aabb::from_midbottom(
                Vec2::new(config.enemy_spawn_x, config.ground_y),
                config.enemy_size,
            ),
            health: config.enemy_max_health,
            max_health: config.enemy_max_health,
            speed: config.enemy_speed,
            direction: 1.0,
            min_x: config.enemy_bounds.0,
            max_x: config.enemy_bounds.1,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn facing_right(&self) -> bool {
        self.direction > 0.0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Walk between the bounds, turning around at either one
    pub fn update(&mut self, dt: f32) {
        self.body.pos.x += self.speed * self.direction * dt;
        if self.body.pos.x >= self.max_x {
            self.body.pos.x = self.max_x;
            self.direction = -1.0;
        } else if self.body.pos.x <= self.min_x {
            self.body.pos.x = self.min_x;
            self.direction = 1.0;
        }
    }
}

/// One player against one patrolling enemy
pub struct CombatLoop {
    pub config: CombatConfig,
    pub player: Player,
    pub enemy: Enemy,
    pub outcome: CombatOutcome,
    /// Time until contact damage can apply again
    pub contact_timer: f32,
    particles: ParticleSystem,
    events: Vec<CombatEvent>,
}

impl CombatLoop {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            player: Player::new(&config),
            enemy: Enemy::new(&config),
            particles: ParticleSystem::new(config.particle_capacity),
            outcome: CombatOutcome::Ongoing,
            contact_timer: 0.0,
            events: Vec::new(),
            config,
        }
    }

    pub fn reset(&mut self) {
        self.player = Player::new(&self.config);
        self.enemy = Enemy::new(&self.config);
        self.outcome = CombatOutcome::Ongoing;
        self.contact_timer = 0.0;
        self.particles.clear();
        self.events.clear();
    }

    /// Bring back a fresh enemy after a victory; the player keeps their state
    pub fn respawn_enemy(&mut self) {
        self.enemy = Enemy::new(&self.config);
        if self.outcome == CombatOutcome::Victory {
            self.outcome = CombatOutcome::Ongoing;
        }
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn update(&mut self, dt: f32, input: &CombatInput, rng: &mut dyn RandomSource) {
        if self.outcome != CombatOutcome::Ongoing {
            self.particles.update(dt, rng);
            return;
        }

        self.player.handle_input(input, &self.config, &mut self.events);
        self.player.update(dt, &self.config, &mut self.events);
        if self.enemy.is_alive() {
            self.enemy.update(dt);
        }
        self.contact_timer = (self.contact_timer - dt).max(0.0);

        if self.player.take_attack() && self.enemy.is_alive() {
            let hitbox = self.player.attack_box(&self.config);
            if hitbox.overlaps(&self.enemy.body) {
                self.enemy.take_damage(self.config.attack_damage);
                self.player.gain_silk(self.config.silk_per_hit, &self.config);
                let at = self.enemy.body.center();
                self.particles.spawn_sparks(at, 10, HIT_SPARK_COLOR, rng);
                self.events.push(CombatEvent::EnemyHit {
                    health_left: self.enemy.health,
                });
                if !self.enemy.is_alive() {
                    self.particles.spawn_smoke(at, 12, rng);
                    self.events.push(CombatEvent::EnemyDefeated);
                }
            }
        }

        // Contact damage runs independently of any attack this frame
        if self.enemy.is_alive()
            && self.contact_timer <= 0.0
            && self.player.body.overlaps(&self.enemy.body)
        {
            self.player
                .take_damage(self.config.contact_damage, &mut self.events);
            self.contact_timer = self.config.contact_cooldown;
            let at = self.player.body.center();
            self.particles.spawn_sparks(at, 6, HURT_SPARK_COLOR, rng);
            self.particles
                .add_floating_text(self.config.contact_damage as i32, at, rng);
            debug!("Contact damage, health {}", self.player.health);
        }

        self.particles.update(dt, rng);

        if self.player.health == 0 {
            self.outcome = CombatOutcome::Defeat;
            self.events.push(CombatEvent::PlayerDefeated);
        } else if !self.enemy.is_alive() {
            self.outcome = CombatOutcome::Victory;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use crate::sim::rng::SeededRandom;

    fn settle(lp: &mut CombatLoop, rng: &mut SeededRandom) {
        lp.update(FRAME_DT, &CombatInput::default(), rng);
        lp.drain_events();
    }

    /// Loop with the enemy parked far away from the player
    fn quiet_loop() -> CombatLoop {
        let config = CombatConfig {
            enemy_spawn_x: 900.0,
            enemy_bounds: (880.0, 900.0),
            ..CombatConfig::default()
        };
        CombatLoop::new(config)
    }

    #[test]
    fn test_player_lands_on_ground() {
        let mut lp = quiet_loop();
        let mut rng = SeededRandom::new(1);
        settle(&mut lp, &mut rng);
        assert!(lp.player.on_ground);
        assert_eq!(lp.player.body.bottom(), 500.0);
    }

    #[test]
    fn test_jump_and_fall_back() {
        let mut lp = quiet_loop();
        let mut rng = SeededRandom::new(1);
        settle(&mut lp, &mut rng);
        let jump = CombatInput {
            jump: true,
            ..CombatInput::default()
        };
        lp.update(FRAME_DT, &jump, &mut rng);
        assert!(!lp.player.on_ground);
        assert!(lp.player.body.bottom() < 500.0);
        for _ in 0..120 {
            lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        }
        assert!(lp.player.on_ground);
        assert_eq!(lp.player.body.bottom(), 500.0);
    }

    #[test]
    fn test_instant_horizontal_speed() {
        let mut lp = quiet_loop();
        let mut rng = SeededRandom::new(1);
        let right = CombatInput {
            right: true,
            ..CombatInput::default()
        };
        lp.update(0.1, &right, &mut rng);
        assert_eq!(lp.player.vel.x, 300.0);
        assert!(lp.player.facing_right);
        lp.update(0.1, &CombatInput::default(), &mut rng);
        assert_eq!(lp.player.vel.x, 0.0);
    }

    #[test]
    fn test_top_clamp() {
        let mut lp = quiet_loop();
        let mut rng = SeededRandom::new(1);
        lp.player.vel.y = -100_000.0;
        lp.update(0.1, &CombatInput::default(), &mut rng);
        assert_eq!(lp.player.body.top(), 0.0);
        assert_eq!(lp.player.vel.y, 0.0);
    }

    #[test]
    fn test_heal_channel_spends_all_silk() {
        let mut lp = quiet_loop();
        let mut rng = SeededRandom::new(2);
        lp.player.health = 1;
        lp.player.silk = 5;
        let heal = CombatInput {
            heal: true,
            ..CombatInput::default()
        };
        lp.update(FRAME_DT, &heal, &mut rng);
        assert!(lp.player.healing);
        assert_eq!(lp.player.silk, 0);
        assert_eq!(lp.player.health, 1);

        lp.update(1.0, &heal, &mut rng);
        assert_eq!(lp.player.health, 1);
        lp.update(1.0, &CombatInput::default(), &mut rng);
        assert!(!lp.player.healing);
        assert_eq!(lp.player.health, 4);
    }

    #[test]
    fn test_heal_is_edge_triggered() {
        let mut lp = quiet_loop();
        let mut rng = SeededRandom::new(3);
        lp.player.health = 1;
        let heal = CombatInput {
            heal: true,
            ..CombatInput::default()
        };
        lp.update(FRAME_DT, &heal, &mut rng);
        assert!(!lp.player.healing);
        lp.player.silk = 2;
        lp.update(FRAME_DT, &heal, &mut rng);
        assert!(!lp.player.healing, "held key must not start a channel");
        lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        lp.update(FRAME_DT, &heal, &mut rng);
        assert!(lp.player.healing);
    }

    #[test]
    fn test_heal_needs_missing_health() {
        let config = CombatConfig::default();
        let mut player = Player::new(&config);
        let mut events = Vec::new();
        player.silk = 3;
        assert!(!player.try_start_heal(&config, &mut events));
        assert_eq!(player.silk, 3);
    }

    #[test]
    fn test_damage_cancels_heal_without_refund() {
        let config = CombatConfig::default();
        let mut player = Player::new(&config);
        let mut events = Vec::new();
        player.health = 2;
        player.silk = 4;
        assert!(player.try_start_heal(&config, &mut events));
        player.update(1.5, &config, &mut events);
        player.take_damage(1, &mut events);
        assert!(!player.healing);
        assert_eq!(player.silk, 0);
        player.update(1.0, &config, &mut events);
        assert_eq!(player.health, 1);
        assert!(events.contains(&CombatEvent::HealCancelled));
    }

    #[test]
    fn test_channel_blocks_movement() {
        let config = CombatConfig::default();
        let mut player = Player::new(&config);
        let mut events = Vec::new();
        player.health = 2;
        player.silk = 1;
        player.try_start_heal(&config, &mut events);
        let input = CombatInput {
            left: true,
            ..CombatInput::default()
        };
        player.handle_input(&input, &config, &mut events);
        assert_eq!(player.vel.x, 0.0);
    }

    #[test]
    fn test_attack_hits_and_grants_silk() {
        let mut lp = CombatLoop::new(CombatConfig {
            enemy_speed: 0.0,
            ..CombatConfig::default()
        });
        let mut rng = SeededRandom::new(4);
        settle(&mut lp, &mut rng);
        // Stand just left of the enemy, facing it
        lp.player.body.pos.x = lp.enemy.body.left() - lp.player.body.size.x - 10.0;
        let attack = CombatInput {
            attack: true,
            ..CombatInput::default()
        };
        lp.update(FRAME_DT, &attack, &mut rng);
        assert_eq!(lp.enemy.health, 1);
        assert_eq!(lp.player.silk, 1);

        // Still cooling down
        lp.update(FRAME_DT, &attack, &mut rng);
        assert_eq!(lp.enemy.health, 1);

        for _ in 0..12 {
            lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        }
        lp.update(FRAME_DT, &attack, &mut rng);
        assert_eq!(lp.enemy.health, 0);
        assert_eq!(lp.outcome, CombatOutcome::Victory);
        assert!(lp.drain_events().contains(&CombatEvent::EnemyDefeated));
    }

    #[test]
    fn test_attack_facing_away_misses() {
        let mut lp = CombatLoop::new(CombatConfig {
            enemy_speed: 0.0,
            ..CombatConfig::default()
        });
        let mut rng = SeededRandom::new(5);
        settle(&mut lp, &mut rng);
        lp.player.body.pos.x = lp.enemy.body.left() - lp.player.body.size.x - 10.0;
        lp.player.facing_right = false;
        let attack = CombatInput {
            attack: true,
            ..CombatInput::default()
        };
        lp.update(FRAME_DT, &attack, &mut rng);
        assert_eq!(lp.enemy.health, 2);
        assert_eq!(lp.player.silk, 0);
    }

    #[test]
    fn test_contact_damage_cooldown() {
        let mut lp = CombatLoop::new(CombatConfig {
            enemy_speed: 0.0,
            ..CombatConfig::default()
        });
        let mut rng = SeededRandom::new(6);
        settle(&mut lp, &mut rng);
        lp.player.body.pos.x = lp.enemy.body.left();
        for _ in 0..3 {
            lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        }
        assert_eq!(lp.player.health, 3);
        let hurts = lp
            .drain_events()
            .iter()
            .filter(|e| matches!(e, CombatEvent::PlayerHurt { .. }))
            .count();
        assert_eq!(hurts, 1);

        for _ in 0..45 {
            lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        }
        assert_eq!(lp.player.health, 2);
    }

    #[test]
    fn test_enemy_patrol_reverses() {
        let config = CombatConfig::default();
        let mut enemy = Enemy::new(&config);
        enemy.body.pos.x = 790.0;
        enemy.update(0.1);
        assert_eq!(enemy.body.pos.x, 800.0);
        assert!(!enemy.facing_right());
        enemy.body.pos.x = 460.0;
        enemy.update(0.1);
        assert_eq!(enemy.body.pos.x, 450.0);
        assert!(enemy.facing_right());
    }

    #[test]
    fn test_look_pan() {
        let config = CombatConfig::default();
        let mut player = Player::new(&config);
        let mut events = Vec::new();
        let up = CombatInput {
            look_up: true,
            ..CombatInput::default()
        };
        player.handle_input(&up, &config, &mut events);
        player.update(0.2, &config, &mut events);
        assert_eq!(player.look_offset, 0.0);
        player.update(0.1, &config, &mut events);
        assert!((player.look_offset + 52.0).abs() < 1e-3);
        for _ in 0..20 {
            player.update(0.1, &config, &mut events);
        }
        assert_eq!(player.look_offset, -300.0);

        player.handle_input(&CombatInput::default(), &config, &mut events);
        player.update(0.016, &config, &mut events);
        assert!((player.look_offset + 255.0).abs() < 1e-3);
    }

    #[test]
    fn test_defeat() {
        let mut lp = CombatLoop::new(CombatConfig {
            enemy_speed: 0.0,
            ..CombatConfig::default()
        });
        let mut rng = SeededRandom::new(7);
        settle(&mut lp, &mut rng);
        lp.player.health = 1;
        lp.player.body.pos.x = lp.enemy.body.left();
        lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        assert_eq!(lp.outcome, CombatOutcome::Defeat);
        let before = lp.player.clone();
        lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
        assert_eq!(lp.player, before);
    }
}
