//! Scene drawing onto a `Canvas`
//!
//! Everything degrades: a missing sprite falls back to a coloured shape,
//! a missing background to a solid fill. Text is not rasterised; floating
//! numbers and HUD values are drawn as bars and markers.

use std::collections::HashMap;

use glam::Vec2;

use super::canvas::Canvas;
use crate::Rgb;
use crate::sim::{
    Aabb, CombatLoop, Guard, MissionSimulation, ParticleLook, ParticleSystem,
};

pub const GUARD_SPRITE: &str = "guard";

const BACKGROUND: Rgb = Rgb(12, 14, 22);
const MONITOR_COLOR: Rgb = Rgb(28, 34, 48);
const DANGER_TINT: Rgb = Rgb(120, 30, 30);
const GUARD_COLOR: Rgb = Rgb(220, 200, 60);
const GUARD_ALERT_COLOR: Rgb = Rgb(240, 60, 60);
const GUARD_RADIUS: f32 = 10.0;
const OBJECTIVE_COLOR: Rgb = Rgb(80, 220, 255);
const HUD_TRACK: Rgb = Rgb::DARK_GRAY;
const TIME_COLOR: Rgb = Rgb(90, 170, 255);
const DETECTION_LOW: Rgb = Rgb(60, 200, 90);
const DETECTION_HIGH: Rgb = Rgb(230, 50, 50);
const CREDIT_COLOR: Rgb = Rgb(255, 215, 0);

const STAGE_COLOR: Rgb = Rgb(20, 16, 26);
const GROUND_COLOR: Rgb = Rgb(60, 48, 40);
const PLAYER_COLOR: Rgb = Rgb(200, 40, 60);
const PLAYER_HEAL_COLOR: Rgb = Rgb(255, 255, 255);
const ENEMY_COLOR: Rgb = Rgb(110, 170, 70);
const SLASH_COLOR: Rgb = Rgb(240, 240, 255);
const SILK_COLOR: Rgb = Rgb(230, 230, 230);

/// Decoded images by name
#[derive(Debug, Default, Clone)]
pub struct SpriteBank {
    images: HashMap<String, Canvas>,
}

impl SpriteBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, image: Canvas) {
        self.images.insert(name.into(), image);
    }

    pub fn get(&self, name: &str) -> Option<&Canvas> {
        self.images.get(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn rect_i32(r: &Aabb) -> (i32, i32, i32, i32) {
    (r.pos.x as i32, r.pos.y as i32, r.size.x as i32, r.size.y as i32)
}

/// Horizontal meter: track plus a fill of `fraction` of its width
pub fn draw_meter(canvas: &mut Canvas, rect: Aabb, fraction: f32, color: Rgb) {
    let (x, y, w, h) = rect_i32(&rect);
    canvas.fill_rect(x, y, w, h, HUD_TRACK, 255);
    let fill = (w as f32 * fraction.clamp(0.0, 1.0)) as i32;
    canvas.fill_rect(x, y, fill, h, color, 255);
    canvas.stroke_rect(x, y, w, h, Rgb::WHITE);
}

/// Row of `total` pips with the first `filled` lit
pub fn draw_pips(canvas: &mut Canvas, origin: Vec2, total: u32, filled: u32, color: Rgb) {
    for i in 0..total {
        let x = origin.x as i32 + i as i32 * 16;
        let y = origin.y as i32;
        if i < filled {
            canvas.fill_rect(x, y, 12, 12, color, 255);
        } else {
            canvas.stroke_rect(x, y, 12, 12, color);
        }
    }
}

pub fn draw_particles(canvas: &mut Canvas, particles: &ParticleSystem, sprites: &SpriteBank, offset: Vec2) {
    for p in particles.particles() {
        let pos = p.pos + offset;
        let alpha = p.alpha();
        match &p.look {
            ParticleLook::Sprite { name, fallback } => match sprites.get(name) {
                Some(img) => {
                    let x = pos.x as i32 - img.width() as i32 / 2;
                    let y = pos.y as i32 - img.height() as i32 / 2;
                    canvas.blit(img, x, y, alpha);
                }
                None => canvas.fill_circle(pos, p.size, *fallback, alpha),
            },
            ParticleLook::Color(color) => canvas.fill_circle(pos, p.size, *color, alpha),
        }
    }

    // Floating numbers: a fading marker sized by the text
    for t in particles.floating_texts() {
        let pos = t.pos + offset;
        let w = t.text.len() as i32 * 6;
        canvas.fill_rect(pos.x as i32 - w / 2, pos.y as i32 - 4, w, 8, t.color, t.alpha());
    }
}

pub fn draw_guard(canvas: &mut Canvas, guard: &Guard, sprites: &SpriteBank, offset: Vec2) {
    let pos = guard.world_position() + offset;
    let frame = guard.animation().and_then(|a| a.current_frame());
    match (frame, sprites.get(GUARD_SPRITE)) {
        (Some(frame), Some(sheet)) => {
            let x = pos.x as i32 - frame.w as i32 / 2;
            let y = pos.y as i32 - frame.h as i32 / 2;
            canvas.blit_region(sheet, frame, x, y, 255);
        }
        _ => {
            let color = if guard.alert { GUARD_ALERT_COLOR } else { GUARD_COLOR };
            canvas.fill_circle(pos, GUARD_RADIUS, color, 255);
        }
    }
    if guard.alert && guard.alert_flash {
        // "!" above the head
        canvas.fill_rect(pos.x as i32 - 2, pos.y as i32 - 34, 4, 10, GUARD_ALERT_COLOR, 255);
        canvas.fill_rect(pos.x as i32 - 2, pos.y as i32 - 21, 4, 4, GUARD_ALERT_COLOR, 255);
    }
}

/// Terminal view: monitors with patrolling guards, pickups and the HUD
pub fn draw_mission(canvas: &mut Canvas, sim: &MissionSimulation, sprites: &SpriteBank, shake: Vec2) {
    canvas.fill(BACKGROUND);

    let (zone_start, zone_end) = sim.config.danger_zone;
    for guard in &sim.guards {
        let route = Aabb {
            pos: guard.route.pos + shake,
            size: guard.route.size,
        };
        let (x, y, w, h) = rect_i32(&route);
        let monitor = if sim.cameras_disabled && sim.camera_blink <= 0.0 {
            Rgb::BLACK
        } else {
            MONITOR_COLOR
        };
        canvas.fill_rect(x, y, w, h, monitor, 255);
        let zx = x + (w as f32 * zone_start) as i32;
        let zw = (w as f32 * (zone_end - zone_start)) as i32;
        let zone_alpha = if sim.lights_disabled { 40 } else { 90 };
        canvas.fill_rect(zx, y, zw, h, DANGER_TINT, zone_alpha);
        canvas.stroke_rect(x, y, w, h, Rgb::GRAY);
        draw_guard(canvas, guard, sprites, shake);
    }

    for obj in &sim.secondary_objectives {
        canvas.fill_circle(obj.pos + shake, 8.0, OBJECTIVE_COLOR, 255);
    }

    draw_particles(canvas, sim.particles(), sprites, shake);

    // HUD is not shaken
    let cfg = &sim.config;
    draw_meter(
        canvas,
        Aabb::new(20.0, 20.0, 300.0, 16.0),
        sim.hud.time / cfg.mission_time.max(f32::EPSILON),
        TIME_COLOR,
    );
    let detection = sim.hud.detection / cfg.max_detection.max(f32::EPSILON);
    draw_meter(
        canvas,
        Aabb::new(20.0, 48.0, 300.0, 16.0),
        detection,
        DETECTION_LOW.lerp(DETECTION_HIGH, detection),
    );
    draw_pips(
        canvas,
        Vec2::new(20.0, 76.0),
        cfg.objectives_needed,
        sim.hud.objectives.round() as u32,
        OBJECTIVE_COLOR,
    );
    if sim.credit_flash > 0.0 {
        let alpha = (sim.credit_flash / 2.0 * 255.0).clamp(0.0, 255.0) as u8;
        canvas.fill_rect(340, 20, 60, 16, CREDIT_COLOR, alpha);
    }
}

/// Side-on arena: ground, fighter, enemy and the resource HUD
pub fn draw_combat(canvas: &mut Canvas, combat: &CombatLoop, sprites: &SpriteBank, shake: Vec2) {
    canvas.fill(STAGE_COLOR);
    // Looking up/down pans the world the other way
    let camera = shake - Vec2::new(0.0, combat.player.look_offset);
    let cfg = &combat.config;

    let ground_y = (cfg.ground_y + camera.y) as i32;
    canvas.fill_rect(0, ground_y, cfg.world.x as i32, cfg.world.y as i32, GROUND_COLOR, 255);

    if combat.enemy.is_alive() {
        let body = Aabb {
            pos: combat.enemy.body.pos + camera,
            size: combat.enemy.body.size,
        };
        let (x, y, w, h) = rect_i32(&body);
        canvas.fill_rect(x, y, w, h, ENEMY_COLOR, 255);
    }

    let player = &combat.player;
    let body = Aabb {
        pos: player.body.pos + camera,
        size: player.body.size,
    };
    let (x, y, w, h) = rect_i32(&body);
    let color = if player.healing { PLAYER_HEAL_COLOR } else { PLAYER_COLOR };
    canvas.fill_rect(x, y, w, h, color, 255);

    if player.attack_timer > 0.0 {
        let slash = player.attack_box(cfg);
        let slash = Aabb {
            pos: slash.pos + camera,
            size: slash.size,
        };
        let (sx, sy, sw, sh) = rect_i32(&slash);
        canvas.fill_rect(sx, sy, sw, sh, SLASH_COLOR, 120);
    }

    draw_particles(canvas, combat.particles(), sprites, camera);

    draw_pips(
        canvas,
        Vec2::new(20.0, 20.0),
        cfg.max_health,
        player.health,
        PLAYER_COLOR,
    );
    draw_meter(
        canvas,
        Aabb::new(20.0, 40.0, 144.0, 10.0),
        player.silk as f32 / cfg.max_silk.max(1) as f32,
        SILK_COLOR,
    );
    if player.healing {
        draw_meter(
            canvas,
            Aabb::new(20.0, 56.0, 144.0, 6.0),
            player.heal_timer / cfg.heal_channel.max(f32::EPSILON),
            PLAYER_HEAL_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Difficulty, MissionConfig, Perks, ScriptedRandom};

    #[test]
    fn test_meter_fill() {
        let mut c = Canvas::filled(100, 20, Rgb::BLACK);
        draw_meter(&mut c, Aabb::new(0.0, 0.0, 100.0, 20.0), 0.5, Rgb::GREEN);
        assert_eq!(c.pixel(25, 10).unwrap().rgb(), Rgb::GREEN);
        assert_eq!(c.pixel(75, 10).unwrap().rgb(), HUD_TRACK);
    }

    #[test]
    fn test_guard_falls_back_to_circle() {
        let mut c = Canvas::filled(1000, 700, Rgb::BLACK);
        let mut guard = Guard::new(1, 8.0, Aabb::new(100.0, 150.0, 800.0, 40.0));
        guard.position = 0.5;
        draw_guard(&mut c, &guard, &SpriteBank::new(), Vec2::ZERO);
        assert_eq!(c.pixel(500, 170).unwrap().rgb(), GUARD_COLOR);

        guard.set_alert();
        guard.update(0.0);
        draw_guard(&mut c, &guard, &SpriteBank::new(), Vec2::ZERO);
        let at = guard.world_position();
        assert_eq!(c.pixel(at.x as u32, at.y as u32).unwrap().rgb(), GUARD_ALERT_COLOR);
    }

    #[test]
    fn test_mission_frame_draws() {
        let mut rng = ScriptedRandom::constant(0.5);
        let sim = MissionSimulation::new(MissionConfig::default(), Difficulty::Normal, Perks::default(), &mut rng);
        let mut c = Canvas::new(1000, 700);
        draw_mission(&mut c, &sim, &SpriteBank::new(), Vec2::ZERO);
        assert_eq!(c.pixel(5, 690).unwrap().rgb(), BACKGROUND);
        assert_eq!(c.pixel(150, 160).unwrap().rgb(), MONITOR_COLOR);
    }

    #[test]
    fn test_combat_frame_draws_player() {
        let combat = CombatLoop::new(Default::default());
        let mut c = Canvas::new(1000, 700);
        draw_combat(&mut c, &combat, &SpriteBank::new(), Vec2::ZERO);
        let center = combat.player.body.center();
        assert_eq!(c.pixel(center.x as u32, center.y as u32).unwrap().rgb(), PLAYER_COLOR);
    }
}
