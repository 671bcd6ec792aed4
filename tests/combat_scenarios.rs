//! Scripted fights through the public combat API

use shadowsilk::Rgb;
use shadowsilk::consts::FRAME_DT;
use shadowsilk::sim::{
    CombatConfig, CombatEvent, CombatInput, CombatLoop, CombatOutcome, ParticleSystem,
    SeededRandom,
};

fn still_enemy() -> CombatLoop {
    CombatLoop::new(CombatConfig {
        enemy_speed: 0.0,
        ..CombatConfig::default()
    })
}

fn held(f: impl FnOnce(&mut CombatInput)) -> CombatInput {
    let mut input = CombatInput::default();
    f(&mut input);
    input
}

#[test]
fn test_walk_up_and_defeat_enemy() {
    let mut lp = still_enemy();
    let mut rng = SeededRandom::new(11);
    let right = held(|i| i.right = true);
    let attack = held(|i| i.attack = true);

    let mut frames = 0;
    while lp.enemy.body.left() - lp.player.body.right() >= 30.0 {
        lp.update(FRAME_DT, &right, &mut rng);
        frames += 1;
        assert!(frames < 300, "never reached the enemy");
    }
    assert!(lp.player.facing_right);

    for _ in 0..30 {
        lp.update(FRAME_DT, &attack, &mut rng);
    }
    assert_eq!(lp.outcome, CombatOutcome::Victory);
    assert_eq!(lp.player.silk, 2);
    assert_eq!(lp.player.health, lp.config.max_health);

    let events = lp.drain_events();
    let hits = events
        .iter()
        .filter(|e| matches!(e, CombatEvent::EnemyHit { .. }))
        .count();
    assert_eq!(hits, 2);
    assert!(events.contains(&CombatEvent::EnemyDefeated));
    assert!(!lp.particles().is_empty());
}

#[test]
fn test_heal_lands_only_after_full_channel() {
    let mut lp = still_enemy();
    let mut rng = SeededRandom::new(12);
    lp.player.health = 2;
    lp.player.silk = 3;

    lp.update(FRAME_DT, &held(|i| i.heal = true), &mut rng);
    assert!(lp.player.healing);
    assert_eq!(lp.player.silk, 0);

    for _ in 0..110 {
        lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
    }
    assert_eq!(lp.player.health, 2);
    for _ in 0..20 {
        lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
    }
    assert!(!lp.player.healing);
    assert_eq!(lp.player.health, 4);
    assert!(
        lp.drain_events()
            .contains(&CombatEvent::HealCompleted { health: 4 })
    );
}

#[test]
fn test_victory_freezes_until_respawn() {
    let mut lp = still_enemy();
    let mut rng = SeededRandom::new(13);
    lp.enemy.health = 0;
    lp.update(FRAME_DT, &CombatInput::default(), &mut rng);
    assert_eq!(lp.outcome, CombatOutcome::Victory);

    let x = lp.player.body.pos.x;
    lp.update(FRAME_DT, &held(|i| i.right = true), &mut rng);
    assert_eq!(lp.player.body.pos.x, x);

    lp.respawn_enemy();
    assert_eq!(lp.outcome, CombatOutcome::Ongoing);
    assert_eq!(lp.enemy.health, lp.config.enemy_max_health);
    lp.update(FRAME_DT, &held(|i| i.right = true), &mut rng);
    assert!(lp.player.body.pos.x > x);
}

#[test]
fn test_particle_cap_holds_under_burst() {
    let mut particles = ParticleSystem::new(500);
    let mut rng = SeededRandom::new(14);
    particles.spawn_sparks(glam::Vec2::new(100.0, 100.0), 450, Rgb::WHITE, &mut rng);
    assert_eq!(particles.len(), 450);
    particles.spawn_sparks(glam::Vec2::new(100.0, 100.0), 600, Rgb::WHITE, &mut rng);
    assert_eq!(particles.len(), 500);
}
