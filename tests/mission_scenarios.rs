//! End-to-end mission runs with forced hack outcomes

use shadowsilk::consts::FRAME_DT;
use shadowsilk::sim::{
    ActionResult, Difficulty, MissionAction, MissionConfig, MissionEvent, MissionPhase,
    MissionSimulation, Perks, ScriptedRandom, SeededRandom,
};

fn playing(config: MissionConfig) -> MissionSimulation {
    let mut rng = SeededRandom::new(42);
    let mut sim = MissionSimulation::new(config, Difficulty::Normal, Perks::default(), &mut rng);
    sim.start(&mut rng);
    sim.drain_events();
    sim
}

/// Rolls high: no spawns, no guard spots
fn quiet() -> ScriptedRandom {
    ScriptedRandom::constant(0.99)
}

fn hack_until(sim: &mut MissionSimulation, times: usize, roll: f32) {
    let mut rng = ScriptedRandom::constant(roll);
    for _ in 0..times {
        sim.cooldowns.clear();
        let result = sim.perform(MissionAction::Hack, &mut rng);
        assert!(matches!(
            result,
            ActionResult::HackSucceeded { .. } | ActionResult::HackFailed { .. }
        ));
    }
}

#[test]
fn test_five_forced_hacks_win_and_bank_credits() {
    let mut sim = playing(MissionConfig {
        hack_progress_gain: 1,
        ..MissionConfig::default()
    });
    sim.pending_credits = 3;

    hack_until(&mut sim, 5, 0.0);
    assert_eq!(sim.objective_progress, 5);
    assert!((sim.detection - 22.5).abs() < 1e-4);
    assert_eq!(sim.phase, MissionPhase::Playing);

    sim.update(FRAME_DT, &mut quiet());
    assert_eq!(sim.phase, MissionPhase::Success);
    assert_eq!(sim.currency, 3);
    assert_eq!(sim.pending_credits, 0);
    assert_eq!(sim.best_objectives, 5);

    let ended = sim
        .drain_events()
        .into_iter()
        .find(|e| matches!(e, MissionEvent::Ended { .. }));
    assert_eq!(
        ended,
        Some(MissionEvent::Ended {
            success: true,
            credits_banked: 3
        })
    );
}

#[test]
fn test_failed_hacks_fail_mission_and_forfeit_pending() {
    let mut sim = playing(MissionConfig::default());
    sim.currency = 7;
    sim.pending_credits = 4;

    hack_until(&mut sim, 7, 0.99);
    assert_eq!(sim.detection, 100.0);
    assert_eq!(sim.objective_progress, 0);

    sim.update(FRAME_DT, &mut quiet());
    assert_eq!(sim.phase, MissionPhase::Failure);
    assert_eq!(sim.pending_credits, 0);
    assert_eq!(sim.currency, 7);
}

#[test]
fn test_hack_chance_at_reference_points() {
    let mut sim = playing(MissionConfig::default());
    assert_eq!(sim.hack_success_chance(), 0.85);
    sim.detection = 60.0;
    assert_eq!(sim.hack_success_chance(), 0.4);
}

#[test]
fn test_finished_mission_ignores_actions() {
    let mut sim = playing(MissionConfig::default());
    sim.objective_progress = 5;
    sim.update(FRAME_DT, &mut quiet());
    assert!(sim.phase.is_over());
    assert_eq!(
        sim.perform(MissionAction::Hack, &mut quiet()),
        ActionResult::Unavailable
    );
}
