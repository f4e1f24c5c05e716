//! Battle scenario tests.
//!
//! These drive whole simulation steps with hand-placed agents and the
//! scripted random source, so every position and timer is exact.

use battle_core::combat::{explosion_area, KillCause};
use battle_core::components::{AgentKind, HeroKind};
use battle_core::math::Vec2;
use battle_core::population::AgentSpawnParams;
use battle_core::progression::Outcome;
use battle_core::simulation::RunState;
use battle_test_utils::fixtures::{
    gunner_at, hero_at, run_to_completion, scripted_simulation, seeded_simulation, special_at,
    swordsman_at,
};

#[test]
fn test_hero_clears_nine_gunners_and_wins() {
    let mut sim = scripted_simulation();
    let hero = sim.spawn_agent(hero_at(HeroKind::Superman, 500.0, 500.0));
    let gunners: Vec<_> = (0..9)
        .map(|i| sim.spawn_agent(gunner_at(100.0 + 60.0 * i as f32, 100.0)))
        .collect();

    assert_eq!(sim.agent(hero).unwrap().health.current, 200);
    assert!(gunners
        .iter()
        .all(|&id| sim.agent(id).unwrap().health.current == 100));

    for &gunner in &gunners {
        let beside = sim.agent(hero).unwrap().position + Vec2::new(15.0, 0.0);
        sim.agent_mut(gunner).unwrap().position = beside;
        sim.step(1.0);
        assert!(!sim.agent(gunner).unwrap().alive);
    }

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.alive, 1);
    assert_eq!(sim.agent(hero).unwrap().kills, 9);

    let winner = sim.winner().expect("hero should win");
    assert_eq!(winner.id, hero);
    assert_eq!(winner.kills, 9);
    assert_eq!(winner.kind, AgentKind::Hero(HeroKind::Superman));
}

#[test]
fn test_hero_contact_grows_the_hero() {
    let mut sim = scripted_simulation();
    let hero = sim.spawn_agent(hero_at(HeroKind::Batman, 300.0, 300.0));
    let victim = sim.spawn_agent(special_at(320.0, 300.0));
    sim.spawn_agent(gunner_at(900.0, 600.0));

    let before = sim.agent(hero).unwrap().clone();
    sim.step(1.0);
    let after = sim.agent(hero).unwrap();

    assert!(!sim.agent(victim).unwrap().alive);
    assert_eq!(after.kills, before.kills + 1);
    assert!(after.radius >= before.radius);
    assert!(after.speed() >= before.speed());
    assert_eq!(sim.last_events().kills[0].cause, KillCause::HeroContact);
}

#[test]
fn test_touching_heroes_annihilate_and_explode() {
    let mut sim = scripted_simulation();
    let superman = sim.spawn_agent(hero_at(HeroKind::Superman, 500.0, 350.0));
    let batman = sim.spawn_agent(hero_at(HeroKind::Batman, 520.0, 350.0));
    let inside = sim.spawn_agent(gunner_at(510.0, 200.0));
    let outside = sim.spawn_agent(gunner_at(50.0, 50.0));

    sim.step(1.0);

    assert!(!sim.agent(superman).unwrap().alive);
    assert!(!sim.agent(batman).unwrap().alive);
    assert_eq!(sim.agent(superman).unwrap().kills, 0);
    assert_eq!(sim.agent(batman).unwrap().kills, 0);
    assert!(!sim.agent(inside).unwrap().alive);
    assert!(sim.agent(outside).unwrap().alive);

    let events = sim.last_events();
    assert_eq!(events.explosions.len(), 1);
    let explosion = events.explosions[0];
    assert_eq!(explosion.heroes, (superman, batman));
    assert_eq!(explosion.center, Vec2::new(510.0, 350.0));
    assert_eq!(explosion.area, explosion_area(&sim.config().field, explosion.center));
    assert!((explosion.area.area() - 1000.0 * 700.0 / 4.0).abs() < 1.0);
    assert!(events.kills.iter().all(|k| k.killer.is_none()));

    assert_eq!(sim.winner().map(|w| w.id), Some(outside));
}

#[test]
fn test_explosion_near_corner_stays_in_bounds() {
    let mut sim = scripted_simulation();
    sim.spawn_agent(hero_at(HeroKind::Superman, 30.0, 30.0));
    sim.spawn_agent(hero_at(HeroKind::Batman, 40.0, 50.0));
    sim.spawn_agent(gunner_at(900.0, 650.0));

    sim.step(1.0);

    let area = sim.last_events().explosions[0].area;
    assert_eq!(area.left, 0.0);
    assert_eq!(area.top, 0.0);
    assert!(area.right() <= 1000.0);
    assert!(area.bottom() <= 700.0);
}

#[test]
fn test_lethal_projectile_credits_owner_once() {
    let mut sim = scripted_simulation();
    let shooter = sim.spawn_agent(AgentSpawnParams {
        damage: Some(20),
        fire_interval: Some(5.0),
        ..gunner_at(100.0, 350.0)
    });
    let target = sim.spawn_agent(AgentSpawnParams {
        health: Some(15),
        ..swordsman_at(140.0, 350.0)
    });

    run_to_completion(&mut sim, 1.0, 100);

    assert!(!sim.agent(target).unwrap().alive);
    assert_eq!(sim.agent(shooter).unwrap().kills, 1);
    assert!(sim.snapshot().projectiles.is_empty());
    assert_eq!(sim.winner().map(|w| w.id), Some(shooter));
}

#[test]
fn test_melee_damages_heroes() {
    let mut sim = scripted_simulation();
    let hero = sim.spawn_agent(AgentSpawnParams {
        swing_interval: Some(10_000.0),
        ..hero_at(HeroKind::Superman, 300.0, 300.0)
    });
    // Outside hero contact range, inside sword reach.
    sim.spawn_agent(AgentSpawnParams {
        damage: Some(50),
        swing_interval: Some(1.0),
        ..swordsman_at(325.0, 300.0)
    });
    sim.spawn_agent(gunner_at(900.0, 600.0));

    sim.step(1.0);

    assert_eq!(sim.agent(hero).unwrap().health.current, 150);
    assert!(sim.agent(hero).unwrap().alive);
}

#[test]
fn test_wall_contact_clamps_and_flips_once() {
    let mut sim = scripted_simulation();
    let runner = sim.spawn_agent(AgentSpawnParams {
        velocity: Vec2::new(-0.5, 0.0),
        ..gunner_at(5.0, 350.0)
    });
    sim.spawn_agent(gunner_at(900.0, 350.0));

    sim.step(1.0);
    let agent = sim.agent(runner).unwrap();
    assert_eq!(agent.position.x, 10.0);
    assert_eq!(agent.velocity.x, 0.5);

    sim.step(1.0);
    let agent = sim.agent(runner).unwrap();
    assert!((agent.position.x - 10.5).abs() < 1e-5);
    assert_eq!(agent.velocity.x, 0.5);
}

#[test]
fn test_reset_twice_restores_clean_state() {
    let mut sim = seeded_simulation(80, 11);
    for _ in 0..200 {
        sim.step(1.5);
    }

    sim.reset(40);
    sim.reset(40);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.population, 40);
    assert_eq!(snapshot.alive, 40);
    assert_eq!(snapshot.frame, 0);
    assert!(snapshot.projectiles.is_empty());
    assert!(snapshot.particles.is_empty());
    assert!(snapshot.agents.iter().all(|a| a.kills == 0));
    assert_eq!(snapshot.run_state, RunState::Running);
}

#[test]
fn test_reset_population_has_heroes_and_special() {
    let mut sim = seeded_simulation(0, 5);
    sim.reset(50);
    let agents = sim.snapshot().agents;

    let heroes: Vec<_> = agents.iter().filter_map(|a| a.kind.hero_kind()).collect();
    assert_eq!(heroes.len(), 2);
    assert_ne!(heroes[0], heroes[1]);
    assert_eq!(
        agents
            .iter()
            .filter(|a| a.kind == AgentKind::SpecialCharacter)
            .count(),
        1
    );
}

#[test]
fn test_seeded_match_outcome_is_consistent() {
    let mut sim = seeded_simulation(40, 2024);
    let frames = run_to_completion(&mut sim, 2.0, 20_000);
    assert!(frames <= 20_000);

    match sim.outcome() {
        Some(Outcome::Winner(report)) => {
            let agent = sim.agent(report.id).unwrap();
            assert!(agent.alive);
            assert_eq!(sim.snapshot().alive, 1);
            assert_eq!(report.kills, agent.kills);
            assert!(report.headline().starts_with("Player #"));
        }
        Some(Outcome::Draw) => assert_eq!(sim.snapshot().alive, 0),
        None => assert!(sim.snapshot().alive >= 2),
    }
}

#[test]
fn test_scripted_reset_builds_tagged_population() {
    let mut sim = scripted_simulation();
    sim.reset(5);
    let agents = sim.snapshot().agents;

    assert_eq!(agents.len(), 5);
    let heroes: Vec<_> = agents.iter().filter_map(|a| a.kind.hero_kind()).collect();
    assert_eq!(heroes, vec![HeroKind::Superman, HeroKind::Batman]);
    assert_eq!(
        agents
            .iter()
            .filter(|a| a.kind == AgentKind::SpecialCharacter)
            .count(),
        1
    );
}
