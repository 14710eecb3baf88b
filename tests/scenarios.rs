//! End-to-end trials through the public API

use std::collections::BTreeSet;

use approx::assert_relative_eq;
use cloth_cutter::sim::{PointId, Scorer, TrajectoryDriver, circle};
use cloth_cutter::{
    Actuator, ActuatorInput, ActuatorMode, Bounds, ClothConfig, Error, ExperimentConfig,
    PinCondition, SimError, Simulation, Snapshot, Surface, TargetShape,
};
use glam::Vec2;

fn grid(width: usize, height: usize) -> ClothConfig {
    ClothConfig::grid(width, height, 10.0)
}

fn trial_config() -> ExperimentConfig {
    let mut config = ExperimentConfig {
        cloth: grid(12, 12),
        shape: TargetShape::annulus(Vec2::new(105.0, 105.0), 30.0),
        trajectory: Some(circle(Vec2::new(105.0, 105.0), 30.0, 40)),
        ..Default::default()
    };
    config.simulation.settle_steps = 30;
    config
}

/// Links whose midpoint lies within `radius` of `center`, as unordered pairs
fn links_near(surface: &Surface, center: Vec2, radius: f32) -> BTreeSet<(PointId, PointId)> {
    surface
        .links()
        .into_iter()
        .filter(|&(a, b)| {
            let pa = surface.point(a).unwrap().pos;
            let pb = surface.point(b).unwrap().pos;
            ((pa + pb) * 0.5).distance(center) <= radius
        })
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect()
}

fn pairs(surface: &Surface) -> BTreeSet<(PointId, PointId)> {
    surface
        .links()
        .into_iter()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect()
}

#[test]
fn ring_cut_out_scores_perfectly() {
    let shape = TargetShape::Annulus {
        center: Vec2::new(90.0, 90.0),
        radius: 30.0,
        tolerance: 50.0,
    };
    let mut surface = Surface::new(&grid(10, 10), Bounds::default(), &shape).unwrap();
    let ring = [PointId(14), PointId(41), PointId(47), PointId(74)];
    assert_eq!(surface.target_points(), &ring);
    assert_eq!(surface.background_points().len(), 96);

    for id in ring {
        surface.sever_all_links(id);
    }
    let mut idle = Actuator::new(Vec2::ZERO, Bounds::default());
    let report = surface.step(&mut idle).unwrap();

    assert_eq!(report.removed, ring.to_vec());
    assert!(surface.target_points().is_empty());
    assert!(surface.check_partition());
    assert!(surface.check_topology());

    let scorer = Scorer::default();
    assert_relative_eq!(scorer.score_regions(&surface), 1.0);
    assert_relative_eq!(scorer.score(&surface, &shape), 1.0);
}

#[test]
fn cut_out_piece_counts_without_removal() {
    let center = Vec2::new(95.0, 95.0);
    let inside = move |p: Vec2| p.distance(center) < 15.0;
    let mut surface = Surface::new(&grid(10, 10), Bounds::default(), &inside).unwrap();
    let block = [PointId(44), PointId(45), PointId(54), PointId(55)];
    assert_eq!(surface.target_points(), &block);

    for id in block {
        for other in surface.neighbours(id) {
            if !block.contains(&other) {
                surface.sever_link(id, other);
            }
        }
    }
    assert_eq!(surface.live_count(), 100);

    let scorer = Scorer::default();
    let counts = scorer.region_breakdown(&surface);
    assert_eq!((counts.target_cut, counts.background_cut), (4, 0));
    assert_relative_eq!(scorer.score_regions(&surface), 1.0);
}

#[test]
fn cut_radius_matches_midpoint_geometry() {
    let center = Vec2::new(75.0, 80.0);
    let fresh = Surface::new(&grid(10, 10), Bounds::default(), &TargetShape::Empty).unwrap();

    for radius in [5.0, 7.5] {
        let mut surface = fresh.clone();
        let expected = links_near(&surface, center, radius);

        let mut actuator = Actuator::new(center, Bounds::default());
        actuator.set_mode(ActuatorMode::Cut);
        actuator.set_cut_radius(radius);
        actuator.press();
        let cut = surface.cut(&actuator);

        assert_eq!(cut, expected.len());
        let gone: BTreeSet<_> = pairs(&fresh).difference(&pairs(&surface)).copied().collect();
        assert_eq!(gone, expected);
    }

    let mut surface = fresh.clone();
    assert_eq!(surface.cut_at(center, 5.0), 1);
    assert!(!surface.has_link(PointId(32), PointId(33)));
    let mut surface = fresh;
    assert_eq!(surface.cut_at(center, 7.5), 5);
}

#[test]
fn partition_survives_cutting_and_cleanup() {
    let mut sim = Simulation::new(trial_config()).unwrap();
    sim.reset().unwrap();
    let waypoints = sim.trajectory();
    sim.run_trajectory(TrajectoryDriver::new(waypoints)).unwrap();

    let surface = sim.surface();
    assert!(surface.check_partition());
    assert!(surface.check_topology());
    for removal in surface.removed() {
        assert!(surface.point(removal.id).is_none());
    }
    let counts = sim.breakdown();
    assert_eq!(counts.target_total + counts.background_total, 144);
}

#[test]
fn reset_restores_identical_baseline() {
    let mut sim = Simulation::new(trial_config()).unwrap();
    sim.reset().unwrap();
    let settled = sim.surface().clone();

    let waypoints = sim.trajectory();
    sim.run_trajectory(TrajectoryDriver::new(waypoints)).unwrap();
    assert_eq!(sim.baseline(), Some(&settled));

    sim.reset().unwrap();
    assert_eq!(sim.surface(), &settled);
    sim.reset().unwrap();
    assert_eq!(sim.surface(), &settled);
}

#[test]
fn snapshot_is_isolated_from_working_copy() {
    let mut sim = Simulation::new(trial_config()).unwrap();
    sim.reset().unwrap();
    let snapshot = sim.snapshot();
    let links = snapshot.surface.link_count();
    let point = sim.surface().point(PointId(66)).unwrap();
    let partner = sim.surface().point(point.links()[0].partner).unwrap();
    let midpoint = (point.pos + partner.pos) * 0.5;

    sim.update(&ActuatorInput {
        move_to: Some(midpoint),
        press: true,
        mode: Some(ActuatorMode::Cut),
        ..Default::default()
    })
    .unwrap();
    assert!(sim.surface().link_count() < links);
    assert_eq!(snapshot.surface.link_count(), links);

    let json = snapshot.to_json().unwrap();
    assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
}

#[test]
fn trials_are_deterministic_across_threads() {
    let run = || {
        let mut sim = Simulation::new(trial_config()).unwrap();
        sim.reset().unwrap();
        let driver = TrajectoryDriver::new(sim.trajectory()).with_jitter(1.5, 42);
        sim.run_trajectory(driver).unwrap();
        (sim.surface().clone(), sim.score())
    };

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(run);
        let b = s.spawn(run);
        (a.join().unwrap(), b.join().unwrap())
    });
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
    assert!((-1.0..=1.0).contains(&a.1));
}

#[test]
fn pathological_elasticity_fails_settling() {
    let mut config = trial_config();
    config.cloth.elasticity = 1e-30;
    let mut sim = Simulation::new(config).unwrap();
    let err = sim.reset().unwrap_err();
    assert!(matches!(err, Error::Sim(SimError::Unstable { .. })));
    assert!(sim.surface().is_poisoned());
}

#[test]
fn dragging_moves_cloth_and_releases() {
    let mut config = trial_config();
    config.cloth.gravity = 0.0;
    config.cloth.pin = PinCondition::None;
    config.actuator.influence = 6.0;
    let mut sim = Simulation::new(config).unwrap();

    sim.update(&ActuatorInput {
        move_to: Some(Vec2::new(100.0, 100.0)),
        press: true,
        ..Default::default()
    })
    .unwrap();
    assert!(sim.surface().has_grabbed());

    for i in 1..=5 {
        sim.update(&ActuatorInput {
            move_to: Some(Vec2::new(100.0 + i as f32, 100.0)),
            ..Default::default()
        })
        .unwrap();
    }
    let grabbed = sim.surface().points().find(|p| p.grabbed).unwrap();
    assert_relative_eq!(grabbed.pos.x - grabbed.origin.x, 5.0, epsilon = 1e-3);

    sim.update(&ActuatorInput {
        release: true,
        ..Default::default()
    })
    .unwrap();
    assert!(!sim.surface().has_grabbed());
}

#[test]
fn lifted_actuator_does_not_cut() {
    let mut sim = Simulation::new(trial_config()).unwrap();
    let links = sim.surface().link_count();
    sim.update(&ActuatorInput {
        move_to: Some(Vec2::new(105.0, 105.0)),
        height: Some(50.0),
        press: true,
        mode: Some(ActuatorMode::Cut),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(sim.surface().link_count(), links);
}

#[test]
fn config_file_drives_a_trial() {
    let path = std::env::temp_dir().join(format!("cloth-config-{}.json", std::process::id()));
    trial_config().save(&path).unwrap();
    let config = ExperimentConfig::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(config, trial_config());

    let mut sim = Simulation::new(config).unwrap();
    sim.reset().unwrap();
    assert_eq!(sim.surface().steps(), 30);
}
