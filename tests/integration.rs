//! Integration tests for the platformer controller.
//!
//! The first half drives the bare state machine through a tiny headless level
//! (a flat floor and a kinematic body). The second half runs the full bevy
//! plugin with the kinematic backend, feeding contacts by hand.
//! Each test produces PROOF through explicit position/velocity/event checks.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use platformer_controller::detection::{check_collisions, BodyBounds};
use platformer_controller::prelude::*;
use platformer_controller::systems;

const DT: f32 = 1.0 / 60.0;
const HALF_EXTENTS: Vec2 = Vec2::new(0.25, 0.5);

// ==================== Headless level ====================

/// Infinite flat floor at `floor_y`.
struct FloorProbe {
    floor_y: f32,
    bounds: BodyBounds,
}

impl CollisionProbe for FloorProbe {
    fn cast_body(&self, direction: Vec2, distance: f32, _filter: ProbeFilter) -> ShapeHits {
        let gap = self.bounds.feet().y - self.floor_y;
        if direction.y < 0.0 && gap <= distance {
            let point = Vec2::new(self.bounds.center.x, self.floor_y);
            ShapeHits::single(CollisionData::new(gap.max(0.0), Vec2::Y, point, None))
        } else {
            ShapeHits::none()
        }
    }

    fn overlap_box(&self, _center: Vec2, _size: Vec2, _filter: ProbeFilter) -> ShapeHits {
        ShapeHits::none()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        distance: f32,
        _filter: ProbeFilter,
    ) -> Option<CollisionData> {
        let gap = origin.y - self.floor_y;
        (direction.y < 0.0 && (0.0..=distance).contains(&gap)).then(|| {
            CollisionData::new(gap, Vec2::Y, Vec2::new(origin.x, self.floor_y), None)
        })
    }
}

/// Controller, body and floor, stepped like a physics engine would.
struct Level {
    stats: StatsConfig,
    controller: PlatformerController,
    body: KinematicBody,
    floor_y: f32,
    events: Vec<ControllerEvent>,
}

impl Level {
    fn new(stats: StatsConfig, start: Vec2) -> Self {
        Self {
            controller: PlatformerController::new(&stats),
            stats,
            body: KinematicBody::new(start),
            floor_y: 0.0,
            events: Vec::new(),
        }
    }

    fn step(&mut self, input: FrameInput) -> Vec<ControllerEvent> {
        let probe = FloorProbe {
            floor_y: self.floor_y,
            bounds: BodyBounds::new(self.body.position, HALF_EXTENTS),
        };
        let contacts = check_collisions(&probe, &probe.bounds, &self.stats);

        let events = self
            .controller
            .tick(&self.stats, &input, &contacts, &mut self.body, DT)
            .to_vec();

        // Integrate, then resolve floor penetration
        self.body.integrate(DT);
        let feet = self.body.position.y - HALF_EXTENTS.y;
        if feet < self.floor_y {
            self.body.position.y = self.floor_y + HALF_EXTENTS.y;
            self.body.velocity.y = self.body.velocity.y.max(0.0);
        }

        self.events.extend(events.iter().copied());
        events
    }

    fn run(&mut self, ticks: usize, input: FrameInput) {
        for _ in 0..ticks {
            self.step(input);
        }
    }

    fn landings(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::GroundedChanged { grounded: true, .. }))
            .count()
    }
}

#[test]
fn falling_body_lands_once() {
    let mut level = Level::new(StatsConfig::default(), Vec2::new(0.0, 3.0));

    level.run(120, FrameInput::default());

    println!("PROOF: position after fall = {:?}", level.body.position);
    assert!(level.controller.is_grounded());
    assert_eq!(level.landings(), 1, "exactly one landing event");
    assert!((level.body.position.y - HALF_EXTENTS.y).abs() < 0.05);

    let impact = level.events.iter().find_map(|e| match e {
        ControllerEvent::GroundedChanged {
            grounded: true,
            impact_speed,
        } => Some(*impact_speed),
        _ => None,
    });
    assert!(impact.is_some_and(|speed| speed > 5.0), "impact speed {impact:?}");
}

#[test]
fn holding_jump_reaches_higher_than_tapping() {
    fn apex(hold_ticks: usize) -> f32 {
        let mut level = Level::new(StatsConfig::default(), Vec2::new(0.0, HALF_EXTENTS.y));
        level.run(2, FrameInput::default());
        assert!(level.controller.is_grounded());

        let mut input = FrameInput::default().advance(Vec2::ZERO, true, false);
        let mut highest = level.body.position.y;
        for tick in 0..120 {
            level.step(input);
            highest = highest.max(level.body.position.y);
            input = input.advance(Vec2::ZERO, tick < hold_ticks, false);
        }

        assert!(level.controller.is_grounded(), "back on the ground");
        highest
    }

    let tapped = apex(0);
    let held = apex(60);

    println!("PROOF: tapped apex = {tapped:.3}, held apex = {held:.3}");
    assert!(tapped > HALF_EXTENTS.y);
    assert!(held > tapped + 1.0);
}

#[test]
fn running_reaches_max_speed() {
    let stats = StatsConfig::default();
    let mut level = Level::new(stats.clone(), Vec2::new(0.0, HALF_EXTENTS.y));
    level.run(2, FrameInput::default());

    level.run(60, FrameInput::moving(Vec2::X));

    println!("PROOF: velocity after running = {:?}", level.body.velocity);
    assert_eq!(level.controller.speed().x, stats.max_speed);
    assert!(level.body.position.x > 5.0);
    assert!(level.controller.is_grounded());
    assert_eq!(level.controller.facing(), Facing::Right);
}

#[test]
fn double_jump_then_land_refills() {
    let stats = StatsConfig::default().with_air_jumps(1);
    let mut level = Level::new(stats, Vec2::new(0.0, HALF_EXTENTS.y));
    level.run(2, FrameInput::default());

    let press = FrameInput::default().with_jump_pressed();
    let hold = FrameInput::default().with_jump_held();

    level.step(press);
    level.run(10, hold);
    level.step(FrameInput::default());
    level.step(press);
    assert_eq!(level.controller.air_jumps_remaining(), 0);

    level.run(240, FrameInput::default());

    let jumps: Vec<_> = level
        .events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::Jumped { air_jump } => Some(*air_jump),
            _ => None,
        })
        .collect();
    assert_eq!(jumps, vec![false, true]);
    assert!(level.controller.is_grounded());
    assert_eq!(level.controller.air_jumps_remaining(), 1);
}

// ==================== Bevy app ====================

/// Create a minimal test app with the kinematic backend.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(PlatformerControllerPlugin::<KinematicBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));

    app.finish();
    app.cleanup();
    app
}

/// Run one fixed tick.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn spawn_character(app: &mut App, stats: StatsConfig) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_xyz(0.0, 2.0, 0.0),
            PlatformerController::default(),
            ControllerStats::new(stats),
            ControlIntent::default(),
            KinematicVelocity::default(),
        ))
        .id()
}

fn set_contacts(app: &mut App, entity: Entity, report: CollisionReport) {
    *app.world_mut()
        .get_mut::<CollisionReport>(entity)
        .expect("controller requires a CollisionReport") = report;
}

fn velocity(app: &App, entity: Entity) -> Vec2 {
    app.world().get::<KinematicVelocity>(entity).unwrap().0
}

fn messages(app: &App) -> Vec<ControllerMessage> {
    app.world()
        .resource::<Events<ControllerMessage>>()
        .iter_current_update_events()
        .copied()
        .collect()
}

#[test]
fn required_components_are_inserted() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());

    assert!(app.world().get::<CollisionReport>(entity).is_some());
    assert!(app.world().get::<FrameInput>(entity).is_some());
}

#[test]
fn controller_falls_and_integrates() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());

    tick(&mut app);

    let vel = velocity(&app, entity);
    let y = app.world().get::<Transform>(entity).unwrap().translation.y;
    println!("PROOF: velocity = {vel:?}, y = {y}");
    assert!(vel.y < 0.0, "gravity pulls the airborne character down");
    assert!((y - (2.0 + vel.y * DT)).abs() < 1e-5);
    assert!(app.world().get::<Airborne>(entity).is_some());
}

#[test]
fn landing_syncs_markers_and_sends_messages() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());
    tick(&mut app);

    set_contacts(&mut app, entity, CollisionReport::grounded(Vec2::Y));
    tick(&mut app);

    assert!(app.world().get::<Grounded>(entity).is_some());
    assert!(app.world().get::<Airborne>(entity).is_none());

    let landed = messages(&app)
        .into_iter()
        .find(|m| matches!(m.event, ControllerEvent::GroundedChanged { grounded: true, .. }));
    assert_eq!(landed.map(|m| m.entity), Some(entity));
}

#[test]
fn control_intent_jumps_once_per_press() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default().with_air_jumps(0));
    set_contacts(&mut app, entity, CollisionReport::grounded(Vec2::Y));
    tick(&mut app);

    app.world_mut()
        .get_mut::<ControlIntent>(entity)
        .unwrap()
        .set_jump(true);
    tick(&mut app);
    assert!(velocity(&app, entity).y > 0.0);

    // Still holding: no new edge, so no second jump
    tick(&mut app);
    let jumps = messages(&app)
        .iter()
        .filter(|m| matches!(m.event, ControllerEvent::Jumped { .. }))
        .count();
    assert_eq!(jumps, 1);
}

#[test]
fn jump_tapped_between_ticks_is_not_lost() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());
    set_contacts(&mut app, entity, CollisionReport::grounded(Vec2::Y));
    tick(&mut app);

    // Pressed and released before the next fixed step runs
    {
        let mut intent = app.world_mut().get_mut::<ControlIntent>(entity).unwrap();
        intent.set_jump(true);
        intent.set_jump(false);
    }
    tick(&mut app);

    let velocity = velocity(&app, entity);
    println!("PROOF: velocity after tap = {velocity:?}");
    assert!(velocity.y > 0.0);
    assert!(messages(&app)
        .iter()
        .any(|m| matches!(m.event, ControllerEvent::Jumped { .. })));
    assert!(!app
        .world()
        .get::<ControlIntent>(entity)
        .unwrap()
        .jump_latched());
}

#[test]
fn missing_stats_marks_misconfigured() {
    let mut app = create_test_app();
    let entity = app
        .world_mut()
        .spawn((
            Transform::default(),
            PlatformerController::default(),
            KinematicVelocity::default(),
        ))
        .id();

    tick(&mut app);

    let misconfigured = app.world().get::<Misconfigured>(entity);
    assert!(matches!(
        misconfigured,
        Some(Misconfigured(ConfigError::MissingStats))
    ));
    assert_eq!(velocity(&app, entity), Vec2::ZERO);
}

#[test]
fn invalid_stats_are_never_simulated() {
    let mut app = create_test_app();
    let stats = StatsConfig {
        max_fall_speed: -10.0,
        ..default()
    };
    let entity = spawn_character(&mut app, stats);

    for _ in 0..3 {
        tick(&mut app);
    }

    assert!(app.world().get::<Misconfigured>(entity).is_some());
    assert_eq!(velocity(&app, entity), Vec2::ZERO);
    assert_eq!(
        app.world()
            .get::<PlatformerController>(entity)
            .unwrap()
            .frame(),
        0
    );
}

#[test]
fn misconfigured_controller_recovers_when_stats_arrive() {
    let mut app = create_test_app();
    let entity = app
        .world_mut()
        .spawn((
            Transform::default(),
            PlatformerController::default(),
            KinematicVelocity::default(),
        ))
        .id();

    tick(&mut app);
    assert!(app.world().get::<Misconfigured>(entity).is_some());

    app.world_mut()
        .entity_mut(entity)
        .insert(ControllerStats::new(StatsConfig::default().with_air_jumps(2)));
    tick(&mut app);

    assert!(app.world().get::<Misconfigured>(entity).is_none());
    let controller = app.world().get::<PlatformerController>(entity).unwrap();
    assert_eq!(controller.frame(), 1);
    assert_eq!(controller.air_jumps_remaining(), 2);
    assert!(velocity(&app, entity).y < 0.0);
}

#[test]
fn replacing_stats_with_invalid_ones_stops_simulation() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());
    tick(&mut app);

    let invalid = StatsConfig {
        jump_power: f32::NAN,
        ..default()
    };
    app.world_mut()
        .entity_mut(entity)
        .insert(ControllerStats::new(invalid));
    tick(&mut app);
    tick(&mut app);

    assert!(app.world().get::<Misconfigured>(entity).is_some());
    let controller = app.world().get::<PlatformerController>(entity).unwrap();
    assert_eq!(controller.frame(), 1);
}

#[test]
fn validation_fills_air_jumps_from_stats() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default().with_air_jumps(3));

    tick(&mut app);

    let controller = app.world().get::<PlatformerController>(entity).unwrap();
    assert_eq!(controller.air_jumps_remaining(), 3);
}

#[test]
fn observers_are_notified_in_app() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut observers = ControllerObservers::new();
    let log = Arc::clone(&seen);
    observers.register(move |event| log.lock().unwrap().push(*event));
    app.world_mut().entity_mut(entity).insert(observers);

    set_contacts(&mut app, entity, CollisionReport::grounded(Vec2::Y));
    tick(&mut app);

    assert_eq!(seen.lock().unwrap().len(), 1);
    // Listeners survive the tick
    assert_eq!(app.world().get::<ControllerObservers>(entity).unwrap().len(), 1);
}

#[test]
fn world_helpers_revoke_and_restore_control() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());
    tick(&mut app);
    assert_ne!(velocity(&app, entity), Vec2::ZERO);

    systems::revoke_control::<KinematicBackend>(app.world_mut(), entity, true);
    assert_eq!(velocity(&app, entity), Vec2::ZERO);

    tick(&mut app);
    assert_eq!(velocity(&app, entity), Vec2::ZERO, "no writes without control");

    systems::restore_control(app.world_mut(), entity);
    tick(&mut app);
    assert_ne!(velocity(&app, entity), Vec2::ZERO);
}

#[test]
fn world_helper_applies_external_velocity() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, StatsConfig::default());
    set_contacts(&mut app, entity, CollisionReport::grounded(Vec2::Y));
    tick(&mut app);

    systems::apply_external_velocity(
        app.world_mut(),
        entity,
        Vec2::new(10.0, 0.0),
        ForceKind::Decay,
    );
    tick(&mut app);

    assert!((velocity(&app, entity).x - 10.0).abs() < 1e-4);
}

#[test]
fn world_helpers_ignore_entities_without_controller() {
    let mut app = create_test_app();
    let entity = app.world_mut().spawn(Transform::default()).id();

    systems::restore_control(app.world_mut(), entity);
    systems::revoke_control::<KinematicBackend>(app.world_mut(), entity, true);
    systems::apply_external_velocity(app.world_mut(), entity, Vec2::X, ForceKind::Burst);

    assert!(app.world().get::<PlatformerController>(entity).is_none());
}
