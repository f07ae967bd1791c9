use std::time::Duration;

use approx::assert_relative_eq;

use super::support::{container, offline_orbital, software_backend, tick_until_model_settles, LimitedBackend};
use crate::config::{ModelSettings, SceneConfig};
use crate::events::Region;
use crate::foundation::time::FrameTime;
use crate::scene::{ContainerState, ModelStatus, SceneContainer, SceneError};

#[test]
fn test_primary_rotation_follows_elapsed_time() {
    let (mut container, _) = container(offline_orbital(), 300, 300);
    let spin = container.config().globe.spin_speed;

    let mut previous = f32::NEG_INFINITY;
    for t in [0.0, 1.0, 2.0] {
        container.tick(&FrameTime::at(t)).expect("tick should succeed");
        let rotation = container.primary_rotation();
        assert_relative_eq!(rotation, t * spin, epsilon = 1e-6);
        assert!(rotation > previous, "Rotation must strictly increase, {} after {}", rotation, previous);
        previous = rotation;
    }
}

#[test]
fn test_resize_sets_aspect_for_many_sizes() {
    let (mut container, _) = container(offline_orbital(), 300, 300);
    for (width, height) in [(300, 300), (1920, 1080), (640, 300), (300, 900), (1, 300), (4096, 300)] {
        container.resize(Region::new(width, height)).expect("resize should succeed");
        assert_relative_eq!(container.aspect(), width as f32 / height as f32, epsilon = 1e-6);
        assert_eq!(container.region(), Region::new(width, height));
    }
}

#[test]
fn test_zero_area_resize_is_ignored() {
    let (mut container, _) = container(offline_orbital(), 400, 300);
    container.resize(Region::new(0, 300)).expect("empty region is not an error");
    container.resize(Region::new(400, 0)).expect("empty region is not an error");
    assert_relative_eq!(container.aspect(), 400.0 / 300.0, epsilon = 1e-6);
    assert!(container.aspect().is_finite());
}

#[test]
fn test_dispose_twice_balances_ledger() {
    let (mut container, ledger) = container(offline_orbital(), 300, 300);
    container.tick(&FrameTime::at(0.5)).expect("tick should succeed");

    container.dispose();
    container.dispose();
    assert_eq!(container.state(), ContainerState::Disposed);

    let counts = ledger.snapshot();
    assert!(counts.geometries_created > 0);
    assert_eq!(counts.geometries_created, counts.geometries_destroyed, "No leaks, no double frees");
    assert_eq!(counts.materials_created, counts.materials_destroyed);
    assert_eq!(counts.contexts_released, 1, "Context must be released exactly once");
    assert_eq!(counts.live_bytes, 0);

    drop(container);
    assert_eq!(ledger.snapshot().contexts_released, 1, "Drop after dispose must not release again");
}

#[test]
fn test_drop_disposes_running_container() {
    let (container, ledger) = container(offline_orbital(), 300, 300);
    drop(container);

    let counts = ledger.snapshot();
    assert_eq!(counts.contexts_released, 1);
    assert_eq!(counts.live_geometries(), 0);
    assert_eq!(counts.live_materials(), 0);
}

#[test]
fn test_tick_and_resize_after_dispose_are_noops() {
    let (mut container, ledger) = container(offline_orbital(), 300, 300);
    container.dispose();
    let frames = ledger.snapshot().frames_presented;

    let stats = container.tick(&FrameTime::at(3.0)).expect("tick after dispose is a no-op");
    container.resize(Region::new(800, 600)).expect("resize after dispose is a no-op");

    assert_eq!(stats.draw_calls, 0);
    assert_eq!(ledger.snapshot().frames_presented, frames);
    assert_eq!(container.region(), Region::new(300, 300));
}

#[test]
fn test_tick_is_pure_across_reinitialization() {
    let (mut first, _) = container(offline_orbital(), 300, 300);
    let (mut second, _) = container(offline_orbital(), 300, 300);

    // Different tick histories must converge on the same state for the same t
    for t in [0.1, 0.7, 1.3] {
        first.tick(&FrameTime::at(t)).expect("tick should succeed");
    }
    second.tick(&FrameTime::at(1.3)).expect("tick should succeed");

    let (a, b) = (first.scene(), second.scene());
    assert_eq!(a.ring_rotations(), b.ring_rotations());
    assert_eq!(a.satellite_positions(), b.satellite_positions());
    assert_eq!(a.glow_state(), b.glow_state());
    assert_eq!(a.starfield_rotation(), b.starfield_rotation());
}

#[test]
fn test_ring_and_glow_values_at_known_time() {
    let (mut container, _) = container(offline_orbital(), 300, 300);
    container.tick(&FrameTime::at(2.0)).expect("tick should succeed");

    let rings = container.scene().ring_rotations();
    assert_relative_eq!(rings[0].z, 0.2, epsilon = 1e-6);
    assert_relative_eq!(rings[1].z, -0.1, epsilon = 1e-6);

    let (transform, opacity) = container.scene().glow_state().expect("orbital preset has a glow");
    let wave = (2.0_f32 * 0.5).sin();
    assert_relative_eq!(transform.scale.x, 1.0 + wave * 0.05, epsilon = 1e-6);
    assert_relative_eq!(opacity, 0.2 + wave * 0.05, epsilon = 1e-6);
}

#[test]
fn test_trail_never_grows_past_capacity() {
    let (mut container, _) = container(offline_orbital(), 200, 200);
    for frame in 0..150 {
        container.tick(&FrameTime::at(frame as f32 / 60.0)).expect("tick should succeed");
        for (len, capacity) in container.scene().trail_fill() {
            assert!(len <= capacity, "Trail length {} exceeded capacity {}", len, capacity);
        }
    }
    assert_eq!(container.scene().trail_fill(), vec![(100, 100), (100, 100)]);
}

#[test]
fn test_failing_model_keeps_scene_rendering() {
    let config = SceneConfig::orbital()
        .with_seed(9)
        .with_model(Some(ModelSettings {
            path: "/nonexistent/models/earth.obj".to_string(),
            ..ModelSettings::default()
        }));
    let (mut container, _) = container(config, 300, 300);

    tick_until_model_settles(&mut container, Duration::from_secs(2));
    assert!(matches!(container.model_status(), ModelStatus::Failed { .. }), "got {:?}", container.model_status());

    let stats = container.tick(&FrameTime::at(5.0)).expect("tick after failure should succeed");
    assert!(stats.draw_calls > 0);
    assert!(stats.pixels_written > 0, "Frame should not be empty");
    assert!(!container.scene().has_model());
    assert_eq!(container.state(), ContainerState::Running);
}

#[test]
fn test_model_loads_and_attaches() {
    let path = std::env::temp_dir().join(format!("globe_engine_lifecycle_{}.obj", std::process::id()));
    std::fs::write(&path, "v 0 0 0\nv 4 0 0\nv 0 4 0\nv 0 0 4\nf 1 2 3\nf 1 3 4\nf 1 4 2\nf 2 4 3\n").unwrap();

    let config = offline_orbital().with_model(Some(ModelSettings {
        path: path.display().to_string(),
        ..ModelSettings::default()
    }));
    let (mut container, ledger) = container(config, 300, 300);
    tick_until_model_settles(&mut container, Duration::from_secs(2));
    let _ = std::fs::remove_file(&path);

    assert!(matches!(container.model_status(), ModelStatus::Loaded { .. }), "got {:?}", container.model_status());
    assert!(container.scene().has_model());
    assert_relative_eq!(container.model_status().progress(), 100.0);

    container.dispose();
    assert_eq!(ledger.snapshot().live_geometries(), 0, "The model geometry is disposed with the scene");
}

#[test]
fn test_initialize_rejects_invalid_config_and_releases_backend() {
    let mut config = offline_orbital();
    config.camera.fov_degrees = 0.0;
    let (backend, ledger) = software_backend(300, 300);

    let result = SceneContainer::initialize(config, Region::new(300, 300), backend);
    assert!(matches!(result, Err(SceneError::InvalidConfig(_))));
    assert_eq!(ledger.snapshot().contexts_released, 1);
}

#[test]
fn test_initialize_rejects_infinite_land_scale() {
    let mut config = SceneConfig::procedural().with_seed(5);
    if let Some(land) = config.land_masses.as_mut() {
        land.max_scale = f32::INFINITY;
    }
    let (backend, ledger) = software_backend(300, 300);

    let result = SceneContainer::initialize(config, Region::new(300, 300), backend);
    assert!(matches!(result, Err(SceneError::InvalidConfig(_))));
    let counts = ledger.snapshot();
    assert_eq!(counts.geometries_created, 0, "Nothing is built from a rejected config");
    assert_eq!(counts.contexts_released, 1);
}

#[test]
fn test_initialize_rejects_empty_region() {
    let (backend, _) = software_backend(300, 300);
    let result = SceneContainer::initialize(offline_orbital(), Region::new(0, 0), backend);
    assert!(matches!(result, Err(SceneError::EmptyRegion { .. })));
}

#[test]
fn test_failed_build_frees_partial_resources() {
    let backend = LimitedBackend::new(3);
    let ledger = backend.ledger();

    let result = SceneContainer::initialize(offline_orbital(), Region::new(300, 300), Box::new(backend));
    assert!(matches!(result, Err(SceneError::Render(_))));

    let counts = ledger.snapshot();
    assert_eq!(counts.geometries_created, 3);
    assert_eq!(counts.live_geometries(), 0);
    assert_eq!(counts.live_materials(), 0);
    assert_eq!(counts.contexts_released, 1);
}

#[test]
fn test_procedural_preset_renders_globe_at_center() {
    let (mut container, _) = container(SceneConfig::procedural().with_seed(5), 300, 300);
    let stats = container.tick(&FrameTime::at(1.0)).expect("tick should succeed");

    assert!(stats.draw_calls >= 15, "Surface, land pieces, rings and satellites are drawn");
    assert_eq!(container.model_status(), &ModelStatus::NotRequested);
    assert_relative_eq!(container.primary_rotation(), 0.1, epsilon = 1e-6);
}
