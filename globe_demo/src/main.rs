//! Globe demo application
//!
//! Renders an animated globe scene headlessly through the software backend,
//! resizes the viewport halfway through the run and writes the final frame
//! to a PNG file.
//!
//! Usage: `globe_demo [config.toml|config.ron]`

use std::error::Error;
use std::path::PathBuf;

use globe_engine::foundation::logging;
use globe_engine::foundation::time::Stopwatch;
use globe_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Preset to start from when the config does not spell out a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Preset {
    Orbital,
    Procedural,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    preset: Preset,
    scene: Option<SceneConfig>,
    seed: Option<u64>,
    width: u32,
    height: u32,
    /// Window size applied halfway through the run
    resize_to: Option<(u32, u32)>,
    layout: RegionLayout,
    duration_seconds: f32,
    frames_per_second: u32,
    output: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Orbital,
            scene: None,
            seed: None,
            width: 800,
            height: 600,
            resize_to: Some((1024, 576)),
            layout: RegionLayout::FillViewport,
            duration_seconds: 4.0,
            frames_per_second: 60,
            output: PathBuf::from("globe_frame.png"),
        }
    }
}

impl Config for DemoConfig {}

impl DemoConfig {
    fn scene_config(&self) -> SceneConfig {
        let scene = match (&self.scene, self.preset) {
            (Some(scene), _) => scene.clone(),
            (None, Preset::Orbital) => SceneConfig::orbital(),
            (None, Preset::Procedural) => SceneConfig::procedural(),
        };
        match self.seed {
            Some(seed) => scene.with_seed(seed),
            None => scene,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading demo configuration from {}", path);
            DemoConfig::load_from_file(&path)?
        }
        None => DemoConfig::default(),
    };

    let scene = config.scene_config();
    scene.validate().map_err(ConfigError::Invalid)?;

    let mut host = SceneHost::new(config.width, config.height);
    let backend = Box::new(SoftwareBackend::new(config.width, config.height));
    let id = host.mount(scene, config.layout, backend)?;

    let mut clock = FrameClock::fixed_rate(config.frames_per_second);
    let total_frames = (config.duration_seconds * config.frames_per_second as f32).ceil() as u64;
    let mut overlay = LoadingOverlay::new();
    let mut overlay_phase = overlay.phase();
    let stopwatch = Stopwatch::start_new();

    for _ in 0..total_frames {
        let time = clock.next_frame();
        if time.frame == total_frames / 2 {
            if let Some((width, height)) = config.resize_to {
                log::info!("Resizing viewport to {}x{}", width, height);
                host.resize_viewport(width, height);
            }
        }

        if host.run_frame(&time) == 0 {
            log::warn!("No scene ran on frame {}, stopping early", time.frame);
            break;
        }

        if let Some(container) = host.container(id) {
            overlay.update(time.elapsed, container.model_status());
            if overlay.phase() != overlay_phase {
                overlay_phase = overlay.phase();
                log::info!("Overlay now {:?} at {:.2}s", overlay_phase, time.elapsed);
            } else if time.frame % u64::from(config.frames_per_second.max(1)) == 0 && !overlay.is_hidden() {
                log::info!("{}... {}%", overlay.status_text(), overlay.progress_percent());
            }
        }
    }

    if let Some(container) = host.container(id) {
        let stats = container.last_frame_stats();
        log::info!(
            "Rendered {} frames in {:.1} ms, last frame: {} draw calls, {} pixels written",
            clock.frame_count(),
            stopwatch.elapsed_millis(),
            stats.draw_calls,
            stats.pixels_written
        );
        container.save_frame(&config.output)?;
        log::info!("Saved final frame to {}", config.output.display());
    }

    host.unmount(id);
    Ok(())
}
