//! # Scene Configuration
//!
//! One parameterised description covers every globe style. Each decorative
//! element is optional, so a style is just a different [`SceneConfig`] value.
//!
//! ## Presets
//!
//! - [`SceneConfig::orbital`] (default): model-based globe with pulsing glow,
//!   starfield, two tilted rings and two satellites leaving trails.
//! - [`SceneConfig::procedural`]: flat-shaded icosphere with scattered
//!   continents, two rings, two cube satellites and coloured point lights.
//!
//! Colors are `0xRRGGBB` integers; angles are radians; speeds are radians per
//! second.

use serde::{Deserialize, Serialize};

use super::Config;
use crate::foundation::math::constants::{HALF_PI, PI};

/// Perspective camera placed on +Z looking at the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Distance from the origin along +Z
    pub distance: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            distance: 5.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Directional light; the direction points from `position` toward the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLightSettings {
    /// Position the light shines from
    pub position: [f32; 3],
    /// Light color
    pub color: u32,
    /// Light intensity
    pub intensity: f32,
}

/// Point light with linear falloff to zero at `range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLightSettings {
    /// World position
    pub position: [f32; 3],
    /// Light color
    pub color: u32,
    /// Light intensity
    pub intensity: f32,
    /// Distance at which the light has no effect
    pub range: f32,
}

/// Light set of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    /// Ambient color
    pub ambient_color: u32,
    /// Ambient intensity
    pub ambient_intensity: f32,
    /// Directional lights
    pub directional: Vec<DirectionalLightSettings>,
    /// Point lights
    pub points: Vec<PointLightSettings>,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.5,
            directional: vec![DirectionalLightSettings {
                position: [1.0, 1.0, 1.0],
                color: 0xffffff,
                intensity: 1.0,
            }],
            points: Vec::new(),
        }
    }
}

/// Procedural low-poly earth surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    /// Sphere radius
    pub radius: f32,
    /// Icosphere subdivision level
    pub detail: u32,
    /// Base color
    pub color: u32,
    /// Emissive color added regardless of lighting
    pub emissive: u32,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            radius: 1.0,
            detail: 2,
            color: 0x3b82f6,
            emissive: 0x112244,
        }
    }
}

/// External globe model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Path of the OBJ file
    pub path: String,
    /// The model is normalised to unit radius and then scaled by this factor
    pub scale: f32,
    /// Color used for the model material
    pub color: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: "resources/models/earth.obj".to_string(),
            scale: 1.5,
            color: 0x4dabf7,
        }
    }
}

/// The rotating globe: a pivot carrying the surface, the model and land masses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    /// Rotation speed of the pivot around Y
    pub spin_speed: f32,
    /// Procedural surface, built immediately
    pub surface: Option<SurfaceSettings>,
    /// Model loaded in the background and attached when ready
    pub model: Option<ModelSettings>,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            spin_speed: 0.2,
            surface: None,
            model: Some(ModelSettings::default()),
        }
    }
}

/// How land masses are distributed over the sphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scatter {
    /// Even spiral from pole to pole; only the scale is random
    Spiral,
    /// Uniformly random direction per piece
    Random,
}

/// Decorative land masses sitting on the globe surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandMassSettings {
    /// Number of pieces
    pub count: u32,
    /// Radius of one unscaled piece
    pub piece_radius: f32,
    /// Distance of each piece from the globe center
    pub altitude: f32,
    /// Minimum random scale factor
    pub min_scale: f32,
    /// Maximum random scale factor
    pub max_scale: f32,
    /// Piece color
    pub color: u32,
    /// Placement pattern
    pub scatter: Scatter,
    /// Extra rotation of the land mass group relative to the globe
    pub spin_speed: f32,
    /// RNG seed; `None` draws a fresh seed each initialization
    pub seed: Option<u64>,
}

impl Default for LandMassSettings {
    fn default() -> Self {
        Self {
            count: 15,
            piece_radius: 0.2,
            altitude: 1.01,
            min_scale: 0.5,
            max_scale: 1.0,
            color: 0x2ecc71,
            scatter: Scatter::Spiral,
            spin_speed: 0.0,
            seed: None,
        }
    }
}

/// Back-facing glow shell that pulses in scale and opacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowSettings {
    /// Shell radius
    pub radius: f32,
    /// Shell color
    pub color: u32,
    /// Opacity around which the pulse oscillates
    pub base_opacity: f32,
    /// Opacity swing
    pub pulse_amplitude: f32,
    /// Scale swing
    pub scale_amplitude: f32,
    /// Pulse angular frequency
    pub pulse_speed: f32,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            radius: 1.2,
            color: 0x3b82f6,
            base_opacity: 0.2,
            pulse_amplitude: 0.05,
            scale_amplitude: 0.05,
            pulse_speed: 0.5,
        }
    }
}

/// Background star points scattered in a cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldSettings {
    /// Number of stars
    pub count: u32,
    /// Edge length of the cube the stars fill
    pub extent: f32,
    /// Star color
    pub color: u32,
    /// Star opacity
    pub opacity: f32,
    /// Rotation speed around X
    pub spin_speed_x: f32,
    /// Rotation speed around Y
    pub spin_speed_y: f32,
    /// RNG seed; `None` draws a fresh seed each initialization
    pub seed: Option<u64>,
}

impl Default for StarfieldSettings {
    fn default() -> Self {
        Self {
            count: 2000,
            extent: 100.0,
            color: 0xffffff,
            opacity: 0.8,
            spin_speed_x: 0.006,
            spin_speed_y: 0.012,
            seed: None,
        }
    }
}

/// Torus orbit ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSettings {
    /// Distance from the center of the tube to the ring center
    pub radius: f32,
    /// Tube radius
    pub tube: f32,
    /// Ring color
    pub color: u32,
    /// Ring opacity
    pub opacity: f32,
    /// Fixed tilt around X
    pub tilt_x: f32,
    /// Fixed tilt around Y
    pub tilt_y: f32,
    /// Rotation speed around the ring's own Z axis
    pub spin_speed: f32,
}

/// Shape of a satellite body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SatelliteShape {
    /// Small UV sphere
    Sphere,
    /// Small cube
    Cube,
}

/// Fading line following a satellite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailSettings {
    /// Number of remembered positions
    pub length: usize,
    /// Line opacity
    pub opacity: f32,
}

impl Default for TrailSettings {
    fn default() -> Self {
        Self {
            length: 100,
            opacity: 0.4,
        }
    }
}

/// Satellite circling the globe in the XZ plane with a vertical bob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSettings {
    /// Orbit radius
    pub orbit_radius: f32,
    /// Height of the vertical bob
    pub bob_amplitude: f32,
    /// Orbit angular speed
    pub angular_speed: f32,
    /// Orbit phase offset
    pub phase: f32,
    /// Body size (radius for spheres, edge length for cubes)
    pub size: f32,
    /// Body shape
    pub shape: SatelliteShape,
    /// Body color, also used as emissive
    pub color: u32,
    /// Emissive strength
    pub emissive_intensity: f32,
    /// Self-rotation speed around Y
    pub spin_speed: f32,
    /// Optional trail
    pub trail: Option<TrailSettings>,
}

/// Complete description of one animated globe scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Camera
    pub camera: CameraSettings,
    /// Clear color of the surface
    pub clear_color: u32,
    /// Clear alpha; 0 keeps the background transparent
    pub clear_alpha: f32,
    /// Light set
    pub lighting: LightingSettings,
    /// Rotating globe
    pub globe: GlobeSettings,
    /// Land masses on the globe
    pub land_masses: Option<LandMassSettings>,
    /// Pulsing glow shell
    pub glow: Option<GlowSettings>,
    /// Background stars
    pub starfield: Option<StarfieldSettings>,
    /// Orbit rings
    pub rings: Vec<RingSettings>,
    /// Satellites
    pub satellites: Vec<SatelliteSettings>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::orbital()
    }
}

impl Config for SceneConfig {}

impl SceneConfig {
    /// Model-based loading globe with glow, stars, rings and trailing satellites
    pub fn orbital() -> Self {
        Self {
            camera: CameraSettings::default(),
            clear_color: 0x000000,
            clear_alpha: 0.0,
            lighting: LightingSettings::default(),
            globe: GlobeSettings::default(),
            land_masses: None,
            glow: Some(GlowSettings::default()),
            starfield: Some(StarfieldSettings::default()),
            rings: vec![
                RingSettings {
                    radius: 2.0,
                    tube: 0.03,
                    color: 0x3b82f6,
                    opacity: 0.6,
                    tilt_x: HALF_PI,
                    tilt_y: PI / 6.0,
                    spin_speed: 0.1,
                },
                RingSettings {
                    radius: 2.5,
                    tube: 0.02,
                    color: 0x8b5cf6,
                    opacity: 0.4,
                    tilt_x: HALF_PI - 0.3,
                    tilt_y: PI / 4.0,
                    spin_speed: -0.05,
                },
            ],
            satellites: vec![
                SatelliteSettings {
                    orbit_radius: 2.0,
                    bob_amplitude: 0.5,
                    angular_speed: 0.5,
                    phase: 0.0,
                    size: 0.08,
                    shape: SatelliteShape::Sphere,
                    color: 0xec4899,
                    emissive_intensity: 0.5,
                    spin_speed: 0.0,
                    trail: Some(TrailSettings::default()),
                },
                SatelliteSettings {
                    orbit_radius: 2.5,
                    bob_amplitude: 0.3,
                    angular_speed: 0.3,
                    phase: PI,
                    size: 0.08,
                    shape: SatelliteShape::Sphere,
                    color: 0xf59e0b,
                    emissive_intensity: 0.5,
                    spin_speed: 0.0,
                    trail: Some(TrailSettings::default()),
                },
            ],
        }
    }

    /// Icosphere earth with continents, rings, cube satellites and colored lights
    pub fn procedural() -> Self {
        Self {
            camera: CameraSettings {
                distance: 3.0,
                ..CameraSettings::default()
            },
            clear_color: 0x000000,
            clear_alpha: 0.0,
            lighting: LightingSettings {
                ambient_color: 0xffffff,
                ambient_intensity: 0.2,
                directional: vec![DirectionalLightSettings {
                    position: [5.0, 3.0, 5.0],
                    color: 0xffffff,
                    intensity: 1.0,
                }],
                points: vec![
                    PointLightSettings {
                        position: [0.0, 3.0, 0.0],
                        color: 0x3b82f6,
                        intensity: 1.0,
                        range: 10.0,
                    },
                    PointLightSettings {
                        position: [0.0, -3.0, 0.0],
                        color: 0x8b5cf6,
                        intensity: 1.0,
                        range: 10.0,
                    },
                ],
            },
            globe: GlobeSettings {
                spin_speed: 0.1,
                surface: Some(SurfaceSettings::default()),
                model: None,
            },
            land_masses: Some(LandMassSettings::default()),
            glow: None,
            starfield: None,
            rings: vec![
                RingSettings {
                    radius: 1.5,
                    tube: 0.03,
                    color: 0x3b82f6,
                    opacity: 0.6,
                    tilt_x: HALF_PI,
                    tilt_y: 0.0,
                    spin_speed: 0.05,
                },
                RingSettings {
                    radius: 1.8,
                    tube: 0.02,
                    color: 0x8b5cf6,
                    opacity: 0.4,
                    tilt_x: HALF_PI - 0.3,
                    tilt_y: 0.3,
                    spin_speed: -0.03,
                },
            ],
            satellites: vec![
                SatelliteSettings {
                    orbit_radius: 1.5,
                    bob_amplitude: 0.0,
                    angular_speed: 0.5,
                    phase: 0.0,
                    size: 0.1,
                    shape: SatelliteShape::Cube,
                    color: 0xec4899,
                    emissive_intensity: 0.5,
                    spin_speed: 2.0,
                    trail: None,
                },
                SatelliteSettings {
                    orbit_radius: 1.8,
                    bob_amplitude: 0.0,
                    angular_speed: 0.3,
                    phase: PI,
                    size: 0.1,
                    shape: SatelliteShape::Cube,
                    color: 0xf59e0b,
                    emissive_intensity: 0.5,
                    spin_speed: 1.5,
                    trail: None,
                },
            ],
        }
    }

    /// Replace the globe model (or remove it with `None`)
    pub fn with_model(mut self, model: Option<ModelSettings>) -> Self {
        self.globe.model = model;
        self
    }

    /// Fix every RNG seed so initialization is reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Some(land) = self.land_masses.as_mut() {
            land.seed = Some(seed);
        }
        if let Some(stars) = self.starfield.as_mut() {
            stars.seed = Some(seed.wrapping_add(1));
        }
        self
    }

    /// Validate the configuration
    ///
    /// Every float the scene builder samples or divides by must be finite;
    /// TOML and RON both accept `inf` and `nan`.
    pub fn validate(&self) -> Result<(), String> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(format!("Camera FOV must be in (0, 180) degrees, got {}", camera.fov_degrees));
        }
        check_positive("camera near plane", camera.near)?;
        check_positive("camera far plane", camera.far)?;
        check_positive("camera distance", camera.distance)?;
        if camera.far <= camera.near {
            return Err(format!("Camera clip planes invalid: near {} far {}", camera.near, camera.far));
        }
        if !(0.0..=1.0).contains(&self.clear_alpha) {
            return Err(format!("Clear alpha must be in [0, 1], got {}", self.clear_alpha));
        }
        check_finite("globe spin speed", self.globe.spin_speed)?;

        if let Some(surface) = &self.globe.surface {
            check_positive("globe surface radius", surface.radius)?;
            if surface.detail > 6 {
                return Err(format!("Globe surface detail {} exceeds the supported maximum of 6", surface.detail));
            }
        }
        if let Some(model) = &self.globe.model {
            if model.path.is_empty() {
                return Err("Globe model path cannot be empty".to_string());
            }
            check_positive("globe model scale", model.scale)?;
        }

        if let Some(land) = &self.land_masses {
            check_positive("land mass min_scale", land.min_scale)?;
            check_positive("land mass max_scale", land.max_scale)?;
            if land.min_scale > land.max_scale {
                return Err(format!(
                    "Land mass min_scale {} exceeds max_scale {}",
                    land.min_scale, land.max_scale
                ));
            }
            check_positive("land mass piece radius", land.piece_radius)?;
            check_positive("land mass altitude", land.altitude)?;
            check_finite("land mass spin speed", land.spin_speed)?;
        }

        if let Some(glow) = &self.glow {
            check_positive("glow radius", glow.radius)?;
            check_opacity("glow", glow.base_opacity)?;
            check_finite("glow pulse amplitude", glow.pulse_amplitude)?;
            check_finite("glow scale amplitude", glow.scale_amplitude)?;
            check_finite("glow pulse speed", glow.pulse_speed)?;
        }

        if let Some(stars) = &self.starfield {
            check_positive("starfield extent", stars.extent)?;
            check_opacity("starfield", stars.opacity)?;
            check_finite("starfield spin speed", stars.spin_speed_x)?;
            check_finite("starfield spin speed", stars.spin_speed_y)?;
        }

        for (index, ring) in self.rings.iter().enumerate() {
            check_positive(&format!("ring {} radius", index), ring.radius)?;
            check_positive(&format!("ring {} tube", index), ring.tube)?;
            check_opacity("ring", ring.opacity)?;
            for value in [ring.tilt_x, ring.tilt_y, ring.spin_speed] {
                check_finite(&format!("ring {} orientation", index), value)?;
            }
        }

        for (index, satellite) in self.satellites.iter().enumerate() {
            check_positive(&format!("satellite {} size", index), satellite.size)?;
            for value in [
                satellite.orbit_radius,
                satellite.bob_amplitude,
                satellite.angular_speed,
                satellite.phase,
                satellite.emissive_intensity,
                satellite.spin_speed,
            ] {
                check_finite(&format!("satellite {} orbit", index), value)?;
            }
            if let Some(trail) = &satellite.trail {
                if trail.length < 2 {
                    return Err(format!("Satellite {} trail needs at least 2 points", index));
                }
                check_opacity("trail", trail.opacity)?;
            }
        }

        Ok(())
    }
}

fn check_finite(what: &str, value: f32) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{} must be finite, got {}", what, value))
    }
}

fn check_positive(what: &str, value: f32) -> Result<(), String> {
    check_finite(what, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be positive, got {}", what, value))
    }
}

fn check_opacity(what: &str, opacity: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(())
    } else {
        Err(format!("{} opacity must be in [0, 1], got {}", what, opacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(SceneConfig::orbital().validate().is_ok());
        assert!(SceneConfig::procedural().validate().is_ok());
    }

    #[test]
    fn test_default_is_orbital() {
        assert_eq!(SceneConfig::default(), SceneConfig::orbital());
    }

    #[test]
    fn test_validate_rejects_inverted_clip_planes() {
        let mut config = SceneConfig::procedural();
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_trail() {
        let mut config = SceneConfig::orbital();
        config.satellites[0].trail = Some(TrailSettings { length: 1, opacity: 0.4 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let mut config = SceneConfig::procedural();
        if let Some(land) = config.land_masses.as_mut() {
            land.max_scale = f32::INFINITY;
        }
        assert!(config.validate().is_err(), "Infinite max_scale must not reach the scatter sampler");

        let mut config = SceneConfig::procedural();
        if let Some(land) = config.land_masses.as_mut() {
            land.min_scale = f32::NAN;
        }
        assert!(config.validate().is_err());

        let mut config = SceneConfig::orbital();
        config.camera.far = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = SceneConfig::orbital();
        config.camera.near = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SceneConfig::orbital();
        if let Some(stars) = config.starfield.as_mut() {
            stars.extent = f32::NAN;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_infinite_scale_from_toml_is_rejected() {
        let text = r#"
            [land_masses]
            max_scale = inf
        "#;
        let config: SceneConfig = toml::from_str(text).expect("inf is valid TOML");
        assert!(config.land_masses.as_ref().is_some_and(|land| land.max_scale.is_infinite()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            clear_alpha = 1.0

            [camera]
            distance = 4.0
        "#;
        let config: SceneConfig = toml::from_str(text).expect("partial config should parse");
        assert_eq!(config.camera.distance, 4.0);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.rings.len(), 2, "Missing sections come from the orbital preset");
    }

    #[test]
    fn test_ron_file_round_trip() {
        let path = std::env::temp_dir().join(format!("globe_engine_scene_{}.ron", std::process::id()));
        let config = SceneConfig::procedural().with_seed(7);
        config.save_to_file(&path).expect("save should succeed");
        let loaded = SceneConfig::load_from_file(&path).expect("load should succeed");
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = SceneConfig::orbital().save_to_file("scene.yaml");
        assert!(matches!(result, Err(crate::config::ConfigError::UnsupportedFormat(_))));
    }
}
