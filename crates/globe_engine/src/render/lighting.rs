//! Lighting system

use crate::config::LightingSettings;
use crate::foundation::math::{utils::rgb_from_hex, Vec3};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
}

/// Light source
#[derive(Debug, Clone)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// Light position (for point lights)
    pub position: Vec3,
    /// Direction the light travels (for directional lights)
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range (for point lights)
    pub range: f32,
}

impl Light {
    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction: direction.normalize(),
            color,
            intensity,
            range: 0.0,
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            direction: Vec3::zeros(),
            color,
            intensity,
            range,
        }
    }

    /// Diffuse contribution of this light at a surface point
    pub fn diffuse_at(&self, point: &Vec3, normal: &Vec3) -> Vec3 {
        match self.light_type {
            LightType::Directional => {
                let lambert = normal.dot(&(-self.direction)).max(0.0);
                self.color * (lambert * self.intensity)
            }
            LightType::Point => {
                let to_light = self.position - point;
                let distance = to_light.norm();
                if distance <= f32::EPSILON || (self.range > 0.0 && distance >= self.range) {
                    return Vec3::zeros();
                }
                let falloff = if self.range > 0.0 { 1.0 - distance / self.range } else { 1.0 };
                let lambert = normal.dot(&(to_light / distance)).max(0.0);
                self.color * (lambert * falloff * self.intensity)
            }
        }
    }
}

/// Lighting environment containing multiple lights
#[derive(Debug, Clone)]
pub struct LightingEnvironment {
    /// List of lights in the scene
    pub lights: Vec<Light>,
    /// Ambient light color
    pub ambient_color: Vec3,
    /// Ambient light intensity
    pub ambient_intensity: f32,
}

impl LightingEnvironment {
    /// Create a new empty lighting environment
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            ambient_color: Vec3::new(1.0, 1.0, 1.0),
            ambient_intensity: 0.1,
        }
    }

    /// Add a light to the environment
    pub fn add_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    /// Set ambient lighting
    pub fn with_ambient(mut self, color: Vec3, intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    /// Build the environment described by scene settings
    pub fn from_settings(settings: &LightingSettings) -> Self {
        let mut environment =
            Self::new().with_ambient(rgb_from_hex(settings.ambient_color), settings.ambient_intensity);

        for light in &settings.directional {
            let position = Vec3::from(light.position);
            let direction = if position.norm() > f32::EPSILON { -position } else { Vec3::new(0.0, -1.0, 0.0) };
            environment = environment.add_light(Light::directional(direction, rgb_from_hex(light.color), light.intensity));
        }
        for light in &settings.points {
            environment = environment.add_light(Light::point(
                Vec3::from(light.position),
                rgb_from_hex(light.color),
                light.intensity,
                light.range,
            ));
        }

        environment
    }

    /// Total light reaching a surface point (ambient plus every light)
    pub fn irradiance(&self, point: &Vec3, normal: &Vec3) -> Vec3 {
        self.lights
            .iter()
            .fold(self.ambient_color * self.ambient_intensity, |acc, light| acc + light.diffuse_at(point, normal))
    }
}

impl Default for LightingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
