//! Material system for rendering

use bitflags::bitflags;

use crate::foundation::math::{utils::rgb_from_hex, Vec3};

bitflags! {
    /// Shading switches of a material
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Alpha blended
        const TRANSPARENT = 1 << 0;
        /// Faceted look; the software backend shades per vertex either way
        const FLAT_SHADING = 1 << 1;
        /// Only surfaces facing away from the camera are drawn
        const BACK_SIDE = 1 << 2;
        /// Lighting is ignored; the base color is output as-is
        const UNLIT = 1 << 3;
    }
}

/// Surface description uploaded to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Debug name
    pub name: String,

    /// Base color (RGB, 0..1)
    pub color: Vec3,

    /// Emissive color added after lighting
    pub emissive: Vec3,

    /// Opacity (0.0 = invisible, 1.0 = opaque)
    pub opacity: f32,

    /// Point size in pixels for point topologies
    pub point_size: f32,

    /// Shading switches
    pub flags: MaterialFlags,
}

impl Material {
    /// Lit material with the given 0xRRGGBB color
    pub fn lit(color: u32) -> Self {
        Self {
            name: String::new(),
            color: rgb_from_hex(color),
            emissive: Vec3::zeros(),
            opacity: 1.0,
            point_size: 1.0,
            flags: MaterialFlags::empty(),
        }
    }

    /// Unlit material with the given 0xRRGGBB color
    pub fn unlit(color: u32) -> Self {
        let mut material = Self::lit(color);
        material.flags |= MaterialFlags::UNLIT;
        material
    }

    /// Set the debug name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set emissive color scaled by intensity
    pub fn with_emissive(mut self, color: u32, intensity: f32) -> Self {
        self.emissive = rgb_from_hex(color) * intensity;
        self
    }

    /// Set opacity; anything below 1 turns on blending
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.flags.set(MaterialFlags::TRANSPARENT, self.opacity < 1.0);
        self
    }

    /// Set point size for point clouds
    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size.max(1.0);
        self
    }

    /// Add shading flags
    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags |= flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_toggles_transparency() {
        let material = Material::unlit(0x3b82f6).with_opacity(0.6);
        assert!(material.flags.contains(MaterialFlags::TRANSPARENT | MaterialFlags::UNLIT));

        let opaque = material.with_opacity(1.0);
        assert!(!opaque.flags.contains(MaterialFlags::TRANSPARENT));
    }

    #[test]
    fn test_opacity_is_clamped() {
        assert_eq!(Material::lit(0xffffff).with_opacity(3.0).opacity, 1.0);
    }
}
