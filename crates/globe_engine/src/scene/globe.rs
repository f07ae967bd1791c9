//! # Globe Scene
//!
//! Turns a [`SceneConfig`] into scene-graph nodes backed by backend
//! resources, and animates them as pure functions of elapsed time.
//!
//! ## Node Layout
//!
//! ```text
//! globe pivot (rotation.y = t * spin)
//! ├── surface            procedural icosphere, optional
//! ├── model              attached once the model request completes
//! └── land group         extra spin on top of the pivot
//!     └── land pieces
//! glow                   back-side shell, pulses in scale and opacity
//! starfield              point cloud
//! rings                  tilted tori spinning around their own Z
//! satellites             orbit in XZ with a vertical bob
//! trails                 line strips in world space
//! ```
//!
//! Every handle created here is recorded in [`SceneResources`] and destroyed
//! exactly once by [`GlobeScene::destroy_resources`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::scene_graph::{Drawable, NodeId, SceneGraph, SceneNode};
use super::trail::Trail;
use crate::config::{
    GlowSettings, LandMassSettings, ModelSettings, RingSettings, SatelliteSettings, SatelliteShape, Scatter,
    SceneConfig, StarfieldSettings,
};
use crate::foundation::math::{constants::TAU, utils, Transform, Vec3};
use crate::render::{
    BackendResult, DrawCall, GeometryHandle, Material, MaterialFlags, MaterialHandle, Mesh, RenderBackend, Topology,
};

/// Satellite position at time `t`: `(cos(tw+φ)·r, sin(tw)·bob, sin(tw+φ)·r)`
pub fn satellite_position(settings: &SatelliteSettings, t: f32) -> Vec3 {
    let angle = t * settings.angular_speed + settings.phase;
    Vec3::new(
        angle.cos() * settings.orbit_radius,
        (t * settings.angular_speed).sin() * settings.bob_amplitude,
        angle.sin() * settings.orbit_radius,
    )
}

/// Glow `(scale, opacity)` at time `t`
pub fn glow_pulse(settings: &GlowSettings, t: f32) -> (f32, f32) {
    let wave = (t * settings.pulse_speed).sin();
    (
        1.0 + wave * settings.scale_amplitude,
        (settings.base_opacity + wave * settings.pulse_amplitude).clamp(0.0, 1.0),
    )
}

/// Backend handles owned by one scene
#[derive(Debug, Default)]
pub struct SceneResources {
    geometries: Vec<GeometryHandle>,
    materials: Vec<MaterialHandle>,
}

impl SceneResources {
    /// Number of live geometry handles
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Number of live material handles
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    fn geometry(&mut self, backend: &mut dyn RenderBackend, mesh: &Mesh, topology: Topology) -> BackendResult<GeometryHandle> {
        let handle = backend.create_geometry(mesh, topology)?;
        self.geometries.push(handle);
        Ok(handle)
    }

    fn material(&mut self, backend: &mut dyn RenderBackend, material: &Material) -> BackendResult<MaterialHandle> {
        let handle = backend.create_material(material)?;
        self.materials.push(handle);
        Ok(handle)
    }

    fn drawable(
        &mut self,
        backend: &mut dyn RenderBackend,
        mesh: &Mesh,
        topology: Topology,
        material: &Material,
    ) -> BackendResult<Drawable> {
        Ok(Drawable {
            geometry: self.geometry(backend, mesh, topology)?,
            material: self.material(backend, material)?,
        })
    }

    /// Destroy every handle once; returns how many destroys failed
    fn destroy_all(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let mut failures = 0;
        for handle in self.geometries.drain(..) {
            if let Err(err) = backend.destroy_geometry(handle) {
                log::warn!("Failed to destroy geometry {:?}: {}", handle, err);
                failures += 1;
            }
        }
        for handle in self.materials.drain(..) {
            if let Err(err) = backend.destroy_material(handle) {
                log::warn!("Failed to destroy material {:?}: {}", handle, err);
                failures += 1;
            }
        }
        failures
    }
}

#[derive(Debug)]
struct RingRig {
    node: NodeId,
    settings: RingSettings,
}

#[derive(Debug)]
struct SatelliteRig {
    node: NodeId,
    settings: SatelliteSettings,
    trail: Option<(Trail, GeometryHandle)>,
}

#[derive(Debug)]
struct StarRig {
    node: NodeId,
    spin_x: f32,
    spin_y: f32,
}

/// Scene graph plus the animation rigs driving it
#[derive(Debug)]
pub struct GlobeScene {
    graph: SceneGraph,
    resources: SceneResources,
    globe_spin: f32,
    globe_pivot: NodeId,
    land: Option<(NodeId, f32)>,
    glow: Option<(NodeId, GlowSettings)>,
    stars: Option<StarRig>,
    rings: Vec<RingRig>,
    satellites: Vec<SatelliteRig>,
    model: Option<NodeId>,
}

impl GlobeScene {
    /// Build every configured element. On failure the handles created so far
    /// are destroyed before the error is returned.
    pub fn build(config: &SceneConfig, backend: &mut dyn RenderBackend) -> BackendResult<Self> {
        let mut graph = SceneGraph::new();
        let globe_pivot = graph.insert(SceneNode::pivot("globe"));
        let mut scene = Self {
            graph,
            resources: SceneResources::default(),
            globe_spin: config.globe.spin_speed,
            globe_pivot,
            land: None,
            glow: None,
            stars: None,
            rings: Vec::new(),
            satellites: Vec::new(),
            model: None,
        };

        match scene.populate(config, backend) {
            Ok(()) => {
                log::debug!(
                    "Globe scene built: {} nodes, {} geometries, {} materials",
                    scene.graph.len(),
                    scene.resources.geometry_count(),
                    scene.resources.material_count()
                );
                Ok(scene)
            }
            Err(err) => {
                scene.destroy_resources(backend);
                Err(err)
            }
        }
    }

    fn populate(&mut self, config: &SceneConfig, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        if let Some(surface) = &config.globe.surface {
            let material = Material::lit(surface.color)
                .with_name("surface")
                .with_emissive(surface.emissive, 1.0)
                .with_flags(MaterialFlags::FLAT_SHADING);
            let drawable = self.resources.drawable(
                backend,
                &Mesh::icosphere(surface.radius, surface.detail),
                Topology::Triangles,
                &material,
            )?;
            self.graph.insert(SceneNode::drawable("surface", drawable).with_parent(self.globe_pivot));
        }

        if let Some(land) = &config.land_masses {
            self.add_land_masses(land, backend)?;
        }
        if let Some(glow) = &config.glow {
            self.add_glow(glow, backend)?;
        }
        if let Some(stars) = &config.starfield {
            self.add_starfield(stars, backend)?;
        }
        for ring in &config.rings {
            self.add_ring(ring, backend)?;
        }
        for satellite in &config.satellites {
            self.add_satellite(satellite, backend)?;
        }
        Ok(())
    }

    fn add_land_masses(&mut self, settings: &LandMassSettings, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        let group = self.graph.insert(SceneNode::pivot("land masses").with_parent(self.globe_pivot));
        self.land = Some((group, settings.spin_speed));

        // One shared geometry and material for every piece
        let drawable = self.resources.drawable(
            backend,
            &Mesh::icosphere(settings.piece_radius, 0),
            Topology::Triangles,
            &Material::lit(settings.color).with_name("land").with_flags(MaterialFlags::FLAT_SHADING),
        )?;

        let mut rng = seeded_rng(settings.seed);
        let count = settings.count.max(1) as f32;
        for index in 0..settings.count {
            let (phi, theta) = match settings.scatter {
                Scatter::Spiral => {
                    let phi = (-1.0 + 2.0 * index as f32 / count).clamp(-1.0, 1.0).acos();
                    (phi, (count * std::f32::consts::PI).sqrt() * phi)
                }
                Scatter::Random => ((2.0 * rng.gen::<f32>() - 1.0).acos(), rng.gen::<f32>() * TAU),
            };
            let scale = rng.gen_range(settings.min_scale..=settings.max_scale);
            let transform = Transform::from_position(utils::spherical_to_cartesian(settings.altitude, phi, theta))
                .with_uniform_scale(scale);
            self.graph.insert(
                SceneNode::drawable(format!("land {}", index), drawable)
                    .with_parent(group)
                    .with_transform(transform),
            );
        }
        Ok(())
    }

    fn add_glow(&mut self, settings: &GlowSettings, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        // Opacity is animated on the node, so the material carries full alpha
        let material = Material::unlit(settings.color)
            .with_name("glow")
            .with_flags(MaterialFlags::BACK_SIDE | MaterialFlags::TRANSPARENT);
        let drawable = self
            .resources
            .drawable(backend, &Mesh::uv_sphere(settings.radius, 32, 32), Topology::Triangles, &material)?;
        let mut node = SceneNode::drawable("glow", drawable);
        node.opacity = settings.base_opacity;
        let id = self.graph.insert(node);
        self.glow = Some((id, settings.clone()));
        Ok(())
    }

    fn add_starfield(&mut self, settings: &StarfieldSettings, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        let mut rng = seeded_rng(settings.seed);
        let points: Vec<Vec3> = (0..settings.count)
            .map(|_| {
                Vec3::new(
                    (rng.gen::<f32>() - 0.5) * settings.extent,
                    (rng.gen::<f32>() - 0.5) * settings.extent,
                    (rng.gen::<f32>() - 0.5) * settings.extent,
                )
            })
            .collect();
        let material = Material::unlit(settings.color)
            .with_name("stars")
            .with_opacity(settings.opacity)
            .with_point_size(1.0);
        let drawable = self
            .resources
            .drawable(backend, &Mesh::point_cloud(&points), Topology::Points, &material)?;
        let node = self.graph.insert(SceneNode::drawable("starfield", drawable));
        self.stars = Some(StarRig {
            node,
            spin_x: settings.spin_speed_x,
            spin_y: settings.spin_speed_y,
        });
        Ok(())
    }

    fn add_ring(&mut self, settings: &RingSettings, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        let material = Material::unlit(settings.color).with_name("ring").with_opacity(settings.opacity);
        let drawable = self.resources.drawable(
            backend,
            &Mesh::torus(settings.radius, settings.tube, 16, 100),
            Topology::Triangles,
            &material,
        )?;
        let node = self.graph.insert(
            SceneNode::drawable("ring", drawable)
                .with_transform(Transform::from_rotation(settings.tilt_x, settings.tilt_y, 0.0)),
        );
        self.rings.push(RingRig {
            node,
            settings: settings.clone(),
        });
        Ok(())
    }

    fn add_satellite(&mut self, settings: &SatelliteSettings, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        let mesh = match settings.shape {
            SatelliteShape::Sphere => Mesh::uv_sphere(settings.size, 16, 16),
            SatelliteShape::Cube => Mesh::cuboid(settings.size),
        };
        let material = Material::lit(settings.color)
            .with_name("satellite")
            .with_emissive(settings.color, settings.emissive_intensity);
        let drawable = self.resources.drawable(backend, &mesh, Topology::Triangles, &material)?;
        let node = self.graph.insert(
            SceneNode::drawable("satellite", drawable)
                .with_transform(Transform::from_position(satellite_position(settings, 0.0))),
        );

        let trail = match &settings.trail {
            Some(trail_settings) => {
                let trail = Trail::new(trail_settings.length);
                let line = Material::unlit(settings.color)
                    .with_name("trail")
                    .with_opacity(trail_settings.opacity);
                let drawable =
                    self.resources
                        .drawable(backend, &Mesh::line_strip(trail.capacity()), Topology::LineStrip, &line)?;
                self.graph.insert(SceneNode::drawable("trail", drawable));
                Some((trail, drawable.geometry))
            }
            None => None,
        };

        self.satellites.push(SatelliteRig {
            node,
            settings: settings.clone(),
            trail,
        });
        Ok(())
    }

    /// Attach the loaded globe model under the pivot, fitted to the model scale
    pub fn attach_model(
        &mut self,
        mesh: Mesh,
        settings: &ModelSettings,
        backend: &mut dyn RenderBackend,
    ) -> BackendResult<()> {
        if self.model.is_some() {
            log::warn!("Globe model already attached; ignoring second model");
            return Ok(());
        }
        let mesh = mesh.normalized_to_radius(settings.scale);
        let material = Material::lit(settings.color).with_name("model");
        let drawable = self.resources.drawable(backend, &mesh, Topology::Triangles, &material)?;
        self.model = Some(self.graph.insert(SceneNode::drawable("model", drawable).with_parent(self.globe_pivot)));
        log::info!("Globe model attached ({} vertices)", mesh.vertex_count());
        Ok(())
    }

    /// Set every animated transform for elapsed time `t` and record trail points
    pub fn animate(&mut self, t: f32) {
        if let Some(pivot) = self.graph.get_mut(self.globe_pivot) {
            pivot.transform.rotation.y = t * self.globe_spin;
        }

        if let Some((group, spin)) = self.land {
            if let Some(node) = self.graph.get_mut(group) {
                node.transform.rotation.y = t * spin;
            }
        }

        if let Some((id, settings)) = &self.glow {
            let (scale, opacity) = glow_pulse(settings, t);
            if let Some(node) = self.graph.get_mut(*id) {
                node.transform.scale = Vec3::repeat(scale);
                node.opacity = opacity;
            }
        }

        if let Some(stars) = &self.stars {
            if let Some(node) = self.graph.get_mut(stars.node) {
                node.transform.rotation = Vec3::new(t * stars.spin_x, t * stars.spin_y, 0.0);
            }
        }

        for ring in &self.rings {
            if let Some(node) = self.graph.get_mut(ring.node) {
                node.transform.rotation =
                    Vec3::new(ring.settings.tilt_x, ring.settings.tilt_y, t * ring.settings.spin_speed);
            }
        }

        for satellite in &mut self.satellites {
            let position = satellite_position(&satellite.settings, t);
            if let Some(node) = self.graph.get_mut(satellite.node) {
                node.transform.position = position;
                node.transform.rotation.y = t * satellite.settings.spin_speed;
            }
            if let Some((trail, _)) = satellite.trail.as_mut() {
                trail.record(position);
            }
        }
    }

    /// Push trail positions into their line geometries
    pub fn upload_trails(&mut self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        for satellite in &mut self.satellites {
            if let Some((trail, geometry)) = satellite.trail.as_mut() {
                trail.upload(backend, *geometry)?;
            }
        }
        Ok(())
    }

    /// Submit one draw call per visible drawable node
    pub fn draw(&self, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        for item in self.graph.render_items() {
            backend.draw(&DrawCall {
                geometry: item.drawable.geometry,
                material: item.drawable.material,
                model: item.world,
                opacity: item.opacity,
            })?;
        }
        Ok(())
    }

    /// Destroy every backend handle this scene created and clear the graph.
    /// Safe to call more than once.
    pub fn destroy_resources(&mut self, backend: &mut dyn RenderBackend) {
        let failures = self.resources.destroy_all(backend);
        if failures > 0 {
            log::warn!("{} scene resources could not be destroyed", failures);
        }
        self.graph.clear();
        self.glow = None;
        self.stars = None;
        self.land = None;
        self.model = None;
        self.rings.clear();
        self.satellites.clear();
    }

    /// Y rotation of the globe pivot
    pub fn globe_rotation(&self) -> f32 {
        self.graph
            .get(self.globe_pivot)
            .map_or(0.0, |node| node.transform.rotation.y)
    }

    /// Local transform of the glow shell and its opacity
    pub fn glow_state(&self) -> Option<(Transform, f32)> {
        let (id, _) = self.glow.as_ref()?;
        self.graph.get(*id).map(|node| (node.transform.clone(), node.opacity))
    }

    /// Current satellite positions
    pub fn satellite_positions(&self) -> Vec<Vec3> {
        self.satellites
            .iter()
            .filter_map(|rig| self.graph.get(rig.node).map(|node| node.transform.position))
            .collect()
    }

    /// Current euler rotations of the rings
    pub fn ring_rotations(&self) -> Vec<Vec3> {
        self.rings
            .iter()
            .filter_map(|rig| self.graph.get(rig.node).map(|node| node.transform.rotation))
            .collect()
    }

    /// Current starfield rotation
    pub fn starfield_rotation(&self) -> Option<Vec3> {
        let stars = self.stars.as_ref()?;
        self.graph.get(stars.node).map(|node| node.transform.rotation)
    }

    /// Lengths and capacities of the satellite trails
    pub fn trail_fill(&self) -> Vec<(usize, usize)> {
        self.satellites
            .iter()
            .filter_map(|rig| rig.trail.as_ref().map(|(trail, _)| (trail.len(), trail.capacity())))
            .collect()
    }

    /// True once a model mesh is attached
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// World positions of the land pieces
    pub fn land_positions(&self) -> Vec<Vec3> {
        let Some((group, _)) = self.land else {
            return Vec::new();
        };
        let mut positions = Vec::new();
        for child in self.graph.children_of(group) {
            if let Some(node) = self.graph.get(child) {
                positions.push(node.transform.position);
            }
        }
        positions
    }

    /// Backend handles held by this scene
    pub fn resources(&self) -> &SceneResources {
        &self.resources
    }

    /// Scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::trace!("Scatter seed {}", seed);
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::render::SoftwareBackend;
    use approx::assert_relative_eq;

    #[test]
    fn test_satellite_formula_matches_orbit() {
        let settings = &SceneConfig::orbital().satellites[1];
        let t = 2.0;
        let p = satellite_position(settings, t);
        assert_relative_eq!(p.x, (t * 0.3 + std::f32::consts::PI).cos() * 2.5, epsilon = 1e-5);
        assert_relative_eq!(p.y, (t * 0.3).sin() * 0.3, epsilon = 1e-5);
        assert_relative_eq!(p.z, (t * 0.3 + std::f32::consts::PI).sin() * 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_glow_pulse_bounds() {
        let settings = GlowSettings::default();
        for step in 0..100 {
            let (scale, opacity) = glow_pulse(&settings, step as f32 * 0.37);
            assert!((0.95..=1.05).contains(&scale));
            assert!((0.15 - 1e-6..=0.25 + 1e-6).contains(&opacity));
        }
    }

    #[test]
    fn test_procedural_land_masses_sit_on_sphere() {
        let mut backend = SoftwareBackend::new(64, 64);
        let config = SceneConfig::procedural().with_seed(3);
        let scene = GlobeScene::build(&config, &mut backend).expect("procedural scene builds");

        let positions = scene.land_positions();
        assert_eq!(positions.len(), 15);
        for p in positions {
            assert_relative_eq!(p.norm(), 1.01, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_destroy_resources_balances_ledger() {
        let mut backend = SoftwareBackend::new(64, 64);
        let ledger = backend.ledger();
        let mut scene = GlobeScene::build(&SceneConfig::orbital(), &mut backend).expect("orbital scene builds");

        scene.destroy_resources(&mut backend);
        scene.destroy_resources(&mut backend);

        let counts = ledger.snapshot();
        assert!(counts.geometries_created > 0);
        assert_eq!(counts.geometries_created, counts.geometries_destroyed);
        assert_eq!(counts.materials_created, counts.materials_destroyed);
    }
}
