//! # Software Backend
//!
//! CPU renderer writing into an RGBA framebuffer with a depth buffer.
//!
//! ## Pipeline
//!
//! 1. Every vertex is transformed to world space and projected through the
//!    camera. Vertices outside the near/far range are clipped.
//! 2. Indexed triangles are culled against the camera (back-side materials
//!    keep only the faces pointing away), then filled with edge functions.
//!    Depth and color are interpolated with barycentric weights.
//! 3. Points are splatted as `point_size` squares and line strips are drawn
//!    as connected segments.
//!
//! Lit materials use Lambert plus ambient lighting, per vertex or once per
//! face with [`MaterialFlags::FLAT_SHADING`]. Translucent draws are alpha
//! blended and do not write depth. Triangles with a clipped vertex are
//! dropped whole; there is no near-plane clipping.
//!
//! The backend keeps a shared [`ResourceLedger`] of everything it allocates
//! and frees. Clone the ledger before handing the backend to its owner to
//! observe disposal after the owner is gone.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use slotmap::SlotMap;

use super::backend::{
    BackendResult, CameraMatrices, DrawCall, FrameStats, GeometryHandle, MaterialHandle, RenderBackend,
};
use super::{LightingEnvironment, Material, MaterialFlags, Mesh, RenderError, Topology, Vertex};
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Resource counters recorded by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    /// Geometries created
    pub geometries_created: usize,
    /// Geometries destroyed
    pub geometries_destroyed: usize,
    /// Materials created
    pub materials_created: usize,
    /// Materials destroyed
    pub materials_destroyed: usize,
    /// Successful context releases
    pub contexts_released: usize,
    /// Frames presented through `end_frame`
    pub frames_presented: usize,
    /// Bytes of vertex and index data currently held
    pub live_bytes: usize,
}

impl LedgerCounts {
    /// Geometries created but not destroyed
    pub fn live_geometries(&self) -> usize {
        self.geometries_created.saturating_sub(self.geometries_destroyed)
    }

    /// Materials created but not destroyed
    pub fn live_materials(&self) -> usize {
        self.materials_created.saturating_sub(self.materials_destroyed)
    }
}

/// Shared, clonable view of a backend's resource counters
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger(Rc<RefCell<LedgerCounts>>);

impl ResourceLedger {
    /// Copy of the current counters
    pub fn snapshot(&self) -> LedgerCounts {
        *self.0.borrow()
    }

    fn record(&self, update: impl FnOnce(&mut LedgerCounts)) {
        update(&mut self.0.borrow_mut());
    }
}

struct GeometryData {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    topology: Topology,
}

impl GeometryData {
    fn byte_size(&self) -> usize {
        bytemuck::cast_slice::<Vertex, u8>(&self.vertices).len() + bytemuck::cast_slice::<u32, u8>(&self.indices).len()
    }

    /// Vertex indices of every triangle; unindexed meshes are read as a plain list
    fn triangles(&self) -> Vec<[usize; 3]> {
        let count = self.vertices.len();
        let corners: Vec<usize> = if self.indices.is_empty() {
            (0..count).collect()
        } else {
            self.indices.iter().map(|&i| i as usize).collect()
        };
        corners
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < count))
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect()
    }
}

/// A vertex after the model transform, with its screen position if visible
#[derive(Debug, Clone, Copy)]
struct TransformedVertex {
    world: Vec3,
    normal: Vec3,
    /// Pixel x, pixel y, depth in [0, 1]
    screen: Option<Vec3>,
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn shade(lighting: &LightingEnvironment, material: &Material, world: &Vec3, normal: &Vec3, opacity: f32) -> [f32; 4] {
    let rgb = if material.flags.contains(MaterialFlags::UNLIT) {
        material.color + material.emissive
    } else {
        material.color.component_mul(&lighting.irradiance(world, normal)) + material.emissive
    };
    [
        rgb.x.clamp(0.0, 1.0),
        rgb.y.clamp(0.0, 1.0),
        rgb.z.clamp(0.0, 1.0),
        (material.opacity * opacity).clamp(0.0, 1.0),
    ]
}

/// Color and depth targets
struct Surface {
    color: RgbaImage,
    depth: Vec<f32>,
}

impl Surface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            color: RgbaImage::new(width, height),
            depth: vec![f32::INFINITY; pixel_count(width, height)],
        }
    }

    fn clear(&mut self, clear_color: [f32; 4]) {
        let clear = Rgba(clear_color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
        for pixel in self.color.pixels_mut() {
            *pixel = clear;
        }
        self.depth.fill(f32::INFINITY);
    }

    fn blend_pixel(&mut self, x: i64, y: i64, depth: f32, color: [f32; 4], write_depth: bool) -> bool {
        let (width, height) = self.color.dimensions();
        if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) || color[3] <= 0.0 {
            return false;
        }
        let (x, y) = (x as u32, y as u32);
        let index = y as usize * width as usize + x as usize;
        if depth > self.depth[index] {
            return false;
        }
        if write_depth {
            self.depth[index] = depth;
        }

        let alpha = color[3];
        let Rgba(dst) = *self.color.get_pixel(x, y);
        let mut out = [0u8; 4];
        for channel in 0..3 {
            let existing = f32::from(dst[channel]) / 255.0;
            out[channel] = ((color[channel] * alpha + existing * (1.0 - alpha)) * 255.0).round() as u8;
        }
        let existing_alpha = f32::from(dst[3]) / 255.0;
        out[3] = ((alpha + existing_alpha * (1.0 - alpha)) * 255.0).round() as u8;
        self.color.put_pixel(x, y, Rgba(out));
        true
    }

    fn splat(&mut self, at: &Vec3, color: [f32; 4], size: f32, write_depth: bool) -> u64 {
        let extent = size.max(1.0).round() as i64;
        let x0 = at.x.floor() as i64 - extent / 2;
        let y0 = at.y.floor() as i64 - extent / 2;
        let mut written = 0;
        for dy in 0..extent {
            for dx in 0..extent {
                if self.blend_pixel(x0 + dx, y0 + dy, at.z, color, write_depth) {
                    written += 1;
                }
            }
        }
        written
    }

    fn line(&mut self, from: &Vec3, to: &Vec3, color: [f32; 4], write_depth: bool) -> u64 {
        let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil().max(1.0) as u32;
        let mut written = 0;
        for step in 0..=steps {
            let p = from.lerp(to, step as f32 / steps as f32);
            if self.blend_pixel(p.x.floor() as i64, p.y.floor() as i64, p.z, color, write_depth) {
                written += 1;
            }
        }
        written
    }

    /// Fill a screen-space triangle, sampling at pixel centers
    fn triangle(&mut self, corners: [Vec3; 3], colors: [[f32; 4]; 3], write_depth: bool) -> u64 {
        let [a, b, c] = corners;
        let area = edge(&a, &b, &c);
        if area.abs() <= f32::EPSILON {
            return 0;
        }

        let (width, height) = self.color.dimensions();
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i64;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i64;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(width as f32 - 1.0) as i64;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(height as f32 - 1.0) as i64;

        let mut written = 0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                // Normalized by the signed area, so either winding gives positive weights inside
                let w0 = edge(&b, &c, &p) / area;
                let w1 = edge(&c, &a, &p) / area;
                let w2 = edge(&a, &b, &p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * a.z + w1 * b.z + w2 * c.z;
                let mut color = [0.0; 4];
                for (channel, value) in color.iter_mut().enumerate() {
                    *value = w0 * colors[0][channel] + w1 * colors[1][channel] + w2 * colors[2][channel];
                }
                if self.blend_pixel(x, y, depth, color, write_depth) {
                    written += 1;
                }
            }
        }
        written
    }

    fn covered_pixels(&self) -> usize {
        self.color.pixels().filter(|p| p.0[3] > 0).count()
    }
}

/// Twice the signed area of (a, b, p) in screen space
fn edge(a: &Vec3, b: &Vec3, p: &Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// CPU rendering backend writing into an [`RgbaImage`]
pub struct SoftwareBackend {
    surface: Surface,
    geometries: SlotMap<GeometryHandle, GeometryData>,
    materials: SlotMap<MaterialHandle, Material>,
    lighting: LightingEnvironment,
    camera: Option<CameraMatrices>,
    stats: FrameStats,
    ledger: ResourceLedger,
    released: bool,
}

impl SoftwareBackend {
    /// Create a backend with a surface of the given size (clamped to 1x1)
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        log::debug!("Creating software backend with {}x{} surface", width, height);
        Self {
            surface: Surface::new(width, height),
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            lighting: LightingEnvironment::default(),
            camera: None,
            stats: FrameStats::default(),
            ledger: ResourceLedger::default(),
            released: false,
        }
    }

    /// Shared handle to this backend's resource counters
    pub fn ledger(&self) -> ResourceLedger {
        self.ledger.clone()
    }

    /// Current framebuffer contents
    pub fn framebuffer(&self) -> &RgbaImage {
        &self.surface.color
    }

    /// Number of pixels with non-zero alpha
    pub fn covered_pixels(&self) -> usize {
        self.surface.covered_pixels()
    }

    fn ensure_live(&self) -> BackendResult<()> {
        if self.released {
            Err(RenderError::ContextReleased)
        } else {
            Ok(())
        }
    }
}

fn transform_vertex(camera: &CameraMatrices, model: &Mat4, size: (u32, u32), vertex: &Vertex) -> TransformedVertex {
    let p = vertex.position;
    let world_h = model * Vec4::new(p[0], p[1], p[2], 1.0);
    let world = world_h.xyz();
    let normal = (model.fixed_view::<3, 3>(0, 0) * vertex.normal_vec())
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vec3::zeros);

    let clip = camera.view_projection * world_h;
    let screen = if clip.w <= f32::EPSILON {
        None
    } else {
        let ndc = clip.xyz() / clip.w;
        (0.0..=1.0).contains(&ndc.z).then(|| {
            Vec3::new(
                (ndc.x + 1.0) * 0.5 * size.0 as f32,
                (ndc.y + 1.0) * 0.5 * size.1 as f32,
                ndc.z,
            )
        })
    };

    TransformedVertex { world, normal, screen }
}

fn on_screen(point: &Vec3, size: (u32, u32)) -> bool {
    point.x >= 0.0 && point.y >= 0.0 && point.x < size.0 as f32 && point.y < size.1 as f32
}

impl RenderBackend for SoftwareBackend {
    fn create_geometry(&mut self, mesh: &Mesh, topology: Topology) -> BackendResult<GeometryHandle> {
        self.ensure_live()?;
        let data = GeometryData {
            vertices: mesh.vertices.clone(),
            indices: mesh.indices.clone(),
            topology,
        };
        let bytes = data.byte_size();
        let handle = self.geometries.insert(data);
        self.ledger.record(|counts| {
            counts.geometries_created += 1;
            counts.live_bytes += bytes;
        });
        log::trace!("Created {:?} geometry {:?} ({} vertices)", topology, handle, mesh.vertex_count());
        Ok(handle)
    }

    fn update_geometry_positions(&mut self, handle: GeometryHandle, positions: &[Vec3]) -> BackendResult<()> {
        self.ensure_live()?;
        let geometry = self
            .geometries
            .get_mut(handle)
            .ok_or(RenderError::UnknownResource { kind: "geometry" })?;
        if geometry.vertices.len() != positions.len() {
            return Err(RenderError::GeometrySizeMismatch {
                expected: geometry.vertices.len(),
                actual: positions.len(),
            });
        }
        for (vertex, position) in geometry.vertices.iter_mut().zip(positions) {
            vertex.position = (*position).into();
        }
        Ok(())
    }

    fn destroy_geometry(&mut self, handle: GeometryHandle) -> BackendResult<()> {
        self.ensure_live()?;
        let data = self
            .geometries
            .remove(handle)
            .ok_or(RenderError::UnknownResource { kind: "geometry" })?;
        let bytes = data.byte_size();
        self.ledger.record(|counts| {
            counts.geometries_destroyed += 1;
            counts.live_bytes = counts.live_bytes.saturating_sub(bytes);
        });
        Ok(())
    }

    fn create_material(&mut self, material: &Material) -> BackendResult<MaterialHandle> {
        self.ensure_live()?;
        let handle = self.materials.insert(material.clone());
        self.ledger.record(|counts| counts.materials_created += 1);
        Ok(handle)
    }

    fn destroy_material(&mut self, handle: MaterialHandle) -> BackendResult<()> {
        self.ensure_live()?;
        self.materials
            .remove(handle)
            .ok_or(RenderError::UnknownResource { kind: "material" })?;
        self.ledger.record(|counts| counts.materials_destroyed += 1);
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> BackendResult<()> {
        self.ensure_live()?;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSurfaceSize { width, height });
        }
        if self.surface.color.dimensions() != (width, height) {
            self.surface = Surface::new(width, height);
            log::debug!("Software surface resized to {}x{}", width, height);
        }
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface.color.dimensions()
    }

    fn set_lighting(&mut self, lighting: &LightingEnvironment) -> BackendResult<()> {
        self.ensure_live()?;
        self.lighting = lighting.clone();
        Ok(())
    }

    fn begin_frame(&mut self, clear_color: [f32; 4], camera: &CameraMatrices) -> BackendResult<()> {
        self.ensure_live()?;
        if self.camera.is_some() {
            return Err(RenderError::FrameSequence("begin_frame called twice".to_string()));
        }
        self.surface.clear(clear_color);
        self.camera = Some(*camera);
        self.stats = FrameStats::default();
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> BackendResult<()> {
        self.ensure_live()?;
        let camera = self
            .camera
            .ok_or_else(|| RenderError::FrameSequence("draw called outside a frame".to_string()))?;
        let Self {
            surface,
            geometries,
            materials,
            lighting,
            stats,
            ..
        } = self;
        let geometry = geometries
            .get(call.geometry)
            .ok_or(RenderError::UnknownResource { kind: "geometry" })?;
        let material = materials
            .get(call.material)
            .ok_or(RenderError::UnknownResource { kind: "material" })?;
        let lighting: &LightingEnvironment = lighting;

        let size = surface.color.dimensions();
        let write_depth = !material.flags.contains(MaterialFlags::TRANSPARENT) && call.opacity >= 1.0;
        let transformed: Vec<TransformedVertex> = geometry
            .vertices
            .iter()
            .map(|vertex| transform_vertex(&camera, &call.model, size, vertex))
            .collect();
        let color_of = |v: &TransformedVertex| shade(lighting, material, &v.world, &v.normal, call.opacity);

        let mut written = 0;
        match geometry.topology {
            Topology::Points => {
                for vertex in &transformed {
                    if let Some(at) = vertex.screen.filter(|at| on_screen(at, size)) {
                        written += surface.splat(&at, color_of(vertex), material.point_size, write_depth);
                    }
                }
            }
            Topology::LineStrip => {
                for pair in transformed.windows(2) {
                    let visible = |v: &TransformedVertex| v.screen.filter(|at| on_screen(at, size));
                    if let (Some(from), Some(to)) = (visible(&pair[0]), visible(&pair[1])) {
                        written += surface.line(&from, &to, color_of(&pair[0]), write_depth);
                    }
                }
            }
            Topology::Triangles => {
                let back_side = material.flags.contains(MaterialFlags::BACK_SIDE);
                let flat = material.flags.contains(MaterialFlags::FLAT_SHADING);
                for [i0, i1, i2] in geometry.triangles() {
                    let (v0, v1, v2) = (&transformed[i0], &transformed[i1], &transformed[i2]);
                    let (Some(s0), Some(s1), Some(s2)) = (v0.screen, v1.screen, v2.screen) else {
                        continue;
                    };

                    // Face normal oriented by the vertex normals, so culling does not depend on winding
                    let mut face_normal = (v1.world - v0.world).cross(&(v2.world - v0.world));
                    if face_normal.dot(&(v0.normal + v1.normal + v2.normal)) < 0.0 {
                        face_normal = -face_normal;
                    }
                    let centroid = (v0.world + v1.world + v2.world) / 3.0;
                    let facing = face_normal.dot(&(camera.position - centroid)) > 0.0;
                    if facing == back_side {
                        continue;
                    }

                    let colors = if flat {
                        let color = shade(
                            lighting,
                            material,
                            &centroid,
                            &face_normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros),
                            call.opacity,
                        );
                        [color; 3]
                    } else {
                        [color_of(v0), color_of(v1), color_of(v2)]
                    };
                    written += surface.triangle([s0, s1, s2], colors, write_depth);
                }
            }
        }

        stats.draw_calls += 1;
        stats.vertices_processed += transformed.len() as u64;
        stats.pixels_written += written;
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<FrameStats> {
        self.ensure_live()?;
        if self.camera.take().is_none() {
            return Err(RenderError::FrameSequence("end_frame called without begin_frame".to_string()));
        }
        self.ledger.record(|counts| counts.frames_presented += 1);
        log::trace!("Frame presented: {:?}", self.stats);
        Ok(self.stats)
    }

    fn save_frame(&self, path: &Path) -> BackendResult<()> {
        self.surface
            .color
            .save(path)
            .map_err(|e| RenderError::FrameOutput(format!("{}: {}", path.display(), e)))
    }

    fn release(&mut self) -> BackendResult<()> {
        self.ensure_live()?;
        if !self.geometries.is_empty() || !self.materials.is_empty() {
            log::warn!(
                "Releasing software backend with {} geometries and {} materials still alive",
                self.geometries.len(),
                self.materials.len()
            );
        }
        self.geometries.clear();
        self.materials.clear();
        self.camera = None;
        self.released = true;
        self.ledger.record(|counts| counts.contexts_released += 1);
        log::debug!("Software backend released");
        Ok(())
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Camera;

    fn camera_matrices() -> CameraMatrices {
        let camera = Camera::default();
        CameraMatrices {
            view_projection: camera.get_view_projection_matrix(),
            position: camera.position,
        }
    }

    #[test]
    fn test_destroy_twice_is_unknown_resource() {
        let mut backend = SoftwareBackend::new(32, 32);
        let geometry = backend.create_geometry(&Mesh::cuboid(1.0), Topology::Triangles).unwrap();
        backend.destroy_geometry(geometry).unwrap();

        assert_eq!(
            backend.destroy_geometry(geometry),
            Err(RenderError::UnknownResource { kind: "geometry" })
        );
        let counts = backend.ledger().snapshot();
        assert_eq!(counts.geometries_created, 1);
        assert_eq!(counts.geometries_destroyed, 1);
        assert_eq!(counts.live_bytes, 0, "Destroying should return every byte");
    }

    #[test]
    fn test_calls_after_release_fail() {
        let mut backend = SoftwareBackend::new(8, 8);
        backend.release().unwrap();

        assert!(backend.is_released());
        assert_eq!(backend.release(), Err(RenderError::ContextReleased));
        assert_eq!(backend.create_material(&Material::lit(0xffffff)), Err(RenderError::ContextReleased));
        assert_eq!(backend.ledger().snapshot().contexts_released, 1);
    }

    #[test]
    fn test_draw_outside_frame_is_rejected() {
        let mut backend = SoftwareBackend::new(8, 8);
        let geometry = backend.create_geometry(&Mesh::cuboid(1.0), Topology::Triangles).unwrap();
        let material = backend.create_material(&Material::lit(0xffffff)).unwrap();
        let call = DrawCall {
            geometry,
            material,
            model: Mat4::identity(),
            opacity: 1.0,
        };
        assert!(matches!(backend.draw(&call), Err(RenderError::FrameSequence(_))));
    }

    #[test]
    fn test_sphere_covers_center_pixel() {
        let mut backend = SoftwareBackend::new(64, 64);
        let geometry = backend.create_geometry(&Mesh::icosphere(1.0, 3), Topology::Triangles).unwrap();
        let material = backend.create_material(&Material::unlit(0xff0000).with_point_size(3.0)).unwrap();

        backend.begin_frame([0.0, 0.0, 0.0, 0.0], &camera_matrices()).unwrap();
        backend
            .draw(&DrawCall {
                geometry,
                material,
                model: Mat4::identity(),
                opacity: 1.0,
            })
            .unwrap();
        let stats = backend.end_frame().unwrap();

        assert_eq!(stats.draw_calls, 1);
        assert!(stats.pixels_written > 0);
        let center = backend.framebuffer().get_pixel(32, 32);
        assert_eq!(center.0[0], 255, "Unlit red sphere should cover the center pixel");
        assert_eq!(center.0[3], 255);
    }

    #[test]
    fn test_translucent_points_blend_over_clear_color() {
        let mut backend = SoftwareBackend::new(16, 16);
        let geometry = backend
            .create_geometry(&Mesh::point_cloud(&[Vec3::zeros()]), Topology::Points)
            .unwrap();
        let material = backend.create_material(&Material::unlit(0xffffff).with_opacity(0.5)).unwrap();

        backend.begin_frame([0.0, 0.0, 0.0, 1.0], &camera_matrices()).unwrap();
        backend
            .draw(&DrawCall {
                geometry,
                material,
                model: Mat4::identity(),
                opacity: 1.0,
            })
            .unwrap();
        backend.end_frame().unwrap();

        let pixel = backend.framebuffer().get_pixel(8, 8);
        assert!((127..=128).contains(&pixel.0[0]), "Half-transparent white over black, got {:?}", pixel);
    }

    #[test]
    fn test_update_positions_checks_length() {
        let mut backend = SoftwareBackend::new(8, 8);
        let geometry = backend.create_geometry(&Mesh::line_strip(4), Topology::LineStrip).unwrap();
        let result = backend.update_geometry_positions(geometry, &[Vec3::zeros(); 3]);
        assert_eq!(result, Err(RenderError::GeometrySizeMismatch { expected: 4, actual: 3 }));
        assert!(backend.update_geometry_positions(geometry, &[Vec3::zeros(); 4]).is_ok());
    }

    #[test]
    fn test_zero_surface_is_rejected() {
        let mut backend = SoftwareBackend::new(8, 8);
        assert_eq!(
            backend.resize_surface(0, 10),
            Err(RenderError::InvalidSurfaceSize { width: 0, height: 10 })
        );
        assert_eq!(backend.surface_size(), (8, 8));
    }

    fn draw_unlit(backend: &mut SoftwareBackend, mesh: &Mesh, material: Material, model: Mat4) {
        let geometry = backend.create_geometry(mesh, Topology::Triangles).unwrap();
        let material = backend.create_material(&material).unwrap();
        backend
            .draw(&DrawCall {
                geometry,
                material,
                model,
                opacity: 1.0,
            })
            .unwrap();
    }

    #[test]
    fn test_triangles_fill_between_vertices() {
        let mut backend = SoftwareBackend::new(64, 64);
        let cube = Mesh::cuboid(2.0);

        backend.begin_frame([0.0; 4], &camera_matrices()).unwrap();
        draw_unlit(&mut backend, &cube, Material::unlit(0x00ff00), Mat4::identity());
        backend.end_frame().unwrap();

        // The cube's corners all project away from the center
        let center = backend.framebuffer().get_pixel(32, 32);
        assert_eq!(center.0, [0, 255, 0, 255]);
        assert!(
            backend.covered_pixels() > 200,
            "Front face should be filled, covered {} pixels from {} vertices",
            backend.covered_pixels(),
            cube.vertex_count()
        );
    }

    #[test]
    fn test_dropping_indices_drops_triangles() {
        let quad = Mesh::new(
            vec![
                Vertex::new([-1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex::new([1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
                Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        let half = Mesh::new(quad.vertices.clone(), vec![0, 1, 2]);

        let mut covered = Vec::new();
        for mesh in [&quad, &half] {
            let mut backend = SoftwareBackend::new(64, 64);
            backend.begin_frame([0.0; 4], &camera_matrices()).unwrap();
            draw_unlit(&mut backend, mesh, Material::unlit(0xffffff), Mat4::identity());
            backend.end_frame().unwrap();
            covered.push(backend.covered_pixels());
        }

        assert!(covered[1] > 0);
        let ratio = covered[1] as f32 / covered[0] as f32;
        assert!((0.4..=0.6).contains(&ratio), "Half the indices should cover about half, got {}", ratio);
    }

    #[test]
    fn test_depth_test_is_independent_of_draw_order() {
        let near = Mat4::identity();
        let far = Mat4::new_translation(&Vec3::new(0.0, 0.0, -2.0)) * Mat4::new_scaling(3.0);

        for near_first in [true, false] {
            let mut backend = SoftwareBackend::new(64, 64);
            backend.begin_frame([0.0; 4], &camera_matrices()).unwrap();
            let mut draws = vec![(0xff0000, near), (0x0000ff, far)];
            if !near_first {
                draws.reverse();
            }
            for (color, model) in draws {
                draw_unlit(&mut backend, &Mesh::cuboid(1.0), Material::unlit(color), model);
            }
            backend.end_frame().unwrap();

            let center = backend.framebuffer().get_pixel(32, 32);
            assert_eq!(center.0, [255, 0, 0, 255], "near_first = {}", near_first);
        }
    }

    #[test]
    fn test_back_side_material_keeps_far_faces() {
        let mut backend = SoftwareBackend::new(64, 64);
        let camera = camera_matrices();
        let shell = Material::unlit(0xffffff).with_flags(MaterialFlags::BACK_SIDE);

        backend.begin_frame([0.0; 4], &camera).unwrap();
        let geometry = backend.create_geometry(&Mesh::cuboid(2.0), Topology::Triangles).unwrap();
        let material = backend.create_material(&shell).unwrap();
        backend
            .draw(&DrawCall {
                geometry,
                material,
                model: Mat4::identity(),
                opacity: 1.0,
            })
            .unwrap();
        let stats = backend.end_frame().unwrap();

        // Faces pointing away from the camera survive; the z = -1 face covers the center
        let center = backend.framebuffer().get_pixel(32, 32);
        assert_eq!(center.0, [255, 255, 255, 255]);
        assert!(stats.pixels_written > 0);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_pixel_count_does_not_overflow_u32() {
        assert_eq!(pixel_count(70_000, 70_000), 4_900_000_000);
        assert_eq!(pixel_count(u32::MAX, 2), u32::MAX as usize * 2);
    }
}
