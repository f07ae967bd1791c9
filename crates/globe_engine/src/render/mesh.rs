//! Mesh representation and procedural primitives
//!
//! [`Vertex`] is a plain `#[repr(C)]` POD so the whole vertex array can be
//! viewed as bytes with `bytemuck` when a backend uploads it. Primitives
//! follow the usual parametric constructions (icosphere by subdivision, UV
//! sphere, torus in the XY plane around Z).

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{constants::TAU, Vec3};

/// 3D vertex with position, normal and texture coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Vertex at a position with an up-facing normal and zero UV
    pub fn at(position: Vec3) -> Self {
        Self::new(position.into(), [0.0, 1.0, 0.0], [0.0, 0.0])
    }

    /// Position as a vector
    pub fn position_vec(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Normal as a vector
    pub fn normal_vec(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
}

/// How the backend interprets a vertex array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Indexed triangle list
    Triangles,
    /// One point per vertex
    Points,
    /// Connected line through the vertices in order
    LineStrip,
}

/// Vertex and index data of one drawable shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Triangle indices (unused by point and line topologies)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True if there are no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Geodesic sphere: an icosahedron subdivided `detail` times
    pub fn icosphere(radius: f32, detail: u32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let mut positions: Vec<Vec3> = [
            [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
            [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
            [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
        ]
        .iter()
        .map(|p| Vec3::new(p[0], p[1], p[2]).normalize())
        .collect();

        let mut faces: Vec<[u32; 3]> = vec![
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        for _ in 0..detail {
            let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
            let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
                let key = if a < b { (a, b) } else { (b, a) };
                *midpoints.entry(key).or_insert_with(|| {
                    let mid = (positions[a as usize] + positions[b as usize]).normalize();
                    positions.push(mid);
                    (positions.len() - 1) as u32
                })
            };

            let mut next = Vec::with_capacity(faces.len() * 4);
            for [a, b, c] in faces {
                let ab = midpoint(a, b, &mut positions);
                let bc = midpoint(b, c, &mut positions);
                let ca = midpoint(c, a, &mut positions);
                next.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
            }
            faces = next;
        }

        let vertices = positions
            .iter()
            .map(|unit| {
                let u = 0.5 + unit.z.atan2(unit.x) / TAU;
                let v = 0.5 - unit.y.asin() / std::f32::consts::PI;
                Vertex::new((unit * radius).into(), (*unit).into(), [u, v])
            })
            .collect();
        let indices = faces.into_iter().flatten().collect();

        Self::new(vertices, indices)
    }

    /// Latitude/longitude sphere
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);

        for y in 0..=height_segments {
            let v = y as f32 / height_segments as f32;
            let phi = v * std::f32::consts::PI;
            for x in 0..=width_segments {
                let u = x as f32 / width_segments as f32;
                let theta = u * TAU;
                let normal = Vec3::new(-theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
                vertices.push(Vertex::new((normal * radius).into(), normal.into(), [u, v]));
            }
        }

        let row = width_segments + 1;
        for y in 0..height_segments {
            for x in 0..width_segments {
                let a = y * row + x + 1;
                let b = y * row + x;
                let c = (y + 1) * row + x;
                let d = (y + 1) * row + x + 1;
                if y != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if y != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    /// Torus lying in the XY plane, centered on the origin, around the Z axis
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let tubular_segments = tubular_segments.max(3);
        let mut vertices = Vec::with_capacity(((radial_segments + 1) * (tubular_segments + 1)) as usize);
        let mut indices = Vec::with_capacity((radial_segments * tubular_segments * 6) as usize);

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * TAU;
                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let normal = (position - center).normalize();
                vertices.push(Vertex::new(
                    position.into(),
                    normal.into(),
                    [i as f32 / tubular_segments as f32, j as f32 / radial_segments as f32],
                ));
            }
        }

        let row = tubular_segments + 1;
        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = row * j + i - 1;
                let b = row * (j - 1) + i - 1;
                let c = row * (j - 1) + i;
                let d = row * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Axis-aligned cube with per-face normals
    pub fn cuboid(size: f32) -> Self {
        let h = size * 0.5;
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, right, up) in faces {
            let (n, r, u) = (Vec3::from(normal), Vec3::from(right), Vec3::from(up));
            let base = vertices.len() as u32;
            for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (n + r * du + u * dv) * h;
                vertices.push(Vertex::new(position.into(), normal, [(du + 1.0) * 0.5, (dv + 1.0) * 0.5]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
    }

    /// One vertex per point, no indices
    pub fn point_cloud(points: &[Vec3]) -> Self {
        Self::new(points.iter().map(|p| Vertex::at(*p)).collect(), Vec::new())
    }

    /// Line strip with `capacity` vertices, all at the origin
    pub fn line_strip(capacity: usize) -> Self {
        Self::new(vec![Vertex::default(); capacity], Vec::new())
    }

    /// Center of the axis-aligned bounding box
    pub fn bounding_center(&self) -> Vec3 {
        let Some(first) = self.vertices.first() else {
            return Vec3::zeros();
        };
        let (min, max) = self.vertices.iter().fold(
            (first.position_vec(), first.position_vec()),
            |(min, max), v| {
                let p = v.position_vec();
                (min.inf(&p), max.sup(&p))
            },
        );
        (min + max) * 0.5
    }

    /// Largest distance of any vertex from the origin
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.position_vec().norm())
            .fold(0.0, f32::max)
    }

    /// Recenter on the bounding box center and scale so the farthest vertex
    /// sits at `radius`. Degenerate meshes are only recentered.
    pub fn normalized_to_radius(mut self, radius: f32) -> Self {
        let center = self.bounding_center();
        for vertex in &mut self.vertices {
            vertex.position = (vertex.position_vec() - center).into();
        }

        let current = self.bounding_radius();
        if current > f32::EPSILON {
            let factor = radius / current;
            for vertex in &mut self.vertices {
                vertex.position = (vertex.position_vec() * factor).into();
            }
        }
        self
    }

    /// Raw vertex bytes as a backend would upload them
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let mesh = Mesh::cuboid(1.0);
        assert_eq!(mesh.vertex_bytes().len(), 24 * 32);
    }

    #[test]
    fn test_icosphere_counts_and_radius() {
        let base = Mesh::icosphere(1.0, 0);
        assert_eq!(base.vertex_count(), 12);
        assert_eq!(base.triangle_count(), 20);

        let detailed = Mesh::icosphere(2.0, 2);
        assert_eq!(detailed.triangle_count(), 20 * 16);
        assert_eq!(detailed.vertex_count(), 162, "Shared midpoints should not be duplicated");
        for vertex in &detailed.vertices {
            assert_relative_eq!(vertex.position_vec().norm(), 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_torus_indices_in_range() {
        let torus = Mesh::torus(2.0, 0.03, 16, 100);
        assert_eq!(torus.triangle_count(), 16 * 100 * 2);
        let count = torus.vertex_count() as u32;
        assert!(torus.indices.iter().all(|&i| i < count));
        assert!(torus.vertices.iter().all(|v| v.position[2].abs() <= 0.03 + 1e-6), "Torus should stay in the XY plane");
    }

    #[test]
    fn test_uv_sphere_has_no_degenerate_pole_rows() {
        let sphere = Mesh::uv_sphere(0.08, 16, 16);
        assert_eq!(sphere.triangle_count(), 16 * 16 * 2 - 2 * 16);
    }

    #[test]
    fn test_normalized_to_radius_recenters_and_scales() {
        let mut mesh = Mesh::cuboid(4.0);
        for vertex in &mut mesh.vertices {
            vertex.position[0] += 10.0;
        }

        let normalized = mesh.normalized_to_radius(1.5);
        assert_relative_eq!(normalized.bounding_radius(), 1.5, epsilon = 1e-5);
        assert_relative_eq!(normalized.bounding_center().x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_line_strip_starts_at_origin() {
        let strip = Mesh::line_strip(100);
        assert_eq!(strip.vertex_count(), 100);
        assert!(strip.indices.is_empty());
    }
}
