//! OBJ file loader for 3D models
//!
//! Supports `v`, `vt`, `vn` and `f` statements. Faces with more than three
//! corners are fan triangulated. Indices are 1-based, negative indices count
//! back from the most recent element. Missing texture coordinates default to
//! zero; corners without a normal get the face normal.

use std::path::Path;

use super::AssetError;
use crate::foundation::math::Vec3;
use crate::render::{Mesh, Vertex};

/// Stateless OBJ parser
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return a mesh
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse OBJ text into a mesh
    pub fn parse(text: &str) -> Result<Mesh, AssetError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line_number = number + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            let args: Vec<&str> = parts.collect();

            match keyword {
                "v" => positions.push(parse_floats::<3>(&args, line_number, "vertex")?),
                "vn" => normals.push(parse_floats::<3>(&args, line_number, "normal")?),
                "vt" => tex_coords.push(parse_floats::<2>(&args, line_number, "texture coordinate")?),
                "f" => {
                    if args.len() < 3 {
                        return Err(AssetError::Parse {
                            line: line_number,
                            message: format!("face needs at least 3 corners, found {}", args.len()),
                        });
                    }

                    let mut corners = Vec::with_capacity(args.len());
                    for corner in &args {
                        corners.push(parse_corner(corner, line_number, positions.len(), tex_coords.len(), normals.len())?);
                    }

                    let face_normal = face_normal(
                        positions[corners[0].0],
                        positions[corners[1].0],
                        positions[corners[2].0],
                    );

                    let base = vertices.len() as u32;
                    for &(position, tex, normal) in &corners {
                        vertices.push(Vertex::new(
                            positions[position],
                            normal.map_or(face_normal, |i| normals[i]),
                            tex.map_or([0.0, 0.0], |i| tex_coords[i]),
                        ));
                    }

                    for i in 1..(corners.len() as u32 - 1) {
                        indices.extend_from_slice(&[base, base + i, base + i + 1]);
                    }
                }
                _ => {
                    // Groups, objects, materials and smoothing groups carry no geometry
                }
            }
        }

        if vertices.is_empty() {
            return Err(AssetError::InvalidFormat("No faces found in OBJ data".to_string()));
        }

        log::debug!("Parsed OBJ: {} vertices, {} triangles", vertices.len(), indices.len() / 3);
        Ok(Mesh::new(vertices, indices))
    }
}

fn parse_floats<const N: usize>(args: &[&str], line: usize, what: &str) -> Result<[f32; N], AssetError> {
    if args.len() < N {
        return Err(AssetError::Parse {
            line,
            message: format!("{} needs {} components, found {}", what, N, args.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, text) in out.iter_mut().zip(args) {
        *slot = text.parse().map_err(|_| AssetError::Parse {
            line,
            message: format!("invalid {} component '{}'", what, text),
        })?;
    }
    Ok(out)
}

/// Resolve a 1-based or negative OBJ index against `count` elements
fn resolve_index(text: &str, count: usize, line: usize, what: &str) -> Result<usize, AssetError> {
    let raw: i64 = text.parse().map_err(|_| AssetError::Parse {
        line,
        message: format!("invalid {} index '{}'", what, text),
    })?;
    let resolved = match raw {
        0 => None,
        n if n > 0 => Some(n as usize - 1),
        n => count.checked_sub(n.unsigned_abs() as usize),
    };
    resolved.filter(|&i| i < count).ok_or_else(|| AssetError::Parse {
        line,
        message: format!("{} index {} out of range (have {})", what, raw, count),
    })
}

fn parse_corner(
    corner: &str,
    line: usize,
    position_count: usize,
    tex_count: usize,
    normal_count: usize,
) -> Result<(usize, Option<usize>, Option<usize>), AssetError> {
    let mut fields = corner.split('/');
    let position = resolve_index(fields.next().unwrap_or(""), position_count, line, "position")?;
    let tex = match fields.next() {
        Some(text) if !text.is_empty() => Some(resolve_index(text, tex_count, line, "texture coordinate")?),
        _ => None,
    };
    let normal = match fields.next() {
        Some(text) if !text.is_empty() => Some(resolve_index(text, normal_count, line, "normal")?),
        _ => None,
    };
    Ok((position, tex, normal))
}

fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let (a, b, c) = (Vec3::from(a), Vec3::from(b), Vec3::from(c));
    let normal = (b - a).cross(&(c - a));
    if normal.norm() > f32::EPSILON {
        normal.normalize().into()
    } else {
        [0.0, 1.0, 0.0]
    }
}
