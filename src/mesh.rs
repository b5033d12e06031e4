//! Mesh assets: Wavefront OBJ parsing into the interleaved vertex layout the
//! render passes expect, plus procedural fallbacks for the builtin shapes.
//!
//! Vertex layout is 8 floats per vertex: position (3), normal (3),
//! texture coordinate (2).

use std::collections::HashMap;
use std::f32::consts::PI;

use crate::texture::asset_path;

pub const VERTEX_STRIDE: usize = 8;

/// Typed handles for the builtin meshes. Bodies reference meshes through
/// these instead of string names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshId {
    Sphere,
    Circle,
    Cylinder,
    Orbit,
}

impl MeshId {
    pub fn filename(&self) -> &'static str {
        match self {
            MeshId::Sphere => "models/sphere.obj",
            MeshId::Circle => "models/circle.obj",
            MeshId::Cylinder => "models/cylinder.obj",
            MeshId::Orbit => "models/orbit.obj",
        }
    }

    pub const ALL: [MeshId; 4] = [
        MeshId::Sphere,
        MeshId::Circle,
        MeshId::Cylinder,
        MeshId::Orbit,
    ];
}

/// CPU-side vertex data for every builtin mesh, resolved once at startup.
pub struct MeshTable {
    meshes: HashMap<MeshId, Vec<f32>>,
}

impl MeshTable {
    /// Loads all builtin meshes, preferring OBJ files under `assets/models/`
    /// and generating the shape procedurally when a file is missing.
    pub fn load() -> Self {
        let mut meshes = HashMap::new();
        for id in MeshId::ALL {
            let data = match std::fs::read_to_string(asset_path(id.filename())) {
                Ok(text) => match parse_obj(&text) {
                    Ok(verts) => verts,
                    Err(err) => {
                        log::warn!("parsing {} failed: {}", id.filename(), err);
                        generate(id)
                    }
                },
                Err(_) => generate(id),
            };
            meshes.insert(id, data);
        }
        Self { meshes }
    }

    pub fn vertices(&self, id: MeshId) -> &[f32] {
        &self.meshes[&id]
    }

    pub fn vertex_count(&self, id: MeshId) -> i32 {
        (self.meshes[&id].len() / VERTEX_STRIDE) as i32
    }
}

/// Parses a Wavefront OBJ text blob into interleaved vertices. Faces with
/// more than three corners are fan-triangulated.
pub fn parse_obj(data: &str) -> Result<Vec<f32>, String> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut vertices: Vec<f32> = Vec::new();

    let parse_f32 = |s: &str| {
        s.parse::<f32>()
            .map_err(|_| format!("invalid number '{}'", s))
    };

    for line in data.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut v = [0.0; 3];
                for slot in &mut v {
                    *slot = parse_f32(parts.next().ok_or("truncated vertex")?)?;
                }
                positions.push(v);
            }
            Some("vn") => {
                let mut n = [0.0; 3];
                for slot in &mut n {
                    *slot = parse_f32(parts.next().ok_or("truncated normal")?)?;
                }
                normals.push(n);
            }
            Some("vt") => {
                let mut t = [0.0; 2];
                for slot in &mut t {
                    *slot = parse_f32(parts.next().ok_or("truncated tex coord")?)?;
                }
                tex_coords.push(t);
            }
            Some("f") => {
                let corners: Vec<&str> = parts.collect();
                if corners.len() < 3 {
                    return Err("face with fewer than 3 corners".to_string());
                }
                let resolve = |corner: &str| -> Result<(usize, Option<usize>, usize), String> {
                    let mut idx = corner.split('/');
                    let pos = idx
                        .next()
                        .and_then(|s| s.parse::<usize>().ok())
                        .ok_or_else(|| format!("invalid face corner '{}'", corner))?;
                    let tex = idx.next().and_then(|s| s.parse::<usize>().ok());
                    let norm = idx
                        .next()
                        .and_then(|s| s.parse::<usize>().ok())
                        .ok_or_else(|| format!("face corner '{}' has no normal", corner))?;
                    Ok((pos - 1, tex.map(|t| t - 1), norm - 1))
                };
                let emit = |vertices: &mut Vec<f32>, corner: &str| -> Result<(), String> {
                    let (pi, ti, ni) = resolve(corner)?;
                    let p = positions.get(pi).ok_or("position index out of range")?;
                    let n = normals.get(ni).ok_or("normal index out of range")?;
                    let t = ti
                        .and_then(|t| tex_coords.get(t).copied())
                        .unwrap_or([0.0, 0.0]);
                    vertices.extend_from_slice(p);
                    vertices.extend_from_slice(n);
                    vertices.extend_from_slice(&t);
                    Ok(())
                };
                for i in 2..corners.len() {
                    emit(&mut vertices, corners[0])?;
                    emit(&mut vertices, corners[i - 1])?;
                    emit(&mut vertices, corners[i])?;
                }
            }
            _ => {}
        }
    }
    if vertices.is_empty() {
        return Err("no faces found".to_string());
    }
    Ok(vertices)
}

fn generate(id: MeshId) -> Vec<f32> {
    match id {
        MeshId::Sphere => uv_sphere(16, 24),
        MeshId::Circle => disc(24),
        MeshId::Cylinder => cylinder(12),
        MeshId::Orbit => ring(64, 0.96),
    }
}

fn push_vertex(out: &mut Vec<f32>, p: [f32; 3], n: [f32; 3], t: [f32; 2]) {
    out.extend_from_slice(&p);
    out.extend_from_slice(&n);
    out.extend_from_slice(&t);
}

/// Unit sphere made of latitude/longitude quads.
fn uv_sphere(stacks: usize, slices: usize) -> Vec<f32> {
    let vertex_at = |stack: usize, slice: usize| -> ([f32; 3], [f32; 2]) {
        let theta = PI * stack as f32 / stacks as f32;
        let phi = 2.0 * PI * slice as f32 / slices as f32;
        let p = [
            theta.sin() * phi.sin(),
            theta.cos(),
            theta.sin() * phi.cos(),
        ];
        let t = [
            slice as f32 / slices as f32,
            stack as f32 / stacks as f32,
        ];
        (p, t)
    };
    let mut out = Vec::new();
    for stack in 0..stacks {
        for slice in 0..slices {
            let (a, ta) = vertex_at(stack, slice);
            let (b, tb) = vertex_at(stack + 1, slice);
            let (c, tc) = vertex_at(stack + 1, slice + 1);
            let (d, td) = vertex_at(stack, slice + 1);
            // On a unit sphere the normal equals the position.
            push_vertex(&mut out, a, a, ta);
            push_vertex(&mut out, b, b, tb);
            push_vertex(&mut out, c, c, tc);
            push_vertex(&mut out, a, a, ta);
            push_vertex(&mut out, c, c, tc);
            push_vertex(&mut out, d, d, td);
        }
    }
    out
}

/// Flat unit disc in the XZ plane, normal along +Y. Billboarded at render
/// time by rotating +Y toward the camera.
fn disc(segments: usize) -> Vec<f32> {
    let n = [0.0, 1.0, 0.0];
    let rim = |i: usize| -> [f32; 3] {
        let phi = 2.0 * PI * i as f32 / segments as f32;
        [phi.sin(), 0.0, phi.cos()]
    };
    let mut out = Vec::new();
    for i in 0..segments {
        let a = rim(i);
        let b = rim(i + 1);
        push_vertex(&mut out, [0.0, 0.0, 0.0], n, [0.5, 0.5]);
        push_vertex(&mut out, a, n, [a[0] / 2.0 + 0.5, a[2] / 2.0 + 0.5]);
        push_vertex(&mut out, b, n, [b[0] / 2.0 + 0.5, b[2] / 2.0 + 0.5]);
    }
    out
}

/// Open cylinder of unit radius along the Y axis, spanning y in [-0.5, 0.5].
/// Connectors stretch this to the required length through their Y scale.
fn cylinder(segments: usize) -> Vec<f32> {
    let rim = |i: usize, y: f32| -> [f32; 3] {
        let phi = 2.0 * PI * i as f32 / segments as f32;
        [phi.sin(), y, phi.cos()]
    };
    let mut out = Vec::new();
    for i in 0..segments {
        let a = rim(i, -0.5);
        let b = rim(i, 0.5);
        let c = rim(i + 1, 0.5);
        let d = rim(i + 1, -0.5);
        let na = [a[0], 0.0, a[2]];
        let nc = [c[0], 0.0, c[2]];
        let u0 = i as f32 / segments as f32;
        let u1 = (i + 1) as f32 / segments as f32;
        push_vertex(&mut out, a, na, [u0, 0.0]);
        push_vertex(&mut out, b, na, [u0, 1.0]);
        push_vertex(&mut out, c, nc, [u1, 1.0]);
        push_vertex(&mut out, a, na, [u0, 0.0]);
        push_vertex(&mut out, c, nc, [u1, 1.0]);
        push_vertex(&mut out, d, nc, [u1, 0.0]);
    }
    out
}

/// Flat annulus in the XZ plane used as the static orbit shape.
fn ring(segments: usize, inner: f32) -> Vec<f32> {
    let n = [0.0, 1.0, 0.0];
    let rim = |i: usize, r: f32| -> [f32; 3] {
        let phi = 2.0 * PI * i as f32 / segments as f32;
        [r * phi.sin(), 0.0, r * phi.cos()]
    };
    let mut out = Vec::new();
    for i in 0..segments {
        let a = rim(i, inner);
        let b = rim(i, 1.0);
        let c = rim(i + 1, 1.0);
        let d = rim(i + 1, inner);
        push_vertex(&mut out, a, n, [0.0, 0.0]);
        push_vertex(&mut out, b, n, [0.0, 1.0]);
        push_vertex(&mut out, c, n, [1.0, 1.0]);
        push_vertex(&mut out, a, n, [0.0, 0.0]);
        push_vertex(&mut out, c, n, [1.0, 1.0]);
        push_vertex(&mut out, d, n, [1.0, 0.0]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CUBE_FACE: &str = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vn 0.0 0.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn parse_obj_interleaves_quads_into_triangles() {
        let verts = parse_obj(CUBE_FACE).unwrap();
        // One quad fans into two triangles, 6 vertices at 8 floats each.
        assert_eq!(verts.len(), 6 * VERTEX_STRIDE);
        // First vertex: position, then normal, then tex coord.
        assert_eq!(&verts[0..3], &[-1.0, -1.0, 0.0]);
        assert_eq!(&verts[3..6], &[0.0, 0.0, 1.0]);
        assert_eq!(&verts[6..8], &[0.0, 0.0]);
    }

    #[test]
    fn parse_obj_accepts_missing_tex_coords() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let verts = parse_obj(src).unwrap();
        assert_eq!(verts.len(), 3 * VERTEX_STRIDE);
        assert_eq!(&verts[6..8], &[0.0, 0.0]);
    }

    #[test]
    fn parse_obj_rejects_empty_input() {
        assert!(parse_obj("").is_err());
        assert!(parse_obj("v 1 2 3\n").is_err());
    }

    #[test]
    fn generated_sphere_is_unit_radius() {
        let verts = uv_sphere(8, 12);
        for v in verts.chunks(VERTEX_STRIDE) {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert_relative_eq!(r, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn mesh_table_provides_all_builtins() {
        let table = MeshTable::load();
        for id in MeshId::ALL {
            assert!(table.vertex_count(id) > 0);
            assert_eq!(
                table.vertices(id).len(),
                table.vertex_count(id) as usize * VERTEX_STRIDE
            );
        }
    }
}
