//! OBJ file loader for 3D models
//!
//! Polygons are fan-triangulated and identical corners (same position,
//! texture coordinate and normal indices) are joined into a single vertex,
//! so the output is an indexed triangle list.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// OBJ parse errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// The file could not be read
    #[error(transparent)]
    Asset(#[from] super::AssetError),
    /// A malformed statement
    #[error("line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Structurally valid text that describes no usable mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Flat, GPU-ready mesh arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Three floats per vertex
    pub positions: Vec<f32>,
    /// Two floats per vertex
    pub tex_coords: Vec<f32>,
    /// Three floats per vertex
    pub normals: Vec<f32>,
    /// Triangle list, three indices per face
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of distinct vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Face corner as (position, texture coordinate, normal) indices, 0-based
type Corner = (usize, Option<usize>, Option<usize>);

/// Wavefront OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file from disk
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, ObjError> {
        let text = super::read_text(path.as_ref())?;
        let mesh = Self::parse(&text)?;
        log::info!(
            "Loaded {:?}: {} vertices, {} triangles",
            path.as_ref(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Parse OBJ text already in memory
    pub fn parse(text: &str) -> Result<MeshData, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut joined: HashMap<Corner, u32> = HashMap::new();
        let mut mesh = MeshData::default();

        for (number, line) in text.lines().enumerate() {
            let line_no = number + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else { continue };
            let args: Vec<&str> = parts.collect();

            match keyword {
                "v" => positions.push(parse_floats::<3>(&args, line_no, "vertex")?),
                "vn" => normals.push(parse_floats::<3>(&args, line_no, "normal")?),
                "vt" => tex_coords.push(parse_floats::<2>(&args, line_no, "texture coordinate")?),
                "f" => {
                    if args.len() < 3 {
                        return Err(parse_error(line_no, "face needs at least three corners"));
                    }
                    let mut face = Vec::with_capacity(args.len());
                    for corner in &args {
                        let corner = parse_corner(
                            corner,
                            line_no,
                            positions.len(),
                            tex_coords.len(),
                            normals.len(),
                        )?;
                        let next = u32::try_from(mesh.positions.len() / 3)
                            .map_err(|_| ObjError::InvalidFormat("too many vertices".to_string()))?;
                        let index = *joined.entry(corner).or_insert_with(|| {
                            let (p, t, n) = corner;
                            mesh.positions.extend_from_slice(&positions[p]);
                            let uv = t.map_or([0.0, 0.0], |t| tex_coords[t]);
                            let normal = n.map_or([0.0, 1.0, 0.0], |n| normals[n]);
                            mesh.tex_coords.extend_from_slice(&uv);
                            mesh.normals.extend_from_slice(&normal);
                            next
                        });
                        face.push(index);
                    }

                    // Triangulate face (simple fan triangulation)
                    for i in 1..(face.len() - 1) {
                        mesh.indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                _ => {
                    // Groups, materials and smoothing are not used by the renderer
                }
            }
        }

        if mesh.indices.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }
        Ok(mesh)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::ParseError { line, message: message.into() }
}

fn parse_floats<const N: usize>(
    args: &[&str],
    line: usize,
    what: &str,
) -> Result<[f32; N], ObjError> {
    if args.len() < N {
        return Err(parse_error(line, format!("{what} needs {N} components")));
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse()
            .map_err(|_| parse_error(line, format!("invalid {what} component '{arg}'")))?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index against `count` items
fn resolve_index(raw: &str, count: usize, line: usize) -> Result<usize, ObjError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{raw}'")))?;
    let count_i = i64::try_from(count).unwrap_or(i64::MAX);
    let resolved = match value {
        0 => None,
        v if v > 0 => Some(v - 1),
        v => Some(count_i + v),
    };
    match resolved {
        Some(index) if (0..count_i).contains(&index) => usize::try_from(index)
            .map_err(|_| parse_error(line, format!("index {raw} out of range"))),
        _ => Err(parse_error(line, format!("index {raw} out of range"))),
    }
}

fn parse_corner(
    corner: &str,
    line: usize,
    positions: usize,
    tex_coords: usize,
    normals: usize,
) -> Result<Corner, ObjError> {
    let mut fields = corner.split('/');
    let position = resolve_index(fields.next().unwrap_or_default(), positions, line)?;
    let tex = match fields.next() {
        Some(raw) if !raw.is_empty() => Some(resolve_index(raw, tex_coords, line)?),
        _ => None,
    };
    let normal = match fields.next() {
        Some(raw) if !raw.is_empty() => Some(resolve_index(raw, normals, line)?),
        _ => None,
    };
    Ok((position, tex, normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjLoader::parse(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.tex_coords.len(), 8);
        assert_eq!(&mesh.normals[0..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_identical_corners_are_joined() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 3 2 4\n";
        let mesh = ObjLoader::parse(text).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn test_same_position_different_uv_stays_split() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 1\nf 1/1 2/1 3/1\nf 1/2 3/2 2/2\n";
        let mesh = ObjLoader::parse(text).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_negative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = ObjLoader::parse(text).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(&mesh.positions[3..6], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let mesh = ObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(&mesh.tex_coords[0..2], &[0.0, 0.0]);
        assert_eq!(&mesh.normals[0..3], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            ObjLoader::parse("v 0 0 0\nf 1 2 3\n"),
            Err(ObjError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            ObjLoader::parse("v 0 zero 0\n"),
            Err(ObjError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            ObjLoader::parse("v 0 0 0\n"),
            Err(ObjError::InvalidFormat(_))
        ));
        assert!(matches!(
            ObjLoader::load_obj("missing.obj"),
            Err(ObjError::Asset(super::super::AssetError::NotFound(_)))
        ));
    }
}
