use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Triangle soup used for pointer intersection.
///
/// Positions are stored in the node's local space; every three entries of
/// `indices` form one triangle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Axis aligned box centred on the origin.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
        ];
        let indices = vec![
            0, 1, 2, 0, 2, 3, // front
            5, 4, 7, 5, 7, 6, // back
            4, 0, 3, 4, 3, 7, // left
            1, 5, 6, 1, 6, 2, // right
            4, 5, 1, 4, 1, 0, // bottom
            3, 2, 6, 3, 6, 7, // top
        ];
        Self { positions, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates over the triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

/// Parses the geometry of an OBJ document.
///
/// Only `v` and `f` records matter for picking; normals, texture coordinates
/// and grouping statements are skipped. Polygons are fan triangulated.
pub fn load_obj_from_str(data: &str) -> Result<TriangleMesh> {
    let mut positions = Vec::new();
    let mut faces: Vec<Vec<i32>> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "f" => faces.push(
                parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?,
            ),
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ data does not define any vertices"));
    }

    let mut indices = Vec::with_capacity(faces.len() * 3);
    for polygon in &faces {
        let resolved = polygon
            .iter()
            .map(|&index| {
                fix_index(index, positions.len())
                    .map(|i| i as u32)
                    .ok_or_else(|| anyhow!("vertex index {index} out of range"))
            })
            .collect::<Result<Vec<u32>>>()?;
        for i in 1..(resolved.len() - 1) {
            indices.extend_from_slice(&[resolved[0], resolved[i], resolved[i + 1]]);
        }
    }

    Ok(TriangleMesh { positions, indices })
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut next = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    let x = next()?;
    let y = next()?;
    let z = next()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<i32>> {
    let mut indices = Vec::new();
    for part in parts {
        let vertex = part
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing vertex index"))?;
        indices.push(vertex.parse::<i32>()?);
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quad_into_two_triangles() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1/1 2/2/1 3/3/1 4/4/1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn negative_indices_are_relative() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        assert!(load_obj_from_str(obj).is_err());
    }

    #[test]
    fn cuboid_has_twelve_triangles() {
        let mesh = TriangleMesh::cuboid(Vec3::splat(2.0));
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.positions.iter().all(|p| p.abs() == Vec3::ONE));
    }
}
