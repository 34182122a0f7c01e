//! Screen-space pointer targeting.
//!
//! A pointer position in normalized device coordinates is unprojected
//! through the camera into a world-space ray, which is then tested against
//! every drawable leaf of the scene. Each part contributes at most one hit
//! (its closest triangle) and the result is ordered nearest first.

use std::cmp::Ordering;

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::registry::{classify, PartCategory};
use crate::scene::{MaterialHandle, PartId, SceneNode};

const EPSILON: f32 = 1e-6;

/// Intersection between the pointer ray and a part.
#[derive(Debug, Clone)]
pub struct Hit {
    pub part_id: PartId,
    pub name: String,
    pub category: PartCategory,
    pub material: Option<MaterialHandle>,
    /// Distance from the ray origin along the ray.
    pub distance: f32,
    pub point: Vec3,
}

impl Hit {
    /// Identity of the hit part's material, if it has a named one.
    pub fn material_identity(&self) -> Option<String> {
        let material = self.material.as_ref()?.read();
        material.has_identity().then(|| material.identity.clone())
    }
}

/// Resolves a pointer position into the parts under it, nearest first.
pub fn resolve(pointer_ndc: Vec2, camera: &Camera, root: &SceneNode) -> Vec<Hit> {
    let (origin, direction) = camera.ray_through(pointer_ndc);
    if direction == Vec3::ZERO {
        return Vec::new();
    }

    let mut hits = Vec::new();
    root.visit_drawables(&mut |node, drawable, world| {
        let nearest = drawable
            .mesh
            .triangles()
            .map(|tri| tri.map(|v| world.transform_point3(v)))
            .filter_map(|[a, b, c]| intersect_triangle(origin, direction, a, b, c))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        if let Some(distance) = nearest {
            hits.push(Hit {
                part_id: node.id,
                name: node.name.clone(),
                category: classify(&node.name),
                material: drawable.material.clone(),
                distance,
                point: origin + direction * distance,
            });
        }
    });
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });
    hits
}

/// Möller–Trumbore ray/triangle test, double sided.
///
/// Returns the distance along `direction` to the intersection point.
pub fn intersect_triangle(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}
