use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{EulerRot, Mat4, Quat, Vec3};
use parking_lot::RwLock;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::obj::{load_obj_from_str, TriangleMesh};
use crate::texture::TextureRef;

/// Shared, mutable material record. Several parts may point at the same one.
pub type MaterialHandle = Arc<RwLock<Material>>;

/// Stable identifier assigned to every node while the scene is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u32);

/// Surface properties of a drawable part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name from the asset. Empty when the asset did not name it.
    pub identity: String,
    pub color: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureRef>,
    #[serde(default)]
    pub emissive: Vec3,
    /// Set whenever the renderer has to re-upload the material.
    #[serde(skip)]
    pub needs_update: bool,
}

impl Material {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            color: Vec3::ONE,
            texture: None,
            emissive: Vec3::ZERO,
            needs_update: false,
        }
    }

    pub fn has_identity(&self) -> bool {
        !self.identity.is_empty()
    }

    pub fn into_handle(self) -> MaterialHandle {
        Arc::new(RwLock::new(self))
    }
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::ZYX,
            self.rotation.z.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// Geometry and material of a drawable leaf.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub mesh: TriangleMesh,
    pub material: Option<MaterialHandle>,
}

/// Node of the scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: PartId,
    pub name: String,
    pub transform: Transform,
    pub drawable: Option<Drawable>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(id: PartId, name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Transform::default(),
            drawable: None,
            children,
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.drawable.is_some()
    }

    /// Depth-first, document-order walk over every drawable node together
    /// with its world matrix.
    pub fn visit_drawables<F>(&self, visitor: &mut F)
    where
        F: FnMut(&SceneNode, &Drawable, Mat4),
    {
        self.visit_with_parent(Mat4::IDENTITY, visitor);
    }

    fn visit_with_parent<F>(&self, parent: Mat4, visitor: &mut F)
    where
        F: FnMut(&SceneNode, &Drawable, Mat4),
    {
        let world = parent * self.transform.matrix();
        if let Some(drawable) = &self.drawable {
            visitor(self, drawable, world);
        }
        for child in &self.children {
            child.visit_with_parent(world, visitor);
        }
    }

    pub fn drawable_count(&self) -> usize {
        let mut count = 0;
        self.visit_drawables(&mut |_, _, _| count += 1);
        count
    }
}

/// Loaded asset: the node tree plus the materials it references.
#[derive(Debug, Clone)]
pub struct Scene {
    pub root: SceneNode,
    materials: Vec<MaterialHandle>,
}

impl Scene {
    pub fn new(root: SceneNode, materials: Vec<MaterialHandle>) -> Self {
        Self { root, materials }
    }

    /// Parses the scene XML describing the product model.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let scene = document.root_element();
        if !scene.has_tag_name("scene") {
            return Err(anyhow!(
                "expected <scene> root element, found <{}>",
                scene.tag_name().name()
            ));
        }

        let mut materials = Vec::new();
        for node in scene.children().filter(|n| n.has_tag_name("material")) {
            let name = required_text(&node, "name")?;
            if materials
                .iter()
                .any(|m: &MaterialHandle| m.read().identity == name)
            {
                return Err(anyhow!("material {name} is defined twice"));
            }
            let mut material = Material::new(name);
            material.color = parse_color(optional_text(&node, "color"), material.color)?;
            material.emissive = parse_color(optional_text(&node, "emissive"), material.emissive)?;
            materials.push(material.into_handle());
        }

        let mut next_id = 0;
        let mut top_level = Vec::new();
        for node in scene.children().filter(|n| n.has_tag_name("node")) {
            top_level.push(parse_node(&node, &materials, &mut next_id)?);
        }
        let root = SceneNode::group(PartId(next_id), "scene", top_level);

        Ok(Self { root, materials })
    }

    pub fn materials(&self) -> &[MaterialHandle] {
        &self.materials
    }

    /// Looks up a material by its identity.
    pub fn material(&self, identity: &str) -> Option<MaterialHandle> {
        self.materials
            .iter()
            .find(|material| material.read().identity == identity)
            .cloned()
    }
}

fn parse_node(
    node: &Node<'_, '_>,
    materials: &[MaterialHandle],
    next_id: &mut u32,
) -> Result<SceneNode> {
    let id = PartId(*next_id);
    *next_id += 1;
    let name = required_text(node, "name")?;

    let mut transform = Transform::default();
    transform.position = parse_vec3(optional_text(node, "position"), transform.position)
        .with_context(|| format!("node {name}: bad <position>"))?;
    transform.rotation = parse_vec3(optional_text(node, "rotation"), transform.rotation)
        .with_context(|| format!("node {name}: bad <rotation>"))?;
    transform.scale = parse_vec3(optional_text(node, "scale"), transform.scale)
        .with_context(|| format!("node {name}: bad <scale>"))?;

    let mesh = if let Some(size) = optional_text(node, "box") {
        let size = parse_vec3(Some(size), Vec3::ONE)
            .with_context(|| format!("node {name}: bad <box>"))?;
        Some(TriangleMesh::cuboid(size))
    } else if let Some(data) = optional_text(node, "mesh") {
        Some(load_obj_from_str(&data).with_context(|| format!("node {name}: bad <mesh>"))?)
    } else {
        None
    };

    let material = match optional_text(node, "material") {
        Some(identity) => Some(
            materials
                .iter()
                .find(|m| m.read().identity == identity)
                .cloned()
                .ok_or_else(|| anyhow!("node {name} references unknown material {identity}"))?,
        ),
        None => None,
    };

    let drawable = match (mesh, material) {
        (Some(mesh), material) => Some(Drawable { mesh, material }),
        (None, Some(_)) => {
            return Err(anyhow!("node {name} has a material but no geometry"));
        }
        (None, None) => None,
    };

    let mut children = Vec::new();
    for child in node.children().filter(|n| n.has_tag_name("node")) {
        children.push(parse_node(&child, materials, next_id)?);
    }

    Ok(SceneNode {
        id,
        name,
        transform,
        drawable,
        children,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_triple(value: &str, what: &str) -> Result<[f32; 3]> {
    let mut numbers = value.split_whitespace().map(|component| {
        component
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse {what} component {component:?}: {err}"))
    });
    let mut next = || {
        numbers
            .next()
            .unwrap_or_else(|| Err(anyhow!("{what} is missing components")))
    };
    Ok([next()?, next()?, next()?])
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_triple(&value, "vector")?))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let [r, g, b] = parse_triple(&value, "color")?;
    Ok(Vec3::new(r / 255.0, g / 255.0, b / 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <material>
            <name>mat_laces</name>
            <color>255 128 0</color>
        </material>
        <material>
            <name>mat_sole</name>
        </material>
        <node>
            <name>shoe</name>
            <scale>2 2 2</scale>
            <node>
                <name>laces_a</name>
                <material>mat_laces</material>
                <box>1 1 1</box>
                <position>0 1 0</position>
            </node>
            <node>
                <name>sole_top</name>
                <material>mat_sole</material>
                <mesh>
                    v 0 0 0
                    v 1 0 0
                    v 0 1 0
                    f 1 2 3
                </mesh>
            </node>
        </node>
    </scene>
    "#;

    #[test]
    fn parse_scene_builds_tree_and_materials() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.materials().len(), 2);
        assert_eq!(scene.root.children.len(), 1);
        let shoe = &scene.root.children[0];
        assert_eq!(shoe.name, "shoe");
        assert!(!shoe.is_drawable());
        assert_eq!(shoe.children.len(), 2);
        assert_eq!(scene.root.drawable_count(), 2);

        let laces = scene.material("mat_laces").unwrap();
        assert_eq!(laces.read().color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert_eq!(scene.material("mat_sole").unwrap().read().color, Vec3::ONE);
    }

    #[test]
    fn drawables_share_material_handles() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let laces = scene.material("mat_laces").unwrap();
        let mut found = false;
        scene.root.visit_drawables(&mut |node, drawable, _| {
            if node.name == "laces_a" {
                let material = drawable.material.as_ref().unwrap();
                assert!(Arc::ptr_eq(material, &laces));
                found = true;
            }
        });
        assert!(found);
    }

    #[test]
    fn world_matrix_composes_parent_transform() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let mut origin = None;
        scene.root.visit_drawables(&mut |node, _, world| {
            if node.name == "laces_a" {
                origin = Some(world.transform_point3(Vec3::ZERO));
            }
        });
        assert_eq!(origin, Some(Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn unknown_material_is_an_error() {
        let bad = r#"<scene><node><name>a</name><material>nope</material><box>1 1 1</box></node></scene>"#;
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><node><box>1 1 1</box></node></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }
}
