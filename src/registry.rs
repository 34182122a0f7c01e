use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfiguratorError;
use crate::scene::{MaterialHandle, PartId, SceneNode};

/// Coarse semantic grouping of the parts of a product model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PartCategory {
    Outside,
    Laces,
    Sole,
    Other,
}

impl PartCategory {
    pub const ALL: [PartCategory; 4] = [Self::Outside, Self::Laces, Self::Sole, Self::Other];

    /// Categories whose color and texture can be changed by the user.
    pub const CONFIGURABLE: [PartCategory; 3] = [Self::Outside, Self::Laces, Self::Sole];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outside => "outside",
            Self::Laces => "laces",
            Self::Sole => "sole",
            Self::Other => "other",
        }
    }

    pub fn is_configurable(self) -> bool {
        self != Self::Other
    }
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartCategory {
    type Err = ConfiguratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfiguratorError::UnknownCategory(s.to_string()))
    }
}

/// Name fragments checked in order; the first match decides the category.
const CLASSIFICATION_RULES: [(&str, PartCategory); 3] = [
    ("outside", PartCategory::Outside),
    ("laces", PartCategory::Laces),
    ("sole", PartCategory::Sole),
];

/// Derives the category of a part from its name.
pub fn classify(name: &str) -> PartCategory {
    CLASSIFICATION_RULES
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map(|(_, category)| *category)
        .unwrap_or(PartCategory::Other)
}

/// Drawable leaf as seen by the configurator.
#[derive(Debug, Clone)]
pub struct Part {
    pub id: PartId,
    pub name: String,
    pub category: PartCategory,
    pub material: Option<MaterialHandle>,
}

/// Index of the loaded model's parts grouped by category.
#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    parts: BTreeMap<PartCategory, Vec<Part>>,
}

impl PartRegistry {
    /// Indexes every drawable below `root`.
    ///
    /// Passing `None` (asset still loading) yields an empty registry so that
    /// early interactions degrade to no-ops.
    pub fn build(root: Option<&SceneNode>) -> Self {
        let Some(root) = root else {
            debug!("part registry requested before the model finished loading");
            return Self::default();
        };

        let mut parts: BTreeMap<PartCategory, Vec<Part>> = BTreeMap::new();
        root.visit_drawables(&mut |node, drawable, _| {
            let category = classify(&node.name);
            parts.entry(category).or_default().push(Part {
                id: node.id,
                name: node.name.clone(),
                category,
                material: drawable.material.clone(),
            });
        });
        Self { parts }
    }

    pub fn parts(&self, category: PartCategory) -> &[Part] {
        self.parts.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = PartCategory> + '_ {
        self.parts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.parts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: PartId) -> Option<&Part> {
        self.parts.values().flatten().find(|part| part.id == id)
    }

    /// Distinct materials used by the parts of `category`.
    pub fn materials(&self, category: PartCategory) -> Vec<MaterialHandle> {
        let mut materials: Vec<MaterialHandle> = Vec::new();
        for material in self.parts(category).iter().filter_map(|p| p.material.as_ref()) {
            if !materials.iter().any(|known| Arc::ptr_eq(known, material)) {
                materials.push(Arc::clone(material));
            }
        }
        materials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::TriangleMesh;
    use crate::scene::{Drawable, Material, Transform};
    use glam::Vec3;

    fn leaf(id: u32, name: &str, material: Option<MaterialHandle>) -> SceneNode {
        SceneNode {
            id: PartId(id),
            name: name.to_string(),
            transform: Transform::default(),
            drawable: Some(Drawable {
                mesh: TriangleMesh::cuboid(Vec3::ONE),
                material,
            }),
            children: Vec::new(),
        }
    }

    fn names(registry: &PartRegistry, category: PartCategory) -> Vec<&str> {
        registry
            .parts(category)
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    #[test]
    fn classify_uses_first_matching_rule() {
        assert_eq!(classify("outside_1"), PartCategory::Outside);
        assert_eq!(classify("laces_a"), PartCategory::Laces);
        assert_eq!(classify("sole_top"), PartCategory::Sole);
        assert_eq!(classify("misc_strap"), PartCategory::Other);
        assert_eq!(classify("outside_sole_trim"), PartCategory::Outside);
        assert_eq!(classify("laces_over_sole"), PartCategory::Laces);
    }

    #[test]
    fn groups_parts_by_category() {
        let root = SceneNode::group(
            PartId(10),
            "root",
            vec![
                leaf(0, "outside_1", None),
                leaf(1, "laces_a", None),
                SceneNode::group(PartId(2), "bottom", vec![leaf(3, "sole_top", None)]),
                leaf(4, "misc_strap", None),
            ],
        );
        let registry = PartRegistry::build(Some(&root));
        assert_eq!(registry.len(), 4);
        assert_eq!(names(&registry, PartCategory::Outside), ["outside_1"]);
        assert_eq!(names(&registry, PartCategory::Laces), ["laces_a"]);
        assert_eq!(names(&registry, PartCategory::Sole), ["sole_top"]);
        assert_eq!(names(&registry, PartCategory::Other), ["misc_strap"]);
        assert_eq!(registry.find(PartId(3)).unwrap().name, "sole_top");
    }

    #[test]
    fn unloaded_scene_yields_empty_registry() {
        let registry = PartRegistry::build(None);
        assert!(registry.is_empty());
        assert!(registry.parts(PartCategory::Laces).is_empty());
    }

    #[test]
    fn materials_are_deduplicated() {
        let shared = Material::new("mat_outside_1").into_handle();
        let root = SceneNode::group(
            PartId(9),
            "root",
            vec![
                leaf(0, "outside_left", Some(Arc::clone(&shared))),
                leaf(1, "outside_right", Some(Arc::clone(&shared))),
                leaf(2, "outside_tongue", None),
            ],
        );
        let registry = PartRegistry::build(Some(&root));
        assert_eq!(registry.parts(PartCategory::Outside).len(), 3);
        assert_eq!(registry.materials(PartCategory::Outside).len(), 1);
    }

    #[test]
    fn category_names_parse_case_insensitively() {
        assert_eq!("Laces".parse::<PartCategory>().unwrap(), PartCategory::Laces);
        assert!("heel".parse::<PartCategory>().is_err());
    }
}
