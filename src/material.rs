use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::registry::{PartCategory, PartRegistry};
use crate::scene::MaterialHandle;
use crate::texture::TextureRef;

/// Base color forced under a texture so the image is shown unaltered.
pub const NEUTRAL_TEXTURE_COLOR: Vec3 = Vec3::ONE;

/// Color every category starts with once the model has loaded.
pub const DEFAULT_COLOR: Vec3 = Vec3::ONE;

/// Presentation of one part category.
///
/// Color and texture are exclusive: a texture is drawn over the neutral base
/// color and assigning a color drops the texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialState {
    pub color: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureRef>,
}

impl MaterialState {
    pub fn with_color(color: Vec3) -> Self {
        Self {
            color,
            texture: None,
        }
    }
}

impl Default for MaterialState {
    fn default() -> Self {
        Self::with_color(DEFAULT_COLOR)
    }
}

#[derive(Debug)]
struct StoreInner {
    default_state: MaterialState,
    neutral_color: Vec3,
    states: BTreeMap<PartCategory, MaterialState>,
    bindings: BTreeMap<PartCategory, Vec<MaterialHandle>>,
}

impl StoreInner {
    fn apply(&mut self, category: PartCategory, state: MaterialState) -> bool {
        let Some(materials) = self.bindings.get(&category) else {
            debug!("ignoring {category} change: no parts loaded for this category");
            return false;
        };
        for material in materials {
            let mut material = material.write();
            material.color = state.color;
            material.texture = state.texture.clone();
            material.needs_update = true;
        }
        self.states.insert(category, state);
        true
    }
}

/// Thread-safe store holding the current configuration of every category.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct MaterialStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl Default for MaterialStore {
    fn default() -> Self {
        Self::new(MaterialState::default(), NEUTRAL_TEXTURE_COLOR)
    }
}

impl MaterialStore {
    pub fn new(default_state: MaterialState, neutral_color: Vec3) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                default_state,
                neutral_color,
                states: BTreeMap::new(),
                bindings: BTreeMap::new(),
            })),
        }
    }

    /// Attaches the store to a freshly loaded model and puts every
    /// configurable category into the default state.
    pub fn bind(&self, registry: &PartRegistry) {
        let mut inner = self.inner.write();
        inner.states.clear();
        inner.bindings.clear();
        for category in PartCategory::CONFIGURABLE {
            if registry.parts(category).is_empty() {
                continue;
            }
            inner.bindings.insert(category, registry.materials(category));
            let state = inner.default_state.clone();
            inner.apply(category, state);
        }
    }

    pub fn is_bound(&self) -> bool {
        !self.inner.read().bindings.is_empty()
    }

    /// Assigns a flat color to `category`, dropping any texture.
    ///
    /// Returns `false` without touching anything when the category has no
    /// loaded parts or is not configurable.
    pub fn set_color(&self, category: PartCategory, color: Vec3) -> bool {
        if !category.is_configurable() {
            debug!("ignoring color change for non-configurable category {category}");
            return false;
        }
        self.inner
            .write()
            .apply(category, MaterialState::with_color(color))
    }

    /// Assigns a texture to `category` over the neutral base color.
    pub fn set_texture(&self, category: PartCategory, texture: TextureRef) -> bool {
        if !category.is_configurable() {
            debug!("ignoring texture change for non-configurable category {category}");
            return false;
        }
        let mut inner = self.inner.write();
        let state = MaterialState {
            color: inner.neutral_color,
            texture: Some(texture),
        };
        inner.apply(category, state)
    }

    /// Restores every bound category to the default state.
    ///
    /// The whole pass runs under one write lock so readers see either the
    /// previous configuration or the reset one.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        let categories: Vec<PartCategory> = inner.bindings.keys().copied().collect();
        for category in categories {
            let state = inner.default_state.clone();
            inner.apply(category, state);
        }
    }

    pub fn state(&self, category: PartCategory) -> Option<MaterialState> {
        self.inner.read().states.get(&category).cloned()
    }

    /// Consistent copy of the whole configuration.
    pub fn snapshot(&self) -> BTreeMap<PartCategory, MaterialState> {
        self.inner.read().states.clone()
    }
}

/// Parses `#rrggbb` (the leading `#` is optional) into a linear 0..1 color.
pub fn parse_hex_color(value: &str) -> ConfiguratorResult<Vec3> {
    let invalid = || ConfiguratorError::InvalidColor(value.to_string());
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map(|v| f32::from(v) / 255.0)
            .map_err(|_| invalid())
    };
    Ok(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Formats a 0..1 color as `#rrggbb`.
pub fn to_hex_color(color: Vec3) -> String {
    let [r, g, b] = color
        .clamp(Vec3::ZERO, Vec3::ONE)
        .to_array()
        .map(|c| (c * 255.0).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}
