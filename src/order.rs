use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::material::{to_hex_color, MaterialState};
use crate::registry::PartCategory;

/// Configuration of one category as submitted with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPart {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

/// Read-only view of the current configuration handed to order submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderDraft {
    pub parts: BTreeMap<PartCategory, OrderPart>,
}

impl OrderDraft {
    pub fn from_snapshot(snapshot: &BTreeMap<PartCategory, MaterialState>) -> Self {
        let parts = snapshot
            .iter()
            .map(|(category, state)| {
                (
                    *category,
                    OrderPart {
                        color: to_hex_color(state.color),
                        texture: state.texture.as_ref().map(|t| t.name.clone()),
                    },
                )
            })
            .collect();
        Self { parts }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureRef;
    use glam::Vec3;
    use std::path::PathBuf;

    #[test]
    fn snapshot_serializes_with_lowercase_categories() {
        let mut snapshot = BTreeMap::new();
        snapshot.insert(
            PartCategory::Laces,
            MaterialState::with_color(Vec3::new(1.0, 0.0, 0.0)),
        );
        snapshot.insert(
            PartCategory::Outside,
            MaterialState {
                color: Vec3::ONE,
                texture: Some(TextureRef {
                    name: "leather.png".to_string(),
                    path: PathBuf::from("/assets/leather.png"),
                }),
            },
        );
        let json = OrderDraft::from_snapshot(&snapshot).to_json().unwrap();
        assert_eq!(
            json,
            r##"{"parts":{"outside":{"color":"#ffffff","texture":"leather.png"},"laces":{"color":"#ff0000"}}}"##
        );
    }
}
