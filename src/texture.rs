use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfiguratorError, ConfiguratorResult};

/// Reference to an image that can be applied to a part category.
///
/// The configurator never decodes the image; the renderer resolves `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef {
    pub name: String,
    pub path: PathBuf,
}

impl fmt::Display for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolves texture names requested by the UI.
#[derive(Debug, Clone, Default)]
pub struct TextureLibrary {
    root: Option<PathBuf>,
}

impl TextureLibrary {
    /// Creates a library rooted at `root`. Without a root every name
    /// resolves to itself and availability is left to the renderer.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn load(&self, name: &str) -> ConfiguratorResult<TextureRef> {
        let path = match &self.root {
            Some(root) => {
                let path = root.join(name);
                if !is_contained(Path::new(name)) || !path.is_file() {
                    return Err(ConfiguratorError::TextureNotFound(path));
                }
                path
            }
            None => PathBuf::from(name),
        };
        Ok(TextureRef {
            name: name.to_string(),
            path,
        })
    }
}

/// Whether `name` stays below the directory it is joined onto.
fn is_contained(name: &Path) -> bool {
    name.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
