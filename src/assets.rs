//! Texture handles and lookup
//!
//! The engine never loads image data. It only needs a texture's name and
//! pixel size to fit symbols into their cells, so a handle is plain data and
//! the provider is a trait the host implements over its real asset loader.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name used by the blank texture
pub const BLANK_TEXTURE: &str = "__blank";

/// Asset lookup failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("texture not found: {0}")]
    NotFound(String),
    #[error("texture {name} has zero size ({width}x{height})")]
    ZeroSized { name: String, width: u32, height: u32 },
}

/// A resolved texture handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// 1x1 stand-in used whenever a real texture cannot be resolved
    pub fn blank() -> Self {
        Self::new(BLANK_TEXTURE, 1, 1)
    }

    pub fn is_blank(&self) -> bool {
        self.name == BLANK_TEXTURE
    }
}

/// Manifest entry describing a texture the host has loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Resolves texture names to handles
pub trait TextureProvider {
    fn resolve(&self, name: &str) -> Result<Texture, AssetError>;

    /// Resolve, substituting the blank texture on failure
    fn resolve_or_blank(&self, name: &str) -> Texture {
        match self.resolve(name) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("{err}, using blank texture");
                Texture::blank()
            }
        }
    }
}

/// In-memory texture registry keyed by name
#[derive(Debug, Clone, Default)]
pub struct TextureCache {
    textures: HashMap<String, Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from manifest entries
    pub fn from_manifest(entries: &[TextureInfo]) -> Self {
        let mut cache = Self::new();
        for entry in entries {
            cache.register(&entry.name, entry.width, entry.height);
        }
        log::info!("Texture cache ready ({} textures)", cache.len());
        cache
    }

    pub fn register(&mut self, name: &str, width: u32, height: u32) {
        self.textures
            .insert(name.to_string(), Texture::new(name, width, height));
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureProvider for TextureCache {
    fn resolve(&self, name: &str) -> Result<Texture, AssetError> {
        let texture = self
            .textures
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        if texture.width == 0 || texture.height == 0 {
            return Err(AssetError::ZeroSized {
                name: name.to_string(),
                width: texture.width,
                height: texture.height,
            });
        }
        Ok(texture.clone())
    }
}
