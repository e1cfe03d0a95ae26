//! Reel symbols
//!
//! A symbol is a strip slot: a position, a centering pivot and one sprite.
//! Slots are created once and re-skinned in place as the strip recycles.

use glam::Vec2;

use crate::assets::{Texture, TextureProvider};
use crate::settings::SymbolDef;

/// Symbol type table plus the provider that resolves its textures
pub struct SymbolCatalog {
    defs: Vec<SymbolDef>,
    textures: Box<dyn TextureProvider>,
}

impl SymbolCatalog {
    pub fn new(defs: Vec<SymbolDef>, textures: impl TextureProvider + 'static) -> Self {
        Self {
            defs,
            textures: Box::new(textures),
        }
    }

    /// Number of symbol types
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Texture and vertical offset for a type; blank on any failure
    pub fn resolve(&self, type_id: usize) -> (Texture, f32) {
        match self.defs.get(type_id) {
            Some(def) => (self.textures.resolve_or_blank(&def.name), def.offset),
            None => {
                log::warn!("Unknown symbol type {type_id}, using blank texture");
                (Texture::blank(), 0.0)
            }
        }
    }
}

impl std::fmt::Debug for SymbolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolCatalog")
            .field("defs", &self.defs)
            .finish_non_exhaustive()
    }
}

/// The visual inside a symbol slot
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: Texture,
    pub scale: Vec2,
    pub position: Vec2,
    pub anchor: Vec2,
}

impl Sprite {
    fn new(texture: Texture) -> Self {
        Self {
            texture,
            scale: Vec2::ONE,
            position: Vec2::ZERO,
            anchor: Vec2::splat(0.5),
        }
    }
}

/// One slot on a reel strip
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    type_id: usize,
    offset: f32,
    pub position: Vec2,
    pivot: Vec2,
    sprite: Sprite,
}

impl Symbol {
    pub fn new(type_id: usize, texture: Texture, offset: f32) -> Self {
        Self {
            type_id,
            offset,
            position: Vec2::ZERO,
            pivot: Vec2::ZERO,
            sprite: Sprite::new(texture),
        }
    }

    /// Build a symbol of `type_id` fitted to a `cell_size` square
    pub fn create(type_id: usize, cell_size: f32, catalog: &SymbolCatalog) -> Self {
        let (texture, offset) = catalog.resolve(type_id);
        let mut symbol = Self::new(type_id, texture, offset);
        symbol.fit_to_size(cell_size);
        symbol
    }

    /// Fit the sprite proportionally inside a `cell_size` square.
    ///
    /// Scale is uniform. Textures with a zero dimension are left as is.
    pub fn fit_to_size(&mut self, cell_size: f32) {
        let (w, h) = (self.sprite.texture.width, self.sprite.texture.height);
        if w == 0 || h == 0 {
            return;
        }
        let scale = (cell_size / w as f32).min(cell_size / h as f32);
        self.sprite.scale = Vec2::splat(scale);
        self.sprite.position = Vec2::new(0.0, cell_size / 2.0 + self.offset);
        self.pivot = Vec2::splat(cell_size / 2.0);
    }

    /// Re-skin this slot as `type_id`, refitting to the established cell
    pub fn retype(&mut self, type_id: usize, catalog: &SymbolCatalog) {
        let (texture, offset) = catalog.resolve(type_id);
        self.type_id = type_id;
        self.offset = offset;
        self.sprite.texture = texture;

        // pivot.x is half the cell once fitted
        let cell_size = self.pivot.x * 2.0;
        if cell_size > 0.0 {
            self.fit_to_size(cell_size);
        } else {
            self.sprite.position.y = self.offset;
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn type_id(&self) -> usize {
        self.type_id
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }
}
