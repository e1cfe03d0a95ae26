//! Scene nodes
//!
//! The engine only needs positions and parentage from the host renderer, so
//! a node is a position plus the children it owns. Renderers walk the tree.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A positioned node owning its children
#[derive(Debug, Clone, Default)]
pub struct Node<T> {
    pub position: Vec2,
    children: Vec<T>,
}

impl<T> Node<T> {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            children: Vec::new(),
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn add_child(&mut self, child: T) {
        self.children.push(child);
    }

    pub fn remove_children(&mut self) {
        self.children.clear();
    }

    pub fn children(&self) -> &[T] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [T] {
        &mut self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Axis-aligned rectangle (backdrops, masks)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Grow on every side by `margin`
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }
}
