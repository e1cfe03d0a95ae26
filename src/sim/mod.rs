//! Reel motion simulation
//!
//! Everything here is frame-driven and deterministic:
//! - Time only advances through `update(delta)`
//! - Seeded RNG only (one per reel, one for outcomes)
//! - Reels update in list order and never read each other's state

pub mod machine;
pub mod reel;
pub mod sequence;
pub mod symbol;
pub mod tween;

pub use machine::{RandomWinCheck, SlotMachine, SpinOutcome, WinCheck, reel_seed};
pub use reel::{Reel, ReelEvent, ReelState};
pub use sequence::{ReelCommand, SpinSequence};
pub use symbol::{Sprite, Symbol, SymbolCatalog};
pub use tween::{Easing, Tween};

/// Catalog over the default symbol table with every texture registered
#[cfg(test)]
pub(crate) fn test_catalog() -> SymbolCatalog {
    use crate::assets::TextureCache;
    use crate::settings::default_symbols;

    let mut cache = TextureCache::new();
    for (i, def) in default_symbols().iter().enumerate() {
        cache.register(&def.name, 200 + 20 * i as u32, 200);
    }
    SymbolCatalog::new(default_symbols(), cache)
}
