//! Reel Spin - slot machine reel motion engine
//!
//! Core modules:
//! - `sim`: Reel state machine, symbol recycling, spin sequencing
//! - `assets`: Texture handles and the texture provider seam
//! - `audio`: Sound store behind a fire-and-forget output trait
//! - `scene`: Minimal positioned node tree the reels attach to
//! - `settings`: Data-driven tuning, layout and asset manifest

pub mod assets;
pub mod audio;
pub mod scene;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SpinPace};
pub use sim::{ReelEvent, SlotMachine, SpinOutcome};

/// Engine configuration constants
pub mod consts {
    /// Length of one update frame in seconds (delta 1.0 == one 60 Hz frame)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Reel speed while spinning (pixels per frame)
    pub const SPIN_SPEED: f32 = 50.0;
    /// Per-frame speed multiplier while decelerating
    pub const SLOWDOWN_RATE: f32 = 0.95;
    /// `stop_spin` bumps speeds at or below this up to `STOP_FLOOR`
    pub const STOP_THRESHOLD: f32 = 2.0;
    pub const STOP_FLOOR: f32 = 0.5;
    /// Below this speed the reel pins to zero and settles on the grid
    pub const SETTLE_EPSILON: f32 = 0.5;

    /// Grid glide duration (seconds)
    pub const SETTLE_DURATION: f32 = 0.8;
    /// Bounce duration after the glide (seconds)
    pub const BOUNCE_DURATION: f32 = 0.1;

    /// Machine geometry
    pub const REEL_COUNT: usize = 4;
    pub const SYMBOLS_PER_REEL: usize = 6;
    pub const SYMBOL_SIZE: f32 = 150.0;
    pub const REEL_SPACING: f32 = 10.0;

    /// Spin sequencing (milliseconds)
    pub const START_INTERVAL_MS: f32 = 200.0;
    pub const HOLD_MS: f32 = 800.0;
    pub const STOP_INTERVAL_MS: f32 = 200.0;

    /// Placeholder win draw
    pub const WIN_PROBABILITY: f64 = 0.3;
}

/// Wrap a scroll offset into `[0, width)`.
///
/// Returns the wrapped value and the signed number of whole widths removed
/// (negative when the input was below zero).
#[inline]
pub fn wrap_offset(offset: f32, width: f32) -> (f32, i64) {
    if width <= 0.0 {
        return (0.0, 0);
    }
    // f32 division can round a quotient just below an integer up to it,
    // so floor and remainder are taken in f64.
    let (offset_wide, width_wide) = (f64::from(offset), f64::from(width));
    let mut wraps = (offset_wide / width_wide).floor();
    let mut remainder = offset_wide - wraps * width_wide;
    if remainder < 0.0 {
        wraps -= 1.0;
        remainder += width_wide;
    } else if remainder >= width_wide {
        wraps += 1.0;
        remainder -= width_wide;
    }
    let mut wrapped = remainder as f32;
    // A tiny negative offset narrows to exactly `width`; that is zero
    // with one fewer underflow.
    if wrapped >= width {
        wrapped = 0.0;
        wraps += 1.0;
    }
    (wrapped.max(0.0), wraps as i64)
}

/// Nearest grid line to `offset` on a `cell` pitch, ties rounding up.
#[inline]
pub fn nearest_grid(offset: f32, cell: f32) -> f32 {
    let remainder = offset.rem_euclid(cell);
    if remainder < cell / 2.0 {
        offset - remainder
    } else {
        offset + (cell - remainder)
    }
}
