//! A single reel
//!
//! The strip holds `2N` symbols laid out one cell apart along x, with N
//! visible at a time. `scroll_offset` stays in `[0, N * cell)`; whenever it
//! wraps, the half that just left view is copied over the half coming into
//! view and the other half is re-rolled, so the strip scrolls forever
//! without allocating.
//!
//! State flow: `Idle -> Spinning -> Decelerating -> Settling -> Idle`.

use std::rc::Rc;
use std::sync::mpsc::Sender;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::symbol::{Symbol, SymbolCatalog};
use super::tween::Tween;
use crate::consts::FRAME_DT;
use crate::scene::Node;
use crate::settings::ReelTuning;
use crate::{nearest_grid, wrap_offset};

/// Reel motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelState {
    Idle,
    Spinning,
    Decelerating,
    Settling,
}

/// Notifications a reel sends to whoever is listening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelEvent {
    /// Reel has settled on the grid and is idle
    Stopped { reel_id: usize },
}

/// Which edge the offset crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrap {
    /// Offset went below zero; content moving toward +x
    Under,
    /// Offset reached the strip width; content moving toward -x
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettlePhase {
    Glide,
    Bounce,
}

/// In-flight grid snap, owned by its reel
#[derive(Debug, Clone)]
struct Settle {
    phase: SettlePhase,
    tween: Tween,
    /// Distance already applied from the current tween
    travelled: f32,
    /// Distance the bounce covers after the glide
    bounce_distance: f32,
}

pub struct Reel {
    id: usize,
    visible_count: usize,
    cell_size: f32,
    /// Container position in the reels node
    pub position: Vec2,
    strip: Node<Symbol>,
    scroll_offset: f32,
    speed: f32,
    spinning: bool,
    state: ReelState,
    settle: Option<Settle>,
    tuning: ReelTuning,
    catalog: Rc<SymbolCatalog>,
    rng: Pcg32,
    events: Option<Sender<ReelEvent>>,
}

fn random_type(rng: &mut Pcg32, type_count: usize) -> usize {
    if type_count == 0 {
        return 0;
    }
    rng.random_range(0..type_count)
}

impl Reel {
    pub fn new(
        id: usize,
        visible_count: usize,
        cell_size: f32,
        tuning: ReelTuning,
        catalog: Rc<SymbolCatalog>,
        rng: Pcg32,
    ) -> Self {
        let mut reel = Self {
            id,
            visible_count,
            cell_size,
            position: Vec2::ZERO,
            strip: Node::new(),
            scroll_offset: 0.0,
            speed: 0.0,
            spinning: false,
            state: ReelState::Idle,
            settle: None,
            tuning,
            catalog,
            rng,
            events: None,
        };
        reel.build_strip();
        reel
    }

    /// Route this reel's events to `tx`
    pub fn connect(&mut self, tx: Sender<ReelEvent>) {
        self.events = Some(tx);
    }

    /// Fill the strip with `2N` random symbols
    fn build_strip(&mut self) {
        self.strip.remove_children();
        for i in 0..self.visible_count * 2 {
            let type_id = random_type(&mut self.rng, self.catalog.len());
            let mut symbol = Symbol::create(type_id, self.cell_size, &self.catalog);
            symbol.set_position(i as f32 * self.cell_size, 0.0);
            self.strip.add_child(symbol);
        }
    }

    /// Start spinning at full speed (no-op while already spinning)
    pub fn start_spin(&mut self) {
        if self.spinning {
            return;
        }
        if self.settle.take().is_some() {
            log::debug!("reel {}: settle cancelled by restart", self.id);
        }
        self.spinning = true;
        self.speed = self.tuning.spin_speed;
        self.state = ReelState::Spinning;
        log::debug!("reel {}: start spin at {}", self.id, self.speed);
    }

    /// Let the reel coast to a stop
    pub fn stop_spin(&mut self) {
        self.spinning = false;
        // Guarantee at least one deceleration step before the snap
        if self.speed.abs() <= self.tuning.stop_threshold {
            self.speed = self.tuning.stop_floor.copysign(self.tuning.spin_speed);
        }
        self.state = ReelState::Decelerating;
        log::debug!("reel {}: stop spin at {}", self.id, self.speed);
    }

    /// Advance one step; `delta` is in frames (1.0 == one 60 Hz frame)
    pub fn update(&mut self, delta: f32) {
        if !self.spinning && self.speed == 0.0 {
            if self.settle.is_some() {
                self.advance_settle(delta * FRAME_DT);
            }
            return;
        }

        self.shift(-self.speed * delta);
        self.strip.position.x = -self.scroll_offset;

        if !self.spinning {
            self.speed *= self.tuning.slowdown_rate;
            if self.speed.abs() < self.tuning.settle_epsilon {
                self.speed = 0.0;
                self.begin_settle();
            }
        }
    }

    /// Move the offset by `distance`, wrapping and recycling as needed
    fn shift(&mut self, distance: f32) {
        let (wrapped, wraps) = wrap_offset(self.scroll_offset + distance, self.strip_width());
        self.scroll_offset = wrapped;
        // Two passes already re-roll every slot
        for _ in 0..wraps.unsigned_abs().min(2) {
            self.recycle(if wraps < 0 { Wrap::Under } else { Wrap::Over });
        }
    }

    /// Copy the outgoing half over the incoming half, re-roll the rest
    fn recycle(&mut self, wrap: Wrap) {
        let n = self.visible_count;
        let (outgoing, incoming) = match wrap {
            Wrap::Under => (0, n),
            Wrap::Over => (n, 0),
        };
        let catalog = Rc::clone(&self.catalog);
        let symbols = self.strip.children_mut();
        for i in 0..n {
            let type_id = symbols[outgoing + i].type_id();
            symbols[incoming + i].retype(type_id, &catalog);
        }
        for i in 0..n {
            let type_id = random_type(&mut self.rng, catalog.len());
            symbols[outgoing + i].retype(type_id, &catalog);
        }
    }

    fn begin_settle(&mut self) {
        if self.settle.take().is_some() {
            log::debug!("reel {}: previous settle cancelled", self.id);
        }
        let cell = self.cell_size;
        let to_grid = nearest_grid(self.scroll_offset, cell) - self.scroll_offset;
        // Overshoot continues in the travel direction (offset decreases for positive speed)
        let overshoot = -self.tuning.bounce_overshoot * cell * self.tuning.spin_speed.signum();
        let glide = to_grid + overshoot;

        self.settle = Some(Settle {
            phase: SettlePhase::Glide,
            tween: Tween::new(
                0.0,
                glide,
                self.tuning.settle_duration,
                self.tuning.settle_easing,
            ),
            travelled: 0.0,
            bounce_distance: to_grid - glide,
        });
        self.state = ReelState::Settling;
        log::debug!(
            "reel {}: settling from {:.2} by {:.2}",
            self.id,
            self.scroll_offset,
            to_grid
        );
    }

    fn advance_settle(&mut self, dt: f32) {
        let Some(settle) = self.settle.as_mut() else {
            return;
        };
        let value = settle.tween.advance(dt);
        let step = value - settle.travelled;
        settle.travelled = value;
        let finished = settle.tween.is_finished();
        let phase = settle.phase;
        let bounce_distance = settle.bounce_distance;

        self.shift(step);
        self.snap_strip();
        if !finished {
            return;
        }

        match phase {
            SettlePhase::Glide => {
                if let Some(settle) = self.settle.as_mut() {
                    settle.phase = SettlePhase::Bounce;
                    settle.tween = Tween::new(
                        0.0,
                        bounce_distance,
                        self.tuning.bounce_duration,
                        self.tuning.bounce_easing,
                    );
                    settle.travelled = 0.0;
                }
            }
            SettlePhase::Bounce => self.finish_settle(),
        }
    }

    fn finish_settle(&mut self) {
        self.settle = None;
        self.speed = 0.0;
        let snapped = nearest_grid(self.scroll_offset, self.cell_size);
        self.shift(snapped - self.scroll_offset);
        self.snap_strip();
        self.state = ReelState::Idle;
        log::debug!("reel {}: stopped at {}", self.id, self.scroll_offset);

        if let Some(tx) = &self.events {
            if tx.send(ReelEvent::Stopped { reel_id: self.id }).is_err() {
                log::debug!("reel {}: stop event has no listener", self.id);
            }
        }
    }

    /// Whole-pixel strip position
    fn snap_strip(&mut self) {
        self.strip.position.x = (-self.scroll_offset).round();
    }

    /// Type ids currently in view, left to right
    pub fn visible_symbols(&self) -> Vec<usize> {
        let first = (self.scroll_offset / self.cell_size).round() as usize;
        let first = first.min(self.visible_count);
        self.strip.children()[first..first + self.visible_count]
            .iter()
            .map(Symbol::type_id)
            .collect()
    }

    /// Width of one visible window (`N * cell`)
    pub fn strip_width(&self) -> f32 {
        self.visible_count as f32 * self.cell_size
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> ReelState {
        self.state
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn strip(&self) -> &Node<Symbol> {
        &self.strip
    }

    pub fn symbols(&self) -> &[Symbol] {
        self.strip.children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_catalog;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use std::sync::mpsc;

    fn reel_with(visible: usize, cell: f32, id: usize, tuning: ReelTuning) -> Reel {
        Reel::new(
            id,
            visible,
            cell,
            tuning,
            Rc::new(test_catalog()),
            Pcg32::seed_from_u64(7 + id as u64),
        )
    }

    fn reel(visible: usize, cell: f32, id: usize) -> Reel {
        reel_with(visible, cell, id, ReelTuning::default())
    }

    fn types(reel: &Reel) -> Vec<usize> {
        reel.symbols().iter().map(Symbol::type_id).collect()
    }

    /// Run updates until the reel goes idle; returns frames used
    fn run_to_idle(reel: &mut Reel, max_frames: usize) -> usize {
        for frame in 0..max_frames {
            reel.update(1.0);
            if reel.state() == ReelState::Idle {
                return frame + 1;
            }
        }
        panic!("reel {} did not stop in {max_frames} frames", reel.id());
    }

    #[test]
    fn test_strip_is_double_length() {
        let reel = reel(3, 100.0, 0);
        assert_eq!(reel.symbols().len(), 6);
        for (i, symbol) in reel.symbols().iter().enumerate() {
            assert_eq!(symbol.position, Vec2::new(i as f32 * 100.0, 0.0));
            assert_eq!(symbol.pivot(), Vec2::splat(50.0));
        }
    }

    #[test]
    fn test_start_spin() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        assert!(reel.is_spinning());
        assert_eq!(reel.speed(), 50.0);
        assert_eq!(reel.state(), ReelState::Spinning);
    }

    #[test]
    fn test_start_spin_twice_is_noop() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        reel.update(1.0);
        reel.stop_spin();
        reel.update(1.0);
        let decayed = reel.speed();
        reel.start_spin();
        assert_eq!(reel.speed(), 50.0);
        reel.start_spin();
        assert_eq!(reel.speed(), 50.0);
        assert!(decayed < 50.0);
    }

    #[test]
    fn test_stop_spin_keeps_speed_above_threshold() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        reel.stop_spin();
        assert!(!reel.is_spinning());
        assert_eq!(reel.speed(), 50.0);
        assert_eq!(reel.state(), ReelState::Decelerating);
    }

    #[test]
    fn test_stop_spin_at_rest_bumps_to_floor() {
        let mut reel = reel(3, 100.0, 0);
        reel.stop_spin();
        assert_eq!(reel.speed(), 0.5);

        // One decel step, then the settle takes over
        reel.update(1.0);
        assert_eq!(reel.speed(), 0.0);
        assert_eq!(reel.state(), ReelState::Settling);
    }

    #[test]
    fn test_idle_update_is_noop() {
        let mut reel = reel(3, 100.0, 0);
        let before = types(&reel);
        reel.update(1.0);
        assert_eq!(reel.scroll_offset(), 0.0);
        assert_eq!(reel.strip().position, Vec2::ZERO);
        assert_eq!(types(&reel), before);
    }

    #[test]
    fn test_update_moves_strip() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        let old_x = reel.strip().position.x;
        reel.update(1.0);
        assert_ne!(reel.strip().position.x, old_x);
        // 0 - 50 wraps to 250 on a 300 wide strip
        assert_eq!(reel.scroll_offset(), 250.0);
        assert_eq!(reel.strip().position.x, -250.0);
    }

    #[test]
    fn test_underflow_keeps_content_continuous() {
        let mut reel = reel(3, 100.0, 0);
        let before = types(&reel);
        reel.start_spin();
        reel.update(1.0);

        let after = types(&reel);
        // Slots that were in view now sit one strip width to the right
        assert_eq!(&after[3..6], &before[0..3]);
    }

    #[test]
    fn test_overflow_keeps_content_continuous() {
        let tuning = ReelTuning {
            spin_speed: -50.0,
            ..ReelTuning::default()
        };
        let mut reel = reel_with(3, 100.0, 0, tuning);
        reel.start_spin();
        for _ in 0..5 {
            reel.update(1.0);
        }
        assert_eq!(reel.scroll_offset(), 250.0);
        let before = types(&reel);

        reel.update(1.0);
        assert_eq!(reel.scroll_offset(), 0.0);
        let after = types(&reel);
        assert_eq!(&after[0..3], &before[3..6]);
    }

    #[test]
    fn test_recycle_reuses_symbols() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        for _ in 0..40 {
            reel.update(1.0);
            assert_eq!(reel.symbols().len(), 6);
        }
        for (i, symbol) in reel.symbols().iter().enumerate() {
            assert_eq!(symbol.position.x, i as f32 * 100.0);
        }
    }

    #[test]
    fn test_decay_is_geometric() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        reel.stop_spin();
        let mut expected = 50.0_f32;
        while expected * 0.95 >= 0.5 {
            reel.update(1.0);
            expected *= 0.95;
            assert!((reel.speed() - expected).abs() < 1e-3);
            assert_eq!(reel.state(), ReelState::Decelerating);
        }
        reel.update(1.0);
        assert_eq!(reel.speed(), 0.0);
        assert_eq!(reel.state(), ReelState::Settling);
    }

    #[test]
    fn test_full_stop_aligns_and_notifies_once() {
        let (tx, rx) = mpsc::channel();
        let mut reel = reel(3, 100.0, 2);
        reel.connect(tx);
        reel.start_spin();
        for _ in 0..10 {
            reel.update(1.0);
        }
        reel.stop_spin();
        run_to_idle(&mut reel, 1000);

        let offset = reel.scroll_offset();
        assert!(offset.rem_euclid(100.0) < 1e-3 || 100.0 - offset.rem_euclid(100.0) < 1e-3);
        assert!((0.0..300.0).contains(&offset));
        assert_eq!(reel.strip().position.x, (-offset).round());
        assert_eq!(reel.speed(), 0.0);
        assert!(!reel.is_settling());

        assert_eq!(rx.try_recv(), Ok(ReelEvent::Stopped { reel_id: 2 }));
        for _ in 0..30 {
            reel.update(1.0);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_settle_glides_toward_grid() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        reel.update(0.37);
        reel.stop_spin();
        while reel.state() != ReelState::Settling {
            reel.update(1.0);
        }
        let start = reel.scroll_offset();
        let target = nearest_grid(start, 100.0);

        reel.update(1.0);
        let first = reel.scroll_offset();
        // Moves toward the target without passing it
        let (lo, hi) = if target >= start { (start, target) } else { (target, start) };
        assert!(first >= lo - 1e-3 && first <= hi + 1e-3);
    }

    #[test]
    fn test_settle_duration_in_frames() {
        let mut reel = reel(3, 100.0, 0);
        reel.stop_spin();
        reel.update(1.0);
        assert_eq!(reel.state(), ReelState::Settling);
        // 0.8 s glide + 0.1 s bounce at 60 frames per second
        let frames = run_to_idle(&mut reel, 200);
        assert!((54..=56).contains(&frames), "settled in {frames} frames");
    }

    #[test]
    fn test_restart_cancels_settle() {
        let (tx, rx) = mpsc::channel();
        let mut reel = reel(3, 100.0, 0);
        reel.connect(tx);
        reel.stop_spin();
        reel.update(1.0);
        assert!(reel.is_settling());

        reel.start_spin();
        assert!(!reel.is_settling());
        assert_eq!(reel.state(), ReelState::Spinning);
        for _ in 0..100 {
            reel.update(1.0);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_during_settle_replaces_it() {
        let (tx, rx) = mpsc::channel();
        let mut reel = reel(3, 100.0, 1);
        reel.connect(tx);
        reel.stop_spin();
        reel.update(1.0);
        reel.update(1.0);
        assert!(reel.is_settling());

        reel.stop_spin();
        run_to_idle(&mut reel, 200);
        assert_eq!(rx.try_recv(), Ok(ReelEvent::Stopped { reel_id: 1 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_overshoot_bounces_back_to_grid() {
        let tuning = ReelTuning {
            bounce_overshoot: 0.1,
            ..ReelTuning::default()
        };
        let mut reel = reel_with(3, 100.0, 0, tuning);
        reel.start_spin();
        reel.update(0.5);
        reel.stop_spin();
        run_to_idle(&mut reel, 1000);
        assert!(reel.scroll_offset().rem_euclid(100.0) < 1e-3);
    }

    #[test]
    fn test_visible_symbols_after_stop() {
        let mut reel = reel(3, 100.0, 0);
        reel.start_spin();
        reel.update(2.3);
        reel.stop_spin();
        run_to_idle(&mut reel, 1000);

        let first = (reel.scroll_offset() / 100.0).round() as usize;
        let visible = reel.visible_symbols();
        assert_eq!(visible.len(), 3);
        assert_eq!(visible, types(&reel)[first..first + 3].to_vec());
    }

    #[test]
    fn test_same_seed_same_strip() {
        let a = reel(4, 120.0, 3);
        let b = reel(4, 120.0, 3);
        assert_eq!(types(&a), types(&b));
    }

    proptest! {
        #[test]
        fn prop_offset_stays_in_bounds(
            deltas in prop::collection::vec(0.0f32..25.0, 1..60),
            speed in prop_oneof![5.0f32..400.0, -400.0f32..-5.0],
        ) {
            let tuning = ReelTuning { spin_speed: speed, ..ReelTuning::default() };
            let mut reel = reel_with(3, 100.0, 0, tuning);
            reel.start_spin();
            for delta in deltas {
                reel.update(delta);
                let offset = reel.scroll_offset();
                prop_assert!(offset >= 0.0 && offset < reel.strip_width(), "offset {}", offset);
                prop_assert_eq!(reel.symbols().len(), 6);
            }
        }

        #[test]
        fn prop_settles_on_grid(
            spin_frames in 0usize..40,
            partial in 0.0f32..1.0,
            cell in 20.0f32..200.0,
        ) {
            let mut reel = reel(3, cell, 0);
            reel.start_spin();
            for _ in 0..spin_frames {
                reel.update(1.0);
            }
            reel.update(partial);
            reel.stop_spin();
            run_to_idle(&mut reel, 2000);

            let remainder = reel.scroll_offset().rem_euclid(cell);
            prop_assert!(remainder < 1e-2 || cell - remainder < 1e-2, "remainder {}", remainder);
            prop_assert!(reel.scroll_offset() < reel.strip_width());
        }
    }
}
