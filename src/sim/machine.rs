//! Slot machine orchestrator
//!
//! Owns the reels, runs the spin timeline and counts reel stop events. When
//! every reel of the current cycle has reported in, it runs the outcome check
//! and fires the spin-end callback, once per cycle.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::reel::{Reel, ReelEvent};
use super::sequence::{ReelCommand, SpinSequence};
use super::symbol::SymbolCatalog;
use crate::assets::TextureCache;
use crate::audio::{AudioOutput, SoundBank, SoundEffect};
use crate::consts::FRAME_DT;
use crate::scene::{Node, Rect};
use crate::settings::{ConfigError, MachineLayout, Settings, SpinTiming};

/// Result of a completed spin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinOutcome {
    pub win: bool,
    /// Visible type ids per reel, left to right
    pub grid: Vec<Vec<usize>>,
}

/// Decides whether a settled grid is a win
pub trait WinCheck {
    fn check(&mut self, grid: &[Vec<usize>], rng: &mut Pcg32) -> bool;
}

/// Placeholder check: a weighted coin flip that ignores the grid
#[derive(Debug, Clone, Copy)]
pub struct RandomWinCheck {
    pub probability: f64,
}

impl WinCheck for RandomWinCheck {
    fn check(&mut self, _grid: &[Vec<usize>], rng: &mut Pcg32) -> bool {
        if !self.probability.is_finite() {
            return false;
        }
        rng.random_bool(self.probability.clamp(0.0, 1.0))
    }
}

/// Seed for reel `index`, derived from the run seed
pub fn reel_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Backdrop and mask rectangles, if the layout can produce them
fn build_decoration(layout: &MachineLayout) -> Option<(Rect, Rect)> {
    let backdrop = layout.backdrop();
    let mask = layout.mask();
    for rect in [backdrop, mask] {
        let finite = [rect.x, rect.y, rect.width, rect.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || rect.width <= 0.0 || rect.height <= 0.0 {
            log::error!("Error creating background: degenerate rect {rect:?}");
            return None;
        }
    }
    Some((backdrop, mask))
}

type SpinEndCallback = Box<dyn FnMut(&SpinOutcome)>;

pub struct SlotMachine {
    /// Machine container position on screen
    pub position: Vec2,
    reels: Node<Reel>,
    backdrop: Option<Rect>,
    mask: Option<Rect>,
    timing: SpinTiming,
    is_spinning: bool,
    stopped_count: usize,
    sequence: Option<SpinSequence>,
    events_tx: Sender<ReelEvent>,
    events_rx: Receiver<ReelEvent>,
    audio: Box<dyn AudioOutput>,
    win_check: Box<dyn WinCheck>,
    rng: Pcg32,
    on_spin_end: Option<SpinEndCallback>,
    last_outcome: Option<SpinOutcome>,
    spins_completed: u64,
}

impl SlotMachine {
    /// Build a machine; fails if the settings cannot drive a spin cycle
    pub fn new(
        settings: &Settings,
        catalog: Rc<SymbolCatalog>,
        audio: impl AudioOutput + 'static,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let layout = &settings.layout;
        let (events_tx, events_rx) = mpsc::channel();

        let mut reels = Node::new();
        let offset = layout.reels_offset();
        reels.set_position(offset.x, offset.y);
        for i in 0..layout.reel_count {
            let mut reel = Reel::new(
                i,
                layout.symbols_per_reel,
                layout.symbol_size,
                settings.tuning,
                Rc::clone(&catalog),
                Pcg32::seed_from_u64(reel_seed(settings.seed, i)),
            );
            reel.position = layout.reel_position(i);
            reel.connect(events_tx.clone());
            reels.add_child(reel);
        }

        let decoration = build_decoration(layout);
        log::info!(
            "Slot machine ready: {} reels x {} symbols, seed {}",
            layout.reel_count,
            layout.symbols_per_reel,
            settings.seed
        );

        Ok(Self {
            position: layout.machine_position(),
            reels,
            backdrop: decoration.map(|(backdrop, _)| backdrop),
            mask: decoration.map(|(_, mask)| mask),
            timing: settings.timing(),
            is_spinning: false,
            stopped_count: 0,
            sequence: None,
            events_tx,
            events_rx,
            audio: Box::new(audio),
            win_check: Box::new(RandomWinCheck {
                probability: settings.win_probability,
            }),
            rng: Pcg32::seed_from_u64(settings.seed),
            on_spin_end: None,
            last_outcome: None,
            spins_completed: 0,
        })
    }

    /// Build a machine with the bundled texture cache and sound bank
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let textures = TextureCache::from_manifest(&settings.textures);
        let catalog = Rc::new(SymbolCatalog::new(settings.symbols.clone(), textures));

        let mut audio = SoundBank::from_manifest(&settings.sounds);
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);

        Self::new(settings, catalog, audio)
    }

    /// Replace the outcome check
    pub fn set_win_check(&mut self, check: impl WinCheck + 'static) {
        self.win_check = Box::new(check);
    }

    /// Register the callback fired once per completed spin
    pub fn on_spin_end(&mut self, callback: impl FnMut(&SpinOutcome) + 'static) {
        self.on_spin_end = Some(Box::new(callback));
    }

    /// Sender reels use to report; hand it to anything that emits reel events
    pub fn event_sender(&self) -> Sender<ReelEvent> {
        self.events_tx.clone()
    }

    /// Begin a spin cycle. Returns `false` if one is already running.
    pub fn spin(&mut self) -> bool {
        if self.is_spinning {
            return false;
        }
        self.is_spinning = true;
        self.stopped_count = 0;
        self.audio.play(SoundEffect::ReelSpin.alias(), false);

        let mut sequence = SpinSequence::new(self.reels.len(), &self.timing);
        let due = sequence.advance(0.0);
        self.sequence = Some(sequence);
        self.dispatch(&due);
        log::info!("Spin started");
        true
    }

    /// Advance one frame; `delta` is in frames (1.0 == one 60 Hz frame)
    pub fn update(&mut self, delta: f32) {
        let due = match self.sequence.as_mut() {
            Some(sequence) => sequence.advance(delta * FRAME_DT),
            None => Vec::new(),
        };
        self.dispatch(&due);
        if self.sequence.as_ref().is_some_and(SpinSequence::is_complete) {
            self.sequence = None;
            log::debug!("Spin sequence complete");
        }

        for reel in self.reels.children_mut() {
            reel.update(delta);
        }

        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                ReelEvent::Stopped { reel_id } => self.on_reel_stopped(reel_id),
            }
        }
    }

    fn dispatch(&mut self, commands: &[ReelCommand]) {
        let reels = self.reels.children_mut();
        for command in commands {
            match *command {
                ReelCommand::Start(i) => reels[i].start_spin(),
                ReelCommand::Stop(i) => reels[i].stop_spin(),
            }
        }
    }

    fn on_reel_stopped(&mut self, reel_id: usize) {
        if !self.is_spinning {
            log::debug!("Reel {reel_id} stopped outside a spin cycle");
            return;
        }
        log::info!("Reel {reel_id} fully stopped");
        self.stopped_count += 1;

        if self.stopped_count >= self.reels.len() {
            self.stopped_count = 0;
            self.on_all_reels_stopped();
        }
    }

    fn on_all_reels_stopped(&mut self) {
        self.is_spinning = false;
        self.audio.stop(SoundEffect::ReelSpin.alias());

        let outcome = self.check_win();
        self.spins_completed += 1;
        if let Some(callback) = self.on_spin_end.as_mut() {
            callback(&outcome);
        }
        self.last_outcome = Some(outcome);
    }

    fn check_win(&mut self) -> SpinOutcome {
        let grid: Vec<Vec<usize>> = self.reels.children().iter().map(Reel::visible_symbols).collect();
        let win = self.win_check.check(&grid, &mut self.rng);
        if win {
            self.audio.play(SoundEffect::Win.alias(), false);
            log::info!("Winner!");
        }
        SpinOutcome { win, grid }
    }

    pub fn is_spinning(&self) -> bool {
        self.is_spinning
    }

    /// Stop events counted so far in the current cycle
    pub fn stopped_count(&self) -> usize {
        self.stopped_count
    }

    /// Start/stop schedule still has pending commands or delays
    pub fn is_sequencing(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn reels(&self) -> &[Reel] {
        self.reels.children()
    }

    /// The reels container node
    pub fn reels_node(&self) -> &Node<Reel> {
        &self.reels
    }

    pub fn backdrop(&self) -> Option<Rect> {
        self.backdrop
    }

    pub fn mask(&self) -> Option<Rect> {
        self.mask
    }

    pub fn last_outcome(&self) -> Option<&SpinOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn spins_completed(&self) -> u64 {
        self.spins_completed
    }
}
