//! Audio output
//!
//! The machine fires sounds by alias and never waits on them. Hosts plug in
//! their mixer through `AudioOutput`; `SoundBank` is the bundled store that
//! tracks registered sounds, volumes and what is currently playing.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Sound effects the machine triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Reels start spinning
    ReelSpin,
    /// Outcome check reported a win
    Win,
}

impl SoundEffect {
    /// Alias the sound is registered under
    pub fn alias(&self) -> &'static str {
        match self {
            SoundEffect::ReelSpin => "Reel spin",
            SoundEffect::Win => "win",
        }
    }
}

/// Fire-and-forget audio sink
pub trait AudioOutput {
    fn play(&mut self, alias: &str, looped: bool);
    fn stop(&mut self, alias: &str);
}

/// Manifest entry for a sound file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundDef {
    pub alias: String,
    pub url: String,
}

/// A registered sound
#[derive(Debug, Clone)]
struct Sound {
    url: String,
    looped: bool,
}

/// Sound store keyed by alias
#[derive(Debug, Clone)]
pub struct SoundBank {
    sounds: HashMap<String, Sound>,
    playing: HashSet<String>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundBank {
    pub fn new() -> Self {
        Self {
            sounds: HashMap::new(),
            playing: HashSet::new(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Build a bank from manifest entries
    pub fn from_manifest(defs: &[SoundDef]) -> Self {
        let mut bank = Self::new();
        for def in defs {
            bank.add(&def.alias, &def.url);
        }
        bank
    }

    /// Register a sound under an alias
    pub fn add(&mut self, alias: &str, url: &str) {
        if url.is_empty() {
            log::warn!("Failed to load sound: {alias} (empty url)");
            return;
        }
        self.sounds.insert(
            alias.to_string(),
            Sound {
                url: url.to_string(),
                looped: false,
            },
        );
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn is_playing(&self, alias: &str) -> bool {
        self.playing.contains(alias)
    }

    pub fn is_looping(&self, alias: &str) -> bool {
        self.sounds.get(alias).is_some_and(|s| s.looped)
    }
}

impl AudioOutput for SoundBank {
    fn play(&mut self, alias: &str, looped: bool) {
        let Some(sound) = self.sounds.get_mut(alias) else {
            log::warn!("Sound not found: {alias}");
            return;
        };
        sound.looped = looped;
        if self.muted || self.master_volume * self.sfx_volume <= 0.0 {
            return;
        }
        log::debug!("Playing {alias} from {}", sound.url);
        self.playing.insert(alias.to_string());
    }

    fn stop(&mut self, alias: &str) {
        self.playing.remove(alias);
    }
}

/// Sink that drops everything (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioOutput for Silent {
    fn play(&mut self, _alias: &str, _looped: bool) {}
    fn stop(&mut self, _alias: &str) {}
}
