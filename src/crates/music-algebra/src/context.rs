use crate::control::{MidiChannel, Mode, Pitch, PitchClass, Volume};
use crate::error::Result;
use crate::note::Note1;
use crate::player::{DefaultPlayer, Player};
use crate::rational::Rational;
use std::fmt;
use std::sync::Arc;

/// Interpretation state threaded down the music tree
///
/// A context is never shared mutably: every modifier produces a new one for
/// its subtree, so parallel branches start from the same snapshot and never
/// observe each other's changes.
pub struct Context<A> {
    /// Absolute time at which the current subtree starts
    pub time: Rational,
    pub player: Arc<dyn Player<A>>,
    /// Factor from unscaled delta to absolute time
    pub delta_scale: Rational,
    /// Accumulated transposition
    pub pitch: Pitch,
    pub volume: Volume,
    /// Factor from unscaled delta to sounding duration
    pub dur_scale: Rational,
    pub instrument: MidiChannel,
    pub key: (PitchClass, Mode),
}

impl<A> Context<A> {
    pub fn new(player: Arc<dyn Player<A>>) -> Self {
        Context {
            time: Rational::ZERO,
            player,
            delta_scale: Rational::ONE,
            pitch: 0,
            volume: 127,
            dur_scale: Rational::new(1, 2),
            instrument: MidiChannel::CH1,
            key: (PitchClass::E, Mode::Phrygian),
        }
    }

    pub fn with_time(&self, time: Rational) -> Self {
        Context { time, ..self.clone() }
    }

    pub fn with_player(&self, player: Arc<dyn Player<A>>) -> Self {
        Context { player, ..self.clone() }
    }

    pub fn with_delta_scale(&self, delta_scale: Rational) -> Self {
        Context { delta_scale, ..self.clone() }
    }

    pub fn with_pitch(&self, pitch: Pitch) -> Self {
        Context { pitch, ..self.clone() }
    }

    pub fn with_volume(&self, volume: Volume) -> Self {
        Context { volume, ..self.clone() }
    }

    pub fn with_dur_scale(&self, dur_scale: Rational) -> Self {
        Context { dur_scale, ..self.clone() }
    }

    pub fn with_instrument(&self, instrument: MidiChannel) -> Self {
        Context { instrument, ..self.clone() }
    }

    pub fn with_key(&self, pitch_class: PitchClass, mode: Mode) -> Self {
        Context {
            key: (pitch_class, mode),
            ..self.clone()
        }
    }

    /// Move the time cursor forward by an absolute amount
    pub fn advanced(&self, elapsed: Rational) -> Result<Self> {
        Ok(self.with_time(self.time.checked_add(elapsed)?))
    }

    /// Divide both time and duration scales by a tempo ratio
    pub fn tempo_scaled(&self, ratio: Rational) -> Result<Self> {
        Ok(Context {
            delta_scale: self.delta_scale.checked_div(ratio)?,
            dur_scale: self.dur_scale.checked_div(ratio)?,
            ..self.clone()
        })
    }

    pub fn transposed(&self, interval: Pitch) -> Self {
        self.with_pitch(self.pitch + interval)
    }

    /// Absolute pitch class offset of a scale degree in the current key.
    ///
    /// Degree 0 is the tonic; degrees wrap into higher or lower octaves.
    /// `None` when the mode has no intervals.
    pub fn scale_degree_pitch(&self, degree: i32) -> Option<Pitch> {
        let (tonic, mode) = &self.key;
        let intervals = mode.intervals();
        if intervals.is_empty() {
            return None;
        }
        let len = intervals.len() as i32;
        let octave = degree.div_euclid(len);
        let step = intervals[degree.rem_euclid(len) as usize];
        Some(tonic.semitone() + step + 12 * octave)
    }
}

impl<A> Clone for Context<A> {
    fn clone(&self) -> Self {
        Context {
            time: self.time,
            player: Arc::clone(&self.player),
            delta_scale: self.delta_scale,
            pitch: self.pitch,
            volume: self.volume,
            dur_scale: self.dur_scale,
            instrument: self.instrument,
            key: self.key.clone(),
        }
    }
}

impl<A> fmt::Debug for Context<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("time", &self.time)
            .field("player", &self.player.name())
            .field("delta_scale", &self.delta_scale)
            .field("pitch", &self.pitch)
            .field("volume", &self.volume)
            .field("dur_scale", &self.dur_scale)
            .field("instrument", &self.instrument)
            .field("key", &self.key)
            .finish()
    }
}

/// Time 0, unit delta scale, no transposition, volume 127, half-length
/// durations, channel 1, E phrygian, played by the default player
impl Default for Context<Note1> {
    fn default() -> Self {
        Context::new(Arc::new(DefaultPlayer::default()))
    }
}
