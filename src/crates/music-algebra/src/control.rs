//! Control modifiers and the musical vocabulary they refer to.
//!
//! A [`Control`] wraps a subtree and changes the performance context for
//! everything beneath it. Phrase attributes are interpreted by the active
//! player rather than by the interpreter itself.

use crate::error::{MusicError, Result};
use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute or relative pitch in semitones (MIDI numbering)
pub type Pitch = i32;

/// Note velocity, nominally 0..=127
pub type Volume = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Control {
    /// Speed up by the given ratio (2 plays twice as fast)
    Tempo(Rational),
    Transpose(Pitch),
    Instrument(MidiChannel),
    Key(PitchClass, Mode),
    Phrase(Vec<PhraseAttribute>),
    /// Free-form directive, see [`Directive`]
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhraseAttribute {
    Dyn(Dynamic),
    Art(Articulation),
    Tmp(Tempo),
    Orn(Ornament),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dynamic {
    /// Scale volume by the ratio
    Accent(Rational),
    /// Ramp volume up by the given fraction over the phrase
    Crescendo(Rational),
    /// Ramp volume down by the given fraction over the phrase
    Diminuendo(Rational),
    StdLoudness(StdLoudness),
    Loudness(Volume),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StdLoudness {
    PPP,
    PP,
    P,
    MP,
    SF,
    MF,
    NF,
    FF,
    FFF,
}

impl StdLoudness {
    /// Volume used for this marking
    pub fn volume(self) -> Volume {
        match self {
            StdLoudness::PPP => 40,
            StdLoudness::PP => 50,
            StdLoudness::P => 60,
            StdLoudness::MP => 70,
            StdLoudness::SF => 80,
            StdLoudness::MF => 90,
            StdLoudness::NF => 100,
            StdLoudness::FF => 110,
            StdLoudness::FFF => 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Articulation {
    Staccato(Rational),
    Legato(Rational),
    /// Like legato, but the final notes of the phrase keep their duration
    Slurred(Rational),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tempo {
    /// Slow down linearly, ending the phrase longer by the given fraction
    Ritardando(Rational),
    /// Speed up linearly, ending the phrase shorter by the given fraction
    Accelerando(Rational),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ornament {
    Trill,
}

/// MIDI channel, 1..=16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MidiChannel(u8);

impl MidiChannel {
    pub const CH1: MidiChannel = MidiChannel(1);
    pub const CH2: MidiChannel = MidiChannel(2);
    pub const CH3: MidiChannel = MidiChannel(3);
    pub const CH4: MidiChannel = MidiChannel(4);

    pub fn new(channel: u8) -> Result<Self> {
        if (1..=16).contains(&channel) {
            Ok(MidiChannel(channel))
        } else {
            Err(MusicError::InvalidChannel(channel))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MidiChannel {
    type Error = MusicError;

    fn try_from(channel: u8) -> Result<Self> {
        MidiChannel::new(channel)
    }
}

impl From<MidiChannel> for u8 {
    fn from(channel: MidiChannel) -> u8 {
        channel.0
    }
}

impl Default for MidiChannel {
    fn default() -> Self {
        MidiChannel::CH1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl PitchClass {
    /// Semitones above C
    pub fn semitone(self) -> Pitch {
        self as Pitch
    }
}

impl FromStr for PitchClass {
    type Err = MusicError;

    /// Accepts flat and sharp spellings, e.g. `"Eb"` or `"D#"`
    fn from_str(s: &str) -> Result<Self> {
        let pc = match s.trim() {
            "C" | "B#" => PitchClass::C,
            "Db" | "C#" => PitchClass::Db,
            "D" => PitchClass::D,
            "Eb" | "D#" => PitchClass::Eb,
            "E" | "Fb" => PitchClass::E,
            "F" | "E#" => PitchClass::F,
            "Gb" | "F#" => PitchClass::Gb,
            "G" => PitchClass::G,
            "Ab" | "G#" => PitchClass::Ab,
            "A" => PitchClass::A,
            "Bb" | "A#" => PitchClass::Bb,
            "B" | "Cb" => PitchClass::B,
            other => return Err(MusicError::UnknownPitchClass(other.to_string())),
        };
        Ok(pc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    LydianB7,
    Bhairavi,
    Custom(Vec<Pitch>),
}

impl Mode {
    /// Semitone offsets of each scale degree from the tonic
    pub fn intervals(&self) -> &[Pitch] {
        match self {
            Mode::Major | Mode::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            Mode::Minor | Mode::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            Mode::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Mode::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Mode::LydianB7 => &[0, 2, 4, 6, 7, 9, 10],
            Mode::Bhairavi => &[0, 1, 4, 5, 7, 8, 10],
            Mode::Custom(intervals) => intervals.as_slice(),
        }
    }
}

impl FromStr for Mode {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let mode = match s.trim().to_ascii_lowercase().as_str() {
            "major" => Mode::Major,
            "minor" => Mode::Minor,
            "ionian" => Mode::Ionian,
            "dorian" => Mode::Dorian,
            "phrygian" => Mode::Phrygian,
            "lydian" => Mode::Lydian,
            "mixolydian" => Mode::Mixolydian,
            "aeolian" => Mode::Aeolian,
            "locrian" => Mode::Locrian,
            "lydianb7" | "lydian-b7" => Mode::LydianB7,
            "bhairavi" => Mode::Bhairavi,
            _ => return Err(MusicError::UnknownMode(s.to_string())),
        };
        Ok(mode)
    }
}

/// Interpretation of a [`Control::Custom`] string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `player <name>`, prefix matched case-insensitively
    Player(&'a str),
    /// Anything else; performed as a no-op
    Other(&'a str),
}

impl<'a> Directive<'a> {
    const PLAYER_PREFIX: &'static str = "player ";

    pub fn parse(directive: &'a str) -> Self {
        let prefix_len = Self::PLAYER_PREFIX.len();
        match directive.get(..prefix_len) {
            Some(head) if head.eq_ignore_ascii_case(Self::PLAYER_PREFIX) => {
                Directive::Player(&directive[prefix_len..])
            }
            _ => Directive::Other(directive),
        }
    }
}

impl fmt::Display for Directive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Player(name) => write!(f, "player {}", name),
            Directive::Other(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parse() {
        assert_eq!(Directive::parse("player Fancy"), Directive::Player("Fancy"));
        assert_eq!(Directive::parse("PLAYER Fancy"), Directive::Player("Fancy"));
        assert_eq!(Directive::parse("player "), Directive::Player(""));
        assert_eq!(Directive::parse("player"), Directive::Other("player"));
        assert_eq!(Directive::parse("swing 2/3"), Directive::Other("swing 2/3"));
        assert_eq!(Directive::parse(""), Directive::Other(""));
    }

    #[test]
    fn test_directive_parse_multibyte_does_not_panic() {
        assert_eq!(Directive::parse("pläyer x"), Directive::Other("pläyer x"));
        assert_eq!(Directive::parse("ééééé"), Directive::Other("ééééé"));
    }

    #[test]
    fn test_midi_channel_range() {
        assert_eq!(MidiChannel::new(16).unwrap().number(), 16);
        assert_eq!(MidiChannel::new(0), Err(MusicError::InvalidChannel(0)));
        assert_eq!(MidiChannel::new(17), Err(MusicError::InvalidChannel(17)));
        assert_eq!(MidiChannel::default(), MidiChannel::CH1);
    }

    #[test]
    fn test_pitch_class_parse() {
        assert_eq!("E".parse::<PitchClass>().unwrap().semitone(), 4);
        assert_eq!("F#".parse::<PitchClass>().unwrap(), PitchClass::Gb);
        assert!("H".parse::<PitchClass>().is_err());
    }

    #[test]
    fn test_mode_intervals() {
        assert_eq!(Mode::Phrygian.intervals(), &[0, 1, 3, 5, 7, 8, 10]);
        assert_eq!(Mode::Major.intervals(), Mode::Ionian.intervals());
        assert_eq!(Mode::Custom(vec![0, 3, 7]).intervals(), &[0, 3, 7]);
        assert_eq!("Lydian-b7".parse::<Mode>().unwrap(), Mode::LydianB7);
    }

    #[test]
    fn test_std_loudness_range() {
        assert_eq!(StdLoudness::PPP.volume(), 40);
        assert_eq!(StdLoudness::FFF.volume(), 120);
    }
}
