//! Algebra of music and its performance
//!
//! Music is built as a tree of notes and rests joined in sequence or in
//! parallel, with control modifiers (tempo, transposition, instrument, key,
//! phrasing, free-form directives) scoped over subtrees. The interpreter walks
//! the tree with a performance context and a player strategy and produces a
//! flat, time-ordered list of events. All timing uses exact fractions.
//!
//! # Examples
//!
//! ```
//! use music_algebra::{line, note, perform, to_music1, Context, PlayerRegistry, Rational};
//!
//! let scale = line([24, 25, 27, 29].map(|p| note(Rational::new(1, 4), p)));
//! let events = perform(&PlayerRegistry::new(), &Context::default(), &to_music1(&scale, 116)).unwrap();
//!
//! assert_eq!(events.len(), 4);
//! assert_eq!(events[1].time, Rational::new(1, 4));
//! ```
//!
//! # Main Components
//!
//! - **Rational**: exact fractions for every time value
//! - **Music**: the tree, with `fold`, `map`, `delta`, `line` and `chord`
//! - **Context**: the interpretation state threaded down the tree
//! - **Player**: note and phrase strategies, looked up through a `PlayerMap`
//! - **perf / perform / merge**: the interpreter and its ordered merge

pub mod context;
pub mod control;
pub mod error;
pub mod event;
pub mod music;
pub mod note;
pub mod perform;
pub mod player;
pub mod rational;
pub mod score;

#[cfg(test)]
mod perform_tests;

pub use context::Context;
pub use control::{
    Articulation, Control, Directive, Dynamic, MidiChannel, Mode, Ornament, PhraseAttribute, Pitch, PitchClass,
    StdLoudness, Tempo, Volume,
};
pub use error::{MusicError, Result};
pub use event::{render, BEvent, MEvent, Performance};
pub use music::{chord, line, note, rest, Music, Primitive};
pub use note::{add_volume, to_music1, Music1, Note1, NoteAttribute};
pub use perform::{merge, perf, perform};
pub use player::{
    default_note_handler, default_phrase_handler, DefaultPlayer, FancyPlayer, NoteHandler, PhraseHandler, Player,
    PlayerMap, PlayerName, PlayerRegistry,
};
pub use rational::{gcd, lcm, Rational};
pub use score::Score;
