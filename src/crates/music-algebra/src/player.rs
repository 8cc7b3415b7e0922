//! Players: pluggable strategies that turn notes and phrases into events.
//!
//! The interpreter hands every note to the context's active [`Player`], and
//! hands every phrase modifier (with its whole subtree) to the same player.
//! Players are looked up by name through a [`PlayerMap`], which is how a
//! `player <name>` directive switches strategy mid-performance.

use crate::context::Context;
use crate::control::{Articulation, Dynamic, PhraseAttribute, Tempo, Volume};
use crate::error::Result;
use crate::event::{MEvent, Performance};
use crate::music::Music;
use crate::note::{Note1, NoteAttribute};
use crate::perform::perf;
use crate::rational::Rational;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type PlayerName = String;

pub trait Player<A>: Send + Sync {
    fn name(&self) -> &str;

    /// Produce the events for one note. `delta` is the note's unscaled delta;
    /// the player applies the context's time, pitch, duration and instrument.
    fn play_note(&self, ctx: &Context<A>, delta: Rational, payload: &A) -> Result<Performance>;

    /// Perform `music` under a list of phrase attributes, returning the
    /// events and the elapsed absolute time. Without a player map there is
    /// nothing to perform with, so the result is empty with zero elapsed time.
    fn interp_phrase(
        &self,
        players: Option<&dyn PlayerMap<A>>,
        ctx: &Context<A>,
        attributes: &[PhraseAttribute],
        music: &Music<A>,
    ) -> Result<(Performance, Rational)>;
}

/// Name to player lookup. Must always produce a player.
pub trait PlayerMap<A> {
    fn player(&self, name: &str) -> Arc<dyn Player<A>>;
}

impl<A, F> PlayerMap<A> for F
where
    F: Fn(&str) -> Arc<dyn Player<A>>,
{
    fn player(&self, name: &str) -> Arc<dyn Player<A>> {
        self(name)
    }
}

/// Adjusts a single event for one note attribute
pub type NoteHandler = fn(&Context<Note1>, &NoteAttribute, MEvent) -> MEvent;

/// Adjusts a whole phrase's events for one phrase attribute
pub type PhraseHandler = fn(&PhraseAttribute, Performance) -> Result<Performance>;

/// Volume and params attributes overwrite the event's fields
pub fn default_note_handler(_ctx: &Context<Note1>, attribute: &NoteAttribute, event: MEvent) -> MEvent {
    match attribute {
        NoteAttribute::Volume(volume) => MEvent {
            volume: *volume,
            ..event
        },
        NoteAttribute::Params(params) => MEvent {
            params: params.clone(),
            ..event
        },
        NoteAttribute::Fingering(_) | NoteAttribute::Dynamics(_) => event,
    }
}

/// Accent scales volume (truncating); staccato and legato scale duration
pub fn default_phrase_handler(attribute: &PhraseAttribute, performance: Performance) -> Result<Performance> {
    match attribute {
        PhraseAttribute::Dyn(Dynamic::Accent(x)) => performance
            .into_iter()
            .map(|e| {
                let volume = x.scale_int(e.volume as i64)?.to_f64() as Volume;
                Ok(MEvent { volume, ..e })
            })
            .collect(),
        PhraseAttribute::Art(Articulation::Staccato(x))
        | PhraseAttribute::Art(Articulation::Legato(x)) => scale_durations(performance, *x, |_| true),
        _ => Ok(performance),
    }
}

/// Build the single event for a note and run its attributes through
/// `handler`, last attribute first
pub fn play_note_with(handler: NoteHandler, ctx: &Context<Note1>, delta: Rational, note: &Note1) -> Result<Performance> {
    let (pitch, attributes) = note;
    let initial = MEvent {
        time: ctx.time,
        pitch: ctx.pitch + pitch,
        volume: ctx.volume,
        delta: ctx.delta_scale.checked_mul(delta)?,
        duration: ctx.dur_scale.checked_mul(delta)?,
        instrument: ctx.instrument,
        note_on: true,
        params: Vec::new(),
    };
    let event = attributes
        .iter()
        .rev()
        .fold(initial, |event, attribute| handler(ctx, attribute, event));
    Ok(vec![event])
}

fn scale_durations<P>(performance: Performance, factor: Rational, selected: P) -> Result<Performance>
where
    P: Fn(&MEvent) -> bool,
{
    performance
        .into_iter()
        .map(|e| {
            if selected(&e) {
                let duration = e.duration.checked_mul(factor)?;
                Ok(MEvent { duration, ..e })
            } else {
                Ok(e)
            }
        })
        .collect()
}

/// The stock player: one event per note, attribute handlers swappable
#[derive(Clone)]
pub struct DefaultPlayer {
    name: PlayerName,
    note_handler: NoteHandler,
    phrase_handler: PhraseHandler,
}

impl DefaultPlayer {
    pub const NAME: &'static str = "Default";

    pub fn new(name: impl Into<PlayerName>) -> Self {
        DefaultPlayer {
            name: name.into(),
            note_handler: default_note_handler,
            phrase_handler: default_phrase_handler,
        }
    }

    pub fn with_note_handler(mut self, handler: NoteHandler) -> Self {
        self.note_handler = handler;
        self
    }

    pub fn with_phrase_handler(mut self, handler: PhraseHandler) -> Self {
        self.phrase_handler = handler;
        self
    }

    /// Same handlers under another name
    pub fn renamed(&self, name: impl Into<PlayerName>) -> Self {
        DefaultPlayer {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Default for DefaultPlayer {
    fn default() -> Self {
        DefaultPlayer::new(Self::NAME)
    }
}

impl fmt::Debug for DefaultPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultPlayer").field("name", &self.name).finish()
    }
}

impl Player<Note1> for DefaultPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play_note(&self, ctx: &Context<Note1>, delta: Rational, note: &Note1) -> Result<Performance> {
        play_note_with(self.note_handler, ctx, delta, note)
    }

    fn interp_phrase(
        &self,
        players: Option<&dyn PlayerMap<Note1>>,
        ctx: &Context<Note1>,
        attributes: &[PhraseAttribute],
        music: &Music<Note1>,
    ) -> Result<(Performance, Rational)> {
        let Some(players) = players else {
            return Ok((Vec::new(), Rational::ZERO));
        };
        let (performance, elapsed) = perf(players, ctx, music)?;
        // Right fold: the last attribute is applied first
        let performance = attributes
            .iter()
            .rev()
            .try_fold(performance, |acc, attribute| (self.phrase_handler)(attribute, acc))?;
        Ok((performance, elapsed))
    }
}

/// Player that also understands loudness markings, crescendo, diminuendo,
/// ritardando, accelerando and slurs
#[derive(Debug, Clone)]
pub struct FancyPlayer {
    name: PlayerName,
}

impl FancyPlayer {
    pub const NAME: &'static str = "Fancy";
}

impl Default for FancyPlayer {
    fn default() -> Self {
        FancyPlayer {
            name: Self::NAME.to_string(),
        }
    }
}

impl Player<Note1> for FancyPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play_note(&self, ctx: &Context<Note1>, delta: Rational, note: &Note1) -> Result<Performance> {
        play_note_with(default_note_handler, ctx, delta, note)
    }

    fn interp_phrase(
        &self,
        players: Option<&dyn PlayerMap<Note1>>,
        ctx: &Context<Note1>,
        attributes: &[PhraseAttribute],
        music: &Music<Note1>,
    ) -> Result<(Performance, Rational)> {
        match players {
            Some(players) => fancy_phrase(players, ctx, attributes, music),
            None => Ok((Vec::new(), Rational::ZERO)),
        }
    }
}

/// Attributes are applied innermost-last: the first attribute transforms
/// the result of performing the rest.
fn fancy_phrase(
    players: &dyn PlayerMap<Note1>,
    ctx: &Context<Note1>,
    attributes: &[PhraseAttribute],
    music: &Music<Note1>,
) -> Result<(Performance, Rational)> {
    let Some((first, rest)) = attributes.split_first() else {
        return perf(players, ctx, music);
    };

    // Loudness sets the context volume, so it acts before anything is played
    match first {
        PhraseAttribute::Dyn(Dynamic::Loudness(volume)) => {
            return fancy_phrase(players, &ctx.with_volume(*volume), rest, music);
        }
        PhraseAttribute::Dyn(Dynamic::StdLoudness(marking)) => {
            return fancy_phrase(players, &ctx.with_volume(marking.volume()), rest, music);
        }
        _ => {}
    }

    let (performance, elapsed) = fancy_phrase(players, ctx, rest, music)?;
    let performance = match first {
        PhraseAttribute::Dyn(Dynamic::Accent(x)) => performance
            .into_iter()
            .map(|e| {
                let volume = round_to_volume(x.scale_int(e.volume as i64)?);
                Ok(MEvent { volume, ..e })
            })
            .collect::<Result<Performance>>()?,
        PhraseAttribute::Dyn(Dynamic::Crescendo(x)) => inflate(performance, elapsed, *x)?,
        PhraseAttribute::Dyn(Dynamic::Diminuendo(x)) => inflate(performance, elapsed, x.checked_neg()?)?,
        PhraseAttribute::Tmp(Tempo::Ritardando(x)) => return stretch(performance, elapsed, *x),
        PhraseAttribute::Tmp(Tempo::Accelerando(x)) => return stretch(performance, elapsed, x.checked_neg()?),
        PhraseAttribute::Art(Articulation::Staccato(x))
        | PhraseAttribute::Art(Articulation::Legato(x)) => scale_durations(performance, *x, |_| true)?,
        PhraseAttribute::Art(Articulation::Slurred(x)) => {
            let last_start = performance
                .iter()
                .map(|e| e.time)
                .fold(Rational::ZERO, Rational::max);
            scale_durations(performance, *x, |e| e.time < last_start)?
        }
        _ => performance,
    };
    Ok((performance, elapsed))
}

fn round_to_volume(value: Rational) -> Volume {
    value.to_f64().round() as Volume
}

/// Linear volume ramp: the phrase ends `amount` louder (or softer) than it
/// starts, relative to each event's own volume
fn inflate(performance: Performance, elapsed: Rational, amount: Rational) -> Result<Performance> {
    let Some(start) = performance.first().map(|e| e.time) else {
        return Ok(performance);
    };
    if elapsed.is_zero() {
        return Ok(performance);
    }
    let rate = amount.checked_div(elapsed)?;
    performance
        .into_iter()
        .map(|e| {
            let offset = e.time.checked_sub(start)?;
            let factor = Rational::ONE.checked_add(offset.checked_mul(rate)?)?;
            let volume = round_to_volume(factor.scale_int(e.volume as i64)?);
            Ok(MEvent { volume, ..e })
        })
        .collect()
}

/// Linear tempo change across the phrase; the phrase lasts `1 + amount`
/// times as long afterwards
fn stretch(performance: Performance, elapsed: Rational, amount: Rational) -> Result<(Performance, Rational)> {
    let stretched = Rational::ONE.checked_add(amount)?.checked_mul(elapsed)?;
    let Some(start) = performance.first().map(|e| e.time) else {
        return Ok((performance, stretched));
    };
    if elapsed.is_zero() {
        return Ok((performance, stretched));
    }
    let rate = amount.checked_div(elapsed)?;
    let two = Rational::from_int(2);
    let performance = performance
        .into_iter()
        .map(|e| {
            let offset = e.time.checked_sub(start)?;
            let time = Rational::ONE
                .checked_add(offset.checked_mul(rate)?)?
                .checked_mul(offset)?
                .checked_add(start)?;
            let growth = two.checked_mul(offset)?.checked_add(e.duration)?.checked_mul(rate)?;
            let duration = Rational::ONE.checked_add(growth)?.checked_mul(e.duration)?;
            Ok(MEvent { time, duration, ..e })
        })
        .collect::<Result<Performance>>()?;
    Ok((performance, stretched))
}

/// Players by name, with a fallback for names nobody registered
///
/// Registered by default: `"Default"` and `"Fancy"`. An unknown name yields
/// a copy of the default player carrying that name, so a performance never
/// stops for want of a player.
#[derive(Clone)]
pub struct PlayerRegistry {
    players: HashMap<PlayerName, Arc<dyn Player<Note1>>>,
    fallback: DefaultPlayer,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        PlayerRegistry {
            players: HashMap::new(),
            fallback: DefaultPlayer::default(),
        }
        .with_player(Arc::new(DefaultPlayer::default()))
        .with_player(Arc::new(FancyPlayer::default()))
    }

    /// Register a player under its own name, replacing any previous one
    pub fn with_player(mut self, player: Arc<dyn Player<Note1>>) -> Self {
        self.players.insert(player.name().to_string(), player);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.players.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerRegistry")
            .field("players", &self.names())
            .finish()
    }
}

impl PlayerMap<Note1> for PlayerRegistry {
    fn player(&self, name: &str) -> Arc<dyn Player<Note1>> {
        match self.players.get(name) {
            Some(player) => Arc::clone(player),
            None => {
                log::debug!("no player named {:?}, falling back to the default player", name);
                Arc::new(self.fallback.renamed(name))
            }
        }
    }
}
