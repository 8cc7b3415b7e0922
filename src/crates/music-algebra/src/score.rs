//! Serialized score form.
//!
//! A score mirrors [`Music`] variant for variant and adds `Line` and `Chord`,
//! which hold their parts as flat lists. A long melody written as a `Line`
//! stays shallow in JSON, where the same melody as nested `Seq` pairs is as
//! deep as it is long.

use crate::control::Control;
use crate::music::{chord, line, Music, Primitive};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Score<A> {
    Prim(Primitive<A>),
    Seq(Box<Score<A>>, Box<Score<A>>),
    Par(Box<Score<A>>, Box<Score<A>>),
    Modify(Control, Box<Score<A>>),
    /// Parts in sequence, as [`line`]
    Line(Vec<Score<A>>),
    /// Parts in parallel, as [`chord`]
    Chord(Vec<Score<A>>),
}

impl<A> Score<A> {
    /// Expand into a music tree
    ///
    /// Recursion follows the nesting of the score itself, which the
    /// deserializer already bounds.
    pub fn into_music(self) -> Music<A> {
        match self {
            Score::Prim(p) => Music::Prim(p),
            Score::Seq(l, r) => Music::seq(l.into_music(), r.into_music()),
            Score::Par(l, r) => Music::par(l.into_music(), r.into_music()),
            Score::Modify(c, m) => Music::modify(c, m.into_music()),
            Score::Line(parts) => line(parts.into_iter().map(Score::into_music)),
            Score::Chord(parts) => chord(parts.into_iter().map(Score::into_music)),
        }
    }
}

impl<A> From<Score<A>> for Music<A> {
    fn from(score: Score<A>) -> Self {
        score.into_music()
    }
}
