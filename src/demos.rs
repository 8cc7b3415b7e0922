//! Built-in pieces for trying the performer without a score file.

use clap::ValueEnum;
use music_algebra::{
    chord, line, note, rest, Context, Dynamic, Music, Note1, PhraseAttribute, Pitch, Rational, StdLoudness, Tempo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// E phrygian scale in quarter notes
    Phrygian,
    /// E minor triad over a held bass
    Chord,
    /// Two-voice round: the scale against itself a fifth up, one beat late,
    /// with a crescendo and ritardando for the fancy player
    Canon,
}

fn quarter_notes(pitches: &[Pitch]) -> Music<Pitch> {
    line(pitches.iter().map(|p| note(Rational::new(1, 4), *p)))
}

/// One octave up the default context's key, E phrygian, from the E in octave 2
fn phrygian_up() -> Music<Pitch> {
    let ctx = Context::<Note1>::default();
    let pitches: Vec<Pitch> = (0..8)
        .filter_map(|degree| ctx.scale_degree_pitch(degree))
        .map(|pitch| pitch + 12 * 2)
        .collect();
    quarter_notes(&pitches)
}

impl Demo {
    pub fn music(self) -> Music<Pitch> {
        match self {
            Demo::Phrygian => phrygian_up(),
            Demo::Chord => chord(vec![
                note(Rational::ONE, 28),
                quarter_notes(&[40, 43, 47]).transpose(12),
                line(vec![rest(Rational::new(1, 2)), note(Rational::new(1, 2), 35)]),
            ]),
            Demo::Canon => {
                let follower = line(vec![rest(Rational::new(1, 4)), phrygian_up().transpose(7)]);
                phrygian_up().with(follower).phrase(vec![
                    PhraseAttribute::Dyn(Dynamic::StdLoudness(StdLoudness::MP)),
                    PhraseAttribute::Dyn(Dynamic::Crescendo(Rational::new(1, 2))),
                    PhraseAttribute::Tmp(Tempo::Ritardando(Rational::new(1, 4))),
                ])
            }
        }
    }
}
