use crate::control::{Control, MidiChannel, Mode, PhraseAttribute, Pitch, PitchClass};
use crate::error::Result;
use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::mem;

/// A leaf of the music tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive<A> {
    Note(Rational, A),
    Rest(Rational),
}

impl<A> Primitive<A> {
    /// Unscaled duration of this leaf
    pub fn delta(&self) -> Rational {
        match self {
            Primitive::Note(d, _) | Primitive::Rest(d) => *d,
        }
    }
}

/// Music as a tree of notes and rests combined sequentially or in
/// parallel, with control modifiers scoped over subtrees
///
/// Trees own their children and are never mutated once built; [`Music::map`]
/// builds a new tree. `Clone`, `PartialEq` and `Drop` work iteratively, so a
/// long [`line`] is safe to copy, compare and free. The derived `Debug` and
/// serde impls recurse once per level and are meant for shallow trees; load
/// long scores through [`crate::Score`].
#[derive(Debug, Serialize, Deserialize)]
pub enum Music<A> {
    Prim(Primitive<A>),
    /// Play the left side, then the right
    Seq(Box<Music<A>>, Box<Music<A>>),
    /// Play both sides starting at the same time
    Par(Box<Music<A>>, Box<Music<A>>),
    Modify(Control, Box<Music<A>>),
}

enum Frame<'m, A> {
    Visit(&'m Music<A>),
    Seq,
    Par,
    Modify(&'m Control),
}

impl<A> Music<A> {
    /// Zero-length rest, the identity for both [`line`] and [`chord`]
    pub fn unit() -> Self {
        Music::Prim(Primitive::Rest(Rational::ZERO))
    }

    pub fn seq(left: Music<A>, right: Music<A>) -> Self {
        Music::Seq(Box::new(left), Box::new(right))
    }

    pub fn par(left: Music<A>, right: Music<A>) -> Self {
        Music::Par(Box::new(left), Box::new(right))
    }

    pub fn modify(control: Control, music: Music<A>) -> Self {
        Music::Modify(control, Box::new(music))
    }

    /// Sequential composition: `self` followed by `next`
    pub fn then(self, next: Music<A>) -> Self {
        Music::seq(self, next)
    }

    /// Parallel composition: `self` together with `other`
    pub fn with(self, other: Music<A>) -> Self {
        Music::par(self, other)
    }

    pub fn tempo(self, ratio: Rational) -> Self {
        Music::modify(Control::Tempo(ratio), self)
    }

    pub fn transpose(self, interval: Pitch) -> Self {
        Music::modify(Control::Transpose(interval), self)
    }

    pub fn instrument(self, channel: MidiChannel) -> Self {
        Music::modify(Control::Instrument(channel), self)
    }

    pub fn key(self, pitch_class: PitchClass, mode: Mode) -> Self {
        Music::modify(Control::Key(pitch_class, mode), self)
    }

    pub fn phrase(self, attributes: Vec<PhraseAttribute>) -> Self {
        Music::modify(Control::Phrase(attributes), self)
    }

    pub fn custom(self, directive: impl Into<String>) -> Self {
        Music::modify(Control::Custom(directive.into()), self)
    }

    /// Structural fold with one handler per node kind
    ///
    /// Leaves are visited left to right. The traversal uses an explicit work
    /// list, so tree depth is bounded by heap rather than stack.
    pub fn fold<B, F, G, H, I>(&self, mut on_prim: F, mut on_seq: G, mut on_par: H, mut on_modify: I) -> B
    where
        F: FnMut(&Primitive<A>) -> B,
        G: FnMut(B, B) -> B,
        H: FnMut(B, B) -> B,
        I: FnMut(&Control, B) -> B,
    {
        let mut work = vec![Frame::Visit(self)];
        let mut results: Vec<B> = Vec::new();

        while let Some(frame) = work.pop() {
            match frame {
                Frame::Visit(Music::Prim(p)) => results.push(on_prim(p)),
                Frame::Visit(Music::Seq(l, r)) => {
                    work.push(Frame::Seq);
                    work.push(Frame::Visit(r));
                    work.push(Frame::Visit(l));
                }
                Frame::Visit(Music::Par(l, r)) => {
                    work.push(Frame::Par);
                    work.push(Frame::Visit(r));
                    work.push(Frame::Visit(l));
                }
                Frame::Visit(Music::Modify(c, m)) => {
                    work.push(Frame::Modify(c));
                    work.push(Frame::Visit(m));
                }
                Frame::Seq => {
                    let (l, r) = pop_pair(&mut results);
                    results.push(on_seq(l, r));
                }
                Frame::Par => {
                    let (l, r) = pop_pair(&mut results);
                    results.push(on_par(l, r));
                }
                Frame::Modify(c) => {
                    let inner = results.pop().expect("fold: modifier without a subtree result");
                    results.push(on_modify(c, inner));
                }
            }
        }

        results.pop().expect("fold: no result for the root")
    }

    /// Transform note payloads, keeping shape, rests and modifiers
    pub fn map<B, F>(&self, mut func: F) -> Music<B>
    where
        F: FnMut(&A) -> B,
    {
        self.fold(
            |p| match p {
                Primitive::Note(d, x) => Music::Prim(Primitive::Note(*d, func(x))),
                Primitive::Rest(d) => Music::Prim(Primitive::Rest(*d)),
            },
            Music::seq,
            Music::par,
            |c, m| Music::modify(c.clone(), m),
        )
    }

    /// Total unscaled duration
    ///
    /// Sequential parts add, parallel parts take the longer side, and a
    /// tempo modifier divides the duration beneath it by its ratio.
    pub fn delta(&self) -> Result<Rational> {
        self.fold(
            |p| Ok(p.delta()),
            |l: Result<Rational>, r| l?.checked_add(r?),
            |l: Result<Rational>, r| Ok(l?.max(r?)),
            |c, d| match c {
                Control::Tempo(ratio) => d?.checked_div(*ratio),
                _ => d,
            },
        )
    }

    fn detach_children(&mut self, out: &mut Vec<Music<A>>) {
        match self {
            Music::Seq(l, r) | Music::Par(l, r) => {
                out.push(mem::replace(l.as_mut(), Music::unit()));
                out.push(mem::replace(r.as_mut(), Music::unit()));
            }
            Music::Modify(_, m) => out.push(mem::replace(m.as_mut(), Music::unit())),
            Music::Prim(_) => {}
        }
    }
}

impl<A: Clone> Clone for Music<A> {
    fn clone(&self) -> Self {
        self.map(A::clone)
    }
}

impl<A: PartialEq> PartialEq for Music<A> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Music::Prim(a), Music::Prim(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Music::Seq(al, ar), Music::Seq(bl, br)) | (Music::Par(al, ar), Music::Par(bl, br)) => {
                    pending.push((ar.as_ref(), br.as_ref()));
                    pending.push((al.as_ref(), bl.as_ref()));
                }
                (Music::Modify(ac, am), Music::Modify(bc, bm)) => {
                    if ac != bc {
                        return false;
                    }
                    pending.push((am.as_ref(), bm.as_ref()));
                }
                _ => return false,
            }
        }
        true
    }
}

// Long lines nest as deeply as they are long; unlink iteratively.
impl<A> Drop for Music<A> {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut music) = pending.pop() {
            music.detach_children(&mut pending);
        }
    }
}

fn pop_pair<B>(results: &mut Vec<B>) -> (B, B) {
    let r = results.pop().expect("fold: missing right operand");
    let l = results.pop().expect("fold: missing left operand");
    (l, r)
}

pub fn note<A>(delta: Rational, payload: A) -> Music<A> {
    Music::Prim(Primitive::Note(delta, payload))
}

pub fn rest<A>(delta: Rational) -> Music<A> {
    Music::Prim(Primitive::Rest(delta))
}

/// Join in sequence, seeded with the zero-length rest
pub fn line<A>(musics: impl IntoIterator<Item = Music<A>>) -> Music<A> {
    musics.into_iter().fold(Music::unit(), Music::seq)
}

/// Join in parallel, seeded with the zero-length rest
pub fn chord<A>(musics: impl IntoIterator<Item = Music<A>>) -> Music<A> {
    musics.into_iter().fold(Music::unit(), Music::par)
}
