use crate::context::Context;
use crate::control::{Control, Directive};
use crate::error::Result;
use crate::event::Performance;
use crate::music::{Music, Primitive};
use crate::player::PlayerMap;
use crate::rational::Rational;

enum Step<'m, A> {
    Visit(Context<A>, &'m Music<A>),
    /// The left side of a sequence is done; start the right side where it ends
    SeqRight(Context<A>, &'m Music<A>),
    SeqJoin,
    ParJoin,
}

/// Interpret `music` under `ctx`, returning its events and the absolute time
/// it occupies
///
/// Sequential parts are concatenated, the right side starting where the left
/// ends; parallel parts start from the same context and are merged by time.
/// Notes and phrases are delegated to the context's player.
///
/// The walk keeps its own work list, so a long [`crate::line`] costs heap,
/// not stack. Only phrase modifiers re-enter through the player, so stack
/// use grows with the nesting of phrases alone.
pub fn perf<A>(players: &dyn PlayerMap<A>, ctx: &Context<A>, music: &Music<A>) -> Result<(Performance, Rational)> {
    let mut work = vec![Step::Visit(ctx.clone(), music)];
    let mut results: Vec<(Performance, Rational)> = Vec::new();

    while let Some(step) = work.pop() {
        match step {
            Step::Visit(ctx, Music::Prim(Primitive::Note(delta, payload))) => {
                let events = ctx.player.play_note(&ctx, *delta, payload)?;
                results.push((events, delta.checked_mul(ctx.delta_scale)?));
            }
            Step::Visit(ctx, Music::Prim(Primitive::Rest(delta))) => {
                results.push((Vec::new(), delta.checked_mul(ctx.delta_scale)?));
            }
            Step::Visit(ctx, Music::Seq(left, right)) => {
                work.push(Step::SeqRight(ctx.clone(), right));
                work.push(Step::Visit(ctx, left));
            }
            Step::Visit(ctx, Music::Par(left, right)) => {
                work.push(Step::ParJoin);
                work.push(Step::Visit(ctx.clone(), right));
                work.push(Step::Visit(ctx, left));
            }
            Step::Visit(ctx, Music::Modify(control, music)) => {
                log::trace!("applying {:?} at {}", control, ctx.time);
                let inner = match control {
                    Control::Tempo(ratio) => ctx.tempo_scaled(*ratio)?,
                    Control::Transpose(interval) => ctx.transposed(*interval),
                    Control::Instrument(channel) => ctx.with_instrument(*channel),
                    Control::Key(pitch_class, mode) => ctx.with_key(*pitch_class, mode.clone()),
                    Control::Phrase(attributes) => {
                        results.push(ctx.player.interp_phrase(Some(players), &ctx, attributes, music)?);
                        continue;
                    }
                    Control::Custom(directive) => match Directive::parse(directive) {
                        Directive::Player(name) => {
                            let player = players.player(name);
                            log::debug!("switching player from {} to {}", ctx.player.name(), player.name());
                            ctx.with_player(player)
                        }
                        Directive::Other(text) => {
                            log::trace!("ignoring directive {:?}", text);
                            ctx
                        }
                    },
                };
                work.push(Step::Visit(inner, music));
            }
            Step::SeqRight(ctx, right) => {
                let (_, left_elapsed) = results.last().expect("perf: sequence without a left result");
                let start = ctx.advanced(*left_elapsed)?;
                work.push(Step::SeqJoin);
                work.push(Step::Visit(start, right));
            }
            Step::SeqJoin => {
                let ((mut events, left_elapsed), (right_events, right_elapsed)) = pop_pair(&mut results);
                events.extend(right_events);
                results.push((events, left_elapsed.checked_add(right_elapsed)?));
            }
            Step::ParJoin => {
                let ((left_events, left_elapsed), (right_events, right_elapsed)) = pop_pair(&mut results);
                results.push((merge(left_events, right_events), left_elapsed.max(right_elapsed)));
            }
        }
    }

    Ok(results.pop().expect("perf: no result for the root"))
}

fn pop_pair<B>(results: &mut Vec<B>) -> (B, B) {
    let right = results.pop().expect("perf: missing right result");
    let left = results.pop().expect("perf: missing left result");
    (left, right)
}

/// Perform `music` and keep only the events
pub fn perform<A>(players: &dyn PlayerMap<A>, ctx: &Context<A>, music: &Music<A>) -> Result<Performance> {
    perf(players, ctx, music).map(|(events, _)| events)
}

/// Stable merge of two time-ordered performances
///
/// A left event is taken only when it is strictly earlier than the right
/// one, so on equal times the right event comes first.
pub fn merge(left: Performance, right: Performance) -> Performance {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.time < r.time,
            _ => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }

    merged.extend(left);
    merged.extend(right);
    merged
}
