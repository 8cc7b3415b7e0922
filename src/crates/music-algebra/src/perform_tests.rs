//! Interpreter scenarios: whole trees performed under the default context.

use crate::control::{Articulation, Dynamic, MidiChannel, Mode, PhraseAttribute, Pitch, PitchClass};
use crate::error::{MusicError, Result};
use crate::event::{render, MEvent, Performance};
use crate::music::{chord, line, note, rest, Music};
use crate::note::{to_music1, Music1, Note1, NoteAttribute};
use crate::perform::{perf, perform};
use crate::player::{default_note_handler, default_phrase_handler, DefaultPlayer, PlayerMap, PlayerRegistry};
use crate::rational::Rational;
use crate::Context;
use proptest::prelude::*;
use std::sync::Arc;

fn n(delta: Rational, pitch: Pitch) -> Music1 {
    note(delta, (pitch, Vec::new()))
}

fn qn(pitch: Pitch) -> Music1 {
    n(Rational::new(1, 4), pitch)
}

fn run_with(ctx: &Context<Note1>, music: &Music1) -> Result<(Performance, Rational)> {
    let registry = PlayerRegistry::new();
    let players: &dyn PlayerMap<Note1> = &registry;
    perf(players, ctx, music)
}

fn run(music: &Music1) -> Result<(Performance, Rational)> {
    run_with(&Context::default(), music)
}

fn times(perf: &Performance) -> Vec<Rational> {
    perf.iter().map(|e| e.time).collect()
}

fn pitches(perf: &Performance) -> Vec<Pitch> {
    perf.iter().map(|e| e.pitch).collect()
}

#[test]
fn test_line_of_two_quarter_notes() {
    let (events, elapsed) = run(&line(vec![qn(24), qn(25)])).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(pitches(&events), vec![24, 25]);
    assert_eq!(times(&events), vec![Rational::ZERO, Rational::new(1, 4)]);
    for e in &events {
        assert_eq!(e.delta, Rational::new(1, 4));
        assert_eq!(e.duration, Rational::new(1, 8));
        assert_eq!(e.volume, 127);
        assert_eq!(e.instrument, MidiChannel::CH1);
    }
    assert_eq!(elapsed, Rational::new(1, 2));
}

#[test]
fn test_long_line_performs() {
    let (events, elapsed) = run(&line((0..100_000).map(|i| qn(i % 128)))).unwrap();

    assert_eq!(events.len(), 100_000);
    assert_eq!(elapsed, Rational::from_int(25_000));
    assert_eq!(events[99_999].time, Rational::new(99_999, 4));
    assert_eq!(events[99_999].pitch, 99_999 % 128);
}

#[test]
fn test_long_line_inside_phrase() {
    let accent = PhraseAttribute::Dyn(Dynamic::Accent(Rational::new(1, 2)));
    let music = line((0..100_000).map(|_| qn(60))).phrase(vec![accent]);
    let (events, elapsed) = run(&music).unwrap();

    assert_eq!(events.len(), 100_000);
    assert_eq!(elapsed, Rational::from_int(25_000));
    assert!(events.iter().all(|e| e.volume == 63));
}

#[test]
fn test_chord_starts_together() {
    let (events, elapsed) = run(&chord(vec![qn(24), n(Rational::new(1, 2), 27)])).unwrap();

    assert_eq!(times(&events), vec![Rational::ZERO, Rational::ZERO]);
    // Equal onsets: the later chord member is merged in first
    assert_eq!(pitches(&events), vec![27, 24]);
    assert_eq!(events[0].duration, Rational::new(1, 4));
    assert_eq!(events[1].duration, Rational::new(1, 8));
    assert_eq!(elapsed, Rational::new(1, 2));
}

#[test]
fn test_empty_line_and_chord() {
    for music in [line(Vec::<Music1>::new()), chord(Vec::<Music1>::new())] {
        let (events, elapsed) = run(&music).unwrap();
        assert!(events.is_empty());
        assert!(elapsed.is_zero());
    }
}

#[test]
fn test_sequential_right_starts_after_left() {
    let left = chord(vec![qn(60), n(Rational::new(3, 8), 64)]);
    let right = line(vec![qn(67), qn(72)]);
    let (left_events, left_elapsed) = run(&left).unwrap();
    let (events, elapsed) = run(&left.clone().then(right.clone())).unwrap();

    let split = left_events.len();
    assert_eq!(&events[..split], &left_events[..]);
    assert_eq!(pitches(&events[split..].to_vec()), vec![67, 72]);
    assert!(events[split..].iter().all(|e| e.time >= left_elapsed));
    assert_eq!(elapsed, left_elapsed + right.delta().unwrap());
}

#[test]
fn test_rest_only_advances_time() {
    let (events, elapsed) = run(&line(vec![rest(Rational::new(1, 2)), qn(60)])).unwrap();
    assert_eq!(times(&events), vec![Rational::new(1, 2)]);
    assert_eq!(elapsed, Rational::new(3, 4));
}

#[test]
fn test_tempo_nesting_is_multiplicative() {
    let music = line(vec![qn(60), qn(62)]);
    let nested = music.clone().tempo(Rational::from_int(3)).tempo(Rational::from_int(2));
    let (plain, plain_elapsed) = run(&music).unwrap();
    let (fast, fast_elapsed) = run(&nested).unwrap();

    let sixth = Rational::new(1, 6);
    assert_eq!(fast_elapsed, plain_elapsed * sixth);
    for (p, f) in plain.iter().zip(&fast) {
        assert_eq!(f.time, p.time * sixth);
        assert_eq!(f.delta, p.delta * sixth);
        assert_eq!(f.duration, p.duration * sixth);
    }
}

#[test]
fn test_transposition_is_additive() {
    let music = line(vec![qn(60), chord(vec![qn(64), qn(67)])]);
    let twice = music.clone().transpose(5).transpose(-2);
    let once = music.transpose(3);
    assert_eq!(run(&twice).unwrap(), run(&once).unwrap());
    assert_eq!(pitches(&run(&once).unwrap().0), vec![63, 70, 67]);
}

#[test]
fn test_instrument_and_key_are_scoped() {
    let music = line(vec![
        qn(60).instrument(MidiChannel::CH2).key(PitchClass::C, Mode::Major),
        qn(62),
    ]);
    let (events, _) = run(&music).unwrap();
    assert_eq!(events[0].instrument, MidiChannel::CH2);
    assert_eq!(events[1].instrument, MidiChannel::CH1);
}

#[test]
fn test_context_offsets_apply() {
    let ctx = Context::<Note1>::default()
        .with_time(Rational::ONE)
        .with_delta_scale(Rational::new(1, 2))
        .transposed(12);
    let (events, elapsed) = run_with(&ctx, &line(vec![qn(48), qn(50)])).unwrap();
    assert_eq!(times(&events), vec![Rational::ONE, Rational::new(9, 8)]);
    assert_eq!(pitches(&events), vec![60, 62]);
    assert_eq!(elapsed, Rational::new(1, 4));
}

#[test]
fn test_phrase_with_default_player() {
    let phrase = vec![
        PhraseAttribute::Dyn(Dynamic::Accent(Rational::new(1, 2))),
        PhraseAttribute::Art(Articulation::Staccato(Rational::new(1, 2))),
    ];
    let (events, elapsed) = run(&line(vec![qn(60), qn(62)]).phrase(phrase)).unwrap();
    assert!(events.iter().all(|e| e.volume == 63));
    assert!(events.iter().all(|e| e.duration == Rational::new(1, 16)));
    assert_eq!(elapsed, Rational::new(1, 2));
}

#[test]
fn test_player_directive_switches_player() {
    let crescendo = vec![PhraseAttribute::Dyn(Dynamic::Crescendo(Rational::new(1, 2)))];
    let phrase = line(vec![qn(60), qn(62)]).phrase(crescendo);

    // The default player ignores crescendo
    let (plain, _) = run(&phrase).unwrap();
    assert!(plain.iter().all(|e| e.volume == 127));

    for directive in ["player Fancy", "PLAYER Fancy", "Player Fancy"] {
        let (fancy, _) = run(&phrase.clone().custom(directive)).unwrap();
        assert_eq!(fancy[0].volume, 127);
        assert_eq!(fancy[1].volume, 159);
    }
}

fn fingering_lifts_octave(ctx: &Context<Note1>, attribute: &NoteAttribute, event: MEvent) -> MEvent {
    match attribute {
        NoteAttribute::Fingering(_) => MEvent {
            pitch: event.pitch + 12,
            ..event
        },
        _ => default_note_handler(ctx, attribute, event),
    }
}

fn accent_mutes(attribute: &PhraseAttribute, performance: Performance) -> Result<Performance> {
    match attribute {
        PhraseAttribute::Dyn(Dynamic::Accent(_)) => Ok(performance.into_iter().map(|e| MEvent { volume: 0, ..e }).collect()),
        _ => default_phrase_handler(attribute, performance),
    }
}

#[test]
fn test_custom_handlers_through_player_directive() {
    let muted = DefaultPlayer::new("Muted")
        .with_note_handler(fingering_lifts_octave)
        .with_phrase_handler(accent_mutes);
    let registry = PlayerRegistry::new().with_player(Arc::new(muted));
    let players: &dyn PlayerMap<Note1> = &registry;

    let fingered = note(Rational::new(1, 4), (60, vec![NoteAttribute::Fingering(2)]));
    let music = line(vec![fingered, qn(62)]).phrase(vec![PhraseAttribute::Dyn(Dynamic::Accent(Rational::new(3, 2)))]);

    let (stock, _) = perf(players, &Context::default(), &music).unwrap();
    assert_eq!(pitches(&stock), vec![60, 62]);
    assert!(stock.iter().all(|e| e.volume == 190));

    let switched = music.custom("player Muted");
    let (custom, elapsed) = perf(players, &Context::default(), &switched).unwrap();
    assert_eq!(pitches(&custom), vec![72, 62]);
    assert!(custom.iter().all(|e| e.volume == 0));
    assert_eq!(elapsed, Rational::new(1, 2));
}

#[test]
fn test_unknown_player_and_directive_are_harmless() {
    let music = line(vec![qn(60), qn(62)]);
    let baseline = run(&music).unwrap();

    assert_eq!(run(&music.clone().custom("player Nobody")).unwrap(), baseline);
    assert_eq!(run(&music.clone().custom("swing 2/3")).unwrap(), baseline);
    assert_eq!(run(&music.clone().custom("")).unwrap(), baseline);
    assert_eq!(run(&music.custom("player")).unwrap(), baseline);
}

#[test]
fn test_zero_tempo_fails() {
    let err = run(&qn(60).tempo(Rational::ZERO)).unwrap_err();
    assert!(matches!(err, MusicError::DivisionByZero { .. }));
}

#[test]
fn test_perform_and_render() {
    let scale: Music<Pitch> = line([24, 25, 27, 29, 31, 32, 34, 36].map(|p| note(Rational::new(1, 4), p)));
    let music = to_music1(&scale, 116);
    let registry = PlayerRegistry::new();
    let events = perform(&registry as &dyn PlayerMap<Note1>, &Context::default(), &music).unwrap();
    let rendered = render(&events);

    assert_eq!(rendered.len(), 8);
    assert!(rendered.iter().all(|e| e.volume == 116));
    let onsets: Vec<f64> = rendered.iter().map(|e| e.time).collect();
    assert_eq!(onsets, vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75]);
    assert!(rendered.iter().all(|e| e.duration == 0.125));
}

#[test]
fn test_score_from_json() {
    let json = r#"{"Seq":[
        {"Prim":{"Note":[{"numerator":1,"denominator":4},60]}},
        {"Modify":[{"Transpose":7},{"Prim":{"Note":[{"numerator":1,"denominator":4},60]}}]}
    ]}"#;
    let score: Music<Pitch> = serde_json::from_str(json).unwrap();
    let (events, _) = run(&to_music1(&score, 100)).unwrap();
    assert_eq!(pitches(&events), vec![60, 67]);
}

fn arb_music() -> impl Strategy<Value = Music1> {
    let delta = (0i64..8, 1i64..8).prop_map(|(n, d)| Rational::new(n, d));
    let leaf = prop_oneof![
        (delta.clone(), 0i32..128).prop_map(|(d, p)| n(d, p)),
        delta.prop_map(rest::<Note1>),
    ];
    leaf.prop_recursive(6, 64, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Music::seq(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Music::par(l, r)),
            (inner.clone(), 1i64..4, 1i64..4).prop_map(|(m, n, d)| m.tempo(Rational::new(n, d))),
            (inner, -12i32..12).prop_map(|(m, p)| m.transpose(p)),
        ]
    })
}

fn note_count(music: &Music1) -> usize {
    music.fold(
        |p| usize::from(matches!(p, crate::music::Primitive::Note(..))),
        |l, r| l + r,
        |l, r| l + r,
        |_, c| c,
    )
}

proptest! {
    #[test]
    fn prop_performance_is_time_ordered(music in arb_music()) {
        let (events, elapsed) = run(&music).unwrap();
        prop_assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        prop_assert_eq!(elapsed, music.delta().unwrap());
        prop_assert_eq!(events.len(), note_count(&music));
    }
}
