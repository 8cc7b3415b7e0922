use crate::control::{MidiChannel, Pitch, Volume};
use crate::rational::Rational;
use serde::{Deserialize, Serialize};

/// One performed note with exact timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MEvent {
    /// Onset in absolute time
    pub time: Rational,
    pub pitch: Pitch,
    pub volume: Volume,
    /// Scaled delta of the note that produced this event
    pub delta: Rational,
    /// Sounding duration, the delta scaled by the context's duration factor
    pub duration: Rational,
    pub instrument: MidiChannel,
    pub note_on: bool,
    /// Extra numeric parameters attached through note attributes
    pub params: Vec<f64>,
}

impl MEvent {
    /// Float projection for playback
    pub fn rendered(&self) -> BEvent {
        BEvent {
            time: self.time.to_f64(),
            pitch: self.pitch,
            volume: self.volume,
            delta: self.delta.to_f64(),
            duration: self.duration.to_f64(),
            instrument: self.instrument.number(),
            note_on: self.note_on,
            params: self.params.clone(),
        }
    }
}

impl Default for MEvent {
    fn default() -> Self {
        MEvent {
            time: Rational::ZERO,
            pitch: 24,
            volume: 100,
            delta: Rational::new(1, 8),
            duration: Rational::new(1, 8),
            instrument: MidiChannel::CH1,
            note_on: true,
            params: Vec::new(),
        }
    }
}

/// Ordered events; onsets never decrease once parallel parts are merged
pub type Performance = Vec<MEvent>;

/// [`MEvent`] with timing converted to floats, one-way and lossy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BEvent {
    pub time: f64,
    pub pitch: Pitch,
    pub volume: Volume,
    pub delta: f64,
    pub duration: f64,
    pub instrument: u8,
    pub note_on: bool,
    pub params: Vec<f64>,
}

pub fn render(performance: &[MEvent]) -> Vec<BEvent> {
    performance.iter().map(MEvent::rendered).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_converts_timing() {
        let event = MEvent {
            time: Rational::new(3, 8),
            duration: Rational::new(1, 3),
            instrument: MidiChannel::CH3,
            params: vec![0.5],
            ..MEvent::default()
        };
        let rendered = event.rendered();
        assert_eq!(rendered.time, 0.375);
        assert_eq!(rendered.delta, 0.125);
        assert!((rendered.duration - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(rendered.instrument, 3);
        assert_eq!(rendered.pitch, 24);
        assert_eq!(rendered.params, vec![0.5]);
    }

    #[test]
    fn test_render_keeps_order() {
        let perf = vec![
            MEvent { pitch: 60, ..MEvent::default() },
            MEvent { pitch: 62, time: Rational::new(1, 4), ..MEvent::default() },
        ];
        let pitches: Vec<Pitch> = render(&perf).iter().map(|e| e.pitch).collect();
        assert_eq!(pitches, vec![60, 62]);
    }
}
