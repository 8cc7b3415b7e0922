use crate::control::{Pitch, Volume};
use crate::music::Music;
use serde::{Deserialize, Serialize};

/// Per-note annotation read by a player's note handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoteAttribute {
    Volume(Volume),
    Fingering(i32),
    Dynamics(String),
    Params(Vec<f64>),
}

/// A pitch with its note attributes
pub type Note1 = (Pitch, Vec<NoteAttribute>);

pub type Music1 = Music<Note1>;

/// Attach a volume attribute to every note
pub fn to_music1(music: &Music<Pitch>, volume: Volume) -> Music1 {
    music.map(|p| (*p, vec![NoteAttribute::Volume(volume)]))
}

/// Pair every pitch with a volume
pub fn add_volume(music: &Music<Pitch>, volume: Volume) -> Music<(Pitch, Volume)> {
    music.map(|p| (*p, volume))
}
