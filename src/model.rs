//! Data model for a parsed MusicXML score.
//!
//! These records are produced by the parser and are read-only to the layout
//! code. Enumerated MusicXML tokens are carried as enums; the parser rejects
//! tokens it does not recognize.

use serde::{Deserialize, Serialize};

/// Most staves a single part may declare.
pub const MAX_STAVES: i32 = 16;

/// A complete musical score parsed from MusicXML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Score {
    /// Title of the piece
    pub title: Option<String>,
    /// Composer name
    pub composer: Option<String>,
    /// MusicXML version (e.g., "3.1", "4.0")
    pub version: Option<String>,
    /// Musical parts (instruments)
    pub parts: Vec<Part>,
}

/// A musical part (one instrument or voice).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    /// Part identifier (e.g., "P1")
    pub id: String,
    /// Part name (e.g., "Piano")
    pub name: String,
    /// Ordered list of measures
    pub measures: Vec<Measure>,
}

/// A single measure (bar) of music.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measure {
    pub number: i32,
    /// Whether this is an implicit measure (e.g., pickup/anacrusis)
    pub implicit: bool,
    /// Attributes (key, time, clef), present only in measures where they change
    pub attributes: Option<Attributes>,
    /// Notes and rests in document order
    pub notes: Vec<Note>,
    /// Directions (words, pedal, wedges, ...) in document order
    pub directions: Vec<Direction>,
    pub barlines: Vec<Barline>,
}

/// Musical attributes that may change at the start of a measure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Divisions per quarter note (determines duration resolution)
    pub divisions: Option<i32>,
    pub key: Option<Key>,
    pub time: Option<TimeSignature>,
    /// One clef per staff, each tagged with its staff `number`.
    pub clefs: Vec<Clef>,
    /// Number of staves in this part (e.g. 2 for piano grand staff)
    pub staves: Option<i32>,
}

/// Key signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Number of sharps (positive) or flats (negative)
    pub fifths: i32,
    pub mode: Option<String>,
}

/// Time signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: i32,
    pub beat_type: i32,
}

/// Clef definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clef {
    /// Staff number this clef belongs to (1-based)
    pub number: i32,
    pub sign: ClefSign,
    /// Staff line the clef sits on (1 = bottom line)
    pub line: i32,
    pub octave_change: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClefSign {
    None,
    G,
    F,
    C,
    Percussion,
    Tab,
    Jianpu,
}

/// A single note or rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Note {
    /// Pitch (None for rests and unpitched notes)
    pub pitch: Option<Pitch>,
    pub rest: bool,
    /// Whole-measure rest
    pub measure_rest: bool,
    /// Shares its onset with the previous note
    pub chord: bool,
    pub grace: bool,
    /// Duration in divisions
    pub duration: i32,
    pub voice: Option<i32>,
    /// Staff number (1-based; for multi-staff parts like piano)
    pub staff: Option<i32>,
    /// Note type: "whole", "half", "quarter", "eighth", "16th", ...
    pub note_type: Option<String>,
    pub dots: u32,
    /// Accidental: "sharp", "flat", "natural", "double-sharp", "flat-flat", ...
    pub accidental: Option<String>,
    pub stem: Option<Stem>,
    pub beams: Vec<Beam>,
    pub notations: Notations,
    pub lyrics: Vec<Lyric>,
}

/// Diatonic step of a pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

/// Pitch of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    /// Octave number (middle C = C4)
    pub octave: i32,
    /// Chromatic alteration: -1.0 = flat, 1.0 = sharp
    pub alter: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stem {
    Up,
    Down,
    None,
    Double,
}

/// Beam grouping information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    /// Beam level (1 = eighth-note beam, 2 = sixteenth-note beam, etc.)
    pub number: i32,
    pub beam_type: BeamType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeamType {
    Begin,
    Continue,
    End,
    ForwardHook,
    BackwardHook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartStop {
    Start,
    Stop,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Over,
    Under,
}

/// Everything found under `<notations>` (plus note-level `<tie>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notations {
    pub ties: Vec<Tie>,
    pub slurs: Vec<Slur>,
    pub articulations: Vec<Articulation>,
    pub fermata: Option<Fermata>,
    pub ornaments: Vec<Ornament>,
}

impl Notations {
    pub fn is_empty(&self) -> bool {
        self.ties.is_empty()
            && self.slurs.is_empty()
            && self.articulations.is_empty()
            && self.fermata.is_none()
            && self.ornaments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tie {
    pub tie_type: StartStop,
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slur {
    /// Slur number, unique among the open slurs of a staff
    pub number: i32,
    pub slur_type: StartStop,
    pub placement: Option<Placement>,
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Articulation {
    pub articulation_type: ArticulationType,
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArticulationType {
    Accent,
    BreathMark,
    Caesura,
    DetachedLegato,
    Doit,
    Falloff,
    Plop,
    Scoop,
    Spiccato,
    Staccatissimo,
    Staccato,
    Stress,
    StrongAccent,
    Tenuto,
    Unstress,
}

impl ArticulationType {
    /// Map a MusicXML element name to an articulation type.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "accent" => Self::Accent,
            "breath-mark" => Self::BreathMark,
            "caesura" => Self::Caesura,
            "detached-legato" => Self::DetachedLegato,
            "doit" => Self::Doit,
            "falloff" => Self::Falloff,
            "plop" => Self::Plop,
            "scoop" => Self::Scoop,
            "spiccato" => Self::Spiccato,
            "staccatissimo" => Self::Staccatissimo,
            "staccato" => Self::Staccato,
            "stress" => Self::Stress,
            "strong-accent" => Self::StrongAccent,
            "tenuto" => Self::Tenuto,
            "unstress" => Self::Unstress,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fermata {
    pub inverted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ornament {
    pub ornament_type: OrnamentType,
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrnamentType {
    TrillMark,
    Mordent,
    InvertedMordent,
    Turn,
    InvertedTurn,
}

/// A lyric syllable attached to a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lyric {
    /// Verse number (1-based)
    pub number: i32,
    pub text: String,
    /// "single", "begin", "middle", "end"
    pub syllabic: Option<String>,
}

/// One direction-type entry of a `<direction>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub placement: Option<Placement>,
    pub staff: Option<i32>,
    /// Number of notes that precede this direction in the measure; the
    /// direction is positioned at the onset of the next note.
    pub note_index: usize,
    pub direction_type: DirectionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectionType {
    Words(String),
    Segno,
    Coda,
    Pedal(PedalType),
    OctaveShift { shift_type: OctaveShiftType, size: i32 },
    Wedge { wedge_type: WedgeType, number: i32, spread: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PedalType {
    Start,
    Stop,
    Change,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OctaveShiftType {
    Up,
    Down,
    Stop,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WedgeType {
    Crescendo,
    Diminuendo,
    Stop,
    Continue,
}

/// A barline, possibly carrying a volta bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barline {
    /// Location: "left", "right", "middle"
    pub location: String,
    /// Visual style: "regular", "light-light", "light-heavy", ...
    pub bar_style: Option<String>,
    pub ending: Option<Ending>,
}

/// A volta bracket (1st/2nd ending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    /// Ending number(s), e.g., "1", "2", "1, 2"
    pub number: String,
    /// "start", "stop", or "discontinue"
    pub ending_type: String,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of measures (taken from the first part).
    pub fn measure_count(&self) -> usize {
        self.parts.first().map_or(0, |p| p.measures.len())
    }
}

impl Part {
    /// Number of staves in this part, from `<staves>`, clef numbers and note
    /// staff numbers, capped at [`MAX_STAVES`].
    pub fn staves(&self) -> i32 {
        let mut max_staff = 1;
        for measure in &self.measures {
            if let Some(ref attrs) = measure.attributes {
                if let Some(s) = attrs.staves {
                    max_staff = max_staff.max(s);
                }
                for clef in &attrs.clefs {
                    max_staff = max_staff.max(clef.number);
                }
            }
            for note in &measure.notes {
                max_staff = max_staff.max(note.staff());
            }
        }
        max_staff.min(MAX_STAVES)
    }
}

impl Note {
    /// Staff number, defaulting to 1.
    pub fn staff(&self) -> i32 {
        self.staff.unwrap_or(1)
    }

    pub fn is_whole(&self) -> bool {
        self.note_type.as_deref() == Some("whole")
    }

    /// Number of flags the note type carries when not beamed.
    pub fn flag_count(&self) -> usize {
        self.note_type.as_deref().map_or(0, |nt| match nt {
            "eighth" => 1,
            "16th" => 2,
            "32nd" => 3,
            "64th" => 4,
            _ => 0,
        })
    }

    /// The type of the first beam, if the note is beamed.
    pub fn first_beam(&self) -> Option<BeamType> {
        self.beams.first().map(|b| b.beam_type)
    }
}

impl Step {
    /// Semitones above C.
    pub fn semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    /// Diatonic index above C (C = 0 ... B = 6).
    pub fn index(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 1,
            Step::E => 2,
            Step::F => 3,
            Step::G => 4,
            Step::A => 5,
            Step::B => 6,
        }
    }
}

impl Pitch {
    /// MIDI note number. Middle C (C4) = 60.
    pub fn value(&self) -> i32 {
        let alter = self.alter.unwrap_or(0.0).round() as i32;
        self.octave
            .saturating_add(1)
            .saturating_mul(12)
            .saturating_add(self.step.semitone())
            .saturating_add(alter)
    }

    /// Diatonic position counted in steps from C0.
    pub fn diatonic(&self) -> i32 {
        self.octave.saturating_mul(7).saturating_add(self.step.index())
    }
}

impl Key {
    /// Alteration the key signature applies to `step`.
    pub fn alter(&self, step: Step) -> i32 {
        const SHARP_ORDER: [Step; 7] = [Step::F, Step::C, Step::G, Step::D, Step::A, Step::E, Step::B];
        let count = self.fifths.unsigned_abs().min(7) as usize;
        if self.fifths > 0 {
            i32::from(SHARP_ORDER[..count].contains(&step))
        } else if self.fifths < 0 {
            -i32::from(SHARP_ORDER.iter().rev().take(count).any(|&s| s == step))
        } else {
            0
        }
    }
}
