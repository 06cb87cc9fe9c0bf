//! Reads partwise MusicXML text into the [`Score`](crate::Score) model.
//!
//! Enumerated tokens are validated here. An unknown clef sign, slur type,
//! placement, orientation, beam value, stem, pedal, octave-shift or wedge
//! type aborts parsing with [`Error::InvalidData`].

use std::ops::RangeInclusive;

use roxmltree::{Document, Node};

use crate::error::{Error, Result};
use crate::model::*;

/// Largest alteration accepted on a pitch, in semitones.
const MAX_ALTER: f64 = 3.0;

/// Parse a MusicXML XML string into a Score.
pub fn parse_musicxml(xml: &str) -> Result<Score> {
    // Scores usually carry a DOCTYPE.
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options).map_err(|e| Error::Xml(e.to_string()))?;
    let root = doc.root_element();

    if root.tag_name().name() != "score-partwise" {
        return Err(Error::UnsupportedFormat(format!(
            "root element '{}'; only 'score-partwise' is supported",
            root.tag_name().name()
        )));
    }

    let mut score = Score::new();
    score.version = root.attribute("version").map(String::from);

    for child in elements(&root) {
        match child.tag_name().name() {
            "work" => parse_work(&child, &mut score),
            "identification" => parse_identification(&child, &mut score),
            "part-list" => parse_part_list(&child, &mut score),
            "part" => parse_part(&child, &mut score)?,
            _ => {}
        }
    }

    Ok(score)
}

// header

fn parse_work(node: &Node, score: &mut Score) {
    for child in elements(&node) {
        if child.tag_name().name() == "work-title" {
            score.title = text_of(&child);
        }
    }
}

fn parse_identification(node: &Node, score: &mut Score) {
    for child in elements(&node) {
        if child.tag_name().name() == "creator" && child.attribute("type") == Some("composer") {
            score.composer = text_of(&child);
        }
    }
}

// part list

fn parse_part_list(node: &Node, score: &mut Score) {
    for child in elements(&node) {
        if child.tag_name().name() == "score-part" {
            let mut part = Part {
                id: child.attribute("id").unwrap_or("").to_string(),
                ..Part::default()
            };
            for sp_child in elements(&child) {
                if sp_child.tag_name().name() == "part-name" {
                    part.name = sp_child.text().unwrap_or("").trim().to_string();
                }
            }
            score.parts.push(part);
        }
    }
}

// parts

fn parse_part(node: &Node, score: &mut Score) -> Result<()> {
    let part_id = node.attribute("id").unwrap_or("");

    // Find the matching part from the part-list
    let part = match score.parts.iter_mut().find(|p| p.id == part_id) {
        Some(p) => p,
        None => {
            log::warn!("part '{part_id}' is not declared in the part-list; skipping");
            return Ok(());
        }
    };

    for child in elements(&node) {
        if child.tag_name().name() == "measure" {
            part.measures.push(parse_measure(&child)?);
        }
    }
    Ok(())
}

// measure

fn parse_measure(node: &Node) -> Result<Measure> {
    let mut measure = Measure {
        number: node
            .attribute("number")
            .and_then(|n| n.parse::<i32>().ok())
            .unwrap_or(0),
        implicit: node.attribute("implicit") == Some("yes"),
        ..Measure::default()
    };

    for child in elements(&node) {
        match child.tag_name().name() {
            "attributes" => measure.attributes = Some(parse_attributes(&child)?),
            "note" => measure.notes.push(parse_note(&child)?),
            "barline" => measure.barlines.push(parse_barline(&child)),
            "direction" => {
                let note_index = measure.notes.len();
                measure.directions.extend(parse_direction(&child, note_index)?);
            }
            _ => {}
        }
    }

    Ok(measure)
}

// attributes

fn parse_attributes(node: &Node) -> Result<Attributes> {
    let mut attrs = Attributes::default();

    for child in elements(&node) {
        match child.tag_name().name() {
            "divisions" => attrs.divisions = parse_i32(&child),
            "key" => attrs.key = Some(parse_key(&child)?),
            "time" => attrs.time = Some(parse_time(&child)),
            "staves" => attrs.staves = Some(staff_number("staves", &child)?),
            "clef" => attrs.clefs.push(parse_clef(&child)?),
            _ => {}
        }
    }

    Ok(attrs)
}

fn parse_key(node: &Node) -> Result<Key> {
    let mut key = Key::default();
    for child in elements(&node) {
        match child.tag_name().name() {
            "fifths" => key.fifths = bounded("fifths", child.text().unwrap_or("").trim(), -7..=7)?,
            "mode" => key.mode = text_of(&child),
            _ => {}
        }
    }
    Ok(key)
}

fn parse_time(node: &Node) -> TimeSignature {
    let mut ts = TimeSignature {
        beats: 4,
        beat_type: 4,
    };
    for child in elements(&node) {
        match child.tag_name().name() {
            "beats" => ts.beats = parse_i32(&child).unwrap_or(4),
            "beat-type" => ts.beat_type = parse_i32(&child).unwrap_or(4),
            _ => {}
        }
    }
    ts
}

fn parse_clef(node: &Node) -> Result<Clef> {
    let number = match node.attribute("number") {
        Some(raw) => bounded("clef number", raw, 1..=MAX_STAVES)?,
        None => 1,
    };
    let mut clef = Clef {
        number,
        sign: ClefSign::G,
        line: 2,
        octave_change: None,
    };
    for child in elements(&node) {
        match child.tag_name().name() {
            "sign" => clef.sign = clef_sign(child.text().unwrap_or("").trim())?,
            "line" => clef.line = bounded("clef line", child.text().unwrap_or("").trim(), 1..=5)?,
            "clef-octave-change" => {
                clef.octave_change = Some(bounded("clef octave change", child.text().unwrap_or("").trim(), -2..=2)?)
            }
            _ => {}
        }
    }
    Ok(clef)
}

// note

fn parse_note(node: &Node) -> Result<Note> {
    let mut note = Note::default();

    for child in elements(&node) {
        match child.tag_name().name() {
            "pitch" => note.pitch = Some(parse_pitch(&child)?),
            "duration" => note.duration = parse_i32(&child).unwrap_or(0),
            "voice" => note.voice = parse_i32(&child),
            "staff" => note.staff = Some(staff_number("staff", &child)?),
            "type" => note.note_type = text_of(&child),
            "stem" => note.stem = Some(stem(child.text().unwrap_or("").trim())?),
            "beam" => {
                let number = child
                    .attribute("number")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1);
                let beam_type = beam_type(child.text().unwrap_or("").trim())?;
                note.beams.push(Beam { number, beam_type });
            }
            "rest" => {
                note.rest = true;
                note.measure_rest = child.attribute("measure") == Some("yes");
            }
            "grace" => note.grace = true,
            "chord" => note.chord = true,
            "dot" => note.dots += 1,
            "accidental" => note.accidental = text_of(&child),
            "tie" => {
                let tie = Tie {
                    tie_type: start_stop("tie type", child.attribute("type").unwrap_or(""))?,
                    placement: None,
                };
                push_tie(&mut note.notations, tie);
            }
            "notations" => parse_notations(&child, &mut note.notations)?,
            "lyric" => {
                if let Some(lyric) = parse_lyric(&child) {
                    note.lyrics.push(lyric);
                }
            }
            _ => {}
        }
    }

    Ok(note)
}

fn parse_pitch(node: &Node) -> Result<Pitch> {
    let mut pitch = Pitch {
        step: Step::C,
        octave: 4,
        alter: None,
    };
    for child in elements(&node) {
        match child.tag_name().name() {
            "step" => pitch.step = step(child.text().unwrap_or("").trim())?,
            "octave" => pitch.octave = bounded("octave", child.text().unwrap_or("").trim(), 0..=9)?,
            "alter" => {
                pitch.alter = match parse_f64(&child) {
                    Some(alter) if !(-MAX_ALTER..=MAX_ALTER).contains(&alter) => {
                        return Err(Error::invalid("alter", &alter.to_string()))
                    }
                    alter => alter,
                }
            }
            _ => {}
        }
    }
    Ok(pitch)
}

fn parse_notations(node: &Node, notations: &mut Notations) -> Result<()> {
    for nc in elements(&node) {
        match nc.tag_name().name() {
            "tied" => {
                let tie = Tie {
                    tie_type: start_stop("tie type", nc.attribute("type").unwrap_or(""))?,
                    placement: optional_placement(&nc)?,
                };
                push_tie(notations, tie);
            }
            "slur" => notations.slurs.push(Slur {
                number: nc.attribute("number").and_then(|n| n.parse().ok()).unwrap_or(1),
                slur_type: start_stop("slur type", nc.attribute("type").unwrap_or(""))?,
                placement: optional_placement(&nc)?,
                orientation: nc.attribute("orientation").map(orientation).transpose()?,
            }),
            "articulations" => {
                for ac in elements(&nc) {
                    if let Some(articulation_type) = ArticulationType::from_tag(ac.tag_name().name()) {
                        notations.articulations.push(Articulation {
                            articulation_type,
                            placement: optional_placement(&ac)?,
                        });
                    }
                }
            }
            "fermata" => {
                notations.fermata = Some(Fermata {
                    inverted: nc.attribute("type") == Some("inverted"),
                });
            }
            "ornaments" => {
                for oc in elements(&nc) {
                    let ornament_type = match oc.tag_name().name() {
                        "trill-mark" => OrnamentType::TrillMark,
                        "mordent" => OrnamentType::Mordent,
                        "inverted-mordent" => OrnamentType::InvertedMordent,
                        "turn" => OrnamentType::Turn,
                        "inverted-turn" => OrnamentType::InvertedTurn,
                        _ => continue,
                    };
                    notations.ornaments.push(Ornament {
                        ornament_type,
                        placement: optional_placement(&oc)?,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// `<tie>` and `<tied>` usually come in pairs; keep one entry per type,
/// preferring the one that carries a placement.
fn push_tie(notations: &mut Notations, tie: Tie) {
    match notations.ties.iter_mut().find(|t| t.tie_type == tie.tie_type) {
        Some(existing) => {
            if existing.placement.is_none() {
                existing.placement = tie.placement;
            }
        }
        None => notations.ties.push(tie),
    }
}

fn parse_lyric(node: &Node) -> Option<Lyric> {
    let number = node
        .attribute("number")
        .and_then(|n| n.parse().ok())
        .unwrap_or(1);
    let mut text = String::new();
    let mut syllabic = None;
    for lc in elements(&node) {
        match lc.tag_name().name() {
            "text" => text = lc.text().unwrap_or("").trim().to_string(),
            "syllabic" => syllabic = text_of(&lc),
            _ => {}
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(Lyric { number, text, syllabic })
    }
}

// barline

fn parse_barline(node: &Node) -> Barline {
    let mut barline = Barline {
        location: node.attribute("location").unwrap_or("right").to_string(),
        bar_style: None,
        ending: None,
    };

    for child in elements(&node) {
        match child.tag_name().name() {
            "bar-style" => barline.bar_style = text_of(&child),
            "ending" => {
                barline.ending = Some(Ending {
                    number: child.attribute("number").unwrap_or("1").to_string(),
                    ending_type: child.attribute("type").unwrap_or("start").to_string(),
                });
            }
            _ => {}
        }
    }

    barline
}

// direction

fn parse_direction(node: &Node, note_index: usize) -> Result<Vec<Direction>> {
    let placement = optional_placement(node)?;
    let staff = elements(&node)
        .find(|n| n.tag_name().name() == "staff")
        .map(|n| staff_number("staff", &n))
        .transpose()?;

    let mut directions = Vec::new();
    for child in elements(&node) {
        if child.tag_name().name() != "direction-type" {
            continue;
        }
        for dt in elements(&child) {
            let direction_type = match dt.tag_name().name() {
                "words" => match text_of(&dt) {
                    Some(text) if !text.is_empty() => DirectionType::Words(text),
                    _ => continue,
                },
                "segno" => DirectionType::Segno,
                "coda" => DirectionType::Coda,
                "pedal" => DirectionType::Pedal(pedal_type(dt.attribute("type").unwrap_or(""))?),
                "octave-shift" => DirectionType::OctaveShift {
                    shift_type: octave_shift_type(dt.attribute("type").unwrap_or(""))?,
                    size: dt.attribute("size").and_then(|s| s.parse().ok()).unwrap_or(8),
                },
                "wedge" => DirectionType::Wedge {
                    wedge_type: wedge_type(dt.attribute("type").unwrap_or(""))?,
                    number: dt.attribute("number").and_then(|s| s.parse().ok()).unwrap_or(1),
                    spread: dt.attribute("spread").and_then(|s| s.parse().ok()).unwrap_or(15.0),
                },
                _ => continue,
            };
            directions.push(Direction {
                placement,
                staff,
                note_index,
                direction_type,
            });
        }
    }

    Ok(directions)
}

// enumerated tokens

fn clef_sign(s: &str) -> Result<ClefSign> {
    Ok(match s {
        "none" => ClefSign::None,
        "G" => ClefSign::G,
        "F" => ClefSign::F,
        "C" => ClefSign::C,
        "percussion" => ClefSign::Percussion,
        "TAB" | "tab" => ClefSign::Tab,
        "jianpu" => ClefSign::Jianpu,
        _ => return Err(Error::invalid("clef sign", s)),
    })
}

fn step(s: &str) -> Result<Step> {
    Ok(match s {
        "C" => Step::C,
        "D" => Step::D,
        "E" => Step::E,
        "F" => Step::F,
        "G" => Step::G,
        "A" => Step::A,
        "B" => Step::B,
        _ => return Err(Error::invalid("pitch step", s)),
    })
}

fn start_stop(what: &str, s: &str) -> Result<StartStop> {
    Ok(match s {
        "start" => StartStop::Start,
        "stop" => StartStop::Stop,
        "continue" => StartStop::Continue,
        _ => return Err(Error::invalid(what, s)),
    })
}

fn placement(s: &str) -> Result<Placement> {
    Ok(match s {
        "above" => Placement::Above,
        "below" => Placement::Below,
        _ => return Err(Error::invalid("placement", s)),
    })
}

fn optional_placement(node: &Node) -> Result<Option<Placement>> {
    node.attribute("placement").map(placement).transpose()
}

fn orientation(s: &str) -> Result<Orientation> {
    Ok(match s {
        "over" => Orientation::Over,
        "under" => Orientation::Under,
        _ => return Err(Error::invalid("slur orientation", s)),
    })
}

fn stem(s: &str) -> Result<Stem> {
    Ok(match s {
        "up" => Stem::Up,
        "down" => Stem::Down,
        "none" => Stem::None,
        "double" => Stem::Double,
        _ => return Err(Error::invalid("stem", s)),
    })
}

fn beam_type(s: &str) -> Result<BeamType> {
    Ok(match s {
        "begin" => BeamType::Begin,
        "continue" => BeamType::Continue,
        "end" => BeamType::End,
        "forward hook" => BeamType::ForwardHook,
        "backward hook" => BeamType::BackwardHook,
        _ => return Err(Error::invalid("beam type", s)),
    })
}

fn pedal_type(s: &str) -> Result<PedalType> {
    Ok(match s {
        "start" => PedalType::Start,
        "stop" => PedalType::Stop,
        "change" => PedalType::Change,
        "continue" => PedalType::Continue,
        _ => return Err(Error::invalid("pedal type", s)),
    })
}

fn octave_shift_type(s: &str) -> Result<OctaveShiftType> {
    Ok(match s {
        "up" => OctaveShiftType::Up,
        "down" => OctaveShiftType::Down,
        "stop" => OctaveShiftType::Stop,
        "continue" => OctaveShiftType::Continue,
        _ => return Err(Error::invalid("octave shift type", s)),
    })
}

fn wedge_type(s: &str) -> Result<WedgeType> {
    Ok(match s {
        "crescendo" => WedgeType::Crescendo,
        "diminuendo" => WedgeType::Diminuendo,
        "stop" => WedgeType::Stop,
        "continue" => WedgeType::Continue,
        _ => return Err(Error::invalid("wedge type", s)),
    })
}

// helpers

/// Element children of `node`, skipping text and comments.
fn elements<'a, 'input>(node: &Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn text_of(node: &Node) -> Option<String> {
    node.text().map(|t| t.trim().to_string())
}

/// Parses an integer token and rejects values outside `range`.
fn bounded(what: &str, raw: &str, range: RangeInclusive<i32>) -> Result<i32> {
    match raw.parse::<i32>() {
        Ok(value) if range.contains(&value) => Ok(value),
        _ => Err(Error::invalid(what, raw)),
    }
}

fn staff_number(what: &str, node: &Node) -> Result<i32> {
    bounded(what, node.text().unwrap_or("").trim(), 1..=MAX_STAVES)
}

fn parse_i32(node: &Node) -> Option<i32> {
    node.text()?.trim().parse().ok()
}

fn parse_f64(node: &Node) -> Option<f64> {
    node.text()?.trim().parse().ok()
}
