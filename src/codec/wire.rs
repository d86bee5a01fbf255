use std::collections::HashSet;

use serde::Deserialize;

use super::packet::{
    ActionReading, AudioReading, ClassProb, Envelope, LocationReading, SensorPacket, VisionReading,
};
use crate::error::DecodeError;

const MAX_AUDIO_CLASSES: usize = 3;

// Raw wire shapes. Field names follow the producer's JSON exactly;
// unknown fields (e.g. `gru.action`) are ignored.

#[derive(Deserialize)]
struct WirePacket {
    vision: WireVision,
    audio: WireAudio,
    location: WireLocation,
    gru: WireGru,
}

#[derive(Deserialize)]
struct WireVision {
    label: String,
    conf: f64,
    #[serde(default)]
    matrix: Option<Vec<Vec<f64>>>,
}

#[derive(Deserialize)]
struct WireAudio {
    top3: Vec<WireClassProb>,
}

#[derive(Deserialize)]
struct WireLocation {
    #[serde(rename = "livingProb")]
    living_prob: f64,
    #[serde(rename = "kitchenProb")]
    kitchen_prob: f64,
    x: f64,
}

#[derive(Deserialize)]
struct WireGru {
    probs: Vec<WireClassProb>,
}

#[derive(Deserialize)]
struct WireClassProb {
    name: String,
    prob: f64,
}

pub fn decode_envelope(line: &str) -> Result<Envelope, DecodeError> {
    let envelope: Envelope = serde_json::from_str(line)?;
    Ok(envelope)
}

pub fn encode_envelope(event: &str, data: &serde_json::Value) -> String {
    serde_json::json!({ "event": event, "data": data }).to_string()
}

pub fn decode_packet(value: &serde_json::Value) -> Result<SensorPacket, DecodeError> {
    let wire = WirePacket::deserialize(value)?;
    validate(wire)
}

pub fn decode_packet_str(raw: &str) -> Result<SensorPacket, DecodeError> {
    let wire: WirePacket = serde_json::from_str(raw)?;
    validate(wire)
}

pub fn decode_packet_slice(raw: &[u8]) -> Result<SensorPacket, DecodeError> {
    let wire: WirePacket = serde_json::from_slice(raw)?;
    validate(wire)
}

fn validate(wire: WirePacket) -> Result<SensorPacket, DecodeError> {
    let vision = VisionReading {
        label: wire.vision.label,
        confidence: unit("vision.conf", wire.vision.conf)?,
        matrix: match wire.vision.matrix {
            Some(rows) => Some(matrix(rows)?),
            None => None,
        },
    };

    if wire.audio.top3.len() > MAX_AUDIO_CLASSES {
        return Err(DecodeError::TooManyAudioClasses(wire.audio.top3.len()));
    }
    let top3 = wire
        .audio
        .top3
        .into_iter()
        .map(|c| Ok(ClassProb::new(c.name, unit("audio.top3.prob", c.prob)?)))
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let location = LocationReading {
        living_prob: percent("location.livingProb", wire.location.living_prob)?,
        kitchen_prob: percent("location.kitchenProb", wire.location.kitchen_prob)?,
        x: finite("location.x", wire.location.x)?,
    };

    let mut seen = HashSet::with_capacity(wire.gru.probs.len());
    let mut probs = Vec::with_capacity(wire.gru.probs.len());
    for entry in wire.gru.probs {
        if !seen.insert(entry.name.clone()) {
            return Err(DecodeError::DuplicateAction(entry.name));
        }
        probs.push(ClassProb::new(entry.name, unit("gru.probs.prob", entry.prob)?));
    }

    Ok(SensorPacket {
        vision,
        audio: AudioReading { top3 },
        location,
        action: ActionReading { probs },
    })
}

fn finite(field: &str, value: f64) -> Result<f64, DecodeError> {
    if !value.is_finite() {
        return Err(out_of_range(field, value));
    }
    Ok(value)
}

fn unit(field: &str, value: f64) -> Result<f64, DecodeError> {
    bounded(field, value, 1.0)
}

fn percent(field: &str, value: f64) -> Result<f64, DecodeError> {
    bounded(field, value, 100.0)
}

fn bounded(field: &str, value: f64, max: f64) -> Result<f64, DecodeError> {
    if !(0.0..=max).contains(&value) {
        return Err(out_of_range(field, value));
    }
    Ok(value)
}

// The matrix is an opaque payload; only it is stored at f32.
fn matrix(rows: Vec<Vec<f64>>) -> Result<Vec<Vec<f32>>, DecodeError> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|v| {
                    if v.is_finite() && v.abs() <= f32::MAX as f64 {
                        Ok(v as f32)
                    } else {
                        Err(out_of_range("vision.matrix", v))
                    }
                })
                .collect()
        })
        .collect()
}

fn out_of_range(field: &str, value: f64) -> DecodeError {
    DecodeError::OutOfRange {
        field: field.to_string(),
        value,
    }
}
