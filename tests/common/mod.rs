#![allow(dead_code)]

use locus::codec::{decode_packet, SensorPacket};
use serde_json::{json, Value};

/// A well-formed packet body with the given action vector.
pub fn packet_json(probs: &[(&str, f64)]) -> Value {
    let probs: Vec<Value> = probs
        .iter()
        .map(|(name, prob)| json!({ "name": name, "prob": prob }))
        .collect();
    json!({
        "vision": { "label": "person", "conf": 0.91, "matrix": [[0.1, 0.2], [0.3]] },
        "audio": { "top3": [
            { "name": "Vacuum", "prob": 0.7 },
            { "name": "Speech", "prob": 0.2 },
            { "name": "Silence", "prob": 0.1 }
        ] },
        "location": { "livingProb": 80.0, "kitchenProb": 20.0, "x": 1.5 },
        "gru": { "action": "ignored", "probs": probs }
    })
}

pub fn packet(probs: &[(&str, f64)]) -> SensorPacket {
    decode_packet(&packet_json(probs)).expect("fixture packet must decode")
}

/// One wire line: `{"event": channel, "data": packet}`.
pub fn envelope_line(channel: &str, data: &Value) -> String {
    json!({ "event": channel, "data": data }).to_string()
}
