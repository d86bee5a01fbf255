//! Packet codec: newline-delimited JSON envelopes carrying sensor packets.
//!
//! Decoding is pure. A failure rejects exactly one packet and never touches
//! kernel state.

pub mod packet;
pub mod wire;

pub use packet::{
    ActionProb, ActionReading, AudioReading, ClassProb, Envelope, LocationReading, SensorPacket,
    VisionReading,
};
pub use wire::{decode_envelope, decode_packet, decode_packet_slice, decode_packet_str, encode_envelope};
