//! Framing and record decoding for the coordinator's length-prefixed binary
//! protocol.
//!
//! This crate is purely functional on byte buffers: it does not own a
//! transport. [`FrameDecoder`] consumes bytes pushed into it and yields
//! fully-framed `(type, payload)` pairs; [`encode_frame`] produces the wire
//! bytes for an outgoing packet. [`Cursor`] provides bounds-checked field
//! readers for the primitive wire types used throughout the packet bodies.

pub mod cursor;
pub mod error;
pub mod frame;
pub mod newgrf;
pub mod packet_id;
pub mod records;

pub use cursor::Cursor;
pub use error::DecodeError;
pub use frame::{encode_frame, Frame, FrameDecoder, MAX_PACKET_SIZE};
pub use newgrf::{NewGrfLookup, NewGrfRecord};
pub use records::{decode_listing, InviteResolution, Landscape, ServerRecord};
