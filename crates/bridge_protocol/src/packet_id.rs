//! Coordinator wire protocol packet type identifiers.
//!
//! Out-going packets we send, and the incoming packet types we react to.
//! Unknown incoming types are logged at debug and skipped — new types are
//! added here, not via a registration callback.

pub const CLIENT_LISTING: u8 = 4;
pub const CLIENT_CONNECT: u8 = 6;

pub const GC_ERROR: u8 = 0;
pub const GC_LISTING: u8 = 5;
pub const GC_CONNECTING: u8 = 7;
pub const GC_CONNECT_FAILED: u8 = 9;
pub const GC_DIRECT_CONNECT: u8 = 11;
pub const GC_STUN_REQUEST: u8 = 12;
pub const GC_NEWGRF_LOOKUP: u8 = 15;
pub const GC_TURN_CONNECT: u8 = 16;

/// Coordinator protocol version advertised in `CLIENT_LISTING`/`CLIENT_CONNECT`.
pub const COORD_VERSION: u8 = 6;
/// `gameInfoVersion` advertised in `CLIENT_LISTING`.
pub const GAME_INFO_VERSION: u8 = 7;
