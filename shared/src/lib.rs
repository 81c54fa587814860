pub mod layout;
pub mod protocol;

pub use layout::*;
pub use protocol::*;

/// The protocol version - clients must match this exactly
/// Version 1: Store floor simulation with layout evolution
pub const PROTOCOL_VERSION: u32 = 1;
