//! Connection lifecycle states.

/// Where a connection is in its lifecycle.
///
/// `Connecting → Active → Closed`, or `Connecting → Rejected` for
/// filtered clients. Both terminal states are final; a dropped client
/// reconnects as a new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Identity resolved, not yet registered.
    Connecting = 0,
    /// Registered in presence and its broadcast group.
    Active = 1,
    /// Disconnected and cleaned up.
    Closed = 2,
    /// Refused before registration (crawler).
    Rejected = 3,
}

impl ConnectionState {
    /// Decode from the atomic representation.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Closed,
            _ => Self::Rejected,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }
}
