//! WebSocket connection lifecycle: identity, bot filtering, handles, idle reaping, cleanup.

pub mod bot_filter;
pub mod guard;
pub mod handle;
pub mod heartbeat;
pub mod identity;
pub mod manager;
pub mod state;

pub use bot_filter::BotFilter;
pub use guard::ConnectionGuard;
pub use handle::{ConnectionHandle, ConnectionId};
pub use heartbeat::{Inbound, next_inbound};
pub use identity::{ResolvedViewer, ViewerResolver};
pub use manager::{ConnectRequest, ConnectionManager, PendingConnection, Rejection};
pub use state::ConnectionState;
