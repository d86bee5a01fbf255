//! Stream session: connection lifecycle, reconnect policy and the scoped
//! handle observers hold while attached.

pub mod handle;
pub mod manager;
pub mod status;
pub mod transport;

pub use handle::{LocusSession, SessionHandle};
pub use manager::{SessionChannels, SessionManager};
pub use status::{SessionEvent, SessionStatus};
pub use transport::{Connector, EventStream, TcpConnector, TcpEventStream};
