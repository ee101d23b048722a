mod connection_state;
mod register_transport;

pub use connection_state::ConnectionState;
pub use register_transport::{RegisterTransport, TransportFactory};
