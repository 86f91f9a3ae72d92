/// Hub configuration loading.
pub mod config;
/// Connector capability and the concrete connector kinds.
pub mod connector;
/// Common error types: hub lifecycle, non-blocking reads.
pub mod error;
/// Per-recipient transform-or-drop filters.
pub mod filter;
/// The hub: port registry and the serialized broadcast worker.
pub mod hub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Hub configuration (serialization point capacity).
pub use config::HubConfig;
/// Connector capability trait, concrete connectors, backpressure policy.
pub use connector::{
    Backpressure, ChannelConnector, Connector, ConnectorId, InputSource, NonBlocking,
    QueueConnector, SharedConnector,
};
/// Hub lifecycle and non-blocking read errors.
pub use error::{HubError, TryRecvError};
/// Filter type, ordered filter chain and built-in filters.
pub use filter::{discard_all, filter_fn, Filter, FilterChain};
/// The broadcast hub.
pub use hub::Hub;
