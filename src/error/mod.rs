pub mod hub;

pub use hub::{HubError, TryRecvError};
