use thiserror::Error;
use tokio::sync::mpsc;

/// Ошибки операций жизненного цикла хаба.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("the hub was destroyed")]
    Closed,

    #[error("connector is already attached")]
    AlreadyAttached,
}

/// Ошибка при неблокирующем чтении доставленных значений.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TryRecvError {
    #[error("no values available")]
    Empty,

    #[error("channel is closed")]
    Closed,
}

// === Преобразования ===

impl From<mpsc::error::TryRecvError> for TryRecvError {
    fn from(err: mpsc::error::TryRecvError) -> Self {
        match err {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_error_display() {
        assert_eq!(HubError::Closed.to_string(), "the hub was destroyed");
        assert_eq!(
            HubError::AlreadyAttached.to_string(),
            "connector is already attached"
        );
    }

    #[test]
    fn test_try_recv_error_display() {
        assert_eq!(TryRecvError::Empty.to_string(), "no values available");
        assert_eq!(TryRecvError::Closed.to_string(), "channel is closed");
    }

    #[test]
    fn test_mpsc_conversion() {
        let err = mpsc::error::TryRecvError::Empty;
        let converted: TryRecvError = err.into();
        assert_eq!(converted, TryRecvError::Empty);

        let err = mpsc::error::TryRecvError::Disconnected;
        let converted: TryRecvError = err.into();
        assert_eq!(converted, TryRecvError::Closed);
    }
}
