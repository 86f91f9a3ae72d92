//! Коннекторы — присоединяемые конечные точки хаба.
//!
//! Этот модуль определяет контракт возможностей коннектора и его
//! конкретные разновидности:
//!
//! - `queue`: коннектор с собственной парой ограниченных очередей.
//! - `channel`: обёртка над внешне созданными половинами каналов.
//! - `policy`: декоратор, принудительно включающий неблокирующую доставку.
//!
//! Хаб потребляет только контракт: источник входа, сток выхода и политику
//! обратного давления. Кто и как создал коннектор — хабу безразлично.

pub mod channel;
pub mod policy;
pub mod queue;

pub use channel::ChannelConnector;
pub use policy::{Backpressure, NonBlocking};
pub use queue::QueueConnector;

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// Источник входных значений коннектора.
///
/// Приёмник завёрнут в `Arc<Mutex<..>>`: рабочая задача порта держит
/// блокировку всё время своей жизни, поэтому после `detach` освободившаяся
/// блокировка наблюдаемо означает «вход больше никто не читает», а при
/// повторном присоединении новая задача получает приёмник обратно.
pub type InputSource<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Контракт возможностей коннектора, потребляемый хабом.
pub trait Connector<T>: Send + Sync {
    /// Источник входа; `None` — конечная точка никогда не отправляет.
    fn input_source(&self) -> Option<InputSource<T>>;

    /// Сток выхода; `None` — конечная точка никогда не получает.
    fn output_sink(&self) -> Option<mpsc::Sender<T>>;

    /// Политика доставки в сток. По умолчанию доставка синхронная.
    fn backpressure(&self) -> Backpressure {
        Backpressure::Block
    }
}

/// Коннектор как разделяемый trait-объект.
pub type SharedConnector<T> = Arc<dyn Connector<T>>;

/// Идентичность коннектора — по ссылке.
///
/// Два клона одного `Arc` дают один и тот же идентификатор; обёртка
/// ([`NonBlocking`]) — уже другой коннектор.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorId(usize);

impl ConnectorId {
    pub fn of<T>(connector: &SharedConnector<T>) -> Self {
        Self(Arc::as_ptr(connector).cast::<()>() as usize)
    }
}
