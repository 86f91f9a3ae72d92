use std::sync::Arc;

use tokio::sync::mpsc;

use super::{Connector, InputSource, SharedConnector};

/// Политика доставки в сток получателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Ждать, пока сток примет значение. Неготовый получатель
    /// останавливает весь широковещательный цикл.
    #[default]
    Block,
    /// Попытаться отдать без ожидания; при неготовом стоке значение
    /// молча отбрасывается.
    DropIfUnready,
}

/// Декоратор, принудительно включающий [`Backpressure::DropIfUnready`]
/// поверх любого коннектора.
///
/// Обёртка — отдельная идентичность: присоединять к хабу нужно её,
/// а не внутренний коннектор.
pub struct NonBlocking<T> {
    inner: SharedConnector<T>,
}

impl<T> NonBlocking<T> {
    pub fn wrap(inner: SharedConnector<T>) -> Arc<Self> {
        Arc::new(Self { inner })
    }
}

impl<T> Connector<T> for NonBlocking<T> {
    fn input_source(&self) -> Option<InputSource<T>> {
        self.inner.input_source()
    }

    fn output_sink(&self) -> Option<mpsc::Sender<T>> {
        self.inner.output_sink()
    }

    fn backpressure(&self) -> Backpressure {
        Backpressure::DropIfUnready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueueConnector;

    /// Проверяет, что обёртка меняет только политику, а вход и выход
    /// делегирует внутреннему коннектору.
    #[tokio::test]
    async fn wrapper_delegates_everything_but_policy() {
        let inner = QueueConnector::bounded(4);
        let shared: SharedConnector<i32> = inner.clone();
        let wrapped = NonBlocking::wrap(shared);

        assert_eq!(wrapped.backpressure(), Backpressure::DropIfUnready);
        assert_eq!(inner.backpressure(), Backpressure::Block);

        // вход делегируется: значение, положенное во внутренний коннектор,
        // видно через обёртку
        inner.send(9).await;
        let source = wrapped.input_source().expect("delegated input");
        assert_eq!(source.lock().await.recv().await, Some(9));
        assert!(wrapped.output_sink().is_some());
    }
}
