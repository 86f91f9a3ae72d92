use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use super::{Connector, InputSource};
use crate::TryRecvError;

/// Коннектор с собственной парой ограниченных очередей.
///
/// Внешняя сторона кладёт значения через [`send`](Self::send) и забирает
/// доставленное хабом через [`recv`](Self::recv); хаб видит только
/// контракт [`Connector`].
pub struct QueueConnector<T> {
    /// Внешняя сторона входной очереди.
    feed: mpsc::Sender<T>,
    /// Хабовая сторона входной очереди.
    input: InputSource<T>,
    /// Хабовая сторона выходной очереди.
    sink: mpsc::Sender<T>,
    /// Внешняя сторона выходной очереди (один потребитель).
    delivered: Mutex<mpsc::Receiver<T>>,
}

impl<T: Send> QueueConnector<T> {
    /// Создаёт коннектор с очередями ёмкостью `capacity` в обе стороны.
    pub fn bounded(capacity: usize) -> Arc<Self> {
        let (feed, input) = mpsc::channel(capacity);
        let (sink, delivered) = mpsc::channel(capacity);
        Arc::new(Self {
            feed,
            input: Arc::new(Mutex::new(input)),
            sink,
            delivered: Mutex::new(delivered),
        })
    }

    /// Отправляет значение в хаб.
    ///
    /// Ждёт, пока во входной очереди появится место. Если коннектор не
    /// присоединён, значение остаётся в очереди до присоединения.
    pub async fn send(&self, value: T) {
        // приёмник живёт внутри self, так что отправка не может сорваться
        let _ = self.feed.send(value).await;
    }

    /// Ожидает следующее значение, доставленное хабом.
    pub async fn recv(&self) -> Option<T> {
        self.delivered.lock().await.recv().await
    }

    /// Пытается забрать доставленное значение без ожидания.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        match self.delivered.try_lock() {
            Ok(mut rx) => rx.try_recv().map_err(Into::into),
            // конкурирующий recv() уже держит приёмник
            Err(_) => Err(TryRecvError::Empty),
        }
    }
}

impl<T: Send> Connector<T> for QueueConnector<T> {
    fn input_source(&self) -> Option<InputSource<T>> {
        Some(self.input.clone())
    }

    fn output_sink(&self) -> Option<mpsc::Sender<T>> {
        Some(self.sink.clone())
    }

    // backpressure() по умолчанию: доставка синхронная.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Backpressure;

    /// Проверяет, что значение, положенное через `send`, видно на
    /// хабовой стороне входа.
    #[tokio::test]
    async fn send_reaches_the_input_source() {
        let c = QueueConnector::bounded(4);
        c.send(7).await;

        let source = c.input_source().expect("queue connector has an input");
        let got = source.lock().await.recv().await;
        assert_eq!(got, Some(7));
    }

    /// Проверяет, что записанное в сток значение читается через `recv`
    /// и `try_recv`, а пустая очередь даёт `Empty`.
    #[tokio::test]
    async fn sink_feeds_recv_and_try_recv() {
        let c = QueueConnector::bounded(4);
        let sink = c.output_sink().expect("queue connector has an output");

        sink.send(1).await.unwrap();
        sink.send(2).await.unwrap();

        assert_eq!(c.recv().await, Some(1));
        assert_eq!(c.try_recv(), Ok(2));
        assert_eq!(c.try_recv(), Err(TryRecvError::Empty));
    }

    /// Проверяет политику по умолчанию.
    #[tokio::test]
    async fn default_policy_is_block() {
        let c = QueueConnector::<i32>::bounded(1);
        assert_eq!(c.backpressure(), Backpressure::Block);
    }
}
