use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::trace;

use super::signal::Signal;
use crate::{
    connector::{ConnectorId, InputSource, SharedConnector},
    filter::FilterChain,
};

/// Привязка коннектора к хабу: фильтры получателя плюс сигналы
/// жизненного цикла.
///
/// Порт принадлежит хабу от attach до detach. Токен отсоединения —
/// потомок токена закрытия хаба, поэтому terminal shutdown гасит все
/// порты разом. Подтверждением полного отсоединения служит `JoinHandle`
/// рабочей задачи; у порта без входа задачи нет вовсе.
pub(crate) struct Port<T> {
    connector: SharedConnector<T>,
    filters: FilterChain<T>,
    detach: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Port<T> {
    /// Создаёт порт и, если у коннектора есть вход, запускает его
    /// рабочую задачу пересылки.
    pub fn spawn(
        connector: SharedConnector<T>,
        filters: FilterChain<T>,
        closing: &CancellationToken,
        signals: mpsc::Sender<Signal<T>>,
    ) -> Self {
        let id = ConnectorId::of(&connector);
        let detach = closing.child_token();
        let worker = connector
            .input_source()
            .map(|input| tokio::spawn(forward(id, input, signals, detach.clone())));

        Self {
            connector,
            filters,
            detach,
            worker,
        }
    }

    pub fn connector(&self) -> &SharedConnector<T> {
        &self.connector
    }

    pub fn filters(&self) -> &FilterChain<T> {
        &self.filters
    }

    /// Однократный запрос отсоединения; повторный вызов — no-op.
    pub fn request_detach(&self) {
        self.detach.cancel();
    }

    /// Будущее «порт попросили отсоединить» — его ждёт и рабочая
    /// задача, и доставка по политике `Block`.
    pub fn detach_requested(&self) -> WaitForCancellationFuture<'_> {
        self.detach.cancelled()
    }

    /// Дожидается наблюдаемого завершения рабочей задачи.
    pub async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

/// Рабочая задача порта: читает вход коннектора и по одному значению
/// за раз передаёт его в точку сериализации хаба.
async fn forward<T: Send + 'static>(
    id: ConnectorId,
    input: InputSource<T>,
    signals: mpsc::Sender<Signal<T>>,
    detach: CancellationToken,
) {
    // Блокировка входа держится до самого выхода из задачи: снаружи
    // освободившийся mutex означает, что вход больше никто не читает.
    let mut source = tokio::select! {
        () = detach.cancelled() => return,
        guard = input.lock() => guard,
    };

    loop {
        tokio::select! {
            () = detach.cancelled() => return,

            received = source.recv() => {
                let Some(payload) = received else {
                    // вход закрыт: хаб продолжает жить, ждём отсоединения
                    trace!(connector = ?id, "input closed, waiting for detach");
                    detach.cancelled().await;
                    return;
                };

                let (done, completed) = oneshot::channel();
                if signals.send(Signal::new(id, payload, done)).await.is_err() {
                    // точка сериализации уже закрыта хабом
                    detach.cancelled().await;
                    return;
                }
                // ждём завершения раунда: так сохраняется порядок
                // значений одного отправителя
                let _ = completed.await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelConnector, ConnectorId, QueueConnector, TryRecvError};

    /// Проверяет, что значения входа превращаются в сигналы с верным
    /// отправителем и что задача завершается по отсоединению.
    #[tokio::test]
    async fn forwards_values_as_signals() {
        let closing = CancellationToken::new();
        let (sig_tx, mut sig_rx) = mpsc::channel(1);

        let queue = QueueConnector::bounded(4);
        let connector: SharedConnector<i32> = queue.clone();
        let mut port = Port::spawn(connector.clone(), FilterChain::none(), &closing, sig_tx);

        queue.send(11).await;

        let sig = sig_rx.recv().await.expect("signal emitted");
        assert_eq!(sig.from, ConnectorId::of(&connector));
        assert_eq!(sig.payload, 11);
        sig.complete();

        port.request_detach();
        port.join().await;
    }

    /// Проверяет, что до завершения раунда следующий сигнал не выпускается:
    /// отправитель ждёт маркер завершения.
    #[tokio::test]
    async fn waits_for_completion_between_signals() {
        let closing = CancellationToken::new();
        let (sig_tx, mut sig_rx) = mpsc::channel(1);

        let queue = QueueConnector::bounded(4);
        let connector: SharedConnector<i32> = queue.clone();
        let mut port = Port::spawn(connector, FilterChain::none(), &closing, sig_tx);

        queue.send(1).await;
        queue.send(2).await;

        let first = sig_rx.recv().await.expect("first signal");
        assert_eq!(first.payload, 1);
        // второй сигнал не должен появиться, пока первый раунд не завершён
        assert!(sig_rx.try_recv().is_err());

        first.complete();
        let second = sig_rx.recv().await.expect("second signal");
        assert_eq!(second.payload, 2);
        second.complete();

        port.request_detach();
        port.join().await;
    }

    /// Проверяет, что у порта без входа нет рабочей задачи
    /// и отсоединение мгновенно.
    #[tokio::test]
    async fn input_less_port_has_no_worker() {
        let closing = CancellationToken::new();
        let (sig_tx, _sig_rx) = mpsc::channel::<Signal<i32>>(1);

        let connector: SharedConnector<i32> = ChannelConnector::from_halves(None, None);
        let mut port = Port::spawn(connector, FilterChain::none(), &closing, sig_tx);

        port.request_detach();
        port.join().await;
    }

    /// Проверяет, что закрытый вход не роняет задачу: она ждёт
    /// отсоединения, а после него блокировка входа свободна.
    #[tokio::test]
    async fn closed_input_parks_until_detach() {
        let closing = CancellationToken::new();
        let (sig_tx, _sig_rx) = mpsc::channel::<Signal<i32>>(1);

        let (feed, input) = mpsc::channel::<i32>(1);
        let connector: SharedConnector<i32> = ChannelConnector::from_halves(Some(input), None);
        let mut port = Port::spawn(connector.clone(), FilterChain::none(), &closing, sig_tx);

        drop(feed); // конец потока

        port.request_detach();
        port.join().await;

        let source = connector.input_source().expect("input present");
        let mut guard = source.try_lock().expect("worker released the input");
        assert_eq!(guard.try_recv().map_err(TryRecvError::from), Err(TryRecvError::Closed));
    }
}
