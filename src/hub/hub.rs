use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::{
    sync::{mpsc, RwLock},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{port::Port, signal::Signal};
use crate::{
    config::HubConfig,
    connector::{Backpressure, ConnectorId, SharedConnector},
    error::HubError,
    filter::FilterChain,
};

/// Широковещательный хаб.
///
/// Поддерживает:
/// - Динамическое присоединение и отсоединение коннекторов
/// - Строго сериализованную раздачу: один раунд вещания за раз
/// - Цепочки фильтров на каждого получателя
/// - Две политики доставки: `Block` и `DropIfUnready`
/// - Идемпотентный терминальный останов без утечки задач
///
/// Значения одного отправителя доставляются каждому получателю в порядке
/// отправки. Между разными отправителями порядок определяется только тем,
/// как точка сериализации разрешила их гонку.
pub struct Hub<T> {
    registry: Arc<Registry<T>>,
    /// Хабовая сторона точки сериализации; `None` после destroy.
    signals: Mutex<Option<mpsc::Sender<Signal<T>>>>,
    /// Широковещательная задача; `None` после destroy.
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Реестр портов — единственная разделяемая изменяемая структура хаба.
/// Структурные изменения берут эксклюзивную блокировку, раздача — общую.
struct Registry<T> {
    ports: RwLock<HashMap<ConnectorId, Port<T>>>,
    /// Однократное уведомление о необратимом закрытии.
    closing: CancellationToken,
}

impl<T: Clone + Send + 'static> Hub<T> {
    /// Создаёт хаб с конфигурацией по умолчанию.
    ///
    /// Должен вызываться внутри рантайма tokio: широковещательная
    /// задача запускается сразу.
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Создаёт хаб с явной конфигурацией.
    pub fn with_config(config: HubConfig) -> Self {
        let (signals, receiver) = mpsc::channel(config.signal_capacity.max(1));
        let registry = Arc::new(Registry {
            ports: RwLock::new(HashMap::new()),
            closing: CancellationToken::new(),
        });
        let worker = tokio::spawn(Registry::run_broadcast(registry.clone(), receiver));

        Self {
            registry,
            signals: Mutex::new(Some(signals)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Присоединяет коннектор с его цепочкой фильтров.
    ///
    /// Коннектор становится получателем вещания и, если у него есть
    /// вход, отправителем. Возвращает [`HubError::Closed`] после начала
    /// необратимого останова (рабочая задача в этом случае не запускается)
    /// и [`HubError::AlreadyAttached`], если эта же идентичность уже в
    /// реестре.
    pub async fn attach(
        &self,
        connector: SharedConnector<T>,
        filters: impl Into<FilterChain<T>>,
    ) -> Result<(), HubError> {
        let id = ConnectorId::of(&connector);
        let mut ports = self.registry.ports.write().await;

        if self.registry.closing.is_cancelled() {
            return Err(HubError::Closed);
        }
        if ports.contains_key(&id) {
            return Err(HubError::AlreadyAttached);
        }

        // реестр не закрыт, значит точка сериализации ещё на месте
        let signals = match self.signals.lock().clone() {
            Some(signals) => signals,
            None => return Err(HubError::Closed),
        };

        let filters = filters.into();
        debug!(
            connector = ?id,
            filters = filters.len(),
            has_input = connector.input_source().is_some(),
            policy = ?connector.backpressure(),
            "connector attached"
        );

        let port = Port::spawn(connector, filters, &self.registry.closing, signals);
        ports.insert(id, port);
        Ok(())
    }

    /// Отсоединяет коннектор и ждёт полного завершения его рабочей задачи.
    ///
    /// После возврата вход коннектора гарантированно никем не читается —
    /// его можно безопасно закрывать или выбрасывать. Отсоединение
    /// не присоединённого коннектора — немедленный no-op.
    pub async fn detach(&self, connector: SharedConnector<T>) {
        let id = ConnectorId::of(&connector);

        // Сначала токен: общая блокировка не конфликтует с идущим раундом
        // вещания, и застрявшая доставка этому получателю прерывается ещё
        // до того, как мы встанем в очередь за эксклюзивной блокировкой.
        {
            let ports = self.registry.ports.read().await;
            let Some(port) = ports.get(&id) else {
                return;
            };
            port.request_detach();
        }

        let removed = { self.registry.ports.write().await.remove(&id) };
        let Some(mut port) = removed else {
            // проиграли гонку другому detach или destroy
            return;
        };

        port.join().await;
        debug!(connector = ?id, "connector detached");
    }

    /// Необратимый идемпотентный останов.
    ///
    /// Отклоняет новые attach, отсоединяет все порты, дожидается их
    /// рабочих задач, затем закрывает точку сериализации и дожидается
    /// широковещательной задачи. После возврата ни одной задачи,
    /// принадлежащей хабу, не остаётся.
    pub async fn destroy(&self) {
        let drained: Vec<Port<T>> = {
            let mut ports = self.registry.ports.write().await;
            // закрытие объявляется под эксклюзивной блокировкой: attach
            // либо успел раньше (и его порт будет снят здесь же), либо
            // увидит отказ; токены портов гаснут как потомки этого токена
            self.registry.closing.cancel();
            ports.drain().map(|(_, port)| port).collect()
        };

        let count = drained.len();
        for mut port in drained {
            port.join().await;
        }

        // все отправители завершены, точку сериализации можно закрывать:
        // широковещательная задача допьёт остаток и выйдет
        let signals = self.signals.lock().take();
        drop(signals);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }

        if count > 0 {
            debug!(ports = count, "hub destroyed");
        }
    }

    /// Начался ли необратимый останов.
    pub fn is_closed(&self) -> bool {
        self.registry.closing.is_cancelled()
    }

    /// Количество присоединённых коннекторов.
    pub async fn attached(&self) -> usize {
        self.registry.ports.read().await.len()
    }
}

impl<T: Clone + Send + 'static> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Hub<T> {
    fn drop(&mut self) {
        // Лучшее, что можно сделать без await: погасить токены — рабочие
        // задачи выйдут сами, а за ними закроется и точка сериализации.
        // Синхронную уборку даёт только destroy().
        self.registry.closing.cancel();
    }
}

impl<T: Clone + Send + 'static> Registry<T> {
    /// Широковещательная задача: живёт от создания хаба до destroy,
    /// обрабатывает сигналы строго по одному.
    async fn run_broadcast(self: Arc<Self>, mut signals: mpsc::Receiver<Signal<T>>) {
        while let Some(signal) = signals.recv().await {
            if self.closing.is_cancelled() {
                // терминальный останов: сигнал отбрасывается, уничтоженный
                // маркер завершения освобождает отправителя
                continue;
            }
            self.fan_out(signal).await;
        }
    }

    /// Один раунд вещания: все порты, кроме отправителя.
    async fn fan_out(&self, signal: Signal<T>) {
        let ports = self.ports.read().await;

        for (id, port) in ports.iter() {
            if *id == signal.from {
                continue;
            }
            let Some(sink) = port.connector().output_sink() else {
                continue;
            };
            let Some(value) = port.filters().apply(signal.payload.clone()) else {
                continue;
            };

            match port.connector().backpressure() {
                Backpressure::Block => {
                    tokio::select! {
                        sent = sink.send(value) => {
                            if sent.is_err() {
                                // получатель уронил свою половину канала
                                trace!(recipient = ?id, "sink closed, value discarded");
                            }
                        }
                        () = port.detach_requested() => {
                            trace!(recipient = ?id, "delivery abandoned, recipient detaching");
                        }
                    }
                }
                Backpressure::DropIfUnready => {
                    if sink.try_send(value).is_err() {
                        trace!(recipient = ?id, "sink not ready, value dropped");
                    }
                }
            }
        }

        drop(ports);
        signal.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter_fn, ChannelConnector, QueueConnector};

    /// Проверяет, что attach после destroy отклоняется и рабочая
    /// задача не запускается.
    #[tokio::test]
    async fn attach_after_destroy_is_rejected() {
        let hub = Hub::<i32>::new();
        hub.destroy().await;

        let c: SharedConnector<i32> = QueueConnector::bounded(4);
        assert_eq!(
            hub.attach(c, FilterChain::none()).await,
            Err(HubError::Closed)
        );
        assert!(hub.is_closed());
    }

    /// Проверяет, что одна идентичность не может быть в реестре дважды,
    /// а её клон — это та же идентичность.
    #[tokio::test]
    async fn double_attach_is_rejected() {
        let hub = Hub::<i32>::new();
        let c: SharedConnector<i32> = QueueConnector::bounded(4);

        hub.attach(c.clone(), FilterChain::none()).await.unwrap();
        assert_eq!(
            hub.attach(c.clone(), FilterChain::none()).await,
            Err(HubError::AlreadyAttached)
        );
        assert_eq!(hub.attached().await, 1);

        hub.destroy().await;
    }

    /// Проверяет, что отсоединение не присоединённого коннектора —
    /// немедленный no-op.
    #[tokio::test]
    async fn detach_of_unknown_connector_is_noop() {
        let hub = Hub::<i32>::new();
        let c: SharedConnector<i32> = ChannelConnector::from_halves(None, None);

        hub.detach(c).await;
        assert_eq!(hub.attached().await, 0);

        hub.destroy().await;
    }

    /// Проверяет, что отправитель не получает собственные значения.
    #[tokio::test]
    async fn sender_never_receives_its_own_value() {
        let hub = Hub::<i32>::new();
        let sender = QueueConnector::bounded(4);
        let witness = QueueConnector::bounded(4);

        hub.attach(sender.clone(), FilterChain::none()).await.unwrap();
        hub.attach(witness.clone(), FilterChain::none()).await.unwrap();

        sender.send(42).await;

        // свидетель получил значение, значит раунд вещания завершён
        assert_eq!(witness.recv().await, Some(42));
        assert_eq!(sender.try_recv(), Err(crate::TryRecvError::Empty));

        hub.destroy().await;
    }

    /// Проверяет, что фильтр применяется на стороне получателя,
    /// а не отправителя.
    #[tokio::test]
    async fn filters_are_per_recipient() {
        let hub = Hub::<i32>::new();
        let sender = QueueConnector::bounded(8);
        let doubled = QueueConnector::bounded(8);
        let plain = QueueConnector::bounded(8);

        hub.attach(sender.clone(), FilterChain::none()).await.unwrap();
        hub.attach(doubled.clone(), vec![filter_fn(|v: i32| Some(v * 2))])
            .await
            .unwrap();
        hub.attach(plain.clone(), FilterChain::none()).await.unwrap();

        sender.send(21).await;

        assert_eq!(doubled.recv().await, Some(42));
        assert_eq!(plain.recv().await, Some(21));

        hub.destroy().await;
    }
}
