use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use super::{Backpressure, Connector, InputSource};

/// Обёртка над внешне созданными половинами каналов.
///
/// Любая из сторон может отсутствовать: коннектор без входа никогда не
/// отправляет, коннектор без выхода никогда не получает. Владелец второй
/// половины канала остаётся снаружи.
pub struct ChannelConnector<T> {
    input: Option<InputSource<T>>,
    output: Option<mpsc::Sender<T>>,
    policy: Backpressure,
}

impl<T: Send> ChannelConnector<T> {
    /// Собирает коннектор из готовых половин с синхронной доставкой.
    pub fn from_halves(
        input: Option<mpsc::Receiver<T>>,
        output: Option<mpsc::Sender<T>>,
    ) -> Arc<Self> {
        Self::with_policy(input, output, Backpressure::Block)
    }

    /// То же, но с явной политикой доставки.
    pub fn with_policy(
        input: Option<mpsc::Receiver<T>>,
        output: Option<mpsc::Sender<T>>,
        policy: Backpressure,
    ) -> Arc<Self> {
        Arc::new(Self {
            input: input.map(|rx| Arc::new(Mutex::new(rx))),
            output,
            policy,
        })
    }
}

impl<T: Send> Connector<T> for ChannelConnector<T> {
    fn input_source(&self) -> Option<InputSource<T>> {
        self.input.clone()
    }

    fn output_sink(&self) -> Option<mpsc::Sender<T>> {
        self.output.clone()
    }

    fn backpressure(&self) -> Backpressure {
        self.policy
    }
}
