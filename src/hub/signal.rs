use tokio::sync::oneshot;

use crate::connector::ConnectorId;

/// Конверт одного раунда вещания.
///
/// Создаётся рабочей задачей порта, потребляется широковещательной
/// задачей ровно один раз. Маркер завершения срабатывает однократно;
/// если хаб в терминальном останове отбрасывает сигнал, уничтоженный
/// `oneshot::Sender` всё равно освобождает ждущего отправителя.
pub(crate) struct Signal<T> {
    /// Кто отправил: этому порту значение не доставляется.
    pub from: ConnectorId,
    pub payload: T,
    done: oneshot::Sender<()>,
}

impl<T> Signal<T> {
    pub fn new(from: ConnectorId, payload: T, done: oneshot::Sender<()>) -> Self {
        Self {
            from,
            payload,
            done,
        }
    }

    /// Сообщает отправителю, что раунд вещания завершён.
    pub fn complete(self) {
        // отправитель мог уже отсоединиться, это не ошибка
        let _ = self.done.send(());
    }
}
