//! Широковещательный хаб.
//!
//! Этот модуль реализует посредника между присоединяемыми коннекторами:
//! каждое значение, прочитанное из входа одного коннектора, раздаётся
//! всем остальным через их цепочки фильтров.
//!
//! - `hub`: реестр портов, операции attach/detach/destroy и
//!   единственная широковещательная задача.
//! - `port` (приватный): привязка коннектора к его фильтрам и сигналам
//!   жизненного цикла, рабочая задача пересылки.
//! - `signal` (приватный): конверт одного раунда вещания.
//!
//! Публичный API переэкспортирует `hub::*`.

pub mod hub;
mod port;
mod signal;

pub use hub::*;
