//! Herald scheduling engine.
//!
//! Notifications ingested through [`service::SchedulerService`] land in a
//! per-channel persistent pending set; a single-shot alarm per channel is
//! kept pointed at the earliest pending schedule time, and each fire drains
//! every entry due at that moment downstream.
//!
//! External collaborators are injected as ports:
//! - [`persist::PersistentStore`] — durable get/put of the serialized set
//! - [`timer::TimerService`] — the single outstanding alarm per channel
//! - [`delivery::DeliveryQueue`] — downstream handoff of due notifications
//! - [`clock::Clock`] — the drain instant, swappable for tests

pub mod alarm;
pub mod clock;
pub mod delivery;
pub mod dispatch;
pub mod persist;
pub mod service;
pub mod store;
pub mod timer;
