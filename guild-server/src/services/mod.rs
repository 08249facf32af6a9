//! Business services
//!
//! Each service opens a store transaction, enforces the domain rules and
//! commits. HTTP handlers in `api` stay thin wrappers around these.

pub mod automation;
pub mod communication;
pub mod dashboard;
pub mod donation;
pub mod event;
pub mod member;
pub mod notifier;
pub mod registration;
pub mod seed;
pub mod segmentation;

#[cfg(test)]
pub(crate) mod test_support;
