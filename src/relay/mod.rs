//! Confirmation state machine and deferred batch execution.
//!
//! Inbound chat events flow through the [`access`] gate and the
//! [`interpreter`] into the [`confirmation`] store. Confirmed actions move
//! into the [`queue`], whose drain loop hands each batch to the
//! [`executor`] and reports results through a [`notifier::Notifier`].

pub mod access;
pub mod confirmation;
pub mod dispatcher;
pub mod executor;
pub mod interpreter;
pub mod notifier;
pub mod queue;
pub mod tasks;
