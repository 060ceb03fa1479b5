//! Mingli core: the data model, HTTP client adapter and client-side state
//! synchronization for the birth-chart analysis service.
//!
//! All state lives in one [`state::AppState`]. Commands mutate it
//! synchronously and emit [`effect::Effect`]s; the caller executes those
//! against a [`api::ClientApi`] and feeds the resulting
//! [`effect::Completion`]s back. Completions that no longer match the
//! current context are discarded.

pub mod analysis;
pub mod api;
pub mod config;
pub mod effect;
pub mod error;
pub mod model;
pub mod records;
pub mod session;
pub mod state;
pub mod storage;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;
