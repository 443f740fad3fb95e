//! Analysis TUI library
//!
//! Submits a URL to the brand-analysis service and keeps a local view of the
//! resulting task in sync until it completes or fails. The terminal front
//! end in `app`, `event` and `ui` is one consumer of [`client::TaskClient`].

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod monitor;
pub mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod ui;
