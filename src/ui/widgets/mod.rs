//! Custom widgets for the analysis TUI.

pub mod progress;

pub use progress::ProgressBar;
