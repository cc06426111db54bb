//! Input simulation and window validation collaborators around the
//! detection core.

pub mod input;
pub mod windows;

pub use input::InputDriver;
pub use windows::{title_pattern, wait_for_window};
