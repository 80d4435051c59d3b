// src/config/mod.rs

//! Schedule files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load and save schedule files (`loader.rs`).
//! - Validate them into a well-formed task graph (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_schedule_path, load_and_validate, load_from_path, save_to_path};
pub use model::{ConfigSection, RawScheduleFile, ScheduleFile, TaskConfig};
pub use validate::validate_schedule;
