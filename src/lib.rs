pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ConsoleConfig;

pub use app::{Command, ConsoleSession};
pub use crate::core::{
    grid::{build_addresses, create_address, decode_address},
    ordering::{alpha_numeric_sort_default, regex_sort, sort_with_direction},
    selection::{SelectionController, SelectionEvent, SelectionState},
    worklist::{IdleStatus, WorklistController, WorklistEvent, WorklistState},
};
pub use utils::error::{ConsoleError, GridError, LookupError, Result, ScanError};
