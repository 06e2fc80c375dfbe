pub mod console;

pub use console::{Command, ConsoleSession};
