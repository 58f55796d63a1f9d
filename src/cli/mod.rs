//! CLI command handling

pub mod channels;
pub mod console;
pub mod dispatch;
pub mod output;
pub mod prefs;
pub mod token;

pub use channels::*;
pub use console::*;
pub use dispatch::*;
pub use output::*;
pub use prefs::*;
pub use token::*;
