//! Command Layer
//!
//! Operations exposed to the UI / HTTP layer, organized by domain.
//! Every command takes the owner explicitly and only touches that owner's data.

mod bean_cmd;
mod brew_cmd;
mod settings_cmd;
mod tag_cmd;


// Re-export all public items
pub use bean_cmd::*;
pub use brew_cmd::*;
pub use settings_cmd::*;
pub use tag_cmd::*;
