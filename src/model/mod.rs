pub mod config;
pub mod list;
pub mod state;
pub mod task;

pub use config::*;
pub use list::*;
pub use state::*;
pub use task::*;
