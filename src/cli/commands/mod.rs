pub mod config;
pub mod run;
pub mod sheets;

pub use config::{ConfigCommands, handle_config_command};
pub use run::{RunCommands, handle_run_command};
pub use sheets::{SheetsCommands, handle_sheets_command};
