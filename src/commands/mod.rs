pub mod completions;
pub mod configure;
pub mod export;
pub mod save;
pub mod status;

pub use completions::CompletionsCommand;
pub use configure::ConfigureCommand;
pub use export::{ExportCommand, SsoArgs};
pub use save::SaveCommand;
pub use status::StatusCommand;
