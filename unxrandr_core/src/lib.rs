//! unxrandr_core - read the current display output layout and write it back
//! out as a command that recreates it.
//!
//! The reader queries the display subsystem (X11 RandR or sway IPC) without
//! changing anything and produces a [`Snapshot`]. The serializer turns a
//! snapshot into an `xrandr` or `swaymsg` [`CommandLine`].

pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod parser;
pub mod reader;
pub mod serializer;

// Re-exports for convenience
pub use command::CommandLine;
pub use config::AppConfig;
pub use error::{LayoutError, Result};
pub use model::{Output, Snapshot};
pub use parser::{parse_command, ParsedCommand};
pub use reader::{read_from, read_snapshot, read_snapshot_from, Backend};
pub use serializer::{serialize, Serializer, Target, UnsupportedFeatureLoss};
