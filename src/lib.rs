// Split keyboard bongo cat - shared library
// Config file, event-source protocol, key-info telemetry and the daemon loop

pub mod config;
pub mod daemon;
pub mod input;
pub mod key_info;
pub mod sink;

pub use config::{AppConfig, AppConfigError, ConfigOverrides};
pub use daemon::{ReplayOptions, Session, SessionOptions};
pub use input::{InputError, InputLine};
pub use key_info::{KeyInfo, KeyInfoLabels, KeyLayout};
