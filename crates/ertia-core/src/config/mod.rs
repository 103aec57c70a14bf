//! Configuration: data directory layout and tunables.

pub mod paths;
pub mod settings;

pub use paths::ErtiaPaths;
pub use settings::{Settings, load_settings, parse_settings_str};
