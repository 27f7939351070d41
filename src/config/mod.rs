//! Configuration: rendering defaults and explicit table aliases.

mod settings;

pub use settings::{RenderSettings, Settings, SettingsError};
