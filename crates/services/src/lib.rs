pub mod config;
pub mod library;

pub use config::{load_settings, save_settings};
pub use library::SongLibrary;
