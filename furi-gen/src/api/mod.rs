//! HTTP API handlers for furi-gen

pub mod furigana;
pub mod health;
pub mod sentences;
pub mod settings;

pub use furigana::furigana_routes;
pub use health::health_routes;
pub use sentences::sentences_routes;
pub use settings::settings_routes;
