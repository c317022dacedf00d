//! Configuration module for Kurs.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, GeneratorSettings, SessionSettings, Settings,
    VectorStoreSettings,
};
