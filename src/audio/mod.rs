// Audio module - cue assets and audio resource providers

pub mod asset;
pub mod click;
pub mod provider;

#[cfg(not(target_os = "android"))]
pub mod cpal_provider;

// Re-export commonly used types for convenience
pub use asset::{AssetRef, ClickSample};
#[cfg(not(target_os = "android"))]
pub use cpal_provider::CpalProvider;
pub use provider::{AudioFuture, AudioHandle, AudioResourceProvider, SilentProvider};
