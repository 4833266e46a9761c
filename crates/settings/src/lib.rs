#[cfg(feature = "bevy")]
mod bevy_adapter;

mod errors;
mod store;

#[cfg(feature = "bevy")]
pub use bevy_adapter::*;

pub use errors::SettingsError;
pub use store::{SettingsStore, SettingsStoreBuilder};

use serde::{Serialize, de::DeserializeOwned};

/// A typed section of the settings file.
///
/// The effective value of a section is its `Default` merged with whatever
/// delta the settings file carries under `SECTION`.
pub trait Settings: Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    const SECTION: &'static str;
}
