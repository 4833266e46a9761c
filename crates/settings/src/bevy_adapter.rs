use bevy::{
    app::App,
    ecs::resource::Resource,
    prelude::{Deref, DerefMut},
};
use std::sync::Arc;

use crate::{Settings, SettingsError, SettingsStore};

/// Shared handle to the store, inserted once per app.
#[derive(Resource, Clone)]
pub struct SettingsStoreRef(pub Arc<SettingsStore>);

/// Snapshot of one registered section.
#[derive(Resource, Deref, DerefMut, Clone)]
pub struct SettingsArc<T: Send + Sync + 'static>(pub Arc<T>);

pub trait AppSettingsExt {
    fn insert_settings_store(&mut self, store: SettingsStore) -> &mut Self;

    /// Registers `S` with the store and seeds `SettingsArc<S>`.
    ///
    /// Falls back to `S::default()` when no store was inserted, so plugins
    /// can be exercised in headless apps without a settings file.
    fn register_settings_section<S: Settings>(&mut self) -> Result<&mut Self, SettingsError>;
}

impl AppSettingsExt for App {
    fn insert_settings_store(&mut self, store: SettingsStore) -> &mut Self {
        self.insert_resource(SettingsStoreRef(Arc::new(store)))
    }

    fn register_settings_section<S: Settings>(&mut self) -> Result<&mut Self, SettingsError> {
        let section = match self.world().get_resource::<SettingsStoreRef>() {
            Some(store) => {
                let store = store.0.clone();
                if !store.is_registered::<S>() {
                    store.register::<S>()?;
                }
                store.get::<S>()?
            }
            None => Arc::new(S::default()),
        };
        Ok(self.insert_resource(SettingsArc::<S>(section)))
    }
}
