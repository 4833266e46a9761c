use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{Settings, SettingsError};

use ron::{Map, Value};

type Deltas = HashMap<String, Value>;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Serialize a section and re-read it as a generic RON map.
fn section_to_map<T: Settings>(section: &T) -> Result<Map, SettingsError> {
    let text = ron::to_string(section)?;
    match ron::from_str::<Value>(&text)? {
        Value::Map(map) => Ok(map),
        _ => Err(SettingsError::NotAMap(T::SECTION)),
    }
}

fn section_from_value<T: Settings>(value: &Value) -> Result<T, SettingsError> {
    Ok(value.clone().into_rust::<T>()?)
}

/// Merge default + delta recursively. Non-map delta values replace the default.
fn merge_maps(default: &Map, delta: &Map) -> Map {
    let mut merged = default.clone();
    for (key, delta_value) in delta.iter() {
        let combined = match (merged.get(key), delta_value) {
            (Some(Value::Map(default_sub)), Value::Map(delta_sub)) => {
                Value::Map(merge_maps(default_sub, delta_sub))
            }
            _ => delta_value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}

/// Keys of `current` that differ from `default`, recursing into nested maps.
fn diff_map(current: &Map, default: &Map) -> Map {
    let mut out = Map::new();
    for (key, value) in current.iter() {
        match (value, default.get(key)) {
            (Value::Map(current_sub), Some(Value::Map(default_sub))) => {
                let sub = diff_map(current_sub, default_sub);
                if !sub.is_empty() {
                    out.insert(key.clone(), Value::Map(sub));
                }
            }
            (value, Some(default_value)) if value == default_value => {}
            (value, _) => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

fn effective_value(default: &Map, delta: Option<&Value>) -> Value {
    match delta {
        Some(Value::Map(delta_map)) => Value::Map(merge_maps(default, delta_map)),
        Some(other) => other.clone(),
        None => Value::Map(default.clone()),
    }
}

fn load_deltas(path: &Path) -> Result<Deltas, SettingsError> {
    if !path.exists() {
        return Ok(Deltas::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Deltas::new());
    }
    Ok(ron::from_str(&content)?)
}

/// Builder for [`SettingsStore`].
#[derive(Default)]
pub struct SettingsStoreBuilder {
    settings_file: Option<PathBuf>,
}

impl SettingsStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SettingsStore, SettingsError> {
        let file_path = self.settings_file.ok_or(SettingsError::MissingFile)?;

        if let Some(dir) = file_path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let deltas = load_deltas(&file_path)?;
        tracing::debug!(
            "settings store opened at {:?} with {} section deltas",
            file_path,
            deltas.len()
        );

        Ok(SettingsStore {
            file_path,
            deltas: RwLock::new(deltas),
            defaults: RwLock::new(HashMap::new()),
            values: RwLock::new(HashMap::new()),
        })
    }
}

/// Thread-safe settings store backed by a single RON delta file.
///
/// Only values that differ from the registered defaults are written back.
pub struct SettingsStore {
    file_path: PathBuf,
    deltas: RwLock<Deltas>,
    defaults: RwLock<HashMap<&'static str, Map>>,
    values: RwLock<HashMap<&'static str, Value>>,
}

impl SettingsStore {
    pub fn builder() -> SettingsStoreBuilder {
        SettingsStoreBuilder::new()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_registered<T: Settings>(&self) -> bool {
        read(&self.values).contains_key(T::SECTION)
    }

    /// Register a section: store its defaults and merge any delta from disk.
    pub fn register<T: Settings>(&self) -> Result<(), SettingsError> {
        if self.is_registered::<T>() {
            return Err(SettingsError::AlreadyRegistered(T::SECTION));
        }

        let default_map = section_to_map(&T::default())?;
        let merged = effective_value(&default_map, read(&self.deltas).get(T::SECTION));

        write(&self.defaults).insert(T::SECTION, default_map);
        write(&self.values).insert(T::SECTION, merged);
        Ok(())
    }

    /// Snapshot of the effective section value.
    pub fn get<T: Settings>(&self) -> Result<Arc<T>, SettingsError> {
        self.try_get::<T>()?
            .ok_or(SettingsError::NotRegistered(T::SECTION))
    }

    /// Like [`get`](Self::get) but `None` for unregistered sections.
    pub fn try_get<T: Settings>(&self) -> Result<Option<Arc<T>>, SettingsError> {
        let values = read(&self.values);
        let Some(value) = values.get(T::SECTION) else {
            return Ok(None);
        };
        Ok(Some(Arc::new(section_from_value::<T>(value)?)))
    }

    /// Mutate a section and persist the recomputed delta.
    pub fn update<T, F>(&self, mutator: F) -> Result<(), SettingsError>
    where
        T: Settings,
        F: FnOnce(&mut T),
    {
        let mut section: T = {
            let values = read(&self.values);
            let value = values
                .get(T::SECTION)
                .ok_or(SettingsError::NotRegistered(T::SECTION))?;
            section_from_value(value)?
        };
        mutator(&mut section);

        let new_map = section_to_map(&section)?;
        let delta = {
            let defaults = read(&self.defaults);
            let default_map = defaults
                .get(T::SECTION)
                .ok_or(SettingsError::NotRegistered(T::SECTION))?;
            diff_map(&new_map, default_map)
        };

        write(&self.values).insert(T::SECTION, Value::Map(new_map));
        {
            let mut deltas = write(&self.deltas);
            if delta.is_empty() {
                deltas.remove(T::SECTION);
            } else {
                deltas.insert(T::SECTION.to_string(), Value::Map(delta));
            }
        }

        self.persist_deltas()
    }

    /// Re-read the delta file and re-merge every registered section.
    pub fn reload(&self) -> Result<(), SettingsError> {
        let new_deltas = load_deltas(&self.file_path)?;

        {
            let defaults = read(&self.defaults);
            let mut values = write(&self.values);
            for (section, default_map) in defaults.iter() {
                values.insert(*section, effective_value(default_map, new_deltas.get(*section)));
            }
        }

        *write(&self.deltas) = new_deltas;
        tracing::debug!("settings reloaded from {:?}", self.file_path);
        Ok(())
    }

    fn persist_deltas(&self) -> Result<(), SettingsError> {
        let clean: Deltas = read(&self.deltas)
            .iter()
            .filter(|(_, value)| !matches!(value, Value::Map(map) if map.is_empty()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let text = ron::ser::to_string_pretty(&clean, ron::ser::PrettyConfig::default())?;

        let tmp = self.file_path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.file_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> Map {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(Value::String((*key).to_string()), value.clone());
        }
        map
    }

    #[test]
    fn merge_keeps_defaults_for_missing_keys() {
        let default = map(&[
            ("a", Value::Bool(false)),
            ("b", Value::String("x".into())),
        ]);
        let delta = map(&[("a", Value::Bool(true))]);

        let merged = merge_maps(&default, &delta);
        assert_eq!(merged.get(&Value::String("a".into())), Some(&Value::Bool(true)));
        assert_eq!(
            merged.get(&Value::String("b".into())),
            Some(&Value::String("x".into()))
        );
    }

    #[test]
    fn diff_of_identical_maps_is_empty() {
        let default = map(&[("nested", Value::Map(map(&[("k", Value::Bool(true))])))]);
        assert!(diff_map(&default, &default).is_empty());
    }

    #[test]
    fn diff_only_reports_changed_nested_keys() {
        let default = map(&[(
            "nested",
            Value::Map(map(&[("k", Value::Bool(true)), ("j", Value::Bool(true))])),
        )]);
        let current = map(&[(
            "nested",
            Value::Map(map(&[("k", Value::Bool(false)), ("j", Value::Bool(true))])),
        )]);

        let diff = diff_map(&current, &default);
        let Some(Value::Map(nested)) = diff.get(&Value::String("nested".into())) else {
            panic!("nested diff should be a map");
        };
        assert_eq!(nested.len(), 1);
        assert!(nested.get(&Value::String("k".into())).is_some());
    }
}
