use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Start the breathing exercise as soon as the hard stop fires, instead of
    /// offering a prompt first.
    pub autoplay_breathing: bool,
}

/// User preferences persisted as a small JSON file next to the app data.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Load from `path`. A missing or unreadable file falls back to defaults so
    /// a corrupt preference never blocks navigation.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("ignoring malformed settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> UserSettings {
        self.data.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn autoplay_breathing(&self) -> bool {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .autoplay_breathing
    }

    pub fn set_autoplay_breathing(&self, enabled: bool) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(|e| e.into_inner());
        guard.autoplay_breathing = enabled;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.data.write().unwrap_or_else(|e| e.into_inner()) = data;
        Ok(())
    }
}
