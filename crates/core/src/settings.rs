//! Accessibility and display preferences.
//!
//! Preferences are string values under four fixed keys, kept in a [`PreferenceBackend`].
//! [`SettingsStore`] is the single shared owner: every write is persisted immediately and
//! the new [`Preferences`] snapshot is broadcast on a `tokio::sync::watch` channel, so every
//! subscribed view re-applies it without a reload. Concurrent writes are last-write-wins.

use crate::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Relative text size, in percent of the base size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum TextScale {
    #[default]
    Normal,
    Large,
    ExtraLarge,
    Huge,
}

impl TextScale {
    pub const ALL: [TextScale; 4] = [
        TextScale::Normal,
        TextScale::Large,
        TextScale::ExtraLarge,
        TextScale::Huge,
    ];

    pub fn percent(self) -> u16 {
        match self {
            TextScale::Normal => 100,
            TextScale::Large => 115,
            TextScale::ExtraLarge => 130,
            TextScale::Huge => 150,
        }
    }

    pub fn from_percent(percent: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.percent() == percent)
    }

    /// Parse a stored value; anything unrecognised reads as [`TextScale::Normal`].
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse::<u16>().ok())
            .and_then(Self::from_percent)
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            TextScale::Normal => "Normal",
            TextScale::Large => "Grande",
            TextScale::ExtraLarge => "Muy grande",
            TextScale::Huge => "Extra grande",
        }
    }
}

impl From<TextScale> for u16 {
    fn from(scale: TextScale) -> Self {
        scale.percent()
    }
}

impl TryFrom<u16> for TextScale {
    type Error = String;

    fn try_from(percent: u16) -> Result<Self, Self::Error> {
        Self::from_percent(percent)
            .ok_or_else(|| format!("unsupported text size {percent}; expected 100, 115, 130 or 150"))
    }
}

/// Keys under which preferences are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    TextSize,
    ContrastHigh,
    ThemeDark,
    VoiceAssist,
}

impl PreferenceKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::TextSize => "a11yTextSize",
            PreferenceKey::ContrastHigh => "a11yContrastHigh",
            PreferenceKey::ThemeDark => "themeDark",
            PreferenceKey::VoiceAssist => "voiceAssist",
        }
    }
}

fn flag(value: bool) -> String {
    let text = if value { "1" } else { "0" };
    text.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub text_scale: TextScale,
    pub high_contrast: bool,
    pub dark_mode: bool,
    pub voice_assist: bool,
}

impl Preferences {
    /// Read all four keys. A flag is on only when stored as `"1"`.
    pub fn load(backend: &dyn PreferenceBackend) -> PortalResult<Self> {
        let on = |key| -> PortalResult<bool> { Ok(backend.get(key)?.as_deref() == Some("1")) };
        Ok(Self {
            text_scale: TextScale::from_stored(backend.get(PreferenceKey::TextSize)?.as_deref()),
            high_contrast: on(PreferenceKey::ContrastHigh)?,
            dark_mode: on(PreferenceKey::ThemeDark)?,
            voice_assist: on(PreferenceKey::VoiceAssist)?,
        })
    }

    pub fn stored_value(&self, key: PreferenceKey) -> String {
        match key {
            PreferenceKey::TextSize => self.text_scale.percent().to_string(),
            PreferenceKey::ContrastHigh => flag(self.high_contrast),
            PreferenceKey::ThemeDark => flag(self.dark_mode),
            PreferenceKey::VoiceAssist => flag(self.voice_assist),
        }
    }

    /// CSS classes a view puts on its body element.
    pub fn body_classes(&self) -> Vec<String> {
        let mut classes = vec![format!("a11y-text-{}", self.text_scale.percent())];
        if self.high_contrast {
            classes.push("a11y-contrast-high".to_string());
        }
        if self.dark_mode {
            classes.push("theme-dark".to_string());
        }
        classes
    }
}

/// A partial change; `None` leaves a preference as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceUpdate {
    pub text_scale: Option<TextScale>,
    pub high_contrast: Option<bool>,
    pub dark_mode: Option<bool>,
    pub voice_assist: Option<bool>,
}

impl PreferenceUpdate {
    fn apply_to(&self, prefs: &mut Preferences) -> Vec<PreferenceKey> {
        let mut changed = Vec::new();
        if let Some(v) = self.text_scale {
            prefs.text_scale = v;
            changed.push(PreferenceKey::TextSize);
        }
        if let Some(v) = self.high_contrast {
            prefs.high_contrast = v;
            changed.push(PreferenceKey::ContrastHigh);
        }
        if let Some(v) = self.dark_mode {
            prefs.dark_mode = v;
            changed.push(PreferenceKey::ThemeDark);
        }
        if let Some(v) = self.voice_assist {
            prefs.voice_assist = v;
            changed.push(PreferenceKey::VoiceAssist);
        }
        changed
    }
}

/// String key/value storage for preferences.
pub trait PreferenceBackend: Send + Sync {
    fn get(&self, key: PreferenceKey) -> PortalResult<Option<String>>;
    fn set(&self, key: PreferenceKey, value: &str) -> PortalResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<PreferenceKey, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for MemoryPreferences {
    fn get(&self, key: PreferenceKey) -> PortalResult<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }

    fn set(&self, key: PreferenceKey, value: &str) -> PortalResult<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
        Ok(())
    }
}

/// Preferences in a flat JSON object of strings, rewritten on every change.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> PortalResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let json = fs::read_to_string(&self.path).map_err(PortalError::FileRead)?;
        let values: HashMap<String, serde_json::Value> =
            serde_json::from_str(&json).map_err(PortalError::Deserialization)?;
        Ok(values
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect())
    }
}

impl PreferenceBackend for JsonFilePreferences {
    fn get(&self, key: PreferenceKey) -> PortalResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key.as_str()))
    }

    fn set(&self, key: PreferenceKey, value: &str) -> PortalResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        values.insert(key.as_str().to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(PortalError::StorageDirCreation)?;
        }
        let json = serde_json::to_string_pretty(&values).map_err(PortalError::Serialization)?;
        fs::write(&self.path, json).map_err(PortalError::FileWrite)?;
        Ok(())
    }
}

/// Shared owner of the current [`Preferences`].
pub struct SettingsStore {
    backend: Box<dyn PreferenceBackend>,
    sender: watch::Sender<Preferences>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &*self.sender.borrow())
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Load preferences from `backend` with defaults for missing keys.
    pub fn new(backend: impl PreferenceBackend + 'static) -> PortalResult<Self> {
        let initial = Preferences::load(&backend)?;
        let (sender, _) = watch::channel(initial);
        Ok(Self {
            backend: Box::new(backend),
            sender,
            write_lock: Mutex::new(()),
        })
    }

    pub fn current(&self) -> Preferences {
        *self.sender.borrow()
    }

    /// Receive every snapshot written from now on.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.sender.subscribe()
    }

    pub fn set_text_scale(&self, scale: TextScale) -> PortalResult<Preferences> {
        self.apply(PreferenceUpdate {
            text_scale: Some(scale),
            ..Default::default()
        })
    }

    pub fn set_high_contrast(&self, on: bool) -> PortalResult<Preferences> {
        self.apply(PreferenceUpdate {
            high_contrast: Some(on),
            ..Default::default()
        })
    }

    pub fn set_dark_mode(&self, on: bool) -> PortalResult<Preferences> {
        self.apply(PreferenceUpdate {
            dark_mode: Some(on),
            ..Default::default()
        })
    }

    pub fn set_voice_assist(&self, on: bool) -> PortalResult<Preferences> {
        self.apply(PreferenceUpdate {
            voice_assist: Some(on),
            ..Default::default()
        })
    }

    /// Persist the given preferences and broadcast the resulting snapshot.
    ///
    /// An empty update still broadcasts the current snapshot.
    pub fn apply(&self, update: PreferenceUpdate) -> PortalResult<Preferences> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = self.current();
        for key in update.apply_to(&mut next) {
            self.backend.set(key, &next.stored_value(key))?;
        }

        self.sender.send_replace(next);
        tracing::debug!(classes = ?next.body_classes(), "preferences updated");
        Ok(next)
    }

    /// Re-read the backend, e.g. after another process changed it, and broadcast.
    pub fn reload(&self) -> PortalResult<Preferences> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let loaded = Preferences::load(self.backend.as_ref())?;
        self.sender.send_replace(loaded);
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_nothing_stored() {
        let store = SettingsStore::new(MemoryPreferences::new()).unwrap();
        assert_eq!(store.current(), Preferences::default());
        assert_eq!(store.current().body_classes(), vec!["a11y-text-100"]);
    }

    #[test]
    fn unknown_text_size_falls_back_to_normal() {
        let backend = MemoryPreferences::new();
        backend.set(PreferenceKey::TextSize, "175").unwrap();
        backend.set(PreferenceKey::ThemeDark, "true").unwrap();

        let prefs = Preferences::load(&backend).unwrap();
        assert_eq!(prefs.text_scale, TextScale::Normal);
        assert!(!prefs.dark_mode);
    }

    #[test]
    fn writes_persist_and_compose_body_classes() {
        let store = SettingsStore::new(MemoryPreferences::new()).unwrap();
        store.set_text_scale(TextScale::ExtraLarge).unwrap();
        store.set_high_contrast(true).unwrap();
        let prefs = store.set_dark_mode(true).unwrap();

        assert_eq!(
            prefs.body_classes(),
            vec!["a11y-text-130", "a11y-contrast-high", "theme-dark"]
        );
        assert_eq!(
            store.backend.get(PreferenceKey::TextSize).unwrap().as_deref(),
            Some("130")
        );
        assert_eq!(
            store.backend.get(PreferenceKey::ContrastHigh).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn subscribers_see_every_write() {
        let store = SettingsStore::new(MemoryPreferences::new()).unwrap();
        let mut rx = store.subscribe();

        store.set_voice_assist(true).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().voice_assist);

        store.set_voice_assist(true).unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn partial_update_leaves_other_preferences() {
        let store = SettingsStore::new(MemoryPreferences::new()).unwrap();
        store.set_dark_mode(true).unwrap();

        let prefs = store
            .apply(PreferenceUpdate {
                text_scale: Some(TextScale::Large),
                ..Default::default()
            })
            .unwrap();

        assert!(prefs.dark_mode);
        assert_eq!(prefs.text_scale, TextScale::Large);
    }

    #[test]
    fn json_file_backend_survives_restart() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("preferences.json");

        let store = SettingsStore::new(JsonFilePreferences::new(&path)).unwrap();
        store.set_text_scale(TextScale::Huge).unwrap();
        store.set_voice_assist(true).unwrap();

        let reopened = SettingsStore::new(JsonFilePreferences::new(&path)).unwrap();
        assert_eq!(reopened.current().text_scale, TextScale::Huge);
        assert!(reopened.current().voice_assist);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["a11yTextSize"], "150");
        assert_eq!(raw["voiceAssist"], "1");
    }

    #[test]
    fn reload_picks_up_external_changes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("preferences.json");
        let store = SettingsStore::new(JsonFilePreferences::new(&path)).unwrap();
        let mut rx = store.subscribe();

        JsonFilePreferences::new(&path)
            .set(PreferenceKey::ThemeDark, "1")
            .unwrap();
        let prefs = store.reload().unwrap();

        assert!(prefs.dark_mode);
        assert!(rx.borrow_and_update().dark_mode);
    }

    #[test]
    fn text_scale_serializes_as_percent() {
        let prefs = Preferences {
            text_scale: TextScale::Large,
            ..Default::default()
        };
        let json = serde_json::to_value(prefs).unwrap();
        assert_eq!(json["textScale"], 115);

        let update: PreferenceUpdate =
            serde_json::from_value(serde_json::json!({ "textScale": 130 })).unwrap();
        assert_eq!(update.text_scale, Some(TextScale::ExtraLarge));
        assert!(serde_json::from_value::<PreferenceUpdate>(serde_json::json!({ "textScale": 120 }))
            .is_err());
    }
}
