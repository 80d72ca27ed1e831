//! Named lens presets: `(enabled, x_key, y_key, y2_key)` tuples.
//!
//! `default` and `custom` always exist. `custom` holds the unnamed working
//! tuple the selection demotes to whenever a field is edited while a named
//! preset is active.

use crate::lens::X_TICK;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_ID: &str = "default";
pub const CUSTOM_ID: &str = "custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensPreset {
    pub enabled: bool,
    pub x_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2_key: Option<String>,
}

impl Default for LensPreset {
    fn default() -> LensPreset {
        LensPreset {
            enabled: false,
            x_key: X_TICK.to_string(),
            y_key: None,
            y2_key: None,
        }
    }
}

/// Opaquely persisted preset config (persistence mechanism out of scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetConfig {
    pub active_id: String,
    pub presets: BTreeMap<String, LensPreset>,
}

#[derive(Debug)]
pub struct PresetTable {
    active: String,
    presets: BTreeMap<String, LensPreset>,
}

impl Default for PresetTable {
    fn default() -> PresetTable {
        let mut presets = BTreeMap::new();
        presets.insert(DEFAULT_ID.to_string(), LensPreset::default());
        presets.insert(CUSTOM_ID.to_string(), LensPreset::default());
        PresetTable {
            active: DEFAULT_ID.to_string(),
            presets,
        }
    }
}

impl PresetTable {
    pub fn active_id(&self) -> &str {
        &self.active
    }

    pub fn active_preset(&self) -> &LensPreset {
        // Both reserved entries always exist; fall back to default.
        self.presets
            .get(&self.active)
            .or_else(|| self.presets.get(DEFAULT_ID))
            .unwrap_or(&FALLBACK)
    }

    pub fn get(&self, id: &str) -> Option<&LensPreset> {
        self.presets.get(id)
    }

    pub fn set_active(&mut self, id: &str) {
        if self.presets.contains_key(id) {
            self.active = id.to_string();
        }
    }

    /// Record the working tuple under `custom` and make it the selection.
    pub fn demote(&mut self, tuple: LensPreset) {
        self.presets.insert(CUSTOM_ID.to_string(), tuple);
        self.active = CUSTOM_ID.to_string();
    }

    pub fn save(&mut self, name: &str, tuple: LensPreset) {
        self.presets.insert(name.to_string(), tuple);
        self.active = name.to_string();
    }

    /// Deleting `default` or `custom` is rejected. Deleting the active
    /// preset demotes the selection to `custom` holding `current`.
    pub fn delete(&mut self, name: &str, current: LensPreset) -> bool {
        if name == DEFAULT_ID || name == CUSTOM_ID {
            return false;
        }
        if self.presets.remove(name).is_none() {
            return false;
        }
        if self.active == name {
            self.demote(current);
        }
        true
    }

    /// Replace the whole table, re-seeding the reserved entries if the
    /// incoming map lacks them.
    pub fn replace(&mut self, presets: BTreeMap<String, LensPreset>) {
        self.presets = presets;
        self.presets
            .entry(DEFAULT_ID.to_string())
            .or_insert_with(LensPreset::default);
        self.presets
            .entry(CUSTOM_ID.to_string())
            .or_insert_with(LensPreset::default);
        if !self.presets.contains_key(&self.active) {
            self.active = DEFAULT_ID.to_string();
        }
    }

    pub fn export(&self) -> PresetConfig {
        PresetConfig {
            active_id: self.active.clone(),
            presets: self.presets.clone(),
        }
    }
}

static FALLBACK: LensPreset = LensPreset {
    enabled: false,
    x_key: String::new(),
    y_key: None,
    y2_key: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::{Lens, X_INDEX};

    #[test]
    fn unknown_preset_selection_is_a_no_op() {
        let mut lens = Lens::default();
        lens.set_x_key(X_INDEX);
        let before = lens.x_key().to_string();

        assert!(!lens.select_preset("nope"));
        assert_eq!(lens.x_key(), before);
        assert_eq!(lens.active_preset_id(), CUSTOM_ID);
    }

    #[test]
    fn selection_is_transactional() {
        let mut lens = Lens::default();
        lens.set_enabled(true);
        lens.set_y_key(Some("u".to_string()));
        lens.set_y2_key(Some("v".to_string()));
        lens.save_preset("speed");

        lens.select_preset(DEFAULT_ID);
        assert!(!lens.enabled());
        assert_eq!(lens.y_key(), None);
        assert_eq!(lens.y2_key(), None);

        lens.select_preset("speed");
        assert!(lens.enabled());
        assert_eq!(lens.y_key(), Some("u"));
        assert_eq!(lens.y2_key(), Some("v"));
    }

    #[test]
    fn editing_a_field_demotes_to_custom() {
        let mut lens = Lens::default();
        lens.save_preset("mine");
        assert_eq!(lens.active_preset_id(), "mine");

        lens.set_enabled(true);
        assert_eq!(lens.active_preset_id(), CUSTOM_ID);
    }

    #[test]
    fn saving_over_an_existing_name_overwrites() {
        let mut lens = Lens::default();
        lens.set_y_key(Some("a".to_string()));
        lens.save_preset("p");

        lens.set_y_key(Some("b".to_string()));
        lens.save_preset("p");

        lens.select_preset(DEFAULT_ID);
        lens.select_preset("p");
        assert_eq!(lens.y_key(), Some("b"));
    }

    #[test]
    fn reserved_presets_cannot_be_deleted() {
        let mut lens = Lens::default();
        assert!(!lens.delete_preset(DEFAULT_ID));
        assert!(!lens.delete_preset(CUSTOM_ID));

        lens.save_preset("gone");
        assert!(lens.delete_preset("gone"));
        assert!(!lens.delete_preset("gone"));
        assert_eq!(lens.active_preset_id(), CUSTOM_ID);
    }

    #[test]
    fn config_round_trips_and_ignores_unknown_active() {
        let mut lens = Lens::default();
        lens.set_enabled(true);
        lens.set_y_key(Some("u".to_string()));
        lens.save_preset("speed");

        let exported = lens.export_presets();
        let json = serde_json::to_string(&exported).unwrap();

        let mut fresh = Lens::default();
        fresh.import_presets(serde_json::from_str(&json).unwrap());
        assert_eq!(fresh.active_preset_id(), "speed");
        assert_eq!(fresh.y_key(), Some("u"));

        let mut bad = exported.clone();
        bad.active_id = "missing".to_string();
        let mut other = Lens::default();
        other.import_presets(bad);
        assert_eq!(other.active_preset_id(), DEFAULT_ID);
    }
}
