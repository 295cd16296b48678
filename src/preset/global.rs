//! Shared preset collections: append-only, listed newest first.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{Preset, PresetDraft, PresetError, PresetKind, PresetSource};

/// An append-only collection of presets shared between users.
pub trait GlobalPresetStore {
    /// Store `draft` and return it with the id the collection assigned.
    fn append(&mut self, kind: PresetKind, draft: PresetDraft, created_at: DateTime<Utc>) -> Result<Preset, PresetError>;

    /// All presets of `kind`, newest first.
    fn list(&self, kind: PresetKind) -> Result<Vec<Preset>, PresetError>;
}

/// In-process collection for tests and offline use.
#[derive(Debug, Default)]
pub struct MemoryGlobalStore {
    collections: HashMap<PresetKind, Vec<Preset>>,
    next_id: u64,
}

impl MemoryGlobalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlobalPresetStore for MemoryGlobalStore {
    fn append(&mut self, kind: PresetKind, draft: PresetDraft, created_at: DateTime<Utc>) -> Result<Preset, PresetError> {
        self.next_id += 1;
        let preset = draft.into_preset(format!("global-{}", self.next_id), created_at, PresetSource::Global);
        self.collections.entry(kind).or_default().push(preset.clone());
        Ok(preset)
    }

    fn list(&self, kind: PresetKind) -> Result<Vec<Preset>, PresetError> {
        let mut presets = self.collections.get(&kind).cloned().unwrap_or_default();
        presets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(presets)
    }
}

/// Collection served over HTTP at `<base_url>/<kind>_presets_global`.
///
/// `GET` returns a JSON array of presets; `POST` takes one preset without an
/// id and answers `{"id": "..."}`.
#[cfg(feature = "remote")]
pub struct HttpGlobalStore {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpGlobalStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url(&self, kind: PresetKind) -> String {
        format!("{}/{}_presets_global", self.base_url, kind.key())
    }
}

#[cfg(feature = "remote")]
#[derive(serde::Deserialize)]
struct Created {
    id: String,
}

#[cfg(feature = "remote")]
impl GlobalPresetStore for HttpGlobalStore {
    fn append(&mut self, kind: PresetKind, draft: PresetDraft, created_at: DateTime<Utc>) -> Result<Preset, PresetError> {
        let mut preset = draft.into_preset(String::new(), created_at, PresetSource::Global);
        let mut body = serde_json::to_value(&preset).map_err(|e| PresetError::Remote(e.to_string()))?;
        if let Some(obj) = body.as_object_mut() {
            obj.remove("id");
        }
        let created: Created = self
            .client
            .post(self.url(kind))
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| PresetError::Remote(e.to_string()))?;
        preset.id = created.id;
        Ok(preset)
    }

    fn list(&self, kind: PresetKind) -> Result<Vec<Preset>, PresetError> {
        let mut presets: Vec<Preset> = self
            .client
            .get(self.url(kind))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| PresetError::Remote(e.to_string()))?;
        for p in &mut presets {
            p.source = PresetSource::Global;
        }
        presets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(presets)
    }
}
