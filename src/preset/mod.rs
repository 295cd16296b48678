//! Presets — named, timestamped rhythm snapshots from three sources.
//!
//! Built-in presets ship with the crate. Local presets live in one YAML file
//! per kind. Global presets sit in a shared append-only collection behind a
//! credential check.

pub mod global;
pub mod local;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rhythm::{CellState, RhythmPattern, Tempo};

pub use global::{GlobalPresetStore, MemoryGlobalStore};
#[cfg(feature = "remote")]
pub use global::HttpGlobalStore;
pub use local::{default_preset_dir, LocalPresetStore};

/// Credential expected for global saves unless configured otherwise.
pub const DEFAULT_GLOBAL_CREDENTIAL: &str = "CAGED";

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("incorrect credential")]
    CredentialRejected,
    #[error("preset name is empty")]
    EmptyName,
    #[error("no global preset store configured")]
    NotConfigured,
    #[error("preset storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preset file is malformed: {0}")]
    Format(#[from] serde_yaml::Error),
    #[error("remote preset store: {0}")]
    Remote(String),
}

/// Which editor a preset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresetKind {
    AdvancedSubdivisions,
    RhythmExplorer,
}

impl PresetKind {
    pub const ALL: [PresetKind; 2] = [PresetKind::AdvancedSubdivisions, PresetKind::RhythmExplorer];

    /// Storage key.
    pub fn key(self) -> &'static str {
        match self {
            PresetKind::AdvancedSubdivisions => "advancedSubdivisions",
            PresetKind::RhythmExplorer => "rhythmExplorer",
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PresetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        match key.to_ascii_lowercase().as_str() {
            "advancedsubdivisions" | "advanced" => Ok(PresetKind::AdvancedSubdivisions),
            "rhythmexplorer" | "explorer" => Ok(PresetKind::RhythmExplorer),
            _ => Err(format!("unknown preset kind '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetSource {
    BuiltIn,
    Local,
    Global,
}

/// A stored preset. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub source: PresetSource,
    pub bpm: Tempo,
    pub pattern: RhythmPattern,
}

/// What the user asks to save.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetDraft {
    pub name: String,
    pub bpm: Tempo,
    pub pattern: RhythmPattern,
}

impl PresetDraft {
    pub fn new(name: impl Into<String>, bpm: Tempo, pattern: RhythmPattern) -> Self {
        Self {
            name: name.into(),
            bpm,
            pattern,
        }
    }

    fn into_preset(self, id: String, created_at: DateTime<Utc>, source: PresetSource) -> Preset {
        Preset {
            id,
            name: self.name,
            created_at,
            source,
            bpm: self.bpm,
            pattern: self.pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveScope {
    Local,
    Global { credential: String },
}

/// Presets of one kind, grouped by source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetCollections {
    pub built_in: Vec<Preset>,
    pub local: Vec<Preset>,
    /// Newest first.
    pub global: Vec<Preset>,
}

impl PresetCollections {
    /// Built-in, then global, then local.
    pub fn all(&self) -> impl Iterator<Item = &Preset> {
        self.built_in.iter().chain(&self.global).chain(&self.local)
    }

    pub fn find(&self, id_or_name: &str) -> Option<&Preset> {
        self.all()
            .find(|p| p.id == id_or_name)
            .or_else(|| self.all().find(|p| p.name.eq_ignore_ascii_case(id_or_name)))
    }

    pub fn len(&self) -> usize {
        self.built_in.len() + self.local.len() + self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Presets shipped with the crate.
pub fn built_in(kind: PresetKind) -> Vec<Preset> {
    let entries: &[(&str, &str, &str, u32)] = match kind {
        PresetKind::AdvancedSubdivisions => &[
            ("builtin-quarters", "Quarter notes", "A A A A", 90),
            ("builtin-eighths", "Eighth notes", "AS AS AS AS", 90),
            ("builtin-triplets", "Triplets", "ASS ASS ASS ASS", 80),
            ("builtin-sixteenths", "Sixteenths", "ASSS ASSS ASSS ASSS", 70),
            ("builtin-clave", "Son clave", "A.N. .N.. N.N. ....", 100),
        ],
        PresetKind::RhythmExplorer => &[
            ("builtin-four", "Four on the floor", "N N N N", 90),
            ("builtin-waltz", "Waltz", "N N N", 90),
            ("builtin-offbeat", "Offbeats", ".N .N .N .N", 100),
        ],
    };
    let fill = match kind {
        PresetKind::AdvancedSubdivisions => None,
        PresetKind::RhythmExplorer => Some(CellState::Normal),
    };
    entries
        .iter()
        .filter_map(|&(id, name, notation, bpm)| {
            let mut pattern: RhythmPattern = notation.parse().ok()?;
            if let Some(state) = fill {
                pattern = pattern.with_uniform_fill(state);
            }
            Some(Preset {
                id: id.to_string(),
                name: name.to_string(),
                created_at: DateTime::<Utc>::default(),
                source: PresetSource::BuiltIn,
                bpm: Tempo::clamped(bpm),
                pattern,
            })
        })
        .collect()
}

/// Front door for saving and listing presets of every source.
pub struct PresetStore {
    local: LocalPresetStore,
    global: Option<Box<dyn GlobalPresetStore>>,
    credential: String,
}

impl PresetStore {
    pub fn new(local_dir: impl Into<PathBuf>) -> Self {
        Self {
            local: LocalPresetStore::new(local_dir),
            global: None,
            credential: DEFAULT_GLOBAL_CREDENTIAL.to_string(),
        }
    }

    /// Attach a shared store; global saves must present `credential`.
    pub fn with_global(mut self, store: Box<dyn GlobalPresetStore>, credential: impl Into<String>) -> Self {
        self.global = Some(store);
        self.credential = credential.into();
        self
    }

    pub fn local(&self) -> &LocalPresetStore {
        &self.local
    }

    pub fn save(&mut self, kind: PresetKind, draft: PresetDraft, scope: SaveScope) -> Result<Preset, PresetError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        let draft = PresetDraft {
            name: name.to_string(),
            ..draft
        };

        let preset = match scope {
            SaveScope::Local => self.local.save(kind, draft)?,
            SaveScope::Global { credential } => {
                if credential != self.credential {
                    tracing::warn!(%kind, "global save rejected: incorrect credential");
                    return Err(PresetError::CredentialRejected);
                }
                let store = self.global.as_mut().ok_or(PresetError::NotConfigured)?;
                store.append(kind, draft, Utc::now())?
            }
        };
        tracing::info!(%kind, id = %preset.id, name = %preset.name, source = ?preset.source, "preset saved");
        Ok(preset)
    }

    /// Every preset of `kind`. A failing source is logged and comes back empty.
    pub fn list(&self, kind: PresetKind) -> PresetCollections {
        let local = self.local.load(kind).unwrap_or_else(|err| {
            tracing::warn!(%kind, %err, "local presets unavailable");
            Vec::new()
        });
        let mut global = match &self.global {
            Some(store) => store.list(kind).unwrap_or_else(|err| {
                tracing::warn!(%kind, %err, "global presets unavailable");
                Vec::new()
            }),
            None => Vec::new(),
        };
        global.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        PresetCollections {
            built_in: built_in(kind),
            local,
            global,
        }
    }

    /// Remove a local preset. Returns whether anything was removed.
    pub fn delete_local(&self, kind: PresetKind, id: &str) -> Result<bool, PresetError> {
        self.local.delete(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> PresetDraft {
        PresetDraft::new(name, Tempo::clamped(100), "ASS AN".parse().unwrap())
    }

    fn store(dir: &std::path::Path) -> PresetStore {
        PresetStore::new(dir).with_global(Box::new(MemoryGlobalStore::new()), DEFAULT_GLOBAL_CREDENTIAL)
    }

    #[test]
    fn kinds_round_trip() {
        for kind in PresetKind::ALL {
            assert_eq!(kind.key().parse::<PresetKind>().unwrap(), kind);
        }
        assert!("drums".parse::<PresetKind>().is_err());
    }

    #[test]
    fn built_ins_parse() {
        assert_eq!(built_in(PresetKind::AdvancedSubdivisions).len(), 5);
        let explorer = built_in(PresetKind::RhythmExplorer);
        assert_eq!(explorer.len(), 3);
        assert!(explorer
            .iter()
            .all(|p| p.source == PresetSource::BuiltIn && p.pattern.fill() == crate::rhythm::FillPolicy::Uniform(CellState::Normal)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        let err = s.save(PresetKind::AdvancedSubdivisions, draft("   "), SaveScope::Local);
        assert!(matches!(err, Err(PresetError::EmptyName)));
    }

    #[test]
    fn wrong_credential_is_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        let err = s.save(
            PresetKind::AdvancedSubdivisions,
            draft("Mine"),
            SaveScope::Global {
                credential: "caged".into(),
            },
        );
        assert!(matches!(err, Err(PresetError::CredentialRejected)));
        assert!(s.list(PresetKind::AdvancedSubdivisions).global.is_empty());
    }

    #[test]
    fn global_without_store_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = PresetStore::new(dir.path());
        let err = s.save(
            PresetKind::RhythmExplorer,
            draft("Mine"),
            SaveScope::Global {
                credential: DEFAULT_GLOBAL_CREDENTIAL.into(),
            },
        );
        assert!(matches!(err, Err(PresetError::NotConfigured)));
    }

    #[test]
    fn all_orders_builtin_global_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        let kind = PresetKind::AdvancedSubdivisions;
        s.save(kind, draft("local one"), SaveScope::Local).unwrap();
        s.save(
            kind,
            draft("global one"),
            SaveScope::Global {
                credential: "CAGED".into(),
            },
        )
        .unwrap();

        let lists = s.list(kind);
        let sources: Vec<PresetSource> = lists.all().map(|p| p.source).collect();
        let first_global = sources.iter().position(|s| *s == PresetSource::Global).unwrap();
        let first_local = sources.iter().position(|s| *s == PresetSource::Local).unwrap();
        assert!(sources[..first_global].iter().all(|s| *s == PresetSource::BuiltIn));
        assert!(first_global < first_local);
        assert_eq!(lists.find("global one").unwrap().source, PresetSource::Global);
    }

    #[test]
    fn name_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        let p = s
            .save(PresetKind::RhythmExplorer, draft("  Groove  "), SaveScope::Local)
            .unwrap();
        assert_eq!(p.name, "Groove");
    }
}
