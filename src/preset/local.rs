//! Local presets: one YAML file per kind under a preset directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use super::{Preset, PresetDraft, PresetError, PresetKind, PresetSource};

/// `~/.eartrain/presets`, or `./.eartrain/presets` without a home directory.
pub fn default_preset_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".eartrain");
    path.push("presets");
    path
}

#[derive(Debug, Clone)]
pub struct LocalPresetStore {
    dir: PathBuf,
}

impl LocalPresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding presets of `kind`.
    pub fn path(&self, kind: PresetKind) -> PathBuf {
        self.dir.join(format!("{}_presets_local.yaml", kind.key()))
    }

    /// Presets in save order. A missing file is an empty list.
    pub fn load(&self, kind: PresetKind) -> Result<Vec<Preset>, PresetError> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, kind: PresetKind, draft: PresetDraft) -> Result<Preset, PresetError> {
        let mut presets = self.load(kind)?;
        let now = Utc::now();
        let preset = draft.into_preset(new_local_id(now.timestamp_millis()), now, PresetSource::Local);
        presets.push(preset.clone());
        self.write(kind, &presets)?;
        Ok(preset)
    }

    /// Remove the preset with `id`. Returns whether it existed.
    pub fn delete(&self, kind: PresetKind, id: &str) -> Result<bool, PresetError> {
        let mut presets = self.load(kind)?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() == before {
            return Ok(false);
        }
        self.write(kind, &presets)?;
        tracing::info!(%kind, id, "local preset deleted");
        Ok(true)
    }

    fn write(&self, kind: PresetKind, presets: &[Preset]) -> Result<(), PresetError> {
        std::fs::create_dir_all(&self.dir)?;
        let yaml = serde_yaml::to_string(presets)?;
        std::fs::write(self.path(kind), yaml)?;
        Ok(())
    }
}

/// `local-<millis>-<9 base36 chars>`.
fn new_local_id(millis: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
        .collect();
    format!("local-{millis}-{suffix}")
}
