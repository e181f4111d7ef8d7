// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sound name resolution.
//!
//! A [`SoundRegistry`] turns a sound name into a playable [`SoundEntry`]. It
//! holds three layers, searched in strict order:
//!
//! 1. **custom**: entries added with [`register`](SoundRegistry::register).
//! 2. **manifest**: entries from a remote [`Manifest`], replaced as a whole by
//!    [`apply_manifest`](SoundRegistry::apply_manifest).
//! 3. **builtin**: the static 13-sound catalog.
//!
//! If every layer misses and the name looks like a URL (`http://`,
//! `https://`, or a leading `/`), the name itself is the URL. Builtin and
//! manifest files are resolved against the CDN base.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::{String, ToString as _};
use alloc::vec::Vec;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::category::EventCategory;
use crate::error::ManifestError;
use crate::fetch::Fetcher;

/// Version reported when no manifest has been loaded.
pub const REGISTRY_VERSION: &str = "1.0.0";

/// CDN hosting the builtin sound files.
pub const DEFAULT_CDN_BASE: &str = "https://cdn.jsdelivr.net/gh/zahinafsar/uispeaker@main/sounds";

/// A resolved sound: where to fetch it and what it is for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoundEntry {
    /// Absolute or page-relative URL of the audio file.
    pub url: String,
    /// Event this sound is designed for.
    pub default_event: Option<EventCategory>,
    /// Grouping label used by documentation.
    pub category: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Approximate duration in seconds.
    pub duration: Option<f64>,
}

impl SoundEntry {
    /// Creates an entry with only a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A builtin catalog entry, before URL resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuiltinSoundDef {
    /// File name relative to the CDN base.
    pub file: &'static str,
    /// Event this sound is designed for.
    pub default_event: EventCategory,
    /// Grouping label.
    pub category: &'static str,
    /// Human-readable description.
    pub description: Option<&'static str>,
    /// Approximate duration in seconds.
    pub duration: Option<f64>,
}

const fn builtin(
    file: &'static str,
    default_event: EventCategory,
    category: &'static str,
    description: &'static str,
    duration: f64,
) -> BuiltinSoundDef {
    BuiltinSoundDef {
        file,
        default_event,
        category,
        description: Some(description),
        duration: Some(duration),
    }
}

/// The builtin catalog, sorted by name.
#[rustfmt::skip]
pub const BUILTIN_SOUNDS: [(&str, BuiltinSoundDef); 13] = [
    ("click", builtin("click.mp3", EventCategory::Click, "click", "Short digital click for buttons and links", 0.5)),
    ("close", builtin("close.mp3", EventCategory::Close, "toggle", "Closing tone for dismissing UI elements", 1.1)),
    ("error", builtin("error.mp3", EventCategory::Error, "notification", "Alert tone for error notifications", 2.7)),
    ("hover", builtin("hover.mp3", EventCategory::Hover, "hover", "Subtle swoosh for hover interactions", 1.1)),
    ("keystroke", builtin("keystroke.mp3", EventCategory::Input, "input", "Single key press for text input feedback", 0.9)),
    ("open", builtin("open.mp3", EventCategory::Open, "toggle", "Opening tone for dropdowns, dialogs, and popups", 2.0)),
    ("pop", builtin("pop.mp3", EventCategory::Click, "click", "Bubble pop for playful interactions", 2.2)),
    ("slide", builtin("slide.mp3", EventCategory::Mousemove, "mousemove", "Smooth slide for continuous mouse movement", 1.0)),
    ("success", builtin("success.mp3", EventCategory::Success, "notification", "Positive chime for success notifications", 2.7)),
    ("swoosh", builtin("swoosh.mp3", EventCategory::Hover, "hover", "Pronounced swoosh for emphasis on hover", 2.6)),
    ("tap", builtin("tap.mp3", EventCategory::Click, "click", "Soft tap for toggles and checkboxes", 2.5)),
    ("typewriter", builtin("typewriter.mp3", EventCategory::Input, "input", "Mechanical typewriter key for vintage feel", 0.5)),
    ("warning", builtin("warning.mp3", EventCategory::Warning, "notification", "Cautionary beep for warning notifications", 0.8)),
];

fn builtin_def(name: &str) -> Option<&'static BuiltinSoundDef> {
    BUILTIN_SOUNDS
        .binary_search_by(|(n, _)| (*n).cmp(name))
        .ok()
        .map(|i| &BUILTIN_SOUNDS[i].1)
}

/// A remote registry document (`registry.json`).
#[derive(Clone, Debug, Deserialize)]
pub struct Manifest {
    /// Manifest version string.
    pub version: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Sound definitions by name.
    pub sounds: BTreeMap<String, ManifestSound>,
}

/// One sound in a [`Manifest`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSound {
    /// File name relative to the CDN base.
    pub file: String,
    /// Designed-for event; `None` when missing or not a known category.
    #[serde(default, deserialize_with = "lenient_category")]
    pub default_event: Option<EventCategory>,
    /// Grouping label; missing means `"other"`.
    #[serde(default)]
    pub category: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Approximate duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Where the recording came from.
    #[serde(default)]
    pub source: Option<String>,
    /// License of the recording.
    #[serde(default)]
    pub license: Option<String>,
}

/// Reads an optional category, mapping any unrecognized value to `None`.
fn lenient_category<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EventCategory>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Known(EventCategory),
        Unknown(IgnoredAny),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Known(category)) => Some(category),
        Some(Lenient::Unknown(_)) | None => None,
    })
}

impl Manifest {
    /// Parses a manifest from a JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ManifestError> {
        core::str::from_utf8(body).map_err(|_| ManifestError::Encoding)?;
        serde_json::from_slice(body).map_err(ManifestError::Parse)
    }
}

/// Fetches and parses a manifest.
pub async fn fetch_manifest<F: Fetcher>(
    fetcher: &F,
    url: &str,
) -> Result<Manifest, ManifestError> {
    let body = fetcher.fetch(url).await?;
    Manifest::from_slice(&body)
}

/// A manifest entry after defaults are applied.
#[derive(Clone, Debug, PartialEq)]
struct ManifestDef {
    file: String,
    default_event: EventCategory,
    category: String,
    description: Option<String>,
    duration: Option<f64>,
}

impl From<ManifestSound> for ManifestDef {
    fn from(sound: ManifestSound) -> Self {
        Self {
            file: sound.file,
            default_event: sound.default_event.unwrap_or(EventCategory::Click),
            category: sound.category.unwrap_or_else(|| "other".into()),
            description: sound.description,
            duration: sound.duration,
        }
    }
}

/// Layered name → sound resolution.
#[derive(Clone, Debug)]
pub struct SoundRegistry {
    cdn_base: String,
    custom: BTreeMap<String, SoundEntry>,
    manifest: BTreeMap<String, ManifestDef>,
    manifest_version: Option<String>,
}

impl Default for SoundRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_BASE)
    }
}

impl SoundRegistry {
    /// Creates a registry resolving files against `cdn_base`.
    ///
    /// An empty base selects [`DEFAULT_CDN_BASE`].
    #[must_use]
    pub fn new(cdn_base: &str) -> Self {
        let base = if cdn_base.is_empty() {
            DEFAULT_CDN_BASE
        } else {
            cdn_base
        };
        Self {
            cdn_base: normalize_base(base),
            custom: BTreeMap::new(),
            manifest: BTreeMap::new(),
            manifest_version: None,
        }
    }

    /// Resolves `name` through custom, manifest, builtin, then URL fallback.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<SoundEntry> {
        if let Some(entry) = self.custom.get(name) {
            return Some(entry.clone());
        }
        if let Some(def) = self.manifest.get(name) {
            return Some(SoundEntry {
                url: self.file_url(&def.file),
                default_event: Some(def.default_event),
                category: Some(def.category.clone()),
                description: def.description.clone(),
                duration: def.duration,
            });
        }
        if let Some(def) = builtin_def(name) {
            return Some(SoundEntry {
                url: self.file_url(def.file),
                default_event: Some(def.default_event),
                category: Some(def.category.to_string()),
                description: def.description.map(Into::into),
                duration: def.duration,
            });
        }
        looks_like_url(name).then(|| SoundEntry::new(name))
    }

    /// Adds or replaces a custom sound.
    pub fn register(&mut self, name: impl Into<String>, entry: SoundEntry) {
        self.custom.insert(name.into(), entry);
    }

    /// Removes a custom sound, returning whether it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.custom.remove(name).is_some()
    }

    /// Replaces the manifest layer and version with `manifest`.
    pub fn apply_manifest(&mut self, manifest: Manifest) {
        self.manifest = manifest
            .sounds
            .into_iter()
            .map(|(name, sound)| (name, ManifestDef::from(sound)))
            .collect();
        self.manifest_version = Some(manifest.version);
    }

    /// Returns every known name across all layers, sorted and deduplicated.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let names: BTreeSet<&str> = BUILTIN_SOUNDS
            .iter()
            .map(|(name, _)| *name)
            .chain(self.manifest.keys().map(String::as_str))
            .chain(self.custom.keys().map(String::as_str))
            .collect();
        names.into_iter().map(String::from).collect()
    }

    /// Returns every listed name with its resolved entry.
    #[must_use]
    pub fn list_detailed(&self) -> Vec<(String, SoundEntry)> {
        self.list()
            .into_iter()
            .filter_map(|name| {
                let entry = self.resolve(&name)?;
                Some((name, entry))
            })
            .collect()
    }

    /// Returns the manifest version, or [`REGISTRY_VERSION`] if none loaded.
    #[must_use]
    pub fn version(&self) -> &str {
        self.manifest_version.as_deref().unwrap_or(REGISTRY_VERSION)
    }

    /// Sets the base URL for builtin and manifest files.
    pub fn set_cdn_base(&mut self, base: &str) {
        self.cdn_base = normalize_base(base);
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn cdn_base(&self) -> &str {
        &self.cdn_base
    }

    fn file_url(&self, file: &str) -> String {
        format!("{}/{file}", self.cdn_base)
    }
}

fn normalize_base(base: &str) -> String {
    base.trim_end_matches('/').into()
}

fn looks_like_url(name: &str) -> bool {
    name.starts_with("http://") || name.starts_with("https://") || name.starts_with('/')
}
