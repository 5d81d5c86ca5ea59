//! Structured patching of project and plist files
//!
//! Every new file body is rendered in memory first. [`StructuredPatcher::commit`]
//! then writes each body to a temporary file next to its target and only
//! renames them into place once all of them were written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use xcversion_core::error::{ProjectError, Result};
use xcversion_core::VersionField;

use crate::index::{ConfigurationEntry, SettingOrigin};
use crate::pbxproj::PbxprojDocument;
use crate::plist::{is_build_setting_reference, PlistFieldAccessor};

/// Where a value was written for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteLocation {
    /// Build setting in a configuration object
    BuildSetting { configuration_id: String },
    /// Literal value in an Info.plist
    InfoPlist { path: PathBuf },
}

/// A (target, configuration) pair that received the new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchedEntry {
    pub target: String,
    pub configuration: String,
    pub locations: Vec<WriteLocation>,
}

#[derive(Debug)]
struct StagedFile {
    path: PathBuf,
    contents: Vec<u8>,
}

/// Collects edits for one invocation and commits them together
#[derive(Debug, Default)]
pub struct StructuredPatcher {
    staged: Vec<StagedFile>,
    touched: Vec<TouchedEntry>,
}

impl StructuredPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address `field` in every entry and stage the rewritten files
    ///
    /// Build settings are rewritten where they are defined. A project level
    /// setting that unselected targets also inherit is left alone and the
    /// value is inserted in the target's configuration instead. An entry
    /// without the setting gets one inserted when its Info.plist defers to it
    /// or is generated. Literal Info.plist values are rewritten too.
    #[instrument(skip(self, document, entries), fields(entries = entries.len()))]
    pub fn apply(
        &mut self,
        document: &mut PbxprojDocument,
        entries: &[ConfigurationEntry],
        field: VersionField,
        value: &str,
    ) -> Result<()> {
        let key = field.build_setting_key();

        for entry in entries {
            let mut locations = Vec::new();
            let plist = self.plist_state(entry, field)?;

            let configuration_id = match &entry.origin {
                SettingOrigin::Target => Some(entry.configuration_id.clone()),
                SettingOrigin::Project {
                    configuration_id,
                    shared: false,
                } => Some(configuration_id.clone()),
                SettingOrigin::Project { shared: true, .. } => {
                    Some(entry.configuration_id.clone())
                }
                SettingOrigin::Absent => match &plist {
                    PlistState::Literal(_) => None,
                    PlistState::Reference => Some(entry.configuration_id.clone()),
                    PlistState::None if entry.generates_info_plist => {
                        Some(entry.configuration_id.clone())
                    }
                    PlistState::None => None,
                },
            };

            if let Some(configuration_id) = configuration_id {
                document.set_build_setting(&configuration_id, key, value)?;
                locations.push(WriteLocation::BuildSetting { configuration_id });
            }

            if let PlistState::Literal(path) = plist {
                self.apply_plist(&path, field, value)?;
                locations.push(WriteLocation::InfoPlist { path });
            }

            if locations.is_empty() {
                debug!(
                    target_name = %entry.target,
                    configuration = %entry.configuration,
                    "no {} to write", field
                );
                continue;
            }
            self.touched.push(TouchedEntry {
                target: entry.target.clone(),
                configuration: entry.configuration.clone(),
                locations,
            });
        }

        if self.touched.is_empty() {
            return Err(ProjectError::PatchFailed {
                path: document.path().to_path_buf(),
                message: format!("no selected configuration records a {}", field),
            }
            .into());
        }

        if document.is_modified() {
            let path = document.path().to_path_buf();
            self.stage(path, document.render().into_bytes());
        }
        Ok(())
    }

    /// Stage `field = value` for one Info.plist; a path is only staged once
    pub fn apply_plist(&mut self, path: &Path, field: VersionField, value: &str) -> Result<()> {
        if self.staged.iter().any(|f| f.path == path) {
            return Ok(());
        }
        let contents = PlistFieldAccessor::render(path, field, value)?;
        self.stage(path.to_path_buf(), contents);
        Ok(())
    }

    /// Paths that `commit` will write
    pub fn staged_paths(&self) -> Vec<&Path> {
        self.staged.iter().map(|f| f.path.as_path()).collect()
    }

    /// Entries that received the value
    pub fn touched(&self) -> &[TouchedEntry] {
        &self.touched
    }

    /// Write every staged file
    ///
    /// All temporary files are written before the first rename. A failure
    /// before that point leaves every original untouched; temporary files are
    /// removed when dropped.
    #[instrument(skip(self), fields(files = self.staged.len()))]
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut pending = Vec::with_capacity(self.staged.len());
        for file in &self.staged {
            pending.push((file.path.clone(), write_temp(&file.path, &file.contents)?));
        }

        let mut written = Vec::with_capacity(pending.len());
        for (path, temp) in pending {
            temp.persist(&path).map_err(|e| ProjectError::PatchFailed {
                path: path.clone(),
                message: e.error.to_string(),
            })?;
            info!(path = %path.display(), "updated");
            written.push(path);
        }
        Ok(written)
    }

    fn stage(&mut self, path: PathBuf, contents: Vec<u8>) {
        debug!(path = %path.display(), bytes = contents.len(), "staged");
        self.staged.retain(|f| f.path != path);
        self.staged.push(StagedFile { path, contents });
    }

    fn plist_state(&self, entry: &ConfigurationEntry, field: VersionField) -> Result<PlistState> {
        let Some(reference) = &entry.info_plist else {
            return Ok(PlistState::None);
        };
        if !reference.path.is_file() {
            warn!(
                target_name = %entry.target,
                path = %reference.path.display(),
                "Info.plist not found, skipping"
            );
            return Ok(PlistState::None);
        }
        Ok(match PlistFieldAccessor::try_read(&reference.path, field)? {
            Some(value) if is_build_setting_reference(&value) => PlistState::Reference,
            Some(_) => PlistState::Literal(reference.path.clone()),
            None => PlistState::None,
        })
    }
}

enum PlistState {
    /// No plist or no key
    None,
    /// The plist defers to the build setting
    Reference,
    /// The plist keeps its own copy
    Literal(PathBuf),
}

fn write_temp(path: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }
    Ok(temp)
}

/// Replace one file through a temporary sibling
pub(crate) fn persist(path: &Path, contents: &[u8]) -> Result<()> {
    let temp = write_temp(path, contents)?;
    temp.persist(path).map_err(|e| ProjectError::PatchFailed {
        path: path.to_path_buf(),
        message: e.error.to_string(),
    })?;
    Ok(())
}
