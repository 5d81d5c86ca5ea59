//! End-to-end read and bump operations
//!
//! Both operations locate the project, narrow it to the requested target,
//! configuration and scheme, and read the field from every selected entry.
//! A bump then resolves the new value and patches every entry with it.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument};
use xcversion_core::error::Result;
use xcversion_core::{BaselinePolicy, SharedValues, VersionField, VersionSourceKind};
use xcversion_stores::VersionSource;

use crate::index::{ConfigurationEntry, ConfigurationIndex, IndexFilter};
use crate::patcher::{StructuredPatcher, TouchedEntry};
use crate::pbxproj::PbxprojDocument;
use crate::plist::{is_build_setting_reference, PlistFieldAccessor};
use crate::project::XcodeProject;
use crate::resolver::{BumpRequest, BumpResolver};
use crate::scheme::Scheme;

/// Which project and which part of it
#[derive(Debug, Clone, Default)]
pub struct ProjectSelection {
    /// `.xcodeproj` or `project.pbxproj`; searched in `cwd` when absent
    pub project: Option<PathBuf>,
    pub cwd: PathBuf,
    pub target: Option<String>,
    pub configuration: Option<String>,
    pub scheme: Option<String>,
}

/// Where an entry's current value was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueLocation {
    BuildSetting,
    InfoPlist { path: PathBuf },
    Missing,
}

/// Current value of one (target, configuration) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReading {
    pub target: String,
    pub configuration: String,
    pub value: Option<String>,
    pub location: ValueLocation,
}

/// Result of [`get`]
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub field: VersionField,
    pub value: String,
    pub project: PathBuf,
    pub entries: Vec<EntryReading>,
}

/// Options for [`bump`]
#[derive(Debug, Clone)]
pub struct BumpOptions {
    pub selection: ProjectSelection,
    pub request: BumpRequest,
    /// Resolve and report without writing
    pub dry_run: bool,
}

/// Result of [`bump`]
#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    pub field: VersionField,
    pub previous: Option<String>,
    pub value: String,
    pub project: PathBuf,
    /// Files written, or that would be written on a dry run
    pub files: Vec<PathBuf>,
    pub entries: Vec<TouchedEntry>,
    pub dry_run: bool,
}

impl BumpOutcome {
    /// Values for downstream steps
    pub fn shared_values(&self) -> SharedValues {
        let mut values = SharedValues::new();
        values.publish(self.field, &self.value);
        values
    }
}

struct Opened {
    project: XcodeProject,
    document: PbxprojDocument,
    index: ConfigurationIndex,
}

fn open(selection: &ProjectSelection, field: VersionField) -> Result<Opened> {
    let project = XcodeProject::locate(selection.project.as_deref(), &selection.cwd)?;
    let document = project.load_document()?;

    let scheme_targets = match &selection.scheme {
        Some(name) => Some(Scheme::find(&project, name)?.target_ids(&project)?),
        None => None,
    };
    let filter = IndexFilter {
        target: selection.target.as_deref(),
        configuration: selection.configuration.as_deref(),
        scheme_targets: scheme_targets.as_deref(),
    };
    let index = ConfigurationIndex::build(&document, &project.source_root(), field, filter)?;

    Ok(Opened {
        project,
        document,
        index,
    })
}

/// Current value per entry: the build setting, else a literal Info.plist value
fn read_entries(entries: &[ConfigurationEntry], field: VersionField) -> Result<Vec<EntryReading>> {
    let mut readings = Vec::with_capacity(entries.len());
    for entry in entries {
        let (value, location) = match &entry.value {
            Some(value) => (Some(value.clone()), ValueLocation::BuildSetting),
            None => match entry.info_plist.as_ref().filter(|p| p.path.is_file()) {
                Some(plist) => match PlistFieldAccessor::try_read(&plist.path, field)? {
                    Some(value) if !is_build_setting_reference(&value) => (
                        Some(value),
                        ValueLocation::InfoPlist {
                            path: plist.path.clone(),
                        },
                    ),
                    _ => (None, ValueLocation::Missing),
                },
                None => (None, ValueLocation::Missing),
            },
        };
        readings.push(EntryReading {
            target: entry.target.clone(),
            configuration: entry.configuration.clone(),
            value,
            location,
        });
    }
    Ok(readings)
}

fn recorded(readings: &[EntryReading]) -> Vec<String> {
    readings.iter().filter_map(|r| r.value.clone()).collect()
}

/// Read the single current value of `field`
#[instrument(skip(selection), fields(cwd = %selection.cwd.display()))]
pub fn get(selection: &ProjectSelection, field: VersionField) -> Result<Reading> {
    let opened = open(selection, field)?;
    let entries = read_entries(opened.index.entries(), field)?;
    let value = BumpResolver::baseline(field, &recorded(&entries), BaselinePolicy::Strict)?;

    info!(value = %value, "current {}", field);
    Ok(Reading {
        field,
        value,
        project: opened.project.bundle_path().to_path_buf(),
        entries,
    })
}

/// Resolve a new value for the requested field and write it everywhere it lives
#[instrument(
    skip(options, source),
    fields(field = %options.request.field, dry_run = options.dry_run)
)]
pub async fn bump(options: BumpOptions, source: Option<&dyn VersionSource>) -> Result<BumpOutcome> {
    let field = options.request.field;
    let Opened {
        project,
        mut document,
        index,
    } = open(&options.selection, field)?;
    let readings = read_entries(index.entries(), field)?;

    let mut request = options.request;
    if request.source == VersionSourceKind::AppStore && request.app_identifier.is_none() {
        request.app_identifier = index
            .entries()
            .iter()
            .filter_map(|e| e.bundle_identifier.as_deref())
            .find(|id| !id.contains("$(") && !id.contains("${"))
            .map(str::to_string);
        debug!(app_identifier = ?request.app_identifier, "app identifier from project");
    }

    let resolution = BumpResolver::new(source)
        .resolve(&request, &recorded(&readings))
        .await?;

    let mut patcher = StructuredPatcher::new();
    patcher.apply(&mut document, index.entries(), field, &resolution.value)?;
    let entries = patcher.touched().to_vec();

    let files = if options.dry_run {
        let staged: Vec<PathBuf> = patcher.staged_paths().iter().map(|p| p.to_path_buf()).collect();
        info!(files = staged.len(), "dry run, nothing written");
        staged
    } else {
        patcher.commit()?
    };

    Ok(BumpOutcome {
        field,
        previous: resolution.previous,
        value: resolution.value,
        project: project.bundle_path().to_path_buf(),
        files,
        entries,
        dry_run: options.dry_run,
    })
}
