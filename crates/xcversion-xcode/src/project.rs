//! Xcode project discovery

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use xcversion_core::error::{ProjectError, Result};

use crate::pbxproj::PbxprojDocument;

const PBXPROJ: &str = "project.pbxproj";
const BUNDLE_EXTENSION: &str = "xcodeproj";

/// An `.xcodeproj` bundle on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeProject {
    bundle: PathBuf,
}

impl XcodeProject {
    /// Resolve the project to operate on
    ///
    /// `project` may name the `.xcodeproj` directory or the `project.pbxproj`
    /// inside it, relative to `cwd`. Without one, `cwd` must contain exactly
    /// one `.xcodeproj`.
    pub fn locate(project: Option<&Path>, cwd: &Path) -> Result<Self> {
        let bundle = match project {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    cwd.join(path)
                };
                if path.file_name().is_some_and(|n| n == PBXPROJ) {
                    path.parent()
                        .map(Path::to_path_buf)
                        .ok_or_else(|| ProjectError::NotFound(path.clone()))?
                } else if path.extension().is_some_and(|e| e == BUNDLE_EXTENSION) {
                    path
                } else {
                    return Err(ProjectError::NotFound(path).into());
                }
            }
            None => Self::find_in(cwd)?,
        };

        let project = Self { bundle };
        if !project.pbxproj_path().is_file() {
            return Err(ProjectError::NotFound(project.pbxproj_path()).into());
        }
        debug!(project = %project.bundle.display(), "located Xcode project");
        Ok(project)
    }

    fn find_in(dir: &Path) -> Result<PathBuf> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|_| ProjectError::NotFound(dir.to_path_buf()))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.extension().is_some_and(|e| e == BUNDLE_EXTENSION))
            .collect();
        candidates.sort();

        match candidates.len() {
            0 => Err(ProjectError::NotFound(dir.to_path_buf()).into()),
            1 => Ok(candidates.remove(0)),
            _ => Err(ProjectError::Ambiguous(dir.to_path_buf()).into()),
        }
    }

    /// The `.xcodeproj` directory
    pub fn bundle_path(&self) -> &Path {
        &self.bundle
    }

    /// `project.pbxproj` inside the bundle
    pub fn pbxproj_path(&self) -> PathBuf {
        self.bundle.join(PBXPROJ)
    }

    /// Directory containing the bundle, `$(SRCROOT)` for path expansion
    pub fn source_root(&self) -> PathBuf {
        match self.bundle.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Bundle file name, e.g. `App.xcodeproj`
    pub fn file_name(&self) -> String {
        self.bundle
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Project name without the extension
    pub fn name(&self) -> String {
        self.bundle
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read and parse `project.pbxproj`
    pub fn load_document(&self) -> Result<PbxprojDocument> {
        PbxprojDocument::load(&self.pbxproj_path())
    }

    /// Places a scheme named `name` may live, shared first
    pub fn scheme_candidates(&self, name: &str) -> Vec<PathBuf> {
        let file = format!("{}.xcscheme", name);
        let mut candidates = vec![self.bundle.join("xcshareddata").join("xcschemes").join(&file)];

        if let Ok(entries) = fs::read_dir(self.bundle.join("xcuserdata")) {
            let mut users: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e == "xcuserdatad"))
                .collect();
            users.sort();
            candidates.extend(users.into_iter().map(|u| u.join("xcschemes").join(&file)));
        }
        candidates
    }
}
