//! Scheme (`.xcscheme`) lookup
//!
//! A scheme narrows the targets considered to the ones its build action
//! builds. Test, launch and archive actions are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};
use xcversion_core::error::{ProjectError, Result};

use crate::project::XcodeProject;

/// A target reference inside a scheme's build action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildableReference {
    pub blueprint_identifier: String,
    pub blueprint_name: String,
    /// e.g. `container:App.xcodeproj`
    pub referenced_container: String,
}

/// A parsed scheme
#[derive(Debug, Clone)]
pub struct Scheme {
    pub name: String,
    pub path: PathBuf,
    pub buildables: Vec<BuildableReference>,
}

impl Scheme {
    /// Find and parse the scheme named `name`
    pub fn find(project: &XcodeProject, name: &str) -> Result<Self> {
        let path = project
            .scheme_candidates(name)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| ProjectError::SchemeNotFound(name.to_string()))?;

        debug!(scheme = name, path = %path.display(), "reading scheme");
        let xml = fs::read_to_string(&path)?;
        Self::parse(name, &path, &xml)
    }

    /// Parse scheme XML
    pub fn parse(name: &str, path: &Path, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut in_build_entry = false;
        let mut buildables = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                let (line, column) =
                    crate::pbxproj::line_column(xml, reader.buffer_position() as usize);
                ProjectError::ParseFailed {
                    path: path.to_path_buf(),
                    line,
                    column,
                    message: e.to_string(),
                }
            })?;

            match event {
                Event::Start(e) | Event::Empty(e)
                    if e.local_name().as_ref() == b"BuildActionEntry" =>
                {
                    in_build_entry = true;
                }
                Event::Start(e) | Event::Empty(e)
                    if in_build_entry && e.local_name().as_ref() == b"BuildableReference" =>
                {
                    let mut reference = BuildableReference {
                        blueprint_identifier: String::new(),
                        blueprint_name: String::new(),
                        referenced_container: String::new(),
                    };
                    for attr in e.attributes().flatten() {
                        let Ok(value) = attr.unescape_value() else {
                            continue;
                        };
                        match attr.key.as_ref() {
                            b"BlueprintIdentifier" => {
                                reference.blueprint_identifier = value.to_string()
                            }
                            b"BlueprintName" => reference.blueprint_name = value.to_string(),
                            b"ReferencedContainer" => {
                                reference.referenced_container = value.to_string()
                            }
                            _ => {}
                        }
                    }
                    if !reference.blueprint_identifier.is_empty() {
                        buildables.push(reference);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"BuildActionEntry" => {
                    in_build_entry = false;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            buildables,
        })
    }

    /// Ids of the targets this scheme builds from `project`
    ///
    /// Buildables from other containers (workspace siblings, packages) are
    /// skipped. A scheme that builds nothing from this project is an error.
    pub fn target_ids(&self, project: &XcodeProject) -> Result<Vec<String>> {
        let container = format!("container:{}", project.file_name());
        let ids: Vec<String> = self
            .buildables
            .iter()
            .filter(|b| {
                b.referenced_container == container
                    || b.referenced_container.ends_with(&format!("/{}", project.file_name()))
            })
            .map(|b| b.blueprint_identifier.clone())
            .collect();

        if ids.is_empty() {
            return Err(ProjectError::TargetNotFound(format!(
                "scheme '{}' builds no target of {}",
                self.name,
                project.file_name()
            ))
            .into());
        }
        info!(scheme = %self.name, targets = ids.len(), "scoped to scheme targets");
        Ok(ids)
    }
}
