//! Loaded `project.pbxproj` with span-based editing
//!
//! The parsed tree is never mutated. Edits are recorded as byte ranges over the
//! original source and spliced in by [`PbxprojDocument::render`], so every byte
//! outside an addressed value survives untouched.

use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;
use xcversion_core::error::{ProjectError, Result, XcversionError};

use super::lexer::quote;
use super::parser::{self, Dict, ParseError, Value};

#[derive(Debug, Clone)]
struct Edit {
    range: Range<usize>,
    text: String,
    object_id: String,
    key: String,
}

/// A parsed project file and its pending edits
#[derive(Debug, Clone)]
pub struct PbxprojDocument {
    path: PathBuf,
    source: String,
    root: Dict,
    edits: Vec<Edit>,
}

impl PbxprojDocument {
    /// Parse `source`, attributing errors to `path`
    pub fn parse(path: impl Into<PathBuf>, source: String) -> Result<Self> {
        let path = path.into();
        let root = parser::parse(&source).map_err(|e| parse_failed(&path, &source, e))?;
        Ok(Self {
            path,
            source,
            root,
            edits: Vec::new(),
        })
    }

    /// Read and parse a project file
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                XcversionError::from(ProjectError::NotFound(path.to_path_buf()))
            }
            _ => XcversionError::Io(e),
        })?;
        debug!(path = %path.display(), bytes = source.len(), "loaded project file");
        Self::parse(path, source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original, unedited source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The `objects` table
    pub fn objects(&self) -> Result<&Dict> {
        self.root
            .get_dict("objects")
            .ok_or_else(|| {
                self.structure_error(self.root.span.start, "missing 'objects' dictionary")
            })
    }

    /// Object by id
    pub fn object(&self, id: &str) -> Option<&Dict> {
        self.root.get_dict("objects")?.get_dict(id)
    }

    /// `isa` of an object
    pub fn object_isa(&self, id: &str) -> Option<&str> {
        self.object(id)?.get_str("isa")
    }

    /// Id of the `PBXProject` object
    pub fn root_object_id(&self) -> Result<&str> {
        self.root
            .get_str("rootObject")
            .ok_or_else(|| self.structure_error(self.root.span.start, "missing 'rootObject'"))
    }

    /// The `PBXProject` object
    pub fn root_object(&self) -> Result<&Dict> {
        let id = self.root_object_id()?;
        let offset = self.root.entry("rootObject").map_or(0, |e| e.span.start);
        self.objects()?
            .get_dict(id)
            .ok_or_else(|| {
                self.structure_error(offset, format!("root object {} is not defined", id))
            })
    }

    /// `buildSettings` of a build configuration object
    pub fn build_settings(&self, configuration_id: &str) -> Option<&Dict> {
        self.object(configuration_id)?.get_dict("buildSettings")
    }

    /// String value of one build setting
    pub fn build_setting(&self, configuration_id: &str, key: &str) -> Option<&str> {
        self.build_settings(configuration_id)?.get_str(key)
    }

    /// Record a write of `key = value` in a configuration's `buildSettings`
    ///
    /// Replaces the existing value token, or inserts a new entry in key order
    /// when the setting is absent. Writing the same key twice keeps the last.
    pub fn set_build_setting(
        &mut self,
        configuration_id: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let settings = self.build_settings(configuration_id).ok_or_else(|| {
            self.patch_failed(format!(
                "build configuration {} has no buildSettings",
                configuration_id
            ))
        })?;

        let (range, text) = match settings.entry(key) {
            Some(entry) => match &entry.value {
                Value::Scalar(scalar) => (scalar.span.clone(), quote(value, scalar.quoted)),
                _ => {
                    return Err(self.patch_failed(format!(
                        "{} in {} is not a string value",
                        key, configuration_id
                    )))
                }
            },
            None => self.insertion(settings, key, value),
        };

        debug!(configuration_id, key, value, ?range, "recording build setting edit");
        self.edits
            .retain(|e| !(e.object_id == configuration_id && e.key == key));
        self.edits.push(Edit {
            range,
            text,
            object_id: configuration_id.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    /// Whether any edit is pending
    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Source with all pending edits applied
    pub fn render(&self) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|e| e.range.start);

        let mut out = String::with_capacity(self.source.len() + 64);
        let mut cursor = 0;
        for edit in edits {
            out.push_str(&self.source[cursor..edit.range.start]);
            out.push_str(&edit.text);
            cursor = edit.range.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }

    fn insertion(&self, settings: &Dict, key: &str, value: &str) -> (Range<usize>, String) {
        let line = format!("{} = {};", key, quote(value, false));

        if let Some(next) = settings.entries.iter().find(|e| e.key.text.as_str() > key) {
            let start = line_start(&self.source, next.span.start);
            let indent = &self.source[start..next.span.start];
            if indent.trim().is_empty() {
                return (start..start, format!("{}{}\n", indent, line));
            }
            return (next.span.start..next.span.start, format!("{} ", line));
        }

        if let Some(last) = settings.entries.last() {
            let start = line_start(&self.source, last.span.start);
            let indent = &self.source[start..last.span.start];
            let at = last.span.end;
            if indent.trim().is_empty() && self.source[at..].starts_with('\n') {
                return (at + 1..at + 1, format!("{}{}\n", indent, line));
            }
            return (at..at, format!(" {}", line));
        }

        let close = settings.span.end - 1;
        let start = line_start(&self.source, close);
        let indent = &self.source[start..close];
        if indent.trim().is_empty() && start > settings.span.start {
            (start..start, format!("{}\t{}\n", indent, line))
        } else {
            (close..close, format!(" {} ", line))
        }
    }

    fn structure_error(&self, offset: usize, message: impl Into<String>) -> XcversionError {
        parse_failed(
            &self.path,
            &self.source,
            ParseError {
                offset,
                message: message.into(),
            },
        )
    }

    fn patch_failed(&self, message: String) -> XcversionError {
        ProjectError::PatchFailed {
            path: self.path.clone(),
            message,
        }
        .into()
    }
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// 1-based line and column of a byte offset
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let line = source[..offset].matches('\n').count() + 1;
    let column = offset - line_start(source, offset) + 1;
    (line, column)
}

fn parse_failed(path: &Path, source: &str, error: ParseError) -> XcversionError {
    let (line, column) = line_column(source, error.offset);
    ProjectError::ParseFailed {
        path: path.to_path_buf(),
        line,
        column,
        message: error.message,
    }
    .into()
}
