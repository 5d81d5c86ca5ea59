//! Info.plist version field access
//!
//! XML plists are edited in place: only the text of the value element that
//! follows `<key>FIELD</key>` in the root dictionary changes, so comments,
//! ordering and nested dictionaries with the same key are left alone. Binary
//! plists go through the `plist` crate and are written back as binary.

use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument};
use xcversion_core::error::{ProjectError, Result, XcversionError};
use xcversion_core::VersionField;

use crate::pbxproj::line_column;

const BINARY_MAGIC: &[u8] = b"bplist00";

/// Serialization of a plist file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlistFormat {
    Xml,
    Binary,
}

impl PlistFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(BINARY_MAGIC) {
            Self::Binary
        } else {
            Self::Xml
        }
    }
}

/// Whether a plist value defers to a build setting, e.g. `$(MARKETING_VERSION)`
pub fn is_build_setting_reference(value: &str) -> bool {
    let value = value.trim();
    (value.starts_with("$(") && value.ends_with(')'))
        || (value.starts_with("${") && value.ends_with('}'))
}

/// Reads and writes one version field of an Info.plist
pub struct PlistFieldAccessor;

impl PlistFieldAccessor {
    /// Value of `field`, failing when the key is absent
    pub fn read(path: &Path, field: VersionField) -> Result<String> {
        Self::try_read(path, field)?.ok_or_else(|| {
            ProjectError::KeyNotFound {
                path: path.to_path_buf(),
                key: field.plist_key().to_string(),
            }
            .into()
        })
    }

    /// Value of `field`, `None` when the key is absent
    pub fn try_read(path: &Path, field: VersionField) -> Result<Option<String>> {
        let bytes = fs::read(path)?;
        match PlistFormat::detect(&bytes) {
            PlistFormat::Binary => read_binary(path, &bytes, field.plist_key()),
            PlistFormat::Xml => {
                let xml = as_utf8(path, &bytes)?;
                let layout = scan(xml).map_err(|e| xml_error(path, xml, e))?;
                Ok(layout
                    .slot(field.plist_key())
                    .map(|slot| slot.text(xml).trim().to_string()))
            }
        }
    }

    /// New file contents with `field` set to `value`, nothing written
    #[instrument(skip_all, fields(path = %path.display(), field = %field, value = %value))]
    pub fn render(path: &Path, field: VersionField, value: &str) -> Result<Vec<u8>> {
        let bytes = fs::read(path)?;
        match PlistFormat::detect(&bytes) {
            PlistFormat::Binary => render_binary(path, &bytes, field.plist_key(), value),
            PlistFormat::Xml => {
                let xml = as_utf8(path, &bytes)?;
                let rendered = render_xml(xml, field.plist_key(), value)
                    .map_err(|e| xml_error(path, xml, e))?;
                Ok(rendered.into_bytes())
            }
        }
    }

    /// Set `field` to `value` on disk
    pub fn write(path: &Path, field: VersionField, value: &str) -> Result<()> {
        let contents = Self::render(path, field, value)?;
        crate::patcher::persist(path, &contents)
    }
}

/// Root dictionary entry located in the source
#[derive(Debug, Clone)]
struct Slot {
    key: String,
    /// Whole value element
    element: Range<usize>,
    /// Text between the value's start and end tags, `None` for `<string/>`
    content: Option<Range<usize>>,
}

impl Slot {
    fn text<'a>(&self, xml: &'a str) -> Cow<'a, str> {
        match &self.content {
            Some(range) => {
                let raw = &xml[range.clone()];
                unescape(raw).unwrap_or(Cow::Borrowed(raw))
            }
            None => Cow::Borrowed(""),
        }
    }
}

#[derive(Debug, Default)]
struct Layout {
    slots: Vec<Slot>,
    /// Start of the root `</dict>`
    root_close: Option<usize>,
    /// Start of the first root `<key>`
    first_key: Option<usize>,
}

impl Layout {
    fn slot(&self, key: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.key == key)
    }
}

type ScanError = (usize, String);

/// Locate the root dictionary's entries
///
/// Only positions reported after an event are used; element starts are found
/// by searching back for the tag opener.
fn scan(xml: &str) -> std::result::Result<Layout, ScanError> {
    let mut reader = Reader::from_str(xml);
    let mut layout = Layout::default();
    let mut depth = 0usize;
    let mut root_open = false;
    let mut root_closed = false;
    let mut key_content: Option<usize> = None;
    let mut pending_key: Option<String> = None;
    let mut open_value: Option<(String, Vec<u8>, usize, usize)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| (reader.buffer_position() as usize, e.to_string()))?;
        let end = reader.buffer_position() as usize;
        let in_root = root_open && !root_closed;

        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let start = xml[..end].rfind('<').unwrap_or(0);
                if depth == 1 && !root_open && name == b"dict" {
                    root_open = true;
                } else if in_root && depth == 2 {
                    if name == b"key" {
                        key_content = Some(end);
                        layout.first_key.get_or_insert(start);
                    } else if let Some(key) = pending_key.take() {
                        open_value = Some((key, name, start, end));
                    }
                }
                depth += 1;
            }
            Event::Empty(_) => {
                if in_root && depth == 2 {
                    if let Some(key) = pending_key.take() {
                        let start = xml[..end].rfind('<').unwrap_or(0);
                        layout.slots.push(Slot {
                            key,
                            element: start..end,
                            content: None,
                        });
                    }
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                let start = xml[..end].rfind("</").unwrap_or(0);
                let name = e.name();
                if in_root && depth == 2 {
                    if name.as_ref() == b"key" {
                        if let Some(from) = key_content.take() {
                            let raw = &xml[from..start];
                            pending_key = Some(
                                unescape(raw)
                                    .map(Cow::into_owned)
                                    .unwrap_or_else(|_| raw.to_string()),
                            );
                        }
                    } else if let Some((key, tag, element_start, content_start)) =
                        open_value.take()
                    {
                        if tag == name.as_ref() {
                            layout.slots.push(Slot {
                                key,
                                element: element_start..end,
                                content: Some(content_start..start),
                            });
                        }
                    }
                } else if in_root && depth == 1 && name.as_ref() == b"dict" {
                    root_closed = true;
                    layout.root_close = Some(start);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if layout.root_close.is_none() {
        return Err((0, "no root dictionary".to_string()));
    }
    Ok(layout)
}

fn render_xml(xml: &str, key: &str, value: &str) -> std::result::Result<String, ScanError> {
    let layout = scan(xml)?;
    let escaped = escape(value);

    let (range, text) = match layout.slot(key) {
        Some(Slot {
            content: Some(content),
            ..
        }) => (content.clone(), escaped.into_owned()),
        Some(slot) => (slot.element.clone(), format!("<string>{}</string>", escaped)),
        None => {
            let close = layout.root_close.unwrap_or(xml.len());
            let indent = layout
                .first_key
                .map(|at| leading_whitespace(xml, at))
                .unwrap_or("\t");
            let entry = format!(
                "{indent}<key>{}</key>\n{indent}<string>{}</string>\n",
                escape(key),
                escaped,
                indent = indent
            );
            let line_start = xml[..close].rfind('\n').map_or(0, |i| i + 1);
            if xml[line_start..close].trim().is_empty() {
                (line_start..line_start, entry)
            } else {
                (close..close, format!("\n{}", entry))
            }
        }
    };

    debug!(key, ?range, "rewriting plist value");
    let mut out = String::with_capacity(xml.len() + text.len());
    out.push_str(&xml[..range.start]);
    out.push_str(&text);
    out.push_str(&xml[range.end..]);
    Ok(out)
}

fn leading_whitespace(xml: &str, at: usize) -> &str {
    let line_start = xml[..at].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &xml[line_start..at];
    if prefix.trim().is_empty() {
        prefix
    } else {
        "\t"
    }
}

fn read_binary(path: &Path, bytes: &[u8], key: &str) -> Result<Option<String>> {
    let value = plist::Value::from_reader(Cursor::new(bytes)).map_err(|e| binary_error(path, e))?;
    let dict = value
        .as_dictionary()
        .ok_or_else(|| binary_error(path, "root is not a dictionary"))?;
    Ok(dict.get(key).and_then(|v| match v {
        plist::Value::String(s) => Some(s.clone()),
        plist::Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }))
}

fn render_binary(path: &Path, bytes: &[u8], key: &str, new_value: &str) -> Result<Vec<u8>> {
    let mut value =
        plist::Value::from_reader(Cursor::new(bytes)).map_err(|e| binary_error(path, e))?;
    value
        .as_dictionary_mut()
        .ok_or_else(|| binary_error(path, "root is not a dictionary"))?
        .insert(key.to_string(), plist::Value::String(new_value.to_string()));

    let mut out = Vec::new();
    value
        .to_writer_binary(&mut out)
        .map_err(|e| ProjectError::PatchFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(out)
}

fn as_utf8<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        ProjectError::ParseFailed {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: format!("not UTF-8: {}", e),
        }
        .into()
    })
}

fn xml_error(path: &Path, xml: &str, (offset, message): ScanError) -> XcversionError {
    let (line, column) = line_column(xml, offset);
    ProjectError::ParseFailed {
        path: path.to_path_buf(),
        line,
        column,
        message,
    }
    .into()
}

fn binary_error(path: &Path, message: impl ToString) -> XcversionError {
    ProjectError::ParseFailed {
        path: path.to_path_buf(),
        line: 1,
        column: 1,
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    #[test]
    fn test_reference_detection() {
        assert!(is_build_setting_reference("$(MARKETING_VERSION)"));
        assert!(is_build_setting_reference(" ${CURRENT_PROJECT_VERSION} "));
        assert!(!is_build_setting_reference("1.0.0"));
        assert!(!is_build_setting_reference("$(A)-beta"));
    }

    #[test]
    fn test_read_root_keys_only() {
        let (temp, _) = fixture::sample();
        let widget = temp.path().join("SampleWidget/Info.plist");
        assert_eq!(PlistFieldAccessor::read(&widget, VersionField::BuildNumber).unwrap(), "1");
        assert_eq!(
            PlistFieldAccessor::read(&widget, VersionField::MarketingVersion).unwrap(),
            "0.0.1"
        );

        let app = temp.path().join("Sample/Info.plist");
        assert_eq!(
            PlistFieldAccessor::read(&app, VersionField::MarketingVersion).unwrap(),
            "$(MARKETING_VERSION)"
        );
    }

    #[test]
    fn test_write_touches_only_the_value() {
        let (temp, _) = fixture::sample();
        let widget = temp.path().join("SampleWidget/Info.plist");
        PlistFieldAccessor::write(&widget, VersionField::BuildNumber, "22").unwrap();

        let written = fixture::read(temp.path(), "SampleWidget/Info.plist");
        assert_eq!(
            written,
            fixture::WIDGET_PLIST.replace(
                "<key>CFBundleVersion</key>\n\t<string>1</string>",
                "<key>CFBundleVersion</key>\n\t<string>22</string>"
            )
        );
        assert!(written.contains("nested-is-not-the-bundle-version"));
        assert!(written.contains("<!-- widget extension keeps its own copy of the version -->"));
    }

    #[test]
    fn test_missing_key_is_inserted_with_sibling_indent() {
        let xml = "<?xml version=\"1.0\"?>\n<plist version=\"1.0\">\n<dict>\n    <key>CFBundleName</key>\n    <string>App</string>\n</dict>\n</plist>\n";
        let rendered = render_xml(xml, "CFBundleVersion", "3").unwrap();
        assert_eq!(
            rendered,
            "<?xml version=\"1.0\"?>\n<plist version=\"1.0\">\n<dict>\n    <key>CFBundleName</key>\n    <string>App</string>\n    <key>CFBundleVersion</key>\n    <string>3</string>\n</dict>\n</plist>\n"
        );
    }

    #[test]
    fn test_empty_string_element() {
        let xml = "<plist><dict><key>CFBundleVersion</key><string/></dict></plist>";
        let layout = scan(xml).unwrap();
        assert_eq!(layout.slot("CFBundleVersion").unwrap().text(xml), "");
        assert_eq!(
            render_xml(xml, "CFBundleVersion", "5").unwrap(),
            "<plist><dict><key>CFBundleVersion</key><string>5</string></dict></plist>"
        );
    }

    #[test]
    fn test_missing_key_read() {
        let temp = tempfile::TempDir::new().unwrap();
        fixture::write(temp.path(), "Info.plist", "<plist><dict></dict></plist>");
        let path = temp.path().join("Info.plist");
        assert_eq!(PlistFieldAccessor::try_read(&path, VersionField::BuildNumber).unwrap(), None);
        assert!(matches!(
            PlistFieldAccessor::read(&path, VersionField::BuildNumber),
            Err(XcversionError::Project(ProjectError::KeyNotFound { .. }))
        ));
    }

    #[test]
    fn test_malformed_xml() {
        let temp = tempfile::TempDir::new().unwrap();
        fixture::write(temp.path(), "Info.plist", "<plist><dict><key>A</key></plist>");
        let path = temp.path().join("Info.plist");
        assert!(matches!(
            PlistFieldAccessor::try_read(&path, VersionField::BuildNumber),
            Err(XcversionError::Project(ProjectError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn test_binary_stays_binary() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("Info.plist");
        let mut dict = plist::Dictionary::new();
        dict.insert("CFBundleVersion".to_string(), plist::Value::String("9".to_string()));
        dict.insert("CFBundleName".to_string(), plist::Value::String("App".to_string()));
        plist::Value::Dictionary(dict).to_file_binary(&path).unwrap();

        assert_eq!(PlistFieldAccessor::read(&path, VersionField::BuildNumber).unwrap(), "9");
        PlistFieldAccessor::write(&path, VersionField::BuildNumber, "10").unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(PlistFormat::detect(&bytes), PlistFormat::Binary);
        assert_eq!(PlistFieldAccessor::read(&path, VersionField::BuildNumber).unwrap(), "10");
        let value = plist::Value::from_file(&path).unwrap();
        assert_eq!(
            value.as_dictionary().unwrap().get("CFBundleName").and_then(|v| v.as_string()),
            Some("App")
        );
    }
}
