//! Target and build configuration enumeration
//!
//! Walks `rootObject -> targets -> buildConfigurationList ->
//! buildConfigurations` and records, for every selected (target,
//! configuration) pair, where the field's value currently lives.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use xcversion_core::error::{ProjectError, Result};
use xcversion_core::VersionField;

use crate::pbxproj::{Dict, PbxprojDocument};

const INFOPLIST_FILE: &str = "INFOPLIST_FILE";
const GENERATE_INFOPLIST_FILE: &str = "GENERATE_INFOPLIST_FILE";
const PRODUCT_BUNDLE_IDENTIFIER: &str = "PRODUCT_BUNDLE_IDENTIFIER";

/// Where an entry's build setting is defined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingOrigin {
    /// In the target's own configuration
    Target,
    /// Inherited from the same-named project level configuration
    Project {
        configuration_id: String,
        /// An unselected target configuration inherits it too
        shared: bool,
    },
    /// Not set at either level
    Absent,
}

/// Info.plist associated with an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlistReference {
    /// `INFOPLIST_FILE` as written
    pub setting: String,
    /// Resolved on-disk path
    pub path: PathBuf,
}

/// One (target, build configuration) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationEntry {
    pub target: String,
    pub target_id: String,
    pub configuration: String,
    pub configuration_id: String,
    /// Current build setting value for the field
    pub value: Option<String>,
    pub origin: SettingOrigin,
    pub info_plist: Option<PlistReference>,
    pub bundle_identifier: Option<String>,
    /// `GENERATE_INFOPLIST_FILE = YES`
    pub generates_info_plist: bool,
}

/// Selection applied while indexing
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexFilter<'a> {
    pub target: Option<&'a str>,
    pub configuration: Option<&'a str>,
    /// Target ids built by a scheme
    pub scheme_targets: Option<&'a [String]>,
}

/// Selected configuration entries in declaration order
#[derive(Debug, Clone)]
pub struct ConfigurationIndex {
    field: VersionField,
    entries: Vec<ConfigurationEntry>,
}

impl ConfigurationIndex {
    /// Enumerate the entries of `document` matching `filter`
    ///
    /// `source_root` anchors relative `INFOPLIST_FILE` paths.
    #[instrument(skip(document, filter), fields(project = %document.path().display()))]
    pub fn build(
        document: &PbxprojDocument,
        source_root: &Path,
        field: VersionField,
        filter: IndexFilter<'_>,
    ) -> Result<Self> {
        let project = document.root_object()?;
        let project_configs = configurations(document, project);

        let mut targets: Vec<(String, &Dict)> = project
            .get_array("targets")
            .unwrap_or_default()
            .iter()
            .filter_map(|id| id.as_str())
            .filter_map(|id| document.object(id).map(|target| (id.to_string(), target)))
            .collect();

        let all_targets = targets.clone();
        if let Some(scheme_targets) = filter.scheme_targets {
            targets.retain(|(id, _)| scheme_targets.iter().any(|s| s == id));
        }
        if let Some(name) = filter.target {
            targets.retain(|(_, target)| target_name(target) == Some(name));
            if targets.is_empty() {
                return Err(ProjectError::TargetNotFound(name.to_string()).into());
            }
        }

        let key = field.build_setting_key();
        let mut entries = Vec::new();
        for (target_id, target) in &targets {
            let name = target_name(target).unwrap_or(target_id).to_string();
            for (configuration_id, configuration) in configurations(document, target) {
                let configuration_name =
                    configuration.get_str("name").unwrap_or_default().to_string();
                if filter.configuration.is_some_and(|c| c != configuration_name) {
                    continue;
                }

                let inherited = project_configs
                    .iter()
                    .find(|(_, c)| c.get_str("name") == Some(configuration_name.as_str()));
                let lookup = |key: &str| -> Option<String> {
                    setting(configuration, key)
                        .or_else(|| inherited.and_then(|(_, c)| setting(c, key)))
                };

                let (value, origin) = match setting(configuration, key) {
                    Some(value) => (Some(value), SettingOrigin::Target),
                    None => match inherited.and_then(|(id, c)| setting(c, key).map(|v| (id, v))) {
                        Some((id, value)) => (
                            Some(value),
                            SettingOrigin::Project {
                                configuration_id: id.clone(),
                                shared: false,
                            },
                        ),
                        None => (None, SettingOrigin::Absent),
                    },
                };

                let info_plist = lookup(INFOPLIST_FILE).and_then(|raw| {
                    resolve_plist_path(&raw, source_root, &name)
                        .map(|path| PlistReference { setting: raw, path })
                });

                debug!(
                    target_name = %name,
                    configuration = %configuration_name,
                    value = ?value,
                    "indexed configuration"
                );
                entries.push(ConfigurationEntry {
                    target: name.clone(),
                    target_id: target_id.clone(),
                    configuration: configuration_name,
                    configuration_id,
                    value,
                    origin,
                    info_plist,
                    bundle_identifier: lookup(PRODUCT_BUNDLE_IDENTIFIER),
                    generates_info_plist: lookup(GENERATE_INFOPLIST_FILE).as_deref() == Some("YES"),
                });
            }
        }

        let selected: Vec<String> = entries.iter().map(|e| e.configuration_id.clone()).collect();
        for ConfigurationEntry {
            configuration,
            origin,
            ..
        } in &mut entries
        {
            if let SettingOrigin::Project { shared, .. } = origin {
                *shared = all_targets.iter().any(|(_, target)| {
                    configurations(document, target).iter().any(|(id, c)| {
                        c.get_str("name") == Some(configuration.as_str())
                            && setting(c, key).is_none()
                            && !selected.contains(id)
                    })
                });
            }
        }

        if let Some(configuration) = filter.configuration {
            if entries.is_empty() {
                return Err(ProjectError::ConfigurationNotFound {
                    configuration: configuration.to_string(),
                    scope: filter
                        .target
                        .map(|t| format!("target '{}'", t))
                        .unwrap_or_else(|| "any target".to_string()),
                }
                .into());
            }
        }

        Ok(Self {
            field,
            entries,
        })
    }

    /// Field the index was built for
    pub fn field(&self) -> VersionField {
        self.field
    }

    pub fn entries(&self) -> &[ConfigurationEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct target names in declaration order
    pub fn targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.target.as_str()) {
                names.push(&entry.target);
            }
        }
        names
    }
}

fn target_name(target: &Dict) -> Option<&str> {
    target.get_str("name").or_else(|| target.get_str("productName"))
}

/// Build configurations of an object with a `buildConfigurationList`
fn configurations<'a>(document: &'a PbxprojDocument, owner: &'a Dict) -> Vec<(String, &'a Dict)> {
    let Some(list) = owner
        .get_str("buildConfigurationList")
        .and_then(|id| document.object(id))
    else {
        return Vec::new();
    };

    list.get_array("buildConfigurations")
        .unwrap_or_default()
        .iter()
        .filter_map(|id| id.as_str())
        .filter_map(|id| document.object(id).map(|c| (id.to_string(), c)))
        .collect()
}

fn setting(configuration: &Dict, key: &str) -> Option<String> {
    configuration
        .get_dict("buildSettings")?
        .get_str(key)
        .map(str::to_string)
}

/// Resolve `INFOPLIST_FILE` against the project's source root
///
/// Returns `None` when the path still holds a variable that cannot be
/// expanded statically.
pub fn resolve_plist_path(raw: &str, source_root: &Path, target_name: &str) -> Option<PathBuf> {
    let mut expanded = raw.to_string();
    for var in ["SRCROOT", "PROJECT_DIR"] {
        for pattern in [format!("$({})", var), format!("${{{}}}", var)] {
            expanded = expanded.replace(&pattern, &source_root.to_string_lossy());
        }
    }
    for pattern in ["$(TARGET_NAME)", "${TARGET_NAME}"] {
        expanded = expanded.replace(pattern, target_name);
    }

    if expanded.contains("$(") || expanded.contains("${") || expanded.trim().is_empty() {
        debug!(setting = raw, "cannot expand INFOPLIST_FILE");
        return None;
    }

    let path = PathBuf::from(expanded);
    Some(if path.is_absolute() {
        path
    } else {
        source_root.join(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;
    use crate::project::XcodeProject;
    use xcversion_core::XcversionError;

    fn index(field: VersionField, filter: IndexFilter<'_>) -> Result<ConfigurationIndex> {
        let (temp, bundle) = fixture::sample();
        let project = XcodeProject::locate(Some(&bundle), temp.path()).unwrap();
        let document = project.load_document().unwrap();
        ConfigurationIndex::build(&document, &project.source_root(), field, filter)
    }

    #[test]
    fn test_declaration_order() {
        let index = index(VersionField::BuildNumber, IndexFilter::default()).unwrap();
        let pairs: Vec<(&str, &str)> = index
            .entries()
            .iter()
            .map(|e| (e.target.as_str(), e.configuration.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Sample", "Debug"),
                ("Sample", "Release"),
                ("SampleWidget", "Debug"),
                ("SampleWidget", "Release"),
                ("SampleTests", "Debug"),
                ("SampleTests", "Release"),
            ]
        );
        assert_eq!(index.targets(), vec!["Sample", "SampleWidget", "SampleTests"]);
    }

    #[test]
    fn test_values_and_plists() {
        let index = index(VersionField::MarketingVersion, IndexFilter::default()).unwrap();
        let app = &index.entries()[0];
        assert_eq!(app.value.as_deref(), Some("0.0.1"));
        assert_eq!(app.origin, SettingOrigin::Target);
        assert_eq!(app.bundle_identifier.as_deref(), Some("com.example.sample"));
        assert!(app.info_plist.as_ref().unwrap().path.ends_with("Sample/Info.plist"));

        let widget = &index.entries()[2];
        let plist = widget.info_plist.as_ref().unwrap();
        assert_eq!(plist.setting, "$(SRCROOT)/SampleWidget/Info.plist");
        assert!(plist.path.ends_with("SampleWidget/Info.plist"));

        let tests = &index.entries()[4];
        assert_eq!(tests.value, None);
        assert_eq!(tests.origin, SettingOrigin::Absent);
        assert!(tests.info_plist.is_none());
    }

    #[test]
    fn test_filters() {
        let filter = IndexFilter {
            target: Some("SampleWidget"),
            configuration: Some("Release"),
            ..Default::default()
        };
        let index = index(VersionField::BuildNumber, filter).unwrap();
        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.entries()[0].configuration_id, "8A1F2C0B2A10000100000086");
    }

    #[test]
    fn test_scheme_scoping() {
        let scheme = vec!["8A1F2C0B2A10000100000041".to_string()];
        let filter = IndexFilter {
            scheme_targets: Some(scheme.as_slice()),
            ..Default::default()
        };
        let index = index(VersionField::BuildNumber, filter).unwrap();
        assert_eq!(index.targets(), vec!["Sample"]);

        let filter = IndexFilter {
            target: Some("SampleWidget"),
            scheme_targets: Some(scheme.as_slice()),
            ..Default::default()
        };
        assert!(matches!(
            index_err(filter),
            XcversionError::Project(ProjectError::TargetNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_names() {
        let filter = IndexFilter {
            target: Some("Missing"),
            ..Default::default()
        };
        assert!(matches!(
            index_err(filter),
            XcversionError::Project(ProjectError::TargetNotFound(name)) if name == "Missing"
        ));

        let filter = IndexFilter {
            configuration: Some("Staging"),
            ..Default::default()
        };
        assert!(matches!(
            index_err(filter),
            XcversionError::Project(ProjectError::ConfigurationNotFound { .. })
        ));
    }

    #[test]
    fn test_project_level_inheritance() {
        let source = fixture::PBXPROJ.replace(
            "\t\t\t\tSDKROOT = iphoneos;\n\t\t\t\tVALIDATE_PRODUCT = YES;",
            "\t\t\t\tCURRENT_PROJECT_VERSION = 40;\n\t\t\t\tSDKROOT = iphoneos;\n\t\t\t\tVALIDATE_PRODUCT = YES;",
        );
        let document = PbxprojDocument::parse("project.pbxproj", source).unwrap();
        let filter = IndexFilter {
            target: Some("SampleTests"),
            ..Default::default()
        };
        let build = |filter: IndexFilter<'static>| {
            ConfigurationIndex::build(&document, Path::new("."), VersionField::BuildNumber, filter)
                .unwrap()
        };

        let index = build(filter);
        assert_eq!(index.entries()[0].value, None);
        assert_eq!(index.entries()[1].value.as_deref(), Some("40"));
        assert_eq!(
            index.entries()[1].origin,
            SettingOrigin::Project {
                configuration_id: "8A1F2C0B2A10000100000082".to_string(),
                shared: false,
            }
        );

        let source = document.source().replace(
            "\t\t\t\tCODE_SIGN_STYLE = Automatic;\n\t\t\t\tCURRENT_PROJECT_VERSION = 1;\n\t\t\t\tINFOPLIST_FILE = Sample/",
            "\t\t\t\tCODE_SIGN_STYLE = Automatic;\n\t\t\t\tINFOPLIST_FILE = Sample/",
        );
        let document = PbxprojDocument::parse("project.pbxproj", source).unwrap();
        let build = |filter: IndexFilter<'static>| {
            ConfigurationIndex::build(&document, Path::new("."), VersionField::BuildNumber, filter)
                .unwrap()
        };
        let index = build(IndexFilter {
            target: Some("Sample"),
            ..Default::default()
        });
        assert_eq!(
            index.entries()[1].origin,
            SettingOrigin::Project {
                configuration_id: "8A1F2C0B2A10000100000082".to_string(),
                shared: true,
            }
        );
        let index = build(IndexFilter::default());
        assert_eq!(
            index.entries()[1].origin,
            SettingOrigin::Project {
                configuration_id: "8A1F2C0B2A10000100000082".to_string(),
                shared: false,
            }
        );
    }

    #[test]
    fn test_resolve_plist_path() {
        let root = Path::new("/work");
        assert_eq!(
            resolve_plist_path("${PROJECT_DIR}/$(TARGET_NAME)/Info.plist", root, "App"),
            Some(PathBuf::from("/work/App/Info.plist"))
        );
        assert_eq!(
            resolve_plist_path("App/Info.plist", root, "App"),
            Some(PathBuf::from("/work/App/Info.plist"))
        );
        assert_eq!(resolve_plist_path("$(CONFIGURATION_DIR)/Info.plist", root, "App"), None);
    }

    fn index_err(filter: IndexFilter<'_>) -> XcversionError {
        index(VersionField::BuildNumber, filter).unwrap_err()
    }
}
