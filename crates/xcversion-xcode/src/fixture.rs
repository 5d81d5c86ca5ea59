//! On-disk copy of the sample project for tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const PBXPROJ: &str = include_str!("../fixtures/Sample.xcodeproj/project.pbxproj");
pub const SCHEME: &str =
    include_str!("../fixtures/Sample.xcodeproj/xcshareddata/xcschemes/Sample.xcscheme");
pub const APP_PLIST: &str = include_str!("../fixtures/Sample/Info.plist");
pub const WIDGET_PLIST: &str = include_str!("../fixtures/SampleWidget/Info.plist");

/// Copy the sample project into a fresh temp dir
pub fn sample() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "Sample.xcodeproj/project.pbxproj", PBXPROJ);
    write(root, "Sample.xcodeproj/xcshareddata/xcschemes/Sample.xcscheme", SCHEME);
    write(root, "Sample/Info.plist", APP_PLIST);
    write(root, "SampleWidget/Info.plist", WIDGET_PLIST);
    let bundle = root.join("Sample.xcodeproj");
    (temp, bundle)
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}
