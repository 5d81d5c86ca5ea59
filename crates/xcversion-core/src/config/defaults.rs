//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "xcversion.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "xcversion.yaml";

/// Environment variable naming a file that receives `KEY=value` exports
pub const EXPORT_FILE_ENV: &str = "XCVERSION_EXPORT_FILE";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".xcversion.toml",
        ".xcversion.yaml",
    ]
}
