/// Content directories scanned when no input directories are configured
pub const DEFAULT_INPUT_DIRS: &[&str] = &[
    "classes",
    "races",
    "features",
    "spells",
    "subclasses",
    "backgrounds",
    "items",
];

/// Output root, relative to the run root
pub const DEFAULT_OUT_DIR: &str = "normalized";

/// Run report written once per invocation under the output root
pub const REPORT_FILE_NAME: &str = "report.json";

/// Only files with this exact extension are treated as content records
pub const DATA_EXTENSION: &str = "json";

/// Optional configuration file looked up in the run root
pub const CONFIG_FILE_NAME: &str = "normalize.toml";

/// Get the default input directories as owned strings
pub fn default_input_dirs() -> Vec<String> {
    DEFAULT_INPUT_DIRS.iter().map(|d| d.to_string()).collect()
}
