use chrono::{Days, NaiveDate};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "plume-dev",
            Profile::Prod => "plume",
        }
    }
}

fn project_dirs(profile: Profile) -> Option<ProjectDirs> {
    ProjectDirs::from("com", "plume", profile.app_name())
}

/// Get the configuration directory path for Plume
/// If profile is Dev, uses "plume-dev" instead of "plume"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for Plume
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a day given on the command line.
///
/// Accepts ISO 8601 (YYYY-MM-DD) as well as `today`, `yesterday` and
/// `tomorrow` relative to `today`.
pub fn parse_date(date_str: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let one_day = Days::new(1);
    let relative = match date_str.trim().to_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => today.checked_sub_days(one_day),
        "tomorrow" => today.checked_add_days(one_day),
        _ => None,
    };
    if let Some(day) = relative {
        return Ok(day);
    }
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date format '{}': {}", date_str, e))
}
