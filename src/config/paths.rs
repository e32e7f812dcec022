use std::path::PathBuf;

const APP_ID: &str = "com.studyplan.engine";

/// Platform-specific application data directory.
pub fn app_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support");
            dir.push(APP_ID);
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push(APP_ID);
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share");
            dir.push(APP_ID);
            return dir;
        }
    }

    // Fallback
    PathBuf::from("data")
}

/// Path of the engine config file, honoring `STUDYPLAN_CONFIG`.
pub fn config_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("STUDYPLAN_CONFIG") {
        return PathBuf::from(explicit);
    }
    app_data_dir().join("planner.toml")
}
