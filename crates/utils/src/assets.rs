use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Directory holding the database and log files.
///
/// Respects `BUNPLATE_DATA_DIR`. Debug builds default to `dev_assets/` at the
/// workspace root, release builds to the platform data directory. The
/// directory is not created here; callers that write into it create it.
pub fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("BUNPLATE_DATA_DIR") {
        return PathBuf::from(path);
    }

    if cfg!(debug_assertions) {
        return PathBuf::from(PROJECT_ROOT).join("../../dev_assets");
    }

    ProjectDirs::from("dev", "codeville", "bunplate")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".bunplate"))
    // ✔ macOS → ~/Library/Application Support/dev.codeville.bunplate
    // ✔ Linux → ~/.local/share/bunplate   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\codeville\bunplate
}

/// Default SQLite file, `{data_dir}/bunplate.db`.
pub fn database_path() -> PathBuf {
    data_dir().join("bunplate.db")
}

/// Default directory for rotating log files, `{data_dir}/logs`.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_data_dir_env_override() {
        let temp = tempfile::tempdir().unwrap();
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("BUNPLATE_DATA_DIR", temp.path()) };
        let dir = data_dir();
        unsafe { env::remove_var("BUNPLATE_DATA_DIR") };
        assert_eq!(dir, temp.path());
    }

    #[test]
    #[serial]
    fn test_database_path_default() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::remove_var("BUNPLATE_DATA_DIR") };
        assert!(database_path().ends_with("bunplate.db"));
    }

    #[test]
    #[serial]
    fn test_paths_follow_data_dir() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe { env::set_var("BUNPLATE_DATA_DIR", "/srv/bunplate") };
        let db = database_path();
        let logs = log_dir();
        unsafe { env::remove_var("BUNPLATE_DATA_DIR") };

        assert_eq!(db, PathBuf::from("/srv/bunplate/bunplate.db"));
        assert_eq!(logs, PathBuf::from("/srv/bunplate/logs"));
    }
}
