use anyhow::Result;
use std::path::PathBuf;

const AUTHFLOW_DIR: &str = ".authflow";
const DB_FILE: &str = "authflow.db";
const CONFIG_FILE: &str = "config.toml";
const PROFILES_DIR: &str = "profiles";
const SCREENSHOTS_DIR: &str = "screenshots";

/// Environment variable to override the AuthFlow directory.
const AUTHFLOW_DIR_ENV: &str = "AUTHFLOW_DIR";

/// Resolve the AuthFlow data directory.
/// Priority: AUTHFLOW_DIR env var > ~/.authflow/
pub fn resolve_authflow_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(AUTHFLOW_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(AUTHFLOW_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the AuthFlow directory exists and return its path.
pub fn ensure_authflow_dir() -> Result<PathBuf> {
    let dir = resolve_authflow_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the database path: ~/.authflow/authflow.db
pub fn database_path() -> Result<PathBuf> {
    Ok(resolve_authflow_dir()?.join(DB_FILE))
}

/// Ensure database path exists and return as string.
pub fn ensure_database_path() -> Result<PathBuf> {
    Ok(ensure_authflow_dir()?.join(DB_FILE))
}

/// Convenience helper returning the database path as a UTF-8 string.
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_database_path()?.to_string_lossy().into_owned())
}

/// Get the config file path: ~/.authflow/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(resolve_authflow_dir()?.join(CONFIG_FILE))
}

/// Browser profile root: ~/.authflow/profiles/
pub fn profiles_dir() -> Result<PathBuf> {
    let dir = ensure_authflow_dir()?.join(PROFILES_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Per-identity browser profile: ~/.authflow/profiles/{identity_id}/
pub fn profile_dir_for(identity_id: &str) -> Result<PathBuf> {
    Ok(profiles_dir()?.join(identity_id))
}

/// Diagnostic screenshot root: ~/.authflow/screenshots/
pub fn screenshots_dir() -> Result<PathBuf> {
    let dir = ensure_authflow_dir()?.join(SCREENSHOTS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    #[test]
    fn test_default_authflow_dir() {
        let _lock = env_lock();
        unsafe { std::env::remove_var(AUTHFLOW_DIR_ENV) };
        let dir = resolve_authflow_dir().unwrap();
        assert!(dir.ends_with(AUTHFLOW_DIR));
    }

    #[test]
    fn test_env_override() {
        let _lock = env_lock();
        unsafe { std::env::set_var(AUTHFLOW_DIR_ENV, "/tmp/test-authflow") };
        let dir = resolve_authflow_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-authflow"));
        unsafe { std::env::remove_var(AUTHFLOW_DIR_ENV) };
    }

    #[test]
    fn test_database_path() {
        let _lock = env_lock();
        unsafe { std::env::remove_var(AUTHFLOW_DIR_ENV) };
        let path = database_path().unwrap();
        assert!(path.ends_with(DB_FILE));
        assert!(path.parent().unwrap().ends_with(AUTHFLOW_DIR));
    }

    #[test]
    fn test_profile_dir_is_per_identity() {
        let _lock = env_lock();
        let temp = tempfile::tempdir().unwrap();
        unsafe { std::env::set_var(AUTHFLOW_DIR_ENV, temp.path()) };

        let a = profile_dir_for("id-a").unwrap();
        let b = profile_dir_for("id-b").unwrap();
        assert_ne!(a, b);
        assert!(a.ends_with("profiles/id-a"));

        unsafe { std::env::remove_var(AUTHFLOW_DIR_ENV) };
    }
}
