//! Durable key-value persistence for configuration and tokens.
//!
//! The store is a dotenv-format file holding both the externally supplied
//! configuration (`APP_KEY`, `APP_SECRET`, `APP_CALLBACK_URL`, `BASE_URL`)
//! and the session state written back by the auth flows (`AUTH_CODE_URL`,
//! `AUTH_CODE`, `ACCESS_TOKEN`, `REFRESH_TOKEN`, `ID_TOKEN`). The file's
//! modification time doubles as the session-freshness signal.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Application name used for the default store path
const APP_NAME: &str = "tradewatch";

/// Store file name under the config directory
const STORE_FILE: &str = "credentials.env";

/// Age reported for a store that does not exist yet.
/// Large enough to exceed any reasonable max-age threshold, so a missing
/// store always forces a fresh authorization.
pub const STORE_MISSING_AGE_DAYS: i64 = 9999;

const SECONDS_PER_DAY: u64 = 86_400;

// Configuration keys, supplied externally before first use
pub const KEY_APP_KEY: &str = "APP_KEY";
pub const KEY_APP_SECRET: &str = "APP_SECRET";
pub const KEY_CALLBACK_URL: &str = "APP_CALLBACK_URL";
pub const KEY_BASE_URL: &str = "BASE_URL";

// Session-state keys, written by the auth flows
pub const KEY_AUTH_CODE_URL: &str = "AUTH_CODE_URL";
pub const KEY_AUTH_CODE: &str = "AUTH_CODE";
pub const KEY_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const KEY_REFRESH_TOKEN: &str = "REFRESH_TOKEN";
pub const KEY_ID_TOKEN: &str = "ID_TOKEN";

/// Immutable API configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_key: String,
    pub app_secret: String,
    pub callback_url: String,
    pub base_url: String,
}

impl Credentials {
    /// Load configuration from the store. All four keys must be present.
    pub fn from_store(store: &EnvStore) -> Result<Self> {
        let values = store.load()?;
        Ok(Self {
            app_key: require(&values, KEY_APP_KEY)?,
            app_secret: require(&values, KEY_APP_SECRET)?,
            callback_url: require(&values, KEY_CALLBACK_URL)?,
            base_url: require(&values, KEY_BASE_URL)?,
        })
    }
}

fn require(values: &HashMap<String, String>, key: &str) -> Result<String> {
    values
        .get(key)
        .cloned()
        .filter(|value| !value.is_empty())
        .with_context(|| format!("Missing {} in credential store", key))
}

/// File-backed key-value store in dotenv format.
pub struct EnvStore {
    path: PathBuf,
}

impl EnvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default store location under the user config directory.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every key in the store. A store that does not exist yet is empty.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(&self.path).context("Failed to open credential store")? {
            let (key, value) = item.context("Failed to parse credential store entry")?;
            values.insert(key, value);
        }
        Ok(values)
    }

    /// Durable single-key write. Overwrites any existing value and creates
    /// the store if absent.
    pub fn save(&self, key: &str, value: &str) -> Result<()> {
        self.save_all(&[(key, value)])
    }

    /// Write several keys in one read-modify-write pass, so every field of a
    /// successful token exchange lands in the same write.
    pub fn save_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let existing = if self.path.exists() {
            fs::read_to_string(&self.path).context("Failed to read credential store")?
        } else {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .context("Failed to create credential store directory")?;
                }
            }
            String::new()
        };

        let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
        for (key, value) in entries {
            let prefix = format!("{}=", key);
            match lines
                .iter_mut()
                .find(|line| line.trim_start().starts_with(&prefix))
            {
                Some(line) => *line = format!("{}={}", key, value),
                None => lines.push(format!("{}={}", key, value)),
            }
        }

        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(&self.path, contents).context("Failed to write credential store")?;
        Ok(())
    }

    /// Age of the store in whole days, from the filesystem mtime.
    /// A missing store reports [`STORE_MISSING_AGE_DAYS`].
    pub fn age_days(&self) -> i64 {
        let Ok(metadata) = fs::metadata(&self.path) else {
            return STORE_MISSING_AGE_DAYS;
        };
        let Ok(modified) = metadata.modified() else {
            return STORE_MISSING_AGE_DAYS;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(elapsed) => (elapsed.as_secs() / SECONDS_PER_DAY) as i64,
            // mtime in the future: clock skew, treat as fresh
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> EnvStore {
        EnvStore::new(dir.path().join(STORE_FILE))
    }

    #[test]
    fn load_missing_store_is_empty() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);

        store.save(KEY_APP_KEY, "client-id").expect("save");
        store.save(KEY_BASE_URL, "https://api.example.com").expect("save");

        let values = store.load().expect("load");
        assert_eq!(values.get(KEY_APP_KEY).map(String::as_str), Some("client-id"));
        assert_eq!(
            values.get(KEY_BASE_URL).map(String::as_str),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn save_overwrites_existing_value() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);

        store.save(KEY_ACCESS_TOKEN, "first").expect("save");
        store.save(KEY_ACCESS_TOKEN, "second").expect("save");

        let values = store.load().expect("load");
        assert_eq!(values.get(KEY_ACCESS_TOKEN).map(String::as_str), Some("second"));
        // No duplicate line was appended
        let raw = std::fs::read_to_string(store.path()).expect("read");
        assert_eq!(raw.matches(KEY_ACCESS_TOKEN).count(), 1);
    }

    #[test]
    fn save_all_writes_every_key_together() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(KEY_APP_KEY, "client-id").expect("save");

        store
            .save_all(&[
                (KEY_ACCESS_TOKEN, "a1"),
                (KEY_REFRESH_TOKEN, "r1"),
                (KEY_ID_TOKEN, "i1"),
            ])
            .expect("save_all");

        let values = store.load().expect("load");
        assert_eq!(values.get(KEY_APP_KEY).map(String::as_str), Some("client-id"));
        assert_eq!(values.get(KEY_ACCESS_TOKEN).map(String::as_str), Some("a1"));
        assert_eq!(values.get(KEY_REFRESH_TOKEN).map(String::as_str), Some("r1"));
        assert_eq!(values.get(KEY_ID_TOKEN).map(String::as_str), Some("i1"));
    }

    #[test]
    fn age_of_missing_store_is_sentinel() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert_eq!(store.age_days(), STORE_MISSING_AGE_DAYS);
    }

    #[test]
    fn age_of_fresh_store_is_zero() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(KEY_APP_KEY, "client-id").expect("save");
        assert_eq!(store.age_days(), 0);
    }

    #[test]
    fn credentials_require_all_config_keys() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        store
            .save_all(&[
                (KEY_APP_KEY, "client-id"),
                (KEY_APP_SECRET, "client-secret"),
                (KEY_CALLBACK_URL, "https://127.0.0.1:8182"),
            ])
            .expect("save_all");

        let err = Credentials::from_store(&store).expect_err("BASE_URL is missing");
        assert!(err.to_string().contains(KEY_BASE_URL));

        store.save(KEY_BASE_URL, "https://api.example.com").expect("save");
        let credentials = Credentials::from_store(&store).expect("credentials");
        assert_eq!(credentials.app_key, "client-id");
        assert_eq!(credentials.base_url, "https://api.example.com");
    }
}
