/// Configuration system for mailsort.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::MailsortConfig::default()`]
/// 2. **User global config**: `~/.mailsort/config.toml`
/// 3. **Project local config**: `.mailsort.toml` in the current directory
/// 4. **Environment variables**: `MAILSORT_*` overrides (highest precedence)
///
/// File layers are merged key by key: a file that only sets
/// `endpoint.retries` leaves every other value from the previous layer in
/// place. Malformed files are ignored.
///
/// # Usage
///
/// ```rust,ignore
/// let cfg = mailsort::config::load();
/// let client = HttpClient::from_config(&cfg.endpoint);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::MailsortConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> MailsortConfig {
    let mut config = load_layers(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files (lowest precedence first) over the defaults.
///
/// Missing or malformed files are skipped.
pub fn load_layers(paths: &[Option<PathBuf>]) -> MailsortConfig {
    let mut merged = match toml::Value::try_from(MailsortConfig::default()) {
        Ok(v) => v,
        Err(_) => return MailsortConfig::default(),
    };

    for path in paths.iter().flatten() {
        if let Some(layer) = load_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as a raw value tree. `None` if missing or malformed.
fn load_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Reject files that parse as TOML but not as our schema.
    toml::from_str::<MailsortConfig>(&content).ok()?;
    Some(value)
}

/// Overlay `overlay` onto `base`, recursing into tables.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.mailsort/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mailsort").join("config.toml"))
}

/// Path to the project local config: `.mailsort.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".mailsort.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `MAILSORT_ENDPOINT`: analyze endpoint URL
/// - `MAILSORT_TIMEOUT_MS`: per-attempt request timeout
/// - `MAILSORT_RETRIES`: extra attempts on transient failure
/// - `MAILSORT_STORAGE_DIR`: history storage directory
/// - `MAILSORT_LOGGING`: event logging on/off (`1`/`true`/`yes`/`on`)
/// - `MAILSORT_WEB_ADDR`: dashboard listen address
pub fn apply_env_overrides(config: &mut MailsortConfig) {
    if let Ok(val) = std::env::var("MAILSORT_ENDPOINT")
        && !val.is_empty()
    {
        config.endpoint.url = val;
    }
    if let Ok(val) = std::env::var("MAILSORT_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.endpoint.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("MAILSORT_RETRIES")
        && let Ok(n) = val.parse::<u32>()
    {
        config.endpoint.retries = n;
    }
    if let Ok(val) = std::env::var("MAILSORT_STORAGE_DIR")
        && !val.is_empty()
    {
        config.storage.dir = val;
    }
    if let Ok(val) = std::env::var("MAILSORT_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("MAILSORT_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.mailsort/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, MailsortConfig::default_toml()).context("failed to write config file")
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `endpoint.retries`. The existing value's type
/// decides how `value` is parsed.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&MailsortConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;

    // Keys missing from a hand-trimmed file still resolve against defaults.
    let defaults = toml::Value::try_from(MailsortConfig::default())
        .context("failed to serialize default config")?;
    let mut full = defaults;
    merge_values(&mut full, root.clone());
    set_toml_value(&mut full, key, value)?;

    let section = key.split('.').next().unwrap_or(key);
    if let (Some(table), Some(updated)) = (root.as_table_mut(), full.get(section)) {
        table.insert(section.to_string(), updated.clone());
    }

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    // The result must still load as a valid config.
    toml::from_str::<MailsortConfig>(&output)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        None => anyhow::bail!("unknown config key: '{key}'"),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_layers_with_no_files_is_defaults() {
        let config = load_layers(&[None, None]);
        assert_eq!(config, MailsortConfig::default());
    }

    #[test]
    fn later_layers_override_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(
            &global,
            "[endpoint]\nurl = \"http://10.0.0.5:8000/analyze\"\nretries = 3\n",
        )
        .unwrap();
        fs::write(&project, "[endpoint]\nretries = 1\n").unwrap();

        let config = load_layers(&[Some(global), Some(project)]);
        assert_eq!(config.endpoint.url, "http://10.0.0.5:8000/analyze");
        assert_eq!(config.endpoint.retries, 1);
        assert_eq!(config.endpoint.timeout_ms, 30_000);
    }

    #[test]
    fn malformed_layer_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[endpoint\nurl = ").unwrap();
        let wrong_type = dir.path().join("wrong.toml");
        fs::write(&wrong_type, "[endpoint]\nretries = \"many\"\n").unwrap();

        let config = load_layers(&[Some(bad), Some(wrong_type)]);
        assert_eq!(config, MailsortConfig::default());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn expand_home_handles_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            expand_home("~/.mailsort/x"),
            Some(home.join(".mailsort/x"))
        );
        assert_eq!(expand_home("/tmp/x"), Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn set_toml_value_parses_by_existing_type() {
        let mut root = toml::Value::try_from(MailsortConfig::default()).unwrap();
        set_toml_value(&mut root, "endpoint.retries", "4").unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        set_toml_value(&mut root, "web.addr", "0.0.0.0:8080").unwrap();

        let config: MailsortConfig = root.try_into().unwrap();
        assert_eq!(config.endpoint.retries, 4);
        assert!(!config.logging.enabled);
        assert_eq!(config.web.addr, "0.0.0.0:8080");
    }

    #[test]
    fn set_toml_value_rejects_unknown_and_mistyped_keys() {
        let mut root = toml::Value::try_from(MailsortConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "endpoint.nope", "v").is_err());
        assert!(set_toml_value(&mut root, "endpoint.timeout_ms", "soon").is_err());
        assert!(set_toml_value(&mut root, "endpoint..url", "v").is_err());
    }

    #[test]
    fn set_config_value_creates_and_updates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value_at(&path, "endpoint.retries", "2").unwrap();
        let config = load_layers(&[Some(path.clone())]);
        assert_eq!(config.endpoint.retries, 2);

        set_config_value_at(&path, "display.preview_chars", "120").unwrap();
        let config = load_layers(&[Some(path)]);
        assert_eq!(config.endpoint.retries, 2);
        assert_eq!(config.display.preview_chars, 120);
    }

    #[test]
    fn set_config_value_fills_missing_section_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[web]\nopen_browser = false\n").unwrap();

        set_config_value_at(&path, "endpoint.retries", "1").unwrap();
        let config = load_layers(&[Some(path)]);
        assert_eq!(config.endpoint.retries, 1);
        assert!(!config.web.open_browser);
    }

    #[test]
    fn write_default_config_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        assert!(write_default_config(&path, true).is_ok());
    }

    #[test]
    fn show_effective_config_returns_parseable_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: MailsortConfig = toml::from_str(&toml_str).unwrap();
    }
}
