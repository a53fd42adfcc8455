use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(unix)]
use std::{fs::Permissions, os::unix::fs::PermissionsExt};

pub const APP_DIR_NAME: &str = ".termpal";

pub fn read_text_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}

pub fn home_dir() -> io::Result<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME is not set"))
}

pub fn app_dir() -> io::Result<PathBuf> {
    Ok(home_dir()?.join(APP_DIR_NAME))
}

/// Layers `overrides` on top of `defaults`, table by table. Scalars and
/// arrays in `overrides` replace the default value wholesale.
pub fn merge_toml_text(defaults: &str, overrides: Option<&str>) -> io::Result<toml::Value> {
    let mut merged = parse_toml_table(defaults)?;
    let override_value = parse_toml_table(overrides.unwrap_or_default())?;
    merge_toml_tables(&mut merged, override_value);
    Ok(merged)
}

fn parse_toml_table(text: &str) -> io::Result<toml::Value> {
    if text.trim().is_empty() {
        return Ok(toml::Value::Table(toml::map::Map::new()));
    }
    toml::from_str(text).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn merge_toml_tables(base: &mut toml::Value, override_value: toml::Value) {
    match (base, override_value) {
        (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
            for (key, override_item) in override_map {
                if let Some(base_item) = base_map.get_mut(&key) {
                    merge_toml_tables(base_item, override_item);
                } else {
                    base_map.insert(key, override_item);
                }
            }
        }
        (base_slot, override_item) => {
            *base_slot = override_item;
        }
    }
}

/// Writes through a sibling temp file and renames it into place, so a crash
/// never leaves a half-written config behind. The file is owner-only since
/// it holds the API key.
pub fn write_text_file_atomic(path: &Path, text: &str) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "target path has no parent directory",
        )
    })?;
    fs::create_dir_all(parent)?;
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("config.toml");
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    for attempt in 0..16u8 {
        let tmp = parent.join(format!(".{file_name}.tmp-{pid}-{nanos}-{attempt}"));
        match OpenOptions::new().write(true).create_new(true).open(&tmp) {
            Ok(file) => {
                ensure_owner_only_permissions(&tmp)?;
                let mut writer = BufWriter::new(file);
                writer.write_all(text.as_bytes())?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
                if let Err(err) = fs::rename(&tmp, path) {
                    let _ = fs::remove_file(&tmp);
                    return Err(err);
                }
                sync_directory(parent)?;
                return Ok(());
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "failed to allocate temporary config file name",
    ))
}

/// Opens `path` for appending, creating it (and its directory) owner-only.
pub fn open_private_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(unix)]
fn ensure_owner_only_permissions(path: &Path) -> io::Result<()> {
    fs::set_permissions(path, Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn ensure_owner_only_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> io::Result<()> {
    Ok(())
}
