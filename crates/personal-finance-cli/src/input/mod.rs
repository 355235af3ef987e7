pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a command's JSON input: `--input <file>` first, then piped stdin.
/// Returns None when neither is present so the caller can fall back to flags.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        log::debug!("reading input from {}", path);
        return Ok(Some(file::read_json(path)?));
    }
    let piped = stdin::read_stdin::<T>()?;
    if piped.is_some() {
        log::debug!("reading input from stdin");
    }
    Ok(piped)
}
