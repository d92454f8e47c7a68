//! JSON input for commands: an explicit file wins, then piped stdin.

pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Read typed input from `path`, or from stdin when data is piped.
/// Returns `None` when neither is available so the caller can fall back to
/// flags.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json(path).map(Some);
    }
    stdin::read_stdin()
}
