//! # State File Store
//!
//! Persists the chain state next to the log. Writes go through a temp file,
//! `sync_all` and `rename`, so a reader sees either the old state or the new
//! one.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::codec::state_file;
use crate::domain::errors::{Result, SigError};
use crate::domain::imprint::Imprint;

/// Load the last leaf, if a state file exists.
pub fn load(path: &Path) -> Result<Option<Imprint>> {
    match fs::read(path) {
        Ok(bytes) => state_file::decode(&bytes).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SigError::io(e, format!("reading {}", path.display()))),
    }
}

/// Replace the state file atomically.
pub fn save(path: &Path, last_leaf: &Imprint) -> Result<()> {
    let bytes = state_file::encode(last_leaf);

    // Write atomically via temp file
    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    let mut file = fs::File::create(temp_path)
        .map_err(|e| SigError::io(e, format!("creating {}", temp_path.display())))?;
    file.write_all(&bytes)
        .map_err(|e| SigError::io(e, format!("writing {}", temp_path.display())))?;
    file.sync_all()
        .map_err(|e| SigError::io(e, format!("syncing {}", temp_path.display())))?;

    fs::rename(temp_path, path)
        .map_err(|e| SigError::io(e, format!("renaming to {}", path.display())))
}
