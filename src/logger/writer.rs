//! Log file handle used as the file layer's writer

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;

use crate::logger::config::FileConfig;

/// Open the configured log file, creating its parent directory.
///
/// The `Mutex` makes the handle a `MakeWriter`; each event is written
/// under the lock so lines from concurrent tasks never interleave.
pub(crate) fn open_log_file(config: &FileConfig) -> io::Result<Mutex<File>> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)?;

    Ok(Mutex::new(file))
}
