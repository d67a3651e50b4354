//! Atomic output writing

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ApplicatorError, ApplicatorErrorKind, During, Operation, Result};

/// Write `output` through a temporary file in the same directory.
///
/// The temporary file is renamed over `output` only after `write` succeeded
/// and the data reached the disk; on any failure it is removed.
pub fn write_atomically<F>(output: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::result::Result<(), ApplicatorErrorKind>,
{
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".redact-")
        .suffix(".part")
        .tempfile_in(dir)
        .during(Operation::Save)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(|kind| ApplicatorError::new(Operation::Save, kind))?;
        writer.flush().during(Operation::Save)?;
    }
    tmp.as_file().sync_all().during(Operation::Save)?;

    tmp.persist(output)
        .map_err(|e| ApplicatorError::new(Operation::Save, e.error))?;

    tracing::debug!("Wrote {}", output.display());
    Ok(())
}
