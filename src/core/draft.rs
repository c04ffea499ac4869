//! Draft files: the LDIF the operator edits, kept on disk until the run
//! either succeeds or hands it back for a retry.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

/// A uniquely named `.ldif` file. Dropping a `Draft` leaves the file in place;
/// it is only removed through [`Draft::discard`].
#[derive(Debug)]
pub struct Draft
{
    path: PathBuf,
}

impl Draft
{
    /// Create the file exclusively in `dir` (or the system temp directory)
    /// and write `contents` to it.
    pub fn create(
        dir: Option<&Path>,
        contents: &str,
    ) -> io::Result<Draft>
    {
        let mut builder = tempfile::Builder::new();
        builder
            .prefix("ldapvi-")
            .suffix(".ldif");
        let mut file = match dir
        {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(contents.as_bytes())?;
        file.flush()?;
        let (_, path) = file
            .keep()
            .map_err(|e| e.error)?;

        debug!(path = %path.display(), bytes = contents.len(), "draft written");
        Ok(Draft { path })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn read(&self) -> io::Result<String>
    {
        fs::read_to_string(&self.path)
    }

    /// Leave the file for the operator and return where it is.
    pub fn keep(self) -> PathBuf
    {
        self.path
    }

    /// Remove the file, returning the path it had.
    pub fn discard(self) -> io::Result<PathBuf>
    {
        match fs::remove_file(&self.path)
        {
            Ok(()) => {}
            // The editor may have moved it away already.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        debug!(path = %self.path.display(), "draft removed");
        Ok(self.path)
    }
}
