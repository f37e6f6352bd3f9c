use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Error};
use tempfile::NamedTempFile;

pub const STDIN_STDOUT: &str = "-";

/// Where the compiled PHP goes.
///
/// Files are written to a temporary file next to the target which replaces
/// the target on [`commit`](Output::commit).  If compilation fails the old
/// file stays in place.
pub enum Output {
    Stdout(io::Stdout),
    File { path: PathBuf, temp: NamedTempFile },
}

impl Output {
    pub fn open(path: &Path) -> Result<Output, Error> {
        if path == Path::new(STDIN_STDOUT) {
            return Ok(Output::Stdout(io::stdout()));
        }
        let path = std::env::current_dir()?.join(path);
        let dir = path
            .parent()
            .ok_or_else(|| anyhow!("cannot write to root"))?;
        let temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("unable to create output in '{}'", dir.display()))?;
        Ok(Output::File { path, temp })
    }

    pub fn commit(self) -> Result<(), Error> {
        match self {
            Output::Stdout(mut out) => out.flush()?,
            Output::File { path, temp } => {
                temp.persist(&path)
                    .with_context(|| format!("unable to write '{}'", path.display()))?;
                log::debug!("wrote {}", path.display());
            }
        }
        Ok(())
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(out) => out.write(buf),
            Output::File { temp, .. } => temp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(out) => out.flush(),
            Output::File { temp, .. } => temp.flush(),
        }
    }
}
