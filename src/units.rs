//! Finding compilation units on disk and compiling them one file at a time.
use crate::lexer::dump_tokens;
use crate::JackcError;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = "jack";
pub const OUTPUT_EXTENSION: &str = "vm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl Unit {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let output = source.with_extension(OUTPUT_EXTENSION);
        Unit { source, output }
    }

    /// Output path for the token listing, `FooT.xml` next to `Foo.jack`.
    pub fn token_listing(&self) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.source.with_file_name(format!("{}T.xml", stem))
    }
}

fn is_source(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e == SOURCE_EXTENSION)
            .unwrap_or(false)
}

/// A source file gives one unit; a directory gives one per `.jack` file in it.
pub fn discover(path: impl AsRef<Path>) -> Result<Vec<Unit>, JackcError> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut sources = std::fs::read_dir(path)?
            .map(|e| e.map(|d| d.path()))
            .collect::<Result<Vec<_>, _>>()?;
        sources.retain(|p| is_source(p));
        sources.sort();

        if sources.is_empty() {
            return Err(JackcError::NoSources(path.to_path_buf()));
        }
        Ok(sources.into_iter().map(Unit::new).collect())
    } else if is_source(path) {
        Ok(vec![Unit::new(path)])
    } else if path.exists() {
        Err(JackcError::NoSources(path.to_path_buf()))
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )
        .into())
    }
}

fn write_scoped(
    output: &Path,
    f: impl FnOnce(&mut BufWriter<File>) -> Result<(), JackcError>,
) -> Result<(), JackcError> {
    let mut out = BufWriter::new(File::create(output)?);
    let result = f(&mut out).and_then(|()| out.flush().map_err(JackcError::from));

    if result.is_err() {
        drop(out);
        if let Err(e) = std::fs::remove_file(output) {
            warn!("could not remove {}: {}", output.display(), e);
        }
    }
    result
}

/// Compiles `unit.source` into `unit.output`. On failure no output file is left behind.
pub fn compile_unit(unit: &Unit) -> Result<(), JackcError> {
    debug!("{} -> {}", unit.source.display(), unit.output.display());
    let src = BufReader::new(File::open(&unit.source)?);
    write_scoped(&unit.output, |out| {
        crate::compile(src, out)?;
        Ok(())
    })
}

/// Writes the XML token listing of `unit.source` next to it.
pub fn dump_unit_tokens(unit: &Unit) -> Result<PathBuf, JackcError> {
    let listing = unit.token_listing();
    debug!("{} -> {}", unit.source.display(), listing.display());
    let src = BufReader::new(File::open(&unit.source)?);
    write_scoped(&listing, |out| dump_tokens(src, out))?;
    Ok(listing)
}
