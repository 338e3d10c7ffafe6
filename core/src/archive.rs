//! Tarball extraction for `download_tarball`.
//!
//! Plain and gzip-compressed tar archives are both accepted; the format is
//! sniffed from the gzip magic bytes rather than the file name.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extract every member of the tar archive at `archive` into `dest`,
/// creating `dest` if needed.
pub fn extract_tarball(archive: &Path, dest: &Path) -> Result<()> {
    let wrap = |source: io::Error| Error::Archive {
        path: archive.to_path_buf(),
        source,
    };

    fs::create_dir_all(dest).map_err(wrap)?;
    let mut reader = BufReader::new(File::open(archive).map_err(wrap)?);
    let gzipped = reader.fill_buf().map_err(wrap)?.starts_with(&GZIP_MAGIC);
    debug!(archive = %archive.display(), dest = %dest.display(), gzipped, "extracting tarball");

    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };
    tar::Archive::new(reader).unpack(dest).map_err(wrap)
}
