//! Whole-session zip assembly.
//!
//! # Design
//!
//! - Entries are the regular files directly inside the session, sorted by name.
//! - The archive is written to an anonymous temp file that vanishes once closed.
//! - A file that cannot be opened or read through is skipped; `discovered` still counts it.
//! - An archive with no included entries is a miss.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use mediadrop_core::SessionId;
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::delivery::is_media;
use crate::error::{SessionError, SessionResult};
use crate::store::SessionStore;

const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// A finished archive ready to stream.
#[derive(Debug)]
pub struct SessionArchive {
    /// Owning session.
    pub session: SessionId,
    /// Anonymous temp file rewound to the start.
    pub file: File,
    /// Archive size in bytes.
    pub len: u64,
    /// Download name, `download_{session}.zip`.
    pub file_name: String,
    /// Files written into the archive.
    pub included: usize,
    /// Regular files found in the session.
    pub discovered: usize,
}

impl SessionStore {
    /// Zip every regular file of a session into a temp file under `scratch_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] when the session is unknown or has no
    /// readable files, and [`SessionError::Io`] or [`SessionError::Zip`] when
    /// writing the archive fails.
    pub fn build_archive(&self, session: &str, scratch_dir: &Path) -> SessionResult<SessionArchive> {
        let (id, dir) = self.locate(session)?;
        let listing = session_files(&dir)?;
        if listing.names.is_empty() {
            return Err(SessionError::NotFound);
        }

        let temp = tempfile::tempfile_in(scratch_dir)
            .map_err(|err| SessionError::io("archive.tempfile", scratch_dir, err))?;
        let (mut file, included) = write_archive(&dir, &listing.names, temp)?;
        if included == 0 {
            return Err(SessionError::NotFound);
        }
        let len = file
            .seek(SeekFrom::End(0))
            .map_err(|err| SessionError::io("archive.measure", &dir, err))?;
        file.rewind()
            .map_err(|err| SessionError::io("archive.rewind", &dir, err))?;

        info!(
            session_id = %id,
            included,
            discovered = listing.discovered,
            bytes = len,
            "session archive built"
        );
        Ok(SessionArchive {
            session: id,
            file,
            len,
            file_name: format!("download_{id}.zip"),
            included,
            discovered: listing.discovered,
        })
    }
}

/// Regular files of a session: the archivable names plus everything counted.
struct Listing {
    names: Vec<String>,
    discovered: usize,
}

fn session_files(dir: &Path) -> SessionResult<Listing> {
    let mut listing = Listing {
        names: Vec::new(),
        discovered: 0,
    };
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| SessionError::walkdir("archive.list", dir, err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        listing.discovered += 1;
        match entry.file_name().to_str() {
            Some(name) => listing.names.push(name.to_string()),
            None => warn!(file = ?entry.file_name(), "skipping session file with a non-utf8 name"),
        }
    }
    Ok(listing)
}

/// Write `names` from `dir` into a flat zip on `sink`; returns the sink and the entry count.
pub(crate) fn write_archive(
    dir: &Path,
    names: &[String],
    sink: File,
) -> SessionResult<(File, usize)> {
    let mut writer = ZipWriter::new(sink);
    let mut included = 0;
    for name in names {
        let path = dir.join(name);
        let mut source = match File::open(&path) {
            Ok(source) => source,
            Err(err) => {
                warn!(file = %name, error = %err, "skipping unreadable session file");
                continue;
            }
        };
        let size = source.metadata().map(|meta| meta.len()).unwrap_or_default();
        if append_entry(&mut writer, name, &mut source, size)? {
            included += 1;
        }
    }
    let sink = writer
        .finish()
        .map_err(|err| SessionError::zip("archive.finish", dir, err))?;
    Ok((sink, included))
}

/// Copy one entry into the archive; a read failure drops the entry and reports `false`.
fn append_entry<W, R>(
    writer: &mut ZipWriter<W>,
    name: &str,
    source: &mut R,
    size: u64,
) -> SessionResult<bool>
where
    W: Write + Seek,
    R: Read,
{
    let method = if is_media(name) {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    let options = FileOptions::<()>::default()
        .compression_method(method)
        .unix_permissions(0o644)
        .large_file(size >= ZIP64_THRESHOLD);
    writer
        .start_file(name, options)
        .map_err(|err| SessionError::zip("archive.start_entry", name, err))?;
    match io::copy(source, writer) {
        Ok(_) => Ok(true),
        Err(err) => {
            warn!(file = %name, error = %err, "skipping session file that failed mid-read");
            writer
                .abort_file()
                .map_err(|err| SessionError::zip("archive.abort_entry", name, err))?;
            Ok(false)
        }
    }
}
