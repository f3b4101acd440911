//! Local filesystem access

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::warn;

/// Immediate children of one directory, each list sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

/// Local tree as seen by the synchronizer
pub trait LocalFs {
    type Reader: Read;

    /// List subdirectories and files directly inside `dir`
    fn list_entries(&self, dir: &Path) -> io::Result<DirListing>;

    /// Open a file for streaming its contents
    fn open_for_read(&self, path: &Path) -> io::Result<Self::Reader>;
}

/// The host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl LocalFs for DiskFs {
    type Reader = BufReader<File>;

    fn list_entries(&self, dir: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().into_string().map_err(|raw| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("file name is not valid UTF-8: {:?}", raw),
                )
            })?;

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                listing.directories.push(name);
            } else if file_type.is_file() {
                listing.files.push(name);
            } else if file_type.is_symlink() {
                // Follow links to files; linked directories could loop
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => listing.files.push(name),
                    Ok(_) => warn!(path = %entry.path().display(), "Skipping symlink to directory"),
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "Skipping dangling symlink")
                    }
                }
            } else {
                warn!(path = %entry.path().display(), "Skipping special file");
            }
        }

        listing.directories.sort();
        listing.files.sort();
        Ok(listing)
    }

    fn open_for_read(&self, path: &Path) -> io::Result<Self::Reader> {
        Ok(BufReader::with_capacity(128 * 1024, File::open(path)?))
    }
}
