//! Image storage and file naming.
//!
//! Extracted images are written to an [`ImageStore`] and read back for
//! encoding. With [`ImageNaming::BaseName`] two pictures whose media parts
//! share a base name overwrite each other in the store (last write wins),
//! and an earlier record no longer matches what is stored under its `src`.
//! Use [`ImageNaming::ContentHash`] or a per-request [`ImageNaming::Prefixed`]
//! namespace, or a fresh store per request, when that matters.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writable location for extracted images.
pub trait ImageStore {
    /// Store `bytes` under `name`, replacing any existing image of that name.
    fn persist(&mut self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Read back the image stored under `name`.
    fn load(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// How the stored file name of an image is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageNaming {
    /// The base name of the media part, e.g. `image1.png`.
    #[default]
    BaseName,
    /// SHA-256 of the image bytes plus the original extension.
    ContentHash,
    /// A caller-supplied prefix prepended to the base name.
    Prefixed(String),
}

impl ImageNaming {
    /// Stored name for an image with the given base name and content.
    pub fn file_name(&self, base_name: &str, bytes: &[u8]) -> String {
        match self {
            Self::BaseName => base_name.to_string(),
            Self::ContentHash => {
                let mut name = format!("{:x}", Sha256::digest(bytes));
                if let Some((_, ext)) = base_name.rsplit_once('.') {
                    if !ext.is_empty() {
                        name.push('.');
                        name.push_str(ext);
                    }
                }
                name
            }
            Self::Prefixed(prefix) => format!("{}{}", prefix, base_name),
        }
    }
}

/// Stores images as files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Use an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use a directory, creating it and any parents first.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an image of the given name is stored at.
    pub fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

impl ImageStore for DirectoryStore {
    fn persist(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(name)?;
        log::debug!("Writing image to {}", path.display());
        fs::write(path, bytes)
    }

    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(name)?)
    }
}

/// Keeps images in memory and leaves persistence to the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    images: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.images.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Take ownership of all stored images, keyed by name.
    pub fn into_images(self) -> BTreeMap<String, Vec<u8>> {
        self.images
    }
}

impl ImageStore for MemoryStore {
    fn persist(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_name(name)?;
        self.images.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        self.images.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("No image named '{}'", name))
        })
    }
}

/// Stored names must be a single path component.
fn check_name(name: &str) -> io::Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a plain file name", name),
        ));
    }
    Ok(())
}
