//! Resource byte-stream loading

use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Source of embedded resources (fonts) by path
pub trait ResourceLoader: Send + Sync {
    /// Bytes of the resource at `path`, `None` when it does not exist
    fn load(&self, path: &str) -> Option<Vec<u8>>;
}

/// Resources compiled into the binary or otherwise held in memory
#[derive(Default)]
pub struct EmbeddedResources {
    entries: FxHashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `'static` resource, typically from `include_bytes!`
    pub fn with_static(mut self, path: &str, bytes: &'static [u8]) -> Self {
        self.entries.insert(path.to_string(), Cow::Borrowed(bytes));
        self
    }

    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.entries.insert(path.to_string(), Cow::Owned(bytes));
    }
}

impl ResourceLoader for EmbeddedResources {
    fn load(&self, path: &str) -> Option<Vec<u8>> {
        self.entries.get(path).map(|bytes| bytes.to_vec())
    }
}

/// Resources read from files below a root directory
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ResourceLoader for DirectoryResources {
    fn load(&self, path: &str) -> Option<Vec<u8>> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("Resource {:?} not readable: {}", full, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_lookup() {
        let mut resources = EmbeddedResources::new().with_static("a.ttf", b"abc");
        resources.insert("b.ttf", vec![1, 2]);
        assert_eq!(resources.load("a.ttf"), Some(b"abc".to_vec()));
        assert_eq!(resources.load("b.ttf"), Some(vec![1, 2]));
        assert_eq!(resources.load("missing.ttf"), None);
    }

    #[test]
    fn test_directory_missing_file() {
        let resources = DirectoryResources::new(std::env::temp_dir());
        assert_eq!(resources.load("parabol-definitely-missing.ttf"), None);
    }
}
