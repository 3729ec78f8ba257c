//! In-memory build output.

pub mod writer;

use indexmap::IndexMap;

/// What an emitted file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Style,
    Page,
    Media,
}

#[derive(Debug, Clone)]
pub struct OutputAsset {
    pub kind: AssetKind,
    pub content: Vec<u8>,
}

impl OutputAsset {
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Files to write, keyed by path relative to the output root
///
/// Emitting a filename twice keeps the last content, with a warning.
#[derive(Debug, Clone, Default)]
pub struct OutputAssets {
    files: IndexMap<String, OutputAsset>,
    overwritten: Vec<String>,
}

impl OutputAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, filename: impl Into<String>, kind: AssetKind, content: Vec<u8>) {
        let filename = filename.into();
        if let Some(previous) = self.files.get(&filename) {
            if previous.content == content {
                return;
            }
            tracing::warn!(filename = %filename, "output file emitted twice; keeping the last one");
            self.overwritten.push(filename.clone());
        }
        self.files.insert(filename, OutputAsset { kind, content });
    }

    pub fn get(&self, filename: &str) -> Option<&OutputAsset> {
        self.files.get(filename)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut OutputAsset> {
        self.files.get_mut(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputAsset)> {
        self.files.iter().map(|(name, asset)| (name.as_str(), asset))
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.files.values().map(OutputAsset::size).sum()
    }

    /// Filenames written more than once with different content
    pub fn overwritten(&self) -> &[String] {
        &self.overwritten
    }
}
