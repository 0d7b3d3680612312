use crate::{Error, Result};
use std::path::PathBuf;

/// A single token handed from the producer to exactly one worker.
pub type Item = String;

/// A finite, ordered supply of [`Item`]s.
///
/// The producer calls [`ItemSource::produce`] exactly once per run. An
/// implementation must be deterministic for a given backing resource and must
/// fail with [`Error::SourceUnavailable`] instead of returning an empty or
/// partial sequence when that resource cannot be read.
pub trait ItemSource: Send + Sync + 'static {
    /// Returns every item in source order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`] if the backing resource cannot be
    /// read.
    fn produce(&self) -> Result<Vec<Item>>;

    /// A short name used in diagnostics.
    fn name(&self) -> &str {
        "items"
    }
}

/// Splits `text` on whitespace into owned tokens.
pub fn tokenize(text: &str) -> Vec<Item> {
    text.split_whitespace().map(str::to_owned).collect()
}

/// Reads a UTF-8 text file and yields its whitespace-separated tokens.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl ItemSource for FileSource {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), fields(path = %self.name)))]
    fn produce(&self) -> Result<Vec<Item>> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::source_unavailable(&self.name, e))?;
        let items = tokenize(&text);

        #[cfg(feature = "tracing")]
        tracing::debug!("Read {} tokens from {}", items.len(), self.name);

        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory text tokenized on whitespace.
#[derive(Clone, Debug, Default)]
pub struct TextSource {
    text: String,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ItemSource for TextSource {
    fn produce(&self) -> Result<Vec<Item>> {
        Ok(tokenize(&self.text))
    }

    fn name(&self) -> &str {
        "text"
    }
}

impl ItemSource for Vec<Item> {
    fn produce(&self) -> Result<Vec<Item>> {
        Ok(self.clone())
    }
}

impl ItemSource for Vec<&'static str> {
    fn produce(&self) -> Result<Vec<Item>> {
        Ok(self.iter().map(|s| (*s).to_owned()).collect())
    }
}
