//! Mapping between definitions and stored record locations
//!
//! A collection path pattern such as `src/content/posts/*` places each
//! record at `src/content/posts/<identity>.<ext>`. A singleton path such
//! as `src/content/site/data` is stored at `src/content/site/data.<ext>`.
//! The extension is `yaml` for data-typed records and `mdoc` for
//! content-typed ones.

use super::errors::{StorageError, StorageResult};
use super::record::RecordLocator;
use crate::schema::{Definition, RecordFormat};

/// Extension of data-typed records
pub const DATA_EXTENSION: &str = "yaml";
/// Extension of content-typed records
pub const CONTENT_EXTENSION: &str = "mdoc";

/// Where the records of one definition live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    /// Directory holding the records, `/` separated, empty for the root
    directory: String,
    /// File stem text before the identity
    stem_prefix: String,
    /// File stem text after the identity
    stem_suffix: String,
    format: RecordFormat,
    singleton: bool,
}

impl RecordLayout {
    /// Derives the layout of a registered definition.
    pub fn for_definition(definition: &Definition) -> StorageResult<Self> {
        let path = definition.path().trim_matches('/');
        let format = definition.format();

        let (directory, stem) = match path.rsplit_once('/') {
            Some((directory, stem)) => (directory, stem),
            None => ("", path),
        };
        if directory.contains('*') {
            return Err(StorageError::InvalidPath(format!(
                "{}: the identity placeholder must be in the file name",
                definition.path()
            )));
        }

        let (stem_prefix, stem_suffix, singleton) = if definition.is_collection() {
            let (prefix, suffix) = stem.split_once('*').ok_or_else(|| {
                StorageError::InvalidPath(format!(
                    "{}: collection path has no identity placeholder",
                    definition.path()
                ))
            })?;
            (prefix, suffix, false)
        } else {
            (stem, "", true)
        };

        Ok(Self {
            directory: directory.to_string(),
            stem_prefix: stem_prefix.to_string(),
            stem_suffix: stem_suffix.to_string(),
            format,
            singleton,
        })
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    pub fn extension(&self) -> &'static str {
        match self.format {
            RecordFormat::Data => DATA_EXTENSION,
            RecordFormat::Content => CONTENT_EXTENSION,
        }
    }

    /// Locator of the collection record with the given identity
    pub fn locate(&self, identity: &str) -> RecordLocator {
        self.locator_for_stem(&format!(
            "{}{}{}",
            self.stem_prefix, identity, self.stem_suffix
        ))
    }

    /// Locator of the singleton record
    pub fn singleton_locator(&self) -> RecordLocator {
        self.locator_for_stem(&self.stem_prefix)
    }

    /// Returns a locator when `path` names a record of this layout.
    ///
    /// Only direct children of the directory with the layout's extension
    /// match; other files in the directory are ignored.
    pub fn match_path(&self, path: &str) -> Option<RecordLocator> {
        let name = if self.directory.is_empty() {
            path
        } else {
            path.strip_prefix(&self.directory)?.strip_prefix('/')?
        };
        if name.contains('/') {
            return None;
        }
        let stem = name.strip_suffix(self.extension())?.strip_suffix('.')?;
        if self.singleton {
            return (stem == self.stem_prefix).then(|| self.locator_for_stem(stem));
        }
        let identity = stem
            .strip_prefix(&self.stem_prefix)?
            .strip_suffix(&self.stem_suffix)?;
        (!identity.is_empty()).then(|| self.locator_for_stem(stem))
    }

    fn locator_for_stem(&self, stem: &str) -> RecordLocator {
        let path = if self.directory.is_empty() {
            format!("{}.{}", stem, self.extension())
        } else {
            format!("{}/{}.{}", self.directory, stem, self.extension())
        };
        RecordLocator::with_format(path, self.format)
    }
}
