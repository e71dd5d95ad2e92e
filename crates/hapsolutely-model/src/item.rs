//! Items held by an item store.
//!
//! An [`Item`] is either a group (a container such as "Sequence files") or a
//! loaded input file carrying its [`FileInfo`] metadata. Items are identified
//! by a process-unique [`ItemId`] that stays stable while the item moves
//! between rows.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique item IDs.
static ITEM_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an item in a store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn next() -> Self {
        Self(ITEM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

/// Input file formats recognized by the batch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Fasta,
    Tabfile,
    Spart,
    Newick,
    Unknown,
}

/// Metadata of a loaded input file.
///
/// The batch layer reads the format and column layout to decide how
/// identifiers and alleles are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub format: FileFormat,
    /// File size in bytes.
    pub size: u64,
    /// FASTA identifiers carry a subset after `subset_separator`.
    pub has_subsets: bool,
    pub subset_separator: char,
    /// Column headers of tabular files; empty for other formats.
    pub headers: Vec<String>,
    pub individual_column: Option<usize>,
    pub sequence_column: Option<usize>,
    pub allele_column: Option<usize>,
    /// Records come in allele pairs per individual.
    pub is_phased: bool,
}

impl FileInfo {
    /// Creates metadata for a file of the given format with no columns.
    pub fn new(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            path: path.into(),
            format,
            size: 0,
            has_subsets: false,
            subset_separator: '|',
            headers: Vec::new(),
            individual_column: None,
            sequence_column: None,
            allele_column: None,
            is_phased: false,
        }
    }

    /// Creates metadata for a FASTA file.
    pub fn fasta(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileFormat::Fasta)
    }

    /// Creates metadata for a tabular file, locating the individual and
    /// sequence columns by header name and the allele column by
    /// `allele_header`. A tabular file is phased exactly when it has an
    /// allele column.
    pub fn tabfile(
        path: impl Into<PathBuf>,
        headers: Vec<String>,
        individual_header: &str,
        sequence_header: &str,
        allele_header: &str,
    ) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let individual_column = find(individual_header);
        let sequence_column = find(sequence_header);
        let allele_column = find(allele_header);
        Self {
            individual_column,
            sequence_column,
            allele_column,
            is_phased: allele_column.is_some(),
            headers,
            ..Self::new(path, FileFormat::Tabfile)
        }
    }

    /// Sets the file size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Marks FASTA identifiers as carrying subsets.
    pub fn with_subsets(mut self, separator: char) -> Self {
        self.has_subsets = true;
        self.subset_separator = separator;
        self
    }

    /// Sets whether records come in allele pairs.
    pub fn phased(mut self, is_phased: bool) -> Self {
        self.is_phased = is_phased;
        self
    }

    /// The file name, or the whole path when it has none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header of the allele column, if the file has one.
    pub fn allele_header(&self) -> Option<&str> {
        self.allele_column
            .and_then(|column| self.headers.get(column))
            .map(String::as_str)
    }

    /// Whether the column layout can be used to read sequences.
    ///
    /// Tabular files need distinct individual and sequence columns, and an
    /// allele column that overlaps neither. Other formats are always usable.
    pub fn is_valid(&self) -> bool {
        if self.format != FileFormat::Tabfile {
            return true;
        }
        let (Some(individual), Some(sequence)) = (self.individual_column, self.sequence_column)
        else {
            return false;
        };
        if individual == sequence {
            return false;
        }
        match self.allele_column {
            Some(allele) => allele != individual && allele != sequence,
            None => true,
        }
    }
}

/// What an item represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// A container of other items.
    Group,
    /// A loaded input file.
    File(FileInfo),
}

/// An entry in an item store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
}

impl Item {
    pub(crate) fn group(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::next(),
            name: name.into(),
            kind: ItemKind::Group,
        }
    }

    pub(crate) fn file(info: FileInfo) -> Self {
        Self {
            id: ItemId::next(),
            name: info.file_name(),
            kind: ItemKind::File(info),
        }
    }

    /// File metadata, if this item is a file.
    pub fn info(&self) -> Option<&FileInfo> {
        match &self.kind {
            ItemKind::File(info) => Some(info),
            ItemKind::Group => None,
        }
    }
}
