use epgsync_models::ChannelDefinition;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use crate::document::{channel_definitions, load_document};
use crate::error::SourceError;

/// Suffix of provider channel-definition documents.
pub const DEFINITION_FILE_SUFFIX: &str = ".channels.xml";

/// Lookup of EPG channel definitions by `xmltv_id`.
///
/// When an identifier appears in more than one document, the document that
/// sorts first by path wins.
pub trait SourceCatalog: Send + Sync {
    fn find_definition(&self, xmltv_id: &str) -> Option<ChannelDefinition>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDefinition {
    pub xmltv_id: String,
    pub kept: PathBuf,
    pub ignored: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogReport {
    pub documents: usize,
    pub skipped: Vec<SkippedDocument>,
    pub definitions: usize,
    pub duplicates: Vec<DuplicateDefinition>,
}

/// All `<root>/<provider>/<name>.channels.xml` files, sorted by path.
pub fn discover_definition_files(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::CatalogRootMissing(root.to_path_buf()));
    }

    let read_dir = |dir: &Path| {
        std::fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })
    };

    let mut files = Vec::new();
    for provider in read_dir(root)?.flatten() {
        let provider_dir = provider.path();
        if !provider_dir.is_dir() {
            continue;
        }
        let entries = match read_dir(&provider_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping provider directory: {}", e);
                continue;
            }
        };
        for file in entries.flatten() {
            let path = file.path();
            let is_definition = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(DEFINITION_FILE_SUFFIX));
            if is_definition && path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    debug!("Discovered {} channel definition files under {:?}", files.len(), root);
    Ok(files)
}

fn provider_name(document: &Path) -> String {
    document
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Catalog that re-reads the documents for every lookup.
///
/// Useful when only a handful of identifiers are queried.
pub struct ScanningCatalog {
    files: Vec<PathBuf>,
}

impl ScanningCatalog {
    pub fn new(root: &Path) -> Result<Self, SourceError> {
        Ok(Self {
            files: discover_definition_files(root)?,
        })
    }

    pub fn document_count(&self) -> usize {
        self.files.len()
    }
}

impl SourceCatalog for ScanningCatalog {
    fn find_definition(&self, xmltv_id: &str) -> Option<ChannelDefinition> {
        for path in &self.files {
            let root = match load_document(path) {
                Ok(root) => root,
                Err(e) => {
                    debug!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            let provider = provider_name(path);
            if let Some(definition) = channel_definitions(&root, &provider, path)
                .into_iter()
                .find(|d| d.xmltv_id == xmltv_id)
            {
                return Some(definition);
            }
        }
        None
    }
}

/// Catalog with every definition indexed up front.
pub struct IndexedCatalog {
    index: HashMap<String, ChannelDefinition>,
    report: CatalogReport,
}

impl IndexedCatalog {
    /// Parse every document under `root` (in parallel) and index its definitions.
    pub fn build(root: &Path) -> Result<Self, SourceError> {
        let start = Instant::now();
        let files = discover_definition_files(root)?;

        // par_iter().collect() keeps input order, so merging below is deterministic
        let parsed: Vec<(PathBuf, Result<Vec<ChannelDefinition>, String>)> = files
            .par_iter()
            .map(|path| {
                let outcome = load_document(path)
                    .map(|doc| channel_definitions(&doc, &provider_name(path), path))
                    .map_err(|e| e.to_string());
                (path.clone(), outcome)
            })
            .collect();

        let mut catalog = Self {
            index: HashMap::new(),
            report: CatalogReport {
                documents: files.len(),
                ..CatalogReport::default()
            },
        };

        for (path, outcome) in parsed {
            match outcome {
                Ok(definitions) => catalog.insert_all(definitions),
                Err(reason) => {
                    warn!("Skipping unreadable catalog document {:?}: {}", path, reason);
                    catalog.report.skipped.push(SkippedDocument { path, reason });
                }
            }
        }

        info!(
            "Indexed {} channel definitions from {} documents ({} skipped, {} duplicate ids) in {:?}",
            catalog.report.definitions,
            catalog.report.documents,
            catalog.report.skipped.len(),
            catalog.report.duplicates.len(),
            start.elapsed()
        );

        Ok(catalog)
    }

    /// Index already-loaded definitions; earlier entries win on duplicates.
    pub fn from_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = ChannelDefinition>,
    {
        let mut catalog = Self {
            index: HashMap::new(),
            report: CatalogReport::default(),
        };
        catalog.insert_all(definitions);
        catalog
    }

    fn insert_all<I>(&mut self, definitions: I)
    where
        I: IntoIterator<Item = ChannelDefinition>,
    {
        for definition in definitions {
            match self.index.entry(definition.xmltv_id.clone()) {
                Entry::Occupied(existing) => {
                    debug!(
                        "Duplicate definition for {} in {:?}, keeping {:?}",
                        definition.xmltv_id,
                        definition.document,
                        existing.get().document
                    );
                    self.report.duplicates.push(DuplicateDefinition {
                        xmltv_id: definition.xmltv_id,
                        kept: existing.get().document.clone(),
                        ignored: definition.document,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(definition);
                    self.report.definitions += 1;
                }
            }
        }
    }

    pub fn report(&self) -> &CatalogReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl SourceCatalog for IndexedCatalog {
    fn find_definition(&self, xmltv_id: &str) -> Option<ChannelDefinition> {
        self.index.get(xmltv_id).cloned()
    }
}
