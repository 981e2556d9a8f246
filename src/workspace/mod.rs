//! Incremental multi-file program cache.
//!
//! The manager owns per-document text and per-document parsed programs,
//! keyed by case-normalized paths. A `progs.src` manifest declares the link
//! order; each document parses against the previous document's resulting
//! scope, so later files see earlier files' top-level declarations.
//!
//! Per file the cache moves through: absent → loaded (invalid) → valid →
//! invalid (on edit) → valid (on re-validation). Editing a document also
//! invalidates every document after it in link order, because downstream
//! scopes transitively depend on it. Re-validation walks the declared order
//! from the front, reusing still-valid programs and re-parsing invalid ones
//! with the freshly threaded scope; documents outside the declared order
//! validate independently with no parent scope.
//!
//! Everything here is synchronous and single-caller; queries validate inline
//! before answering.

pub mod manifest;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quakec_syntax::ast::Position;
use quakec_syntax::diagnostics::Diagnostic;
use quakec_syntax::grammar::Dialect;
use quakec_syntax::parser::{self, ParseInfo};
use quakec_syntax::program::{Location, Program};

/// Cached text of one workspace document.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    pub version: i32,
    pub text: String,
}

/// Cached parse of one source document.
struct ProgramEntry {
    /// Original-case path, used in query results.
    uri: String,
    is_valid: bool,
    program: Option<Arc<Program>>,
}

/// Owns workspace documents and their parsed programs.
pub struct SourceDocumentManager {
    root: Option<PathBuf>,
    documents: HashMap<String, DocumentEntry>,
    programs: HashMap<String, ProgramEntry>,
    /// Link order as normalized keys.
    source_order: Vec<String>,
    dialect: Dialect,
    documents_parsed: usize,
}

impl SourceDocumentManager {
    /// Create a manager, loading `.qc` sources and the `progs.src` manifest
    /// from `root` when given. Documents can also arrive later through
    /// [`SourceDocumentManager::update_document`].
    pub fn new(root: Option<&Path>) -> Self {
        let mut manager = Self {
            root: root.map(Path::to_path_buf),
            documents: HashMap::new(),
            programs: HashMap::new(),
            source_order: Vec::new(),
            dialect: Dialect::default(),
            documents_parsed: 0,
        };
        if let Some(root) = manager.root.clone() {
            manager.load_documents(&root);
        }
        manager
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Documents re-parsed by the most recent validation pass.
    pub fn documents_parsed(&self) -> usize {
        self.documents_parsed
    }

    /// Link order as normalized keys.
    pub fn source_order(&self) -> &[String] {
        &self.source_order
    }

    pub fn document_text(&self, path: &str) -> Option<&str> {
        self.documents.get(&normalize_key(path)).map(|entry| entry.text.as_str())
    }

    // ========================================================================
    // Document lifecycle
    // ========================================================================

    /// Adopt new document text if `version` is newer than what is cached,
    /// invalidate the document and everything after it in link order, and
    /// re-validate.
    pub fn update_document(&mut self, path: &str, version: i32, text: String) {
        let key = normalize_key(path);
        if let Some(existing) = self.documents.get(&key) {
            if version <= existing.version {
                return;
            }
        }

        let path_buf = PathBuf::from(path);
        self.documents.insert(key.clone(), DocumentEntry { version, text });
        if is_source_document(&path_buf) {
            self.programs.entry(key.clone()).or_insert_with(|| ProgramEntry {
                uri: path.to_string(),
                is_valid: false,
                program: None,
            });
        }

        if is_manifest(&path_buf) {
            // A link-order change can reposition any file, so everything
            // goes stale.
            let text = self.documents.get(&key).map(|d| d.text.clone()).unwrap_or_default();
            self.build_source_order(&path_buf, &text);
            for entry in self.programs.values_mut() {
                entry.is_valid = false;
            }
        } else {
            self.invalidate_program(&key, true);
        }
        self.validate_program_cache();
    }

    fn load_documents(&mut self, root: &Path) {
        let mut files = Vec::new();
        collect_files(root, &mut files);

        for path in files {
            if !is_source_document(&path) && !is_manifest(&path) {
                continue;
            }
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable document");
                    continue;
                }
            };
            let display = path.to_string_lossy().into_owned();
            let key = normalize_key(&display);
            self.documents.insert(key.clone(), DocumentEntry { version: 1, text: text.clone() });
            if is_source_document(&path) {
                self.programs.entry(key).or_insert_with(|| ProgramEntry {
                    uri: display,
                    is_valid: false,
                    program: None,
                });
            } else {
                self.build_source_order(&path, &text);
            }
        }

        self.validate_program_cache();
    }

    fn build_source_order(&mut self, manifest_path: &Path, text: &str) {
        let dir = manifest_path.parent().unwrap_or(Path::new("."));
        self.source_order = manifest::parse_source_order(dir, text)
            .iter()
            .map(|path| normalize_key(&path.to_string_lossy()))
            .collect();
        tracing::debug!(files = self.source_order.len(), "link order loaded");
    }

    // ========================================================================
    // Validation and invalidation
    // ========================================================================

    fn invalidate_program(&mut self, key: &str, invalidate_downstream: bool) {
        if let Some(entry) = self.programs.get_mut(key) {
            entry.is_valid = false;
        } else {
            return;
        }

        if invalidate_downstream {
            if let Some(index) = self.source_order.iter().position(|uri| uri == key) {
                let downstream: Vec<String> = self.source_order[index..].to_vec();
                for downstream_key in downstream {
                    if let Some(entry) = self.programs.get_mut(&downstream_key) {
                        entry.is_valid = false;
                    }
                }
            }
        }
    }

    /// Walk the declared order from the front, threading each document's
    /// resulting program into the next parse; then validate any documents
    /// outside the declared order with no parent scope.
    fn validate_program_cache(&mut self) {
        tracing::debug!("validating program cache");
        self.documents_parsed = 0;

        let order = self.source_order.clone();
        let mut scope: Option<Arc<Program>> = None;
        for key in &order {
            if let Some(program) = self.validate_program(key, scope.clone()) {
                scope = Some(program);
            }
        }

        let remaining: Vec<String> = self
            .programs
            .keys()
            .filter(|key| !order.contains(key))
            .cloned()
            .collect();
        for key in remaining {
            self.validate_program(&key, None);
        }

        tracing::debug!(parsed = self.documents_parsed, "program cache validated");
    }

    fn validate_program(&mut self, key: &str, parent: Option<Arc<Program>>) -> Option<Arc<Program>> {
        let entry = self.programs.get(key)?;
        if entry.is_valid {
            return entry.program.clone();
        }
        // A lone re-validation keeps the previously computed parent scope.
        let parent = parent.or_else(|| entry.program.as_ref().and_then(|p| p.parent.clone()));
        let uri = entry.uri.clone();
        let text = self.documents.get(key)?.text.clone();

        let program = Arc::new(parser::parse(ParseInfo {
            source: &text,
            uri: Some(uri),
            parent,
            dialect: self.dialect,
        }));

        if let Some(entry) = self.programs.get_mut(key) {
            entry.is_valid = true;
            entry.program = Some(program.clone());
        }
        self.documents_parsed += 1;
        tracing::debug!(uri = %key, "parsed document");
        Some(program)
    }

    /// The program for `path`, re-validated first if stale.
    pub fn get_program(&mut self, path: &str) -> Option<Arc<Program>> {
        let key = normalize_key(path);
        let entry = self.programs.get(&key)?;
        if !entry.is_valid {
            self.validate_program(&key, None);
        }
        self.programs.get(&key)?.program.clone()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Type signature of the symbol under `position`.
    pub fn get_hover(&mut self, path: &str, position: Position) -> Option<String> {
        self.get_program(path)?.type_string_at(position)
    }

    /// Defining location of the symbol under `position`.
    pub fn get_definition(&mut self, path: &str, position: Position) -> Option<Location> {
        self.get_program(path)?.definition_at(position)
    }

    /// Every workspace reference to the symbol under `position`, sorted by
    /// file then position. The whole cache is validated first so reference
    /// records are current.
    pub fn get_references(&mut self, path: &str, position: Position, include_declaration: bool) -> Vec<Location> {
        self.validate_program_cache();
        let Some(program) = self.get_program(path) else {
            return Vec::new();
        };
        let Some((owner_uri, definition)) = program.definition_owner(position) else {
            return Vec::new();
        };
        let owner_key = normalize_key(&owner_uri);
        let Some(owner) = self.programs.get(&owner_key).and_then(|entry| entry.program.clone()) else {
            return Vec::new();
        };

        let mut locations = Vec::new();
        if include_declaration {
            locations.push(owner.declaration_location(definition));
        }
        locations.extend(owner.references_of(definition));

        // References made by downstream documents live on those documents.
        for entry in self.programs.values() {
            if let Some(candidate) = &entry.program {
                for foreign in candidate.foreign_refs() {
                    if foreign.def_symbol == definition && normalize_key(&foreign.def_uri) == owner_key {
                        locations.push(Location {
                            uri: candidate.uri.clone().unwrap_or_default(),
                            range: foreign.range,
                        });
                    }
                }
            }
        }

        locations.sort_by(|a, b| (a.uri.as_str(), a.range.start).cmp(&(b.uri.as_str(), b.range.start)));
        locations
    }

    /// Diagnostics for one document.
    pub fn get_diagnostics(&mut self, path: &str) -> Vec<Diagnostic> {
        match self.get_program(path) {
            Some(program) => program.errors().to_vec(),
            None => Vec::new(),
        }
    }

    /// Per-file diagnostics for every source document, sorted by path.
    pub fn get_diagnostics_all(&mut self) -> Vec<(String, Vec<Diagnostic>)> {
        let mut entries: Vec<(String, String)> = self
            .programs
            .iter()
            .map(|(key, entry)| (key.clone(), entry.uri.clone()))
            .collect();
        entries.sort();
        entries
            .into_iter()
            .map(|(key, uri)| {
                let diagnostics = self.get_diagnostics(&key);
                (uri, diagnostics)
            })
            .collect()
    }

    /// Switch grammar dialect and re-validate the whole workspace.
    pub fn set_dialect(&mut self, dialect: Dialect) {
        if self.dialect == dialect {
            return;
        }
        self.dialect = dialect;
        for entry in self.programs.values_mut() {
            entry.is_valid = false;
        }
        self.validate_program_cache();
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Cache keys are case-insensitive with uniform separators, so one file does
/// not cache twice on case-insensitive filesystems.
fn normalize_key(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

fn is_source_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("qc"))
}

fn is_manifest(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name.eq_ignore_ascii_case("progs.src"))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}
