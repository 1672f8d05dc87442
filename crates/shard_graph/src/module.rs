//! Module graph data structures.
//!
//! A [`ModuleGraph`] is an arena of [`Module`]s keyed by [`ModuleId`]. Each
//! module records its outgoing [`Dependency`] edges (tagged sync or async) in
//! source order and the ids of the modules importing it. Cycles are allowed;
//! consumers walk the graph with visited sets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use shard_common::{normalize_path, relative_resource, Arena, ContentHash, ModuleId};

use crate::scanner::is_script;

/// How an import is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Static import or `require`: the target is loaded with its importer.
    Sync,
    /// Dynamic `import()`: the target is loaded on demand.
    Async,
}

/// An outgoing import edge.
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    /// The specifier as written in the importer.
    pub specifier: String,
    /// Sync or async.
    pub kind: DependencyKind,
    /// The resolved target.
    pub target: ModuleId,
}

/// One resolved source file.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    /// This module's id.
    pub id: ModuleId,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Canonical `/`-separated absolute path; the module's identity and
    /// what cache-group predicates match against.
    pub resource: String,
    /// Project-relative canonical path; used for hashed keys and reports.
    pub name: String,
    /// Transformed content.
    #[serde(skip)]
    pub content: Vec<u8>,
    /// Outgoing edges in source order.
    pub dependencies: Vec<Dependency>,
    /// Modules importing this one, in edge insertion order.
    pub importers: Vec<ModuleId>,
}

impl Module {
    /// Returns `true` if the module is scanned and emitted as script.
    pub fn is_script(&self) -> bool {
        is_script(&self.path)
    }

    /// Returns the module's stable output key: the first 8 hex digits of
    /// the hash of its project-relative name.
    pub fn key(&self) -> String {
        ContentHash::from_bytes(self.name.as_bytes()).short(8)
    }

    /// Returns the size of the transformed content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A named root mapped to one or more initial modules.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// Entry name; becomes the entry chunk's name.
    pub name: String,
    /// Initial modules in configured order.
    pub modules: Vec<ModuleId>,
}

/// The directed import graph.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleGraph {
    /// Project root; module names are relative to it.
    pub root: PathBuf,
    /// All modules in discovery order.
    pub modules: Arena<ModuleId, Module>,
    /// Entries in configured order.
    pub entries: Vec<Entry>,
    #[serde(skip)]
    by_resource: HashMap<String, ModuleId>,
}

impl ModuleGraph {
    /// Creates an empty graph rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            modules: Arena::new(),
            entries: Vec::new(),
            by_resource: HashMap::new(),
        }
    }

    /// Returns the id for `path`, adding an empty module if it is new.
    ///
    /// The boolean is `true` when the module was just created. Identity is
    /// the normalized path, so `a/./b.js` and `a/b.js` are the same module.
    pub fn intern(&mut self, path: &Path) -> (ModuleId, bool) {
        let resource = normalize_path(path);
        if let Some(&id) = self.by_resource.get(&resource) {
            return (id, false);
        }
        let id = self.modules.next_id();
        self.modules.alloc(Module {
            id,
            path: PathBuf::from(&resource),
            name: relative_resource(&self.root, path),
            resource: resource.clone(),
            content: Vec::new(),
            dependencies: Vec::new(),
            importers: Vec::new(),
        });
        self.by_resource.insert(resource, id);
        (id, true)
    }

    /// Adds a module with the given content, or replaces the content of an
    /// existing one.
    pub fn add_module(&mut self, path: &Path, content: impl Into<Vec<u8>>) -> ModuleId {
        let (id, _) = self.intern(path);
        self.modules[id].content = content.into();
        id
    }

    /// Adds an edge, skipping exact duplicates of `(target, kind, specifier)`.
    ///
    /// Two specifiers naming the same file stay separate edges: the
    /// runtime looks imports up by the text the importer wrote.
    pub fn add_dependency(
        &mut self,
        from: ModuleId,
        to: ModuleId,
        kind: DependencyKind,
        specifier: &str,
    ) {
        let exists = self.modules[from]
            .dependencies
            .iter()
            .any(|d| d.target == to && d.kind == kind && d.specifier == specifier);
        if exists {
            return;
        }
        self.modules[from].dependencies.push(Dependency {
            specifier: specifier.to_string(),
            kind,
            target: to,
        });
        if !self.modules[to].importers.contains(&from) {
            self.modules[to].importers.push(from);
        }
    }

    /// Registers an entry.
    pub fn add_entry(&mut self, name: &str, modules: Vec<ModuleId>) {
        self.entries.push(Entry {
            name: name.to_string(),
            modules,
        });
    }

    /// Returns the module with the given id.
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id]
    }

    /// Looks up a module by path.
    pub fn find(&self, path: &Path) -> Option<ModuleId> {
        self.by_resource.get(&normalize_path(path)).copied()
    }

    /// Looks up a module by project-relative name.
    pub fn find_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules.values().find(|m| m.name == name).map(|m| m.id)
    }

    /// Returns the number of modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
