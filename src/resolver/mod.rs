//! Dependency resolution across source collections
//!
//! This module handles:
//! - Expanding agents and teams into the transitive closure of files they need
//! - Looking up each reference in search order (owning package, core, common)
//! - Expanding glob names such as `*` against every searched collection
//! - Reporting references that could not be satisfied without failing
//! - Refusing names that are not bare file names, so nothing resolves outside
//!   a collection's kind directory
//!
//! The closure is keyed by `(kind, filename)` so its contents and order are
//! the same whatever order the requests arrive in. A visited set keeps
//! dependency cycles from looping.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use wax::{CandidatePath, Glob, Pattern};

use crate::collection::{Collection, CollectionId, DependencyKind};
use crate::error::{AgentkitError, dependency_unresolved};
use crate::path_utils::is_plain_name;
use crate::resource::ResourceDescriptor;

/// Name used as `requested_by` for references made directly by the caller
pub const REQUESTED_BY_USER: &str = "install request";

/// A file the closure resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub kind: DependencyKind,
    pub filename: String,
    pub collection: CollectionId,
    pub source: PathBuf,
}

impl ResolvedFile {
    /// Path relative to a collection (and to a package directory)
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.kind.dir_name(), self.filename)
    }
}

/// Why a reference could not be satisfied
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "detail")]
pub enum UnresolvedReason {
    /// No collection in search order has the file
    NotFound,
    /// The file exists but its metadata block could not be parsed
    MalformedMetadata(String),
    /// The metadata names a dependency kind agentkit does not know
    UnknownKind,
    /// A glob name that is not a valid pattern
    InvalidPattern(String),
    /// A name that is not a bare file name, such as `../x` or `a/b`
    InvalidName,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::MalformedMetadata(reason) => write!(f, "malformed metadata: {reason}"),
            Self::UnknownKind => f.write_str("unknown dependency kind"),
            Self::InvalidPattern(reason) => write!(f, "invalid pattern: {reason}"),
            Self::InvalidName => f.write_str("invalid name"),
        }
    }
}

/// A reference the resolver could not satisfy
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UnresolvedReference {
    pub kind: String,
    pub name: String,
    pub requested_by: String,
    pub reason: UnresolvedReason,
}

impl UnresolvedReference {
    /// The reference as a diagnostic, for warning output
    pub fn to_error(&self) -> AgentkitError {
        dependency_unresolved(&self.kind, &self.name, &self.requested_by)
    }
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} requested by {} ({})",
            self.kind, self.name, self.requested_by, self.reason
        )
    }
}

/// Result of resolution: the files found and the references that were not
#[derive(Debug, Clone, Default)]
pub struct DependencyClosure {
    pub files: BTreeMap<(DependencyKind, String), ResolvedFile>,
    pub unresolved: Vec<UnresolvedReference>,
}

impl DependencyClosure {
    pub fn contains(&self, kind: DependencyKind, filename: &str) -> bool {
        self.files.contains_key(&(kind, filename.to_string()))
    }

    pub fn get(&self, kind: DependencyKind, filename: &str) -> Option<&ResolvedFile> {
        self.files.get(&(kind, filename.to_string()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolved files in `(kind, filename)` order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedFile> {
        self.files.values()
    }
}

/// Names containing any of these are globs
fn is_glob(name: &str) -> bool {
    name.contains(['*', '?', '[', '{'])
}

#[derive(Debug)]
struct Pending {
    kind: DependencyKind,
    name: String,
    requested_by: String,
}

/// Resolves dependency closures against an ordered list of collections
pub struct DependencyResolver<'a> {
    search_order: &'a [Collection],
}

impl<'a> DependencyResolver<'a> {
    /// `search_order` is highest priority first
    pub fn new(search_order: &'a [Collection]) -> Self {
        Self { search_order }
    }

    /// Resolve the closure of already-loaded resources
    ///
    /// The resources themselves are part of the closure.
    pub fn resolve(&self, resources: &[ResourceDescriptor]) -> DependencyClosure {
        let mut walk = Walk::new(self.search_order);
        for resource in resources {
            walk.visit_descriptor(resource);
        }
        walk.run()
    }

    /// Resolve the closure of resources named by the caller
    pub fn resolve_names(&self, kind: DependencyKind, names: &[&str]) -> DependencyClosure {
        let mut walk = Walk::new(self.search_order);
        for name in names {
            walk.queue.push_back(Pending {
                kind,
                name: (*name).to_string(),
                requested_by: REQUESTED_BY_USER.to_string(),
            });
        }
        walk.run()
    }
}

struct Walk<'a> {
    search_order: &'a [Collection],
    visited: BTreeSet<(DependencyKind, String)>,
    queue: VecDeque<Pending>,
    files: BTreeMap<(DependencyKind, String), ResolvedFile>,
    unresolved: BTreeSet<UnresolvedReference>,
}

impl<'a> Walk<'a> {
    fn new(search_order: &'a [Collection]) -> Self {
        Self {
            search_order,
            visited: BTreeSet::new(),
            queue: VecDeque::new(),
            files: BTreeMap::new(),
            unresolved: BTreeSet::new(),
        }
    }

    fn run(mut self) -> DependencyClosure {
        let search_order = self.search_order;
        while let Some(pending) = self.queue.pop_front() {
            if !is_plain_name(&pending.name) {
                self.unresolved(&pending, UnresolvedReason::InvalidName);
                continue;
            }
            if is_glob(&pending.name) {
                self.expand_glob(&pending);
                continue;
            }

            let filename = pending.kind.normalize_filename(&pending.name);
            if self.visited.contains(&(pending.kind, filename.clone())) {
                continue;
            }

            let found = search_order
                .iter()
                .find_map(|c| c.locate(pending.kind, &filename).map(|p| (c, p)));

            match found {
                Some((collection, source)) => {
                    self.visit_file(pending.kind, filename, collection.id().clone(), source);
                }
                None => self.unresolved(&pending, UnresolvedReason::NotFound),
            }
        }

        let unresolved: Vec<_> = self.unresolved.into_iter().collect();
        for reference in &unresolved {
            tracing::warn!(
                kind = %reference.kind,
                name = %reference.name,
                requested_by = %reference.requested_by,
                reason = %reference.reason,
                "Unresolved dependency"
            );
        }

        DependencyClosure {
            files: self.files,
            unresolved,
        }
    }

    /// Match a glob against file names of its kind in every collection;
    /// a name found in several collections resolves to the first
    fn expand_glob(&mut self, pending: &Pending) {
        let glob = match Glob::new(&pending.name) {
            Ok(glob) => glob,
            Err(err) => {
                self.unresolved(pending, UnresolvedReason::InvalidPattern(err.to_string()));
                return;
            }
        };

        let search_order = self.search_order;
        let mut matched = BTreeMap::new();
        for collection in search_order {
            for filename in collection.list(pending.kind) {
                if matched.contains_key(&filename) {
                    continue;
                }
                if glob.matched(&CandidatePath::from(filename.as_str())).is_some() {
                    let source = collection.root().join(pending.kind.dir_name()).join(&filename);
                    matched.insert(filename, (collection.id().clone(), source));
                }
            }
        }

        if matched.is_empty() {
            self.unresolved(pending, UnresolvedReason::NotFound);
            return;
        }

        for (filename, (collection, source)) in matched {
            self.visit_file(pending.kind, filename, collection, source);
        }
    }

    fn visit_file(
        &mut self,
        kind: DependencyKind,
        filename: String,
        collection: CollectionId,
        source: PathBuf,
    ) {
        if !self.visited.insert((kind, filename.clone())) {
            return;
        }

        if kind.is_resource() {
            let loaded = ResourceDescriptor::load(kind, collection.clone(), &source)
                .map_err(|e| e.to_string())
                .and_then(|parsed| parsed);
            match loaded {
                Ok(descriptor) => self.enqueue_dependencies(&descriptor),
                Err(reason) => {
                    self.unresolved.insert(UnresolvedReference {
                        kind: kind.dir_name().to_string(),
                        name: filename.clone(),
                        requested_by: format!("{}/{}", kind.dir_name(), filename),
                        reason: UnresolvedReason::MalformedMetadata(reason),
                    });
                }
            }
        }

        self.files.insert(
            (kind, filename.clone()),
            ResolvedFile {
                kind,
                filename,
                collection,
                source,
            },
        );
    }

    fn visit_descriptor(&mut self, descriptor: &ResourceDescriptor) {
        let key = (descriptor.kind, descriptor.filename.clone());
        if !self.visited.insert(key.clone()) {
            return;
        }
        self.files.insert(
            key,
            ResolvedFile {
                kind: descriptor.kind,
                filename: descriptor.filename.clone(),
                collection: descriptor.collection.clone(),
                source: descriptor.source.clone(),
            },
        );
        self.enqueue_dependencies(descriptor);
    }

    fn enqueue_dependencies(&mut self, descriptor: &ResourceDescriptor) {
        let requested_by = descriptor.reference();
        for (kind, name) in descriptor.declared() {
            self.queue.push_back(Pending {
                kind,
                name: name.to_string(),
                requested_by: requested_by.clone(),
            });
        }
        for (kind_name, names) in &descriptor.unknown_kinds {
            for name in names {
                self.unresolved.insert(UnresolvedReference {
                    kind: kind_name.clone(),
                    name: name.clone(),
                    requested_by: requested_by.clone(),
                    reason: UnresolvedReason::UnknownKind,
                });
            }
        }
    }

    fn unresolved(&mut self, pending: &Pending, reason: UnresolvedReason) {
        self.unresolved.insert(UnresolvedReference {
            kind: pending.kind.dir_name().to_string(),
            name: pending.name.clone(),
            requested_by: pending.requested_by.clone(),
            reason,
        });
    }
}
