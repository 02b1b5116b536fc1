//! Namespace to vector index mapping.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Result;
use crate::index::{IndexParams, VectorIndexHandle};
use crate::similarity::Similarity;

/// How new indexes are built when a namespace is first touched.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub dimension: usize,
    pub descriptor: String,
    pub similarity: Similarity,
    pub params: IndexParams,
}

impl IndexSpec {
    pub fn build(&self) -> Result<VectorIndexHandle> {
        VectorIndexHandle::create(
            self.dimension,
            &self.descriptor,
            self.similarity,
            &self.params,
        )
    }
}

/// Named vector indexes owned by one store.
///
/// Handles are created lazily from the registry's [`IndexSpec`] and live
/// as long as the registry does. Mutation goes through `&mut self`, so
/// concurrent first-creation of one name cannot happen without a lock
/// around the owner.
#[derive(Debug)]
pub struct IndexRegistry {
    spec: IndexSpec,
    handles: HashMap<String, VectorIndexHandle>,
}

impl IndexRegistry {
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            handles: HashMap::new(),
        }
    }

    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Returns the handle for `name`, building it first if it does not exist.
    pub fn get_or_create(&mut self, name: &str) -> Result<&mut VectorIndexHandle> {
        match self.handles.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let handle = self.spec.build()?;
                tracing::debug!(namespace = name, "registered vector index");
                Ok(entry.insert(handle))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&VectorIndexHandle> {
        self.handles.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VectorIndexHandle> {
        self.handles.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Registers an existing handle, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, handle: VectorIndexHandle) {
        self.handles.insert(name.into(), handle);
    }

    pub fn remove(&mut self, name: &str) -> Option<VectorIndexHandle> {
        self.handles.remove(name)
    }

    /// Registered namespace names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
