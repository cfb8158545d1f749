//! Lookups an adapter needs while entering its editing surface.
//!
//! Everything here is resolved before a transform runs: adapters only call
//! into these synchronously and never reach for shared notebook state.

use std::collections::BTreeSet;

/// Picks a variable name that is free in the notebook
pub trait NameAllocator {
    fn allocate(&self, base: &str) -> String;
}

impl<F> NameAllocator for F
where
    F: Fn(&str) -> String,
{
    fn allocate(&self, base: &str) -> String {
        self(base)
    }
}

/// Allocator for underscore-private names, which are local to their cell
/// and therefore never collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivateNames;

impl NameAllocator for PrivateNames {
    fn allocate(&self, base: &str) -> String {
        base.to_string()
    }
}

/// Names already declared elsewhere in the notebook
#[derive(Debug, Clone, Default)]
pub struct DeclaredNames {
    names: BTreeSet<String>,
}

impl DeclaredNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl NameAllocator for DeclaredNames {
    /// `base`, then `base_1`, `base_2`, ... until one is free.
    fn allocate(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Reports the SQL engine the user last picked, if any
pub trait EngineResolver {
    fn selected_engine(&self) -> Option<String>;
}

impl EngineResolver for Option<String> {
    fn selected_engine(&self) -> Option<String> {
        self.clone()
    }
}

impl EngineResolver for &str {
    fn selected_engine(&self) -> Option<String> {
        Some(self.to_string())
    }
}

pub const DEFAULT_DATAFRAME_BASE: &str = "_df";

static NO_ENGINE: Option<String> = None;

/// Collaborators handed to `transform_in`
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    pub names: &'a dyn NameAllocator,
    pub engines: &'a dyn EngineResolver,
    /// Base for freshly allocated dataframe names
    pub dataframe_base: &'a str,
}

impl<'a> TransformContext<'a> {
    pub fn new(names: &'a dyn NameAllocator, engines: &'a dyn EngineResolver) -> Self {
        Self {
            names,
            engines,
            dataframe_base: DEFAULT_DATAFRAME_BASE,
        }
    }

    pub fn with_dataframe_base(mut self, base: &'a str) -> Self {
        self.dataframe_base = base;
        self
    }
}

impl TransformContext<'static> {
    /// No declared names and no selected engine.
    pub fn standalone() -> Self {
        Self::new(&PrivateNames, &NO_ENGINE)
    }
}

impl Default for TransformContext<'static> {
    fn default() -> Self {
        Self::standalone()
    }
}

impl std::fmt::Debug for TransformContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformContext")
            .field("selected_engine", &self.engines.selected_engine())
            .field("dataframe_base", &self.dataframe_base)
            .finish_non_exhaustive()
    }
}
