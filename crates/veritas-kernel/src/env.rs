//! Environment
//!
//! The map from names to checked declarations. Environments are cheap
//! to clone: declarations are shared behind `Arc`, so a clone is a
//! snapshot that later additions to either copy do not disturb.

use crate::decl::Declaration;
use crate::name::Name;
use hashbrown::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from environment updates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("declaration '{0}' has already been declared")]
    AlreadyDeclared(Name),
}

/// Collection of declarations indexed by name.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    decls: HashMap<Name, Arc<Declaration>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Look up a declaration by name.
    pub fn find(&self, name: &Name) -> Option<&Arc<Declaration>> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.decls.contains_key(name)
    }

    /// Add a declaration. Names are declared at most once; redeclaring
    /// is an error rather than an overwrite so a checked declaration
    /// can never be swapped out from under a proof that used it.
    pub fn add_decl(&mut self, decl: Declaration) -> Result<(), EnvError> {
        let name = decl.name().clone();
        if self.decls.contains_key(&name) {
            return Err(EnvError::AlreadyDeclared(name));
        }
        tracing::debug!(name = %name, trusted = decl.is_trusted(), "adding declaration");
        self.decls.insert(name, Arc::new(decl));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Arc<Declaration>)> {
        self.decls.iter()
    }
}
