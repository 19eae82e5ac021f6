//! Universe levels
//!
//! Sorts are indexed by levels: zero (`Prop`), successors, `max`,
//! `imax`, and named parameters. The trusted core only needs to build
//! and inspect levels; normalization beyond the `imax` collapse rules
//! lives with the external equality checker.

use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Universe level expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Level 0 (the sort of `Prop`).
    Zero,
    /// Successor level.
    Succ(Arc<Level>),
    /// Maximum of two levels.
    Max(Arc<Level>, Arc<Level>),
    /// Impredicative maximum: `imax l 0 = 0`, `imax l (succ m) = max l (succ m)`.
    IMax(Arc<Level>, Arc<Level>),
    /// Universe parameter.
    Param(Name),
}

impl Level {
    pub fn zero() -> Self {
        Level::Zero
    }

    pub fn one() -> Self {
        Level::succ(Level::Zero)
    }

    pub fn succ(l: Level) -> Self {
        Level::Succ(Arc::new(l))
    }

    pub fn max(l1: Level, l2: Level) -> Self {
        Level::Max(Arc::new(l1), Arc::new(l2))
    }

    /// Build an `imax`, collapsing the cases that are definitionally
    /// forced: `imax l 0 = 0` and `imax l (succ m) = max l (succ m)`.
    pub fn imax(l1: Level, l2: Level) -> Self {
        match &l2 {
            Level::Zero => Level::Zero,
            Level::Succ(_) => Level::max(l1, l2),
            _ => Level::IMax(Arc::new(l1), Arc::new(l2)),
        }
    }

    pub fn param(name: Name) -> Self {
        Level::Param(name)
    }

    /// Syntactically zero (after the `imax` collapse in [`Level::imax`]).
    pub fn is_zero(&self) -> bool {
        matches!(self, Level::Zero)
    }

    pub fn is_param(&self) -> bool {
        matches!(self, Level::Param(_))
    }

    /// Substitute universe parameters.
    #[must_use]
    pub fn instantiate_params(&self, subst: &[(Name, Level)]) -> Level {
        match self {
            Level::Zero => Level::Zero,
            Level::Succ(inner) => Level::succ(inner.instantiate_params(subst)),
            Level::Max(l1, l2) => Level::max(
                l1.instantiate_params(subst),
                l2.instantiate_params(subst),
            ),
            Level::IMax(l1, l2) => Level::imax(
                l1.instantiate_params(subst),
                l2.instantiate_params(subst),
            ),
            Level::Param(name) => subst
                .iter()
                .find(|(n, _)| n == name)
                .map_or_else(|| self.clone(), |(_, l)| l.clone()),
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Zero
    }
}
