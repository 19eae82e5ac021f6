//! Declarations
//!
//! A declaration is the unit the environment stores: an axiom, an
//! assumption, a definition, or a theorem. Definitions carry
//! reducibility hints that drive unfolding order in the definitional
//! equality checker, and every declaration records whether it is
//! trusted (checked by the core) or untrusted (meta-level code the
//! core accepts without checking).

use crate::env::Environment;
use crate::expr::Expr;
use crate::level::Level;
use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Which side to unfold when the equality checker meets two constant
/// applications and has to pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnfoldHint {
    /// Unfold the left constant first.
    Left,
    /// Unfold the right constant first.
    Right,
    /// Unfold both sides at once.
    Both,
}

/// Unfolding guidance attached to a definition.
///
/// Hints never affect soundness, only performance: the checker uses
/// them to decide which of two definitions to unfold first so that the
/// two sides converge quickly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducibilityHints {
    /// Ordinary definition. `height` is the definitional height (one
    /// more than the tallest definition the value refers to);
    /// `self_opt` marks values whose head recursion can be unfolded
    /// lazily (self-optimizing).
    Regular { height: u32, self_opt: bool },
    /// Never unfold unless forced.
    Opaque,
    /// Unfold eagerly.
    Abbreviation,
}

impl ReducibilityHints {
    pub fn regular(height: u32, self_opt: bool) -> Self {
        ReducibilityHints::Regular { height, self_opt }
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, ReducibilityHints::Regular { .. })
    }

    pub fn is_abbreviation(&self) -> bool {
        matches!(self, ReducibilityHints::Abbreviation)
    }

    pub fn get_height(&self) -> u32 {
        match self {
            ReducibilityHints::Regular { height, .. } => *height,
            _ => 0,
        }
    }

    /// Pick which side to unfold given the hints on the left and right
    /// constant. Abbreviations always unfold first; opaque definitions
    /// last; between two regular definitions the taller one unfolds so
    /// both sides descend toward the same height.
    pub fn compare(&self, other: &ReducibilityHints) -> UnfoldHint {
        use ReducibilityHints::*;
        match (self, other) {
            (Abbreviation, Abbreviation) => UnfoldHint::Both,
            (Abbreviation, _) => UnfoldHint::Left,
            (_, Abbreviation) => UnfoldHint::Right,
            (Opaque, Opaque) => UnfoldHint::Both,
            (Opaque, _) => UnfoldHint::Right,
            (_, Opaque) => UnfoldHint::Left,
            (Regular { height: h1, .. }, Regular { height: h2, .. }) => {
                if h1 == h2 {
                    UnfoldHint::Both
                } else if h1 > h2 {
                    UnfoldHint::Left
                } else {
                    UnfoldHint::Right
                }
            }
        }
    }
}

/// A single entry in the environment.
///
/// The four user-facing kinds are encoded by two bits: whether a value
/// is present (definition-like vs assumption-like) and whether the
/// entry is theorem-flavored (its type is a proposition the value
/// proves). Theorems and axioms are the theorem-flavored halves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    name: Name,
    univ_params: Vec<Name>,
    type_: Expr,
    theorem: bool,
    value: Option<Expr>,
    hints: ReducibilityHints,
    trusted: bool,
}

static DUMMY_DECL: OnceLock<Arc<Declaration>> = OnceLock::new();

impl Declaration {
    /// Constant assumption: no value, not a proposition.
    pub fn assumption(name: Name, univ_params: Vec<Name>, type_: Expr, trusted: bool) -> Self {
        Declaration {
            name,
            univ_params,
            type_,
            theorem: false,
            value: None,
            hints: ReducibilityHints::Opaque,
            trusted,
        }
    }

    /// Axiom: no value, proposition. Axioms are always trusted; an
    /// untrusted axiom would be an assumption the core never looks at.
    pub fn axiom(name: Name, univ_params: Vec<Name>, type_: Expr) -> Self {
        Declaration {
            name,
            univ_params,
            type_,
            theorem: true,
            value: None,
            hints: ReducibilityHints::Opaque,
            trusted: true,
        }
    }

    /// Definition with explicit hints and trust.
    pub fn definition(
        name: Name,
        univ_params: Vec<Name>,
        type_: Expr,
        value: Expr,
        hints: ReducibilityHints,
        trusted: bool,
    ) -> Self {
        Declaration {
            name,
            univ_params,
            type_,
            theorem: false,
            value: Some(value),
            hints,
            trusted,
        }
    }

    /// Theorem: a proof term for a proposition. The equality checker
    /// never unfolds proofs, so hints are opaque. Theorems are always
    /// trusted.
    pub fn theorem(name: Name, univ_params: Vec<Name>, type_: Expr, value: Expr) -> Self {
        Declaration {
            name,
            univ_params,
            type_,
            theorem: true,
            value: Some(value),
            hints: ReducibilityHints::Opaque,
            trusted: true,
        }
    }

    /// Definition whose height is inferred from the constants its
    /// value refers to in `env`.
    pub fn definition_with_inferred_height(
        env: &Environment,
        name: Name,
        univ_params: Vec<Name>,
        type_: Expr,
        value: Expr,
        self_opt: bool,
        trusted: bool,
    ) -> Self {
        let height = max_height(env, &value) + 1;
        Declaration::definition(
            name,
            univ_params,
            type_,
            value,
            ReducibilityHints::regular(height, self_opt),
            trusted,
        )
    }

    /// Definition whose trust is inferred: trusted unless its type or
    /// value mentions an untrusted constant.
    pub fn definition_inferring_trusted(
        env: &Environment,
        name: Name,
        univ_params: Vec<Name>,
        type_: Expr,
        value: Expr,
        hints: ReducibilityHints,
    ) -> Self {
        let trusted =
            !is_untrusted_reference(env, &type_) && !is_untrusted_reference(env, &value);
        Declaration::definition(name, univ_params, type_, value, hints, trusted)
    }

    /// Definition with both height and trust inferred.
    pub fn definition_inferring(
        env: &Environment,
        name: Name,
        univ_params: Vec<Name>,
        type_: Expr,
        value: Expr,
        self_opt: bool,
    ) -> Self {
        let trusted =
            !is_untrusted_reference(env, &type_) && !is_untrusted_reference(env, &value);
        Declaration::definition_with_inferred_height(
            env,
            name,
            univ_params,
            type_,
            value,
            self_opt,
            trusted,
        )
    }

    /// Assumption whose trust is inferred from its type.
    pub fn assumption_inferring(
        env: &Environment,
        name: Name,
        univ_params: Vec<Name>,
        type_: Expr,
    ) -> Self {
        let trusted = !is_untrusted_reference(env, &type_);
        Declaration::assumption(name, univ_params, type_, trusted)
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn univ_params(&self) -> &[Name] {
        &self.univ_params
    }

    pub fn num_univ_params(&self) -> usize {
        self.univ_params.len()
    }

    pub fn type_(&self) -> &Expr {
        &self.type_
    }

    /// Has a value (definition or theorem).
    pub fn is_definition(&self) -> bool {
        self.value.is_some()
    }

    /// Theorem-flavored (theorem or axiom).
    pub fn is_theorem_like(&self) -> bool {
        self.theorem
    }

    pub fn is_theorem(&self) -> bool {
        self.theorem && self.value.is_some()
    }

    pub fn is_axiom(&self) -> bool {
        self.theorem && self.value.is_none()
    }

    pub fn is_constant_assumption(&self) -> bool {
        !self.theorem && self.value.is_none()
    }

    /// Value of a definition or theorem.
    ///
    /// # Panics
    ///
    /// Panics if the declaration has no value; callers must check
    /// [`Declaration::is_definition`] first.
    pub fn get_value(&self) -> &Expr {
        match &self.value {
            Some(value) => value,
            None => panic!("declaration {} has no value", self.name),
        }
    }

    /// The declaration's type at the given universe levels.
    ///
    /// # Panics
    ///
    /// Panics if `levels` does not match the universe parameter count.
    pub fn instantiate_type_univ_params(&self, levels: &[Level]) -> Expr {
        self.type_
            .instantiate_level_params(&self.univ_subst(levels))
    }

    /// The declaration's value at the given universe levels.
    ///
    /// # Panics
    ///
    /// Panics if the declaration has no value or `levels` does not
    /// match the universe parameter count.
    pub fn instantiate_value_univ_params(&self, levels: &[Level]) -> Expr {
        self.get_value()
            .instantiate_level_params(&self.univ_subst(levels))
    }

    fn univ_subst(&self, levels: &[Level]) -> Vec<(Name, Level)> {
        assert_eq!(
            levels.len(),
            self.univ_params.len(),
            "universe parameter count mismatch for {}",
            self.name
        );
        self.univ_params
            .iter()
            .cloned()
            .zip(levels.iter().cloned())
            .collect()
    }

    pub fn hints(&self) -> &ReducibilityHints {
        &self.hints
    }

    pub fn get_height(&self) -> u32 {
        self.hints.get_height()
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }
}

impl Default for Declaration {
    /// The dummy declaration installed by [`initialize_decl`]: an
    /// anonymous axiom.
    fn default() -> Self {
        DUMMY_DECL
            .get_or_init(|| {
                Arc::new(Declaration::axiom(Name::anon(), Vec::new(), Expr::prop()))
            })
            .as_ref()
            .clone()
    }
}

/// Tallest definitional height among the constants `e` refers to.
pub fn max_height(env: &Environment, e: &Expr) -> u32 {
    let mut height = 0;
    e.for_each_constant(&mut |name| {
        if let Some(decl) = env.find(name) {
            let h = decl.get_height();
            if h > height {
                height = h;
            }
        }
    });
    height
}

/// Does `e` refer to a declaration marked untrusted? Constants not in
/// the environment count as trusted. Stops at the first hit.
pub fn is_untrusted_reference(env: &Environment, e: &Expr) -> bool {
    e.any_constant(&mut |name| env.find(name).is_some_and(|decl| !decl.is_trusted()))
}

/// Install the dummy declaration backing [`Declaration::default`].
pub fn initialize_decl() {
    let _ = Declaration::default();
}

/// Counterpart of [`initialize_decl`]; the dummy lives for the process
/// lifetime so there is nothing to tear down.
pub fn finalize_decl() {}
