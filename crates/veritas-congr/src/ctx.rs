//! Typing interface
//!
//! Lemma synthesis needs to ask type-level questions (infer, reduce,
//! compare) and to allocate local hypotheses, but it must not depend
//! on a particular elaborator. [`TypeContext`] is that seam: the
//! elaborator implements it, the synthesizer only calls through it.
//!
//! Every query that can fail returns `Option`; a `None` anywhere makes
//! the requested lemma unavailable rather than an error. Lemma
//! synthesis is an optimization layer, and callers fall back to
//! generic rewriting when it declines.

use veritas_kernel::expr::Expr;
use veritas_kernel::level::Level;
use veritas_kernel::name::Name;

/// The typing services congruence lemma synthesis runs against.
pub trait TypeContext {
    /// Infer the type of `e`, or `None` if `e` is not well typed in
    /// the current context.
    fn infer_type(&mut self, e: &Expr) -> Option<Expr>;

    /// Weak head normal form.
    fn whnf(&mut self, e: &Expr) -> Expr;

    /// Definitional equality.
    fn is_def_eq(&mut self, a: &Expr, b: &Expr) -> bool;

    /// Allocate a fresh local constant of the given type and return it
    /// as a free variable.
    fn push_local(&mut self, name: Name, ty: Expr) -> Expr;

    /// An instance witnessing that `ty` has at most one inhabitant, if
    /// one can be synthesized.
    fn subsingleton_instance(&mut self, ty: &Expr) -> Option<Expr>;

    /// The propositional extensionality axiom, if the ambient library
    /// provides it.
    fn propext(&mut self) -> Option<Expr>;

    /// Symmetry proof for a relation application, if the relation is
    /// known to be symmetric: from `R a b` derive `R b a`.
    fn rel_symm(&mut self, pf: &Expr) -> Option<Expr>;

    /// Transitivity proof for a relation: from `R a b` and `R b c`
    /// derive `R a c`.
    fn rel_trans(&mut self, pf1: &Expr, pf2: &Expr) -> Option<Expr>;
}

/// The universe `ty` lives in: `l` such that `ty : Sort l`.
pub(crate) fn sort_level(ctx: &mut dyn TypeContext, ty: &Expr) -> Option<Level> {
    let s = ctx.infer_type(ty)?;
    match ctx.whnf(&s) {
        Expr::Sort(l) => Some(l),
        _ => None,
    }
}
