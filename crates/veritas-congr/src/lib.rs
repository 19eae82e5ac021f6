//! Congruence lemma synthesis for the Veritas proof assistant.
//!
//! Rewriting engines rewrite `f a₁ … aₙ` by rewriting the arguments;
//! this crate builds the lemma that justifies it for a given `f` and
//! arity, together with a kernel-checkable proof term. The synthesizer
//! is untrusted: everything it produces goes back through the kernel.
//!
//! Synthesis runs against an abstract [`ctx::TypeContext`] so it stays
//! independent of any particular elaborator, and every entry point
//! returns `Option` because a missing lemma is a fallback condition,
//! not an error.

mod combinators;
pub mod congr;
pub mod ctx;

pub use congr::{
    mk_congr, mk_congr_n, mk_congr_simp, mk_congr_simp_n, mk_hcongr, mk_hcongr_n,
    mk_rel_eq_congr, mk_rel_iff_congr, mk_specialized_congr, mk_specialized_congr_simp,
    CongrArgKind, CongrLemma,
};
pub use ctx::TypeContext;
