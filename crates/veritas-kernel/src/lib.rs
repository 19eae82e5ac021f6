//! Trusted core of the Veritas proof assistant.
//!
//! Everything soundness rests on lives here: hierarchical names,
//! universe levels, the term representation, declarations with their
//! reducibility and trust policy, and the environment that stores
//! checked declarations. Elaboration, tactics, and lemma synthesis sit
//! in separate crates and can only extend an environment through
//! [`env::Environment::add_decl`].

pub mod decl;
pub mod env;
pub mod expr;
pub mod level;
pub mod name;

pub use decl::{
    finalize_decl, initialize_decl, is_untrusted_reference, max_height, Declaration,
    ReducibilityHints, UnfoldHint,
};
pub use env::{EnvError, Environment};
pub use expr::{BinderInfo, Expr, FVarId, LevelVec, Literal};
pub use level::Level;
pub use name::{finalize_name, initialize_name, Name};
