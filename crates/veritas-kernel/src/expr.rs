//! Term representation
//!
//! The core expression type shared by declarations and the congruence
//! synthesizer. Bound variables use de Bruijn indices; free variables
//! are opaque ids handed out by whoever owns the local context.
//!
//! Recursion over terms is guarded with `stacker` so deeply nested
//! proofs cannot blow the thread stack.

use crate::level::Level;
use crate::name::Name;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Minimum stack space to reserve before recursive calls (32 KB).
const MIN_STACK_RED_ZONE: usize = 32 * 1024;

/// Stack size to grow to when running low (1 MB).
const STACK_GROWTH_SIZE: usize = 1024 * 1024;

/// Universe level list on [`Expr::Const`]. Almost all constants carry
/// 0-2 levels, so keep them inline.
pub type LevelVec = SmallVec<[Level; 2]>;

/// Binder information (how a variable is bound).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinderInfo {
    /// Regular explicit binding.
    Default,
    /// Implicit binding `{x : T}`.
    Implicit,
    /// Strict implicit `{{x : T}}`.
    StrictImplicit,
    /// Instance implicit `[x : T]`.
    InstImplicit,
}

/// Literal values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// Natural number literal.
    Nat(u64),
    /// String literal.
    String(Arc<str>),
}

/// Unique identifier for free variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FVarId(pub u64);

/// Core expression type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Bound variable (de Bruijn index, 0 = innermost).
    BVar(u32),
    /// Free variable.
    FVar(FVarId),
    /// Sort (`Type u` or `Prop`).
    Sort(Level),
    /// Constant with universe level instantiation.
    Const(Name, LevelVec),
    /// Function application.
    App(Arc<Expr>, Arc<Expr>),
    /// Lambda abstraction `λ (x : A), body`.
    Lam(BinderInfo, Arc<Expr>, Arc<Expr>),
    /// Pi/forall type `(x : A) → B`.
    Pi(BinderInfo, Arc<Expr>, Arc<Expr>),
    /// Let binding `let x : A := v in body`.
    Let(Arc<Expr>, Arc<Expr>, Arc<Expr>),
    /// Literal value.
    Lit(Literal),
}

impl Expr {
    /// Bound variable.
    pub fn bvar(idx: u32) -> Self {
        Expr::BVar(idx)
    }

    /// Free variable.
    pub fn fvar(id: FVarId) -> Self {
        Expr::FVar(id)
    }

    /// Sort with the given level.
    pub fn sort(level: Level) -> Self {
        Expr::Sort(level)
    }

    /// `Prop` (= `Sort 0`).
    pub fn prop() -> Self {
        Expr::Sort(Level::zero())
    }

    /// `Type` (= `Sort 1`).
    pub fn type_() -> Self {
        Expr::Sort(Level::one())
    }

    /// Constant reference.
    pub fn const_(name: Name, levels: impl Into<LevelVec>) -> Self {
        Expr::Const(name, levels.into())
    }

    /// Application node.
    pub fn app(func: Expr, arg: Expr) -> Self {
        Expr::App(Arc::new(func), Arc::new(arg))
    }

    /// Lambda abstraction.
    pub fn lam(bi: BinderInfo, ty: Expr, body: Expr) -> Self {
        Expr::Lam(bi, Arc::new(ty), Arc::new(body))
    }

    /// Pi type.
    pub fn pi(bi: BinderInfo, ty: Expr, body: Expr) -> Self {
        Expr::Pi(bi, Arc::new(ty), Arc::new(body))
    }

    /// Non-dependent function type `from → to`.
    pub fn arrow(from: Expr, to: Expr) -> Self {
        Expr::pi(BinderInfo::Default, from, to.lift(1))
    }

    /// Let binding.
    pub fn let_(ty: Expr, val: Expr, body: Expr) -> Self {
        Expr::Let(Arc::new(ty), Arc::new(val), Arc::new(body))
    }

    /// Natural number literal.
    pub fn nat_lit(n: u64) -> Self {
        Expr::Lit(Literal::Nat(n))
    }

    /// Apply `f` to each argument in turn.
    pub fn mk_app(f: Expr, args: impl IntoIterator<Item = Expr>) -> Expr {
        args.into_iter().fold(f, Expr::app)
    }

    /// True for `Sort _`.
    pub fn is_sort(&self) -> bool {
        matches!(self, Expr::Sort(_))
    }

    /// True for `Sort 0`.
    pub fn is_prop(&self) -> bool {
        matches!(self, Expr::Sort(level) if level.is_zero())
    }

    /// Head of an application spine (`f` in `f a b c`).
    pub fn get_app_fn(&self) -> &Expr {
        let mut cur = self;
        while let Expr::App(f, _) = cur {
            cur = f;
        }
        cur
    }

    /// Arguments of an application spine, left to right.
    pub fn get_app_args(&self) -> Vec<&Expr> {
        let mut args = Vec::new();
        let mut cur = self;
        while let Expr::App(f, a) = cur {
            args.push(&**a);
            cur = f;
        }
        args.reverse();
        args
    }

    /// Substitute bound variable 0 with the given expression.
    #[must_use]
    pub fn instantiate(&self, val: &Expr) -> Expr {
        self.instantiate_at(val, 0)
    }

    fn instantiate_at(&self, val: &Expr, depth: u32) -> Expr {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.instantiate_at_impl(val, depth)
        })
    }

    fn instantiate_at_impl(&self, val: &Expr, depth: u32) -> Expr {
        match self {
            Expr::BVar(idx) => {
                use std::cmp::Ordering;
                match idx.cmp(&depth) {
                    Ordering::Equal => val.lift(depth),
                    Ordering::Greater => Expr::BVar(idx - 1),
                    Ordering::Less => Expr::BVar(*idx),
                }
            }
            Expr::FVar(_) | Expr::Sort(_) | Expr::Const(_, _) | Expr::Lit(_) => self.clone(),
            Expr::App(f, a) => Expr::App(
                Arc::new(f.instantiate_at(val, depth)),
                Arc::new(a.instantiate_at(val, depth)),
            ),
            Expr::Lam(bi, ty, body) => Expr::Lam(
                *bi,
                Arc::new(ty.instantiate_at(val, depth)),
                Arc::new(body.instantiate_at(val, depth + 1)),
            ),
            Expr::Pi(bi, ty, body) => Expr::Pi(
                *bi,
                Arc::new(ty.instantiate_at(val, depth)),
                Arc::new(body.instantiate_at(val, depth + 1)),
            ),
            Expr::Let(ty, v, body) => Expr::Let(
                Arc::new(ty.instantiate_at(val, depth)),
                Arc::new(v.instantiate_at(val, depth)),
                Arc::new(body.instantiate_at(val, depth + 1)),
            ),
        }
    }

    /// Lift loose bound variables by `amount`.
    #[must_use]
    pub fn lift(&self, amount: u32) -> Expr {
        self.lift_at(0, amount)
    }

    fn lift_at(&self, start: u32, amount: u32) -> Expr {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.lift_at_impl(start, amount)
        })
    }

    fn lift_at_impl(&self, start: u32, amount: u32) -> Expr {
        if amount == 0 {
            return self.clone();
        }
        match self {
            Expr::BVar(idx) => {
                if *idx >= start {
                    Expr::BVar(idx + amount)
                } else {
                    Expr::BVar(*idx)
                }
            }
            Expr::FVar(_) | Expr::Sort(_) | Expr::Const(_, _) | Expr::Lit(_) => self.clone(),
            Expr::App(f, a) => Expr::App(
                Arc::new(f.lift_at(start, amount)),
                Arc::new(a.lift_at(start, amount)),
            ),
            Expr::Lam(bi, ty, body) => Expr::Lam(
                *bi,
                Arc::new(ty.lift_at(start, amount)),
                Arc::new(body.lift_at(start + 1, amount)),
            ),
            Expr::Pi(bi, ty, body) => Expr::Pi(
                *bi,
                Arc::new(ty.lift_at(start, amount)),
                Arc::new(body.lift_at(start + 1, amount)),
            ),
            Expr::Let(ty, val, body) => Expr::Let(
                Arc::new(ty.lift_at(start, amount)),
                Arc::new(val.lift_at(start, amount)),
                Arc::new(body.lift_at(start + 1, amount)),
            ),
        }
    }

    /// Any bound variable pointing outside the expression?
    pub fn has_loose_bvars(&self) -> bool {
        self.has_loose_bvars_at(0)
    }

    fn has_loose_bvars_at(&self, depth: u32) -> bool {
        match self {
            Expr::BVar(idx) => *idx >= depth,
            Expr::FVar(_) | Expr::Sort(_) | Expr::Const(_, _) | Expr::Lit(_) => false,
            Expr::App(f, a) => f.has_loose_bvars_at(depth) || a.has_loose_bvars_at(depth),
            Expr::Lam(_, ty, body) | Expr::Pi(_, ty, body) => {
                ty.has_loose_bvars_at(depth) || body.has_loose_bvars_at(depth + 1)
            }
            Expr::Let(ty, val, body) => {
                ty.has_loose_bvars_at(depth)
                    || val.has_loose_bvars_at(depth)
                    || body.has_loose_bvars_at(depth + 1)
            }
        }
    }

    /// Does the given free variable occur anywhere?
    pub fn has_fvar(&self, id: FVarId) -> bool {
        match self {
            Expr::FVar(fid) => *fid == id,
            Expr::BVar(_) | Expr::Sort(_) | Expr::Const(_, _) | Expr::Lit(_) => false,
            Expr::App(f, a) => f.has_fvar(id) || a.has_fvar(id),
            Expr::Lam(_, ty, body) | Expr::Pi(_, ty, body) => {
                ty.has_fvar(id) || body.has_fvar(id)
            }
            Expr::Let(ty, val, body) => {
                ty.has_fvar(id) || val.has_fvar(id) || body.has_fvar(id)
            }
        }
    }

    /// Replace `FVar(id)` with `BVar(0)`, shifting bound variables up.
    #[must_use]
    pub fn abstract_fvar(&self, id: FVarId) -> Expr {
        self.abstract_fvar_at(id, 0)
    }

    fn abstract_fvar_at(&self, id: FVarId, depth: u32) -> Expr {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.abstract_fvar_at_impl(id, depth)
        })
    }

    fn abstract_fvar_at_impl(&self, id: FVarId, depth: u32) -> Expr {
        match self {
            Expr::FVar(fid) if *fid == id => Expr::BVar(depth),
            Expr::FVar(_) | Expr::Sort(_) | Expr::Const(_, _) | Expr::Lit(_) => self.clone(),
            Expr::BVar(idx) => {
                if *idx >= depth {
                    Expr::BVar(idx + 1)
                } else {
                    Expr::BVar(*idx)
                }
            }
            Expr::App(f, a) => Expr::App(
                Arc::new(f.abstract_fvar_at(id, depth)),
                Arc::new(a.abstract_fvar_at(id, depth)),
            ),
            Expr::Lam(bi, ty, body) => Expr::Lam(
                *bi,
                Arc::new(ty.abstract_fvar_at(id, depth)),
                Arc::new(body.abstract_fvar_at(id, depth + 1)),
            ),
            Expr::Pi(bi, ty, body) => Expr::Pi(
                *bi,
                Arc::new(ty.abstract_fvar_at(id, depth)),
                Arc::new(body.abstract_fvar_at(id, depth + 1)),
            ),
            Expr::Let(ty, val, body) => Expr::Let(
                Arc::new(ty.abstract_fvar_at(id, depth)),
                Arc::new(val.abstract_fvar_at(id, depth)),
                Arc::new(body.abstract_fvar_at(id, depth + 1)),
            ),
        }
    }

    /// Substitute a free variable with an expression.
    #[must_use]
    pub fn subst_fvar(&self, id: FVarId, replacement: &Expr) -> Expr {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.subst_fvar_impl(id, replacement)
        })
    }

    fn subst_fvar_impl(&self, id: FVarId, replacement: &Expr) -> Expr {
        match self {
            Expr::FVar(fid) if *fid == id => replacement.clone(),
            Expr::FVar(_) | Expr::BVar(_) | Expr::Sort(_) | Expr::Const(_, _) | Expr::Lit(_) => {
                self.clone()
            }
            Expr::App(f, a) => Expr::App(
                Arc::new(f.subst_fvar(id, replacement)),
                Arc::new(a.subst_fvar(id, replacement)),
            ),
            Expr::Lam(bi, ty, body) => Expr::Lam(
                *bi,
                Arc::new(ty.subst_fvar(id, replacement)),
                Arc::new(body.subst_fvar(id, replacement)),
            ),
            Expr::Pi(bi, ty, body) => Expr::Pi(
                *bi,
                Arc::new(ty.subst_fvar(id, replacement)),
                Arc::new(body.subst_fvar(id, replacement)),
            ),
            Expr::Let(ty, val, body) => Expr::Let(
                Arc::new(ty.subst_fvar(id, replacement)),
                Arc::new(val.subst_fvar(id, replacement)),
                Arc::new(body.subst_fvar(id, replacement)),
            ),
        }
    }

    /// Substitute universe parameters throughout, in sorts and in the
    /// level lists of constants. This is how a polymorphic
    /// declaration's type and value are read at concrete levels.
    #[must_use]
    pub fn instantiate_level_params(&self, subst: &[(Name, Level)]) -> Expr {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.instantiate_level_params_impl(subst)
        })
    }

    fn instantiate_level_params_impl(&self, subst: &[(Name, Level)]) -> Expr {
        match self {
            Expr::Sort(level) => Expr::Sort(level.instantiate_params(subst)),
            Expr::Const(name, levels) => Expr::Const(
                name.clone(),
                levels.iter().map(|l| l.instantiate_params(subst)).collect(),
            ),
            Expr::BVar(_) | Expr::FVar(_) | Expr::Lit(_) => self.clone(),
            Expr::App(f, a) => Expr::App(
                Arc::new(f.instantiate_level_params(subst)),
                Arc::new(a.instantiate_level_params(subst)),
            ),
            Expr::Lam(bi, ty, body) => Expr::Lam(
                *bi,
                Arc::new(ty.instantiate_level_params(subst)),
                Arc::new(body.instantiate_level_params(subst)),
            ),
            Expr::Pi(bi, ty, body) => Expr::Pi(
                *bi,
                Arc::new(ty.instantiate_level_params(subst)),
                Arc::new(body.instantiate_level_params(subst)),
            ),
            Expr::Let(ty, val, body) => Expr::Let(
                Arc::new(ty.instantiate_level_params(subst)),
                Arc::new(val.instantiate_level_params(subst)),
                Arc::new(body.instantiate_level_params(subst)),
            ),
        }
    }

    /// Walk every `Const` reference, stopping early when `f` returns
    /// true. Returns whether any call returned true.
    ///
    /// This is the traversal trust and height inference are built on.
    pub fn any_constant<F: FnMut(&Name) -> bool>(&self, f: &mut F) -> bool {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.any_constant_impl(f)
        })
    }

    fn any_constant_impl<F: FnMut(&Name) -> bool>(&self, f: &mut F) -> bool {
        match self {
            Expr::Const(name, _) => f(name),
            Expr::BVar(_) | Expr::FVar(_) | Expr::Sort(_) | Expr::Lit(_) => false,
            Expr::App(g, a) => g.any_constant(f) || a.any_constant(f),
            Expr::Lam(_, ty, body) | Expr::Pi(_, ty, body) => {
                ty.any_constant(f) || body.any_constant(f)
            }
            Expr::Let(ty, val, body) => {
                ty.any_constant(f) || val.any_constant(f) || body.any_constant(f)
            }
        }
    }

    /// Visit every `Const` reference.
    pub fn for_each_constant<F: FnMut(&Name)>(&self, f: &mut F) {
        self.any_constant(&mut |name| {
            f(name);
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lift_bvar() {
        assert_eq!(Expr::BVar(0).lift(1), Expr::BVar(1));
        assert_eq!(Expr::BVar(0).lift_at(1, 1), Expr::BVar(0));
        assert_eq!(Expr::BVar(2).lift_at(1, 3), Expr::BVar(5));
    }

    #[test]
    fn instantiate_shifts() {
        let val = Expr::fvar(FVarId(42));
        assert_eq!(Expr::BVar(0).instantiate(&val), val);
        // A bvar pointing past the instantiated binder shifts down.
        assert_eq!(Expr::BVar(1).instantiate(&val), Expr::BVar(0));
    }

    #[test]
    fn abstract_then_instantiate_round_trips() {
        let x = FVarId(7);
        let e = Expr::app(
            Expr::const_(Name::from_string("f"), LevelVec::new()),
            Expr::fvar(x),
        );
        let abstracted = e.abstract_fvar(x);
        assert!(abstracted.has_loose_bvars());
        assert_eq!(abstracted.instantiate(&Expr::fvar(x)), e);
    }

    #[test]
    fn app_spine_accessors() {
        let f = Expr::const_(Name::from_string("f"), LevelVec::new());
        let e = Expr::mk_app(f.clone(), [Expr::nat_lit(1), Expr::nat_lit(2)]);
        assert_eq!(e.get_app_fn(), &f);
        let args = e.get_app_args();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], &Expr::nat_lit(1));
        assert_eq!(args[1], &Expr::nat_lit(2));
    }

    #[test]
    fn constant_walk_short_circuits() {
        let e = Expr::app(
            Expr::const_(Name::from_string("a"), LevelVec::new()),
            Expr::const_(Name::from_string("b"), LevelVec::new()),
        );
        let mut seen = Vec::new();
        e.for_each_constant(&mut |n| seen.push(n.to_string()));
        assert_eq!(seen, ["a", "b"]);
        let mut visits = 0;
        assert!(e.any_constant(&mut |_| {
            visits += 1;
            true
        }));
        assert_eq!(visits, 1);
    }

    #[test]
    fn fvar_occurrence_and_substitution() {
        let x = FVarId(1);
        let e = Expr::lam(BinderInfo::Default, Expr::prop(), Expr::fvar(x));
        assert!(e.has_fvar(x));
        assert!(!e.has_fvar(FVarId(2)));
        let replaced = e.subst_fvar(x, &Expr::nat_lit(0));
        assert!(!replaced.has_fvar(x));
    }

    #[test]
    fn level_params_reach_sorts_and_constants() {
        let u = Name::from_string("u");
        let e = Expr::pi(
            BinderInfo::Default,
            Expr::sort(Level::param(u.clone())),
            Expr::const_(Name::from_string("f"), vec![Level::param(u.clone())]),
        );
        let inst = e.instantiate_level_params(&[(u, Level::one())]);
        let Expr::Pi(_, dom, body) = &inst else {
            panic!("expected Pi");
        };
        assert_eq!(**dom, Expr::sort(Level::one()));
        assert_eq!(
            **body,
            Expr::const_(Name::from_string("f"), vec![Level::one()])
        );
    }

    #[test]
    fn sort_predicates() {
        assert!(Expr::prop().is_prop());
        assert!(Expr::type_().is_sort());
        assert!(!Expr::type_().is_prop());
        assert!(!Expr::BVar(0).is_sort());
    }

    #[test]
    fn arrow_is_non_dependent() {
        let t = Expr::arrow(Expr::prop(), Expr::BVar(0));
        let Expr::Pi(_, _, body) = &t else {
            panic!("expected Pi");
        };
        // The codomain's loose bvar was lifted past the new binder.
        assert_eq!(**body, Expr::BVar(1));
    }
}
