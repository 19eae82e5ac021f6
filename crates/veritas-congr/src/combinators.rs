//! Term builders for the equality prelude
//!
//! Fully explicit applications of the constants the synthesized proofs
//! are made of (`Eq`, `HEq`, `congr`, `Eq.ndrec`, ...), plus the
//! binder-folding helpers that turn free-variable telescopes back into
//! `Pi`/`Lam` spines. Implicit arguments are spelled out because the
//! output is consumed by the kernel, not re-elaborated.

use crate::ctx::{sort_level, TypeContext};
use smallvec::smallvec;
use veritas_kernel::expr::{BinderInfo, Expr, FVarId};
use veritas_kernel::level::Level;
use veritas_kernel::name::Name;

pub(crate) fn eq_name() -> Name {
    Name::interned("Eq")
}

pub(crate) fn eq_refl_name() -> Name {
    Name::interned("Eq.refl")
}

pub(crate) fn eq_ndrec_name() -> Name {
    Name::interned("Eq.ndrec")
}

pub(crate) fn congr_name() -> Name {
    Name::interned("congr")
}

pub(crate) fn congr_fun_name() -> Name {
    Name::interned("congrFun")
}

pub(crate) fn heq_name() -> Name {
    Name::interned("HEq")
}

pub(crate) fn heq_refl_name() -> Name {
    Name::interned("HEq.refl")
}

pub(crate) fn eq_of_heq_name() -> Name {
    Name::interned("eq_of_heq")
}

pub(crate) fn subsingleton_elim_name() -> Name {
    Name::interned("Subsingleton.elim")
}

pub(crate) fn iff_name() -> Name {
    Name::interned("Iff")
}

pub(crate) fn iff_intro_name() -> Name {
    Name::interned("Iff.intro")
}

/// A lemma binder: the free variable standing for it, its binder
/// annotation, and its stated type.
pub(crate) type Binder = (FVarId, BinderInfo, Expr);

/// The free-variable id behind a local returned by
/// [`TypeContext::push_local`].
///
/// # Panics
/// If the expression is not a free variable; locals are always free
/// variables, so anything else is a caller bug.
pub(crate) fn fvar_id(e: &Expr) -> FVarId {
    match e {
        Expr::FVar(id) => *id,
        _ => panic!("local constant is not a free variable"),
    }
}

/// Fold a telescope of binders into nested lambdas around `body`.
pub(crate) fn bind_lambda(binders: &[Binder], body: Expr) -> Expr {
    binders.iter().rev().fold(body, |acc, (id, bi, ty)| {
        Expr::lam(*bi, ty.clone(), acc.abstract_fvar(*id))
    })
}

/// Fold a telescope of binders into nested pis around `body`.
pub(crate) fn bind_pi(binders: &[Binder], body: Expr) -> Expr {
    binders.iter().rev().fold(body, |acc, (id, bi, ty)| {
        Expr::pi(*bi, ty.clone(), acc.abstract_fvar(*id))
    })
}

/// Apply a free-variable substitution left to right.
pub(crate) fn subst_all(e: &Expr, subst: &[(FVarId, Expr)]) -> Expr {
    subst
        .iter()
        .fold(e.clone(), |acc, (id, v)| acc.subst_fvar(*id, v))
}

/// `Eq.{u} ty lhs rhs`.
pub(crate) fn mk_eq(ctx: &mut dyn TypeContext, ty: &Expr, lhs: Expr, rhs: Expr) -> Option<Expr> {
    let u = sort_level(ctx, ty)?;
    Some(Expr::mk_app(
        Expr::const_(eq_name(), smallvec![u]),
        [ty.clone(), lhs, rhs],
    ))
}

/// `Eq.refl.{u} ty a`.
pub(crate) fn mk_eq_refl(ctx: &mut dyn TypeContext, ty: &Expr, a: Expr) -> Option<Expr> {
    let u = sort_level(ctx, ty)?;
    Some(Expr::mk_app(
        Expr::const_(eq_refl_name(), smallvec![u]),
        [ty.clone(), a],
    ))
}

/// `HEq.{u} ty_a a ty_b b`.
pub(crate) fn mk_heq(
    ctx: &mut dyn TypeContext,
    ty_a: &Expr,
    a: Expr,
    ty_b: &Expr,
    b: Expr,
) -> Option<Expr> {
    let u = sort_level(ctx, ty_a)?;
    Some(Expr::mk_app(
        Expr::const_(heq_name(), smallvec![u]),
        [ty_a.clone(), a, ty_b.clone(), b],
    ))
}

/// `HEq.refl.{u} ty a`.
pub(crate) fn mk_heq_refl(ctx: &mut dyn TypeContext, ty: &Expr, a: Expr) -> Option<Expr> {
    let u = sort_level(ctx, ty)?;
    Some(Expr::mk_app(
        Expr::const_(heq_refl_name(), smallvec![u]),
        [ty.clone(), a],
    ))
}

/// `eq_of_heq.{u} ty a b h` turning `HEq ty a ty b` into `a = b`.
pub(crate) fn mk_eq_of_heq(
    ctx: &mut dyn TypeContext,
    ty: &Expr,
    a: Expr,
    b: Expr,
    h: Expr,
) -> Option<Expr> {
    let u = sort_level(ctx, ty)?;
    Some(Expr::mk_app(
        Expr::const_(eq_of_heq_name(), smallvec![u]),
        [ty.clone(), a, b, h],
    ))
}

/// `Subsingleton.elim.{u} ty inst a b : a = b`.
pub(crate) fn mk_subsingleton_elim(
    ctx: &mut dyn TypeContext,
    ty: &Expr,
    inst: Expr,
    a: Expr,
    b: Expr,
) -> Option<Expr> {
    let u = sort_level(ctx, ty)?;
    Some(Expr::mk_app(
        Expr::const_(subsingleton_elim_name(), smallvec![u]),
        [ty.clone(), inst, a, b],
    ))
}

/// `Eq.ndrec.{0,u} ty a motive m b h : motive b`, with the motive in
/// `Prop`. Transports a proof of `motive a` along `h : a = b`.
pub(crate) fn mk_eq_ndrec(
    ctx: &mut dyn TypeContext,
    ty: &Expr,
    a: Expr,
    motive: Expr,
    m: Expr,
    b: Expr,
    h: Expr,
) -> Option<Expr> {
    let u = sort_level(ctx, ty)?;
    Some(Expr::mk_app(
        Expr::const_(eq_ndrec_name(), smallvec![Level::zero(), u]),
        [ty.clone(), a, motive, m, b, h],
    ))
}

/// `congr.{u,v} dom cod f1 f2 a1 a2 h1 h2 : f1 a1 = f2 a2`.
///
/// `cod` must not depend on the argument; the classifier guarantees
/// that before this is reached.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mk_congr_app(
    ctx: &mut dyn TypeContext,
    dom: &Expr,
    cod: &Expr,
    f1: Expr,
    f2: Expr,
    a1: Expr,
    a2: Expr,
    h1: Expr,
    h2: Expr,
) -> Option<Expr> {
    let u = sort_level(ctx, dom)?;
    let v = sort_level(ctx, cod)?;
    Some(Expr::mk_app(
        Expr::const_(congr_name(), smallvec![u, v]),
        [dom.clone(), cod.clone(), f1, f2, a1, a2, h1, h2],
    ))
}

/// `congrFun.{u,v} dom (fun x => cod) f g h a : f a = g a`.
///
/// `cod_open` is the codomain under the binder (may reference bvar 0);
/// `cod_at_a` is the codomain instantiated at `a`, used for the level.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mk_congr_fun_app(
    ctx: &mut dyn TypeContext,
    dom: &Expr,
    cod_open: &Expr,
    cod_at_a: &Expr,
    f: Expr,
    g: Expr,
    h: Expr,
    a: Expr,
) -> Option<Expr> {
    let u = sort_level(ctx, dom)?;
    let v = sort_level(ctx, cod_at_a)?;
    let beta = Expr::lam(BinderInfo::Default, dom.clone(), cod_open.clone());
    Some(Expr::mk_app(
        Expr::const_(congr_fun_name(), smallvec![u, v]),
        [dom.clone(), beta, f, g, h, a],
    ))
}

/// `Iff a b`.
pub(crate) fn mk_iff(a: Expr, b: Expr) -> Expr {
    Expr::mk_app(Expr::const_(iff_name(), smallvec![]), [a, b])
}

/// `Iff.intro a b mp mpr`.
pub(crate) fn mk_iff_intro(a: Expr, b: Expr, mp: Expr, mpr: Expr) -> Expr {
    Expr::mk_app(Expr::const_(iff_intro_name(), smallvec![]), [a, b, mp, mpr])
}
