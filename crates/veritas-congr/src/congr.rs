//! Congruence lemma synthesis
//!
//! Given a function `f` and an arity, build a lemma that rewrites an
//! application `f a₁ … aₙ` argument by argument, together with its
//! proof term and a per-argument kind telling the rewriter what shape
//! of premise each position wants.
//!
//! Every entry point returns `Option`: a function the synthesizer
//! cannot handle (unsupported dependency structure, missing instance,
//! arity beyond the function type) yields `None`, and the caller falls
//! back to generic rewriting. `None` is never an error condition.

use crate::combinators::{
    bind_lambda, bind_pi, fvar_id, mk_congr_app, mk_congr_fun_app, mk_eq, mk_eq_ndrec,
    mk_eq_of_heq, mk_eq_refl, mk_heq, mk_heq_refl, mk_iff, mk_iff_intro, mk_subsingleton_elim,
    subst_all, Binder,
};
use crate::ctx::TypeContext;
use serde::{Deserialize, Serialize};
use veritas_kernel::expr::{BinderInfo, Expr, FVarId};
use veritas_kernel::name::Name;

/// How a rewriter should treat one argument position of an
/// application when using a congruence lemma.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongrArgKind {
    /// The lemma has a parameter for this argument, and it is the same
    /// on both sides of the conclusion.
    Fixed,
    /// The argument is baked into the lemma statement itself; there is
    /// no parameter for it. Only produced by the specialized entry
    /// points.
    FixedNoParam,
    /// The lemma takes left and right values plus an equality between
    /// them.
    Eq,
    /// The argument's type has at most one inhabitant, so the two
    /// sides may differ without a premise relating them.
    Cast,
    /// Left and right values live in different types; the premise is a
    /// heterogeneous equality.
    HEq,
}

/// A synthesized congruence lemma: its statement, its proof term, and
/// the kind of each argument position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CongrLemma {
    type_: Expr,
    proof: Expr,
    arg_kinds: Vec<CongrArgKind>,
}

impl CongrLemma {
    pub fn type_(&self) -> &Expr {
        &self.type_
    }

    pub fn proof(&self) -> &Expr {
        &self.proof
    }

    pub fn arg_kinds(&self) -> &[CongrArgKind] {
        &self.arg_kinds
    }

    /// Every argument takes a plain equality premise.
    pub fn all_eq_kinds(&self) -> bool {
        self.arg_kinds.iter().all(|k| *k == CongrArgKind::Eq)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flavor {
    /// Left-to-right rewriting: fixed arguments share one parameter.
    Simp,
    /// Full congruence: varying arguments get separate sides.
    Congr,
    /// Heterogeneous congruence: every argument may vary.
    HCongr,
}

/// One argument position of the lemma under construction.
struct ArgSlot {
    kind: CongrArgKind,
    /// Type of the left-hand value, in terms of earlier left values.
    ty: Expr,
    /// `ty` with earlier left values renamed to their right values.
    rhs_ty: Expr,
    lhs: Expr,
    rhs: Expr,
    /// Lemma parameters this slot contributes, in statement order.
    binders: Vec<Binder>,
    /// Premise local (the `e`/`h` hypothesis), when the slot has one.
    prem: Option<Expr>,
    /// Subsingleton instance for `Cast` slots.
    inst: Option<Expr>,
    two_sided: bool,
    depended: bool,
}

/// Congruence lemma for rewriting with `simp`, over every argument
/// `f`'s type takes: arguments that later types depend on stay fixed,
/// as do instance-implicit arguments; subsingleton arguments are
/// cast, the rest take equalities.
pub fn mk_congr_simp(ctx: &mut dyn TypeContext, f: &Expr) -> Option<CongrLemma> {
    let nargs = telescope_arity(ctx, f)?;
    mk_congr_simp_n(ctx, f, nargs)
}

/// [`mk_congr_simp`] at an explicit arity, for partial applications.
pub fn mk_congr_simp_n(
    ctx: &mut dyn TypeContext,
    f: &Expr,
    nargs: usize,
) -> Option<CongrLemma> {
    tracing::debug!(nargs, "synthesizing simp congruence lemma");
    synth(ctx, f, nargs, None, Flavor::Simp)
}

/// Full congruence lemma: both sides of every varying argument are
/// separate parameters, falling back to heterogeneous premises where
/// earlier casts make the types drift.
pub fn mk_congr(ctx: &mut dyn TypeContext, f: &Expr) -> Option<CongrLemma> {
    let nargs = telescope_arity(ctx, f)?;
    mk_congr_n(ctx, f, nargs)
}

/// [`mk_congr`] at an explicit arity.
pub fn mk_congr_n(ctx: &mut dyn TypeContext, f: &Expr, nargs: usize) -> Option<CongrLemma> {
    tracing::debug!(nargs, "synthesizing congruence lemma");
    synth(ctx, f, nargs, None, Flavor::Congr)
}

/// Heterogeneous congruence lemma: every argument varies and every
/// premise is a `HEq`, with a `HEq` conclusion.
pub fn mk_hcongr(ctx: &mut dyn TypeContext, f: &Expr) -> Option<CongrLemma> {
    let nargs = telescope_arity(ctx, f)?;
    mk_hcongr_n(ctx, f, nargs)
}

/// [`mk_hcongr`] at an explicit arity.
pub fn mk_hcongr_n(ctx: &mut dyn TypeContext, f: &Expr, nargs: usize) -> Option<CongrLemma> {
    tracing::debug!(nargs, "synthesizing heterogeneous congruence lemma");
    synth(ctx, f, nargs, None, Flavor::HCongr)
}

/// Number of leading binders in `f`'s type.
fn telescope_arity(ctx: &mut dyn TypeContext, f: &Expr) -> Option<usize> {
    let f_ty = ctx.infer_type(f)?;
    let mut cur = ctx.whnf(&f_ty);
    let mut n: usize = 0;
    while let Expr::Pi(_, dom, cod) = &cur {
        let x = ctx.push_local(Name::anon().str("t").num(n as u64), (**dom).clone());
        let next = cod.instantiate(&x);
        cur = ctx.whnf(&next);
        n += 1;
    }
    Some(n)
}

/// Congruence lemma specialized to the given application: fixed
/// arguments are baked in as the application's actual values instead
/// of being parameters.
pub fn mk_specialized_congr(ctx: &mut dyn TypeContext, app: &Expr) -> Option<CongrLemma> {
    let f = app.get_app_fn().clone();
    let args: Vec<Expr> = app.get_app_args().into_iter().cloned().collect();
    if args.is_empty() {
        return None;
    }
    tracing::debug!(nargs = args.len(), "synthesizing specialized congruence lemma");
    synth(ctx, &f, args.len(), Some(&args), Flavor::Congr)
}

/// Specialized variant of [`mk_congr_simp`] for a concrete
/// application.
pub fn mk_specialized_congr_simp(ctx: &mut dyn TypeContext, app: &Expr) -> Option<CongrLemma> {
    let f = app.get_app_fn().clone();
    let args: Vec<Expr> = app.get_app_args().into_iter().cloned().collect();
    if args.is_empty() {
        return None;
    }
    tracing::debug!(
        nargs = args.len(),
        "synthesizing specialized simp congruence lemma"
    );
    synth(ctx, &f, args.len(), Some(&args), Flavor::Simp)
}

fn synth(
    ctx: &mut dyn TypeContext,
    f: &Expr,
    nargs: usize,
    spec_args: Option<&[Expr]>,
    flavor: Flavor,
) -> Option<CongrLemma> {
    let f_ty = ctx.infer_type(f)?;

    // Peel the function type into a raw telescope of locals so
    // dependence between argument positions can be read off.
    let mut cur = ctx.whnf(&f_ty);
    let mut raw_locals: Vec<Expr> = Vec::with_capacity(nargs);
    let mut raw_tys: Vec<Expr> = Vec::with_capacity(nargs);
    let mut raw_bis: Vec<BinderInfo> = Vec::with_capacity(nargs);
    for i in 0..nargs {
        let (bi, dom, cod) = match &cur {
            Expr::Pi(bi, dom, cod) => (*bi, (**dom).clone(), (**cod).clone()),
            _ => return None,
        };
        let x = ctx.push_local(Name::anon().str("x").num(i as u64), dom.clone());
        let next = cod.instantiate(&x);
        cur = ctx.whnf(&next);
        raw_tys.push(dom);
        raw_bis.push(bi);
        raw_locals.push(x);
    }
    let result_raw = cur;

    // A position is depended on when a later argument type or the
    // result type mentions it.
    let depended: Vec<bool> = (0..nargs)
        .map(|i| {
            let xi = fvar_id(&raw_locals[i]);
            raw_tys[i + 1..].iter().any(|t| t.has_fvar(xi)) || result_raw.has_fvar(xi)
        })
        .collect();

    // Classify each position and allocate its lemma parameters.
    // `lmap` renames raw locals to the slot's left value; `rmap`
    // renames left values of two-sided slots to their right values.
    let mut slots: Vec<ArgSlot> = Vec::with_capacity(nargs);
    let mut lmap: Vec<(FVarId, Expr)> = Vec::new();
    let mut rmap: Vec<(FVarId, Expr)> = Vec::new();
    for i in 0..nargs {
        let xi = fvar_id(&raw_locals[i]);
        let ty = subst_all(&raw_tys[i], &lmap);
        let mentions_varying = rmap.iter().any(|(id, _)| ty.has_fvar(*id));
        let inst = ctx.subsingleton_instance(&ty);
        let kind = classify(
            flavor,
            spec_args.is_some(),
            depended[i],
            raw_bis[i] == BinderInfo::InstImplicit,
            inst.is_some(),
            mentions_varying,
        )?;
        tracing::trace!(index = i, kind = ?kind, "classified argument");
        let slot = build_slot(
            ctx,
            i,
            xi,
            kind,
            flavor,
            ty,
            raw_bis[i],
            inst,
            depended[i],
            spec_args,
            &mut lmap,
            &mut rmap,
        )?;
        slots.push(slot);
    }

    let result_ty = subst_all(&result_raw, &lmap);
    if flavor != Flavor::HCongr && rmap.iter().any(|(id, _)| result_ty.has_fvar(*id)) {
        // The result type changes with a varying argument; only the
        // heterogeneous conclusion can express that.
        return None;
    }
    let result_rhs_ty = subst_all(&result_ty, &rmap);

    let lhs_app = Expr::mk_app(f.clone(), slots.iter().map(|s| s.lhs.clone()));
    let rhs_app = Expr::mk_app(f.clone(), slots.iter().map(|s| s.rhs.clone()));
    let concl = if flavor == Flavor::HCongr {
        mk_heq(
            ctx,
            &result_ty,
            lhs_app.clone(),
            &result_rhs_ty,
            rhs_app.clone(),
        )?
    } else {
        mk_eq(ctx, &result_ty, lhs_app.clone(), rhs_app.clone())?
    };

    let all_binders: Vec<Binder> = slots.iter().flat_map(|s| s.binders.clone()).collect();
    let type_ = bind_pi(&all_binders, concl.clone());

    let needs_transport = flavor == Flavor::HCongr
        || slots.iter().any(|s| {
            s.kind == CongrArgKind::HEq
                || (s.kind == CongrArgKind::Cast
                    && s.two_sided
                    && (s.depended || s.ty != s.rhs_ty))
        });
    let proof = if needs_transport {
        transport_proof(
            ctx,
            &slots,
            &concl,
            &result_ty,
            &lhs_app,
            flavor == Flavor::HCongr,
            0,
            &[],
        )?
    } else {
        let body = threading_proof(ctx, f, &f_ty, &slots)?;
        bind_lambda(&all_binders, body)
    };

    Some(CongrLemma {
        type_,
        proof,
        arg_kinds: slots.iter().map(|s| s.kind).collect(),
    })
}

/// Pick the argument kind for one position. `None` aborts the whole
/// lemma: the position cannot be expressed in this flavor.
fn classify(
    flavor: Flavor,
    specialized: bool,
    depended: bool,
    inst_implicit: bool,
    subsingleton: bool,
    mentions_varying: bool,
) -> Option<CongrArgKind> {
    match flavor {
        Flavor::Simp => {
            if subsingleton {
                if specialized && depended {
                    Some(CongrArgKind::FixedNoParam)
                } else {
                    Some(CongrArgKind::Cast)
                }
            } else if depended || inst_implicit {
                // Instance arguments are resolved to one shared value
                // by the caller, so the lemma never relates two of
                // them.
                Some(CongrArgKind::Fixed)
            } else {
                Some(CongrArgKind::Eq)
            }
        }
        Flavor::Congr => {
            if subsingleton {
                if specialized && depended {
                    if mentions_varying {
                        // The baked value's type would mention a lemma
                        // parameter it cannot see.
                        None
                    } else {
                        Some(CongrArgKind::FixedNoParam)
                    }
                } else {
                    Some(CongrArgKind::Cast)
                }
            } else if depended || inst_implicit {
                if mentions_varying {
                    // A shared-parameter argument whose type drifts
                    // cannot be fixed, cast, or equated.
                    None
                } else {
                    Some(CongrArgKind::Fixed)
                }
            } else if mentions_varying {
                Some(CongrArgKind::HEq)
            } else {
                Some(CongrArgKind::Eq)
            }
        }
        Flavor::HCongr => {
            if subsingleton {
                Some(CongrArgKind::Cast)
            } else {
                Some(CongrArgKind::HEq)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_slot(
    ctx: &mut dyn TypeContext,
    i: usize,
    raw_id: FVarId,
    kind: CongrArgKind,
    flavor: Flavor,
    ty: Expr,
    bi: BinderInfo,
    inst: Option<Expr>,
    depended: bool,
    spec_args: Option<&[Expr]>,
    lmap: &mut Vec<(FVarId, Expr)>,
    rmap: &mut Vec<(FVarId, Expr)>,
) -> Option<ArgSlot> {
    let idx = i as u64;
    let rhs_ty = subst_all(&ty, rmap);

    // Specialized lemmas bake fixed positions in as the actual
    // arguments; there is no parameter to vary.
    let baked = spec_args.is_some()
        && matches!(kind, CongrArgKind::Fixed | CongrArgKind::FixedNoParam);
    if baked {
        let val = spec_args?[i].clone();
        lmap.push((raw_id, val.clone()));
        return Some(ArgSlot {
            kind,
            ty,
            rhs_ty,
            lhs: val.clone(),
            rhs: val,
            binders: Vec::new(),
            prem: None,
            inst,
            two_sided: false,
            depended,
        });
    }

    let one_sided = matches!(kind, CongrArgKind::Fixed)
        || (kind == CongrArgKind::Cast && flavor == Flavor::Simp);
    if one_sided {
        let a = ctx.push_local(Name::anon().str("a").num(idx), ty.clone());
        lmap.push((raw_id, a.clone()));
        // The shared parameter keeps the function's own binder
        // annotation, so instance arguments stay instance-implicit in
        // the statement.
        return Some(ArgSlot {
            kind,
            binders: vec![(fvar_id(&a), bi, ty.clone())],
            rhs_ty,
            lhs: a.clone(),
            rhs: a,
            ty,
            prem: None,
            inst,
            two_sided: false,
            depended,
        });
    }

    // Two-sided: left and right parameters, plus a premise for the
    // Eq and HEq kinds.
    let a = ctx.push_local(Name::anon().str("a").num(idx), ty.clone());
    let b = ctx.push_local(Name::anon().str("b").num(idx), rhs_ty.clone());
    let mut binders = vec![
        (fvar_id(&a), bi, ty.clone()),
        (fvar_id(&b), bi, rhs_ty.clone()),
    ];
    let prem = match kind {
        CongrArgKind::Eq => {
            let prem_ty = mk_eq(ctx, &ty, a.clone(), b.clone())?;
            let e = ctx.push_local(Name::anon().str("e").num(idx), prem_ty.clone());
            binders.push((fvar_id(&e), BinderInfo::Default, prem_ty));
            Some(e)
        }
        CongrArgKind::HEq => {
            let prem_ty = mk_heq(ctx, &ty, a.clone(), &rhs_ty, b.clone())?;
            let h = ctx.push_local(Name::anon().str("h").num(idx), prem_ty.clone());
            binders.push((fvar_id(&h), BinderInfo::Default, prem_ty));
            Some(h)
        }
        CongrArgKind::Cast => None,
        CongrArgKind::Fixed | CongrArgKind::FixedNoParam => {
            unreachable!("fixed kinds are never two-sided")
        }
    };
    lmap.push((raw_id, a.clone()));
    rmap.push((fvar_id(&a), b.clone()));
    Some(ArgSlot {
        kind,
        ty,
        rhs_ty,
        lhs: a,
        rhs: b,
        binders,
        prem,
        inst,
        two_sided: true,
        depended,
    })
}

/// Proof by threading `congr`/`congrFun` steps across the argument
/// list. Only applicable when every step is homogeneous and
/// non-dependent; `synth` checks that before choosing this path.
fn threading_proof(
    ctx: &mut dyn TypeContext,
    f: &Expr,
    f_ty: &Expr,
    slots: &[ArgSlot],
) -> Option<Expr> {
    let mut pf = mk_eq_refl(ctx, f_ty, f.clone())?;
    let mut lhs_fn = f.clone();
    let mut rhs_fn = f.clone();
    let mut cur_ty = ctx.whnf(f_ty);
    for slot in slots {
        let cod = match &cur_ty {
            Expr::Pi(_, _, cod) => (**cod).clone(),
            _ => return None,
        };
        if !slot.two_sided {
            // Same value on both sides: f a = g a from f = g.
            let val = slot.lhs.clone();
            let cod_at = cod.instantiate(&val);
            pf = mk_congr_fun_app(
                ctx,
                &slot.ty,
                &cod,
                &cod_at,
                lhs_fn.clone(),
                rhs_fn.clone(),
                pf,
                val.clone(),
            )?;
            lhs_fn = Expr::app(lhs_fn, val.clone());
            rhs_fn = Expr::app(rhs_fn, val);
            cur_ty = ctx.whnf(&cod_at);
        } else {
            let a = slot.lhs.clone();
            let b = slot.rhs.clone();
            // Non-dependent codomain; instantiating at either side
            // gives the same type.
            let cod_at = cod.instantiate(&a);
            let h2 = match slot.kind {
                CongrArgKind::Eq => slot.prem.clone()?,
                CongrArgKind::Cast => {
                    let inst = slot.inst.clone()?;
                    mk_subsingleton_elim(ctx, &slot.ty, inst, a.clone(), b.clone())?
                }
                _ => unreachable!("heterogeneous slot reached the threading proof"),
            };
            pf = mk_congr_app(
                ctx,
                &slot.ty,
                &cod_at,
                lhs_fn.clone(),
                rhs_fn.clone(),
                a.clone(),
                b.clone(),
                pf,
                h2,
            )?;
            lhs_fn = Expr::app(lhs_fn, a);
            rhs_fn = Expr::app(rhs_fn, b);
            cur_ty = ctx.whnf(&cod_at);
        }
    }
    Some(pf)
}

/// Proof by transport: start from reflexivity at the all-left
/// application and rewrite the right side in, one two-sided slot at a
/// time, with `Eq.ndrec`. `sigma` renames the right values of already
/// processed slots back onto their left values, which keeps every step
/// homogeneous.
#[allow(clippy::too_many_arguments)]
fn transport_proof(
    ctx: &mut dyn TypeContext,
    slots: &[ArgSlot],
    concl: &Expr,
    result_ty: &Expr,
    lhs_app: &Expr,
    heq_goal: bool,
    i: usize,
    sigma: &[(FVarId, Expr)],
) -> Option<Expr> {
    if i == slots.len() {
        // Under sigma every right value equals its left value, so the
        // remaining goal is reflexivity.
        return if heq_goal {
            mk_heq_refl(ctx, result_ty, lhs_app.clone())
        } else {
            mk_eq_refl(ctx, result_ty, lhs_app.clone())
        };
    }
    let slot = &slots[i];
    let binders_s = sigma_binders(&slot.binders, sigma);
    if !slot.two_sided {
        let inner =
            transport_proof(ctx, slots, concl, result_ty, lhs_app, heq_goal, i + 1, sigma)?;
        return Some(bind_lambda(&binders_s, inner));
    }

    let ty_s = subst_all(&slot.ty, sigma);
    let a = slot.lhs.clone();
    let b = slot.rhs.clone();
    let b_id = fvar_id(&b);
    // Homogeneous equality between the two sides, under sigma.
    let e = match slot.kind {
        CongrArgKind::Eq => slot.prem.clone()?,
        CongrArgKind::HEq => {
            let h = slot.prem.clone()?;
            mk_eq_of_heq(ctx, &ty_s, a.clone(), b.clone(), h)?
        }
        CongrArgKind::Cast => {
            let inst = subst_all(slot.inst.as_ref()?, sigma);
            mk_subsingleton_elim(ctx, &ty_s, inst, a.clone(), b.clone())?
        }
        _ => unreachable!("one-sided slot marked two-sided"),
    };

    let y = ctx.push_local(Name::anon().str("y").num(i as u64), ty_s.clone());
    let mut sigma_y = sigma.to_vec();
    sigma_y.push((b_id, y.clone()));
    let motive_body = residual_goal(slots, concl, i + 1, &sigma_y);
    let motive = Expr::lam(
        BinderInfo::Default,
        ty_s.clone(),
        motive_body.abstract_fvar(fvar_id(&y)),
    );

    let mut sigma_a = sigma.to_vec();
    sigma_a.push((b_id, a.clone()));
    let inner = transport_proof(
        ctx, slots, concl, result_ty, lhs_app, heq_goal, i + 1, &sigma_a,
    )?;
    let body = mk_eq_ndrec(ctx, &ty_s, a, motive, inner, b, e)?;
    Some(bind_lambda(&binders_s, body))
}

/// The goal remaining after the first `i` slots, as a Pi over the
/// later binders, with `sigma` applied throughout.
fn residual_goal(slots: &[ArgSlot], concl: &Expr, i: usize, sigma: &[(FVarId, Expr)]) -> Expr {
    let binders: Vec<Binder> = slots[i..]
        .iter()
        .flat_map(|s| sigma_binders(&s.binders, sigma))
        .collect();
    bind_pi(&binders, subst_all(concl, sigma))
}

fn sigma_binders(binders: &[Binder], sigma: &[(FVarId, Expr)]) -> Vec<Binder> {
    binders
        .iter()
        .map(|(id, bi, ty)| (*id, *bi, subst_all(ty, sigma)))
        .collect()
}

/// Congruence over a binary relation's own equivalence: from
/// `R a₁ a₂` and `R b₁ b₂` conclude `R a₁ b₁ ↔ R a₂ b₂`, using the
/// relation's symmetry and transitivity.
pub fn mk_rel_iff_congr(ctx: &mut dyn TypeContext, r: &Expr) -> Option<CongrLemma> {
    tracing::debug!("synthesizing relation iff-congruence lemma");
    let (binders, lhs, rhs, iff_proof) = rel_congr_core(ctx, r)?;
    let concl = mk_iff(lhs, rhs);
    Some(CongrLemma {
        type_: bind_pi(&binders, concl),
        proof: bind_lambda(&binders, iff_proof),
        arg_kinds: vec![CongrArgKind::Eq, CongrArgKind::Eq],
    })
}

/// Variant of [`mk_rel_iff_congr`] with an equality conclusion,
/// obtained through propositional extensionality. Unavailable when
/// the ambient library lacks `propext`.
pub fn mk_rel_eq_congr(ctx: &mut dyn TypeContext, r: &Expr) -> Option<CongrLemma> {
    tracing::debug!("synthesizing relation eq-congruence lemma");
    let propext = ctx.propext()?;
    let (binders, lhs, rhs, iff_proof) = rel_congr_core(ctx, r)?;
    let concl = mk_eq(ctx, &Expr::prop(), lhs.clone(), rhs.clone())?;
    let proof_body = Expr::mk_app(propext, [lhs, rhs, iff_proof]);
    Some(CongrLemma {
        type_: bind_pi(&binders, concl),
        proof: bind_lambda(&binders, proof_body),
        arg_kinds: vec![CongrArgKind::Eq, CongrArgKind::Eq],
    })
}

/// Shared statement and `Iff` proof for the relation congruence
/// lemmas. Requires `r` to be a homogeneous binary relation into
/// `Prop` and the context to know it is symmetric and transitive.
fn rel_congr_core(
    ctx: &mut dyn TypeContext,
    r: &Expr,
) -> Option<(Vec<Binder>, Expr, Expr, Expr)> {
    let inferred = ctx.infer_type(r)?;
    let r_ty = ctx.whnf(&inferred);
    let (dom1, rest) = match &r_ty {
        Expr::Pi(_, dom, rest) => ((**dom).clone(), (**rest).clone()),
        _ => return None,
    };
    let a1 = ctx.push_local(Name::interned("a1"), dom1.clone());
    let rest1 = ctx.whnf(&rest.instantiate(&a1));
    let (dom2, cod) = match &rest1 {
        Expr::Pi(_, dom, cod) => ((**dom).clone(), (**cod).clone()),
        _ => return None,
    };
    if !ctx.is_def_eq(&dom1, &dom2) {
        return None;
    }
    let a2 = ctx.push_local(Name::interned("a2"), dom1.clone());
    let result = ctx.whnf(&cod.instantiate(&a2));
    if !result.is_prop() {
        return None;
    }

    let b1 = ctx.push_local(Name::interned("b1"), dom1.clone());
    let b2 = ctx.push_local(Name::interned("b2"), dom1.clone());
    let rel = |x: &Expr, y: &Expr| Expr::mk_app(r.clone(), [x.clone(), y.clone()]);
    let h1_ty = rel(&a1, &a2);
    let h1 = ctx.push_local(Name::interned("h1"), h1_ty.clone());
    let h2_ty = rel(&b1, &b2);
    let h2 = ctx.push_local(Name::interned("h2"), h2_ty.clone());
    let lhs = rel(&a1, &b1);
    let rhs = rel(&a2, &b2);

    // forward: R a1 b1 -> R a2 b2
    let hx = ctx.push_local(Name::interned("hx"), lhs.clone());
    let s1 = ctx.rel_symm(&h1)?; // R a2 a1
    let t1 = ctx.rel_trans(&s1, &hx)?; // R a2 b1
    let fwd_body = ctx.rel_trans(&t1, &h2)?; // R a2 b2
    let fwd = bind_lambda(
        &[(fvar_id(&hx), BinderInfo::Default, lhs.clone())],
        fwd_body,
    );

    // backward: R a2 b2 -> R a1 b1
    let hy = ctx.push_local(Name::interned("hy"), rhs.clone());
    let t2 = ctx.rel_trans(&h1, &hy)?; // R a1 b2
    let s2 = ctx.rel_symm(&h2)?; // R b2 b1
    let bwd_body = ctx.rel_trans(&t2, &s2)?; // R a1 b1
    let bwd = bind_lambda(
        &[(fvar_id(&hy), BinderInfo::Default, rhs.clone())],
        bwd_body,
    );

    let iff_proof = mk_iff_intro(lhs.clone(), rhs.clone(), fwd, bwd);
    let binders = vec![
        (fvar_id(&a1), BinderInfo::Default, dom1.clone()),
        (fvar_id(&a2), BinderInfo::Default, dom1.clone()),
        (fvar_id(&b1), BinderInfo::Default, dom1.clone()),
        (fvar_id(&b2), BinderInfo::Default, dom1),
        (fvar_id(&h1), BinderInfo::Default, h1_ty),
        (fvar_id(&h2), BinderInfo::Default, h2_ty),
    ];
    Some((binders, lhs, rhs, iff_proof))
}
