//! End-to-end synthesis tests against a small structural typing
//! context: a constant table, a local table, and no reduction.

use hashbrown::HashMap;
use veritas_congr::{
    mk_congr, mk_congr_n, mk_congr_simp, mk_congr_simp_n, mk_hcongr, mk_hcongr_n,
    mk_rel_eq_congr, mk_rel_iff_congr, mk_specialized_congr, CongrArgKind, TypeContext,
};
use veritas_kernel::expr::{BinderInfo, Expr, FVarId, LevelVec};
use veritas_kernel::level::Level;
use veritas_kernel::name::Name;

struct MockCtx {
    consts: HashMap<Name, Expr>,
    locals: HashMap<FVarId, Expr>,
    next_fvar: u64,
    has_propext: bool,
    has_rel_ops: bool,
}

impl MockCtx {
    fn new() -> Self {
        MockCtx {
            consts: HashMap::new(),
            locals: HashMap::new(),
            next_fvar: 1000,
            has_propext: true,
            has_rel_ops: true,
        }
    }

    fn declare(&mut self, name: &str, ty: Expr) -> Expr {
        let n = Name::from_string(name);
        self.consts.insert(n.clone(), ty);
        Expr::const_(n, LevelVec::new())
    }

    fn sort_of(&mut self, e: &Expr) -> Option<Level> {
        match self.infer_type(e)? {
            Expr::Sort(l) => Some(l),
            _ => None,
        }
    }
}

impl TypeContext for MockCtx {
    fn infer_type(&mut self, e: &Expr) -> Option<Expr> {
        match e {
            Expr::FVar(id) => self.locals.get(id).cloned(),
            Expr::Const(n, _) => self.consts.get(n).cloned(),
            Expr::Sort(l) => Some(Expr::sort(Level::succ(l.clone()))),
            Expr::App(f, a) => match self.infer_type(f)? {
                Expr::Pi(_, _, cod) => Some(cod.instantiate(a)),
                _ => None,
            },
            Expr::Pi(_, dom, cod) => {
                let l1 = self.sort_of(dom)?;
                let body = if cod.has_loose_bvars() {
                    let x = self.push_local(Name::from_string("x"), (**dom).clone());
                    cod.instantiate(&x)
                } else {
                    (**cod).clone()
                };
                let l2 = self.sort_of(&body)?;
                Some(Expr::sort(Level::imax(l1, l2)))
            }
            _ => None,
        }
    }

    fn whnf(&mut self, e: &Expr) -> Expr {
        e.clone()
    }

    fn is_def_eq(&mut self, a: &Expr, b: &Expr) -> bool {
        a == b
    }

    fn push_local(&mut self, _name: Name, ty: Expr) -> Expr {
        let id = FVarId(self.next_fvar);
        self.next_fvar += 1;
        self.locals.insert(id, ty);
        Expr::fvar(id)
    }

    fn subsingleton_instance(&mut self, ty: &Expr) -> Option<Expr> {
        // Propositions are subsingletons; nothing else is, here.
        if self.infer_type(ty)? == Expr::prop() {
            Some(Expr::app(
                Expr::const_(Name::from_string("instSubsingleton"), LevelVec::new()),
                ty.clone(),
            ))
        } else {
            None
        }
    }

    fn propext(&mut self) -> Option<Expr> {
        if self.has_propext {
            Some(Expr::const_(Name::from_string("propext"), LevelVec::new()))
        } else {
            None
        }
    }

    fn rel_symm(&mut self, pf: &Expr) -> Option<Expr> {
        if self.has_rel_ops {
            Some(Expr::app(
                Expr::const_(Name::from_string("Relation.symm"), LevelVec::new()),
                pf.clone(),
            ))
        } else {
            None
        }
    }

    fn rel_trans(&mut self, pf1: &Expr, pf2: &Expr) -> Option<Expr> {
        if self.has_rel_ops {
            Some(Expr::mk_app(
                Expr::const_(Name::from_string("Relation.trans"), LevelVec::new()),
                [pf1.clone(), pf2.clone()],
            ))
        } else {
            None
        }
    }
}

fn pi(dom: Expr, cod: Expr) -> Expr {
    Expr::pi(BinderInfo::Default, dom, cod)
}

fn count_pis(e: &Expr) -> usize {
    match e {
        Expr::Pi(_, _, body) => 1 + count_pis(body),
        _ => 0,
    }
}

fn peel_pis(e: &Expr) -> &Expr {
    match e {
        Expr::Pi(_, _, body) => peel_pis(body),
        _ => e,
    }
}

fn head_const(e: &Expr) -> Option<String> {
    match e.get_app_fn() {
        Expr::Const(n, _) => Some(n.to_string()),
        _ => None,
    }
}

fn contains_const(e: &Expr, name: &str) -> bool {
    let wanted = Name::from_string(name);
    e.any_constant(&mut |n| *n == wanted)
}

#[test]
fn simp_lemma_fixes_dependent_props() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    // f : (p : Prop) -> p -> Nat -> Nat
    let f = ctx.declare(
        "f",
        pi(
            Expr::prop(),
            pi(Expr::bvar(0), pi(nat.clone(), nat.clone())),
        ),
    );

    let lemma = mk_congr_simp_n(&mut ctx, &f, 3).expect("simp lemma");
    assert_eq!(
        lemma.arg_kinds(),
        &[CongrArgKind::Fixed, CongrArgKind::Cast, CongrArgKind::Eq]
    );
    assert!(!lemma.all_eq_kinds());
    // One binder each for p and h, three for the Nat argument.
    assert_eq!(count_pis(lemma.type_()), 5);
    assert_eq!(head_const(peel_pis(lemma.type_())).as_deref(), Some("Eq"));
    assert!(!lemma.type_().has_loose_bvars());
    assert!(!lemma.proof().has_loose_bvars());
    // Threaded proof: congrFun over the fixed prefix, congr at the end.
    assert!(contains_const(lemma.proof(), "Eq.refl"));
    assert!(contains_const(lemma.proof(), "congrFun"));
    assert!(contains_const(lemma.proof(), "congr"));
}

#[test]
fn binary_function_gets_plain_equalities() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let g = ctx.declare(
        "g",
        Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), nat.clone())),
    );

    // Arity derived from the function type.
    let lemma = mk_congr_simp(&mut ctx, &g).expect("simp lemma");
    assert_eq!(lemma.arg_kinds(), &[CongrArgKind::Eq, CongrArgKind::Eq]);
    assert!(lemma.all_eq_kinds());
    assert_eq!(count_pis(lemma.type_()), 6);
    // The proof is congr (congr (Eq.refl g) e0) e1 under the binders.
    let mut body = lemma.proof();
    while let Expr::Lam(_, _, inner) = body {
        body = inner.as_ref();
    }
    assert_eq!(head_const(body).as_deref(), Some("congr"));
    assert!(contains_const(body, "Eq.refl"));

    // The full congruence flavor agrees on this function.
    let lemma2 = mk_congr(&mut ctx, &g).expect("congr lemma");
    assert_eq!(lemma2.arg_kinds(), &[CongrArgKind::Eq, CongrArgKind::Eq]);
}

#[test]
fn arity_beyond_function_type_is_declined() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let g = ctx.declare("g", Expr::arrow(nat.clone(), nat.clone()));
    assert!(mk_congr_simp_n(&mut ctx, &g, 5).is_none());
    assert!(mk_congr_n(&mut ctx, &g, 1).is_some());
}

#[test]
fn inst_implicit_arguments_stay_fixed() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let monoid = ctx.declare("Monoid", Expr::type_());
    // mul : [inst : Monoid] -> Nat -> Nat -> Nat. The instance is
    // resolved once and shared by both sides of the rewrite, so it
    // must not take an equality premise.
    let mul = ctx.declare(
        "mul",
        Expr::pi(
            BinderInfo::InstImplicit,
            monoid.clone(),
            Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), nat.clone())),
        ),
    );

    let lemma = mk_congr_simp(&mut ctx, &mul).expect("simp lemma");
    assert_eq!(
        lemma.arg_kinds(),
        &[CongrArgKind::Fixed, CongrArgKind::Eq, CongrArgKind::Eq]
    );
    // One shared binder for the instance, three per Nat argument.
    assert_eq!(count_pis(lemma.type_()), 7);
    // The shared binder keeps its instance-implicit annotation.
    let Expr::Pi(bi, _, _) = lemma.type_() else {
        panic!("expected a Pi statement");
    };
    assert_eq!(*bi, BinderInfo::InstImplicit);
    assert!(!lemma.type_().has_loose_bvars());
    assert!(!lemma.proof().has_loose_bvars());
    assert!(contains_const(lemma.proof(), "congrFun"));

    // The full congruence flavor pins the instance the same way.
    let lemma2 = mk_congr(&mut ctx, &mul).expect("congr lemma");
    assert_eq!(
        lemma2.arg_kinds(),
        &[CongrArgKind::Fixed, CongrArgKind::Eq, CongrArgKind::Eq]
    );
}

#[test]
fn hcongr_transports_dependent_arguments() {
    let mut ctx = MockCtx::new();
    // g2 : (A : Type) -> A -> A
    let g2 = ctx.declare("g2", pi(Expr::type_(), pi(Expr::bvar(0), Expr::bvar(1))));

    let lemma = mk_hcongr(&mut ctx, &g2).expect("hcongr lemma");
    assert_eq!(lemma.arg_kinds(), &[CongrArgKind::HEq, CongrArgKind::HEq]);
    assert_eq!(count_pis(lemma.type_()), 6);
    assert_eq!(head_const(peel_pis(lemma.type_())).as_deref(), Some("HEq"));
    assert!(!lemma.type_().has_loose_bvars());
    assert!(!lemma.proof().has_loose_bvars());
    // Transport proof: HEq.refl at the core, Eq.ndrec per argument,
    // eq_of_heq to homogenize the premises.
    assert!(contains_const(lemma.proof(), "HEq.refl"));
    assert!(contains_const(lemma.proof(), "Eq.ndrec"));
    assert!(contains_const(lemma.proof(), "eq_of_heq"));
}

#[test]
fn congr_casts_subsingletons_and_falls_back_to_heq() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    // C : (p : Prop) -> p -> Type
    let c = ctx.declare("C", pi(Expr::prop(), pi(Expr::bvar(0), Expr::type_())));
    // f3 : (p : Prop) -> (h : p) -> C p h -> Nat
    let c_p_h = Expr::mk_app(c.clone(), [Expr::bvar(1), Expr::bvar(0)]);
    let f3 = ctx.declare(
        "f3",
        pi(Expr::prop(), pi(Expr::bvar(0), pi(c_p_h, nat.clone()))),
    );

    let lemma = mk_congr(&mut ctx, &f3).expect("congr lemma");
    assert_eq!(
        lemma.arg_kinds(),
        &[CongrArgKind::Fixed, CongrArgKind::Cast, CongrArgKind::HEq]
    );
    // p; h left and right; x left, right, and premise.
    assert_eq!(count_pis(lemma.type_()), 6);
    assert_eq!(head_const(peel_pis(lemma.type_())).as_deref(), Some("Eq"));
    assert!(!lemma.proof().has_loose_bvars());
    assert!(contains_const(lemma.proof(), "Subsingleton.elim"));
    assert!(contains_const(lemma.proof(), "Eq.ndrec"));
    assert!(contains_const(lemma.proof(), "eq_of_heq"));
}

#[test]
fn congr_declines_heterogeneous_dependency_but_hcongr_accepts() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let c = ctx.declare("C", pi(Expr::prop(), pi(Expr::bvar(0), Expr::type_())));
    let c_p_h = Expr::mk_app(c.clone(), [Expr::bvar(1), Expr::bvar(0)]);
    // D : (p : Prop) -> (h : p) -> C p h -> Type
    let d = ctx.declare(
        "D",
        pi(Expr::prop(), pi(Expr::bvar(0), pi(c_p_h.clone(), Expr::type_()))),
    );
    // f4 : (p : Prop) -> (h : p) -> (x : C p h) -> D p h x -> Nat
    let d_p_h_x = Expr::mk_app(d.clone(), [Expr::bvar(2), Expr::bvar(1), Expr::bvar(0)]);
    let f4 = ctx.declare(
        "f4",
        pi(
            Expr::prop(),
            pi(Expr::bvar(0), pi(c_p_h, pi(d_p_h_x, nat.clone()))),
        ),
    );

    // x is depended on and its type drifts with the cast argument h;
    // no homogeneous lemma can express that.
    assert!(mk_congr(&mut ctx, &f4).is_none());

    let lemma = mk_hcongr_n(&mut ctx, &f4, 4).expect("hcongr lemma");
    assert_eq!(
        lemma.arg_kinds(),
        &[
            CongrArgKind::HEq,
            CongrArgKind::Cast,
            CongrArgKind::HEq,
            CongrArgKind::HEq,
        ]
    );
}

#[test]
fn specialized_congr_bakes_fixed_arguments() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let c = ctx.declare("C", pi(Expr::prop(), pi(Expr::bvar(0), Expr::type_())));
    let c_p_h = Expr::mk_app(c.clone(), [Expr::bvar(1), Expr::bvar(0)]);
    let f3 = ctx.declare(
        "f3",
        pi(Expr::prop(), pi(Expr::bvar(0), pi(c_p_h, nat.clone()))),
    );

    let p0 = ctx.push_local(Name::from_string("p0"), Expr::prop());
    let h0 = ctx.push_local(Name::from_string("h0"), p0.clone());
    let x0_ty = Expr::mk_app(c.clone(), [p0.clone(), h0.clone()]);
    let x0 = ctx.push_local(Name::from_string("x0"), x0_ty);
    let app = Expr::mk_app(f3.clone(), [p0.clone(), h0.clone(), x0]);

    let lemma = mk_specialized_congr(&mut ctx, &app).expect("specialized lemma");
    assert_eq!(
        lemma.arg_kinds(),
        &[
            CongrArgKind::Fixed,
            CongrArgKind::FixedNoParam,
            CongrArgKind::Eq,
        ]
    );
    // Only the varying argument contributes binders.
    assert_eq!(count_pis(lemma.type_()), 3);
    let concl = peel_pis(lemma.type_());
    assert_eq!(head_const(concl).as_deref(), Some("Eq"));
    // Both sides of the conclusion start with the baked arguments.
    let args = concl.get_app_args();
    let lhs_args = args[1].get_app_args();
    assert_eq!(lhs_args[0], &p0);
    assert_eq!(lhs_args[1], &h0);
    assert!(!lemma.proof().has_loose_bvars());
}

#[test]
fn rel_iff_congr_uses_symmetry_and_transitivity() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let r = ctx.declare(
        "R",
        Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), Expr::prop())),
    );

    let lemma = mk_rel_iff_congr(&mut ctx, &r).expect("rel iff lemma");
    assert_eq!(lemma.arg_kinds(), &[CongrArgKind::Eq, CongrArgKind::Eq]);
    // a1 a2 b1 b2, plus the two relation premises.
    assert_eq!(count_pis(lemma.type_()), 6);
    assert_eq!(head_const(peel_pis(lemma.type_())).as_deref(), Some("Iff"));
    assert!(contains_const(lemma.proof(), "Iff.intro"));
    assert!(contains_const(lemma.proof(), "Relation.symm"));
    assert!(contains_const(lemma.proof(), "Relation.trans"));
    assert!(!lemma.type_().has_loose_bvars());
    assert!(!lemma.proof().has_loose_bvars());
}

#[test]
fn rel_congr_requires_binary_homogeneous_prop_relation() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let bool_ = ctx.declare("Bool", Expr::type_());

    // Unary predicate: wrong arity.
    let p = ctx.declare("P", Expr::arrow(nat.clone(), Expr::prop()));
    assert!(mk_rel_iff_congr(&mut ctx, &p).is_none());

    // Heterogeneous relation: argument types differ.
    let q = ctx.declare(
        "Q",
        Expr::arrow(nat.clone(), Expr::arrow(bool_.clone(), Expr::prop())),
    );
    assert!(mk_rel_iff_congr(&mut ctx, &q).is_none());

    // Not propositional.
    let s = ctx.declare(
        "S",
        Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), nat.clone())),
    );
    assert!(mk_rel_iff_congr(&mut ctx, &s).is_none());

    // No symmetry/transitivity available.
    let r = ctx.declare(
        "R",
        Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), Expr::prop())),
    );
    ctx.has_rel_ops = false;
    assert!(mk_rel_iff_congr(&mut ctx, &r).is_none());
}

#[test]
fn rel_eq_congr_needs_propext() {
    let mut ctx = MockCtx::new();
    let nat = ctx.declare("Nat", Expr::type_());
    let r = ctx.declare(
        "R",
        Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), Expr::prop())),
    );

    let lemma = mk_rel_eq_congr(&mut ctx, &r).expect("rel eq lemma");
    assert_eq!(head_const(peel_pis(lemma.type_())).as_deref(), Some("Eq"));
    assert!(contains_const(lemma.proof(), "propext"));
    assert!(contains_const(lemma.proof(), "Iff.intro"));

    ctx.has_propext = false;
    assert!(mk_rel_eq_congr(&mut ctx, &r).is_none());
}
