use std::sync::Arc;

use fixcore::{
    order::names::{ADMISSIBLE, INST_DUAL, INST_OPTION, INST_PI, REL},
    prelude::*,
    tests_utils::{
        add, beq, bool_, cond, count, even_odd, ff, nat, poly_loop, pred, relay, stuck, succ, test_env, tt, zero,
    },
};

fn realizer() -> Realizer {
    Realizer::new(test_env(), Arc::new(FixpointRegistry::new()), DeriveOptions::default())
}

fn local(ctx: &mut MetaCtx, name: &str, ty: Expr) -> Expr {
    ctx.mk_local_decl(name, BinderInfo::Default, ty)
}

fn binder_names(ctx: &mut MetaCtx, ty: &Expr) -> (Vec<String>, Vec<Expr>, Expr) {
    let (locals, concl) = ctx.forall_telescope(ty).unwrap();
    let names = locals
        .iter()
        .map(|l| ctx.local_decl(l).unwrap().name.to_string())
        .collect();
    (names, locals, concl)
}

/// `Nat → Option elem` with its pointwise flat order, reversed when
/// `inductive`.
fn nat_fn_order(ctx: &mut MetaCtx, elem: &Expr, inductive: bool) -> (Expr, Expr) {
    let option = ctx.mk_option(elem).unwrap();
    let mut inst = ctx.mk_app_m(INST_OPTION, &[elem.clone()]).unwrap();
    if inductive {
        inst = ctx.mk_app_m(INST_DUAL, &[option.clone(), inst]).unwrap();
    }
    let n = local(ctx, "n", nat());
    let codomain = ctx.mk_lambda_fvars(&[n.clone()], &option).unwrap();
    let inst_fn = ctx.mk_lambda_fvars(&[n], &inst).unwrap();
    let inst = ctx.mk_app_m(INST_PI, &[nat(), codomain, inst_fn]).unwrap();
    (Expr::arrow(nat(), option), inst)
}

/// `cond (n == 0) (some hit) (other (pred n))`.
fn countdown(ctx: &mut MetaCtx, n: &Expr, hit: &Expr, other: &Expr) -> Expr {
    let hit = ctx.mk_some(hit).unwrap();
    let miss = Expr::app(other.clone(), pred(n));
    cond(ctx, &beq(n, &zero()), &hit, &miss).unwrap()
}

#[test]
fn mutual_induct_has_the_expected_statement() {
    let r = realizer();
    even_odd(r.env(), r.registry(), OrderKind::Inductive);
    let decl = r.require(&Name::new("even.mutual_induct")).unwrap();
    assert!(decl.level_params.is_empty());

    let mut ctx = MetaCtx::new(r.env().clone());
    let (t, inst) = nat_fn_order(&mut ctx, &bool_(), true);
    let option = ctx.mk_option(&bool_()).unwrap();
    let flat = ctx.mk_app_m(INST_OPTION, &[bool_()]).unwrap();
    let motive_ty = Expr::arrow(t.clone(), Expr::prop());
    let motives = [
        local(&mut ctx, "motive_1", motive_ty.clone()),
        local(&mut ctx, "motive_2", motive_ty),
    ];
    let mut adms = Vec::new();
    for m in &motives {
        let ty = ctx
            .mk_app_m(ADMISSIBLE, &[t.clone(), inst.clone(), m.clone()])
            .unwrap();
        adms.push(local(&mut ctx, "adm", ty));
    }

    let mut hs = Vec::new();
    for (i, (base, other)) in [(tt(), 1), (ff(), 0)].into_iter().enumerate() {
        let approxs = [local(&mut ctx, "even", t.clone()), local(&mut ctx, "odd", t.clone())];
        let n = local(&mut ctx, "n", nat());
        let body = countdown(&mut ctx, &n, &base, &approxs[other]);
        let current = Expr::app(approxs[i].clone(), n.clone());
        let rel = ctx
            .mk_app_m(REL, &[option.clone(), flat.clone(), body.clone(), current])
            .unwrap();
        let rel = ctx.mk_forall_fvars(&[n.clone()], &rel).unwrap();
        let next = ctx.mk_lambda_fvars(&[n], &body).unwrap();
        let hrel = local(&mut ctx, "hrel", rel);
        let ih_1 = local(&mut ctx, "ih_1", Expr::app(motives[0].clone(), approxs[0].clone()));
        let ih_2 = local(&mut ctx, "ih_2", Expr::app(motives[1].clone(), approxs[1].clone()));
        let concl = Expr::app(motives[i].clone(), next);
        let binders = [approxs[0].clone(), approxs[1].clone(), hrel, ih_1, ih_2];
        let ty = ctx.mk_forall_fvars(&binders, &concl).unwrap();
        hs.push(local(&mut ctx, "h", ty));
    }

    let even = Expr::app(motives[0].clone(), Expr::constant("even", []));
    let odd = Expr::app(motives[1].clone(), Expr::constant("odd", []));
    let concl = ctx.mk_and(&even, &odd);
    let binders: Vec<Expr> = motives.iter().chain(&adms).chain(&hs).cloned().collect();
    let expected = ctx.mk_forall_fvars(&binders, &concl).unwrap();
    let expected = ctx.instantiate_mvars(&expected);
    assert!(
        ctx.is_def_eq(&decl.ty, &expected).unwrap(),
        "derived:  {}\nexpected: {}",
        ctx.pp(&decl.ty),
        ctx.pp(&expected)
    );

    let (names, _, _) = binder_names(&mut ctx, &decl.ty);
    assert_eq!(names, ["motive_1", "motive_2", "adm_1", "adm_2", "h_1", "h_2"]);
}

#[test]
fn induct_projects_the_mutual_statement() {
    let r = realizer();
    even_odd(r.env(), r.registry(), OrderKind::Inductive);
    let decl = r.require(&Name::new("odd.induct")).unwrap();

    let mut ctx = MetaCtx::new(r.env().clone());
    let (names, locals, concl) = binder_names(&mut ctx, &decl.ty);
    assert_eq!(names, ["motive_1", "motive_2", "adm_1", "adm_2", "h_1", "h_2"]);
    let expected = Expr::app(locals[1].clone(), Expr::constant("odd", []));
    assert!(ctx.is_def_eq(&concl, &expected).unwrap(), "{}", ctx.pp(&concl));

    assert!(r.is_reserved(&Name::new("even.induct")));
    assert!(!r.is_reserved(&Name::new("odd.coinduct")));
    assert!(r.require(&Name::new("odd.fixpoint_induct")).is_err());
}

#[test]
fn coinduct_reads_the_order_downwards() {
    let r = realizer();
    count(r.env(), r.registry(), OrderKind::Coinductive);
    let decl = r.require(&Name::new("count.coinduct")).unwrap();

    let mut ctx = MetaCtx::new(r.env().clone());
    let (t, inst) = nat_fn_order(&mut ctx, &nat(), false);
    let option = ctx.mk_option(&nat()).unwrap();
    let flat = ctx.mk_app_m(INST_OPTION, &[nat()]).unwrap();
    let motive = local(&mut ctx, "motive", Expr::arrow(t.clone(), Expr::prop()));
    let adm_ty = ctx
        .mk_app_m(ADMISSIBLE, &[t.clone(), inst, motive.clone()])
        .unwrap();
    let adm = local(&mut ctx, "adm", adm_ty);

    let approx = local(&mut ctx, "count", t);
    let n = local(&mut ctx, "n", nat());
    let body = countdown(&mut ctx, &n, &zero(), &approx);
    let current = Expr::app(approx.clone(), n.clone());
    let rel = ctx
        .mk_app_m(REL, &[option, flat, current, body.clone()])
        .unwrap();
    let rel = ctx.mk_forall_fvars(&[n.clone()], &rel).unwrap();
    let next = ctx.mk_lambda_fvars(&[n], &body).unwrap();
    let hrel = local(&mut ctx, "hrel", rel);
    let ih = local(&mut ctx, "ih", Expr::app(motive.clone(), approx.clone()));
    let step = Expr::app(motive.clone(), next);
    let h_ty = ctx.mk_forall_fvars(&[approx, hrel, ih], &step).unwrap();
    let h = local(&mut ctx, "h", h_ty);

    let concl = Expr::app(motive.clone(), Expr::constant("count", []));
    let expected = ctx.mk_forall_fvars(&[motive, adm, h], &concl).unwrap();
    let expected = ctx.instantiate_mvars(&expected);
    assert!(
        ctx.is_def_eq(&decl.ty, &expected).unwrap(),
        "derived:  {}\nexpected: {}",
        ctx.pp(&decl.ty),
        ctx.pp(&expected)
    );
}

#[test]
fn partial_correctness_of_a_mutual_group() {
    let r = realizer();
    even_odd(r.env(), r.registry(), OrderKind::Inductive);
    let decl = r.require(&Name::new("even.partial_correctness")).unwrap();
    assert!(r.env().contains(&Name::new("even.mutual_induct")));

    let mut ctx = MetaCtx::new(r.env().clone());
    let option = ctx.mk_option(&bool_()).unwrap();
    let t = Expr::arrow(nat(), option);
    let n = local(&mut ctx, "n", nat());
    let motive_ty = ctx
        .mk_forall_fvars(&[n], &Expr::arrow(bool_(), Expr::prop()))
        .unwrap();
    let motives = [
        local(&mut ctx, "motive_1", motive_ty.clone()),
        local(&mut ctx, "motive_2", motive_ty),
    ];

    // `∀ n r, f n = some r → motive n r`
    let correct = |ctx: &mut MetaCtx, f: &Expr, motive: &Expr| {
        let n = local(ctx, "n", nat());
        let r = local(ctx, "r", bool_());
        let some_r = ctx.mk_some(&r).unwrap();
        let hit = ctx.mk_eq(&Expr::app(f.clone(), n.clone()), &some_r).unwrap();
        let concl = Expr::mk_app(motive.clone(), [n.clone(), r.clone()]);
        let body = ctx.mk_arrow(hit, concl).unwrap();
        ctx.mk_forall_fvars(&[n, r], &body).unwrap()
    };

    let mut hs = Vec::new();
    for (i, (base, other)) in [(tt(), 1), (ff(), 0)].into_iter().enumerate() {
        let approxs = [local(&mut ctx, "even", t.clone()), local(&mut ctx, "odd", t.clone())];
        let ih_1_ty = correct(&mut ctx, &approxs[0], &motives[0]);
        let ih_2_ty = correct(&mut ctx, &approxs[1], &motives[1]);
        let ih_1 = local(&mut ctx, "ih_1", ih_1_ty);
        let ih_2 = local(&mut ctx, "ih_2", ih_2_ty);
        let n = local(&mut ctx, "n", nat());
        let r = local(&mut ctx, "r", bool_());
        let body = countdown(&mut ctx, &n, &base, &approxs[other]);
        let some_r = ctx.mk_some(&r).unwrap();
        let heq = ctx.mk_eq(&body, &some_r).unwrap();
        let heq = local(&mut ctx, "heq", heq);
        let concl = Expr::mk_app(motives[i].clone(), [n.clone(), r.clone()]);
        let binders = [approxs[0].clone(), approxs[1].clone(), ih_1, ih_2, n, r, heq];
        let ty = ctx.mk_forall_fvars(&binders, &concl).unwrap();
        hs.push(local(&mut ctx, "h", ty));
    }

    let even = correct(&mut ctx, &Expr::constant("even", []), &motives[0]);
    let odd = correct(&mut ctx, &Expr::constant("odd", []), &motives[1]);
    let concl = ctx.mk_and(&even, &odd);
    let binders: Vec<Expr> = motives.iter().chain(&hs).cloned().collect();
    let expected = ctx.mk_forall_fvars(&binders, &concl).unwrap();
    let expected = ctx.instantiate_mvars(&expected);
    assert!(
        ctx.is_def_eq(&decl.ty, &expected).unwrap(),
        "derived:  {}\nexpected: {}",
        ctx.pp(&decl.ty),
        ctx.pp(&expected)
    );

    let (names, _, _) = binder_names(&mut ctx, &decl.ty);
    assert_eq!(names, ["motive_1", "motive_2", "h_1", "h_2"]);

    let again = r.require(&Name::new("even.partial_correctness")).unwrap();
    assert!(Arc::ptr_eq(&decl, &again));
    let odd = r.require(&Name::new("odd.partial_correctness")).unwrap();
    assert!(ctx.is_def_eq(&odd.ty, &decl.ty).unwrap());
}

#[test]
fn partial_correctness_specializes_to_the_defining_equation() {
    let r = realizer();
    count(r.env(), r.registry(), OrderKind::Inductive);
    let decl = r.require(&Name::new("count.partial_correctness")).unwrap();
    assert!(r.env().contains(&Name::new("count.induct")));

    let mut ctx = MetaCtx::new(r.env().clone());
    let count = Expr::constant("count", []);
    let n = local(&mut ctx, "n", nat());
    let res = local(&mut ctx, "r", nat());
    let some_r = ctx.mk_some(&res).unwrap();
    let hit = ctx.mk_eq(&Expr::app(count.clone(), n.clone()), &some_r).unwrap();
    let motive = ctx.mk_lambda_fvars(&[n, res], &hit).unwrap();

    let applied = Expr::app(Expr::constant(decl.name.clone(), []), motive);
    let ty = ctx.infer_type(&applied).unwrap().beta_reduce();
    let (locals, concl) = ctx.forall_telescope(&ty).unwrap();
    assert_eq!(locals.len(), 1);

    let n = local(&mut ctx, "n", nat());
    let res = local(&mut ctx, "r", nat());
    let some_r = ctx.mk_some(&res).unwrap();
    let hit = ctx.mk_eq(&Expr::app(count.clone(), n.clone()), &some_r).unwrap();
    let tautology = ctx.mk_arrow(hit.clone(), hit).unwrap();
    let expected = ctx.mk_forall_fvars(&[n, res], &tautology).unwrap();
    assert!(ctx.is_def_eq(&concl, &expected).unwrap(), "{}", ctx.pp(&concl));

    // h : ∀ count ih n r (heq : <body> = some r), count n = some r
    let h_ty = ctx.local_decl(&locals[0]).unwrap().ty.clone();
    let (names, step, _) = binder_names(&mut ctx, &h_ty);
    assert_eq!(names, ["count", "ih", "n", "r", "heq"]);
    let heq_ty = ctx.local_decl(&step[4]).unwrap().ty.clone();
    let approx = step[0].fvar_id().unwrap();
    let body = heq_ty.get_app_args()[1].replace(&mut |e, _| {
        (e.fvar_id() == Some(approx)).then(|| count.clone())
    });

    let eqn = Expr::app(Expr::constant("count.eq_1", []), step[2].clone());
    let eqn_ty = ctx.infer_type(&eqn).unwrap();
    let unfolded = eqn_ty.get_app_args()[2].clone();
    assert!(ctx.is_def_eq(&body, &unfolded).unwrap(), "{}", ctx.pp(&body));
}

#[test]
fn fixed_parameters_and_universes_are_kept() {
    let r = realizer();
    poly_loop(r.env(), r.registry(), OrderKind::Inductive);
    let decl = r.require(&Name::new("loop.induct")).unwrap();
    assert_eq!(decl.level_params, vec![Name::new("u")]);

    let mut ctx = MetaCtx::new(r.env().clone());
    let (names, locals, concl) = binder_names(&mut ctx, &decl.ty);
    assert_eq!(names, ["α", "a", "motive", "adm", "h"]);
    assert!(matches!(
        ctx.local_decl(&locals[0]).unwrap().info,
        BinderInfo::Implicit
    ));

    let n = local(&mut ctx, "n", nat());
    let call = Expr::mk_app(
        Expr::constant("loop", [Level::param("u")]),
        [locals[0].clone(), n.clone(), locals[1].clone()],
    );
    let member = ctx.mk_lambda_fvars(&[n], &call).unwrap();
    let expected = Expr::app(locals[2].clone(), member);
    assert!(ctx.is_def_eq(&concl, &expected).unwrap(), "{}", ctx.pp(&concl));

    let pc = r.require(&Name::new("loop.partial_correctness")).unwrap();
    assert_eq!(pc.level_params, vec![Name::new("u")]);
    let (names, _, _) = binder_names(&mut ctx, &pc.ty);
    assert_eq!(names, ["α", "a", "motive", "h"]);
}

#[test]
fn mixed_groups_keep_each_member_direction() {
    let r = realizer();
    relay(r.env(), r.registry(), &[OrderKind::Inductive, OrderKind::Coinductive]);
    let decl = r.require(&Name::new("a.mutual_induct")).unwrap();

    let mut ctx = MetaCtx::new(r.env().clone());
    let (_, locals, _) = binder_names(&mut ctx, &decl.ty);
    for h in &locals[4..] {
        let h_ty = ctx.local_decl(h).unwrap().ty.clone();
        let (names, _, _) = binder_names(&mut ctx, &h_ty);
        assert_eq!(names, ["a", "b", "hrel", "ih_1", "ih_2"]);
    }

    let coinduct = r.require(&Name::new("b.coinduct")).unwrap();
    let (_, locals, concl) = binder_names(&mut ctx, &coinduct.ty);
    let expected = Expr::app(locals[1].clone(), Expr::constant("b", []));
    assert!(ctx.is_def_eq(&concl, &expected).unwrap());

    assert!(r.require(&Name::new("a.partial_correctness")).is_ok());
}

#[test]
fn lattice_groups_use_fixpoint_induction() {
    let r = realizer();
    relay(r.env(), r.registry(), &[OrderKind::LatticeTheoretic]);
    assert!(!r.is_reserved(&Name::new("a.induct")));

    let decl = r.require(&Name::new("a.fixpoint_induct")).unwrap();
    let mut ctx = MetaCtx::new(r.env().clone());
    let (names, locals, _) = binder_names(&mut ctx, &decl.ty);
    assert_eq!(names, ["motive", "adm", "h"]);
    let h_ty = ctx.local_decl(&locals[2]).unwrap().ty.clone();
    let (names, _, _) = binder_names(&mut ctx, &h_ty);
    assert_eq!(names, ["a", "ih"]);

    let pc = r.require(&Name::new("a.partial_correctness")).unwrap();
    let (names, _, _) = binder_names(&mut ctx, &pc.ty);
    assert_eq!(names, ["motive", "h"]);
}

#[test]
fn functions_of_two_parameters() {
    let r = realizer();
    add(r.env(), r.registry(), OrderKind::Inductive);
    let induct = r.require(&Name::new("add.induct")).unwrap();

    let mut ctx = MetaCtx::new(r.env().clone());
    let (names, locals, concl) = binder_names(&mut ctx, &induct.ty);
    assert_eq!(names, ["motive", "adm", "h"]);
    let expected = Expr::app(locals[0].clone(), Expr::constant("add", []));
    assert!(ctx.is_def_eq(&concl, &expected).unwrap(), "{}", ctx.pp(&concl));
    let h_ty = ctx.local_decl(&locals[2]).unwrap().ty.clone();
    let (names, step, _) = binder_names(&mut ctx, &h_ty);
    assert_eq!(names, ["add", "hrel", "ih"]);
    let hrel_ty = ctx.local_decl(&step[1]).unwrap().ty.clone();
    let (names, _, _) = binder_names(&mut ctx, &hrel_ty);
    assert_eq!(names, ["m", "n"]);

    let decl = r.require(&Name::new("add.partial_correctness")).unwrap();
    let option = ctx.mk_option(&nat()).unwrap();
    let t = Expr::arrow(nat(), Expr::arrow(nat(), option));
    let (m, n) = (local(&mut ctx, "m", nat()), local(&mut ctx, "n", nat()));
    let motive_ty = ctx
        .mk_forall_fvars(&[m, n], &Expr::arrow(nat(), Expr::prop()))
        .unwrap();
    let motive = local(&mut ctx, "motive", motive_ty);

    // `∀ m n r, f m n = some r → motive m n r`
    let correct = |ctx: &mut MetaCtx, f: &Expr| {
        let m = local(ctx, "m", nat());
        let n = local(ctx, "n", nat());
        let res = local(ctx, "r", nat());
        let some_r = ctx.mk_some(&res).unwrap();
        let call = Expr::mk_app(f.clone(), [m.clone(), n.clone()]);
        let hit = ctx.mk_eq(&call, &some_r).unwrap();
        let concl = Expr::mk_app(motive.clone(), [m.clone(), n.clone(), res.clone()]);
        let body = ctx.mk_arrow(hit, concl).unwrap();
        ctx.mk_forall_fvars(&[m, n, res], &body).unwrap()
    };

    let approx = local(&mut ctx, "add", t);
    let ih_ty = correct(&mut ctx, &approx);
    let ih = local(&mut ctx, "ih", ih_ty);
    let m = local(&mut ctx, "m", nat());
    let n = local(&mut ctx, "n", nat());
    let res = local(&mut ctx, "r", nat());
    let hit = ctx.mk_some(&m).unwrap();
    let miss = Expr::mk_app(approx.clone(), [succ(&m), pred(&n)]);
    let body = cond(&mut ctx, &beq(&n, &zero()), &hit, &miss).unwrap();
    let some_r = ctx.mk_some(&res).unwrap();
    let heq = ctx.mk_eq(&body, &some_r).unwrap();
    let heq = local(&mut ctx, "heq", heq);
    let concl = Expr::mk_app(motive.clone(), [m.clone(), n.clone(), res.clone()]);
    let h_ty = ctx
        .mk_forall_fvars(&[approx, ih, m, n, res, heq], &concl)
        .unwrap();
    let h = local(&mut ctx, "h", h_ty);

    let concl = correct(&mut ctx, &Expr::constant("add", []));
    let expected = ctx.mk_forall_fvars(&[motive.clone(), h], &concl).unwrap();
    let expected = ctx.instantiate_mvars(&expected);
    assert!(
        ctx.is_def_eq(&decl.ty, &expected).unwrap(),
        "derived:  {}\nexpected: {}",
        ctx.pp(&decl.ty),
        ctx.pp(&expected)
    );

    let (_, locals, _) = binder_names(&mut ctx, &decl.ty);
    let h_ty = ctx.local_decl(&locals[1]).unwrap().ty.clone();
    let (names, _, _) = binder_names(&mut ctx, &h_ty);
    assert_eq!(names, ["add", "ih", "m", "n", "r", "heq"]);
}

#[test]
fn functions_without_parameters() {
    let r = realizer();
    stuck(r.env(), r.registry(), OrderKind::Inductive);
    let induct = r.require(&Name::new("stuck.induct")).unwrap();

    let mut ctx = MetaCtx::new(r.env().clone());
    let (_, locals, _) = binder_names(&mut ctx, &induct.ty);
    let h_ty = ctx.local_decl(&locals[2]).unwrap().ty.clone();
    let (names, _, _) = binder_names(&mut ctx, &h_ty);
    assert_eq!(names, ["stuck", "hrel", "ih"]);

    let decl = r.require(&Name::new("stuck.partial_correctness")).unwrap();
    let option = ctx.mk_option(&nat()).unwrap();
    let motive = local(&mut ctx, "motive", Expr::arrow(nat(), Expr::prop()));

    // `∀ r, f = some r → motive r`
    let correct = |ctx: &mut MetaCtx, f: &Expr| {
        let res = local(ctx, "r", nat());
        let some_r = ctx.mk_some(&res).unwrap();
        let hit = ctx.mk_eq(f, &some_r).unwrap();
        let concl = Expr::app(motive.clone(), res.clone());
        let body = ctx.mk_arrow(hit, concl).unwrap();
        ctx.mk_forall_fvars(&[res], &body).unwrap()
    };

    let approx = local(&mut ctx, "stuck", option);
    let ih_ty = correct(&mut ctx, &approx);
    let ih = local(&mut ctx, "ih", ih_ty);
    let res = local(&mut ctx, "r", nat());
    let some_r = ctx.mk_some(&res).unwrap();
    let heq = ctx.mk_eq(&approx, &some_r).unwrap();
    let heq = local(&mut ctx, "heq", heq);
    let concl = Expr::app(motive.clone(), res.clone());
    let h_ty = ctx.mk_forall_fvars(&[approx, ih, res, heq], &concl).unwrap();
    let h = local(&mut ctx, "h", h_ty);

    let concl = correct(&mut ctx, &Expr::constant("stuck", []));
    let expected = ctx.mk_forall_fvars(&[motive.clone(), h], &concl).unwrap();
    let expected = ctx.instantiate_mvars(&expected);
    assert!(
        ctx.is_def_eq(&decl.ty, &expected).unwrap(),
        "derived:  {}\nexpected: {}",
        ctx.pp(&decl.ty),
        ctx.pp(&expected)
    );
}

#[test]
fn partial_correctness_of_a_group_with_a_lattice_member() {
    let r = realizer();
    relay(r.env(), r.registry(), &[OrderKind::Inductive, OrderKind::LatticeTheoretic]);
    assert!(!r.is_reserved(&Name::new("a.induct")));
    assert!(matches!(
        r.require(&Name::new("a.induct")),
        Err(DeriveError::LatticeTheoretic(n)) if n == Name::new("b")
    ));

    let decl = r.require(&Name::new("a.partial_correctness")).unwrap();
    assert!(r.env().contains(&Name::new("b.fixpoint_induct")));

    let mut ctx = MetaCtx::new(r.env().clone());
    let (names, locals, _) = binder_names(&mut ctx, &decl.ty);
    assert_eq!(names, ["motive_1", "motive_2", "h_1", "h_2"]);
    for h in &locals[2..] {
        let h_ty = ctx.local_decl(h).unwrap().ty.clone();
        let (names, _, _) = binder_names(&mut ctx, &h_ty);
        assert_eq!(names, ["a", "b", "ih_1", "ih_2", "n", "r", "heq"]);
    }

    let other = r.require(&Name::new("b.partial_correctness")).unwrap();
    assert!(ctx.is_def_eq(&other.ty, &decl.ty).unwrap());
}

