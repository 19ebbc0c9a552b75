//! Admissibility proofs assembled from the library combinators.

use fixformal::{
    expr::{BinderInfo, Expr},
    meta::MetaCtx,
};

use crate::{
    error::{DeriveError, DeriveResult},
    order::names::{
        ADM_AND, ADM_EQ_SOME, ADM_EQ_SOME_DUAL, ADM_PI, ADM_PI_APPLY, ADM_PPROD_FST, ADM_PPROD_SND,
    },
    shape::{CcpoShape, ShapeNode},
};

/// `admissible (fun x => P x ∧ Q x)` from proofs for `P` and `Q`.
pub fn and(ctx: &mut MetaCtx, hp: &Expr, hq: &Expr) -> DeriveResult<Expr> {
    Ok(ctx.mk_app_m(ADM_AND, &[hp.clone(), hq.clone()])?)
}

/// Lift `proof : admissible Tᵢ instᵢ P` to the packed order of a group of `n`,
/// giving admissibility of `fun x => P xᵢ` where `xᵢ` is the `i`-th member of
/// `x`.
pub fn proj(ctx: &mut MetaCtx, packed: &CcpoShape, n: usize, i: usize, proof: &Expr) -> DeriveResult<Expr> {
    if i >= n {
        return Err(DeriveError::invariant(
            format!("projection index {i} out of range for a group of {n}"),
            ctx.pp(proof),
        ));
    }
    if n == 1 {
        return Ok(proof.clone());
    }

    let mut path = Vec::with_capacity(n - 1);
    let mut cur = packed;
    for _ in 0..n - 1 {
        let ShapeNode::PProd(a, r) = &cur.node else {
            return Err(DeriveError::invariant(
                format!("expected {n} packed members"),
                ctx.pp(&packed.ty),
            ));
        };
        path.push((&**a, &**r));
        cur = &**r;
    }

    let lift = |ctx: &mut MetaCtx, lemma: &str, (a, r): (&CcpoShape, &CcpoShape), h: Expr| {
        ctx.mk_app_opt_m(
            lemma,
            &[
                Some(a.ty.clone()),
                Some(r.ty.clone()),
                Some(a.inst.clone()),
                Some(r.inst.clone()),
                None,
                Some(h),
            ],
        )
    };
    let mut proof = proof.clone();
    if i + 1 < n {
        proof = lift(ctx, ADM_PPROD_FST, path[i], proof)?;
    }
    for k in (0..i).rev() {
        proof = lift(ctx, ADM_PPROD_SND, path[k], proof)?;
    }
    Ok(proof)
}

/// Admissibility of `fun f => ∀ ys r, f ys = some r → motive ys r` over
/// `shape`, which must be `Pi* [Dual] Option`.
///
/// `ys` holds the parameters opened so far and is restored on return.
pub fn option_adm(ctx: &mut MetaCtx, shape: &CcpoShape, motive: &Expr, ys: &mut Vec<Expr>) -> DeriveResult<Expr> {
    match &shape.node {
        ShapeNode::Pi {
            domain,
            codomain_fn,
            inst_fn,
            local,
            body,
        } => {
            ys.push(local.clone());
            let inner = option_adm(ctx, body, motive, ys);
            ys.pop();
            let inner = inner?;

            let inner_ty = ctx.infer_type(&inner)?;
            let inner_ty = ctx.instantiate_mvars(&inner_ty);
            let Some(pred) = inner_ty.get_app_args().get(2).cloned() else {
                return Err(DeriveError::invariant(
                    "expected an admissibility statement",
                    ctx.pp(&inner_ty),
                ));
            };
            let locals = std::slice::from_ref(local);
            let pred = ctx.mk_lambda_fvars(locals, &pred)?;
            let h = ctx.mk_lambda_fvars(locals, &inner)?;
            Ok(ctx.mk_app_m(
                ADM_PI_APPLY,
                &[domain.clone(), codomain_fn.clone(), inst_fn.clone(), pred, h],
            )?)
        }
        ShapeNode::Option { elem } => eq_some(ctx, shape, elem, ADM_EQ_SOME, motive, ys),
        ShapeNode::Dual(inner) => match &inner.node {
            ShapeNode::Option { elem } => eq_some(ctx, shape, elem, ADM_EQ_SOME_DUAL, motive, ys),
            _ => Err(DeriveError::invariant(
                "expected a dual flat order",
                ctx.pp(&shape.inst),
            )),
        },
        ShapeNode::PProd(..) => Err(DeriveError::invariant(
            "expected an Option-valued member",
            ctx.pp(&shape.ty),
        )),
    }
}

/// `admissible_pi` over `r : elem` of `admissible_eq_some(_dual) (motive ys r) r`.
fn eq_some(
    ctx: &mut MetaCtx,
    leaf: &CcpoShape,
    elem: &Expr,
    lemma: &str,
    motive: &Expr,
    ys: &[Expr],
) -> DeriveResult<Expr> {
    let r = ctx.mk_local_decl("r", BinderInfo::Default, elem.clone());
    let g = ctx.mk_local_decl("x", BinderInfo::Default, leaf.ty.clone());
    let concl = Expr::mk_app(motive.clone(), ys.iter().cloned().chain([r.clone()]));

    let some_r = ctx.mk_some(&r)?;
    let hit = ctx.mk_eq(&g, &some_r)?;
    let hit = ctx.mk_arrow(hit, concl.clone())?;
    let pred = ctx.mk_lambda_fvars(&[r.clone(), g], &hit)?;

    let h = ctx.mk_app_m(lemma, &[concl, r.clone()])?;
    let h = ctx.mk_lambda_fvars(std::slice::from_ref(&r), &h)?;
    Ok(ctx.mk_app_m(
        ADM_PI,
        &[leaf.ty.clone(), leaf.inst.clone(), elem.clone(), pred, h],
    )?)
}

#[cfg(test)]
mod tests {
    use fixformal::expr::BinderInfo;

    use super::*;
    use crate::{
        group::FixpointGroup,
        order::names::ADMISSIBLE,
        pprod::mk_proj,
        registry::{FixpointRegistry, OrderKind},
        tests_utils::{count, relay, test_env},
    };

    #[test]
    fn member_admissibility_lifts_to_the_packed_order() {
        let env = test_env();
        let registry = FixpointRegistry::new();
        let kinds = [OrderKind::Coinductive, OrderKind::Inductive, OrderKind::Coinductive];
        let info = relay(&env, &registry, &kinds);
        let mut ctx = MetaCtx::new(env);
        let group = FixpointGroup::open(&mut ctx, info).unwrap();

        for i in 0..3 {
            let ty = group.types[i].clone();
            let motive = ctx.mk_local_decl("P", BinderInfo::Default, Expr::arrow(ty.clone(), Expr::prop()));
            let adm_ty = ctx
                .mk_app_m(ADMISSIBLE, &[ty, group.members[i].inst.clone(), motive.clone()])
                .unwrap();
            let adm = ctx.mk_local_decl("adm", BinderInfo::Default, adm_ty);
            let lifted = proj(&mut ctx, &group.packed, 3, i, &adm).unwrap();

            let x = ctx.mk_local_decl("x", BinderInfo::Default, group.alpha().clone());
            let pred = Expr::app(motive, mk_proj(&mut ctx, 3, i, &x).unwrap());
            let pred = ctx.mk_lambda_fvars(&[x], &pred).unwrap();
            let expected = ctx
                .mk_app_m(ADMISSIBLE, &[group.alpha().clone(), group.inst().clone(), pred])
                .unwrap();
            let actual = ctx.infer_type(&lifted).unwrap();
            assert!(ctx.is_def_eq(&actual, &expected).unwrap(), "member {i}");
        }

        let adm = ctx.mk_local_decl("adm", BinderInfo::Default, Expr::prop());
        let err = proj(&mut ctx, &group.packed, 3, 3, &adm).unwrap_err();
        assert!(matches!(err, DeriveError::InvariantViolation { .. }));
    }

    #[test]
    fn single_member_needs_no_lifting() {
        let env = test_env();
        let registry = FixpointRegistry::new();
        let info = count(&env, &registry, OrderKind::Inductive);
        let mut ctx = MetaCtx::new(env);
        let group = FixpointGroup::open(&mut ctx, info).unwrap();
        let adm = ctx.mk_local_decl("adm", BinderInfo::Default, Expr::prop());
        assert_eq!(proj(&mut ctx, &group.packed, 1, 0, &adm).unwrap(), adm);
    }

    #[test]
    fn option_predicates_are_admissible_in_both_directions() {
        for kind in [OrderKind::Inductive, OrderKind::Coinductive] {
            let env = test_env();
            let registry = FixpointRegistry::new();
            let info = count(&env, &registry, kind);
            let mut ctx = MetaCtx::new(env);
            let group = FixpointGroup::open(&mut ctx, info).unwrap();
            let shape = &group.members[0];
            let nat = crate::tests_utils::nat();

            let motive_ty = Expr::arrow(nat.clone(), Expr::arrow(nat.clone(), Expr::prop()));
            let motive = ctx.mk_local_decl("motive", BinderInfo::Default, motive_ty);
            let mut ys = Vec::new();
            let proof = option_adm(&mut ctx, shape, &motive, &mut ys).unwrap();
            assert!(ys.is_empty());

            let f = ctx.mk_local_decl("f", BinderInfo::Default, group.types[0].clone());
            let n = ctx.mk_local_decl("n", BinderInfo::Default, nat.clone());
            let r = ctx.mk_local_decl("r", BinderInfo::Default, nat);
            let some_r = ctx.mk_some(&r).unwrap();
            let hit = ctx.mk_eq(&Expr::app(f.clone(), n.clone()), &some_r).unwrap();
            let concl = Expr::mk_app(motive.clone(), [n.clone(), r.clone()]);
            let body = ctx.mk_arrow(hit, concl).unwrap();
            let body = ctx.mk_forall_fvars(&[n, r], &body).unwrap();
            let pred = ctx.mk_lambda_fvars(&[f], &body).unwrap();
            let expected = ctx
                .mk_app_m(ADMISSIBLE, &[group.types[0].clone(), shape.inst.clone(), pred])
                .unwrap();

            let actual = ctx.infer_type(&proof).unwrap();
            assert!(ctx.is_def_eq(&actual, &expected).unwrap(), "{kind}");
            ctx.check(&proof).unwrap();
        }
    }
}
