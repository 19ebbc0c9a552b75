//! `partial_correctness` for groups of `Option`-valued functions.
//!
//! The ordinary principle is instantiated with the motive
//! `fun f => ∀ ys r, f ys = some r → motive ys r`, whose admissibility is
//! proved once and for all by [`admissible::option_adm`]. What remains of each
//! step hypothesis is that the body returns values satisfying the motive
//! whenever the recursive calls it makes do.

use std::sync::Arc;

use fixformal::{
    env::ConstantInfo,
    expr::{BinderInfo, Expr},
    level::Level,
    meta::MetaCtx,
    name::Name,
};

use crate::{
    admissible,
    error::{DeriveError, DeriveResult},
    fixtrace,
    group::FixpointGroup,
    induction::{binder_name, emit, filter_level_params},
    magic::{
        HIT_NAME, MOTIVE_NAME, POSTFIX_FIXPOINT_INDUCT, POSTFIX_MUTUAL_INDUCT, POSTFIX_PARTIAL_CORRECTNESS,
        STEP_NAME, TRACE_PARTIAL_CORRECTNESS,
    },
    pprod::mk_pack_type,
    realize::DeriveCtx,
    registry::FixpointInfo,
    shape::CcpoShape,
};

/// Name of the ordinary principle the statement is specialized from.
pub fn base_principle(info: &FixpointInfo, member: usize) -> Name {
    if let Some(i) = info.lattice_member() {
        info.decl_names[i].str(POSTFIX_FIXPOINT_INDUCT)
    } else if info.is_mutual() {
        info.decl_names[member].str(POSTFIX_MUTUAL_INDUCT)
    } else {
        info.decl_names[member].str(info.kinds[member].postfix())
    }
}

/// Whether every member of the group is `Option`-valued, the shape
/// `partial_correctness` is stated for.
pub fn is_applicable(group: &FixpointGroup) -> bool {
    group.members.iter().all(|m| m.option_elem().is_some())
}

/// Derive `<member>.partial_correctness`. `None` when some member of the
/// group is not `Option`-valued.
pub fn derive(
    cx: &mut DeriveCtx<'_>,
    info: Arc<FixpointInfo>,
    member: usize,
) -> DeriveResult<Option<Arc<ConstantInfo>>> {
    let name = info.decl_names[member].str(POSTFIX_PARTIAL_CORRECTNESS);
    specialize(cx, info, member, &name).map_err(|e| e.in_principle(&name))
}

fn specialize(
    cx: &mut DeriveCtx<'_>,
    info: Arc<FixpointInfo>,
    member: usize,
    name: &Name,
) -> DeriveResult<Option<Arc<ConstantInfo>>> {
    let group = FixpointGroup::open(&mut cx.meta, info)?;
    if !is_applicable(&group) {
        log::debug!("skipping '{name}': not every member returns an Option");
        return Ok(None);
    }

    let principle = base_principle(&group.info, member);
    let Some(base) = cx.realizer.realize(&principle)? else {
        return Err(DeriveError::invariant(
            "ordinary principle could not be realized",
            principle.to_string(),
        ));
    };
    build(cx, &group, &base, name).map(Some)
}

/// The motive of member `i`, its lifting to the member type and the
/// admissibility proof of the latter.
struct Motive {
    local: Expr,
    lifted: Expr,
    adm: Expr,
}

fn motive(ctx: &mut MetaCtx, group: &FixpointGroup, i: usize) -> DeriveResult<Motive> {
    let n = group.len();
    let shape: &CcpoShape = &group.members[i];
    let ys = shape.pi_locals();
    let Some(elem) = shape.option_elem() else {
        return Err(DeriveError::invariant(
            "expected an Option-valued member",
            ctx.pp(&shape.ty),
        ));
    };
    let pred = Expr::arrow(elem.clone(), Expr::prop());
    let motive_ty = ctx.mk_forall_fvars(&ys, &pred)?;
    let local = ctx.mk_local_decl(binder_name(MOTIVE_NAME, n, i), BinderInfo::Default, motive_ty);

    let f = ctx.mk_local_decl(group.name(i).last(), BinderInfo::Default, group.types[i].clone());
    let r = ctx.mk_local_decl("r", BinderInfo::Default, elem.clone());
    let call = Expr::mk_app(f.clone(), ys.iter().cloned());
    let some_r = ctx.mk_some(&r)?;
    let hit = ctx.mk_eq(&call, &some_r)?;
    let heq = ctx.mk_local_decl(HIT_NAME, BinderInfo::Default, hit);
    let concl = Expr::mk_app(local.clone(), ys.iter().cloned().chain([r.clone()]));
    let binders: Vec<Expr> = ys.iter().cloned().chain([r, heq]).collect();
    let body = ctx.mk_forall_fvars(&binders, &concl)?;
    let lifted = ctx.mk_lambda_fvars(&[f], &body)?;

    let adm = admissible::option_adm(ctx, shape, &local, &mut Vec::new())?;
    Ok(Motive { local, lifted, adm })
}

fn build(
    cx: &mut DeriveCtx<'_>,
    group: &FixpointGroup,
    base: &ConstantInfo,
    name: &Name,
) -> DeriveResult<Arc<ConstantInfo>> {
    let n = group.len();
    let ctx = &mut cx.meta;
    let motives = (0..n)
        .map(|i| motive(ctx, group, i))
        .collect::<DeriveResult<Vec<_>>>()?;

    let levels = base.level_params.iter().cloned().map(Level::param);
    let args = group
        .xs
        .iter()
        .cloned()
        .chain(motives.iter().map(|m| m.lifted.clone()))
        .chain(motives.iter().map(|m| m.adm.clone()));
    let mut proof = Expr::mk_app(Expr::constant(base.name.clone(), levels), args);
    let guarded = base.name.last() != POSTFIX_FIXPOINT_INDUCT;

    let mut ty = ctx.infer_type(&proof)?;
    let mut hs = Vec::with_capacity(n);
    for i in 0..n {
        let Expr::Pi { ty: dom, body, .. } = ctx.whnf(&ty)? else {
            return Err(DeriveError::invariant(
                "expected a step hypothesis",
                ctx.pp(&ty),
            ));
        };
        let step = dom.beta_reduce();
        let (locals, concl) = ctx.forall_telescope(&step)?;
        let kept = if guarded {
            drop_guard(ctx, &locals, &concl, &step)?
        } else {
            locals.clone()
        };

        let h_ty = ctx.mk_forall_fvars(&kept, &concl)?;
        let h = ctx.mk_local_decl(binder_name(STEP_NAME, n, i), BinderInfo::Default, h_ty);
        let h_applied = Expr::mk_app(h.clone(), kept);
        let step_proof = ctx.mk_lambda_fvars(&locals, &h_applied)?;
        ty = body.instantiate1(&step_proof);
        proof = Expr::app(proof, step_proof);
        hs.push(h);
    }

    let expected: Vec<Expr> = motives
        .iter()
        .zip(&group.consts)
        .map(|(m, c)| Expr::app(m.lifted.clone(), c.clone()).beta_reduce())
        .collect();
    let expected = mk_pack_type(ctx, &expected)?;
    let proof = ctx.mk_expected_type_hint(&proof, &expected)?;

    let binders: Vec<Expr> = group
        .xs
        .iter()
        .cloned()
        .chain(motives.iter().map(|m| m.local.clone()))
        .chain(hs)
        .collect();
    let value = ctx.mk_lambda_fvars(&binders, &proof)?;
    let value = ctx.instantiate_mvars(&value).beta_reduce();
    let ty = ctx.infer_type(&value)?.beta_reduce();
    let params = filter_level_params(&group.level_params, &[&ty, &value]);

    fixtrace!(
        cx.trace,
        TRACE_PARTIAL_CORRECTNESS,
        "{name} : {}",
        cx.meta.pp_width(&ty, cx.options.pretty_width)
    );
    let decl = emit(cx, ConstantInfo::theorem(name.clone(), params, ty, value))?;
    log::debug!("derived '{name}'");
    Ok(decl)
}

/// The binders of a guarded step without its approximation guard, the first
/// propositional one.
fn drop_guard(ctx: &mut MetaCtx, locals: &[Expr], concl: &Expr, step: &Expr) -> DeriveResult<Vec<Expr>> {
    let mut guard = None;
    for (k, l) in locals.iter().enumerate() {
        let l_ty = ctx.local_decl(l)?.ty.clone();
        if ctx.is_prop(&l_ty)? {
            guard = Some(k);
            break;
        }
    }
    let Some(k) = guard else {
        return Err(DeriveError::invariant(
            "step hypothesis has no approximation guard",
            ctx.pp(step),
        ));
    };
    let mut kept = locals.to_vec();
    let guard = kept.remove(k);
    let Some(id) = guard.fvar_id() else {
        return Err(DeriveError::invariant("guard is not a local", ctx.pp(&guard)));
    };
    let mut used = concl.has_fvar(id);
    for l in &kept {
        used |= ctx.local_decl(l)?.ty.has_fvar(id);
    }
    if used {
        return Err(DeriveError::invariant(
            "approximation guard is used by the step",
            ctx.pp(step),
        ));
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DeriveOptions,
        realize::Realizer,
        registry::{FixedParamPerm, FixpointRegistry, OrderKind},
        tests_utils::test_env,
    };

    fn info(kinds: &[OrderKind]) -> FixpointInfo {
        let names = ["a", "b", "c"];
        FixpointInfo {
            decl_names: names[..kinds.len()].iter().map(|n| Name::new(n)).collect(),
            fixed_param_perms: kinds.iter().map(|_| FixedParamPerm::new(vec![None])).collect(),
            kinds: kinds.to_vec(),
            eqn_lemmas: names[..kinds.len()]
                .iter()
                .map(|n| Name::new(n).str("eq_1"))
                .collect(),
        }
    }

    #[test]
    fn base_principle_depends_on_the_group() {
        let single = info(&[OrderKind::Coinductive]);
        assert_eq!(base_principle(&single, 0), Name::new("a.coinduct"));

        let mutual = info(&[OrderKind::Inductive, OrderKind::Coinductive]);
        assert_eq!(base_principle(&mutual, 1), Name::new("b.mutual_induct"));

        let lattice = info(&[OrderKind::Inductive, OrderKind::Inductive, OrderKind::LatticeTheoretic]);
        assert_eq!(base_principle(&lattice, 0), Name::new("c.fixpoint_induct"));
    }

    #[test]
    fn elaboration_failures_name_the_principle() {
        let realizer = Realizer::new(test_env(), Arc::new(FixpointRegistry::new()), DeriveOptions::default());
        let mut cx = DeriveCtx::new(&realizer);
        // `a` is registered nowhere and declared nowhere.
        let err = derive(&mut cx, Arc::new(info(&[OrderKind::Coinductive])), 0).unwrap_err();
        match err {
            DeriveError::Derivation { principle, .. } => {
                assert_eq!(principle, Name::new("a.partial_correctness"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
