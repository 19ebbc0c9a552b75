//! Assembly of `induct`, `coinduct`, `mutual_induct` and `fixpoint_induct`.
//!
//! Every principle is obtained by instantiating `fix_induct` (lattice-theoretic
//! groups) or `fix_induct_approx` (all others) at the packed order of the
//! group and splitting the packed hypotheses back into one motive,
//! admissibility proof and step per member:
//!
//! ```text
//! theorem f.induct xs (motive : T → Prop) (adm : admissible T inst motive)
//!     (h : ∀ f', hrel → motive f' → motive (F f')) : motive (f xs)
//! ```
//!
//! where `hrel` is the unfolded approximation relation between `f'` and
//! `F f'`.

use std::sync::Arc;

use fixformal::{
    env::ConstantInfo,
    expr::{BinderInfo, Expr},
    meta::MetaCtx,
    name::Name,
};

use crate::{
    admissible,
    error::{DeriveError, DeriveResult},
    fixtrace,
    group::FixpointGroup,
    magic::{
        ADM_NAME, GUARD_NAME, IH_NAME, MOTIVE_NAME, POSTFIX_FIXPOINT_INDUCT, POSTFIX_MUTUAL_INDUCT,
        STEP_NAME, TRACE_INDUCTION,
    },
    order::names::{ADMISSIBLE, FIX_INDUCT, FIX_INDUCT_APPROX},
    pprod::{mk_pack, mk_pack_type, mk_proj, reduce_projs},
    realize::DeriveCtx,
    registry::FixpointInfo,
    unfold::{combined_relation, member_relation},
};

/// `base` for a single member, `base_{i+1}` inside a mutual group.
pub(crate) fn binder_name(base: &str, n: usize, i: usize) -> Name {
    let name = Name::new(base);
    if n == 1 { name } else { name.with_index(i + 1) }
}

/// The level parameters of `params` occurring in one of `es`, in declaration
/// order.
pub(crate) fn filter_level_params(params: &[Name], es: &[&Expr]) -> Vec<Name> {
    let mut used = Vec::new();
    for e in es {
        e.collect_level_params(&mut used);
    }
    params.iter().filter(|p| used.contains(p)).cloned().collect()
}

/// Add `decl` to the environment, through the kernel unless checking is
/// disabled.
pub(crate) fn emit(cx: &mut DeriveCtx<'_>, decl: ConstantInfo) -> DeriveResult<Arc<ConstantInfo>> {
    let decl = if cx.options.check_declarations {
        cx.meta.add_decl(decl)?
    } else {
        cx.meta.env().insert_unchecked(decl)?
    };
    Ok(decl)
}

/// Check that `postfix` may be derived for member `member` of `info`.
pub fn check_postfix(info: &FixpointInfo, member: usize, postfix: &str) -> DeriveResult<()> {
    let name = &info.decl_names[member];
    let kind = info.kinds[member];
    let not_applicable = |reason: String| DeriveError::NotApplicable {
        name: name.clone(),
        postfix: postfix.to_string(),
        reason,
    };
    if postfix == POSTFIX_MUTUAL_INDUCT {
        if !info.is_mutual() {
            return Err(not_applicable(format!("'{name}' is not part of a mutual group")));
        }
        if let Some(i) = info.lattice_member() {
            return Err(not_applicable(format!(
                "'{}' is defined over a complete lattice",
                info.decl_names[i]
            )));
        }
        return Ok(());
    }
    if postfix != kind.postfix() {
        return Err(not_applicable(format!(
            "'{name}' is {kind}, its principle is '{name}.{}'",
            kind.postfix()
        )));
    }
    // Only fixpoint induction applies once the group has a lattice member.
    if let Some(i) = info.lattice_member().filter(|_| !kind.is_lattice_theoretic()) {
        return Err(DeriveError::LatticeTheoretic(info.decl_names[i].clone()));
    }
    Ok(())
}

/// One step hypothesis `hᵢ`.
struct Step {
    local: Expr,
    /// Approximations of every member, only `kept` ones are bound.
    approxs: Vec<Expr>,
    kept: Vec<usize>,
    guard: Option<Expr>,
}

/// Derive `<member>.<postfix>` and add it to the environment.
pub fn derive(
    cx: &mut DeriveCtx<'_>,
    info: Arc<FixpointInfo>,
    member: usize,
    postfix: &str,
) -> DeriveResult<Arc<ConstantInfo>> {
    check_postfix(&info, member, postfix)?;
    let name = info.decl_names[member].str(postfix);
    build(cx, info, member, postfix, &name).map_err(|e| e.in_principle(&name))
}

fn build(
    cx: &mut DeriveCtx<'_>,
    info: Arc<FixpointInfo>,
    member: usize,
    postfix: &str,
    name: &Name,
) -> DeriveResult<Arc<ConstantInfo>> {
    let guarded = postfix != POSTFIX_FIXPOINT_INDUCT;
    let project = guarded && postfix != POSTFIX_MUTUAL_INDUCT && info.is_mutual();
    let group = FixpointGroup::open(&mut cx.meta, info)?;
    let n = group.len();
    let ctx = &mut cx.meta;

    let motives: Vec<Expr> = group
        .types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let motive_ty = Expr::arrow(ty.clone(), Expr::prop());
            ctx.mk_local_decl(binder_name(MOTIVE_NAME, n, i), BinderInfo::Default, motive_ty)
        })
        .collect();
    let packed_motive = packed_motive(ctx, &group, &motives)?;

    let mut adms = Vec::with_capacity(n);
    for (i, motive) in motives.iter().enumerate() {
        let adm_ty = ctx.mk_app_m(
            ADMISSIBLE,
            &[group.types[i].clone(), group.members[i].inst.clone(), motive.clone()],
        )?;
        adms.push(ctx.mk_local_decl(binder_name(ADM_NAME, n, i), BinderInfo::Default, adm_ty));
    }
    let lifted = adms
        .iter()
        .enumerate()
        .map(|(i, adm)| admissible::proj(ctx, &group.packed, n, i, adm))
        .collect::<DeriveResult<Vec<_>>>()?;
    let mut adm = lifted[n - 1].clone();
    for h in lifted[..n - 1].iter().rev() {
        adm = admissible::and(ctx, h, &adm)?;
    }

    let mut steps = Vec::with_capacity(n);
    for i in 0..n {
        steps.push(step_hyp(cx, &group, &motives, i, guarded)?);
    }
    let step_locals: Vec<Expr> = steps.iter().map(|s| s.local.clone()).collect();

    let packed_step = packed_step(cx, &group, &motives, &steps)?;
    let ctx = &mut cx.meta;

    let lemma = if guarded { FIX_INDUCT_APPROX } else { FIX_INDUCT };
    let proof = ctx.mk_app_opt_m(
        lemma,
        &[
            Some(group.alpha().clone()),
            Some(group.inst().clone()),
            Some(group.step.clone()),
            Some(group.hmono.clone()),
            Some(packed_motive),
            Some(adm),
            Some(packed_step),
        ],
    )?;

    let applied: Vec<Expr> = motives
        .iter()
        .zip(&group.consts)
        .map(|(m, c)| Expr::app(m.clone(), c.clone()))
        .collect();
    let expected = mk_pack_type(ctx, &applied)?;
    let mut proof = ctx.mk_expected_type_hint(&proof, &expected)?;
    if project {
        proof = mk_proj(ctx, n, member, &proof)?;
        proof = ctx.mk_expected_type_hint(&proof, &applied[member])?;
    }

    let binders: Vec<Expr> = group
        .xs
        .iter()
        .chain(&motives)
        .chain(&adms)
        .chain(&step_locals)
        .cloned()
        .collect();
    let value = ctx.mk_lambda_fvars(&binders, &proof)?;
    let value = ctx.instantiate_mvars(&value).beta_reduce();
    let ty = ctx.infer_type(&value)?.beta_reduce();
    let params = filter_level_params(&group.level_params, &[&ty, &value]);

    fixtrace!(
        cx.trace,
        TRACE_INDUCTION,
        "{name} : {}\n:= {}",
        cx.meta.pp_width(&ty, cx.options.pretty_width),
        cx.meta.pp_width(&value, cx.options.pretty_width)
    );
    let decl = emit(cx, ConstantInfo::theorem(name.clone(), params, ty, value))?;
    log::debug!("derived '{name}'");
    Ok(decl)
}

/// `fun x => motive₁ x₁ ∧ … ∧ motiveₙ xₙ`.
fn packed_motive(ctx: &mut MetaCtx, group: &FixpointGroup, motives: &[Expr]) -> DeriveResult<Expr> {
    let x = ctx.mk_local_decl("x", BinderInfo::Default, group.alpha().clone());
    let applied = motives
        .iter()
        .enumerate()
        .map(|(i, m)| -> DeriveResult<Expr> {
            Ok(Expr::app(m.clone(), mk_proj(ctx, group.len(), i, &x)?))
        })
        .collect::<DeriveResult<Vec<_>>>()?;
    let chain = mk_pack_type(ctx, &applied)?;
    Ok(ctx.mk_lambda_fvars(&[x], &chain)?.eta())
}

/// `Fᵢ approxs`, with every projection of a packed constructor reduced.
fn member_step(ctx: &mut MetaCtx, group: &FixpointGroup, i: usize, approxs: &[Expr]) -> DeriveResult<Expr> {
    let packed = mk_pack(ctx, approxs)?;
    let stepped = Expr::app(group.step.clone(), packed);
    Ok(reduce_projs(&mk_proj(ctx, group.len(), i, &stepped)?))
}

/// `hᵢ : ∀ approxs [hrel] ihs, motiveᵢ (Fᵢ approxs)`.
fn step_hyp(
    cx: &mut DeriveCtx<'_>,
    group: &FixpointGroup,
    motives: &[Expr],
    i: usize,
    guarded: bool,
) -> DeriveResult<Step> {
    let n = group.len();
    let ctx = &mut cx.meta;
    let approxs: Vec<Expr> = (0..n)
        .map(|j| {
            let approx_name = group.name(j).last().to_string();
            ctx.mk_local_decl(approx_name, BinderInfo::Default, group.types[j].clone())
        })
        .collect();
    let next = member_step(ctx, group, i, &approxs)?;

    let kept: Vec<usize> = (0..n)
        .filter(|&j| {
            (guarded && j == i) || approxs[j].fvar_id().is_some_and(|id| next.has_fvar(id))
        })
        .collect();
    let guard = if guarded {
        let rel = member_relation(&mut cx.meta, &mut cx.trace, group, i, &approxs[i], &next)?;
        Some(cx.meta.mk_local_decl(GUARD_NAME, BinderInfo::Default, rel))
    } else {
        None
    };
    let ctx = &mut cx.meta;
    let ihs: Vec<Expr> = kept
        .iter()
        .map(|&j| {
            let ih_ty = Expr::app(motives[j].clone(), approxs[j].clone());
            ctx.mk_local_decl(binder_name(IH_NAME, n, j), BinderInfo::Default, ih_ty)
        })
        .collect();

    let binders: Vec<Expr> = kept
        .iter()
        .map(|&j| approxs[j].clone())
        .chain(guard.clone())
        .chain(ihs)
        .collect();
    let concl = Expr::app(motives[i].clone(), next);
    let ty = ctx.mk_forall_fvars(&binders, &concl)?;
    let local = ctx.mk_local_decl(binder_name(STEP_NAME, n, i), BinderInfo::Default, ty);
    Ok(Step {
        local,
        approxs,
        kept,
        guard,
    })
}

/// Replace the locals `from` by `to` in `e`.
fn subst(e: &Expr, from: &[Expr], to: &[Expr]) -> Expr {
    let ids: Vec<_> = from.iter().filter_map(Expr::fvar_id).collect();
    e.abstract_fvars(&ids).instantiate_rev(to)
}

/// `fun x [hrel] ih => ⟨h₁ x… [hrel.1] ih…, …⟩`, the step of the packed
/// induction.
fn packed_step(
    cx: &mut DeriveCtx<'_>,
    group: &FixpointGroup,
    motives: &[Expr],
    steps: &[Step],
) -> DeriveResult<Expr> {
    let n = group.len();
    let ctx = &mut cx.meta;
    let x = ctx.mk_local_decl("x", BinderInfo::Default, group.alpha().clone());
    let projs = (0..n)
        .map(|j| mk_proj(ctx, n, j, &x))
        .collect::<DeriveResult<Vec<_>>>()?;

    let hrel = if steps.iter().any(|s| s.guard.is_some()) {
        let nexts = steps
            .iter()
            .enumerate()
            .map(|(i, s)| -> DeriveResult<Expr> {
                let next = member_step(ctx, group, i, &s.approxs)?;
                Ok(subst(&next, &s.approxs, &projs))
            })
            .collect::<DeriveResult<Vec<_>>>()?;
        let rel = combined_relation(&mut cx.meta, &mut cx.trace, group, &projs, &nexts)?;
        Some(cx.meta.mk_local_decl(GUARD_NAME, BinderInfo::Default, rel))
    } else {
        None
    };
    let ctx = &mut cx.meta;

    let ih_parts: Vec<Expr> = motives
        .iter()
        .zip(&projs)
        .map(|(m, p)| Expr::app(m.clone(), p.clone()))
        .collect();
    let ih_ty = mk_pack_type(ctx, &ih_parts)?;
    let ih = ctx.mk_local_decl(IH_NAME, BinderInfo::Default, ih_ty);

    let mut parts = Vec::with_capacity(n);
    for (i, step) in steps.iter().enumerate() {
        let mut args: Vec<Expr> = step.kept.iter().map(|&j| projs[j].clone()).collect();
        if let Some(hrel) = &hrel {
            args.push(mk_proj(ctx, n, i, hrel)?);
        }
        for &j in &step.kept {
            args.push(mk_proj(ctx, n, j, &ih)?);
        }
        parts.push(Expr::mk_app(step.local.clone(), args));
    }
    let body = mk_pack(ctx, &parts)?;

    let binders: Vec<Expr> = std::iter::once(x).chain(hrel).chain([ih]).collect();
    Ok(ctx.mk_lambda_fvars(&binders, &body)?)
}

#[cfg(test)]
mod tests {
    use fixformal::level::Level;

    use super::*;
    use crate::{
        magic::{POSTFIX_COINDUCT, POSTFIX_INDUCT},
        registry::{FixedParamPerm, OrderKind},
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
    fn binder_names_are_indexed_in_groups() {
        assert_eq!(binder_name(MOTIVE_NAME, 1, 0), Name::new("motive"));
        assert_eq!(binder_name(MOTIVE_NAME, 2, 0), Name::new("motive_1"));
        assert_eq!(binder_name(IH_NAME, 3, 2), Name::new("ih_3"));
    }

    #[test]
    fn unused_level_params_are_dropped() {
        let params = [Name::new("u"), Name::new("v"), Name::new("w")];
        let e = Expr::sort(Level::max(Level::param("w"), Level::param("u")));
        let other = Expr::prop();
        assert_eq!(
            filter_level_params(&params, &[&e, &other]),
            vec![Name::new("u"), Name::new("w")]
        );
        assert!(filter_level_params(&params, &[&other]).is_empty());
    }

    #[test]
    fn postfix_follows_the_member_kind() {
        let single = info(&[OrderKind::Inductive]);
        assert!(check_postfix(&single, 0, POSTFIX_INDUCT).is_ok());
        assert!(check_postfix(&single, 0, POSTFIX_COINDUCT).is_err());
        assert!(check_postfix(&single, 0, POSTFIX_FIXPOINT_INDUCT).is_err());
        assert!(check_postfix(&single, 0, POSTFIX_MUTUAL_INDUCT).is_err());

        let lattice = info(&[OrderKind::LatticeTheoretic]);
        assert!(check_postfix(&lattice, 0, POSTFIX_FIXPOINT_INDUCT).is_ok());
        assert!(check_postfix(&lattice, 0, POSTFIX_INDUCT).is_err());
    }

    #[test]
    fn mutual_induction_excludes_lattice_groups() {
        let mixed = info(&[OrderKind::Inductive, OrderKind::Coinductive]);
        assert!(check_postfix(&mixed, 0, POSTFIX_MUTUAL_INDUCT).is_ok());
        assert!(check_postfix(&mixed, 1, POSTFIX_MUTUAL_INDUCT).is_ok());
        assert!(check_postfix(&mixed, 1, POSTFIX_COINDUCT).is_ok());

        let lattice = info(&[
            OrderKind::Inductive,
            OrderKind::Coinductive,
            OrderKind::LatticeTheoretic,
        ]);
        let err = check_postfix(&lattice, 0, POSTFIX_MUTUAL_INDUCT).unwrap_err();
        match err {
            DeriveError::NotApplicable { name, postfix, reason } => {
                assert_eq!(name, Name::new("a"));
                assert_eq!(postfix, POSTFIX_MUTUAL_INDUCT);
                assert!(reason.contains("'c'"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = check_postfix(&lattice, 1, POSTFIX_COINDUCT).unwrap_err();
        assert!(matches!(err, DeriveError::LatticeTheoretic(n) if n == Name::new("c")));
        assert!(check_postfix(&lattice, 2, POSTFIX_FIXPOINT_INDUCT).is_ok());
    }
}
