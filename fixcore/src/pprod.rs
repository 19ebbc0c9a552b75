//! Packing a group into one value and selecting members back out.
//!
//! A group `f₁ … fₙ` is packed into the right-nested product
//! `f₁ ×' (f₂ ×' (… ×' fₙ))`. Member `i` is reached by `i` second projections
//! followed by one first projection, except for the last member which needs no
//! first projection. Propositions are packed with `And` instead of `PProd`, so
//! the same functions pack motives, proofs and values.

use fixformal::{builtins::names, expr::Expr, meta::MetaCtx};

use crate::error::{DeriveError, DeriveResult};

/// Projection reduction rules: (projection, constructor, field).
const PROJ_RULES: [(&str, &str, usize); 4] = [
    (names::PPROD_FST, names::PPROD_MK, 0),
    (names::PPROD_SND, names::PPROD_MK, 1),
    (names::AND_LEFT, names::AND_INTRO, 0),
    (names::AND_RIGHT, names::AND_INTRO, 1),
];

/// `t₁ ×' (t₂ ×' …)`, or `t₁ ∧ (t₂ ∧ …)` for propositions.
pub fn mk_pack_type(ctx: &mut MetaCtx, tys: &[Expr]) -> DeriveResult<Expr> {
    let Some((last, init)) = tys.split_last() else {
        return Err(DeriveError::invariant("cannot pack an empty group", "[]"));
    };
    let mut acc = last.clone();
    for ty in init.iter().rev() {
        acc = if ctx.is_prop(ty)? && ctx.is_prop(&acc)? {
            ctx.mk_and(ty, &acc)
        } else {
            ctx.mk_pprod(ty, &acc)?
        };
    }
    Ok(acc)
}

/// `⟨e₁, ⟨e₂, …⟩⟩`, built with `And.intro` for proofs.
pub fn mk_pack(ctx: &mut MetaCtx, es: &[Expr]) -> DeriveResult<Expr> {
    let Some((last, init)) = es.split_last() else {
        return Err(DeriveError::invariant("cannot pack an empty group", "[]"));
    };
    let mut acc = last.clone();
    for e in init.iter().rev() {
        acc = if ctx.is_proof(e)? && ctx.is_proof(&acc)? {
            ctx.mk_and_intro(e, &acc)?
        } else {
            ctx.mk_pprod_mk(e, &acc)?
        };
    }
    Ok(acc)
}

/// Select member `i` of a packed group of size `n`.
pub fn mk_proj(ctx: &mut MetaCtx, n: usize, i: usize, e: &Expr) -> DeriveResult<Expr> {
    if i >= n {
        return Err(DeriveError::invariant(
            format!("projection index {i} out of range for a group of {n}"),
            ctx.pp(e),
        ));
    }
    let mut cur = e.clone();
    for _ in 0..i {
        cur = component(ctx, &cur, false)?;
    }
    if i + 1 < n {
        cur = component(ctx, &cur, true)?;
    }
    Ok(cur)
}

fn component(ctx: &mut MetaCtx, e: &Expr, first: bool) -> DeriveResult<Expr> {
    let ty = ctx.infer_type(e)?;
    let ty = ctx.whnf(&ty)?;
    let proj = if ty.is_app_of(names::AND, 2) {
        if first {
            ctx.mk_and_left(e)?
        } else {
            ctx.mk_and_right(e)?
        }
    } else if first {
        ctx.mk_pprod_fst(e)?
    } else {
        ctx.mk_pprod_snd(e)?
    };
    Ok(proj)
}

/// Beta-reduce and cancel every projection applied to a constructor.
pub fn reduce_projs(e: &Expr) -> Expr {
    let mut cur = e.beta_reduce();
    loop {
        let next = cur.replace(&mut |sub, _| reduce_proj_app(sub)).beta_reduce();
        if next == cur {
            return cur;
        }
        cur = next;
    }
}

fn reduce_proj_app(e: &Expr) -> Option<Expr> {
    let head = e.const_name()?;
    let (_, ctor, field) = PROJ_RULES.iter().find(|(p, _, _)| head == *p)?;
    let args = e.get_app_args();
    let major = args.get(2)?;
    if !major.is_app_of(ctor, 4) {
        return None;
    }
    let value = major.get_app_args().swap_remove(2 + field);
    Some(Expr::mk_app(value, args[3..].iter().cloned()))
}

/// Drop every projection at the head of `e`: `(x.2.1) ys` becomes `x`.
pub fn strip_projs(e: &Expr) -> Expr {
    let mut cur = e.clone();
    while let Some(major) = cur
        .const_name()
        .filter(|n| PROJ_RULES.iter().any(|(p, _, _)| *n == *p))
        .and_then(|_| cur.get_app_args().get(2).cloned())
    {
        cur = major;
    }
    cur
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixformal::{builtins::install_builtins, env::Environment, expr::BinderInfo};

    fn ctx() -> MetaCtx {
        let env = Environment::new();
        install_builtins(&env).unwrap();
        MetaCtx::new(env)
    }

    fn props(ctx: &mut MetaCtx, names: &[&str]) -> Vec<Expr> {
        names
            .iter()
            .map(|n| ctx.mk_local_decl(*n, BinderInfo::Default, Expr::prop()))
            .collect()
    }

    #[test]
    fn projections_select_each_member() {
        let mut ctx = ctx();
        let tys = props(&mut ctx, &["A", "B", "C"]);
        let vals: Vec<Expr> = tys
            .iter()
            .zip(["a", "b", "c"])
            .map(|(ty, n)| ctx.mk_local_decl(n, BinderInfo::Default, ty.clone()))
            .collect();
        // Proofs of propositions pack with `And`.
        let packed = mk_pack(&mut ctx, &vals).unwrap();
        let packed_ty = ctx.infer_type(&packed).unwrap();
        assert_eq!(packed_ty, mk_pack_type(&mut ctx, &tys).unwrap());

        for (i, v) in vals.iter().enumerate() {
            let proj = mk_proj(&mut ctx, 3, i, &packed).unwrap();
            assert_eq!(reduce_projs(&proj), *v);
            let ty = ctx.infer_type(&proj).unwrap();
            assert!(ctx.is_def_eq(&ty, &tys[i]).unwrap());
        }
        let err = mk_proj(&mut ctx, 3, 3, &packed).unwrap_err();
        assert!(matches!(err, DeriveError::InvariantViolation { .. }));
    }

    #[test]
    fn types_pack_with_pprod() {
        let mut ctx = ctx();
        let tys = [Expr::prop(), Expr::prop()];
        let packed = mk_pack_type(&mut ctx, &tys).unwrap();
        assert!(packed.is_app_of(names::PPROD, 2));
        assert_eq!(mk_pack_type(&mut ctx, &tys[..1]).unwrap(), Expr::prop());

        let p = ctx.mk_local_decl("p", BinderInfo::Default, packed);
        let snd = mk_proj(&mut ctx, 2, 1, &p).unwrap();
        assert!(snd.is_app_of(names::PPROD_SND, 3));
        assert_eq!(strip_projs(&snd), p);
        assert_eq!(mk_proj(&mut ctx, 1, 0, &p).unwrap(), p);
    }
}
