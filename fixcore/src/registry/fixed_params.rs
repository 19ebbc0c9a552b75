use fixformal::{
    expr::{BinderInfo, Expr},
    meta::MetaCtx,
    name::Name,
};

use crate::error::{DeriveError, DeriveResult};

/// Which parameters of a group member are shared by the whole group.
///
/// Entry `p` describes the `p`-th parameter of the member's type: `Some(k)`
/// when it is the `k`-th fixed parameter of the group, `None` when it varies
/// from call to call. Fixed parameters may be interleaved with varying ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedParamPerm {
    positions: Vec<Option<usize>>,
}

impl FixedParamPerm {
    pub fn new(positions: Vec<Option<usize>>) -> Self {
        Self { positions }
    }

    /// Every parameter fixed, in order.
    pub fn all_fixed(n: usize) -> Self {
        Self::new((0..n).map(Some).collect())
    }

    pub fn num_params(&self) -> usize {
        self.positions.len()
    }

    pub fn num_fixed(&self) -> usize {
        self.positions.iter().flatten().count()
    }

    pub fn positions(&self) -> &[Option<usize>] {
        &self.positions
    }

    /// Open the fixed parameters of `ty` as locals, ordered by fixed index.
    ///
    /// The locals keep the original binder names and binder infos. A fixed
    /// parameter whose type mentions a varying one is rejected.
    pub fn forall_telescope(&self, ctx: &mut MetaCtx, ty: &Expr) -> DeriveResult<Vec<Expr>> {
        let (params, _) = ctx.forall_telescope_reducing(ty, Some(self.num_params()))?;
        if params.len() != self.num_params() {
            return Err(DeriveError::invariant(
                "function type has fewer parameters than its fixed parameter layout",
                ctx.pp(ty),
            ));
        }
        let mut fixed: Vec<(usize, Expr)> = Vec::with_capacity(self.num_fixed());
        for (param, pos) in params.iter().zip(&self.positions) {
            let Some(k) = pos else { continue };
            let param_ty = &ctx.local_decl(param)?.ty;
            let escapes = params
                .iter()
                .zip(&self.positions)
                .filter(|(_, p)| p.is_none())
                .any(|(v, _)| v.fvar_id().is_some_and(|id| param_ty.has_fvar(id)));
            if escapes {
                return Err(DeriveError::invariant(
                    "fixed parameter depends on a varying parameter",
                    ctx.pp(ty),
                ));
            }
            fixed.push((*k, param.clone()));
        }
        fixed.sort_by_key(|(k, _)| *k);
        Ok(fixed.into_iter().map(|(_, x)| x).collect())
    }

    /// Substitute `xs` for the fixed binders of `ty`, keeping the varying ones.
    pub fn instantiate_forall(&self, ctx: &mut MetaCtx, ty: &Expr, xs: &[Expr]) -> DeriveResult<Expr> {
        let (varying, body) = self.open(ctx, ty, xs, false)?;
        Ok(ctx.mk_forall_fvars(&varying, &body)?)
    }

    /// Substitute `xs` for the fixed lambdas of `value`, keeping the varying
    /// ones.
    pub fn instantiate_lambda(&self, ctx: &mut MetaCtx, value: &Expr, xs: &[Expr]) -> DeriveResult<Expr> {
        let (varying, body) = self.open(ctx, value, xs, true)?;
        Ok(ctx.mk_lambda_fvars(&varying, &body)?)
    }

    /// `fun ys => f args`, where `args` interleaves `xs` and the varying
    /// parameters `ys` of `f : ty`. Eta-reduced, so trailing varying
    /// parameters yield a partial application.
    pub fn apply_fixed(&self, ctx: &mut MetaCtx, f: &Expr, ty: &Expr, xs: &[Expr]) -> DeriveResult<Expr> {
        let mut args = Vec::with_capacity(self.num_params());
        let mut varying = Vec::new();
        let mut cur = ty.clone();
        for pos in &self.positions {
            let (name, info, dom, body) = self.binder(ctx, &cur, false)?;
            let arg = match pos {
                Some(k) => self.fixed_arg(ctx, xs, *k, ty)?,
                None => {
                    let y = ctx.mk_local_decl(name, info, dom);
                    varying.push(y.clone());
                    y
                }
            };
            cur = body.instantiate1(&arg);
            args.push(arg);
        }
        let app = Expr::mk_app(f.clone(), args);
        Ok(ctx.mk_lambda_fvars(&varying, &app)?.eta())
    }

    fn open(
        &self,
        ctx: &mut MetaCtx,
        e: &Expr,
        xs: &[Expr],
        lambda: bool,
    ) -> DeriveResult<(Vec<Expr>, Expr)> {
        let mut varying = Vec::new();
        let mut cur = e.clone();
        for pos in &self.positions {
            let (name, info, dom, body) = self.binder(ctx, &cur, lambda)?;
            let arg = match pos {
                Some(k) => self.fixed_arg(ctx, xs, *k, e)?,
                None => {
                    let y = ctx.mk_local_decl(name, info, dom);
                    varying.push(y.clone());
                    y
                }
            };
            cur = body.instantiate1(&arg);
        }
        Ok((varying, cur))
    }

    fn binder(
        &self,
        ctx: &MetaCtx,
        e: &Expr,
        lambda: bool,
    ) -> DeriveResult<(Name, BinderInfo, Expr, Expr)> {
        let reduced;
        let e = match (e, lambda) {
            (Expr::Pi { .. }, false) | (Expr::Lam { .. }, true) => e,
            (_, false) => {
                reduced = ctx.whnf(e)?;
                &reduced
            }
            (_, true) => e,
        };
        match (e, lambda) {
            (
                Expr::Pi {
                    name,
                    info,
                    ty,
                    body,
                },
                false,
            )
            | (
                Expr::Lam {
                    name,
                    info,
                    ty,
                    body,
                },
                true,
            ) => Ok((name.clone(), *info, (**ty).clone(), (**body).clone())),
            _ => Err(DeriveError::invariant(
                "fewer binders than the fixed parameter layout",
                ctx.pp(e),
            )),
        }
    }

    fn fixed_arg(&self, ctx: &MetaCtx, xs: &[Expr], k: usize, e: &Expr) -> DeriveResult<Expr> {
        xs.get(k).cloned().ok_or_else(|| {
            DeriveError::invariant(
                format!("fixed parameter #{k} out of range ({} given)", xs.len()),
                ctx.pp(e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixformal::{
        builtins::install_builtins,
        env::{ConstantInfo, Environment},
        level::Level,
    };

    /// `∀ (n : Nat) (p : Prop) (m : Nat) (q : Prop), Prop` with `p`, `q` fixed.
    fn setup() -> (MetaCtx, Expr, FixedParamPerm) {
        let env = Environment::new();
        install_builtins(&env).unwrap();
        env.insert_unchecked(ConstantInfo::axiom("Nat", vec![], Expr::type_u(Level::zero())))
            .unwrap();
        let mut ctx = MetaCtx::new(env);
        let nat = Expr::constant("Nat", []);
        let n = ctx.mk_local_decl("n", BinderInfo::Default, nat.clone());
        let p = ctx.mk_local_decl("p", BinderInfo::Implicit, Expr::prop());
        let m = ctx.mk_local_decl("m", BinderInfo::Default, nat);
        let q = ctx.mk_local_decl("q", BinderInfo::Default, Expr::prop());
        let body = ctx.mk_and(&p, &q);
        let ty = ctx.mk_forall_fvars(&[n, p, m, q], &body).unwrap();
        let perm = FixedParamPerm::new(vec![None, Some(0), None, Some(1)]);
        (ctx, ty, perm)
    }

    #[test]
    fn interleaved_fixed_parameters() {
        let (mut ctx, ty, perm) = setup();
        assert_eq!(perm.num_fixed(), 2);

        let xs = perm.forall_telescope(&mut ctx, &ty).unwrap();
        assert_eq!(xs.len(), 2);
        let p_decl = ctx.local_decl(&xs[0]).unwrap();
        assert_eq!(p_decl.name, "p");
        assert_eq!(p_decl.info, BinderInfo::Implicit);
        assert_eq!(ctx.local_decl(&xs[1]).unwrap().name, "q");

        let inst = perm.instantiate_forall(&mut ctx, &ty, &xs).unwrap();
        let (ys, body) = ctx.forall_telescope(&inst).unwrap();
        assert_eq!(ys.len(), 2);
        assert_eq!(ctx.local_decl(&ys[0]).unwrap().name, "n");
        assert_eq!(ctx.local_decl(&ys[1]).unwrap().name, "m");
        assert_eq!(body, ctx.mk_and(&xs[0], &xs[1]));
    }

    #[test]
    fn apply_fixed_threads_varying_parameters() {
        let (mut ctx, ty, perm) = setup();
        ctx.add_decl(ConstantInfo::axiom("f", vec![], ty.clone()))
            .unwrap();
        let xs = perm.forall_telescope(&mut ctx, &ty).unwrap();
        let f = Expr::constant("f", []);
        let applied = perm.apply_fixed(&mut ctx, &f, &ty, &xs).unwrap();

        let a = Expr::constant("a", []);
        let b = Expr::constant("b", []);
        let call = Expr::mk_app(applied, [a.clone(), b.clone()]).head_beta();
        assert_eq!(
            call,
            Expr::mk_app(f, [a, xs[0].clone(), b, xs[1].clone()])
        );
    }

    #[test]
    fn trailing_varying_parameters_eta_reduce() {
        let (mut ctx, _, _) = setup();
        let nat = Expr::constant("Nat", []);
        let p = ctx.mk_local_decl("p", BinderInfo::Default, Expr::prop());
        let n = ctx.mk_local_decl("n", BinderInfo::Default, nat);
        let ty = ctx.mk_forall_fvars(&[p, n], &Expr::prop()).unwrap();
        let perm = FixedParamPerm::new(vec![Some(0), None]);
        let xs = perm.forall_telescope(&mut ctx, &ty).unwrap();
        let g = Expr::constant("g", []);
        let applied = perm.apply_fixed(&mut ctx, &g, &ty, &xs).unwrap();
        assert_eq!(applied, Expr::app(g, xs[0].clone()));
    }

    #[test]
    fn too_few_binders_is_an_invariant_violation() {
        let (mut ctx, _, perm) = setup();
        let err = perm.forall_telescope(&mut ctx, &Expr::prop()).unwrap_err();
        assert!(matches!(err, DeriveError::InvariantViolation { .. }));
    }
}
