//! Type inference and checking.

use super::MetaCtx;
use crate::{
    error::{MetaError, MetaResult},
    expr::Expr,
    level::Level,
};

impl MetaCtx {
    /// Infer the type of `e` without checking argument types.
    pub fn infer_type(&mut self, e: &Expr) -> MetaResult<Expr> {
        self.infer_core(e, false)
    }

    /// Infer the type of `e`, checking every application argument and binder
    /// domain along the way.
    pub fn check(&mut self, e: &Expr) -> MetaResult<Expr> {
        self.infer_core(e, true)
    }

    fn infer_core(&mut self, e: &Expr, check: bool) -> MetaResult<Expr> {
        match e {
            Expr::BVar(i) => Err(MetaError::LooseBVar(*i)),
            Expr::FVar(id) => self
                .lctx
                .get(*id)
                .map(|d| d.ty.clone())
                .ok_or(MetaError::UnknownFVar(*id)),
            Expr::MVar(id) => match self.mctx.get(*id) {
                Some(decl) => Ok(decl.ty.clone()),
                None => Err(MetaError::TypeExpected { term: self.pp(e) }),
            },
            Expr::Sort(l) => Ok(Expr::sort(l.succ())),
            Expr::Const(name, levels) => {
                let info = self.env.get(name)?;
                info.instantiate_type(levels)
            }
            Expr::App(..) => self.infer_app(e, check),
            Expr::Lam { .. } => {
                let (fvars, body) = self.lambda_telescope(e)?;
                if check {
                    for x in &fvars {
                        let ty = self.local_decl(x)?.ty.clone();
                        let sort = self.infer_core(&ty, true)?;
                        self.ensure_sort(&sort)?;
                    }
                }
                let body_ty = self.infer_core(&body, check)?;
                self.mk_forall_fvars(&fvars, &body_ty)
            }
            Expr::Pi { .. } => {
                let (fvars, body) = self.forall_telescope(e)?;
                let mut levels = Vec::with_capacity(fvars.len());
                for x in &fvars {
                    let ty = self.local_decl(x)?.ty.clone();
                    let sort = self.infer_core(&ty, check)?;
                    levels.push(self.ensure_sort(&sort)?);
                }
                let body_sort = self.infer_core(&body, check)?;
                let mut level = self.ensure_sort(&body_sort)?;
                for l in levels.into_iter().rev() {
                    level = Level::imax(l, level);
                }
                Ok(Expr::sort(level.normalize()))
            }
        }
    }

    fn infer_app(&mut self, e: &Expr, check: bool) -> MetaResult<Expr> {
        let head = e.get_app_fn().clone();
        let args = e.get_app_args();
        let mut fty = self.infer_core(&head, check)?;
        for arg in &args {
            if !fty.is_pi() {
                fty = self.whnf(&fty)?;
            }
            let Expr::Pi { ty, body, .. } = &fty else {
                return Err(MetaError::FunctionExpected {
                    term: self.pp(e),
                    ty: self.pp(&fty),
                });
            };
            if check {
                let expected = (**ty).clone();
                let arg_ty = self.infer_core(arg, true)?;
                if !self.is_def_eq(&arg_ty, &expected)? {
                    return Err(MetaError::AppTypeMismatch {
                        app: self.pp(e),
                        arg: self.pp(arg),
                        arg_ty: self.pp(&arg_ty),
                        expected: self.pp(&expected),
                    });
                }
            }
            fty = body.instantiate1(arg);
        }
        Ok(fty)
    }

    /// Reduce `ty` to a sort and return its level.
    pub fn ensure_sort(&mut self, ty: &Expr) -> MetaResult<Level> {
        if let Expr::Sort(l) = ty {
            return Ok(self.instantiate_level_mvars(l));
        }
        match self.whnf(ty)? {
            Expr::Sort(l) => Ok(self.instantiate_level_mvars(&l)),
            _ => Err(MetaError::TypeExpected { term: self.pp(ty) }),
        }
    }

    /// Universe level `l` such that `ty : Sort l`.
    pub fn get_level(&mut self, ty: &Expr) -> MetaResult<Level> {
        let sort = self.infer_type(ty)?;
        self.ensure_sort(&sort)
    }

    /// `true` when `ty : Prop`.
    pub fn is_prop(&mut self, ty: &Expr) -> MetaResult<bool> {
        Ok(self.get_level(ty)?.normalize().is_zero())
    }

    /// `true` when `e` is a proof, i.e. its type is a proposition.
    pub fn is_proof(&mut self, e: &Expr) -> MetaResult<bool> {
        let ty = self.infer_type(e)?;
        self.is_prop(&ty)
    }
}
