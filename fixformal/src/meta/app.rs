//! Elaboration of library applications with omitted arguments.

use super::MetaCtx;
use crate::{
    builtins::names,
    error::{MetaError, MetaResult},
    expr::{BinderInfo, Expr, LevelVec},
    name::Name,
};

impl MetaCtx {
    /// Apply constant `name` to `args`, where `None` marks an argument to be
    /// solved by unification against the types of the later arguments.
    ///
    /// Universe arguments are always inferred. Fails with
    /// [`MetaError::AppElabFailed`] when a hole remains unsolved; the
    /// metavariable context is restored on every failure.
    pub fn mk_app_opt_m(&mut self, name: impl Into<Name>, args: &[Option<Expr>]) -> MetaResult<Expr> {
        let name = name.into();
        self.commit_if_ok(|ctx| ctx.mk_app_core(&name, args))
    }

    /// Apply constant `name` to its explicit arguments, inferring every
    /// implicit and instance-implicit one.
    pub fn mk_app_m(&mut self, name: impl Into<Name>, args: &[Expr]) -> MetaResult<Expr> {
        let name = name.into();
        let info = self.env.get(&name)?;

        let mut opt_args = Vec::with_capacity(args.len());
        let mut remaining = args.iter();
        let mut pending = 0;
        let mut ty = &info.ty;
        while remaining.len() > 0 {
            let Expr::Pi { info: bi, body, .. } = ty else {
                return Err(MetaError::AppTooManyArgs { name });
            };
            if *bi == BinderInfo::Default {
                opt_args.extend(std::iter::repeat_n(None, pending));
                pending = 0;
                opt_args.push(remaining.next().cloned());
            } else {
                pending += 1;
            }
            ty = &**body;
        }
        self.mk_app_opt_m(name, &opt_args)
    }

    fn mk_app_core(&mut self, name: &Name, args: &[Option<Expr>]) -> MetaResult<Expr> {
        let info = self.env.get(name)?;
        let levels: LevelVec = info
            .level_params
            .iter()
            .map(|_| self.mk_fresh_level_mvar())
            .collect();
        let mut fty = info.instantiate_type(&levels)?;

        let mut applied = Vec::with_capacity(args.len());
        let mut holes = Vec::new();
        for (index, arg) in args.iter().enumerate() {
            if !fty.is_pi() {
                fty = self.whnf(&fty)?;
            }
            let Expr::Pi { ty, body, .. } = &fty else {
                return Err(MetaError::AppTooManyArgs { name: name.clone() });
            };
            let expected = (**ty).clone();
            let value = match arg {
                Some(arg) => {
                    let arg_ty = self.infer_type(arg)?;
                    if !self.is_def_eq(&arg_ty, &expected)? {
                        return Err(MetaError::AppTypeMismatch {
                            app: name.to_string(),
                            arg: self.pp(arg),
                            arg_ty: self.pp(&arg_ty),
                            expected: self.pp(&expected),
                        });
                    }
                    arg.clone()
                }
                None => {
                    let hole = self.mk_fresh_mvar(expected);
                    holes.push((index, hole.clone()));
                    hole
                }
            };
            fty = body.instantiate1(&value);
            applied.push(value);
        }

        for (index, hole) in holes {
            if let Expr::MVar(m) = hole {
                if self.mctx.assignment(m).is_none() {
                    return Err(MetaError::AppElabFailed {
                        name: name.clone(),
                        index,
                    });
                }
            }
        }
        let head = Expr::Const(name.clone(), levels.clone());
        let result = self.instantiate_mvars(&Expr::mk_app(head, applied));
        if levels.iter().any(|l| self.instantiate_level_mvars(l).has_mvar()) {
            return Err(MetaError::UnassignedMVars {
                name: name.clone(),
                term: self.pp(&result),
            });
        }
        Ok(result)
    }

    /// `id ty e`: a term defeq to `e` whose inferred type is syntactically `ty`.
    pub fn mk_expected_type_hint(&mut self, e: &Expr, ty: &Expr) -> MetaResult<Expr> {
        let level = self.get_level(ty)?;
        Ok(Expr::mk_app(
            Expr::constant(names::ID, [level]),
            [ty.clone(), e.clone()],
        ))
    }
}
