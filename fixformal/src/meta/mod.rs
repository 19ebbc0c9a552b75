//! Elaboration context: the oracle proof synthesis is built against.
//!
//! Core concepts
//! - [`MetaCtx`] owns a local context (hypotheses opened by telescopes), a
//!   metavariable context and a handle on the shared [`Environment`].
//! - Terms are built by opening telescopes ([`MetaCtx::forall_telescope`],
//!   [`MetaCtx::lambda_telescope`]), working with the resulting free variables
//!   and closing them again ([`MetaCtx::mk_forall_fvars`],
//!   [`MetaCtx::mk_lambda_fvars`]).
//! - Applications of library lemmas are elaborated with
//!   [`MetaCtx::mk_app_m`]/[`MetaCtx::mk_app_opt_m`], which solve omitted
//!   arguments by first-order unification.
//! - [`MetaCtx::add_decl`] re-checks a closed declaration before committing it
//!   to the environment.
//!
//! State discipline
//! - Every mutation of the metavariable context happens through a
//!   save/restore pair: a failing unification or elaboration leaves the
//!   context exactly as it found it.

mod app;
mod defeq;
mod infer;
mod whnf;

use std::sync::Arc;

use crate::{
    env::{ConstantInfo, Environment},
    error::{MetaError, MetaResult},
    expr::{BinderInfo, Expr, pretty},
    level::Level,
    local::{LocalContext, LocalDecl, MetavarContext},
    name::Name,
    variable::{FVarId, IdGen},
};

/// Snapshot of the mutable elaboration state.
#[derive(Debug, Clone)]
pub struct MetaState {
    mctx: MetavarContext,
}

/// Single-threaded elaboration context.
#[derive(Debug)]
pub struct MetaCtx {
    env: Environment,
    ids: IdGen,
    lctx: LocalContext,
    mctx: MetavarContext,
}

impl MetaCtx {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            ids: IdGen::default(),
            lctx: LocalContext::default(),
            mctx: MetavarContext::default(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn lctx(&self) -> &LocalContext {
        &self.lctx
    }

    pub fn mctx(&self) -> &MetavarContext {
        &self.mctx
    }

    // ======================== State ========================

    pub fn save_state(&self) -> MetaState {
        MetaState {
            mctx: self.mctx.clone(),
        }
    }

    pub fn restore_state(&mut self, state: MetaState) {
        self.mctx = state.mctx;
    }

    /// Run `f`; on error, roll the metavariable context back to its state
    /// before the call.
    pub fn commit_if_ok<T>(&mut self, f: impl FnOnce(&mut Self) -> MetaResult<T>) -> MetaResult<T> {
        let saved = self.save_state();
        let res = f(self);
        if res.is_err() {
            self.restore_state(saved);
        }
        res
    }

    // ======================== Locals and holes ========================

    /// Introduce a new hypothesis and return it as a free variable.
    pub fn mk_local_decl(&mut self, name: impl Into<Name>, info: BinderInfo, ty: Expr) -> Expr {
        let fvar = self.ids.fvar();
        self.lctx.insert(LocalDecl {
            fvar,
            name: name.into(),
            info,
            ty,
        });
        Expr::fvar(fvar)
    }

    pub fn local_decl(&self, e: &Expr) -> MetaResult<&LocalDecl> {
        let Expr::FVar(id) = e else {
            return Err(MetaError::TypeExpected {
                term: self.pp(e),
            });
        };
        self.lctx.get(*id).ok_or(MetaError::UnknownFVar(*id))
    }

    /// Create an unassigned metavariable of the given type.
    pub fn mk_fresh_mvar(&mut self, ty: Expr) -> Expr {
        let scope = self.ids.watermark();
        let id = self.ids.mvar();
        self.mctx.declare(id, ty, scope);
        Expr::mvar(id)
    }

    pub fn mk_fresh_level_mvar(&mut self) -> Level {
        let id = self.ids.level_mvar();
        self.mctx.declare_level(id);
        Level::MVar(id)
    }

    /// Substitute every assigned metavariable, beta-reducing instantiated heads.
    pub fn instantiate_mvars(&self, e: &Expr) -> Expr {
        if !e.has_mvar() {
            return e.clone();
        }
        let e = e.instantiate_level_mvars(&|m| {
            self.mctx
                .level_assignment(m)
                .map(|l| self.mctx.instantiate_level(&l))
        });
        e.replace(&mut |sub, _| match sub {
            Expr::MVar(m) => self.mctx.assignment(*m).map(|v| self.instantiate_mvars(v)),
            Expr::App(..) if matches!(sub.get_app_fn(), Expr::MVar(m) if self.mctx.assignment(*m).is_some()) => {
                let head = self.instantiate_mvars(sub.get_app_fn());
                let args: Vec<Expr> = sub
                    .get_app_args()
                    .iter()
                    .map(|a| self.instantiate_mvars(a))
                    .collect();
                Some(Expr::beta(&head, &args))
            }
            _ => None,
        })
    }

    pub fn instantiate_level_mvars(&self, l: &Level) -> Level {
        self.mctx.instantiate_level(l)
    }

    // ======================== Telescopes ========================

    fn telescope(
        &mut self,
        e: &Expr,
        want_pi: bool,
        reducing: bool,
        max: Option<usize>,
    ) -> MetaResult<(Vec<Expr>, Expr)> {
        let mut fvars = Vec::new();
        let mut cur = e.clone();
        loop {
            if max.is_some_and(|m| fvars.len() >= m) {
                break;
            }
            let is_binder = |e: &Expr| if want_pi { e.is_pi() } else { e.is_lam() };
            if !is_binder(&cur) && reducing {
                let reduced = self.whnf(&cur)?;
                if is_binder(&reduced) {
                    cur = reduced;
                }
            }
            match &cur {
                Expr::Pi {
                    name,
                    info,
                    ty,
                    body,
                }
                | Expr::Lam {
                    name,
                    info,
                    ty,
                    body,
                } if is_binder(&cur) => {
                    let ty = ty.instantiate_rev(&fvars);
                    let fvar = self.mk_local_decl(name.clone(), *info, ty);
                    let body = (**body).clone();
                    fvars.push(fvar);
                    cur = body;
                }
                _ => break,
            }
        }
        Ok((fvars.clone(), cur.instantiate_rev(&fvars)))
    }

    /// Open the leading `∀` binders of `ty` as fresh locals.
    pub fn forall_telescope(&mut self, ty: &Expr) -> MetaResult<(Vec<Expr>, Expr)> {
        self.telescope(ty, true, false, None)
    }

    /// Like [`MetaCtx::forall_telescope`], putting the body in weak head
    /// normal form whenever it is not syntactically a `∀`.
    pub fn forall_telescope_reducing(
        &mut self,
        ty: &Expr,
        max: Option<usize>,
    ) -> MetaResult<(Vec<Expr>, Expr)> {
        self.telescope(ty, true, true, max)
    }

    /// Open the leading `fun` binders of `e` as fresh locals.
    pub fn lambda_telescope(&mut self, e: &Expr) -> MetaResult<(Vec<Expr>, Expr)> {
        self.telescope(e, false, false, None)
    }

    fn mk_binding(&self, lambda: bool, fvars: &[Expr], body: &Expr) -> MetaResult<Expr> {
        let ids = fvars
            .iter()
            .map(|e| {
                e.fvar_id().ok_or_else(|| MetaError::TypeExpected {
                    term: self.pp(e),
                })
            })
            .collect::<MetaResult<Vec<FVarId>>>()?;

        let mut result = self.instantiate_mvars(body).abstract_fvars(&ids);
        for (i, id) in ids.iter().enumerate().rev() {
            let decl = self.lctx.get(*id).ok_or(MetaError::UnknownFVar(*id))?;
            let ty = self.instantiate_mvars(&decl.ty).abstract_fvars(&ids[..i]);
            result = if lambda {
                Expr::lam(decl.name.clone(), decl.info, ty, result)
            } else {
                Expr::pi(decl.name.clone(), decl.info, ty, result)
            };
        }
        Ok(result)
    }

    /// `fun xs => body`, abstracting the given locals.
    pub fn mk_lambda_fvars(&self, fvars: &[Expr], body: &Expr) -> MetaResult<Expr> {
        self.mk_binding(true, fvars, body)
    }

    /// `∀ xs, body`, abstracting the given locals.
    pub fn mk_forall_fvars(&self, fvars: &[Expr], body: &Expr) -> MetaResult<Expr> {
        self.mk_binding(false, fvars, body)
    }

    /// Non-dependent arrow between two closed types.
    pub fn mk_arrow(&mut self, a: Expr, b: Expr) -> MetaResult<Expr> {
        let x = self.mk_local_decl("a", BinderInfo::Default, a);
        self.mk_forall_fvars(&[x], &b)
    }

    // ======================== Declarations ========================

    /// Check a closed declaration and add it to the environment.
    pub fn add_decl(&mut self, info: ConstantInfo) -> MetaResult<Arc<ConstantInfo>> {
        let ty = self.instantiate_mvars(&info.ty);
        let value = info.value().map(|v| self.instantiate_mvars(v));

        for e in std::iter::once(&ty).chain(value.as_ref()) {
            if e.has_mvar() {
                return Err(MetaError::UnassignedMVars {
                    name: info.name.clone(),
                    term: self.pp(e),
                });
            }
            if e.has_any_fvar() {
                return Err(MetaError::FreeVariables {
                    name: info.name.clone(),
                    term: self.pp(e),
                });
            }
            let mut used = Vec::new();
            e.collect_level_params(&mut used);
            if let Some(param) = used.into_iter().find(|p| !info.level_params.contains(p)) {
                return Err(MetaError::UndeclaredLevelParam {
                    name: info.name.clone(),
                    param,
                });
            }
        }

        let sort = self.check(&ty)?;
        self.ensure_sort(&sort)?;
        if let Some(value) = &value {
            let value_ty = self.check(value)?;
            if !self.is_def_eq(&value_ty, &ty)? {
                return Err(MetaError::DeclTypeMismatch {
                    name: info.name.clone(),
                    expected: self.pp(&ty),
                    found: self.pp(&value_ty),
                });
            }
        }
        self.env.insert_unchecked(info)
    }

    // ======================== Diagnostics ========================

    /// Render a term, naming free variables after their local declarations.
    pub fn pp(&self, e: &Expr) -> String {
        self.pp_width(e, 100)
    }

    pub fn pp_width(&self, e: &Expr, width: usize) -> String {
        let e = self.instantiate_mvars(e);
        let resolver = |id: FVarId| self.lctx.get(id).map(|d| d.name.clone());
        let doc = pretty::to_doc_with(&e, Some(&resolver));
        pretty::doc_to_string(&doc, width)
    }
}
