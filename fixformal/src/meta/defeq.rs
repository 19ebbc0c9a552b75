//! Definitional equality with first-order unification.
//!
//! The checker works on weak head normal forms and unfolds definitions
//! lazily, always unfolding the side with the greater definitional height
//! first. On top of beta, delta and projection reduction it knows eta for
//! functions, eta for `PProd` and proof irrelevance.
//!
//! Unassigned metavariables are solved when they occur at the head of either
//! side, provided the solution is well scoped and well typed. Applied
//! metavariables (higher-order patterns) are never solved.

use super::MetaCtx;
use crate::{
    builtins::names,
    error::MetaResult,
    expr::Expr,
    level::Level,
    variable::{LMVarId, MVarId},
};

impl MetaCtx {
    /// Decide `a ≡ b`, assigning metavariables on success. On failure the
    /// metavariable context is left untouched.
    pub fn is_def_eq(&mut self, a: &Expr, b: &Expr) -> MetaResult<bool> {
        let saved = self.save_state();
        let res = self.def_eq(a, b);
        if !matches!(res, Ok(true)) {
            self.restore_state(saved);
        }
        res
    }

    /// Decide level equality, assigning level metavariables on success.
    pub fn is_level_def_eq(&mut self, a: &Level, b: &Level) -> bool {
        let saved = self.save_state();
        let res = self.level_def_eq(a, b);
        if !res {
            self.restore_state(saved);
        }
        res
    }

    fn def_eq(&mut self, a: &Expr, b: &Expr) -> MetaResult<bool> {
        if a == b {
            return Ok(true);
        }
        let mut a = self.whnf_core(a);
        let mut b = self.whnf_core(b);

        loop {
            if a == b {
                return Ok(true);
            }
            if let Some(res) = self.def_eq_quick(&a, &b)? {
                return Ok(res);
            }
            if self.same_const_head(&a, &b) && self.try_args(&a, &b)? {
                return Ok(true);
            }

            let (ha, hb) = (self.head_height(&a), self.head_height(&b));
            let (unfold_a, unfold_b) = match (ha, hb) {
                (None, None) => break,
                (Some(x), Some(y)) => (x >= y, y >= x),
                (Some(_), None) => (true, false),
                (None, Some(_)) => (false, true),
            };
            if unfold_a {
                if let Some(next) = self.unfold_definition(&a) {
                    a = self.whnf_core(&next);
                }
            }
            if unfold_b {
                if let Some(next) = self.unfold_definition(&b) {
                    b = self.whnf_core(&next);
                }
            }
        }

        // Projections whose major premise only reduces after delta.
        let (wa, wb) = (self.whnf(&a)?, self.whnf(&b)?);
        if wa != a || wb != b {
            return self.def_eq(&wa, &wb);
        }

        if a.is_app() && b.is_app() && a.get_app_num_args() == b.get_app_num_args() {
            let saved = self.save_state();
            if self.def_eq(a.get_app_fn(), b.get_app_fn())? && self.try_args(&a, &b)? {
                return Ok(true);
            }
            self.restore_state(saved);
        }

        if let Some(res) = self.def_eq_pprod_eta(&a, &b)? {
            return Ok(res);
        }
        if let Some(res) = self.def_eq_pprod_eta(&b, &a)? {
            return Ok(res);
        }
        self.def_eq_proof_irrel(&a, &b)
    }

    /// Cases decided without unfolding anything.
    fn def_eq_quick(&mut self, a: &Expr, b: &Expr) -> MetaResult<Option<bool>> {
        if let Expr::MVar(m) = a {
            return self.assign_mvar(*m, b).map(Some);
        }
        if let Expr::MVar(m) = b {
            return self.assign_mvar(*m, a).map(Some);
        }
        match (a, b) {
            (Expr::Sort(l1), Expr::Sort(l2)) => Ok(Some(self.level_def_eq(l1, l2))),
            (Expr::Lam { .. }, Expr::Lam { .. }) | (Expr::Pi { .. }, Expr::Pi { .. }) => {
                self.def_eq_binding(a, b).map(Some)
            }
            (Expr::Lam { .. }, _) => self.def_eq_eta(a, b).map(Some),
            (_, Expr::Lam { .. }) => self.def_eq_eta(b, a).map(Some),
            _ => Ok(None),
        }
    }

    fn def_eq_binding(&mut self, a: &Expr, b: &Expr) -> MetaResult<bool> {
        let (
            Expr::Lam {
                name,
                info,
                ty: t1,
                body: b1,
            }
            | Expr::Pi {
                name,
                info,
                ty: t1,
                body: b1,
            },
            Expr::Lam { ty: t2, body: b2, .. } | Expr::Pi { ty: t2, body: b2, .. },
        ) = (a, b)
        else {
            return Ok(false);
        };
        if !self.def_eq(t1, t2)? {
            return Ok(false);
        }
        let x = self.mk_local_decl(name.clone(), *info, (**t1).clone());
        self.def_eq(&b1.instantiate1(&x), &b2.instantiate1(&x))
    }

    /// `fun x => t ≡ s` iff `t ≡ s x`.
    fn def_eq_eta(&mut self, lam: &Expr, other: &Expr) -> MetaResult<bool> {
        let Expr::Lam {
            name,
            info,
            ty,
            body,
        } = lam
        else {
            return Ok(false);
        };
        let x = self.mk_local_decl(name.clone(), *info, (**ty).clone());
        let applied = Expr::app(other.clone(), x.clone());
        self.def_eq(&body.instantiate1(&x), &applied)
    }

    /// `PProd.mk α β p q ≡ s` iff `p ≡ s.1` and `q ≡ s.2`.
    fn def_eq_pprod_eta(&mut self, mk: &Expr, other: &Expr) -> MetaResult<Option<bool>> {
        if !mk.is_app_of(names::PPROD_MK, 4) || other.is_app_of(names::PPROD_MK, 4) {
            return Ok(None);
        }
        let levels = mk.const_levels().cloned().unwrap_or_default();
        let args = mk.get_app_args();
        let proj = |n: &str| {
            Expr::mk_app(
                Expr::Const(n.into(), levels.clone()),
                [args[0].clone(), args[1].clone(), other.clone()],
            )
        };
        let (fst, snd) = (proj(names::PPROD_FST), proj(names::PPROD_SND));
        Ok(Some(self.def_eq(&args[2], &fst)? && self.def_eq(&args[3], &snd)?))
    }

    fn def_eq_proof_irrel(&mut self, a: &Expr, b: &Expr) -> MetaResult<bool> {
        let Ok(ta) = self.infer_type(a) else {
            return Ok(false);
        };
        if !self.is_prop(&ta).unwrap_or(false) {
            return Ok(false);
        }
        let Ok(tb) = self.infer_type(b) else {
            return Ok(false);
        };
        self.def_eq(&ta, &tb)
    }

    fn same_const_head(&mut self, a: &Expr, b: &Expr) -> bool {
        match (a.get_app_fn(), b.get_app_fn()) {
            (Expr::Const(n1, ls1), Expr::Const(n2, ls2)) => {
                n1 == n2
                    && ls1.len() == ls2.len()
                    && a.get_app_num_args() == b.get_app_num_args()
                    && ls1
                        .iter()
                        .zip(ls2.iter())
                        .all(|(l1, l2)| self.is_level_def_eq(l1, l2))
            }
            _ => false,
        }
    }

    /// Pairwise argument comparison, rolled back as a whole on failure.
    fn try_args(&mut self, a: &Expr, b: &Expr) -> MetaResult<bool> {
        let saved = self.save_state();
        for (x, y) in a.get_app_args().iter().zip(b.get_app_args().iter()) {
            if !self.def_eq(x, y)? {
                self.restore_state(saved);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn assign_mvar(&mut self, m: MVarId, value: &Expr) -> MetaResult<bool> {
        let value = self.instantiate_mvars(value);
        if value == Expr::mvar(m) {
            return Ok(true);
        }
        let Some(decl) = self.mctx.get(m).cloned() else {
            return Ok(false);
        };
        let occurs = value.find(&mut |e| matches!(e, Expr::MVar(x) if *x == m));
        let escapes = value.find(&mut |e| matches!(e, Expr::FVar(x) if x.raw() >= decl.scope));
        if occurs || escapes || value.has_loose_bvars() {
            return Ok(false);
        }
        let Ok(value_ty) = self.infer_type(&value) else {
            return Ok(false);
        };
        if !self.def_eq(&decl.ty, &value_ty)? {
            return Ok(false);
        }
        log::trace!("assigned {} := {}", m, self.pp(&value));
        self.mctx.assign(m, value);
        Ok(true)
    }

    fn level_def_eq(&mut self, a: &Level, b: &Level) -> bool {
        let a = self.mctx.instantiate_level(a);
        let b = self.mctx.instantiate_level(b);
        if a.is_equiv(&b) {
            return true;
        }
        match (&a, &b) {
            (Level::MVar(m), other) | (other, Level::MVar(m)) => self.assign_level(*m, other),
            (Level::Succ(x), Level::Succ(y)) => self.level_def_eq(x, y),
            (Level::Max(a1, b1), Level::Max(a2, b2))
            | (Level::IMax(a1, b1), Level::IMax(a2, b2)) => {
                self.level_def_eq(a1, a2) && self.level_def_eq(b1, b2)
            }
            _ => false,
        }
    }

    fn assign_level(&mut self, m: LMVarId, value: &Level) -> bool {
        let mut occurs = false;
        value.replace(&mut |l| {
            if *l == Level::MVar(m) {
                occurs = true;
            }
            None
        });
        if occurs {
            return false;
        }
        self.mctx.assign_level(m, value.clone());
        true
    }
}
