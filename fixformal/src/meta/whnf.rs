//! Weak head normalization.
//!
//! `whnf_core` performs beta reduction, metavariable instantiation at the head
//! and projection reduction (`PProd.fst/snd` of `PProd.mk`, `And.left/right`
//! of `And.intro`). `whnf` additionally unfolds definitions (delta).

use super::MetaCtx;
use crate::{builtins::names, error::MetaResult, expr::Expr};

/// Projections the reducer knows about: (projection, constructor, field).
const PROJECTIONS: [(&str, &str, usize); 4] = [
    (names::PPROD_FST, names::PPROD_MK, 0),
    (names::PPROD_SND, names::PPROD_MK, 1),
    (names::AND_LEFT, names::AND_INTRO, 0),
    (names::AND_RIGHT, names::AND_INTRO, 1),
];

/// Projections take the two type parameters and then the major premise.
const PROJ_MAJOR_IDX: usize = 2;
/// Constructors take the two type parameters and then the fields.
const CTOR_NUM_PARAMS: usize = 2;

impl MetaCtx {
    /// Beta, projection and metavariable reduction at the head, no delta.
    pub fn whnf_core(&self, e: &Expr) -> Expr {
        self.whnf_step_loop(e, false)
    }

    /// Full weak head normal form.
    pub fn whnf(&self, e: &Expr) -> MetaResult<Expr> {
        let mut cur = self.whnf_step_loop(e, true);
        while let Some(unfolded) = self.unfold_definition(&cur) {
            cur = self.whnf_step_loop(&unfolded, true);
        }
        Ok(cur)
    }

    /// Reduce until the head is a constant accepted by `stop`, unfolding
    /// definitions one at a time. Returns `None` when the term gets stuck on
    /// any other head.
    pub fn whnf_until(&self, e: &Expr, stop: impl Fn(&str) -> bool) -> Option<Expr> {
        let mut cur = self.whnf_core(e);
        loop {
            if cur.const_name().is_some_and(|n| stop(n.as_str())) {
                return Some(cur);
            }
            let unfolded = self.unfold_definition(&cur)?;
            cur = self.whnf_core(&unfolded);
        }
    }

    /// Unfold the head constant once, if it is a definition.
    pub fn unfold_definition(&self, e: &Expr) -> Option<Expr> {
        let Expr::Const(name, levels) = e.get_app_fn() else {
            return None;
        };
        let info = self.env.find(name)?;
        if !info.kind.is_definition() {
            return None;
        }
        let value = info.instantiate_value(levels).ok()??;
        Some(Expr::beta(&value, &e.get_app_args()))
    }

    /// Height of the head definition, used to pick the side to unfold in lazy
    /// delta reduction.
    pub(crate) fn head_height(&self, e: &Expr) -> Option<u32> {
        let Expr::Const(name, _) = e.get_app_fn() else {
            return None;
        };
        self.env.find(name)?.height()
    }

    fn whnf_step_loop(&self, e: &Expr, delta: bool) -> Expr {
        let mut cur = e.clone();
        loop {
            match self.whnf_step(&cur, delta) {
                Some(next) => cur = next,
                None => return cur,
            }
        }
    }

    fn whnf_step(&self, e: &Expr, delta: bool) -> Option<Expr> {
        match e {
            Expr::MVar(m) => self.mctx.assignment(*m).cloned(),
            Expr::App(..) => {
                let head = e.get_app_fn();
                match head {
                    Expr::Lam { .. } => Some(e.head_beta()),
                    Expr::MVar(m) => {
                        let value = self.mctx.assignment(*m)?;
                        Some(Expr::beta(value, &e.get_app_args()))
                    }
                    Expr::Const(name, _) => self.reduce_projection(name.as_str(), e, delta),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn reduce_projection(&self, proj: &str, e: &Expr, delta: bool) -> Option<Expr> {
        let (_, ctor, field) = PROJECTIONS.iter().find(|(p, _, _)| *p == proj)?;
        let args = e.get_app_args();
        let major = args.get(PROJ_MAJOR_IDX)?;
        let major = if delta {
            self.whnf(major).ok()?
        } else {
            self.whnf_step_loop(major, false)
        };
        if !major.is_app_of(ctor, CTOR_NUM_PARAMS + 2) {
            return None;
        }
        let value = major.get_app_args().swap_remove(CTOR_NUM_PARAMS + field);
        Some(Expr::mk_app(value, args[PROJ_MAJOR_IDX + 1..].iter().cloned()))
    }
}
