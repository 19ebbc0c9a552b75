//! Locally nameless expressions.
//!
//! Role
//! - Terms, types and proofs share one representation: [`Expr`].
//! - Bound variables are de Bruijn indices ([`Expr::BVar`]); variables opened by
//!   a telescope become free variables ([`Expr::FVar`]) registered in a local
//!   context. Holes to be filled by unification are [`Expr::MVar`].
//!
//! Performance
//! - Children are shared through `Arc`, so cloning an expression is O(1).
//! - Traversals are plain recursive rebuilds; unchanged subtrees are re-shared
//!   rather than copied.
//!
//! Equality semantics
//! - The derived `PartialEq` is syntactic and includes binder names. Use
//!   `MetaCtx::is_def_eq` for definitional equality.

pub mod pretty;

use std::sync::Arc;

use smallvec::SmallVec;
use strum::{Display, EnumIs};

use crate::{
    level::Level,
    name::Name,
    variable::{FVarId, LMVarId, MVarId},
};

/// Universe arguments of a constant; almost always zero, one or two.
pub type LevelVec = SmallVec<[Level; 2]>;

/// How a binder is supplied at application sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIs, Display)]
pub enum BinderInfo {
    #[default]
    Default,
    Implicit,
    InstImplicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum Expr {
    /// Bound variable, as a de Bruijn index.
    BVar(u32),
    /// Free variable introduced by a telescope.
    FVar(FVarId),
    /// Expression metavariable.
    MVar(MVarId),
    /// `Sort l`; `Sort 0` is `Prop`.
    Sort(Level),
    /// Global constant with universe arguments.
    Const(Name, LevelVec),
    App(Arc<Expr>, Arc<Expr>),
    Lam {
        name: Name,
        info: BinderInfo,
        ty: Arc<Expr>,
        body: Arc<Expr>,
    },
    Pi {
        name: Name,
        info: BinderInfo,
        ty: Arc<Expr>,
        body: Arc<Expr>,
    },
}

impl Expr {
    // ======================== Constructors ========================

    pub fn bvar(idx: u32) -> Self {
        Expr::BVar(idx)
    }

    pub fn fvar(id: FVarId) -> Self {
        Expr::FVar(id)
    }

    pub fn mvar(id: MVarId) -> Self {
        Expr::MVar(id)
    }

    pub fn sort(level: Level) -> Self {
        Expr::Sort(level)
    }

    pub fn prop() -> Self {
        Expr::Sort(Level::zero())
    }

    /// `Type u`, i.e. `Sort (u+1)`.
    pub fn type_u(level: Level) -> Self {
        Expr::Sort(level.succ())
    }

    pub fn constant(name: impl Into<Name>, levels: impl IntoIterator<Item = Level>) -> Self {
        Expr::Const(name.into(), levels.into_iter().collect())
    }

    pub fn app(f: Expr, arg: Expr) -> Self {
        Expr::App(Arc::new(f), Arc::new(arg))
    }

    /// `f a₁ … aₙ`.
    pub fn mk_app(f: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter().fold(f, Expr::app)
    }

    pub fn lam(name: impl Into<Name>, info: BinderInfo, ty: Expr, body: Expr) -> Self {
        Expr::Lam {
            name: name.into(),
            info,
            ty: Arc::new(ty),
            body: Arc::new(body),
        }
    }

    pub fn pi(name: impl Into<Name>, info: BinderInfo, ty: Expr, body: Expr) -> Self {
        Expr::Pi {
            name: name.into(),
            info,
            ty: Arc::new(ty),
            body: Arc::new(body),
        }
    }

    /// Non-dependent arrow `a → b`. `b` must not contain loose bound variables.
    pub fn arrow(a: Expr, b: Expr) -> Self {
        debug_assert!(!b.has_loose_bvars(), "arrow codomain has loose bound variables");
        Expr::pi("a", BinderInfo::Default, a, b)
    }

    // ======================== Inspection ========================

    /// Head of an application spine (`f` in `f a b`).
    pub fn get_app_fn(&self) -> &Expr {
        let mut cur = self;
        while let Expr::App(f, _) = cur {
            cur = f;
        }
        cur
    }

    /// Arguments of an application spine, first to last.
    pub fn get_app_args(&self) -> Vec<Expr> {
        let mut args = Vec::new();
        let mut cur = self;
        while let Expr::App(f, a) = cur {
            args.push((**a).clone());
            cur = f;
        }
        args.reverse();
        args
    }

    pub fn get_app_num_args(&self) -> usize {
        let mut n = 0;
        let mut cur = self;
        while let Expr::App(f, _) = cur {
            n += 1;
            cur = f;
        }
        n
    }

    /// Name of the head constant, if the spine is headed by one.
    pub fn const_name(&self) -> Option<&Name> {
        match self.get_app_fn() {
            Expr::Const(n, _) => Some(n),
            _ => None,
        }
    }

    /// Universe arguments of the head constant.
    pub fn const_levels(&self) -> Option<&LevelVec> {
        match self.get_app_fn() {
            Expr::Const(_, ls) => Some(ls),
            _ => None,
        }
    }

    /// `true` when `self` is `c a₁ … aₙ` for the given constant and arity.
    pub fn is_app_of(&self, name: &str, nargs: usize) -> bool {
        self.const_name().is_some_and(|n| n == name) && self.get_app_num_args() == nargs
    }

    pub fn fvar_id(&self) -> Option<FVarId> {
        match self {
            Expr::FVar(id) => Some(*id),
            _ => None,
        }
    }

    pub fn sort_level(&self) -> Option<&Level> {
        match self {
            Expr::Sort(l) => Some(l),
            _ => None,
        }
    }

    pub fn binding_body(&self) -> Option<&Expr> {
        match self {
            Expr::Lam { body, .. } | Expr::Pi { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn binding_domain(&self) -> Option<&Expr> {
        match self {
            Expr::Lam { ty, .. } | Expr::Pi { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// One past the largest loose bound variable index (0 when closed).
    pub fn loose_bvar_range(&self) -> u32 {
        match self {
            Expr::BVar(i) => i + 1,
            Expr::FVar(_) | Expr::MVar(_) | Expr::Sort(_) | Expr::Const(..) => 0,
            Expr::App(f, a) => f.loose_bvar_range().max(a.loose_bvar_range()),
            Expr::Lam { ty, body, .. } | Expr::Pi { ty, body, .. } => ty
                .loose_bvar_range()
                .max(body.loose_bvar_range().saturating_sub(1)),
        }
    }

    pub fn has_loose_bvars(&self) -> bool {
        self.loose_bvar_range() > 0
    }

    /// `true` when bound variable `idx` (relative to `self`) occurs.
    pub fn has_loose_bvar(&self, idx: u32) -> bool {
        match self {
            Expr::BVar(i) => *i == idx,
            Expr::FVar(_) | Expr::MVar(_) | Expr::Sort(_) | Expr::Const(..) => false,
            Expr::App(f, a) => f.has_loose_bvar(idx) || a.has_loose_bvar(idx),
            Expr::Lam { ty, body, .. } | Expr::Pi { ty, body, .. } => {
                ty.has_loose_bvar(idx) || body.has_loose_bvar(idx + 1)
            }
        }
    }

    /// `true` when some subterm satisfies `pred`.
    pub fn find(&self, pred: &mut impl FnMut(&Expr) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            Expr::App(f, a) => f.find(pred) || a.find(pred),
            Expr::Lam { ty, body, .. } | Expr::Pi { ty, body, .. } => {
                ty.find(pred) || body.find(pred)
            }
            _ => false,
        }
    }

    pub fn has_fvar(&self, id: FVarId) -> bool {
        self.find(&mut |e| matches!(e, Expr::FVar(x) if *x == id))
    }

    pub fn has_any_fvar(&self) -> bool {
        self.find(&mut |e| matches!(e, Expr::FVar(_)))
    }

    /// `true` when an expression or level metavariable occurs.
    pub fn has_mvar(&self) -> bool {
        self.find(&mut |e| match e {
            Expr::MVar(_) => true,
            Expr::Sort(l) => l.has_mvar(),
            Expr::Const(_, ls) => ls.iter().any(Level::has_mvar),
            _ => false,
        })
    }

    /// Largest free variable or metavariable id mentioned, if any.
    pub fn max_local_id(&self) -> Option<u64> {
        let mut best: Option<u64> = None;
        self.find(&mut |e| {
            let id = match e {
                Expr::FVar(id) => Some(id.raw()),
                Expr::MVar(id) => Some(id.raw()),
                _ => None,
            };
            if let Some(id) = id {
                best = Some(best.map_or(id, |b| b.max(id)));
            }
            false
        });
        best
    }

    /// Append every universe parameter occurring in the expression to `acc`,
    /// in order of first occurrence.
    pub fn collect_level_params(&self, acc: &mut Vec<Name>) {
        self.find(&mut |e| {
            match e {
                Expr::Sort(l) => l.collect_params(acc),
                Expr::Const(_, ls) => ls.iter().for_each(|l| l.collect_params(acc)),
                _ => {}
            }
            false
        });
    }

    // ======================== Rewriting ========================

    /// Rebuild the expression bottom-up. `f` receives each subterm together
    /// with the number of binders crossed so far; returning `Some` replaces the
    /// subterm without visiting its children.
    pub fn replace(&self, f: &mut impl FnMut(&Expr, u32) -> Option<Expr>) -> Expr {
        self.replace_at(0, f)
    }

    fn replace_at(&self, depth: u32, f: &mut impl FnMut(&Expr, u32) -> Option<Expr>) -> Expr {
        if let Some(r) = f(self, depth) {
            return r;
        }
        match self {
            Expr::BVar(_) | Expr::FVar(_) | Expr::MVar(_) | Expr::Sort(_) | Expr::Const(..) => {
                self.clone()
            }
            Expr::App(fun, arg) => {
                let nf = fun.replace_at(depth, f);
                let na = arg.replace_at(depth, f);
                if nf == **fun && na == **arg {
                    self.clone()
                } else {
                    Expr::app(nf, na)
                }
            }
            Expr::Lam {
                name,
                info,
                ty,
                body,
            } => Expr::lam(
                name.clone(),
                *info,
                ty.replace_at(depth, f),
                body.replace_at(depth + 1, f),
            ),
            Expr::Pi {
                name,
                info,
                ty,
                body,
            } => Expr::pi(
                name.clone(),
                *info,
                ty.replace_at(depth, f),
                body.replace_at(depth + 1, f),
            ),
        }
    }

    /// Replace loose `BVar(i)` by `subst[n-1-i]`, where `n = subst.len()`.
    /// Loose indices beyond the substitution are lowered by `n`.
    ///
    /// This is the inverse of [`Expr::abstract_fvars`]: instantiating a body
    /// abstracted over `[x₁ … xₙ]` with `[x₁ … xₙ]` gives it back. Loose bound
    /// variables of the substituted terms are lifted over the binders they
    /// end up under.
    pub fn instantiate_rev(&self, subst: &[Expr]) -> Expr {
        if subst.is_empty() || !self.has_loose_bvars() {
            return self.clone();
        }
        let n = subst.len() as u32;
        self.replace(&mut |e, depth| match e {
            Expr::BVar(i) if *i >= depth => {
                let k = i - depth;
                if k < n {
                    Some(subst[(n - 1 - k) as usize].lift_loose_bvars(depth))
                } else {
                    Some(Expr::BVar(i - n))
                }
            }
            _ if e.loose_bvar_range() <= depth => Some(e.clone()),
            _ => None,
        })
    }

    /// Add `amount` to every loose bound variable.
    pub fn lift_loose_bvars(&self, amount: u32) -> Expr {
        if amount == 0 || !self.has_loose_bvars() {
            return self.clone();
        }
        self.replace(&mut |e, depth| match e {
            Expr::BVar(i) if *i >= depth => Some(Expr::BVar(i + amount)),
            _ if e.loose_bvar_range() <= depth => Some(e.clone()),
            _ => None,
        })
    }

    /// Substitute the outermost loose bound variable.
    pub fn instantiate1(&self, value: &Expr) -> Expr {
        self.instantiate_rev(std::slice::from_ref(value))
    }

    /// Replace the free variables `fvars` by bound variables, the last one
    /// becoming `BVar(0)`.
    pub fn abstract_fvars(&self, fvars: &[FVarId]) -> Expr {
        if fvars.is_empty() {
            return self.clone();
        }
        let n = fvars.len() as u32;
        self.replace(&mut |e, depth| match e {
            Expr::FVar(id) => fvars
                .iter()
                .rposition(|x| x == id)
                .map(|pos| Expr::BVar(depth + n - 1 - pos as u32))
                .or_else(|| Some(e.clone())),
            _ => None,
        })
    }

    /// Substitute universe parameters in every `Sort` and constant.
    pub fn instantiate_level_params(&self, params: &[Name], levels: &[Level]) -> Expr {
        if params.is_empty() {
            return self.clone();
        }
        self.replace(&mut |e, _| match e {
            Expr::Sort(l) => Some(Expr::Sort(l.instantiate_params(params, levels))),
            Expr::Const(n, ls) => Some(Expr::Const(
                n.clone(),
                ls.iter()
                    .map(|l| l.instantiate_params(params, levels))
                    .collect(),
            )),
            _ => None,
        })
    }

    /// Substitute level metavariables using `lookup`.
    pub fn instantiate_level_mvars(&self, lookup: &impl Fn(LMVarId) -> Option<Level>) -> Expr {
        let mut on_level = |l: &Level| match l {
            Level::MVar(m) => lookup(*m),
            _ => None,
        };
        self.replace(&mut |e, _| match e {
            Expr::Sort(l) if l.has_mvar() => Some(Expr::Sort(l.replace(&mut on_level))),
            Expr::Const(n, ls) if ls.iter().any(Level::has_mvar) => Some(Expr::Const(
                n.clone(),
                ls.iter().map(|l| l.replace(&mut on_level)).collect(),
            )),
            _ => None,
        })
    }

    // ======================== Reduction helpers ========================

    /// Beta-reduce `f` applied to `args`, consuming as many leading lambdas as
    /// there are arguments.
    pub fn beta(f: &Expr, args: &[Expr]) -> Expr {
        let mut body = f;
        let mut consumed = 0;
        while consumed < args.len() {
            match body {
                Expr::Lam { body: b, .. } => {
                    body = b;
                    consumed += 1;
                }
                _ => break,
            }
        }
        let reduced = body.instantiate_rev(&args[..consumed]);
        Expr::mk_app(reduced, args[consumed..].iter().cloned())
    }

    /// Reduce a head beta-redex, repeatedly.
    pub fn head_beta(&self) -> Expr {
        let f = self.get_app_fn();
        if !f.is_lam() || !self.is_app() {
            return self.clone();
        }
        Expr::beta(f, &self.get_app_args()).head_beta()
    }

    /// Beta-reduce every redex in the expression.
    pub fn beta_reduce(&self) -> Expr {
        self.replace(&mut |e, _| {
            if e.is_app() && e.get_app_fn().is_lam() {
                Some(e.head_beta().beta_reduce())
            } else {
                None
            }
        })
    }

    /// Eta-reduce `fun x => f x` (with `x` not free in `f`) to `f`, repeatedly.
    pub fn eta(&self) -> Expr {
        let Expr::Lam { body, .. } = self else {
            return self.clone();
        };
        let inner = body.eta();
        match &inner {
            Expr::App(f, a) if matches!(**a, Expr::BVar(0)) && !f.has_loose_bvar(0) => {
                f.instantiate1(&Expr::prop())
            }
            _ => self.clone(),
        }
    }
}

impl From<FVarId> for Expr {
    fn from(id: FVarId) -> Self {
        Expr::FVar(id)
    }
}

impl From<MVarId> for Expr {
    fn from(id: MVarId) -> Self {
        Expr::MVar(id)
    }
}
