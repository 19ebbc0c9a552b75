//! Fixtures for tests and benchmarks: a small object prelude and a miniature
//! compiler turning groups of `Option`-valued functions into `fix`
//! applications the way a function package would.

use std::sync::Arc;

use fixformal::{
    builtins::install_builtins,
    env::{ConstantInfo, Environment},
    error::MetaResult,
    expr::{BinderInfo, Expr},
    level::Level,
    meta::MetaCtx,
    name::Name,
};

use crate::{
    error::DeriveResult,
    order::{
        install_order_library,
        names::{FIX, INST_DUAL, INST_OPTION, INST_PI, INST_PPROD, MONOTONE},
    },
    pprod::{mk_pack, mk_pack_type, mk_proj},
    registry::{FixedParamPerm, FixpointInfo, FixpointRegistry, OrderKind},
};

pub const NAT: &str = "Nat";
pub const NAT_ZERO: &str = "Nat.zero";
pub const NAT_SUCC: &str = "Nat.succ";
pub const NAT_PRED: &str = "Nat.pred";
pub const NAT_BEQ: &str = "Nat.beq";
pub const BOOL: &str = "Bool";
pub const BOOL_TRUE: &str = "Bool.true";
pub const BOOL_FALSE: &str = "Bool.false";
pub const COND: &str = "cond";

/// Environment with the builtins, the order library and the object prelude.
pub fn test_env() -> Environment {
    let env = Environment::new();
    install_builtins(&env).unwrap();
    install_order_library(&env).unwrap();
    install_prelude(&env).unwrap();
    env
}

/// `Nat`, `Bool` and a few opaque operations on them.
pub fn install_prelude(env: &Environment) -> MetaResult<()> {
    let mut ctx = MetaCtx::new(env.clone());
    let ty0 = Expr::type_u(Level::zero());
    let (nat, bool_) = (self::nat(), self::bool_());
    for (name, ty) in [
        (NAT, ty0.clone()),
        (BOOL, ty0),
        (NAT_ZERO, nat.clone()),
        (NAT_SUCC, Expr::arrow(nat.clone(), nat.clone())),
        (NAT_PRED, Expr::arrow(nat.clone(), nat.clone())),
        (
            NAT_BEQ,
            Expr::arrow(nat.clone(), Expr::arrow(nat, bool_.clone())),
        ),
        (BOOL_TRUE, bool_.clone()),
        (BOOL_FALSE, bool_.clone()),
    ] {
        ctx.add_decl(ConstantInfo::axiom(name, vec![], ty))?;
    }

    let u = Level::param("u");
    let alpha = ctx.mk_local_decl("α", BinderInfo::Implicit, Expr::sort(u));
    let c = ctx.mk_local_decl("c", BinderInfo::Default, bool_);
    let t = ctx.mk_local_decl("t", BinderInfo::Default, alpha.clone());
    let e = ctx.mk_local_decl("e", BinderInfo::Default, alpha.clone());
    let cond_ty = ctx.mk_forall_fvars(&[alpha.clone(), c, t, e], &alpha)?;
    ctx.add_decl(ConstantInfo::axiom(COND, vec![Name::new("u")], cond_ty))?;
    Ok(())
}

pub fn nat() -> Expr {
    Expr::constant(NAT, [])
}

pub fn bool_() -> Expr {
    Expr::constant(BOOL, [])
}

pub fn zero() -> Expr {
    Expr::constant(NAT_ZERO, [])
}

pub fn tt() -> Expr {
    Expr::constant(BOOL_TRUE, [])
}

pub fn ff() -> Expr {
    Expr::constant(BOOL_FALSE, [])
}

pub fn pred(n: &Expr) -> Expr {
    Expr::app(Expr::constant(NAT_PRED, []), n.clone())
}

pub fn succ(n: &Expr) -> Expr {
    Expr::app(Expr::constant(NAT_SUCC, []), n.clone())
}

pub fn beq(a: &Expr, b: &Expr) -> Expr {
    Expr::mk_app(Expr::constant(NAT_BEQ, []), [a.clone(), b.clone()])
}

/// `cond c t e`.
pub fn cond(ctx: &mut MetaCtx, c: &Expr, t: &Expr, e: &Expr) -> MetaResult<Expr> {
    ctx.mk_app_m(COND, &[c.clone(), t.clone(), e.clone()])
}

/// Locals and recursive calls available to a member body.
pub struct BodyArgs<'a> {
    pub fixed: &'a [Expr],
    pub params: &'a [Expr],
    /// Member `j` of the group applied to the fixed parameters.
    pub rec: &'a [Expr],
}

impl BodyArgs<'_> {
    /// `rec[j] args`, beta-reduced at the head.
    pub fn call(&self, j: usize, args: &[Expr]) -> Expr {
        Expr::mk_app(self.rec[j].clone(), args.iter().cloned()).head_beta()
    }
}

type TermFn = Box<dyn Fn(&mut MetaCtx, &[Expr], &[Expr]) -> MetaResult<Expr>>;
type BodyFn = Box<dyn Fn(&mut MetaCtx, &BodyArgs<'_>) -> MetaResult<Expr>>;

enum Slot {
    Fixed(usize),
    Varying(Name, TermFn),
}

/// One function of a group: `name params : Option elem := body`.
pub struct MemberDef {
    name: Name,
    kind: OrderKind,
    slots: Vec<Slot>,
    elem: Option<TermFn>,
    body: Option<BodyFn>,
    dual_outermost: bool,
}

impl MemberDef {
    pub fn new(name: impl Into<Name>, kind: OrderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            slots: Vec::new(),
            elem: None,
            body: None,
            dual_outermost: false,
        }
    }

    /// A varying parameter whose type is computed from the fixed parameters
    /// and the varying parameters declared before it.
    pub fn param(
        mut self,
        name: impl Into<Name>,
        ty: impl Fn(&mut MetaCtx, &[Expr], &[Expr]) -> MetaResult<Expr> + 'static,
    ) -> Self {
        self.slots.push(Slot::Varying(name.into(), Box::new(ty)));
        self
    }

    /// Place the `k`-th fixed parameter of the group here. Members that place
    /// none take every fixed parameter first.
    pub fn fixed(mut self, k: usize) -> Self {
        self.slots.push(Slot::Fixed(k));
        self
    }

    pub fn returns(
        mut self,
        elem: impl Fn(&mut MetaCtx, &[Expr], &[Expr]) -> MetaResult<Expr> + 'static,
    ) -> Self {
        self.elem = Some(Box::new(elem));
        self
    }

    pub fn body(mut self, body: impl Fn(&mut MetaCtx, &BodyArgs<'_>) -> MetaResult<Expr> + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Reverse the order of the whole function space instead of its `Option`
    /// codomain. Only meaningful for inductive members.
    pub fn dual_outermost(mut self) -> Self {
        self.dual_outermost = true;
        self
    }
}

/// A member after its parameters have been opened.
struct Opened {
    /// Parameters in declaration order, fixed ones included.
    params: Vec<Expr>,
    ys: Vec<Expr>,
    option: Expr,
    perm: FixedParamPerm,
    ty: Expr,
    inst: Expr,
}

/// Compiles a group of mutually recursive functions into one fixpoint.
pub struct FixpointBuilder {
    env: Environment,
    level_params: Vec<Name>,
    fixed: Vec<(Name, BinderInfo, TermFn)>,
    members: Vec<MemberDef>,
}

impl FixpointBuilder {
    pub fn new(env: &Environment) -> Self {
        Self {
            env: env.clone(),
            level_params: Vec::new(),
            fixed: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn level_param(mut self, name: impl Into<Name>) -> Self {
        self.level_params.push(name.into());
        self
    }

    /// A parameter shared by every call, typed over the fixed parameters
    /// declared before it.
    pub fn fixed(
        mut self,
        name: impl Into<Name>,
        info: BinderInfo,
        ty: impl Fn(&mut MetaCtx, &[Expr], &[Expr]) -> MetaResult<Expr> + 'static,
    ) -> Self {
        self.fixed.push((name.into(), info, Box::new(ty)));
        self
    }

    pub fn member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    fn levels(&self) -> Vec<Level> {
        self.level_params.iter().cloned().map(Level::param).collect()
    }

    fn open_member(&self, ctx: &mut MetaCtx, xs: &[Expr], member: &MemberDef) -> MetaResult<Opened> {
        let leading: Vec<Slot> = if member.slots.iter().any(|s| matches!(s, Slot::Fixed(_))) {
            Vec::new()
        } else {
            (0..xs.len()).map(Slot::Fixed).collect()
        };
        let mut params = Vec::new();
        let mut ys = Vec::new();
        let mut positions = Vec::new();
        for slot in leading.iter().chain(&member.slots) {
            match slot {
                Slot::Fixed(k) => {
                    params.push(xs[*k].clone());
                    positions.push(Some(*k));
                }
                Slot::Varying(name, ty) => {
                    let ty = ty(ctx, xs, &ys)?;
                    let y = ctx.mk_local_decl(name.clone(), BinderInfo::Default, ty);
                    params.push(y.clone());
                    ys.push(y);
                    positions.push(None);
                }
            }
        }

        let elem = match &member.elem {
            Some(elem) => elem(ctx, xs, &ys)?,
            None => nat(),
        };
        let option = ctx.mk_option(&elem)?;
        let flat = ctx.mk_app_m(INST_OPTION, &[elem])?;
        let mut inst = if member.kind.is_inductive() && !member.dual_outermost {
            ctx.mk_app_m(INST_DUAL, &[option.clone(), flat])?
        } else {
            flat
        };
        let mut ty = option.clone();
        for y in ys.iter().rev() {
            let y_slice = std::slice::from_ref(y);
            let domain = ctx.local_decl(y)?.ty.clone();
            let codomain_fn = ctx.mk_lambda_fvars(y_slice, &ty)?;
            let inst_fn = ctx.mk_lambda_fvars(y_slice, &inst)?;
            inst = ctx.mk_app_m(INST_PI, &[domain, codomain_fn, inst_fn])?;
            ty = ctx.mk_forall_fvars(y_slice, &ty)?;
        }
        if member.kind.is_inductive() && member.dual_outermost {
            inst = ctx.mk_app_m(INST_DUAL, &[ty.clone(), inst])?;
        }
        Ok(Opened {
            params,
            ys,
            option,
            perm: FixedParamPerm::new(positions),
            ty,
            inst,
        })
    }

    /// Declare the group and register it in `registry`.
    ///
    /// For members `f₁ … fₙ` this adds `fᵢ := fun params => (fix α inst F
    /// hmono).i ys`, the monotonicity axiom `f₁.mono` and the equation lemmas
    /// `fᵢ.eq_1`.
    pub fn compile(self, registry: &FixpointRegistry) -> DeriveResult<Arc<FixpointInfo>> {
        let mut ctx = MetaCtx::new(self.env.clone());
        let levels = self.levels();
        let n = self.members.len();

        let mut xs = Vec::with_capacity(self.fixed.len());
        for (name, info, ty) in &self.fixed {
            let ty = ty(&mut ctx, &xs, &[])?;
            xs.push(ctx.mk_local_decl(name.clone(), *info, ty));
        }
        let opened = self
            .members
            .iter()
            .map(|m| self.open_member(&mut ctx, &xs, m))
            .collect::<MetaResult<Vec<_>>>()?;

        let types: Vec<Expr> = opened.iter().map(|o| o.ty.clone()).collect();
        let alpha = mk_pack_type(&mut ctx, &types)?;
        let mut inst = opened[n - 1].inst.clone();
        let mut packed_ty = opened[n - 1].ty.clone();
        for o in opened[..n - 1].iter().rev() {
            inst = ctx.mk_app_m(INST_PPROD, &[o.ty.clone(), packed_ty.clone(), o.inst.clone(), inst])?;
            packed_ty = ctx.mk_pprod(&o.ty, &packed_ty)?;
        }

        let p = ctx.mk_local_decl("p", BinderInfo::Default, alpha.clone());
        let recs = (0..n)
            .map(|j| mk_proj(&mut ctx, n, j, &p))
            .collect::<DeriveResult<Vec<_>>>()?;
        let mut lams = Vec::with_capacity(n);
        for (m, o) in self.members.iter().zip(&opened) {
            let body = run_body(&mut ctx, m, &xs, &o.ys, &recs)?;
            lams.push(ctx.mk_lambda_fvars(&o.ys, &body)?);
        }
        let packed = mk_pack(&mut ctx, &lams)?;
        let step = ctx.mk_lambda_fvars(&[p], &packed)?;

        let mono_name = self.members[0].name.str("mono");
        let mono_ty = ctx.mk_app_m(MONOTONE, &[alpha.clone(), inst.clone(), step.clone()])?;
        let mono_ty = ctx.mk_forall_fvars(&xs, &mono_ty)?;
        ctx.add_decl(ConstantInfo::axiom(
            mono_name.clone(),
            self.level_params.clone(),
            mono_ty,
        ))?;
        let hmono = Expr::mk_app(Expr::constant(mono_name, levels.iter().cloned()), xs.iter().cloned());
        let fix = ctx.mk_app_m(FIX, &[alpha, inst, step, hmono])?;

        for (i, (m, o)) in self.members.iter().zip(&opened).enumerate() {
            let ty = ctx.mk_forall_fvars(&o.params, &o.option)?;
            let member = mk_proj(&mut ctx, n, i, &fix)?;
            let value = Expr::mk_app(member, o.ys.iter().cloned());
            let value = ctx.mk_lambda_fvars(&o.params, &value)?;
            ctx.add_decl(ConstantInfo::definition(
                m.name.clone(),
                self.level_params.clone(),
                ty,
                value,
            ))?;
        }

        let mut consts = Vec::with_capacity(n);
        for (m, o) in self.members.iter().zip(&opened) {
            let f = Expr::constant(m.name.clone(), levels.iter().cloned());
            let ty = ctx.env().get(&m.name)?.ty.clone();
            consts.push(o.perm.apply_fixed(&mut ctx, &f, &ty, &xs)?);
        }
        let mut eqn_lemmas = Vec::with_capacity(n);
        for (m, o) in self.members.iter().zip(&opened) {
            let lhs = Expr::mk_app(
                Expr::constant(m.name.clone(), levels.iter().cloned()),
                o.params.iter().cloned(),
            );
            let rhs = run_body(&mut ctx, m, &xs, &o.ys, &consts)?.beta_reduce();
            let eq = ctx.mk_eq(&lhs, &rhs)?;
            let eq = ctx.mk_forall_fvars(&o.params, &eq)?;
            let eqn = m.name.str("eq_1");
            ctx.add_decl(ConstantInfo::axiom(eqn.clone(), self.level_params.clone(), eq))?;
            eqn_lemmas.push(eqn);
        }

        registry.register(FixpointInfo {
            decl_names: self.members.iter().map(|m| m.name.clone()).collect(),
            fixed_param_perms: opened.into_iter().map(|o| o.perm).collect(),
            kinds: self.members.iter().map(|m| m.kind).collect(),
            eqn_lemmas,
        })
    }
}

fn run_body(ctx: &mut MetaCtx, member: &MemberDef, xs: &[Expr], ys: &[Expr], rec: &[Expr]) -> MetaResult<Expr> {
    let args = BodyArgs {
        fixed: xs,
        params: ys,
        rec,
    };
    let body = member
        .body
        .as_ref()
        .unwrap_or_else(|| panic!("member '{}' has no body", member.name));
    body(ctx, &args)
}

/// `even n := cond (n == 0) (some true) (odd (pred n))` and
/// `odd n := cond (n == 0) (some false) (even (pred n))`, both of the given
/// kind.
pub fn even_odd(env: &Environment, registry: &FixpointRegistry, kind: OrderKind) -> Arc<FixpointInfo> {
    let parity = |name: &str, base: fn() -> Expr, other: usize| {
        MemberDef::new(name, kind)
            .param("n", |_, _, _| Ok(nat()))
            .returns(|_, _, _| Ok(bool_()))
            .body(move |ctx, args| {
                let n = &args.params[0];
                let hit = ctx.mk_some(&base())?;
                let miss = args.call(other, &[pred(n)]);
                cond(ctx, &beq(n, &zero()), &hit, &miss)
            })
    };
    FixpointBuilder::new(env)
        .member(parity("even", tt, 1))
        .member(parity("odd", ff, 0))
        .compile(registry)
        .unwrap()
}

/// `count n := cond (n == 0) (some 0) (count (pred n))`, a single function of
/// the given kind.
pub fn count(env: &Environment, registry: &FixpointRegistry, kind: OrderKind) -> Arc<FixpointInfo> {
    let member = MemberDef::new("count", kind)
        .param("n", |_, _, _| Ok(nat()))
        .returns(|_, _, _| Ok(nat()))
        .body(|ctx, args| {
            let n = &args.params[0];
            let hit = ctx.mk_some(&zero())?;
            let miss = args.call(0, &[pred(n)]);
            cond(ctx, &beq(n, &zero()), &hit, &miss)
        });
    FixpointBuilder::new(env)
        .member(member)
        .compile(registry)
        .unwrap()
}

/// Members `a`, `b`, `c`, … of the given kinds, each forwarding to the next:
/// `a n := id (Option Nat) (b n)`, the last one calling `a`.
pub fn relay(env: &Environment, registry: &FixpointRegistry, kinds: &[OrderKind]) -> Arc<FixpointInfo> {
    let n = kinds.len();
    let mut builder = FixpointBuilder::new(env);
    for (i, kind) in kinds.iter().enumerate() {
        let name = char::from(b'a' + i as u8).to_string();
        let member = MemberDef::new(name, *kind)
            .param("n", |_, _, _| Ok(nat()))
            .body(move |ctx, args| {
                let call = args.call((i + 1) % n, &args.params[..1]);
                let option = ctx.mk_option(&nat())?;
                ctx.mk_expected_type_hint(&call, &option)
            });
        builder = builder.member(member);
    }
    builder.compile(registry).unwrap()
}

/// `loop.{u} {α : Type u} (n : Nat) (a : α) : Option α :=
/// cond (n == 0) (some a) (loop (pred n) a)`, with `α` and `a` fixed.
pub fn poly_loop(env: &Environment, registry: &FixpointRegistry, kind: OrderKind) -> Arc<FixpointInfo> {
    let member = MemberDef::new("loop", kind)
        .fixed(0)
        .param("n", |_, _, _| Ok(nat()))
        .fixed(1)
        .returns(|_, xs, _| Ok(xs[0].clone()))
        .body(|ctx, args| {
            let n = &args.params[0];
            let hit = ctx.mk_some(&args.fixed[1])?;
            let miss = args.call(0, &[pred(n)]);
            cond(ctx, &beq(n, &zero()), &hit, &miss)
        });
    FixpointBuilder::new(env)
        .level_param("u")
        .fixed("α", BinderInfo::Implicit, |_, _, _| {
            Ok(Expr::type_u(Level::param("u")))
        })
        .fixed("a", BinderInfo::Default, |_, xs, _| Ok(xs[0].clone()))
        .member(member)
        .compile(registry)
        .unwrap()
}

/// `add m n := cond (n == 0) (some m) (add (succ m) (pred n))`.
pub fn add(env: &Environment, registry: &FixpointRegistry, kind: OrderKind) -> Arc<FixpointInfo> {
    let member = MemberDef::new("add", kind)
        .param("m", |_, _, _| Ok(nat()))
        .param("n", |_, _, _| Ok(nat()))
        .body(|ctx, args| {
            let (m, n) = (&args.params[0], &args.params[1]);
            let hit = ctx.mk_some(m)?;
            let miss = args.call(0, &[succ(m), pred(n)]);
            cond(ctx, &beq(n, &zero()), &hit, &miss)
        });
    FixpointBuilder::new(env)
        .member(member)
        .compile(registry)
        .unwrap()
}

/// `stuck : Option Nat := stuck`, a function without parameters.
pub fn stuck(env: &Environment, registry: &FixpointRegistry, kind: OrderKind) -> Arc<FixpointInfo> {
    let member = MemberDef::new("stuck", kind).body(|_, args| Ok(args.call(0, &[])));
    FixpointBuilder::new(env)
        .member(member)
        .compile(registry)
        .unwrap()
}

/// `count` read inductively over the reversed order of `Nat → Option Nat`
/// rather than pointwise, so its codomain is not an `Option` order.
pub fn reversed_count(env: &Environment, registry: &FixpointRegistry) -> Arc<FixpointInfo> {
    let member = MemberDef::new("count", OrderKind::Inductive)
        .param("n", |_, _, _| Ok(nat()))
        .dual_outermost()
        .body(|ctx, args| {
            let n = &args.params[0];
            let hit = ctx.mk_some(&zero())?;
            let miss = args.call(0, &[pred(n)]);
            cond(ctx, &beq(n, &zero()), &hit, &miss)
        });
    FixpointBuilder::new(env)
        .member(member)
        .compile(registry)
        .unwrap()
}
