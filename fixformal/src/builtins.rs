//! The builtin prelude: products, conjunction, disjunction, equality, options
//! and the identity function.
//!
//! Every binder is explicit. The reducer knows the projections of `PProd` and
//! `And` (see `meta::whnf`); everything else is opaque.

use crate::{
    env::{ConstantInfo, Environment},
    error::{MetaError, MetaResult},
    expr::{BinderInfo, Expr},
    level::Level,
    meta::MetaCtx,
    name::Name,
};

/// Names of the builtin constants.
pub mod names {
    pub const PPROD: &str = "PProd";
    pub const PPROD_MK: &str = "PProd.mk";
    pub const PPROD_FST: &str = "PProd.fst";
    pub const PPROD_SND: &str = "PProd.snd";
    pub const AND: &str = "And";
    pub const AND_INTRO: &str = "And.intro";
    pub const AND_LEFT: &str = "And.left";
    pub const AND_RIGHT: &str = "And.right";
    pub const OR: &str = "Or";
    pub const EQ: &str = "Eq";
    pub const EQ_REFL: &str = "Eq.refl";
    pub const OPTION: &str = "Option";
    pub const OPTION_NONE: &str = "Option.none";
    pub const OPTION_SOME: &str = "Option.some";
    pub const ID: &str = "id";
}

fn params(ps: &[&str]) -> Vec<Name> {
    ps.iter().map(|p| Name::new(p)).collect()
}

/// Declare the prelude in `env`. Every declaration is checked.
pub fn install_builtins(env: &Environment) -> MetaResult<()> {
    let mut ctx = MetaCtx::new(env.clone());
    let (u, v) = (Level::param("u"), Level::param("v"));
    let d = BinderInfo::Default;

    // PProd
    let pprod_ty = Expr::arrow(
        Expr::sort(u.clone()),
        Expr::arrow(
            Expr::sort(v.clone()),
            Expr::sort(Level::max(Level::max(Level::one(), u.clone()), v.clone())),
        ),
    );
    ctx.add_decl(ConstantInfo::axiom(names::PPROD, params(&["u", "v"]), pprod_ty))?;

    let alpha = ctx.mk_local_decl("α", d, Expr::sort(u.clone()));
    let beta = ctx.mk_local_decl("β", d, Expr::sort(v.clone()));
    let pprod_ab = Expr::mk_app(
        Expr::constant(names::PPROD, [u.clone(), v.clone()]),
        [alpha.clone(), beta.clone()],
    );
    let a = ctx.mk_local_decl("fst", d, alpha.clone());
    let b = ctx.mk_local_decl("snd", d, beta.clone());
    let p = ctx.mk_local_decl("self", d, pprod_ab.clone());
    let mk_ty = ctx.mk_forall_fvars(&[alpha.clone(), beta.clone(), a, b], &pprod_ab)?;
    ctx.add_decl(ConstantInfo::axiom(names::PPROD_MK, params(&["u", "v"]), mk_ty))?;
    let fst_ty = ctx.mk_forall_fvars(&[alpha.clone(), beta.clone(), p.clone()], &alpha)?;
    ctx.add_decl(ConstantInfo::axiom(names::PPROD_FST, params(&["u", "v"]), fst_ty))?;
    let snd_ty = ctx.mk_forall_fvars(&[alpha, beta.clone(), p], &beta)?;
    ctx.add_decl(ConstantInfo::axiom(names::PPROD_SND, params(&["u", "v"]), snd_ty))?;

    // And, Or
    let connective = Expr::arrow(Expr::prop(), Expr::arrow(Expr::prop(), Expr::prop()));
    ctx.add_decl(ConstantInfo::axiom(names::AND, vec![], connective.clone()))?;
    ctx.add_decl(ConstantInfo::axiom(names::OR, vec![], connective))?;

    let a = ctx.mk_local_decl("a", d, Expr::prop());
    let b = ctx.mk_local_decl("b", d, Expr::prop());
    let and_ab = ctx.mk_and(&a, &b);
    let ha = ctx.mk_local_decl("left", d, a.clone());
    let hb = ctx.mk_local_decl("right", d, b.clone());
    let h = ctx.mk_local_decl("self", d, and_ab.clone());
    let intro_ty = ctx.mk_forall_fvars(&[a.clone(), b.clone(), ha, hb], &and_ab)?;
    ctx.add_decl(ConstantInfo::axiom(names::AND_INTRO, vec![], intro_ty))?;
    let left_ty = ctx.mk_forall_fvars(&[a.clone(), b.clone(), h.clone()], &a)?;
    ctx.add_decl(ConstantInfo::axiom(names::AND_LEFT, vec![], left_ty))?;
    let right_ty = ctx.mk_forall_fvars(&[a, b.clone(), h], &b)?;
    ctx.add_decl(ConstantInfo::axiom(names::AND_RIGHT, vec![], right_ty))?;

    // Eq
    let alpha = ctx.mk_local_decl("α", d, Expr::sort(u.clone()));
    let x = ctx.mk_local_decl("a", d, alpha.clone());
    let y = ctx.mk_local_decl("b", d, alpha.clone());
    let eq_ty = ctx.mk_forall_fvars(&[alpha.clone(), x.clone(), y], &Expr::prop())?;
    ctx.add_decl(ConstantInfo::axiom(names::EQ, params(&["u"]), eq_ty))?;
    let refl = Expr::mk_app(
        Expr::constant(names::EQ, [u.clone()]),
        [alpha.clone(), x.clone(), x.clone()],
    );
    let refl_ty = ctx.mk_forall_fvars(&[alpha.clone(), x.clone()], &refl)?;
    ctx.add_decl(ConstantInfo::axiom(names::EQ_REFL, params(&["u"]), refl_ty))?;

    // id
    let id_ty = ctx.mk_forall_fvars(&[alpha.clone(), x.clone()], &alpha)?;
    let id_value = ctx.mk_lambda_fvars(&[alpha, x.clone()], &x)?;
    ctx.add_decl(ConstantInfo::definition(names::ID, params(&["u"]), id_ty, id_value))?;

    // Option
    let type_u = Expr::type_u(u.clone());
    let option_ty = Expr::arrow(type_u.clone(), type_u.clone());
    ctx.add_decl(ConstantInfo::axiom(names::OPTION, params(&["u"]), option_ty))?;
    let alpha = ctx.mk_local_decl("α", d, type_u);
    let option_a = Expr::app(Expr::constant(names::OPTION, [u.clone()]), alpha.clone());
    let val = ctx.mk_local_decl("val", d, alpha.clone());
    let none_ty = ctx.mk_forall_fvars(&[alpha.clone()], &option_a)?;
    ctx.add_decl(ConstantInfo::axiom(names::OPTION_NONE, params(&["u"]), none_ty))?;
    let some_ty = ctx.mk_forall_fvars(&[alpha, val], &option_a)?;
    ctx.add_decl(ConstantInfo::axiom(names::OPTION_SOME, params(&["u"]), some_ty))?;

    log::debug!("installed builtin prelude ({} declarations)", env.len());
    Ok(())
}

impl MetaCtx {
    /// `PProd a b`.
    pub fn mk_pprod(&mut self, a: &Expr, b: &Expr) -> MetaResult<Expr> {
        let (u, v) = (self.get_level(a)?, self.get_level(b)?);
        Ok(Expr::mk_app(
            Expr::constant(names::PPROD, [u, v]),
            [a.clone(), b.clone()],
        ))
    }

    /// `PProd.mk _ _ a b`.
    pub fn mk_pprod_mk(&mut self, a: &Expr, b: &Expr) -> MetaResult<Expr> {
        let (ta, tb) = (self.infer_type(a)?, self.infer_type(b)?);
        let (u, v) = (self.get_level(&ta)?, self.get_level(&tb)?);
        Ok(Expr::mk_app(
            Expr::constant(names::PPROD_MK, [u, v]),
            [ta, tb, a.clone(), b.clone()],
        ))
    }

    pub fn mk_pprod_fst(&mut self, p: &Expr) -> MetaResult<Expr> {
        self.mk_binary_proj(names::PPROD, names::PPROD_FST, p)
    }

    pub fn mk_pprod_snd(&mut self, p: &Expr) -> MetaResult<Expr> {
        self.mk_binary_proj(names::PPROD, names::PPROD_SND, p)
    }

    /// `And a b`.
    pub fn mk_and(&self, a: &Expr, b: &Expr) -> Expr {
        Expr::mk_app(Expr::constant(names::AND, []), [a.clone(), b.clone()])
    }

    /// `Or a b`.
    pub fn mk_or(&self, a: &Expr, b: &Expr) -> Expr {
        Expr::mk_app(Expr::constant(names::OR, []), [a.clone(), b.clone()])
    }

    /// `And.intro _ _ ha hb`.
    pub fn mk_and_intro(&mut self, ha: &Expr, hb: &Expr) -> MetaResult<Expr> {
        let (a, b) = (self.infer_type(ha)?, self.infer_type(hb)?);
        Ok(Expr::mk_app(
            Expr::constant(names::AND_INTRO, []),
            [a, b, ha.clone(), hb.clone()],
        ))
    }

    pub fn mk_and_left(&mut self, h: &Expr) -> MetaResult<Expr> {
        self.mk_binary_proj(names::AND, names::AND_LEFT, h)
    }

    pub fn mk_and_right(&mut self, h: &Expr) -> MetaResult<Expr> {
        self.mk_binary_proj(names::AND, names::AND_RIGHT, h)
    }

    /// `Eq _ a b`.
    pub fn mk_eq(&mut self, a: &Expr, b: &Expr) -> MetaResult<Expr> {
        let ty = self.infer_type(a)?;
        let level = self.get_level(&ty)?;
        Ok(Expr::mk_app(
            Expr::constant(names::EQ, [level]),
            [ty, a.clone(), b.clone()],
        ))
    }

    /// `Option ty`, for `ty : Type u`.
    pub fn mk_option(&mut self, ty: &Expr) -> MetaResult<Expr> {
        let u = self.type_level(ty)?;
        Ok(Expr::app(Expr::constant(names::OPTION, [u]), ty.clone()))
    }

    /// `Option.none ty`.
    pub fn mk_none(&mut self, ty: &Expr) -> MetaResult<Expr> {
        let u = self.type_level(ty)?;
        Ok(Expr::app(Expr::constant(names::OPTION_NONE, [u]), ty.clone()))
    }

    /// `Option.some _ x`.
    pub fn mk_some(&mut self, x: &Expr) -> MetaResult<Expr> {
        let ty = self.infer_type(x)?;
        let u = self.type_level(&ty)?;
        Ok(Expr::mk_app(
            Expr::constant(names::OPTION_SOME, [u]),
            [ty, x.clone()],
        ))
    }

    /// `u` such that `ty : Type u`.
    fn type_level(&mut self, ty: &Expr) -> MetaResult<Level> {
        match self.get_level(ty)?.normalize() {
            Level::Succ(u) => Ok((*u).clone()),
            _ => Err(MetaError::TypeExpected { term: self.pp(ty) }),
        }
    }

    /// Project out of a value whose type reduces to `structure α β`.
    fn mk_binary_proj(&mut self, structure: &str, proj: &str, e: &Expr) -> MetaResult<Expr> {
        let ty = self.infer_type(e)?;
        let ty = self.whnf(&ty)?;
        if !ty.is_app_of(structure, 2) {
            return Err(MetaError::StructureExpected {
                expected: structure.into(),
                term: self.pp(e),
                ty: self.pp(&ty),
            });
        }
        let levels = ty.const_levels().cloned().unwrap_or_default();
        let mut args = ty.get_app_args();
        args.push(e.clone());
        Ok(Expr::mk_app(Expr::Const(proj.into(), levels), args))
    }
}
