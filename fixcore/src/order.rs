//! The order-theoretic library fixpoints are compiled against.
//!
//! A CCPO structure on `α` is represented by its order relation, so that every
//! instance below is a transparent definition and relations unfold by delta and
//! beta reduction alone:
//!
//! ```text
//! CCPO α                := α → α → Prop
//! rel α inst a b        := inst a b
//! instCCPOPProd α β i j := fun x y => i x.1 y.1 ∧ j x.2 y.2
//! instCCPOPi α β inst   := fun f g => ∀ a, inst a (f a) (g a)
//! instCCPOOption β      := fun x y => x = none ∨ x = y
//! instCCPODual α inst   := fun x y => inst y x
//! ```
//!
//! `fix`, `monotone` and `admissible` are opaque and the lemmas relating them
//! are postulated.

use fixformal::{
    env::{ConstantInfo, Environment},
    error::MetaResult,
    expr::{BinderInfo, Expr},
    level::Level,
    meta::MetaCtx,
    name::Name,
};

pub mod names {
    pub const CCPO: &str = "CCPO";
    pub const REL: &str = "rel";
    pub const INST_PPROD: &str = "instCCPOPProd";
    pub const INST_PI: &str = "instCCPOPi";
    pub const INST_OPTION: &str = "instCCPOOption";
    pub const INST_DUAL: &str = "instCCPODual";
    pub const MONOTONE: &str = "monotone";
    pub const ADMISSIBLE: &str = "admissible";
    pub const FIX: &str = "fix";
    pub const FIX_INDUCT: &str = "fix_induct";
    pub const FIX_INDUCT_APPROX: &str = "fix_induct_approx";
    pub const ADM_AND: &str = "admissible_and";
    pub const ADM_PPROD_FST: &str = "admissible_pprod_fst";
    pub const ADM_PPROD_SND: &str = "admissible_pprod_snd";
    pub const ADM_PI: &str = "admissible_pi";
    pub const ADM_PI_APPLY: &str = "admissible_pi_apply";
    pub const ADM_EQ_SOME: &str = "admissible_eq_some";
    pub const ADM_EQ_SOME_DUAL: &str = "admissible_eq_some_dual";
}

use names::*;

/// Small declaration builder over a private elaboration context.
struct Library {
    ctx: MetaCtx,
}

impl Library {
    fn local(&mut self, name: &str, ty: Expr) -> Expr {
        self.ctx.mk_local_decl(name, BinderInfo::Default, ty)
    }

    fn implicit(&mut self, name: &str, ty: Expr) -> Expr {
        self.ctx.mk_local_decl(name, BinderInfo::Implicit, ty)
    }

    fn ccpo(&mut self, ty: &Expr) -> MetaResult<Expr> {
        self.ctx.mk_app_m(CCPO, std::slice::from_ref(ty))
    }

    fn admissible(&mut self, ty: &Expr, inst: &Expr, pred: &Expr) -> MetaResult<Expr> {
        self.ctx
            .mk_app_m(ADMISSIBLE, &[ty.clone(), inst.clone(), pred.clone()])
    }

    fn axiom(&mut self, name: &str, params: &[&str], xs: &[Expr], concl: &Expr) -> MetaResult<()> {
        let ty = self.ctx.mk_forall_fvars(xs, concl)?;
        self.ctx
            .add_decl(ConstantInfo::axiom(name, level_params(params), ty))?;
        Ok(())
    }

    /// `name xs : ty := value`. The type is inferred when omitted.
    fn definition(
        &mut self,
        name: &str,
        params: &[&str],
        xs: &[Expr],
        ty: Option<&Expr>,
        value: &Expr,
    ) -> MetaResult<()> {
        let value = self.ctx.mk_lambda_fvars(xs, value)?;
        let ty = match ty {
            Some(ty) => self.ctx.mk_forall_fvars(xs, ty)?,
            None => self.ctx.infer_type(&value)?,
        };
        self.ctx
            .add_decl(ConstantInfo::definition(name, level_params(params), ty, value))?;
        Ok(())
    }
}

fn level_params(params: &[&str]) -> Vec<Name> {
    params.iter().map(Name::new).collect()
}

/// Declare the order-theoretic library in `env`, which must already contain
/// the builtin prelude.
pub fn install_order_library(env: &Environment) -> MetaResult<()> {
    let mut lib = Library {
        ctx: MetaCtx::new(env.clone()),
    };
    let (u, v) = (Level::param("u"), Level::param("v"));

    // ---------------- CCPO, rel ----------------
    let alpha = lib.local("α", Expr::sort(u.clone()));
    let relation = Expr::arrow(alpha.clone(), Expr::arrow(alpha.clone(), Expr::prop()));
    lib.definition(CCPO, &["u"], &[alpha.clone()], None, &relation)?;

    let ccpo_alpha = lib.ccpo(&alpha)?;
    let inst = lib.local("inst", ccpo_alpha.clone());
    let a = lib.local("a", alpha.clone());
    let b = lib.local("b", alpha.clone());
    let body = Expr::mk_app(inst.clone(), [a.clone(), b.clone()]);
    lib.definition(
        REL,
        &["u"],
        &[alpha.clone(), inst.clone(), a, b],
        Some(&Expr::prop()),
        &body,
    )?;

    // ---------------- Instances ----------------
    let beta = lib.local("β", Expr::sort(v.clone()));
    let ccpo_beta = lib.ccpo(&beta)?;
    let ia = lib.local("ia", ccpo_alpha.clone());
    let ib = lib.local("ib", ccpo_beta);
    let pprod = lib.ctx.mk_pprod(&alpha, &beta)?;
    let x = lib.local("x", pprod.clone());
    let y = lib.local("y", pprod.clone());
    let (x1, y1) = (lib.ctx.mk_pprod_fst(&x)?, lib.ctx.mk_pprod_fst(&y)?);
    let (x2, y2) = (lib.ctx.mk_pprod_snd(&x)?, lib.ctx.mk_pprod_snd(&y)?);
    let both = lib.ctx.mk_and(
        &Expr::mk_app(ia.clone(), [x1, y1]),
        &Expr::mk_app(ib.clone(), [x2, y2]),
    );
    let order = lib.ctx.mk_lambda_fvars(&[x, y], &both)?;
    let ccpo_pprod = lib.ccpo(&pprod)?;
    lib.definition(
        INST_PPROD,
        &["u", "v"],
        &[alpha.clone(), beta.clone(), ia.clone(), ib.clone()],
        Some(&ccpo_pprod),
        &order,
    )?;

    let beta_fn = lib.local("β", Expr::arrow(alpha.clone(), Expr::sort(v.clone())));
    let a = lib.local("a", alpha.clone());
    let beta_a = Expr::app(beta_fn.clone(), a.clone());
    let ccpo_beta_a = lib.ccpo(&beta_a)?;
    let inst_fn_ty = lib.ctx.mk_forall_fvars(&[a.clone()], &ccpo_beta_a)?;
    let inst_fn = lib.local("inst", inst_fn_ty);
    let pi_ty = lib.ctx.mk_forall_fvars(&[a.clone()], &beta_a)?;
    let f = lib.local("f", pi_ty.clone());
    let g = lib.local("g", pi_ty.clone());
    let pointwise = Expr::mk_app(
        Expr::app(inst_fn.clone(), a.clone()),
        [Expr::app(f.clone(), a.clone()), Expr::app(g.clone(), a.clone())],
    );
    let pointwise = lib.ctx.mk_forall_fvars(&[a.clone()], &pointwise)?;
    let order = lib.ctx.mk_lambda_fvars(&[f, g], &pointwise)?;
    let ccpo_pi = lib.ccpo(&pi_ty)?;
    lib.definition(
        INST_PI,
        &["u", "v"],
        &[alpha.clone(), beta_fn.clone(), inst_fn.clone()],
        Some(&ccpo_pi),
        &order,
    )?;

    let elem = lib.local("β", Expr::type_u(u.clone()));
    let option = lib.ctx.mk_option(&elem)?;
    let x = lib.local("x", option.clone());
    let y = lib.local("y", option.clone());
    let none = lib.ctx.mk_none(&elem)?;
    let is_none = lib.ctx.mk_eq(&x, &none)?;
    let is_same = lib.ctx.mk_eq(&x, &y)?;
    let flat = lib.ctx.mk_or(&is_none, &is_same);
    let order = lib.ctx.mk_lambda_fvars(&[x, y], &flat)?;
    let ccpo_option = lib.ccpo(&option)?;
    lib.definition(
        INST_OPTION,
        &["u"],
        &[elem.clone()],
        Some(&ccpo_option),
        &order,
    )?;

    let x = lib.local("x", alpha.clone());
    let y = lib.local("y", alpha.clone());
    let swapped = Expr::mk_app(inst.clone(), [y.clone(), x.clone()]);
    let order = lib.ctx.mk_lambda_fvars(&[x, y], &swapped)?;
    lib.definition(
        INST_DUAL,
        &["u"],
        &[alpha.clone(), inst.clone()],
        Some(&ccpo_alpha),
        &order,
    )?;

    // ---------------- Fixpoints ----------------
    let endo = Expr::arrow(alpha.clone(), alpha.clone());
    let step = lib.local("F", endo);
    lib.axiom(
        MONOTONE,
        &["u"],
        &[alpha.clone(), inst.clone(), step.clone()],
        &Expr::prop(),
    )?;
    let pred_ty = Expr::arrow(alpha.clone(), Expr::prop());
    let pred = lib.local("P", pred_ty.clone());
    lib.axiom(
        ADMISSIBLE,
        &["u"],
        &[alpha.clone(), inst.clone(), pred.clone()],
        &Expr::prop(),
    )?;

    let mono_ty = lib
        .ctx
        .mk_app_m(MONOTONE, &[alpha.clone(), inst.clone(), step.clone()])?;
    let hmono = lib.local("hmono", mono_ty);
    let fix_params = [alpha.clone(), inst.clone(), step.clone(), hmono.clone()];
    lib.axiom(FIX, &["u"], &fix_params, &alpha)?;

    let motive = lib.local("motive", pred_ty.clone());
    let adm_ty = lib.admissible(&alpha, &inst, &motive)?;
    let adm = lib.local("adm", adm_ty);
    let fixed = lib.ctx.mk_app_m(FIX, &fix_params)?;
    let concl = Expr::app(motive.clone(), fixed);

    let x = lib.local("x", alpha.clone());
    let fx = Expr::app(step.clone(), x.clone());
    let ih = lib.local("ih", Expr::app(motive.clone(), x.clone()));
    let motive_fx = Expr::app(motive.clone(), fx.clone());
    let h_ty = lib.ctx.mk_forall_fvars(&[x.clone(), ih.clone()], &motive_fx)?;
    let h = lib.local("h", h_ty);
    let mut xs = fix_params.to_vec();
    xs.extend([motive.clone(), adm.clone(), h]);
    lib.axiom(FIX_INDUCT, &["u"], &xs, &concl)?;

    let guard_ty = lib
        .ctx
        .mk_app_m(REL, &[alpha.clone(), inst.clone(), x.clone(), fx])?;
    let guard = lib.local("hrel", guard_ty);
    let h_ty = lib
        .ctx
        .mk_forall_fvars(&[x.clone(), guard, ih], &motive_fx)?;
    let h = lib.local("h", h_ty);
    let mut xs = fix_params.to_vec();
    xs.extend([motive, adm, h]);
    lib.axiom(FIX_INDUCT_APPROX, &["u"], &xs, &concl)?;

    // ---------------- Admissibility ----------------
    let alpha_i = lib.implicit("α", Expr::sort(u.clone()));
    let ccpo_alpha_i = lib.ccpo(&alpha_i)?;
    let inst_i = lib.implicit("inst", ccpo_alpha_i);
    let pred_i_ty = Expr::arrow(alpha_i.clone(), Expr::prop());
    let p = lib.implicit("P", pred_i_ty.clone());
    let q = lib.implicit("Q", pred_i_ty);
    let hp_ty = lib.admissible(&alpha_i, &inst_i, &p)?;
    let hq_ty = lib.admissible(&alpha_i, &inst_i, &q)?;
    let hp = lib.local("hp", hp_ty);
    let hq = lib.local("hq", hq_ty);
    let x = lib.local("x", alpha_i.clone());
    let conj = lib.ctx.mk_and(
        &Expr::app(p.clone(), x.clone()),
        &Expr::app(q.clone(), x.clone()),
    );
    let conj = lib.ctx.mk_lambda_fvars(&[x], &conj)?;
    let concl = lib.admissible(&alpha_i, &inst_i, &conj)?;
    lib.axiom(ADM_AND, &["u"], &[alpha_i, inst_i, p, q, hp, hq], &concl)?;

    let packed_inst = lib.ctx.mk_app_m(
        INST_PPROD,
        &[alpha.clone(), beta.clone(), ia.clone(), ib.clone()],
    )?;
    let header = [alpha.clone(), beta.clone(), ia.clone(), ib.clone()];
    for (name, carrier, inst) in [(ADM_PPROD_FST, &alpha, &ia), (ADM_PPROD_SND, &beta, &ib)] {
        let p = lib.local("P", Expr::arrow(carrier.clone(), Expr::prop()));
        let h_ty = lib.admissible(carrier, inst, &p)?;
        let h = lib.local("h", h_ty);
        let x = lib.local("x", pprod.clone());
        let component = if name == ADM_PPROD_FST {
            lib.ctx.mk_pprod_fst(&x)?
        } else {
            lib.ctx.mk_pprod_snd(&x)?
        };
        let lifted = lib
            .ctx
            .mk_lambda_fvars(&[x], &Expr::app(p.clone(), component))?;
        let concl = lib.admissible(&pprod, &packed_inst, &lifted)?;
        let mut xs = header.to_vec();
        xs.extend([p, h]);
        lib.axiom(name, &["u", "v"], &xs, &concl)?;
    }

    // admissible_pi: quantifying over a side parameter
    let side = lib.local("β", Expr::sort(v.clone()));
    let y = lib.local("y", side.clone());
    let p_ty = lib.ctx.mk_forall_fvars(&[y.clone()], &pred_ty)?;
    let p = lib.local("P", p_ty);
    let p_y = Expr::app(p.clone(), y.clone());
    let adm_p_y = lib.admissible(&alpha, &inst, &p_y)?;
    let h_ty = lib.ctx.mk_forall_fvars(&[y.clone()], &adm_p_y)?;
    let h = lib.local("h", h_ty);
    let x = lib.local("x", alpha.clone());
    let all = Expr::mk_app(p.clone(), [y.clone(), x.clone()]);
    let all = lib.ctx.mk_forall_fvars(&[y], &all)?;
    let all = lib.ctx.mk_lambda_fvars(&[x], &all)?;
    let concl = lib.admissible(&alpha, &inst, &all)?;
    lib.axiom(
        ADM_PI,
        &["u", "v"],
        &[alpha.clone(), inst.clone(), side, p, h],
        &concl,
    )?;

    // admissible_pi_apply: pointwise predicates on a dependent function space
    let a = lib.local("a", alpha.clone());
    let beta_a = Expr::app(beta_fn.clone(), a.clone());
    let b = lib.local("b", beta_a.clone());
    let p_ty = lib.ctx.mk_forall_fvars(&[a.clone(), b], &Expr::prop())?;
    let p = lib.local("P", p_ty);
    let p_a = Expr::app(p.clone(), a.clone());
    let inst_a = Expr::app(inst_fn.clone(), a.clone());
    let adm_p_a = lib.admissible(&beta_a, &inst_a, &p_a)?;
    let h_ty = lib.ctx.mk_forall_fvars(&[a.clone()], &adm_p_a)?;
    let h = lib.local("h", h_ty);
    let f = lib.local("f", pi_ty.clone());
    let pointwise = Expr::mk_app(p.clone(), [a.clone(), Expr::app(f.clone(), a.clone())]);
    let pointwise = lib.ctx.mk_forall_fvars(&[a], &pointwise)?;
    let pointwise = lib.ctx.mk_lambda_fvars(&[f], &pointwise)?;
    let pi_inst = lib
        .ctx
        .mk_app_m(INST_PI, &[alpha.clone(), beta_fn.clone(), inst_fn.clone()])?;
    let concl = lib.admissible(&pi_ty, &pi_inst, &pointwise)?;
    lib.axiom(
        ADM_PI_APPLY,
        &["u", "v"],
        &[alpha, beta_fn, inst_fn, p, h],
        &concl,
    )?;

    // admissible_eq_some(_dual): `x = some r → Q` over the flat order and its dual
    let elem_i = lib.implicit("β", Expr::type_u(u.clone()));
    let option = lib.ctx.mk_option(&elem_i)?;
    let q = lib.local("Q", Expr::prop());
    let r = lib.local("r", elem_i.clone());
    let x = lib.local("x", option.clone());
    let some_r = lib.ctx.mk_some(&r)?;
    let hit = lib.ctx.mk_eq(&x, &some_r)?;
    let hit = lib.ctx.mk_arrow(hit, q.clone())?;
    let hit = lib.ctx.mk_lambda_fvars(&[x], &hit)?;
    let flat = lib.ctx.mk_app_m(INST_OPTION, &[elem_i.clone()])?;
    let concl = lib.admissible(&option, &flat, &hit)?;
    let xs = [elem_i, q, r];
    lib.axiom(ADM_EQ_SOME, &["u"], &xs, &concl)?;
    let dual = lib.ctx.mk_app_m(INST_DUAL, &[option.clone(), flat])?;
    let concl = lib.admissible(&option, &dual, &hit)?;
    lib.axiom(ADM_EQ_SOME_DUAL, &["u"], &xs, &concl)?;

    log::debug!("installed order library ({} declarations)", env.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixformal::builtins::{install_builtins, names as builtin};

    fn setup() -> (MetaCtx, Expr) {
        let env = Environment::new();
        install_builtins(&env).unwrap();
        install_order_library(&env).unwrap();
        env.insert_unchecked(ConstantInfo::axiom(
            "Nat",
            vec![],
            Expr::type_u(Level::zero()),
        ))
        .unwrap();
        (MetaCtx::new(env), Expr::constant("Nat", []))
    }

    #[test]
    fn library_is_complete() {
        let (ctx, _) = setup();
        for name in [
            CCPO,
            REL,
            INST_PPROD,
            INST_PI,
            INST_OPTION,
            INST_DUAL,
            MONOTONE,
            ADMISSIBLE,
            FIX,
            FIX_INDUCT,
            FIX_INDUCT_APPROX,
            ADM_AND,
            ADM_PPROD_FST,
            ADM_PPROD_SND,
            ADM_PI,
            ADM_PI_APPLY,
            ADM_EQ_SOME,
            ADM_EQ_SOME_DUAL,
        ] {
            assert!(ctx.env().contains(&Name::new(name)), "missing {name}");
        }
    }

    #[test]
    fn flat_order_unfolds_to_a_disjunction() {
        let (mut ctx, nat) = setup();
        let option = ctx.mk_option(&nat).unwrap();
        let x = ctx.mk_local_decl("x", BinderInfo::Default, option.clone());
        let y = ctx.mk_local_decl("y", BinderInfo::Default, option.clone());
        let inst = ctx.mk_app_m(INST_OPTION, &[nat.clone()]).unwrap();
        let rel = ctx
            .mk_app_m(REL, &[option, inst, x.clone(), y.clone()])
            .unwrap();
        let unfolded = ctx.whnf(&rel).unwrap();
        assert!(unfolded.is_app_of(builtin::OR, 2));

        let none = ctx.mk_none(&nat).unwrap();
        let is_none = ctx.mk_eq(&x, &none).unwrap();
        let is_same = ctx.mk_eq(&x, &y).unwrap();
        let expected = ctx.mk_or(&is_none, &is_same);
        assert!(ctx.is_def_eq(&rel, &expected).unwrap());
    }

    #[test]
    fn dual_order_swaps_operands() {
        let (mut ctx, nat) = setup();
        let option = ctx.mk_option(&nat).unwrap();
        let x = ctx.mk_local_decl("x", BinderInfo::Default, option.clone());
        let y = ctx.mk_local_decl("y", BinderInfo::Default, option.clone());
        let flat = ctx.mk_app_m(INST_OPTION, &[nat]).unwrap();
        let dual = ctx
            .mk_app_m(INST_DUAL, &[option.clone(), flat.clone()])
            .unwrap();
        let forward = ctx
            .mk_app_m(REL, &[option.clone(), dual, x.clone(), y.clone()])
            .unwrap();
        let backward = ctx.mk_app_m(REL, &[option, flat, y, x]).unwrap();
        assert!(ctx.is_def_eq(&forward, &backward).unwrap());
    }
}
