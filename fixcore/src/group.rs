//! Opening a registered group at its fixed parameters.

use std::sync::Arc;

use fixformal::{
    env::ConstantInfo,
    expr::Expr,
    level::Level,
    meta::MetaCtx,
    name::Name,
};

use crate::{
    error::{DeriveError, DeriveResult},
    order::names::FIX,
    pprod::strip_projs,
    registry::{FixpointInfo, OrderKind},
    shape::CcpoShape,
};

/// A group with its fixed parameters opened as locals and the `fix`
/// application of its packed definition taken apart.
#[derive(Debug)]
pub struct FixpointGroup {
    pub info: Arc<FixpointInfo>,
    pub level_params: Vec<Name>,
    pub xs: Vec<Expr>,
    /// Packed carrier and instance.
    pub packed: CcpoShape,
    pub members: Vec<CcpoShape>,
    /// The functional `F : α → α`.
    pub step: Expr,
    pub hmono: Expr,
    /// Member types `Tᵢ` over the varying parameters.
    pub types: Vec<Expr>,
    /// Members applied to the fixed parameters.
    pub consts: Vec<Expr>,
}

impl FixpointGroup {
    pub fn open(ctx: &mut MetaCtx, info: Arc<FixpointInfo>) -> DeriveResult<Self> {
        let decls = info
            .decl_names
            .iter()
            .map(|n| ctx.env().get(n))
            .collect::<Result<Vec<Arc<ConstantInfo>>, _>>()?;
        if let Some(eqn) = info.eqn_lemmas.iter().find(|e| !ctx.env().contains(e)) {
            return Err(DeriveError::invariant(
                "unfolding equation of a fixpoint member is not declared",
                eqn.to_string(),
            ));
        }
        let head = &decls[0];
        if let Some(d) = decls.iter().find(|d| d.level_params != head.level_params) {
            return Err(DeriveError::invariant(
                "group members disagree on universe parameters",
                d.name.to_string(),
            ));
        }
        let level_params = head.level_params.clone();
        let levels: Vec<Level> = level_params.iter().cloned().map(Level::param).collect();

        let perm = &info.fixed_param_perms[0];
        let xs = perm.forall_telescope(ctx, &head.ty)?;
        let Some(value) = head.value() else {
            return Err(DeriveError::invariant(
                "fixpoint member is not a definition",
                head.name.to_string(),
            ));
        };
        let body = perm.instantiate_lambda(ctx, value, &xs)?.eta();
        let body = strip_projs(&body);
        let fix = ctx
            .whnf_until(&body, |n| n == FIX)
            .filter(|e| e.is_app_of(FIX, 4))
            .ok_or_else(|| DeriveError::invariant("expected a fixpoint", ctx.pp(&body)))?;
        let [alpha, inst, step, hmono]: [Expr; 4] = fix
            .get_app_args()
            .try_into()
            .map_err(|_| DeriveError::invariant("malformed fixpoint", ctx.pp(&fix)))?;

        let packed = CcpoShape::from_instance(ctx, &alpha, &inst)?;
        let members = packed.split(info.len())?;
        for ((m, kind), name) in members.iter().zip(&info.kinds).zip(&info.decl_names) {
            m.check_kind(*kind, name)?;
        }

        let mut types = Vec::with_capacity(info.len());
        let mut consts = Vec::with_capacity(info.len());
        for (decl, perm) in decls.iter().zip(&info.fixed_param_perms) {
            types.push(perm.instantiate_forall(ctx, &decl.ty, &xs)?);
            let f = Expr::constant(decl.name.clone(), levels.iter().cloned());
            consts.push(perm.apply_fixed(ctx, &f, &decl.ty, &xs)?);
        }
        log::trace!(
            "opened fixpoint group '{}' ({} members, {} fixed parameters)",
            head.name,
            info.len(),
            xs.len()
        );

        Ok(Self {
            info,
            level_params,
            xs,
            packed,
            members,
            step,
            hmono,
            types,
            consts,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn alpha(&self) -> &Expr {
        &self.packed.ty
    }

    pub fn inst(&self) -> &Expr {
        &self.packed.inst
    }

    pub fn kind(&self, i: usize) -> OrderKind {
        self.info.kinds[i]
    }

    pub fn name(&self, i: usize) -> &Name {
        &self.info.decl_names[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::FixpointRegistry,
        tests_utils::{count, test_env},
    };

    #[test]
    fn groups_open_at_their_fixed_parameters() {
        let env = test_env();
        let info = count(&env, &FixpointRegistry::new(), OrderKind::Coinductive);
        let mut ctx = MetaCtx::new(env);
        let group = FixpointGroup::open(&mut ctx, info).unwrap();
        assert_eq!(group.len(), 1);
        assert!(group.xs.is_empty());
        assert_eq!(group.consts[0], Expr::constant("count", []));
        assert!(group.members[0].option_elem().is_some());
    }

    #[test]
    fn missing_unfolding_equations_are_reported() {
        let env = test_env();
        let info = count(&env, &FixpointRegistry::new(), OrderKind::Inductive);
        let broken = FixpointInfo {
            eqn_lemmas: vec![Name::new("count.eq_2")],
            ..(*info).clone()
        };
        let mut ctx = MetaCtx::new(env);
        let err = FixpointGroup::open(&mut ctx, Arc::new(broken)).unwrap_err();
        match err {
            DeriveError::InvariantViolation { term, .. } => assert_eq!(term, "count.eq_2"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
