//! The structure of the CCPO a fixpoint is taken in.
//!
//! The shape is read off the instance term of the `fix` application, which is
//! built from the four instance constructors of the order library.

use fixformal::{
    expr::{BinderInfo, Expr},
    meta::MetaCtx,
    name::Name,
};

use crate::{
    error::{DeriveError, DeriveResult},
    order::names::{INST_DUAL, INST_OPTION, INST_PI, INST_PPROD},
    registry::OrderKind,
};

/// A carrier type together with its CCPO instance and their decomposition.
#[derive(Debug, Clone)]
pub struct CcpoShape {
    pub ty: Expr,
    pub inst: Expr,
    pub node: ShapeNode,
}

#[derive(Debug, Clone)]
pub enum ShapeNode {
    /// `instCCPOPi domain codomain_fn inst_fn`, opened at the fresh local
    /// `local : domain`.
    Pi {
        domain: Expr,
        codomain_fn: Expr,
        inst_fn: Expr,
        local: Expr,
        body: Box<CcpoShape>,
    },
    PProd(Box<CcpoShape>, Box<CcpoShape>),
    /// Flat order on `Option elem`.
    Option { elem: Expr },
    /// The reversed order.
    Dual(Box<CcpoShape>),
}

impl CcpoShape {
    /// Decompose `inst : CCPO ty`.
    pub fn from_instance(ctx: &mut MetaCtx, ty: &Expr, inst: &Expr) -> DeriveResult<Self> {
        let inst = ctx.whnf_core(&ctx.instantiate_mvars(inst));
        let ty = ctx.whnf_core(&ctx.instantiate_mvars(ty));
        let args = inst.get_app_args();
        let head = inst.const_name().map(Name::as_str);
        let node = match (head, args.as_slice()) {
            (Some(INST_PI), [domain, codomain_fn, inst_fn]) => {
                let binder = match codomain_fn {
                    Expr::Lam { name, .. } => name.clone(),
                    _ => Name::new("a"),
                };
                let local = ctx.mk_local_decl(binder, BinderInfo::Default, domain.clone());
                let body_ty = Expr::app(codomain_fn.clone(), local.clone()).head_beta();
                let body_inst = Expr::app(inst_fn.clone(), local.clone()).head_beta();
                let body = Self::from_instance(ctx, &body_ty, &body_inst)?;
                ShapeNode::Pi {
                    domain: domain.clone(),
                    codomain_fn: codomain_fn.clone(),
                    inst_fn: inst_fn.clone(),
                    local,
                    body: Box::new(body),
                }
            }
            (Some(INST_PPROD), [a, b, ia, ib]) => ShapeNode::PProd(
                Box::new(Self::from_instance(ctx, a, ia)?),
                Box::new(Self::from_instance(ctx, b, ib)?),
            ),
            (Some(INST_OPTION), [elem]) => ShapeNode::Option { elem: elem.clone() },
            (Some(INST_DUAL), [a, i]) => ShapeNode::Dual(Box::new(Self::from_instance(ctx, a, i)?)),
            _ => {
                return Err(DeriveError::invariant(
                    "unexpected CCPO instance",
                    ctx.pp(&inst),
                ));
            }
        };
        Ok(Self { ty, inst, node })
    }

    /// Split a packed group of `n` members along its `n - 1` pairings.
    pub fn split(&self, n: usize) -> DeriveResult<Vec<CcpoShape>> {
        let mut members = Vec::with_capacity(n);
        let mut cur = self;
        for i in 0..n.saturating_sub(1) {
            let ShapeNode::PProd(a, b) = &cur.node else {
                return Err(DeriveError::invariant(
                    format!("expected {n} packed members, found {}", i + 1),
                    self.ty.to_string(),
                ));
            };
            members.push((**a).clone());
            cur = &**b;
        }
        members.push(cur.clone());
        if let Some(m) = members.iter().find(|m| m.contains_pprod()) {
            return Err(DeriveError::invariant(
                "group member has a product order",
                m.ty.to_string(),
            ));
        }
        Ok(members)
    }

    fn contains_pprod(&self) -> bool {
        match &self.node {
            ShapeNode::PProd(..) => true,
            ShapeNode::Pi { body, .. } | ShapeNode::Dual(body) => body.contains_pprod(),
            ShapeNode::Option { .. } => false,
        }
    }

    fn contains_dual(&self) -> bool {
        match &self.node {
            ShapeNode::Dual(_) => true,
            ShapeNode::Pi { body, .. } => body.contains_dual(),
            ShapeNode::PProd(a, b) => a.contains_dual() || b.contains_dual(),
            ShapeNode::Option { .. } => false,
        }
    }

    /// Members read inductively, and only those, carry a dual order.
    pub fn check_kind(&self, kind: OrderKind, name: &Name) -> DeriveResult<()> {
        if self.contains_dual() != kind.is_inductive() {
            return Err(DeriveError::invariant(
                format!("'{name}' is {kind} but its order does not match"),
                self.inst.to_string(),
            ));
        }
        Ok(())
    }

    /// Locals of the leading `Pi` nodes.
    pub fn pi_locals(&self) -> Vec<Expr> {
        let mut locals = Vec::new();
        let mut cur = self;
        while let ShapeNode::Pi { local, body, .. } = &cur.node {
            locals.push(local.clone());
            cur = &**body;
        }
        locals
    }

    /// Past the leading `Pi` nodes.
    pub fn leaf(&self) -> &CcpoShape {
        match &self.node {
            ShapeNode::Pi { body, .. } => body.leaf(),
            _ => self,
        }
    }

    /// Element type when the shape is `Pi* [Dual] Option`.
    pub fn option_elem(&self) -> Option<&Expr> {
        let leaf = self.leaf();
        let leaf = match &leaf.node {
            ShapeNode::Dual(inner) => &**inner,
            _ => leaf,
        };
        match &leaf.node {
            ShapeNode::Option { elem } => Some(elem),
            _ => None,
        }
    }
}
