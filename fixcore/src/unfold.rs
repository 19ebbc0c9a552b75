//! Unfolding the approximation relation of a group member.
//!
//! `rel T inst a b` is pushed through the shape of `inst`: a `Pi` node becomes
//! `∀ y, rel (B y) (inst y) (a y) (b y)`, a `Dual` node swaps the operands and
//! the `Option` leaf is kept as a `rel` application on the flat order, with
//! the side holding the step head-normalized.

use fixformal::{expr::Expr, meta::MetaCtx, name::Name};

use crate::{
    error::{DeriveError, DeriveResult},
    fixtrace,
    group::FixpointGroup,
    magic::TRACE_UNFOLD,
    order::names::REL,
    pprod::mk_pack_type,
    registry::OrderKind,
    shape::{CcpoShape, ShapeNode},
    trace::TraceLog,
};

/// `rel ty inst a b`.
pub fn mk_rel(ctx: &mut MetaCtx, ty: &Expr, inst: &Expr, a: &Expr, b: &Expr) -> DeriveResult<Expr> {
    let level = ctx.get_level(ty)?;
    Ok(Expr::mk_app(
        Expr::constant(REL, [level]),
        [ty.clone(), inst.clone(), a.clone(), b.clone()],
    ))
}

/// Unfold `rel_app`, a `rel` application over `shape`, for a member of the
/// given kind. `name` is only used to report lattice-theoretic members.
pub fn unfold_relation(
    ctx: &mut MetaCtx,
    shape: &CcpoShape,
    kind: OrderKind,
    name: &Name,
    rel_app: &Expr,
) -> DeriveResult<Expr> {
    if kind.is_lattice_theoretic() {
        return Err(DeriveError::LatticeTheoretic(name.clone()));
    }
    unfold_node(ctx, shape, kind, rel_app)
}

fn unfold_node(ctx: &mut MetaCtx, shape: &CcpoShape, kind: OrderKind, rel_app: &Expr) -> DeriveResult<Expr> {
    if !rel_app.is_app_of(REL, 4) {
        return Err(DeriveError::invariant(
            "expected an approximation relation",
            ctx.pp(rel_app),
        ));
    }
    let args = rel_app.get_app_args();
    let (a, b) = (&args[2], &args[3]);
    match &shape.node {
        ShapeNode::Pi { local, body, .. } => {
            let a = Expr::app(a.clone(), local.clone()).head_beta();
            let b = Expr::app(b.clone(), local.clone()).head_beta();
            let inner = mk_rel(ctx, &body.ty, &body.inst, &a, &b)?;
            let inner = unfold_node(ctx, body, kind, &inner)?;
            Ok(ctx.mk_forall_fvars(std::slice::from_ref(local), &inner)?)
        }
        ShapeNode::Dual(inner) if kind.is_inductive() => {
            let swapped = mk_rel(ctx, &inner.ty, &inner.inst, b, a)?;
            unfold_node(ctx, inner, kind, &swapped)
        }
        ShapeNode::Option { .. } => {
            let (a, b) = match kind {
                OrderKind::Inductive => (ctx.whnf(a)?, b.clone()),
                _ => (a.clone(), ctx.whnf(b)?),
            };
            mk_rel(ctx, &shape.ty, &shape.inst, &a, &b)
        }
        ShapeNode::Dual(_) | ShapeNode::PProd(..) => Err(DeriveError::invariant(
            format!("unexpected order while unfolding a {kind} relation"),
            ctx.pp(&shape.inst),
        )),
    }
}

/// Unfolded `rel Tᵢ instᵢ approx next` for member `i` of `group`.
pub fn member_relation(
    ctx: &mut MetaCtx,
    trace: &mut TraceLog,
    group: &FixpointGroup,
    i: usize,
    approx: &Expr,
    next: &Expr,
) -> DeriveResult<Expr> {
    let shape = &group.members[i];
    let rel = mk_rel(ctx, &group.types[i], &shape.inst, approx, next)?;
    let unfolded = unfold_relation(ctx, shape, group.kind(i), group.name(i), &rel)?;
    fixtrace!(*trace, TRACE_UNFOLD, "{}: {}", group.name(i), ctx.pp(&unfolded));
    Ok(unfolded)
}

/// Right-nested conjunction of the member relations `rel Tᵢ instᵢ lhsᵢ rhsᵢ`.
pub fn combined_relation(
    ctx: &mut MetaCtx,
    trace: &mut TraceLog,
    group: &FixpointGroup,
    lhs: &[Expr],
    rhs: &[Expr],
) -> DeriveResult<Expr> {
    if lhs.len() != group.len() || rhs.len() != group.len() {
        return Err(DeriveError::invariant(
            format!("expected {} operands per side", group.len()),
            group.name(0).to_string(),
        ));
    }
    let relations = lhs
        .iter()
        .zip(rhs)
        .enumerate()
        .map(|(i, (a, b))| member_relation(ctx, trace, group, i, a, b))
        .collect::<DeriveResult<Vec<_>>>()?;
    let combined = mk_pack_type(ctx, &relations)?;
    fixtrace!(*trace, TRACE_UNFOLD, "combined: {}", ctx.pp(&combined));
    Ok(combined)
}
