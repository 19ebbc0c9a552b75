//! Realization of reserved names on demand.
//!
//! A name `<f>.<postfix>` is reserved as soon as `f` is registered as a
//! fixpoint and `postfix` is one of the principles a strategy knows how to
//! derive for it. Asking for the name realizes it: the first request derives
//! and adds the declaration, later requests find it in the environment.

use std::sync::Arc;

use fixformal::{env::ConstantInfo, env::Environment, meta::MetaCtx, name::Name};
use parking_lot::ReentrantMutex;

use crate::{
    config::DeriveOptions,
    error::{DeriveError, DeriveResult},
    group::FixpointGroup,
    induction,
    magic::{
        POSTFIX_COINDUCT, POSTFIX_FIXPOINT_INDUCT, POSTFIX_INDUCT, POSTFIX_MUTUAL_INDUCT,
        POSTFIX_PARTIAL_CORRECTNESS,
    },
    partial_correctness,
    registry::{FixpointInfo, FixpointRegistry},
    trace::TraceLog,
};

/// State threaded through one derivation.
pub struct DeriveCtx<'a> {
    pub meta: MetaCtx,
    pub options: &'a DeriveOptions,
    pub trace: TraceLog,
    /// Used to realize the principles a derivation builds upon.
    pub realizer: &'a Realizer,
}

impl<'a> DeriveCtx<'a> {
    pub fn new(realizer: &'a Realizer) -> Self {
        Self {
            meta: MetaCtx::new(realizer.env.clone()),
            options: &realizer.options,
            trace: TraceLog::new(&realizer.options.trace),
            realizer,
        }
    }
}

/// A family of principles derived for registered fixpoints.
pub trait DerivationStrategy: Send + Sync {
    /// Postfixes this strategy derives.
    fn postfixes(&self) -> &'static [&'static str];

    /// Whether `<member>.<postfix>` is reserved for the given group member,
    /// that is whether [`DerivationStrategy::derive`] produces it.
    fn is_reserved(&self, realizer: &Realizer, info: &Arc<FixpointInfo>, member: usize, postfix: &str) -> bool;

    /// Derive and add `<member>.<postfix>`. `Ok(None)` when the principle
    /// does not exist for this group.
    fn derive(
        &self,
        cx: &mut DeriveCtx<'_>,
        info: Arc<FixpointInfo>,
        member: usize,
        postfix: &str,
    ) -> DeriveResult<Option<Arc<ConstantInfo>>>;
}

/// `induct`, `coinduct`, `mutual_induct` and `fixpoint_induct`.
pub struct InductionStrategy;

impl DerivationStrategy for InductionStrategy {
    fn postfixes(&self) -> &'static [&'static str] {
        &[
            POSTFIX_INDUCT,
            POSTFIX_COINDUCT,
            POSTFIX_MUTUAL_INDUCT,
            POSTFIX_FIXPOINT_INDUCT,
        ]
    }

    fn is_reserved(&self, _realizer: &Realizer, info: &Arc<FixpointInfo>, member: usize, postfix: &str) -> bool {
        induction::check_postfix(info, member, postfix).is_ok()
    }

    fn derive(
        &self,
        cx: &mut DeriveCtx<'_>,
        info: Arc<FixpointInfo>,
        member: usize,
        postfix: &str,
    ) -> DeriveResult<Option<Arc<ConstantInfo>>> {
        induction::derive(cx, info, member, postfix).map(Some)
    }
}

/// `partial_correctness`.
pub struct PartialCorrectnessStrategy;

impl DerivationStrategy for PartialCorrectnessStrategy {
    fn postfixes(&self) -> &'static [&'static str] {
        &[POSTFIX_PARTIAL_CORRECTNESS]
    }

    fn is_reserved(&self, realizer: &Realizer, info: &Arc<FixpointInfo>, _member: usize, _postfix: &str) -> bool {
        let mut ctx = MetaCtx::new(realizer.env.clone());
        FixpointGroup::open(&mut ctx, info.clone()).is_ok_and(|group| partial_correctness::is_applicable(&group))
    }

    fn derive(
        &self,
        cx: &mut DeriveCtx<'_>,
        info: Arc<FixpointInfo>,
        member: usize,
        _postfix: &str,
    ) -> DeriveResult<Option<Arc<ConstantInfo>>> {
        partial_correctness::derive(cx, info, member)
    }
}

static STRATEGIES: &[&dyn DerivationStrategy] = &[&InductionStrategy, &PartialCorrectnessStrategy];

fn strategy_for(postfix: &str) -> Option<&'static dyn DerivationStrategy> {
    STRATEGIES
        .iter()
        .copied()
        .find(|s| s.postfixes().contains(&postfix))
}

/// Realize-or-fetch entry point over an environment and its fixpoint registry.
pub struct Realizer {
    env: Environment,
    registry: Arc<FixpointRegistry>,
    options: DeriveOptions,
    /// Held for the whole of a realization; derivations realize the
    /// principles they depend on while holding it.
    lock: ReentrantMutex<()>,
}

impl Realizer {
    pub fn new(env: Environment, registry: Arc<FixpointRegistry>, options: DeriveOptions) -> Self {
        Self {
            env,
            registry,
            options,
            lock: ReentrantMutex::new(()),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn registry(&self) -> &FixpointRegistry {
        &self.registry
    }

    pub fn options(&self) -> &DeriveOptions {
        &self.options
    }

    /// Split `<f>.<postfix>` into the registered group of `f`, the member
    /// index of `f` and the strategy for `postfix`.
    fn resolve(&self, name: &Name) -> Option<(Arc<FixpointInfo>, usize, &'static dyn DerivationStrategy)> {
        let strategy = strategy_for(name.last())?;
        let base = name.prefix();
        let info = self.registry.lookup(&base)?;
        let member = info.member_index(&base)?;
        Some((info, member, strategy))
    }

    /// Whether `name` is a principle that can be realized.
    pub fn is_reserved(&self, name: &Name) -> bool {
        self.resolve(name)
            .is_some_and(|(info, member, strategy)| strategy.is_reserved(self, &info, member, name.last()))
    }

    /// The declaration `name`, derived on first use.
    ///
    /// `Ok(None)` when `name` is neither declared nor derivable. A failed
    /// derivation adds nothing to the environment.
    pub fn realize(&self, name: &Name) -> DeriveResult<Option<Arc<ConstantInfo>>> {
        self.realize_traced(name).map(|(decl, _)| decl)
    }

    /// Like [`Realizer::realize`], failing with an applicability error
    /// instead of returning `None`.
    pub fn require(&self, name: &Name) -> DeriveResult<Arc<ConstantInfo>> {
        if let Some(decl) = self.realize(name)? {
            return Ok(decl);
        }
        let base = name.prefix();
        let Some(info) = self.registry.lookup(&base) else {
            return Err(DeriveError::NotAFixpoint(base));
        };
        let reason = if strategy_for(name.last()).is_some() {
            "not every member of its group returns an Option".to_string()
        } else {
            format!("unknown principle '{}'", name.last())
        };
        log::debug!("'{name}' cannot be derived for group of {} members", info.len());
        Err(DeriveError::NotApplicable {
            name: base,
            postfix: name.last().to_string(),
            reason,
        })
    }

    /// Like [`Realizer::realize`], also returning the trace of the derivation.
    /// The trace is empty when nothing had to be derived.
    pub fn realize_traced(&self, name: &Name) -> DeriveResult<(Option<Arc<ConstantInfo>>, TraceLog)> {
        let _guard = self.lock.lock();
        if let Some(decl) = self.env.find(name) {
            return Ok((Some(decl), TraceLog::new(&self.options.trace)));
        }
        let Some((info, member, strategy)) = self.resolve(name) else {
            return Ok((None, TraceLog::new(&self.options.trace)));
        };

        log::debug!("realizing '{name}'");
        let mut cx = DeriveCtx::new(self);
        let result = strategy.derive(&mut cx, info, member, name.last());
        cx.trace.flush();
        match &result {
            Ok(Some(_)) => log::debug!("realized '{name}'"),
            Ok(None) => log::debug!("'{name}' does not exist for this group"),
            Err(e) => log::debug!("failed to realize '{name}': {e}"),
        }
        Ok((result?, cx.trace))
    }
}
