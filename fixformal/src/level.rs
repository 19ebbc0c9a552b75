//! Universe levels.
//!
//! Levels follow the usual predicative hierarchy: `Sort 0` is `Prop`,
//! `Sort (u+1)` is `Type u`. `imax u v` is `0` when `v` is `0` and `max u v`
//! otherwise, which makes `∀ x : A, P` a proposition whenever `P` is one.
//!
//! Equality of levels is decided by [`Level::is_equiv`], which compares normal
//! forms (see [`Level::normalize`]).

use std::{fmt, sync::Arc};

use crate::{name::Name, variable::LMVarId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Zero,
    Succ(Arc<Level>),
    Max(Arc<Level>, Arc<Level>),
    IMax(Arc<Level>, Arc<Level>),
    Param(Name),
    MVar(LMVarId),
}

impl Level {
    pub fn zero() -> Self {
        Level::Zero
    }

    pub fn one() -> Self {
        Level::Zero.succ()
    }

    pub fn param(name: impl Into<Name>) -> Self {
        Level::Param(name.into())
    }

    pub fn succ(&self) -> Self {
        Level::Succ(Arc::new(self.clone()))
    }

    pub fn max(a: Level, b: Level) -> Self {
        Level::Max(Arc::new(a), Arc::new(b))
    }

    pub fn imax(a: Level, b: Level) -> Self {
        Level::IMax(Arc::new(a), Arc::new(b))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Level::Zero)
    }

    /// True when the level is provably nonzero for every assignment.
    pub fn is_never_zero(&self) -> bool {
        match self {
            Level::Zero | Level::Param(_) | Level::MVar(_) => false,
            Level::Succ(_) => true,
            Level::Max(a, b) => a.is_never_zero() || b.is_never_zero(),
            Level::IMax(_, b) => b.is_never_zero(),
        }
    }

    pub fn has_mvar(&self) -> bool {
        match self {
            Level::Zero | Level::Param(_) => false,
            Level::MVar(_) => true,
            Level::Succ(l) => l.has_mvar(),
            Level::Max(a, b) | Level::IMax(a, b) => a.has_mvar() || b.has_mvar(),
        }
    }

    pub fn has_param(&self) -> bool {
        match self {
            Level::Zero | Level::MVar(_) => false,
            Level::Param(_) => true,
            Level::Succ(l) => l.has_param(),
            Level::Max(a, b) | Level::IMax(a, b) => a.has_param() || b.has_param(),
        }
    }

    /// Rebuild the level, replacing leaves for which `f` returns `Some`.
    pub fn replace(&self, f: &mut impl FnMut(&Level) -> Option<Level>) -> Level {
        if let Some(r) = f(self) {
            return r;
        }
        match self {
            Level::Zero | Level::Param(_) | Level::MVar(_) => self.clone(),
            Level::Succ(l) => l.replace(f).succ(),
            Level::Max(a, b) => Level::max(a.replace(f), b.replace(f)),
            Level::IMax(a, b) => Level::imax(a.replace(f), b.replace(f)),
        }
    }

    /// Substitute universe parameters `params[i] := levels[i]`.
    pub fn instantiate_params(&self, params: &[Name], levels: &[Level]) -> Level {
        debug_assert_eq!(params.len(), levels.len());
        self.replace(&mut |l| match l {
            Level::Param(n) => params
                .iter()
                .position(|p| p == n)
                .map(|idx| levels[idx].clone()),
            _ => None,
        })
    }

    /// Append every parameter occurring in the level to `acc`, without duplicates.
    pub fn collect_params(&self, acc: &mut Vec<Name>) {
        match self {
            Level::Zero | Level::MVar(_) => {}
            Level::Param(n) => {
                if !acc.contains(n) {
                    acc.push(n.clone());
                }
            }
            Level::Succ(l) => l.collect_params(acc),
            Level::Max(a, b) | Level::IMax(a, b) => {
                a.collect_params(acc);
                b.collect_params(acc);
            }
        }
    }

    /// Split off trailing successors: `u+2` becomes `(u, 2)`.
    pub fn to_offset(&self) -> (&Level, u32) {
        let mut cur = self;
        let mut k = 0;
        while let Level::Succ(inner) = cur {
            cur = inner;
            k += 1;
        }
        (cur, k)
    }

    fn add_offset(mut self, k: u32) -> Level {
        for _ in 0..k {
            self = self.succ();
        }
        self
    }

    /// Normal form used for level equality.
    ///
    /// `max` is flattened, successors are pushed inside `max`, duplicate bases
    /// keep only their largest offset, constants dominated by another argument
    /// are dropped and the remaining arguments are sorted. `imax u v` becomes
    /// `max u v` when `v` is never zero and `0` when `v` is zero.
    pub fn normalize(&self) -> Level {
        match self {
            Level::Zero | Level::Param(_) | Level::MVar(_) => self.clone(),
            Level::Succ(_) => {
                let (base, k) = self.to_offset();
                let base = base.normalize();
                match base {
                    Level::Max(..) => {
                        let mut args = Vec::new();
                        push_max_args(&base, &mut args);
                        let shifted = args.into_iter().map(|a| a.add_offset(k));
                        rebuild_max(shifted.collect())
                    }
                    other => other.add_offset(k),
                }
            }
            Level::Max(a, b) => {
                let mut args = Vec::new();
                push_max_args(&a.normalize(), &mut args);
                push_max_args(&b.normalize(), &mut args);
                rebuild_max(args)
            }
            Level::IMax(a, b) => {
                let b = b.normalize();
                if b.is_zero() {
                    return Level::Zero;
                }
                if b.is_never_zero() {
                    return Level::max((**a).clone(), b).normalize();
                }
                let a = a.normalize();
                if a.is_zero() || a == b {
                    return b;
                }
                Level::imax(a, b)
            }
        }
    }

    /// Structural equality of normal forms.
    pub fn is_equiv(&self, other: &Level) -> bool {
        self == other || self.normalize() == other.normalize()
    }
}

fn push_max_args(l: &Level, acc: &mut Vec<Level>) {
    match l {
        Level::Max(a, b) => {
            push_max_args(a, acc);
            push_max_args(b, acc);
        }
        other => acc.push(other.clone()),
    }
}

fn rebuild_max(args: Vec<Level>) -> Level {
    // Keep the largest offset per base.
    let mut best: Vec<(Level, u32)> = Vec::new();
    for arg in &args {
        let (base, k) = arg.to_offset();
        match best.iter_mut().find(|(b, _)| b == base) {
            Some(entry) => entry.1 = entry.1.max(k),
            None => best.push((base.clone(), k)),
        }
    }

    // A constant `k` is dominated by any other argument with offset >= k.
    let max_non_const = best
        .iter()
        .filter(|(b, _)| !b.is_zero())
        .map(|(_, k)| *k)
        .max();
    if let Some(m) = max_non_const {
        best.retain(|(b, k)| !b.is_zero() || *k > m);
    }

    best.sort();
    let mut iter = best.into_iter().map(|(b, k)| b.add_offset(k)).rev();
    let Some(mut acc) = iter.next() else {
        return Level::Zero;
    };
    for arg in iter {
        acc = Level::max(arg, acc);
    }
    acc
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (base, k) = self.to_offset();
        match base {
            Level::Zero => write!(f, "{}", k),
            Level::Param(n) if k == 0 => write!(f, "{}", n),
            Level::MVar(m) if k == 0 => write!(f, "{}", m),
            Level::Max(a, b) if k == 0 => write!(f, "max ({}) ({})", a, b),
            Level::IMax(a, b) if k == 0 => write!(f, "imax ({}) ({})", a, b),
            _ => write!(f, "{}+{}", base, k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imax_with_successor_is_max() {
        let u = Level::param("u");
        let l = Level::imax(u.clone(), Level::imax(u.clone(), Level::one()));
        assert!(l.is_equiv(&Level::max(Level::one(), u.clone())));
        assert!(Level::imax(u.clone(), Level::zero()).is_equiv(&Level::zero()));
    }

    #[test]
    fn succ_distributes_over_max() {
        let u = Level::param("u");
        let v = Level::param("v");
        let l = Level::max(u.clone(), v.clone()).succ();
        assert!(l.is_equiv(&Level::max(v.succ(), u.succ())));
        assert!(!l.is_equiv(&Level::max(u.clone(), v.succ())));
    }

    #[test]
    fn dominated_constants_are_dropped() {
        let u = Level::param("u");
        assert!(Level::max(Level::one(), u.succ()).is_equiv(&u.succ()));
        assert!(!Level::max(Level::one(), u.clone()).is_equiv(&u));
    }

    #[test]
    fn instantiate_and_collect() {
        let u = Level::param("u");
        let l = Level::max(u.clone(), Level::param("v").succ());
        let mut params = Vec::new();
        l.collect_params(&mut params);
        assert_eq!(params, vec![Name::new("u"), Name::new("v")]);
        let inst = l.instantiate_params(&[Name::new("u"), Name::new("v")], &[Level::one(), Level::zero()]);
        assert!(inst.is_equiv(&Level::one()));
    }
}
