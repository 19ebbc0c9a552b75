//! Hierarchical, dot separated names (`Nat.succ`, `even.mutual_induct`).
//!
//! Names are immutable and cheap to clone (a single `Arc<str>`). The anonymous
//! name is the empty string.

use std::{borrow::Borrow, fmt, sync::Arc};

/// A hierarchical name such as `List.map.induct`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    /// Separator between name components.
    pub const SEPARATOR: char = '.';

    /// Create a name from its dotted textual form.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(Arc::from(s.as_ref()))
    }

    /// The anonymous (empty) name.
    pub fn anonymous() -> Self {
        Self(Arc::from(""))
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a component: `Name::new("f").str("induct") == "f.induct"`.
    pub fn str(&self, component: impl AsRef<str>) -> Name {
        if self.is_anonymous() {
            Name::new(component)
        } else {
            Name::new(format!("{}{}{}", self.0, Self::SEPARATOR, component.as_ref()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last component, or the whole name for atomic names.
    pub fn last(&self) -> &str {
        match self.0.rfind(Self::SEPARATOR) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Everything but the last component (anonymous for atomic names).
    pub fn prefix(&self) -> Name {
        match self.0.rfind(Self::SEPARATOR) {
            Some(idx) => Name::new(&self.0[..idx]),
            None => Name::anonymous(),
        }
    }

    /// Iterate over the components, first to last.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR).filter(|c| !c.is_empty())
    }

    /// Append a numeric suffix to the last component (`motive` -> `motive_2`).
    pub fn with_index(&self, idx: usize) -> Name {
        Name::new(format!("{}_{}", self.0, idx))
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(s)
    }
}

impl From<&Name> for Name {
    fn from(n: &Name) -> Self {
        n.clone()
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "[anonymous]")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_and_prefix() {
        let n = Name::new("List.map").str("induct");
        assert_eq!(n, "List.map.induct");
        assert_eq!(n.last(), "induct");
        assert_eq!(n.prefix(), "List.map");
        assert_eq!(n.components().count(), 3);
        assert!(Name::new("f").prefix().is_anonymous());
        assert_eq!(Name::anonymous().str("x"), "x");
        assert_eq!(Name::new("motive").with_index(2), "motive_2");
    }
}
