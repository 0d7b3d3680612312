/// A pure predicate deciding whether an item counts.
///
/// Implemented for any `Fn(&str) -> bool` closure, so ad-hoc predicates can be
/// passed directly to the coordinator. Implementations must not depend on call
/// order: workers evaluate items in no particular order.
pub trait Filter: Send + Sync + 'static {
    fn matches(&self, item: &str) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn matches(&self, item: &str) -> bool {
        self(item)
    }
}

/// Substring filter: an item counts when it contains `pattern`.
#[derive(Clone, Debug)]
pub struct Contains {
    pattern: String,
    ignore_case: bool,
}

impl Contains {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ignore_case: false,
        }
    }

    /// Matches regardless of ASCII case.
    #[must_use]
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        if ignore_case {
            self.pattern.make_ascii_lowercase();
        }
        self.ignore_case = ignore_case;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Filter for Contains {
    fn matches(&self, item: &str) -> bool {
        if self.ignore_case {
            item.to_ascii_lowercase().contains(self.pattern.as_str())
        } else {
            item.contains(self.pattern.as_str())
        }
    }
}
