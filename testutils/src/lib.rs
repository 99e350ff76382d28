//! Utilities used in tests in multiple crates within the workspace.

use std::{
    fmt::{Debug, Display},
    marker::PhantomData,
};

use googletest::{
    description::Description,
    matcher::{Matcher, MatcherBase, MatcherResult},
};

/// Creates a matcher against an `anyhow::Error` that downcasts to the given
/// type and matches the inner matcher.
pub fn anyhow_downcasts_to<E, M>(inner: M) -> AnyhowDowncastTo<E, fn(&E) -> E, M>
where
    E: Copy,
{
    AnyhowDowncastTo {
        project: |e: &E| *e,
        inner,
        phantom_e: Default::default(),
    }
}

/// Creates a matcher against an `anyhow::Error` that downcasts to `E`, maps
/// the concrete error through `project`, and matches the projected value with
/// the inner matcher.
///
/// Useful for error types that carry owned payloads and so cannot be compared
/// by value, but that expose a `Copy` summary such as a kind discriminant.
pub fn anyhow_downcast_map<E, K, F, M>(project: F, inner: M) -> AnyhowDowncastTo<E, F, M>
where
    F: Fn(&E) -> K,
{
    AnyhowDowncastTo {
        project,
        inner,
        phantom_e: Default::default(),
    }
}

pub struct AnyhowDowncastTo<E, F, M> {
    project: F,
    inner: M,
    phantom_e: PhantomData<E>,
}

impl<E, F, M> AnyhowDowncastTo<E, F, M> {
    fn type_name() -> &'static str {
        std::any::type_name::<E>()
    }
}

impl<E, F, M> MatcherBase for AnyhowDowncastTo<E, F, M> {}

impl<E, K, F, M> Matcher<&anyhow::Error> for AnyhowDowncastTo<E, F, M>
where
    E: Display + Debug + Send + Sync + 'static,
    K: Copy + Debug,
    F: Fn(&E) -> K,
    M: Matcher<K>,
{
    fn matches(&self, actual: &anyhow::Error) -> MatcherResult {
        actual
            .downcast_ref::<E>()
            .map(|v| self.inner.matches((self.project)(v)))
            .unwrap_or(MatcherResult::NoMatch)
    }

    fn explain_match(&self, actual: &anyhow::Error) -> Description {
        match actual.downcast_ref::<E>() {
            Some(e) => Description::new()
                .text(format!(
                    "which is of the expected concrete error type {}",
                    Self::type_name()
                ))
                .text("with value")
                .nested(self.inner.explain_match((self.project)(e))),
            None => Description::new().text(format!(
                "which is not the expected concrete error type {}: {:#}",
                Self::type_name(),
                actual,
            )),
        }
    }

    fn describe(&self, matcher_result: MatcherResult) -> Description {
        match matcher_result {
            MatcherResult::Match => format!(
                "is of concrete error type {} with value which {}",
                Self::type_name(),
                self.inner.describe(MatcherResult::Match)
            )
            .into(),
            MatcherResult::NoMatch => format!(
                "is or is not a concrete error type {} with value which {}",
                Self::type_name(),
                self.inner.describe(MatcherResult::NoMatch)
            )
            .into(),
        }
    }
}
