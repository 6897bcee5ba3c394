//! Ordered fallback chains over host operations.

use galley_traits::{HostError, HostResult};

/// A named way of achieving something against a context.
pub(crate) type Attempt<'a, C, T> = (&'static str, Box<dyn FnMut(&mut C) -> HostResult<T> + 'a>);

pub(crate) fn attempt<'a, C: ?Sized, T>(
    name: &'static str,
    run: impl FnMut(&mut C) -> HostResult<T> + 'a,
) -> Attempt<'a, C, T> {
    (name, Box::new(run))
}

/// Runs `attempts` in order and returns the first success with its name.
///
/// On total failure every attempt's error is returned, in order.
pub(crate) fn try_in_order<C: ?Sized, T>(
    ctx: &mut C,
    what: &str,
    attempts: Vec<Attempt<'_, C, T>>,
) -> Result<(&'static str, T), Vec<(&'static str, HostError)>> {
    let mut failures = Vec::new();
    for (name, mut run) in attempts {
        match run(ctx) {
            Ok(value) => {
                if !failures.is_empty() {
                    log::debug!("{}: '{}' succeeded after {} failed attempt(s).", what, name, failures.len());
                }
                return Ok((name, value));
            }
            Err(e) => {
                log::debug!("{}: '{}' failed: {}", what, name, e);
                failures.push((name, e));
            }
        }
    }
    Err(failures)
}

/// Renders collected failures for a log line.
pub(crate) fn describe_failures(failures: &[(&'static str, HostError)]) -> String {
    failures
        .iter()
        .map(|(name, e)| format!("{}: {}", name, e))
        .collect::<Vec<_>>()
        .join("; ")
}
