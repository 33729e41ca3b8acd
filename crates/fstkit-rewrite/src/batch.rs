// Parallel rule compilation and application.
//
// Work items are independent: rules and inputs are shared read-only, each
// worker builds its own lattices. Cancellation is checked once per item,
// before the item starts; an item already running finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fstkit_core::Semiring;
use fstkit_fst::VectorFst;
use rayon::prelude::*;
use tracing::debug;

use crate::cdrewrite::{RuleOptions, cdrewrite};
use crate::error::RewriteError;
use crate::rewrite::{rewrites, top_rewrite};

/// Shared cancellation flag. Clones observe the same flag.
///
/// `cancel` stores with `Release`, workers load with `Acquire`; once set
/// the flag is never cleared.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), RewriteError> {
        if self.is_cancelled() {
            return Err(RewriteError::Cancelled);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BatchOptions {
    /// Size of a dedicated pool; `None` runs on the global rayon pool.
    pub threads: Option<usize>,
    /// Smallest number of items a worker takes at once.
    pub min_items_per_task: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            threads: None,
            min_items_per_task: 1,
        }
    }
}

/// The pieces of one rule for [`compile_rules`].
#[derive(Debug, Clone)]
pub struct RuleParts<W: Semiring> {
    pub tau: VectorFst<W>,
    pub lambda: VectorFst<W>,
    pub rho: VectorFst<W>,
    pub options: RuleOptions,
}

fn run<T: Send>(opts: &BatchOptions, job: impl FnOnce() -> T + Send) -> Result<T, RewriteError> {
    match opts.threads {
        None => Ok(job()),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| RewriteError::ThreadPool(e.to_string()))?;
            Ok(pool.install(job))
        }
    }
}

fn map_items<T, U, F>(
    items: &[T],
    opts: &BatchOptions,
    token: &CancellationToken,
    f: F,
) -> Result<Vec<Result<U, RewriteError>>, RewriteError>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U, RewriteError> + Sync + Send,
{
    debug!(items = items.len(), threads = ?opts.threads, "batch started");
    run(opts, || {
        items
            .par_iter()
            .with_min_len(opts.min_items_per_task.max(1))
            .map(|item| {
                token.check()?;
                f(item)
            })
            .collect()
    })
}

/// Compile every rule over `sigma_star`. Results are in input order.
/// The outer error is only for a pool that could not be built.
pub fn compile_rules<W: Semiring>(
    rules: &[RuleParts<W>],
    sigma_star: &VectorFst<W>,
    opts: &BatchOptions,
    token: &CancellationToken,
) -> Result<Vec<Result<VectorFst<W>, RewriteError>>, RewriteError> {
    map_items(rules, opts, token, |parts| {
        Ok(cdrewrite(
            &parts.tau,
            &parts.lambda,
            &parts.rho,
            sigma_star,
            &parts.options,
        )?)
    })
}

/// [`rewrites`] of every input under `rule`.
pub fn rewrite_batch<W: Semiring, S: AsRef<str> + Sync>(
    inputs: &[S],
    rule: &VectorFst<W>,
    opts: &BatchOptions,
    token: &CancellationToken,
) -> Result<Vec<Result<Vec<String>, RewriteError>>, RewriteError> {
    map_items(inputs, opts, token, |input| rewrites(input.as_ref(), rule))
}

/// [`top_rewrite`] of every input under `rule`.
pub fn top_rewrite_batch<W: Semiring, S: AsRef<str> + Sync>(
    inputs: &[S],
    rule: &VectorFst<W>,
    opts: &BatchOptions,
    token: &CancellationToken,
) -> Result<Vec<Result<String, RewriteError>>, RewriteError> {
    map_items(inputs, opts, token, |input| top_rewrite(input.as_ref(), rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdrewrite::RewriteMode;
    use crate::markers::sigma_star;
    use fstkit_core::TropicalWeight;
    use fstkit_fst::{accep, cross_strings};

    type W = TropicalWeight;

    fn parts(lambda: &str, mode: RewriteMode) -> RuleParts<W> {
        RuleParts {
            tau: cross_strings("b", "a", W::one()),
            lambda: accep(lambda, W::one()),
            rho: accep("b", W::one()),
            options: mode.into(),
        }
    }

    #[test]
    fn compiles_rules_in_order() {
        let defs = vec![
            parts("b", RewriteMode::ObligatoryLeftToRight),
            parts("b", RewriteMode::Simultaneous),
        ];
        let opts = BatchOptions {
            threads: Some(2),
            ..Default::default()
        };
        let rules = compile_rules(&defs, &sigma_star("abc"), &opts, &CancellationToken::new())
            .unwrap();
        let rules: Vec<VectorFst<W>> = rules.into_iter().map(Result::unwrap).collect();
        assert_eq!(top_rewrite("bbbb", &rules[0]).unwrap(), "babb");
        assert_eq!(top_rewrite("bbbb", &rules[1]).unwrap(), "baab");
    }

    #[test]
    fn parallel_matches_sequential() {
        let rule = cdrewrite(
            &cross_strings("b", "a", W::one()),
            &accep("b", W::one()),
            &accep("b", W::one()),
            &sigma_star("abc"),
            &RuleOptions::default(),
        )
        .unwrap();
        let inputs: Vec<String> = (0..40)
            .map(|i| ["bbb", "cbbbc", "abba", "bdb"][i % 4].to_string())
            .collect();
        let got = rewrite_batch(&inputs, &rule, &BatchOptions::default(), &CancellationToken::new())
            .unwrap();
        assert_eq!(got.len(), inputs.len());
        for (input, result) in inputs.iter().zip(&got) {
            assert_eq!(result, &rewrites(input.as_str(), &rule));
        }
        assert_eq!(got[3], Err(RewriteError::CompositionFailure));

        let top = top_rewrite_batch(&["bbb", "cbbbc"], &rule, &BatchOptions::default(), &CancellationToken::new())
            .unwrap();
        assert_eq!(top, vec![Ok("bab".to_string()), Ok("cbabc".to_string())]);
    }

    #[test]
    fn cancelled_items_report_cancelled() {
        let token = CancellationToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
        let defs = vec![parts("b", RewriteMode::Optional)];
        let results = compile_rules(&defs, &sigma_star("abc"), &BatchOptions::default(), &observer)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(RewriteError::Cancelled)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_from_json() {
        let opts: BatchOptions = serde_json::from_str(r#"{"threads": 4}"#).unwrap();
        assert_eq!(opts.threads, Some(4));
        assert_eq!(opts.min_items_per_task, 1);
    }
}
