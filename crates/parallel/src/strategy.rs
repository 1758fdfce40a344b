//! Parallel processing strategies

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Errors from setting up parallel execution
#[derive(Error, Debug)]
pub enum ParallelError {
    #[error("failed to build a thread pool of {threads} threads: {source}")]
    ThreadPool {
        threads: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// How a batch of independent jobs is run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded, in input order
    Sequential,
    /// Parallel on the global pool (all available cores)
    #[default]
    Parallel,
    /// Parallel on a dedicated pool with this many threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Mode for a `--threads` option: none means all cores, one means
    /// sequential.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            None | Some(0) => ProcessingMode::Parallel,
            Some(1) => ProcessingMode::Sequential,
            Some(n) => ProcessingMode::ParallelWith(n),
        }
    }
}

/// Strategy for parallel execution
pub trait ParallelStrategy {
    /// Map a fallible `f` over `items`, keeping input order. Stops at
    /// (and returns) an error from any job.
    fn try_par_map<I, T, E, F>(&self, items: &[I], f: F) -> Result<Vec<T>, E>
    where
        I: Sync,
        T: Send,
        E: Send + From<ParallelError>,
        F: Fn(&I) -> Result<T, E> + Sync + Send;
}

impl ParallelStrategy for ProcessingMode {
    fn try_par_map<I, T, E, F>(&self, items: &[I], f: F) -> Result<Vec<T>, E>
    where
        I: Sync,
        T: Send,
        E: Send + From<ParallelError>,
        F: Fn(&I) -> Result<T, E> + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => items.iter().map(f).collect(),
            ProcessingMode::Parallel => items.par_iter().map(f).collect(),
            ProcessingMode::ParallelWith(threads) => {
                let pool = build_pool(*threads)?;
                pool.install(|| items.par_iter().map(f).collect())
            }
        }
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool, ParallelError> {
    debug!(threads, "building thread pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|source| ParallelError::ThreadPool { threads, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum JobError {
        Odd(u32),
        Pool,
    }

    impl From<ParallelError> for JobError {
        fn from(_: ParallelError) -> Self {
            JobError::Pool
        }
    }

    const MODES: [ProcessingMode; 3] = [
        ProcessingMode::Sequential,
        ProcessingMode::Parallel,
        ProcessingMode::ParallelWith(2),
    ];

    #[test]
    fn test_try_par_map_keeps_order() {
        let years: Vec<u32> = (1985..=2020).collect();
        for mode in MODES {
            let out: Vec<u32> = mode.try_par_map(&years, |y| Ok::<_, JobError>(y * 2)).unwrap();
            assert_eq!(out.len(), 36);
            assert_eq!(out[0], 3970);
            assert_eq!(out[35], 4040);
        }
    }

    #[test]
    fn test_try_par_map_propagates_errors() {
        let items = vec![2u32, 4, 7, 8];
        for mode in MODES {
            let result: Result<Vec<u32>, JobError> =
                mode.try_par_map(&items, |&v| if v % 2 == 0 { Ok(v / 2) } else { Err(JobError::Odd(v)) });
            assert_eq!(result, Err(JobError::Odd(7)));
        }
        let ok: Result<Vec<u32>, JobError> =
            ProcessingMode::Parallel.try_par_map(&[2u32, 4], |&v| Ok(v / 2));
        assert_eq!(ok, Ok(vec![1, 2]));
    }

    #[test]
    fn test_from_threads() {
        assert_eq!(ProcessingMode::from_threads(None), ProcessingMode::Parallel);
        assert_eq!(ProcessingMode::from_threads(Some(1)), ProcessingMode::Sequential);
        assert_eq!(ProcessingMode::from_threads(Some(8)), ProcessingMode::ParallelWith(8));
    }
}
