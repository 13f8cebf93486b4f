use log::trace;
use rayon::{
    iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator},
    ThreadPool,
};

/// Where block work runs.
#[derive(Clone, Copy, Default, Debug)]
pub enum Parallelism<'a> {
    /// On the calling thread, in block order.
    #[default]
    Serial,
    /// On rayon's global pool.
    Global,
    /// On a dedicated pool.
    Pool(&'a ThreadPool),
}

/// Estimated cost of processing one block.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TensorOpCost {
    pub bytes_loaded: f64,
    pub bytes_stored: f64,
    pub compute_cycles: f64,
}

impl TensorOpCost {
    const CYCLES_PER_BYTE: f64 = 11. / 64.;

    #[inline]
    pub fn cycles(&self) -> f64 {
        (self.bytes_loaded + self.bytes_stored) * Self::CYCLES_PER_BYTE + self.compute_cycles
    }
}

/// Smallest amount of work worth a task of its own.
const MIN_TASK_CYCLES: f64 = 10_000.;

impl Parallelism<'_> {
    pub fn num_threads(&self) -> usize {
        match self {
            Self::Serial => 1,
            Self::Global => rayon::current_num_threads(),
            Self::Pool(pool) => pool.current_num_threads(),
        }
    }

    #[inline]
    pub fn should_parallelize(&self) -> bool {
        self.num_threads() > 1
    }

    /// Runs `f` once per work item and returns when all of them are done.
    ///
    /// Items are handed out in batches sized so each batch is worth about 10k cycles
    /// according to `cost`. Calls cheaper than one batch stay on the calling thread.
    pub fn for_each<W, F>(self, work: Vec<W>, cost: TensorOpCost, f: F)
    where
        W: Send,
        F: Fn(usize, W) + Sync + Send,
    {
        let n = work.len();
        let unit = cost.cycles().max(f64::MIN_POSITIVE);
        if n <= 1 || !self.should_parallelize() || unit * n as f64 <= MIN_TASK_CYCLES {
            trace!("run {n} blocks serially");
            for (i, w) in work.into_iter().enumerate() {
                f(i, w)
            }
            return;
        }

        let min_len = ((MIN_TASK_CYCLES / unit).ceil() as usize).clamp(1, n);
        trace!(
            "run {n} blocks on {} threads, at least {min_len} per task",
            self.num_threads()
        );
        let run = || {
            work.into_par_iter()
                .enumerate()
                .with_min_len(min_len)
                .for_each(|(i, w)| f(i, w))
        };
        match self {
            Self::Pool(pool) => pool.install(run),
            Self::Global | Self::Serial => run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

    const CHEAP: TensorOpCost = TensorOpCost {
        bytes_loaded: 1.,
        bytes_stored: 1.,
        compute_cycles: 1.,
    };
    const EXPENSIVE: TensorOpCost = TensorOpCost {
        bytes_loaded: 512.,
        bytes_stored: 128.,
        compute_cycles: 256.,
    };

    #[test]
    fn test_serial_in_order() {
        let seen = std::sync::Mutex::new(Vec::new());
        Parallelism::Serial.for_each((0..10).collect(), EXPENSIVE, |i, w: usize| {
            assert_eq!(i, w);
            seen.lock().unwrap().push(i)
        });
        assert_eq!(seen.into_inner().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_item_once() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        for par in [Parallelism::Pool(&pool), Parallelism::Global] {
            for cost in [CHEAP, EXPENSIVE] {
                let counts = (0..1000).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
                par.for_each(counts.iter().collect(), cost, |_, c| {
                    c.fetch_add(1, Relaxed);
                });
                assert!(counts.iter().all(|c| c.load(Relaxed) == 1));
            }
        }
    }

    #[test]
    fn test_disjoint_writes() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();
        let mut out = vec![0usize; 4096];
        let work = out.chunks_mut(64).collect::<Vec<_>>();
        Parallelism::Pool(&pool).for_each(work, EXPENSIVE, |i, block| block.fill(i));
        for (j, x) in out.iter().enumerate() {
            assert_eq!(*x, j / 64)
        }
    }

    #[test]
    fn test_num_threads() {
        assert!(!Parallelism::Serial.should_parallelize());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        assert!(!Parallelism::Pool(&pool).should_parallelize());
    }
}
