use std::fmt;

/// Absolute and relative difference between an original value and its reconstruction.
#[derive(Clone, Copy, Debug)]
pub struct Diff {
    pub abs: f64,
    pub rel: f64,
}

impl Diff {
    pub fn new(a: f32, b: f32) -> Self {
        let (a, b) = (a as f64, b as f64);
        let abs = (a - b).abs();
        let rel = if a == 0. { abs } else { abs / a.abs() };
        Self { abs, rel }
    }
}

/// Collects diffs and remembers which ones exceed both tolerances.
pub struct ErrorCollector {
    abs: f64,
    rel: f64,
    count: usize,
    max: Diff,
    sum_abs: f64,
    outliers: Vec<usize>,
}

impl ErrorCollector {
    pub fn new(abs: f64, rel: f64) -> Self {
        Self {
            abs,
            rel,
            count: 0,
            max: Diff { abs: 0., rel: 0. },
            sum_abs: 0.,
            outliers: Vec::new(),
        }
    }

    pub fn push(&mut self, diff: Diff) {
        if diff.abs > self.abs && diff.rel > self.rel {
            self.outliers.push(self.count)
        }
        self.max.abs = self.max.abs.max(diff.abs);
        self.max.rel = self.max.rel.max(diff.rel);
        self.sum_abs += diff.abs;
        self.count += 1;
    }

    pub fn outliers(&self) -> &[usize] {
        &self.outliers
    }
}

impl fmt::Display for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "abs: {:.3e} (mean {:.3e}), rel: {:.3e}, outliers: {}/{}",
            self.max.abs,
            self.sum_abs / self.count.max(1) as f64,
            self.max.rel,
            self.outliers.len(),
            self.count,
        )
    }
}
