use itertools::Itertools;

/// Keeps a mean up to date without remembering the samples it was built from.
///
/// `count` is the number of samples including the new one, so the first
/// sample is folded with `count == 1` and simply replaces the old value.
pub trait RunningMean<S: ?Sized> {
    fn fold_sample(&mut self, sample: &S, count: usize);
}

impl RunningMean<f64> for f64 {
    #[inline]
    fn fold_sample(&mut self, sample: &f64, count: usize) {
        debug_assert!(count > 0, "A running mean needs at least one sample.");
        if count <= 1 {
            *self = *sample;
        } else {
            *self += (*sample - *self) / count as f64;
        }
    }
}

impl RunningMean<[f64]> for [f64] {
    fn fold_sample(&mut self, sample: &[f64], count: usize) {
        for (mean, value) in self.iter_mut().zip_eq(sample.iter()) {
            mean.fold_sample(value, count);
        }
    }
}
