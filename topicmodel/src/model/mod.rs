//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

mod assignment;
mod stats;
mod estimates;
mod classic_serialisation;

pub use assignment::*;
pub use stats::*;
pub use estimates::*;
pub use classic_serialisation::*;

use std::num::NonZeroUsize;
use serde::{Deserialize, Serialize};
use crate::corpus::Corpus;
use crate::errors::ModelError;
use crate::sampler::UniformSource;
use crate::vocabulary::StringVocabulary;

pub type TopicTo<T> = Vec<T>;
pub type WordTo<T> = Vec<T>;
pub type PositionTo<T> = Vec<T>;
pub type DocumentTo<T> = Vec<T>;
pub type Probability = f64;

pub type WordId = usize;
pub type TopicId = usize;
pub type Position = usize;
pub type DocumentId = usize;
pub type Count = u32;

/// K, alpha and beta of a model
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    topics: usize,
    alpha: f64,
    beta: f64,
}

impl Hyperparameters {
    pub fn new(topics: usize, alpha: f64, beta: f64) -> Result<Self, ModelError> {
        if topics == 0 {
            return Err(ModelError::NoTopics)
        }
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(ModelError::InvalidHyperparameter { name: "alpha", value: alpha })
        }
        if !beta.is_finite() || beta <= 0.0 {
            return Err(ModelError::InvalidHyperparameter { name: "beta", value: beta })
        }
        Ok(Self { topics, alpha, beta })
    }

    /// The number of topics K
    #[inline]
    pub fn topics(&self) -> usize {
        self.topics
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

/// Decides which iterations of a run are folded into theta and phi.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SamplingSchedule {
    pub burn_in: usize,
    pub lag: NonZeroUsize,
}

impl Default for SamplingSchedule {
    fn default() -> Self {
        Self { burn_in: 0, lag: NonZeroUsize::MIN }
    }
}

impl SamplingSchedule {
    pub fn new(burn_in: usize, lag: NonZeroUsize) -> Self {
        Self { burn_in, lag }
    }

    /// `step` counts the iterations of the current run starting at 1, `total` is the last step.
    pub fn is_sample(&self, step: usize, total: usize) -> bool {
        step == total || (step > self.burn_in && (step - self.burn_in) % self.lag.get() == 0)
    }
}

/// An LDA model in the middle of (or after) Gibbs sampling.
#[derive(Debug, Clone)]
pub struct LdaModel {
    pub(crate) hyper: Hyperparameters,
    pub(crate) corpus: Corpus,
    pub(crate) assignment: Assignment,
    pub(crate) stats: SufficientStatistics,
    pub(crate) estimates: ParameterEstimates,
    /// The last completed iteration
    pub(crate) iteration: usize,
    pub(crate) schedule: SamplingSchedule,
}

impl LdaModel {
    /// A fresh model with a random assignment over `corpus`.
    pub fn random(corpus: Corpus, hyper: Hyperparameters, uniform: &mut impl UniformSource) -> Result<Self, ModelError> {
        let (stats, assignment) = SufficientStatistics::init_random(&corpus, hyper.topics(), uniform)?;
        Ok(Self::assemble(corpus, assignment, stats, hyper, 0))
    }

    /// A model that continues from a known `assignment`, the counts are replayed.
    pub fn from_assignment(corpus: Corpus, assignment: Assignment, hyper: Hyperparameters, iteration: usize) -> Result<Self, ModelError> {
        corpus.check_labels(hyper.topics())?;
        let stats = SufficientStatistics::from_assignment(&corpus, &assignment, hyper.topics())?;
        Ok(Self::assemble(corpus, assignment, stats, hyper, iteration))
    }

    fn assemble(corpus: Corpus, assignment: Assignment, stats: SufficientStatistics, hyper: Hyperparameters, iteration: usize) -> Self {
        let estimates = ParameterEstimates::zeroed(corpus.document_count(), hyper.topics(), corpus.vocabulary_size());
        Self {
            hyper,
            corpus,
            assignment,
            stats,
            estimates,
            iteration,
            schedule: SamplingSchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: SamplingSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    pub fn topic_count(&self) -> usize {
        self.hyper.topics()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn vocabulary(&self) -> &StringVocabulary {
        self.corpus.vocabulary()
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn stats(&self) -> &SufficientStatistics {
        &self.stats
    }

    pub fn estimates(&self) -> &ParameterEstimates {
        &self.estimates
    }

    /// The document-topic distributions (M x K)
    pub fn theta(&self) -> &[Vec<Probability>] {
        self.estimates.theta()
    }

    /// The topic-word distributions (K x V)
    pub fn phi(&self) -> &[Vec<Probability>] {
        self.estimates.phi()
    }

    /// The last completed iteration
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn schedule(&self) -> &SamplingSchedule {
        &self.schedule
    }

    pub fn check_invariants(&self) -> Result<(), ModelError> {
        self.stats.check_invariants()
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;
    use crate::model::{Hyperparameters, SamplingSchedule};

    #[test]
    fn hyperparameters_are_validated(){
        assert!(Hyperparameters::new(0, 0.1, 0.1).is_err());
        assert!(Hyperparameters::new(2, -0.1, 0.1).is_err());
        assert!(Hyperparameters::new(2, 0.1, f64::NAN).is_err());
        assert!(Hyperparameters::new(2, 0.1, 0.1).is_ok());
    }

    #[test]
    fn samples_after_burn_in_every_lag_and_at_the_end(){
        let schedule = SamplingSchedule::new(4, NonZeroUsize::new(3).unwrap());
        let sampled = (1..=12).filter(|step| schedule.is_sample(*step, 12)).collect::<Vec<_>>();
        assert_eq!(vec![7, 10, 12], sampled);

        let schedule = SamplingSchedule::new(0, NonZeroUsize::MIN);
        assert!(schedule.is_sample(1, 1));
        assert_eq!(5, (1..=5).filter(|step| schedule.is_sample(*step, 5)).count());
    }
}
