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

mod counts;

pub use counts::*;

use std::sync::atomic::{AtomicBool, Ordering};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::errors::RunError;
use crate::model::{DocumentId, LdaModel, Position, TopicId};

/// A source of uniform numbers in `[0, 1)`.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl UniformSource for StdRng {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.random::<f64>()
    }
}

impl<U: UniformSource + ?Sized> UniformSource for &mut U {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

/// A reproducible rng if a `seed` is given, otherwise one seeded by the os.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        None => StdRng::from_os_rng(),
        Some(seed) => StdRng::seed_from_u64(seed)
    }
}

/// The result of a single sweep over all documents.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SweepOutcome {
    Completed,
    /// Stopped before the given document
    Cancelled(DocumentId),
}

/// The collapsed Gibbs sampler.
#[derive(Debug)]
pub struct GibbsSampler<U> {
    /// The prefix sums of the weights of the candidate topics
    weights: Vec<f64>,
    uniform: U,
}

impl<U: UniformSource> GibbsSampler<U> {
    pub fn new(uniform: U) -> Self {
        Self { weights: Vec::new(), uniform }
    }

    pub fn uniform_mut(&mut self) -> &mut U {
        &mut self.uniform
    }

    pub fn into_uniform(self) -> U {
        self.uniform
    }

    /// Draws a new topic for the token at `position` of `document`.
    ///
    /// The token is removed from all counters, the weights of the candidate topics are
    /// accumulated and the new topic is drawn by inverse cdf. Afterwards the token is
    /// inserted again with the new topic.
    pub fn sample_token(&mut self, model: &mut LdaModel, counts: &mut CountSource, document: DocumentId, position: Position) -> TopicId {
        let doc = &model.corpus.documents()[document];
        let word = doc.words()[position];
        let old = model.assignment.get(document, position);
        model.stats.remove(document, word, old);
        counts.remove(document, word, old);

        let alpha = model.hyper.alpha();
        let beta = model.hyper.beta();
        let v_beta = counts.smoothing_vocabulary_size(&model.stats) as f64 * beta;
        let candidates = doc.candidate_topics(model.hyper.topics());

        self.weights.clear();
        let mut total = 0.0;
        for idx in 0..candidates.len() {
            let topic = candidates.topic_at(idx);
            let weight = (model.stats.doc_topic(document, topic) as f64 + alpha)
                * (counts.sampling_word_total(&model.stats, document, word, topic) + beta)
                / (counts.sampling_topic_total(&model.stats, document, topic) + v_beta);
            total += weight;
            self.weights.push(total);
        }

        let u = self.uniform.next_uniform() * total;
        let idx = self.weights
            .iter()
            .position(|cumulated| *cumulated > u)
            .unwrap_or(self.weights.len() - 1);
        let topic = candidates.topic_at(idx);

        model.stats.insert(document, word, topic);
        counts.insert(document, word, topic);
        model.assignment.set(document, position, topic);
        topic
    }

    /// Resamples every token once, document by document.
    /// `cancel` is checked before every document.
    pub fn sweep(&mut self, model: &mut LdaModel, counts: &mut CountSource, cancel: Option<&AtomicBool>) -> SweepOutcome {
        for document in 0..model.corpus.document_count() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return SweepOutcome::Cancelled(document)
            }
            for position in 0..model.corpus.documents()[document].len() {
                self.sample_token(model, counts, document, position);
            }
        }
        SweepOutcome::Completed
    }

    /// Runs `iterations` sweeps. After every sweep the estimates are updated if the
    /// schedule of the model asks for a sample, then `after_iteration` is called with
    /// the step of this run (starting at 1).
    pub fn run<F>(
        &mut self,
        model: &mut LdaModel,
        counts: &mut CountSource,
        iterations: usize,
        cancel: Option<&AtomicBool>,
        mut after_iteration: F
    ) -> Result<(), RunError>
    where
        F: FnMut(&LdaModel, &CountSource, usize) -> Result<(), RunError>
    {
        for step in 1..=iterations {
            let iteration = model.iteration + 1;
            log::debug!("Sampling iteration {iteration} ({step}/{iterations})");
            if let SweepOutcome::Cancelled(document) = self.sweep(model, counts, cancel) {
                log::warn!("Cancelled iteration {iteration} before document {document}.");
                return Err(RunError::Cancelled { iteration, last_complete: model.iteration })
            }
            model.iteration = iteration;
            if model.schedule.is_sample(step, iterations) {
                model.estimates.fold_sample(&model.hyper, &model.stats, counts);
            }
            after_iteration(model, counts, step)?;
        }
        Ok(())
    }
}
