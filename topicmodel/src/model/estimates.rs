use gibbslda_toolkit::running_mean::RunningMean;
use crate::model::{DocumentTo, Hyperparameters, Probability, SufficientStatistics, TopicTo, WordTo};
use crate::sampler::CountSource;

/// The running means of theta and phi over all samples taken so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEstimates {
    theta: DocumentTo<TopicTo<Probability>>,
    phi: TopicTo<WordTo<Probability>>,
    samples: usize,
    theta_buffer: TopicTo<Probability>,
    phi_buffer: WordTo<Probability>,
}

impl ParameterEstimates {
    pub fn zeroed(document_count: usize, topic_count: usize, vocabulary_size: usize) -> Self {
        Self {
            theta: vec![vec![0.0; topic_count]; document_count],
            phi: vec![vec![0.0; vocabulary_size]; topic_count],
            samples: 0,
            theta_buffer: vec![0.0; topic_count],
            phi_buffer: vec![0.0; vocabulary_size],
        }
    }

    /// The document-topic distribution of every document
    pub fn theta(&self) -> &[Vec<Probability>] {
        &self.theta
    }

    /// The topic-word distribution of every topic
    pub fn phi(&self) -> &[Vec<Probability>] {
        &self.phi
    }

    /// The number of samples in the means.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Folds the current state of the chain into theta and phi.
    pub fn fold_sample(&mut self, hyper: &Hyperparameters, stats: &SufficientStatistics, counts: &CountSource) {
        self.samples += 1;
        let count = self.samples;

        let k_alpha = hyper.topics() as f64 * hyper.alpha();
        for (document, theta) in self.theta.iter_mut().enumerate() {
            let denominator = stats.doc_length(document) as f64 + k_alpha;
            for (topic, value) in self.theta_buffer.iter_mut().enumerate() {
                *value = (stats.doc_topic(document, topic) as f64 + hyper.alpha()) / denominator;
            }
            theta.as_mut_slice().fold_sample(self.theta_buffer.as_slice(), count);
        }

        let v_beta = counts.smoothing_vocabulary_size(stats) as f64 * hyper.beta();
        for (topic, phi) in self.phi.iter_mut().enumerate() {
            let denominator = counts.corpus_topic_total(stats, topic) + v_beta;
            for (word, value) in self.phi_buffer.iter_mut().enumerate() {
                *value = (counts.corpus_word_total(stats, word, topic) + hyper.beta()) / denominator;
            }
            phi.as_mut_slice().fold_sample(self.phi_buffer.as_slice(), count);
        }
        log::trace!("Folded sample {count} into theta and phi.");
    }

    /// The estimate of theta for the current state only, without any averaging.
    pub fn point_theta(hyper: &Hyperparameters, stats: &SufficientStatistics) -> DocumentTo<TopicTo<Probability>> {
        let k_alpha = hyper.topics() as f64 * hyper.alpha();
        (0..stats.document_count()).map(|document| {
            let denominator = stats.doc_length(document) as f64 + k_alpha;
            (0..hyper.topics())
                .map(|topic| (stats.doc_topic(document, topic) as f64 + hyper.alpha()) / denominator)
                .collect()
        }).collect()
    }
}
