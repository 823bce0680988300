use crate::errors::ModelError;
use crate::model::{DocumentId, IsolatedCounts, SufficientStatistics, TopicId, WordId};

/// The read only counts of a trained model, seen through the local to global
/// word mapping of an inference corpus.
#[derive(Debug, Clone)]
pub struct FrozenCounts<'a> {
    stats: &'a SufficientStatistics,
    local_to_global: Vec<WordId>,
}

impl<'a> FrozenCounts<'a> {
    pub fn new(stats: &'a SufficientStatistics, local_to_global: Vec<WordId>) -> Self {
        Self { stats, local_to_global }
    }

    #[inline]
    fn word_topic(&self, local: WordId, topic: TopicId) -> f64 {
        self.stats.word_topic(self.local_to_global[local], topic) as f64
    }

    #[inline]
    fn topic_total(&self, topic: TopicId) -> f64 {
        self.stats.topic_total(topic) as f64
    }
}

/// Where the word-topic counts and the topic totals of the sampling weights come from.
#[derive(Debug, Clone)]
pub enum CountSource<'a> {
    /// Only the counts of the model itself (training)
    Local,
    /// The trained counts plus the counts of all new documents
    Merged(FrozenCounts<'a>),
    /// The trained counts plus the counts of the sampled document only
    Isolated(FrozenCounts<'a>, IsolatedCounts),
}

impl CountSource<'_> {
    /// The V used for smoothing, the size of the trained vocabulary in inference.
    #[inline]
    pub fn smoothing_vocabulary_size(&self, stats: &SufficientStatistics) -> usize {
        match self {
            CountSource::Local => stats.vocabulary_size(),
            CountSource::Merged(frozen) | CountSource::Isolated(frozen, _) => frozen.stats.vocabulary_size(),
        }
    }

    /// The count of `word` in `topic` as seen while sampling a token of `document`.
    #[inline]
    pub fn sampling_word_total(&self, stats: &SufficientStatistics, document: DocumentId, word: WordId, topic: TopicId) -> f64 {
        match self {
            CountSource::Local => stats.word_topic(word, topic) as f64,
            CountSource::Merged(frozen) => frozen.word_topic(word, topic) + stats.word_topic(word, topic) as f64,
            CountSource::Isolated(frozen, isolated) => {
                frozen.word_topic(word, topic) + isolated.document(document).word_topic(word, topic) as f64
            }
        }
    }

    /// The size of `topic` as seen while sampling a token of `document`.
    #[inline]
    pub fn sampling_topic_total(&self, stats: &SufficientStatistics, document: DocumentId, topic: TopicId) -> f64 {
        match self {
            CountSource::Local => stats.topic_total(topic) as f64,
            CountSource::Merged(frozen) => frozen.topic_total(topic) + stats.topic_total(topic) as f64,
            CountSource::Isolated(frozen, isolated) => {
                frozen.topic_total(topic) + isolated.document(document).topic_total(topic) as f64
            }
        }
    }

    /// The count of `word` in `topic` over the whole corpus, used for phi.
    /// Isolated documents are merged here, phi is a property of the whole batch.
    #[inline]
    pub fn corpus_word_total(&self, stats: &SufficientStatistics, word: WordId, topic: TopicId) -> f64 {
        match self {
            CountSource::Local => stats.word_topic(word, topic) as f64,
            CountSource::Merged(frozen) | CountSource::Isolated(frozen, _) => {
                frozen.word_topic(word, topic) + stats.word_topic(word, topic) as f64
            }
        }
    }

    /// The size of `topic` over the whole corpus, used for phi.
    #[inline]
    pub fn corpus_topic_total(&self, stats: &SufficientStatistics, topic: TopicId) -> f64 {
        match self {
            CountSource::Local => stats.topic_total(topic) as f64,
            CountSource::Merged(frozen) | CountSource::Isolated(frozen, _) => {
                frozen.topic_total(topic) + stats.topic_total(topic) as f64
            }
        }
    }

    #[inline]
    pub(crate) fn remove(&mut self, document: DocumentId, word: WordId, topic: TopicId) {
        if let CountSource::Isolated(_, isolated) = self {
            isolated.remove(document, word, topic);
        }
    }

    #[inline]
    pub(crate) fn insert(&mut self, document: DocumentId, word: WordId, topic: TopicId) {
        if let CountSource::Isolated(_, isolated) = self {
            isolated.insert(document, word, topic);
        }
    }

    pub fn check_invariants(&self) -> Result<(), ModelError> {
        match self {
            CountSource::Isolated(_, isolated) => isolated.check_invariants(),
            _ => Ok(())
        }
    }
}
