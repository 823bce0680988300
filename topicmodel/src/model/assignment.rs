use crate::corpus::Corpus;
use crate::errors::ModelError;
use crate::model::{DocumentId, DocumentTo, Position, PositionTo, TopicId};
use crate::sampler::UniformSource;

/// The topic of every token, parallel to the documents of a [Corpus].
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Assignment {
    topics: DocumentTo<PositionTo<TopicId>>,
}

impl Assignment {
    pub fn new(topics: Vec<Vec<TopicId>>) -> Self {
        Self { topics }
    }

    /// Draws the topic of every token uniformly from the candidate topics of its document.
    pub fn random(corpus: &Corpus, topic_count: usize, uniform: &mut impl UniformSource) -> Self {
        let topics = corpus.documents().iter().map(|document| {
            let candidates = document.candidate_topics(topic_count);
            document.words().iter().map(|_| {
                let idx = (uniform.next_uniform() * candidates.len() as f64) as usize;
                candidates.topic_at(idx.min(candidates.len() - 1))
            }).collect()
        }).collect();
        Self { topics }
    }

    pub fn document_count(&self) -> usize {
        self.topics.len()
    }

    pub fn document(&self, document: DocumentId) -> &[TopicId] {
        &self.topics[document]
    }

    pub fn documents(&self) -> &[Vec<TopicId>] {
        &self.topics
    }

    #[inline]
    pub fn get(&self, document: DocumentId, position: Position) -> TopicId {
        self.topics[document][position]
    }

    #[inline]
    pub(crate) fn set(&mut self, document: DocumentId, position: Position, topic: TopicId) {
        self.topics[document][position] = topic;
    }

    /// Checks that the assignment fits to `corpus`: same shape, every topic in
    /// `[0, topic_count)` and inside the labels of its document.
    pub fn validate(&self, corpus: &Corpus, topic_count: usize) -> Result<(), ModelError> {
        if self.topics.len() != corpus.document_count() {
            return Err(ModelError::DocumentCountMismatch { expected: corpus.document_count(), actual: self.topics.len() })
        }
        for (document, (doc, topics)) in corpus.documents().iter().zip(self.topics.iter()).enumerate() {
            if doc.len() != topics.len() {
                return Err(ModelError::DocumentLengthMismatch { document, expected: doc.len(), actual: topics.len() })
            }
            let candidates = doc.candidate_topics(topic_count);
            for (position, topic) in topics.iter().copied().enumerate() {
                if topic >= topic_count {
                    return Err(ModelError::TopicOutOfRange { document, position, topic, topics: topic_count })
                }
                if !candidates.contains(topic) {
                    return Err(ModelError::LabelViolation { document, position, topic })
                }
            }
        }
        Ok(())
    }
}
