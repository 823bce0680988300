use std::collections::HashMap;
use crate::corpus::Corpus;
use crate::errors::ModelError;
use crate::model::assignment::Assignment;
use crate::model::{Count, DocumentId, DocumentTo, TopicId, TopicTo, WordId, WordTo};
use crate::sampler::UniformSource;

/// The counts the collapsed Gibbs sampler works on.
///
/// They are never stored, [SufficientStatistics::from_assignment] regenerates
/// them from an [Assignment]. Afterwards every change is a [remove](SufficientStatistics::remove)
/// of a token followed by an [insert](SufficientStatistics::insert) of the same token.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SufficientStatistics {
    topic_count: usize,
    /// nw: word -> topic -> count (V x K)
    word_topic: WordTo<TopicTo<Count>>,
    /// nd: document -> topic -> count (M x K)
    doc_topic: DocumentTo<TopicTo<Count>>,
    /// nwsum: topic -> count (K)
    topic_totals: TopicTo<Count>,
    /// ndsum: document -> count (M)
    doc_lengths: DocumentTo<Count>,
}

impl SufficientStatistics {
    pub fn zeroed(topic_count: usize, vocabulary_size: usize, document_count: usize) -> Self {
        Self {
            topic_count,
            word_topic: vec![vec![0; topic_count]; vocabulary_size],
            doc_topic: vec![vec![0; topic_count]; document_count],
            topic_totals: vec![0; topic_count],
            doc_lengths: vec![0; document_count],
        }
    }

    /// Replays every token of `assignment` exactly once.
    pub fn from_assignment(corpus: &Corpus, assignment: &Assignment, topic_count: usize) -> Result<Self, ModelError> {
        assignment.validate(corpus, topic_count)?;
        let mut stats = Self::zeroed(topic_count, corpus.vocabulary_size(), corpus.document_count());
        for (document, doc) in corpus.documents().iter().enumerate() {
            for (word, topic) in doc.words().iter().copied().zip(assignment.document(document).iter().copied()) {
                stats.insert(document, word, topic);
            }
        }
        Ok(stats)
    }

    /// Draws a random [Assignment] and counts it.
    pub fn init_random(corpus: &Corpus, topic_count: usize, uniform: &mut impl UniformSource) -> Result<(Self, Assignment), ModelError> {
        if topic_count == 0 {
            return Err(ModelError::NoTopics)
        }
        corpus.check_labels(topic_count)?;
        let assignment = Assignment::random(corpus, topic_count, uniform);
        let stats = Self::from_assignment(corpus, &assignment, topic_count)?;
        Ok((stats, assignment))
    }

    /// Removes a token of `word` in `document` with `topic` from every counter.
    #[inline]
    pub(crate) fn remove(&mut self, document: DocumentId, word: WordId, topic: TopicId) {
        self.word_topic[word][topic] -= 1;
        self.doc_topic[document][topic] -= 1;
        self.topic_totals[topic] -= 1;
        self.doc_lengths[document] -= 1;
    }

    /// Adds a token of `word` in `document` with `topic` to every counter.
    #[inline]
    pub(crate) fn insert(&mut self, document: DocumentId, word: WordId, topic: TopicId) {
        self.word_topic[word][topic] += 1;
        self.doc_topic[document][topic] += 1;
        self.topic_totals[topic] += 1;
        self.doc_lengths[document] += 1;
    }

    pub fn topic_count(&self) -> usize {
        self.topic_count
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_topic.len()
    }

    pub fn document_count(&self) -> usize {
        self.doc_topic.len()
    }

    #[inline]
    pub fn word_topic(&self, word: WordId, topic: TopicId) -> Count {
        self.word_topic[word][topic]
    }

    #[inline]
    pub fn doc_topic(&self, document: DocumentId, topic: TopicId) -> Count {
        self.doc_topic[document][topic]
    }

    pub fn doc_topic_row(&self, document: DocumentId) -> &[Count] {
        &self.doc_topic[document]
    }

    #[inline]
    pub fn topic_total(&self, topic: TopicId) -> Count {
        self.topic_totals[topic]
    }

    #[inline]
    pub fn doc_length(&self, document: DocumentId) -> Count {
        self.doc_lengths[document]
    }

    /// Checks Σ_w nw[w][k] == nwsum[k] for every topic and Σ_k nd[m][k] == ndsum[m] for every document.
    pub fn check_invariants(&self) -> Result<(), ModelError> {
        for topic in 0..self.topic_count {
            let actual = self.word_topic.iter().map(|row| row[topic] as u64).sum::<u64>();
            let expected = self.topic_totals[topic] as u64;
            if actual != expected {
                return Err(ModelError::TopicTotalMismatch { topic, expected, actual })
            }
        }
        for (document, row) in self.doc_topic.iter().enumerate() {
            let actual = row.iter().map(|value| *value as u64).sum::<u64>();
            let expected = self.doc_lengths[document] as u64;
            if actual != expected {
                return Err(ModelError::DocumentTotalMismatch { document, expected, actual })
            }
        }
        Ok(())
    }
}

/// The counts of a single inference document.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DocumentCounts {
    /// local word id -> topic -> count
    word_topic: HashMap<WordId, TopicTo<Count>>,
    topic_totals: TopicTo<Count>,
}

impl DocumentCounts {
    fn new(topic_count: usize) -> Self {
        Self { word_topic: HashMap::new(), topic_totals: vec![0; topic_count] }
    }

    #[inline]
    pub fn word_topic(&self, word: WordId, topic: TopicId) -> Count {
        self.word_topic.get(&word).map_or(0, |row| row[topic])
    }

    #[inline]
    pub fn topic_total(&self, topic: TopicId) -> Count {
        self.topic_totals[topic]
    }
}

/// Keeps the contribution of every inference document apart, so that the
/// documents of one batch can not influence each other.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IsolatedCounts {
    topic_count: usize,
    per_document: DocumentTo<DocumentCounts>,
}

impl IsolatedCounts {
    pub fn from_assignment(corpus: &Corpus, assignment: &Assignment, topic_count: usize) -> Result<Self, ModelError> {
        assignment.validate(corpus, topic_count)?;
        let mut counts = Self {
            topic_count,
            per_document: vec![DocumentCounts::new(topic_count); corpus.document_count()],
        };
        for (document, doc) in corpus.documents().iter().enumerate() {
            for (word, topic) in doc.words().iter().copied().zip(assignment.document(document).iter().copied()) {
                counts.insert(document, word, topic);
            }
        }
        Ok(counts)
    }

    pub fn document(&self, document: DocumentId) -> &DocumentCounts {
        &self.per_document[document]
    }

    #[inline]
    pub(crate) fn remove(&mut self, document: DocumentId, word: WordId, topic: TopicId) {
        let counts = &mut self.per_document[document];
        match counts.word_topic.get_mut(&word) {
            Some(row) => row[topic] -= 1,
            None => {
                debug_assert!(false, "The word {word} was never inserted into document {document}.");
                log::error!("The word {word} was never inserted into document {document}.");
            }
        }
        counts.topic_totals[topic] -= 1;
    }

    #[inline]
    pub(crate) fn insert(&mut self, document: DocumentId, word: WordId, topic: TopicId) {
        let topic_count = self.topic_count;
        let counts = &mut self.per_document[document];
        counts.word_topic.entry(word).or_insert_with(|| vec![0; topic_count])[topic] += 1;
        counts.topic_totals[topic] += 1;
    }

    /// The per document version of [SufficientStatistics::check_invariants].
    pub fn check_invariants(&self) -> Result<(), ModelError> {
        for (document, counts) in self.per_document.iter().enumerate() {
            for topic in 0..self.topic_count {
                let actual = counts.word_topic.values().map(|row| row[topic] as u64).sum::<u64>();
                let expected = counts.topic_totals[topic] as u64;
                if actual != expected {
                    log::error!("The isolated counts of document {document} are inconsistent.");
                    return Err(ModelError::TopicTotalMismatch { topic, expected, actual })
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::corpus::CorpusBuilder;
    use crate::model::assignment::Assignment;
    use crate::model::stats::{IsolatedCounts, SufficientStatistics};

    #[test]
    fn replaying_an_assignment_counts_every_token_once(){
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["a a b", "b b a"]);
        let corpus = builder.build();
        let assignment = Assignment::new(vec![vec![0, 1, 1], vec![1, 1, 0]]);
        let stats = SufficientStatistics::from_assignment(&corpus, &assignment, 2).unwrap();
        stats.check_invariants().unwrap();
        assert_eq!(1, stats.word_topic(0, 0));
        assert_eq!(2, stats.word_topic(0, 1));
        assert_eq!(3, stats.word_topic(1, 1));
        assert_eq!(2, stats.topic_total(0));
        assert_eq!(4, stats.topic_total(1));
        assert_eq!(&[1, 2], stats.doc_topic_row(0));
        assert_eq!(3, stats.doc_length(1));
    }

    #[test]
    fn random_init_respects_labels(){
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["[2 5] a b c d e f g h", "a b c"]);
        let corpus = builder.build();
        let mut rng = StdRng::seed_from_u64(7);
        let (stats, assignment) = SufficientStatistics::init_random(&corpus, 6, &mut rng).unwrap();
        stats.check_invariants().unwrap();
        assert!(assignment.document(0).iter().all(|topic| *topic == 2 || *topic == 5));
        assert!(assignment.document(1).iter().all(|topic| *topic < 6));
        assert_eq!(stats, SufficientStatistics::from_assignment(&corpus, &assignment, 6).unwrap());
    }

    #[test]
    fn remove_then_insert_keeps_the_invariants(){
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["a b", "b"]);
        let corpus = builder.build();
        let assignment = Assignment::new(vec![vec![0, 1], vec![1]]);
        let mut stats = SufficientStatistics::from_assignment(&corpus, &assignment, 3).unwrap();
        stats.remove(0, 1, 1);
        stats.insert(0, 1, 2);
        stats.check_invariants().unwrap();
        assert_eq!(1, stats.topic_total(2));
        assert_eq!(1, stats.topic_total(1));
    }

    #[test]
    fn rejects_foreign_assignments(){
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["[1] a b"]);
        let corpus = builder.build();
        assert!(SufficientStatistics::from_assignment(&corpus, &Assignment::new(vec![vec![1]]), 2).is_err());
        assert!(SufficientStatistics::from_assignment(&corpus, &Assignment::new(vec![vec![1, 2]]), 2).is_err());
        assert!(SufficientStatistics::from_assignment(&corpus, &Assignment::new(vec![vec![1, 0]]), 2).is_err());
        assert!(SufficientStatistics::from_assignment(&corpus, &Assignment::new(vec![vec![1, 1]]), 2).is_ok());
    }

    #[test]
    fn isolated_counts_only_see_their_document(){
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["a a b", "a"]);
        let corpus = builder.build();
        let assignment = Assignment::new(vec![vec![0, 1, 1], vec![1]]);
        let counts = IsolatedCounts::from_assignment(&corpus, &assignment, 2).unwrap();
        counts.check_invariants().unwrap();
        assert_eq!(1, counts.document(0).word_topic(0, 1));
        assert_eq!(1, counts.document(1).word_topic(0, 1));
        assert_eq!(0, counts.document(1).word_topic(1, 1));
        assert_eq!(2, counts.document(0).topic_total(1));
        assert_eq!(1, counts.document(1).topic_total(1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "never inserted")]
    fn removing_an_unknown_word_is_not_silent(){
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["a b"]);
        let corpus = builder.build();
        let assignment = Assignment::new(vec![vec![0, 1]]);
        let mut counts = IsolatedCounts::from_assignment(&corpus, &assignment, 2).unwrap();
        counts.remove(0, 1, 1);
        counts.check_invariants().unwrap();
        counts.remove(0, 7, 0);
    }
}
