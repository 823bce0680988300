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

pub mod labels;

use std::io::BufRead;
use std::path::Path;
use crate::errors::{CorpusError, ModelError};
use crate::io::ArtifactReader;
use crate::model::{DocumentId, DocumentTo, PositionTo, TopicId, WordId, WordTo};
use crate::vocabulary::{BasicVocabulary, SearchableVocabulary, StringVocabulary, VocabularyMut};

/// The topics a token of a document may be assigned to.
#[derive(Debug, Copy, Clone)]
pub enum CandidateTopics<'a> {
    /// Every topic in `[0, K)`
    All(usize),
    /// Only the (sorted) labels of the document
    Labels(&'a [TopicId]),
}

impl CandidateTopics<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            CandidateTopics::All(k) => *k,
            CandidateTopics::Labels(labels) => labels.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps the candidate index to the actual topic.
    #[inline]
    pub fn topic_at(&self, idx: usize) -> TopicId {
        match self {
            CandidateTopics::All(_) => idx,
            CandidateTopics::Labels(labels) => labels[idx],
        }
    }

    pub fn contains(&self, topic: TopicId) -> bool {
        match self {
            CandidateTopics::All(k) => topic < *k,
            CandidateTopics::Labels(labels) => labels.binary_search(&topic).is_ok(),
        }
    }
}

/// A document, the local word ids in order and an optional label restriction.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Document {
    words: PositionTo<WordId>,
    labels: Option<Vec<TopicId>>,
}

impl Document {
    /// Creates a document, the labels are sorted and deduplicated.
    pub fn new(words: Vec<WordId>, labels: Option<Vec<TopicId>>) -> Self {
        let labels = labels.map(|mut labels| {
            labels.sort_unstable();
            labels.dedup();
            labels
        });
        Self { words, labels }
    }

    pub fn words(&self) -> &[WordId] {
        &self.words
    }

    pub fn labels(&self) -> Option<&[TopicId]> {
        self.labels.as_deref()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The topics a token of this document can take in a model with `topic_count` topics.
    /// A document with an empty label set falls back to all topics.
    pub fn candidate_topics(&self, topic_count: usize) -> CandidateTopics<'_> {
        match self.labels.as_deref() {
            Some(labels) if !labels.is_empty() => CandidateTopics::Labels(labels),
            _ => CandidateTopics::All(topic_count),
        }
    }
}

/// The documents and the local vocabulary of a model.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Corpus {
    documents: DocumentTo<Document>,
    vocabulary: StringVocabulary,
    /// Only set when built against a frozen vocabulary.
    local_to_global: Option<WordTo<WordId>>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, vocabulary: StringVocabulary) -> Self {
        Self { documents, vocabulary, local_to_global: None }
    }

    /// Number of documents (M)
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Size of the local vocabulary (V)
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn token_count(&self) -> usize {
        self.documents.iter().map(Document::len).sum()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, document: DocumentId) -> Option<&Document> {
        self.documents.get(document)
    }

    pub fn vocabulary(&self) -> &StringVocabulary {
        &self.vocabulary
    }

    /// The local to global word mapping, if this corpus belongs to an inference.
    pub fn local_to_global(&self) -> Option<&[WordId]> {
        self.local_to_global.as_deref()
    }

    pub fn global_id(&self, local: WordId) -> Option<WordId> {
        self.local_to_global.as_ref()?.get(local).copied()
    }

    /// Maps every local word to its id in `frozen`. Needed for a corpus that was
    /// restored from disk and is used for inference again.
    pub fn link_to(&mut self, frozen: &StringVocabulary) -> Result<&[WordId], ModelError> {
        let mapping = self.vocabulary.iter().map(|word| {
            frozen.get_id(word.as_str()).ok_or_else(|| ModelError::UnknownWord { word: word.clone() })
        }).collect::<Result<Vec<_>, _>>()?;
        Ok(self.local_to_global.insert(mapping).as_slice())
    }

    /// Fails for the first label that is not a topic of a model with `topic_count` topics.
    pub(crate) fn check_labels(&self, topic_count: usize) -> Result<(), ModelError> {
        for (document, doc) in self.documents.iter().enumerate() {
            if let Some(label) = doc.labels().and_then(|labels| labels.iter().find(|label| **label >= topic_count)) {
                return Err(ModelError::LabelOutOfRange { document, label: *label, topics: topic_count })
            }
        }
        Ok(())
    }
}

/// Builds a [Corpus] line by line, every line is a document.
pub struct CorpusBuilder<'a> {
    documents: Vec<Document>,
    vocabulary: StringVocabulary,
    frozen: Option<(&'a StringVocabulary, Vec<WordId>)>,
    unlabeled: bool,
    topic_limit: Option<usize>,
    dropped_tokens: usize,
}

impl Default for CorpusBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CorpusBuilder<'a> {
    /// A builder for a training corpus with its own vocabulary.
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            vocabulary: StringVocabulary::default(),
            frozen: None,
            unlabeled: false,
            topic_limit: None,
            dropped_tokens: 0,
        }
    }

    /// A builder for an inference corpus, only words known to `frozen` are kept.
    pub fn against(frozen: &'a StringVocabulary) -> Self {
        let mut new = Self::new();
        new.frozen = Some((frozen, Vec::new()));
        new
    }

    /// Ignore all labels in the input.
    pub fn unlabeled(mut self, unlabeled: bool) -> Self {
        self.unlabeled = unlabeled;
        self
    }

    /// Drop labels that are not a topic of a model with `topic_limit` topics.
    pub fn topic_limit(mut self, topic_limit: Option<usize>) -> Self {
        self.topic_limit = topic_limit;
        self
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Parses `line` and appends it as document. Returns the id of the new document.
    pub fn add_document(&mut self, line: &str) -> DocumentId {
        let document = self.documents.len();
        let (labels, text) = labels::split_labels(line, self.unlabeled, self.topic_limit, document);
        let mut words = Vec::new();
        for token in text.split_whitespace() {
            match self.frozen.as_mut() {
                None => {
                    words.push(self.vocabulary.add(token));
                }
                Some((frozen, local_to_global)) => {
                    if let Some(global) = frozen.get_id(token) {
                        let local = self.vocabulary.add(token);
                        if local == local_to_global.len() {
                            local_to_global.push(global);
                        }
                        words.push(local);
                    } else {
                        self.dropped_tokens += 1;
                    }
                }
            }
        }
        self.documents.push(Document::new(words, labels));
        document
    }

    pub fn add_documents<I, S>(&mut self, lines: I) where I: IntoIterator<Item=S>, S: AsRef<str> {
        for line in lines {
            self.add_document(line.as_ref());
        }
    }

    /// Reads every line of `reader` as document.
    pub fn read_from(&mut self, reader: impl BufRead) -> Result<(), CorpusError> {
        for line in reader.lines() {
            self.add_document(&line?);
        }
        Ok(())
    }

    /// Reads a plain or gzip compressed (`.gz`) corpus file.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<(), CorpusError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CorpusError::NotFound(path.to_path_buf()))
        }
        self.read_from(ArtifactReader::open(path)?)
    }

    pub fn build(self) -> Corpus {
        let corpus = Corpus {
            documents: self.documents,
            vocabulary: self.vocabulary,
            local_to_global: self.frozen.map(|(_, mapping)| mapping),
        };
        log::info!(
            "Dataset loaded: M={} V={} tokens={}",
            corpus.document_count(),
            corpus.vocabulary_size(),
            corpus.token_count()
        );
        if self.dropped_tokens > 0 {
            log::debug!("Dropped {} tokens unknown to the trained vocabulary.", self.dropped_tokens);
        }
        corpus
    }
}
