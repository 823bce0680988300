use thiserror::Error;
use crate::enums::{ReadError, WriteError};
use crate::model::{DocumentId, Position, TopicId};

/// Errors while creating or checking a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("A model needs at least one topic!")]
    NoTopics,
    #[error("The hyperparameter {name} has to be a finite positive number but was {value}!")]
    InvalidHyperparameter {
        name: &'static str,
        value: f64
    },
    #[error("The assignment has {actual} documents but the corpus has {expected}!")]
    DocumentCountMismatch {
        expected: usize,
        actual: usize
    },
    #[error("The assignment of document {document} has {actual} tokens but the document has {expected}!")]
    DocumentLengthMismatch {
        document: DocumentId,
        expected: usize,
        actual: usize
    },
    #[error("The topic {topic} of token {document}:{position} is not in [0, {topics})!")]
    TopicOutOfRange {
        document: DocumentId,
        position: Position,
        topic: TopicId,
        topics: usize
    },
    #[error("The topic {topic} of token {document}:{position} is not one of the document labels!")]
    LabelViolation {
        document: DocumentId,
        position: Position,
        topic: TopicId
    },
    #[error("The document {document} is restricted to the label {label}, but there are only {topics} topics!")]
    LabelOutOfRange {
        document: DocumentId,
        label: TopicId,
        topics: usize
    },
    #[error("The trained model has {expected} topics but {actual} were requested!")]
    TopicCountMismatch {
        expected: usize,
        actual: usize
    },
    #[error("The word {word:?} is unknown to the trained model!")]
    UnknownWord {
        word: String
    },
    #[error("The counts of topic {topic} sum up to {actual} but the topic total is {expected}!")]
    TopicTotalMismatch {
        topic: TopicId,
        expected: u64,
        actual: u64
    },
    #[error("The counts of document {document} sum up to {actual} but the document length is {expected}!")]
    DocumentTotalMismatch {
        document: DocumentId,
        expected: u64,
        actual: u64
    },
}

/// Errors while reading a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("The corpus file {0} was not found!")]
    NotFound(std::path::PathBuf),
}

/// Errors of the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything that can stop a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("The run was cancelled during iteration {iteration}, the last complete iteration is {last_complete}.")]
    Cancelled {
        iteration: usize,
        last_complete: usize
    },
}
