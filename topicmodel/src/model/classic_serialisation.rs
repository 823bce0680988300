use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use itertools::Itertools;
use gibbslda_toolkit::from_str_ex::{ParseEx, TextLocation};
use crate::corpus::labels::{format_labels, split_labels};
use crate::corpus::{Corpus, Document};
use crate::enums::{Artifact, Compression, ReadError, WriteError};
use crate::io::{ArtifactReader, ArtifactWriter};
use crate::model::{Assignment, DocumentTo, Hyperparameters, LdaModel, ParameterEstimates, Probability, TopicTo};
use crate::vocabulary::{BasicVocabulary, LoadVocabularyError, LoadableVocabulary, StoreableVocabulary, StringVocabulary};

const KEY_ALPHA: &str = "alpha";
const KEY_BETA: &str = "beta";
const KEY_TOPICS: &str = "ntopics";
const KEY_DOCUMENTS: &str = "ndocs";
const KEY_WORDS: &str = "nwords";
const KEY_ITERATION: &str = "liter";

/// The content of the parameters artifact.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StoredParameters {
    pub alpha: f64,
    pub beta: f64,
    pub topics: usize,
    pub documents: usize,
    pub words: usize,
    pub iteration: usize,
}

impl StoredParameters {
    fn of(model: &LdaModel) -> Self {
        let hyper = model.hyperparameters();
        Self {
            alpha: hyper.alpha(),
            beta: hyper.beta(),
            topics: hyper.topics(),
            documents: model.corpus().document_count(),
            words: model.corpus().vocabulary_size(),
            iteration: model.iteration(),
        }
    }
}

/// Saves and restores models as a set of line based artifacts in a directory.
///
/// A model is never stored with its counts. The counts are restored by replaying
/// the assignment, the theta and phi artifacts are only for reporting.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
    compression: Compression,
    write_phi: bool,
}

impl ModelStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            compression: Compression::None,
            write_phi: false,
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Also write the phi artifact when saving.
    pub fn with_phi(mut self, write_phi: bool) -> Self {
        self.write_phi = write_phi;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The uncompressed path of `artifact` for the model `name`.
    pub fn artifact_path(&self, name: &str, artifact: Artifact) -> PathBuf {
        self.dir.join(format!("{name}{}", artifact.suffix()))
    }

    fn create(&self, name: &str, artifact: Artifact) -> Result<ArtifactWriter, WriteError> {
        let (writer, path) = ArtifactWriter::create(self.artifact_path(name, artifact), self.compression)?;
        log::debug!("Writing the {artifact} to {}", path.display());
        Ok(writer)
    }

    fn open(&self, name: &str, artifact: Artifact) -> Result<ArtifactReader, ReadError> {
        let path = self.artifact_path(name, artifact);
        match ArtifactReader::open_artifact(&path)? {
            Some((reader, found)) => {
                log::debug!("Reading the {artifact} from {}", found.display());
                Ok(reader)
            }
            None => Err(ReadError::NotFound { artifact, path })
        }
    }

    /// Writes all artifacts of `model` under `name`. Returns the number of written artifacts.
    ///
    /// If no sample was taken yet, the theta of the current state is written.
    pub fn save(&self, model: &LdaModel, name: &str) -> Result<usize, WriteError> {
        let mut written = 0;

        let mut out = self.create(name, Artifact::Assignment)?;
        write_assignment(&mut out, model)?;
        out.finish()?;
        written += 1;

        let mut out = self.create(name, Artifact::Parameters)?;
        write_parameters(&mut out, &StoredParameters::of(model))?;
        out.finish()?;
        written += 1;

        let mut out = self.create(name, Artifact::Theta)?;
        if model.estimates().samples() == 0 {
            let theta = ParameterEstimates::point_theta(model.hyperparameters(), model.stats());
            write_sparse_rows(&mut out, &theta)?;
        } else {
            write_sparse_rows(&mut out, model.theta())?;
        }
        out.finish()?;
        written += 1;

        let mut out = self.create(name, Artifact::Vocabulary)?;
        model.vocabulary().save_to_output(&mut out)?;
        out.finish()?;
        written += 1;

        if self.write_phi {
            if model.estimates().samples() == 0 {
                log::debug!("No sample was taken for {name}, the phi is not written.");
            } else {
                let mut out = self.create(name, Artifact::Phi)?;
                write_sparse_rows(&mut out, model.phi())?;
                out.finish()?;
                written += 1;
            }
        }

        log::info!("Saved the model {name} at iteration {} to {}", model.iteration(), self.dir.display());
        Ok(written)
    }

    /// Reads the parameters artifact of `name`.
    pub fn load_parameters(&self, name: &str) -> Result<StoredParameters, ReadError> {
        read_parameters(self.open(name, Artifact::Parameters)?)
    }

    /// Restores the model `name`, the counts are replayed from the assignment.
    pub fn load(&self, name: &str) -> Result<LdaModel, ReadError> {
        let parameters = self.load_parameters(name)?;
        let hyper = Hyperparameters::new(parameters.topics, parameters.alpha, parameters.beta)
            .map_err(|err| ReadError::corrupt(Artifact::Parameters, 0, err.to_string()))?;
        let (documents, assignment) = read_assignment(self.open(name, Artifact::Assignment)?, &parameters)?;
        let vocabulary = read_vocabulary(self.open(name, Artifact::Vocabulary)?, parameters.words)?;

        for (document, doc) in documents.iter().enumerate() {
            if let Some(word) = doc.words().iter().find(|word| **word >= parameters.words) {
                return Err(ReadError::corrupt(
                    Artifact::Assignment,
                    document,
                    format!("The word id {word} is not in a vocabulary of {} words.", parameters.words)
                ))
            }
        }

        let model = LdaModel::from_assignment(Corpus::new(documents, vocabulary), assignment, hyper, parameters.iteration)
            .map_err(|err| ReadError::corrupt(Artifact::Assignment, 0, err.to_string()))?;
        log::info!(
            "Loaded the model {name}: K={} M={} V={} iteration={}",
            parameters.topics,
            parameters.documents,
            parameters.words,
            parameters.iteration
        );
        Ok(model)
    }

    /// Reads the theta artifact of `name` as dense M x K matrix.
    pub fn load_theta(&self, name: &str) -> Result<DocumentTo<TopicTo<Probability>>, ReadError> {
        let parameters = self.load_parameters(name)?;
        read_sparse_rows(self.open(name, Artifact::Theta)?, Artifact::Theta, parameters.documents, parameters.topics)
    }

    /// Reads the phi artifact of `name` as dense K x V matrix.
    pub fn load_phi(&self, name: &str) -> Result<TopicTo<Vec<Probability>>, ReadError> {
        let parameters = self.load_parameters(name)?;
        read_sparse_rows(self.open(name, Artifact::Phi)?, Artifact::Phi, parameters.topics, parameters.words)
    }
}

fn write_assignment(out: &mut impl Write, model: &LdaModel) -> std::io::Result<()> {
    for (doc, topics) in model.corpus().documents().iter().zip_eq(model.assignment().documents()) {
        if let Some(labels) = doc.labels().filter(|labels| !labels.is_empty()) {
            write!(out, "{} ", format_labels(labels))?;
        }
        let pairs = doc.words().iter().zip_eq(topics.iter());
        writeln!(out, "{}", pairs.format_with(" ", |(word, topic), f| f(&format_args!("{word}:{topic}"))))?;
    }
    Ok(())
}

fn write_parameters(out: &mut impl Write, parameters: &StoredParameters) -> std::io::Result<()> {
    writeln!(out, "{KEY_ALPHA}={}", parameters.alpha)?;
    writeln!(out, "{KEY_BETA}={}", parameters.beta)?;
    writeln!(out, "{KEY_TOPICS}={}", parameters.topics)?;
    writeln!(out, "{KEY_DOCUMENTS}={}", parameters.documents)?;
    writeln!(out, "{KEY_WORDS}={}", parameters.words)?;
    writeln!(out, "{KEY_ITERATION}={}", parameters.iteration)
}

/// Writes the nonzero `id:value` pairs of every row.
fn write_sparse_rows(out: &mut impl Write, rows: &[Vec<Probability>]) -> std::io::Result<()> {
    for row in rows {
        let pairs = row.iter().enumerate().filter(|(_, value)| **value != 0.0);
        writeln!(out, "{}", pairs.format_with(" ", |(id, value), f| f(&format_args!("{id}:{value}"))))?;
    }
    Ok(())
}

fn parse_field<F>(value: &str, tag: &'static str, artifact: Artifact, location: TextLocation) -> Result<F, ReadError>
where
    F: FromStr,
    F::Err: Display
{
    value.parse_ex_at(tag, location).map_err(|err| ReadError::corrupt(artifact, location.line, err.to_string()))
}

fn read_parameters(reader: impl BufRead) -> Result<StoredParameters, ReadError> {
    let mut alpha = None;
    let mut beta = None;
    let mut topics = None;
    let mut documents = None;
    let mut words = None;
    let mut iteration = None;
    let mut line_count = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        line_count = line_no + 1;
        let line = line.trim();
        if line.is_empty() {
            continue
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ReadError::corrupt(Artifact::Parameters, line_no, format!("Expected key=value but got {line:?}.")))
        };
        let location = TextLocation::new(line_no, 1);
        match key.trim() {
            KEY_ALPHA => alpha = Some(parse_field(value, KEY_ALPHA, Artifact::Parameters, location)?),
            KEY_BETA => beta = Some(parse_field(value, KEY_BETA, Artifact::Parameters, location)?),
            KEY_TOPICS => topics = Some(parse_field(value, KEY_TOPICS, Artifact::Parameters, location)?),
            KEY_DOCUMENTS => documents = Some(parse_field(value, KEY_DOCUMENTS, Artifact::Parameters, location)?),
            KEY_WORDS => words = Some(parse_field(value, KEY_WORDS, Artifact::Parameters, location)?),
            KEY_ITERATION => iteration = Some(parse_field(value, KEY_ITERATION, Artifact::Parameters, location)?),
            other => log::debug!("Ignoring the unknown parameter {other:?} in line {line_no}."),
        }
    }

    let missing = |key: &str| ReadError::corrupt(Artifact::Parameters, line_count, format!("The parameter {key} is missing."));
    let parameters = StoredParameters {
        alpha: alpha.ok_or_else(|| missing(KEY_ALPHA))?,
        beta: beta.ok_or_else(|| missing(KEY_BETA))?,
        topics: topics.ok_or_else(|| missing(KEY_TOPICS))?,
        documents: documents.ok_or_else(|| missing(KEY_DOCUMENTS))?,
        words: words.ok_or_else(|| missing(KEY_WORDS))?,
        iteration: iteration.ok_or_else(|| missing(KEY_ITERATION))?,
    };
    check_dimensions(&parameters, line_count)?;
    Ok(parameters)
}

/// Every topic gets a row per word and per document plus its total, the
/// largest matrix derived from the parameters has to fit into an allocation.
fn check_dimensions(parameters: &StoredParameters, line_count: usize) -> Result<(), ReadError> {
    let cells = parameters.words
        .checked_add(parameters.documents)
        .and_then(|rows| rows.checked_add(1))
        .and_then(|rows| rows.checked_mul(parameters.topics))
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<Probability>()))
        .filter(|bytes| *bytes <= isize::MAX as usize);
    match cells {
        Some(_) => Ok(()),
        None => Err(ReadError::corrupt(
            Artifact::Parameters,
            line_count,
            format!(
                "The model with {}={}, {}={} and {}={} is too large.",
                KEY_TOPICS, parameters.topics, KEY_DOCUMENTS, parameters.documents, KEY_WORDS, parameters.words
            )
        ))
    }
}

fn read_assignment(reader: impl BufRead, parameters: &StoredParameters) -> Result<(Vec<Document>, Assignment), ReadError> {
    let mut documents = Vec::new();
    let mut topics = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if documents.len() == parameters.documents {
            if line.trim().is_empty() {
                continue
            }
            return Err(ReadError::corrupt(
                Artifact::Assignment,
                line_no,
                format!("Found more than the {} documents of the model.", parameters.documents)
            ))
        }
        let (labels, text) = split_labels(&line, false, Some(parameters.topics), documents.len());
        let mut words = Vec::new();
        let mut doc_topics = Vec::new();
        for (position, pair) in text.split_whitespace().enumerate() {
            let Some((word, topic)) = pair.split_once(':') else {
                return Err(ReadError::corrupt(Artifact::Assignment, line_no, format!("Expected word:topic but got {pair:?}.")))
            };
            let location = TextLocation::new(line_no, position);
            words.push(parse_field(word, "word", Artifact::Assignment, location)?);
            doc_topics.push(parse_field(topic, "topic", Artifact::Assignment, location)?);
        }
        documents.push(Document::new(words, labels));
        topics.push(doc_topics);
    }

    if documents.len() != parameters.documents {
        return Err(ReadError::corrupt(
            Artifact::Assignment,
            documents.len(),
            format!("Expected {} documents but found {}.", parameters.documents, documents.len())
        ))
    }
    Ok((documents, Assignment::new(topics)))
}

fn read_vocabulary(mut reader: impl BufRead, expected: usize) -> Result<StringVocabulary, ReadError> {
    let vocabulary = StringVocabulary::load_from_input(&mut reader).map_err(|err| match err {
        LoadVocabularyError::IO(err) => ReadError::IO(err),
        LoadVocabularyError::Parse { line, .. }
        | LoadVocabularyError::EmptyEntry { line }
        | LoadVocabularyError::Duplicate { line } => {
            let reason = err.to_string();
            ReadError::corrupt(Artifact::Vocabulary, line, reason)
        }
    })?;
    if vocabulary.len() != expected {
        return Err(ReadError::corrupt(
            Artifact::Vocabulary,
            vocabulary.len(),
            format!("Expected {expected} words but found {}.", vocabulary.len())
        ))
    }
    Ok(vocabulary)
}

fn read_sparse_rows(reader: impl BufRead, artifact: Artifact, rows: usize, columns: usize) -> Result<Vec<Vec<Probability>>, ReadError> {
    let mut result = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if result.len() == rows {
            if line.trim().is_empty() {
                continue
            }
            return Err(ReadError::corrupt(artifact, line_no, format!("Found more than {rows} rows.")))
        }
        let mut row = vec![0.0; columns];
        for (position, pair) in line.split_whitespace().enumerate() {
            let Some((id, value)) = pair.split_once(':') else {
                return Err(ReadError::corrupt(artifact, line_no, format!("Expected id:value but got {pair:?}.")))
            };
            let location = TextLocation::new(line_no, position);
            let id: usize = parse_field(id, "id", artifact, location)?;
            if id >= columns {
                return Err(ReadError::corrupt(artifact, line_no, format!("The id {id} is not in [0, {columns}).")))
            }
            row[id] = parse_field(value, "value", artifact, location)?;
        }
        result.push(row);
    }
    if result.len() != rows {
        return Err(ReadError::corrupt(artifact, result.len(), format!("Expected {rows} rows but found {}.", result.len())))
    }
    Ok(result)
}
