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

use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// What a run does with the corpus.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Display, AsRefStr, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Estimate a new model from scratch
    #[default]
    Estimate,
    /// Continue the estimation of a saved model
    EstimateContinue,
    /// Infer new documents, all new documents share their counts
    InferMerged,
    /// Infer new documents, every document only sees the trained model and itself
    InferSeparately,
}

/// How the new documents of an inference see each other.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum InferenceMode {
    /// The new documents share their counts
    Merged,
    /// Every new document only sees the trained counts and its own
    Isolated,
}

/// The compression of the written artifacts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Display, AsRefStr, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// The files making up a saved model.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Artifact {
    Assignment,
    Parameters,
    Theta,
    Phi,
    Vocabulary,
}

impl Artifact {
    pub const fn suffix(&self) -> &'static str {
        match self {
            Artifact::Assignment => ".tassign",
            Artifact::Parameters => ".others",
            Artifact::Theta => ".theta",
            Artifact::Phi => ".phi",
            Artifact::Vocabulary => ".wordmap",
        }
    }
}

/// The errors while writing
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// The errors while reading
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("The {artifact} was not found at {path} (or its compressed variant)!")]
    NotFound {
        artifact: Artifact,
        path: PathBuf
    },
    #[error("The {artifact} is corrupt at line {line}: {reason}")]
    Corrupt {
        artifact: Artifact,
        line: usize,
        reason: String
    },
}

impl ReadError {
    pub fn corrupt(artifact: Artifact, line: usize, reason: impl Into<String>) -> Self {
        Self::Corrupt { artifact, line, reason: reason.into() }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ReadError::Corrupt { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReadError::NotFound { .. })
    }
}
