use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use crate::enums::{Compression, RunMode};
use crate::errors::{ConfigError, ModelError};
use crate::model::{Hyperparameters, ModelStore, SamplingSchedule};

fn default_topics() -> usize { 100 }
fn default_iterations() -> usize { 1000 }
fn default_burn_in() -> usize { 500 }
fn default_sampling_lag() -> usize { 5 }
fn default_model_name() -> String { "model-final".to_string() }
fn default_dir() -> PathBuf { PathBuf::from(".") }
fn default_data_file() -> PathBuf { PathBuf::from("trndocs.dat") }

/// Everything a run needs to know.
///
/// Unset `alpha` and `beta` default to `50 / K` and `0.01` for a new model. When
/// continuing or inferring they are taken from the trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct SamplingConfig {
    #[builder(default)]
    pub mode: RunMode,
    /// The number of topics K, ignored when a trained model is loaded
    #[builder(default = "default_topics()")]
    pub topics: usize,
    #[builder(default, setter(strip_option))]
    pub alpha: Option<f64>,
    #[builder(default, setter(strip_option))]
    pub beta: Option<f64>,
    #[builder(default = "default_iterations()")]
    pub iterations: usize,
    #[builder(default = "default_burn_in()")]
    pub burn_in: usize,
    #[builder(default = "default_sampling_lag()")]
    pub sampling_lag: usize,
    /// Save a checkpoint every `save_step` iterations
    #[builder(default, setter(strip_option))]
    pub save_step: Option<usize>,
    /// Ignore the labels of the input documents
    #[builder(default)]
    pub unlabeled: bool,
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,
    /// The name of the trained model, for saving and for loading
    #[builder(default = "default_model_name()", setter(into))]
    pub model_name: String,
    #[builder(default = "default_dir()", setter(into))]
    pub dir: PathBuf,
    /// The corpus file, relative to `dir`
    #[builder(default = "default_data_file()", setter(into))]
    pub data_file: PathBuf,
    #[builder(default)]
    pub compression: Compression,
    #[builder(default)]
    pub write_phi: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            topics: default_topics(),
            alpha: None,
            beta: None,
            iterations: default_iterations(),
            burn_in: default_burn_in(),
            sampling_lag: default_sampling_lag(),
            save_step: None,
            unlabeled: false,
            seed: None,
            model_name: default_model_name(),
            dir: default_dir(),
            data_file: default_data_file(),
            compression: Compression::default(),
            write_phi: false,
        }
    }
}

fn check_values(topics: usize, sampling_lag: usize, alpha: Option<f64>, beta: Option<f64>, save_step: Option<usize>) -> Result<(), String> {
    if topics == 0 {
        return Err("The number of topics has to be at least 1.".to_string())
    }
    if sampling_lag == 0 {
        return Err("The sampling lag has to be at least 1.".to_string())
    }
    if save_step == Some(0) {
        return Err("The save step has to be at least 1.".to_string())
    }
    for (name, value) in [("alpha", alpha), ("beta", beta)] {
        if let Some(value) = value {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("The {name} has to be a finite positive number but was {value}."))
            }
        }
    }
    Ok(())
}

impl SamplingConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check_values(
            self.topics.unwrap_or_else(default_topics),
            self.sampling_lag.unwrap_or_else(default_sampling_lag),
            self.alpha.flatten(),
            self.beta.flatten(),
            self.save_step.flatten(),
        )
    }
}

impl SamplingConfig {
    pub fn builder() -> SamplingConfigBuilder {
        SamplingConfigBuilder::default()
    }

    /// Reads a config from a json file, missing fields get their default.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_values(self.topics, self.sampling_lag, self.alpha, self.beta, self.save_step).map_err(ConfigError::Invalid)
    }

    /// The hyperparameters of a new model.
    pub fn hyperparameters(&self) -> Result<Hyperparameters, ModelError> {
        if self.topics == 0 {
            return Err(ModelError::NoTopics)
        }
        Hyperparameters::new(
            self.topics,
            self.alpha.unwrap_or(50.0 / self.topics as f64),
            self.beta.unwrap_or(0.01),
        )
    }

    /// The hyperparameters of a run on top of `trained`, unset values are inherited.
    pub fn inherited_hyperparameters(&self, trained: &Hyperparameters) -> Result<Hyperparameters, ModelError> {
        Hyperparameters::new(
            trained.topics(),
            self.alpha.unwrap_or(trained.alpha()),
            self.beta.unwrap_or(trained.beta()),
        )
    }

    pub fn schedule(&self) -> Result<SamplingSchedule, ConfigError> {
        let lag = NonZeroUsize::new(self.sampling_lag)
            .ok_or_else(|| ConfigError::Invalid("The sampling lag has to be at least 1.".to_string()))?;
        Ok(SamplingSchedule::new(self.burn_in, lag))
    }

    pub fn store(&self) -> ModelStore {
        ModelStore::new(&self.dir)
            .with_compression(self.compression)
            .with_phi(self.write_phi)
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.join(&self.data_file)
    }

    /// The name the result of an inference is saved under.
    pub fn data_name(&self) -> String {
        self.data_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.data_file.to_string_lossy().into_owned())
    }
}
