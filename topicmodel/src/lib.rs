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

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use crate::config::SamplingConfig;
use crate::corpus::CorpusBuilder;
use crate::enums::{InferenceMode, RunMode};
use crate::errors::RunError;
use crate::estimator::{Checkpoints, Estimator};
use crate::inferencer::Inferencer;
use crate::model::LdaModel;
use crate::sampler::seeded_rng;

pub mod model;
pub mod vocabulary;
pub mod corpus;
pub mod sampler;
pub mod traits;
pub mod enums;
pub mod errors;
pub mod config;
pub mod estimator;
pub mod inferencer;
mod io;

/// Runs what `config` asks for and returns the resulting model.
///
/// `cancel` is checked between documents, a cancelled run returns [RunError::Cancelled]
/// and only the checkpoints written before are kept.
pub fn run(config: &SamplingConfig, cancel: Option<Arc<AtomicBool>>) -> Result<LdaModel, RunError> {
    config.validate()?;
    log::info!("Starting {} with the data {}", config.mode, config.data_path().display());
    let cancel = cancel.as_deref();
    match config.mode {
        RunMode::Estimate => estimate(config, cancel),
        RunMode::EstimateContinue => estimate_continue(config, cancel),
        RunMode::InferMerged => infer(config, InferenceMode::Merged, cancel),
        RunMode::InferSeparately => infer(config, InferenceMode::Isolated, cancel),
    }
}

fn estimate(config: &SamplingConfig, cancel: Option<&AtomicBool>) -> Result<LdaModel, RunError> {
    let mut builder = CorpusBuilder::new()
        .unlabeled(config.unlabeled)
        .topic_limit(Some(config.topics));
    builder.read_file(config.data_path())?;
    let mut estimator = Estimator::new(
        builder.build(),
        config.hyperparameters()?,
        config.schedule()?,
        seeded_rng(config.seed)
    )?;
    let store = config.store();
    let checkpoints = Checkpoints::new(&store, &config.model_name, config.save_step);
    estimator.estimate(config.iterations, cancel, Some(&checkpoints))?;
    Ok(estimator.into_model())
}

fn estimate_continue(config: &SamplingConfig, cancel: Option<&AtomicBool>) -> Result<LdaModel, RunError> {
    let store = config.store();
    let model = store.load(&config.model_name)?;
    let hyper = config.inherited_hyperparameters(model.hyperparameters())?;
    let mut estimator = Estimator::resume(model, config.schedule()?, seeded_rng(config.seed))
        .with_hyperparameters(hyper)?;
    let checkpoints = Checkpoints::new(&store, &config.model_name, config.save_step);
    estimator.estimate(config.iterations, cancel, Some(&checkpoints))?;
    Ok(estimator.into_model())
}

/// The result is saved under the name of the data file.
fn infer(config: &SamplingConfig, mode: InferenceMode, cancel: Option<&AtomicBool>) -> Result<LdaModel, RunError> {
    let store = config.store();
    let trained = store.load(&config.model_name)?;
    let hyper = config.inherited_hyperparameters(trained.hyperparameters())?;
    let mut builder = CorpusBuilder::against(trained.vocabulary())
        .unlabeled(config.unlabeled)
        .topic_limit(Some(hyper.topics()));
    builder.read_file(config.data_path())?;
    let mut inferencer = Inferencer::new(
        &trained,
        builder.build(),
        hyper,
        mode,
        config.schedule()?,
        seeded_rng(config.seed)
    )?;
    inferencer.infer(config.iterations, cancel)?;
    let model = inferencer.into_model();
    store.save(&model, &config.data_name())?;
    Ok(model)
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use crate::config::SamplingConfig;
    use crate::enums::{Compression, RunMode};
    use crate::errors::RunError;
    use crate::run;

    const TRAINING: &str = "[0] apple banana apple cherry\nbanana cherry date\ndate elder fig apple\n[1 2] fig fig elder banana\n";

    #[test]
    fn estimate_continue_and_infer(){
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trndocs.dat"), TRAINING).unwrap();
        fs::write(dir.path().join("newdocs.dat"), "apple kiwi banana\nfig elder\n").unwrap();

        let config = SamplingConfig::builder()
            .topics(3usize)
            .iterations(20usize)
            .burn_in(10usize)
            .sampling_lag(2usize)
            .save_step(10usize)
            .seed(1u64)
            .dir(dir.path())
            .compression(Compression::Gzip)
            .build()
            .unwrap();
        let model = run(&config, None).unwrap();
        assert_eq!(20, model.iteration());
        assert_eq!(6, model.corpus().vocabulary_size());
        assert!(model.assignment().document(0).iter().all(|topic| *topic == 0));
        assert!(dir.path().join("model-final-00010.tassign.gz").exists());
        assert!(dir.path().join("model-final.tassign.gz").exists());

        let mut continued = config.clone();
        continued.mode = RunMode::EstimateContinue;
        continued.iterations = 5;
        let model = run(&continued, None).unwrap();
        assert_eq!(25, model.iteration());
        assert_eq!(3, model.topic_count());

        for mode in [RunMode::InferMerged, RunMode::InferSeparately] {
            let mut inference = config.clone();
            inference.mode = mode;
            inference.topics = 50;
            inference.data_file = "newdocs.dat".into();
            let model = run(&inference, None).unwrap();
            assert_eq!(3, model.topic_count());
            assert_eq!(2, model.corpus().document_count());
            assert_eq!(2, model.corpus().documents()[0].len());
            assert!(dir.path().join("newdocs.dat.theta.gz").exists());
        }
    }

    #[test]
    fn a_missing_corpus_fails(){
        let dir = tempfile::tempdir().unwrap();
        let config = SamplingConfig::builder().dir(dir.path()).build().unwrap();
        assert!(matches!(run(&config, None), Err(RunError::Corpus(_))));

        let mut continued = config.clone();
        continued.mode = RunMode::EstimateContinue;
        assert!(matches!(run(&continued, None), Err(RunError::Read(err)) if err.is_not_found()));
    }

    #[test]
    fn a_cancelled_run_reports_its_progress(){
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trndocs.dat"), TRAINING).unwrap();
        let config = SamplingConfig::builder().topics(2usize).iterations(3usize).dir(dir.path()).build().unwrap();
        let cancel = Arc::new(AtomicBool::new(true));
        let result = run(&config, Some(cancel));
        assert!(matches!(result, Err(RunError::Cancelled { iteration: 1, last_complete: 0 })));
        assert!(!dir.path().join("model-final.tassign").exists());
    }
}
