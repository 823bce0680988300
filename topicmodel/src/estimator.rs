use std::sync::atomic::AtomicBool;
use crate::corpus::Corpus;
use crate::errors::{ModelError, RunError};
use crate::model::{Hyperparameters, LdaModel, ModelStore, SamplingSchedule};
use crate::sampler::{CountSource, GibbsSampler, UniformSource};

/// Where and how often an estimation is saved.
#[derive(Debug, Copy, Clone)]
pub struct Checkpoints<'a> {
    store: &'a ModelStore,
    name: &'a str,
    save_step: Option<usize>,
}

impl<'a> Checkpoints<'a> {
    /// The final model is saved as `name`, every `save_step` iterations a
    /// checkpoint `name-iteration` is saved.
    pub fn new(store: &'a ModelStore, name: &'a str, save_step: Option<usize>) -> Self {
        Self { store, name, save_step: save_step.filter(|step| *step > 0) }
    }

    /// The name of the checkpoint after `iteration`.
    pub fn checkpoint_name(&self, iteration: usize) -> String {
        format!("{}-{iteration:05}", self.name)
    }
}

/// Trains a model on its own corpus.
pub struct Estimator<U> {
    model: LdaModel,
    sampler: GibbsSampler<U>,
}

impl<U: UniformSource> Estimator<U> {
    /// Starts a new estimation with a random assignment.
    pub fn new(corpus: Corpus, hyper: Hyperparameters, schedule: SamplingSchedule, mut uniform: U) -> Result<Self, ModelError> {
        let model = LdaModel::random(corpus, hyper, &mut uniform)?.with_schedule(schedule);
        log::info!(
            "Initialised a new model: K={} alpha={} beta={}",
            hyper.topics(),
            hyper.alpha(),
            hyper.beta()
        );
        Ok(Self { model, sampler: GibbsSampler::new(uniform) })
    }

    /// Continues the estimation of a restored `model`, the sampled estimates start over.
    pub fn resume(model: LdaModel, schedule: SamplingSchedule, uniform: U) -> Self {
        log::info!("Continuing the model after iteration {}", model.iteration());
        Self { model: model.with_schedule(schedule), sampler: GibbsSampler::new(uniform) }
    }

    /// Replaces alpha and beta, the number of topics has to stay the same.
    pub fn with_hyperparameters(mut self, hyper: Hyperparameters) -> Result<Self, ModelError> {
        if hyper.topics() != self.model.topic_count() {
            return Err(ModelError::TopicCountMismatch { expected: self.model.topic_count(), actual: hyper.topics() })
        }
        self.model.hyper = hyper;
        Ok(self)
    }

    pub fn model(&self) -> &LdaModel {
        &self.model
    }

    pub fn into_model(self) -> LdaModel {
        self.model
    }

    /// Samples `iterations` times. With `checkpoints` the model is saved every
    /// save step and after the last iteration. A cancelled iteration is never saved.
    pub fn estimate(&mut self, iterations: usize, cancel: Option<&AtomicBool>, checkpoints: Option<&Checkpoints>) -> Result<(), RunError> {
        log::info!("Sampling {iterations} iterations.");
        self.sampler.run(&mut self.model, &mut CountSource::Local, iterations, cancel, |model, _, _| {
            if let Some(checkpoints) = checkpoints {
                if let Some(step) = checkpoints.save_step {
                    if model.iteration() % step == 0 {
                        checkpoints.store.save(model, &checkpoints.checkpoint_name(model.iteration()))?;
                    }
                }
            }
            Ok(())
        })?;
        log::info!("Gibbs sampling completed at iteration {}.", self.model.iteration());
        if let Some(checkpoints) = checkpoints {
            checkpoints.store.save(&self.model, checkpoints.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;
    use std::sync::atomic::AtomicBool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::corpus::{Corpus, CorpusBuilder};
    use crate::enums::Artifact;
    use crate::errors::RunError;
    use crate::estimator::{Checkpoints, Estimator};
    use crate::model::{Hyperparameters, ModelStore, SamplingSchedule};

    fn corpus() -> Corpus {
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["a b c a b", "[0] c c d", "d e a", "e e b c"]);
        builder.build()
    }

    fn schedule() -> SamplingSchedule {
        SamplingSchedule::new(2, NonZeroUsize::new(2).unwrap())
    }

    #[test]
    fn saves_checkpoints_and_the_final_model(){
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let hyper = Hyperparameters::new(3, 0.5, 0.1).unwrap();
        let mut estimator = Estimator::new(corpus(), hyper, schedule(), StdRng::seed_from_u64(4)).unwrap();
        estimator.estimate(5, None, Some(&Checkpoints::new(&store, "model", Some(2)))).unwrap();

        assert_eq!(5, estimator.model().iteration());
        // steps 4 and 5
        assert_eq!(2, estimator.model().estimates().samples());
        assert!(store.artifact_path("model-00002", Artifact::Assignment).exists());
        assert!(store.artifact_path("model-00004", Artifact::Assignment).exists());
        assert!(!store.artifact_path("model-00005", Artifact::Assignment).exists());
        let restored = store.load("model").unwrap();
        assert_eq!(estimator.model().stats(), restored.stats());
        assert_eq!(5, restored.iteration());
        assert_eq!(2, store.load("model-00002").unwrap().iteration());
    }

    #[test]
    fn continues_where_it_stopped(){
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let hyper = Hyperparameters::new(3, 0.5, 0.1).unwrap();
        let mut estimator = Estimator::new(corpus(), hyper, schedule(), StdRng::seed_from_u64(4)).unwrap();
        estimator.estimate(3, None, Some(&Checkpoints::new(&store, "model", None))).unwrap();

        let restored = store.load("model").unwrap();
        let mut estimator = Estimator::resume(restored, schedule(), StdRng::seed_from_u64(5))
            .with_hyperparameters(Hyperparameters::new(3, 0.2, 0.1).unwrap())
            .unwrap();
        estimator.estimate(4, None, Some(&Checkpoints::new(&store, "model", None))).unwrap();
        assert_eq!(7, estimator.model().iteration());
        estimator.model().check_invariants().unwrap();
        assert!(estimator.model().assignment().document(1).iter().all(|topic| *topic == 0));

        let parameters = store.load_parameters("model").unwrap();
        assert_eq!(7, parameters.iteration);
        assert_eq!(0.2, parameters.alpha);

        let restored = store.load("model").unwrap();
        assert!(Estimator::resume(restored, schedule(), StdRng::seed_from_u64(5))
            .with_hyperparameters(Hyperparameters::new(4, 0.2, 0.1).unwrap())
            .is_err());
    }

    #[test]
    fn a_cancelled_run_is_not_saved(){
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let hyper = Hyperparameters::new(3, 0.5, 0.1).unwrap();
        let mut estimator = Estimator::new(corpus(), hyper, schedule(), StdRng::seed_from_u64(4)).unwrap();
        let cancel = AtomicBool::new(true);
        let result = estimator.estimate(5, Some(&cancel), Some(&Checkpoints::new(&store, "model", Some(1))));
        assert!(matches!(result, Err(RunError::Cancelled { iteration: 1, last_complete: 0 })));
        assert!(!store.artifact_path("model", Artifact::Parameters).exists());
        estimator.model().check_invariants().unwrap();
    }
}
