use std::sync::atomic::AtomicBool;
use crate::corpus::Corpus;
use crate::enums::InferenceMode;
use crate::errors::{ModelError, RunError};
use crate::model::{Hyperparameters, IsolatedCounts, LdaModel, SamplingSchedule};
use crate::sampler::{CountSource, FrozenCounts, GibbsSampler, UniformSource};

/// Samples the topics of new documents against a trained model, whose counts stay untouched.
pub struct Inferencer<'a, U> {
    trained: &'a LdaModel,
    model: LdaModel,
    counts: CountSource<'a>,
    sampler: GibbsSampler<U>,
}

impl<'a, U: UniformSource> Inferencer<'a, U> {
    /// Creates a random assignment for `corpus`. A corpus built against the vocabulary
    /// of `trained` keeps its mapping, any other corpus is linked to it.
    pub fn new(
        trained: &'a LdaModel,
        corpus: Corpus,
        hyper: Hyperparameters,
        mode: InferenceMode,
        schedule: SamplingSchedule,
        mut uniform: U
    ) -> Result<Self, ModelError> {
        let model = LdaModel::random(corpus, hyper, &mut uniform)?.with_schedule(schedule);
        Self::from_model(trained, model, mode, uniform)
    }

    /// Infers on top of an existing `model` of new documents, e.g. a restored one.
    pub fn from_model(trained: &'a LdaModel, mut model: LdaModel, mode: InferenceMode, uniform: U) -> Result<Self, ModelError> {
        if trained.topic_count() != model.topic_count() {
            return Err(ModelError::TopicCountMismatch { expected: trained.topic_count(), actual: model.topic_count() })
        }
        let mapping = match model.corpus.local_to_global() {
            Some(mapping) => mapping.to_vec(),
            None => model.corpus.link_to(trained.vocabulary())?.to_vec(),
        };
        let frozen = FrozenCounts::new(trained.stats(), mapping);
        let counts = match mode {
            InferenceMode::Merged => CountSource::Merged(frozen),
            InferenceMode::Isolated => CountSource::Isolated(
                frozen,
                IsolatedCounts::from_assignment(&model.corpus, &model.assignment, model.topic_count())?
            ),
        };
        log::info!(
            "Inferring {} documents against a model with K={} and V={} ({mode}).",
            model.corpus().document_count(),
            trained.topic_count(),
            trained.corpus().vocabulary_size()
        );
        Ok(Self { trained, model, counts, sampler: GibbsSampler::new(uniform) })
    }

    pub fn trained(&self) -> &'a LdaModel {
        self.trained
    }

    pub fn model(&self) -> &LdaModel {
        &self.model
    }

    pub fn counts(&self) -> &CountSource<'a> {
        &self.counts
    }

    pub fn into_model(self) -> LdaModel {
        self.model
    }

    /// Samples `iterations` times over the new documents.
    pub fn infer(&mut self, iterations: usize, cancel: Option<&AtomicBool>) -> Result<(), RunError> {
        log::info!("Sampling {iterations} iterations for inference.");
        self.sampler.run(&mut self.model, &mut self.counts, iterations, cancel, |_, counts, _| {
            counts.check_invariants()?;
            Ok(())
        })?;
        log::info!("Gibbs sampling for inference completed.");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::corpus::{Corpus, CorpusBuilder};
    use crate::enums::InferenceMode;
    use crate::inferencer::Inferencer;
    use crate::model::{Assignment, Hyperparameters, LdaModel, SamplingSchedule, TopicId};
    use crate::sampler::test::ConstantUniform;
    use crate::sampler::{CountSource, GibbsSampler};

    fn trained() -> LdaModel {
        let mut builder = CorpusBuilder::new();
        builder.add_documents(["a b a c", "c c b d", "d e e a", "b b e c"]);
        let hyper = Hyperparameters::new(3, 0.5, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let mut model = LdaModel::random(builder.build(), hyper, &mut rng).unwrap();
        GibbsSampler::new(rng).run(&mut model, &mut CountSource::Local, 20, None, |_, _, _| Ok(())).unwrap();
        model
    }

    fn new_documents(trained: &LdaModel, lines: &[&str]) -> Corpus {
        let mut builder = CorpusBuilder::against(trained.vocabulary());
        builder.add_documents(lines);
        builder.build()
    }

    fn infer(trained: &LdaModel, lines: &[&str], mode: InferenceMode, uniform: f64) -> LdaModel {
        let corpus = new_documents(trained, lines);
        let schedule = SamplingSchedule::new(0, NonZeroUsize::MIN);
        let mut inferencer = Inferencer::new(
            trained,
            corpus,
            *trained.hyperparameters(),
            mode,
            schedule,
            ConstantUniform(uniform)
        ).unwrap();
        inferencer.infer(10, None).unwrap();
        inferencer.model().check_invariants().unwrap();
        inferencer.counts().check_invariants().unwrap();
        inferencer.into_model()
    }

    fn fixed(lines: &[&str], topics: Vec<Vec<TopicId>>) -> LdaModel {
        let mut builder = CorpusBuilder::new();
        builder.add_documents(lines);
        let hyper = Hyperparameters::new(2, 0.5, 0.1).unwrap();
        LdaModel::from_assignment(builder.build(), Assignment::new(topics), hyper, 0).unwrap()
    }

    fn scripted<'a>(
        trained: &'a LdaModel,
        lines: &[&str],
        topics: Vec<Vec<TopicId>>,
        mode: InferenceMode,
        uniform: f64
    ) -> Inferencer<'a, ConstantUniform> {
        let corpus = new_documents(trained, lines);
        let model = LdaModel::from_assignment(corpus, Assignment::new(topics), *trained.hyperparameters(), 0).unwrap();
        Inferencer::from_model(trained, model, mode, ConstantUniform(uniform)).unwrap()
    }

    #[test]
    fn trained_counts_are_read_at_the_global_word_id(){
        // y is global 0, x is global 1 and local 0
        let trained = fixed(&["y y", "x x x x"], vec![vec![0, 0], vec![1, 1, 1, 1]]);
        for mode in [InferenceMode::Merged, InferenceMode::Isolated] {
            for uniform in [0.1, 0.45, 0.9] {
                let mut inferencer = scripted(&trained, &["x"], vec![vec![0]], mode, uniform);
                assert_eq!(Some(&[1][..]), inferencer.model().corpus().local_to_global());

                let stats = inferencer.model().stats().clone();
                assert_eq!(1.0, inferencer.counts().sampling_word_total(&stats, 0, 0, 0));
                assert_eq!(4.0, inferencer.counts().sampling_word_total(&stats, 0, 0, 1));
                assert_eq!(2, inferencer.counts().smoothing_vocabulary_size(&stats));

                // weights 0.5 * 0.1 / 2.2 and 0.5 * 4.1 / 4.2
                let topic = inferencer.sampler.sample_token(&mut inferencer.model, &mut inferencer.counts, 0, 0);
                assert_eq!(1, topic, "{mode} with {uniform}");
                inferencer.model().check_invariants().unwrap();
                inferencer.counts().check_invariants().unwrap();
            }
        }
    }

    #[test]
    fn merged_documents_see_each_other(){
        // x has the same trained counts in both topics
        let trained = fixed(&["x y", "x y"], vec![vec![0, 1], vec![1, 0]]);
        let lines = ["x x x x x x x x", "x"];
        let topics = vec![vec![1; 8], vec![0]];

        // merged: 0.5 * 1.1 / 2.2 against 0.5 * 9.1 / 10.2, the other document pulls to topic 1
        let mut merged = scripted(&trained, &lines, topics.clone(), InferenceMode::Merged, 0.45);
        assert_eq!(1, merged.sampler.sample_token(&mut merged.model, &mut merged.counts, 1, 0));

        // isolated: both weights are 0.5 * 1.1 / 2.2
        let mut isolated = scripted(&trained, &lines, topics, InferenceMode::Isolated, 0.45);
        assert_eq!(0, isolated.sampler.sample_token(&mut isolated.model, &mut isolated.counts, 1, 0));
        isolated.counts().check_invariants().unwrap();
    }

    #[test]
    fn the_trained_counts_are_not_touched(){
        let trained = trained();
        let before = trained.stats().clone();
        let model = infer(&trained, &["a c zz b", "d a"], InferenceMode::Merged, 0.42);
        assert_eq!(&before, trained.stats());
        assert_eq!(2, model.corpus().document_count());
        assert_eq!(3, model.corpus().documents()[0].len());
        assert_eq!(10, model.iteration());
        for row in model.theta() {
            assert_relative_eq!(1.0, row.iter().sum::<f64>(), epsilon = 1E-9);
        }
    }

    #[test]
    fn isolated_documents_do_not_see_each_other(){
        let trained = trained();
        for uniform in [0.1, 0.5, 0.9] {
            let together = infer(&trained, &["a c b", "b b e"], InferenceMode::Isolated, uniform);
            let first = infer(&trained, &["a c b"], InferenceMode::Isolated, uniform);
            let second = infer(&trained, &["b b e"], InferenceMode::Isolated, uniform);
            assert_eq!(first.assignment().document(0), together.assignment().document(0));
            assert_eq!(second.assignment().document(0), together.assignment().document(1));
            assert_eq!(first.theta()[0], together.theta()[0]);
            assert_eq!(second.theta()[0], together.theta()[1]);
        }
    }

    #[test]
    fn a_restored_corpus_is_linked(){
        let trained = trained();
        let built = new_documents(&trained, &["e d", "c"]);
        let unlinked = Corpus::new(built.documents().to_vec(), built.vocabulary().clone());
        let model = LdaModel::random(unlinked, *trained.hyperparameters(), &mut StdRng::seed_from_u64(2)).unwrap();
        let inferencer = Inferencer::from_model(&trained, model, InferenceMode::Merged, StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(built.local_to_global(), inferencer.model().corpus().local_to_global());

        let other = Hyperparameters::new(5, 0.5, 0.1).unwrap();
        let model = LdaModel::random(built, other, &mut StdRng::seed_from_u64(2)).unwrap();
        assert!(Inferencer::from_model(&trained, model, InferenceMode::Merged, StdRng::seed_from_u64(3)).is_err());
    }
}
