//! End-to-end tests driving examples through the composed stack

mod common;

use cats::pipeline::cats::CATS;
use cats::pipeline::cats_pdf::{EPSILON, MAX_VALUE, MIN_VALUE};
use cats::pipeline::sample_pdf::RANDOM_SEED;
use cats::pipeline::{
    build_stack, parse_example, Example, LearnError, LearnerStage, Options, PredictionType,
    Session, SessionSettings,
};
use cats::report::PredictionSinks;
use common::{assert_prediction_lines, example_stream, labeled_example, RecordingLearner, SharedBuffer};

fn quiet() -> SessionSettings {
    SessionSettings {
        quiet: true,
        ..Default::default()
    }
}

fn session_with_sink(options: &Options, settings: SessionSettings) -> (Session, SharedBuffer, SharedBuffer) {
    let stack = build_stack(options).unwrap();
    let sink = SharedBuffer::default();
    let progress = SharedBuffer::default();
    let mut sinks = PredictionSinks::new();
    sinks.push(3, Box::new(sink.clone()));
    let session = Session::new(stack.top, settings, sinks, Box::new(progress.clone()));
    (session, sink, progress)
}

#[test]
fn test_single_labeled_example() {
    let options = Options::new().insert(CATS, 4);
    let (mut session, sink, progress) = session_with_sink(&options, quiet());

    let mut ec = labeled_example(0.3, 0.5, 0.8);
    session.process(&mut ec).unwrap();

    let metrics = session.finish().unwrap();
    assert_eq!(metrics.weighted_examples(), 1.0);
    assert_eq!(metrics.weighted_labels, 1.0);
    assert_eq!(metrics.example_number, 1);
    assert!((metrics.sum_loss - 0.5).abs() < 1e-9);

    let text = sink.contents();
    assert_prediction_lines(&text, 1);
    let action: f32 = text.trim().split(',').next().unwrap().parse().unwrap();
    assert!((0.0..=1.0).contains(&action), "action {} out of range", action);
    assert!(progress.is_empty());

    // prediction slot released for the next pass
    assert_eq!(ec.pred, Default::default());
}

#[test]
fn test_progress_header_and_lines() {
    let options = Options::new().insert(CATS, 4);
    let settings = SessionSettings::default();
    let (mut session, _, progress) = session_with_sink(&options, settings);

    let mut examples = example_stream(4);
    session.run(&mut examples).unwrap();
    session.finish().unwrap();

    let text = progress.contents();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("average"));
    assert!(lines[1].starts_with("loss"));
    // header plus lines at weights 1, 2 and 4
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_every_example_gets_a_prediction() {
    let options = Options::new()
        .insert(CATS, 8)
        .insert(MIN_VALUE, 10.0)
        .insert(MAX_VALUE, 20.0)
        .insert(RANDOM_SEED, 7);
    let (mut session, sink, _) = session_with_sink(&options, quiet());

    let mut examples = example_stream(25);
    for ec in &mut examples {
        ec.label.costs[0].action = 10.0 + ec.label.costs[0].action * 10.0;
    }
    session.run(&mut examples).unwrap();
    session.finish().unwrap();

    let text = sink.contents();
    assert_prediction_lines(&text, 25);
    for line in text.lines() {
        let action: f32 = line.split(',').next().unwrap().parse().unwrap();
        assert!((10.0..=20.0).contains(&action), "action {} out of range", action);
    }
}

#[test]
fn test_same_seed_same_predictions() {
    let options = Options::new().insert(CATS, 4).insert(RANDOM_SEED, 42);

    let run = || {
        let (mut session, sink, _) = session_with_sink(&options, quiet());
        let mut examples = example_stream(12);
        session.run(&mut examples).unwrap();
        session.finish().unwrap();
        sink.contents()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_testonly_never_learns() {
    let (learner, calls) = RecordingLearner::new(0.5, 1.0);
    let stack = LearnerStage::new("recorder", Box::new(learner), PredictionType::ActionPdfValue, 1);
    let settings = SessionSettings {
        test_only: true,
        quiet: true,
        ..Default::default()
    };
    let mut session = Session::new(stack, settings, PredictionSinks::new(), Box::new(std::io::sink()));

    let mut examples = example_stream(5);
    session.run(&mut examples).unwrap();

    assert_eq!(calls.borrow().learns, 0);
    assert_eq!(calls.borrow().predicts, 5);
    // labeled test-only examples are holdout examples
    assert_eq!(session.metrics().weighted_holdout_examples, 5.0);
    assert_eq!(session.metrics().example_number, 0);
}

#[test]
fn test_holdout_on_later_passes() {
    let options = Options::new().insert(CATS, 4).insert(EPSILON, 0.1);
    let settings = SessionSettings {
        passes: 2,
        holdout_period: 5,
        quiet: true,
        ..Default::default()
    };
    let (mut session, sink, _) = session_with_sink(&options, settings);

    let mut examples = example_stream(10);
    session.run(&mut examples).unwrap();
    let metrics = session.finish().unwrap();

    // examples 5 and 10 are held out in both passes
    assert_eq!(metrics.weighted_holdout_examples, 4.0);
    assert_eq!(metrics.weighted_labeled_examples, 16.0);
    assert_eq!(metrics.weighted_labels, 20.0);
    assert_prediction_lines(&sink.contents(), 20);
    assert!(examples.iter().all(|ec| ec.pred == Default::default()));
}

#[test]
fn test_unlabeled_examples_are_never_learned() {
    let (learner, calls) = RecordingLearner::new(0.5, 1.0);
    let stack = LearnerStage::new("recorder", Box::new(learner), PredictionType::ActionPdfValue, 1);
    let mut session = Session::new(stack, quiet(), PredictionSinks::new(), Box::new(std::io::sink()));

    let mut examples = vec![
        parse_example("| a b:2", 1).unwrap().unwrap(),
        parse_example("ca :0.5 | a", 2).unwrap().unwrap(),
        labeled_example(0.1, 0.0, 0.5),
    ];
    session.run(&mut examples).unwrap();

    assert_eq!(calls.borrow().learns, 1);
    assert_eq!(calls.borrow().predicts, 2);
    assert_eq!(session.metrics().weighted_unlabeled_examples, 2.0);
    assert_eq!(session.metrics().weighted_labeled_examples, 1.0);
    assert_eq!(session.metrics().weighted_holdout_examples, 0.0);
}

#[test]
fn test_unlabeled_examples_are_predicted_through_cats() {
    let options = Options::new().insert(CATS, 4);
    let (mut session, sink, _) = session_with_sink(&options, quiet());

    let mut examples = vec![
        Example::new().with_feature("user", "age", 0.2),
        labeled_example(0.1, 0.0, 0.5),
    ];
    session.run(&mut examples).unwrap();
    let metrics = session.finish().unwrap();

    assert_eq!(metrics.weighted_unlabeled_examples, 1.0);
    assert_eq!(metrics.weighted_labeled_examples, 1.0);
    assert_eq!(metrics.weighted_labels, 2.0);
    assert_prediction_lines(&sink.contents(), 2);
}

#[test]
fn test_test_only_learn_is_fatal_for_direct_callers() {
    let stack = build_stack(&Options::new().insert(CATS, 4)).unwrap();
    let mut top = stack.top;
    let mut ec = labeled_example(0.3, 0.5, 0.8).with_test_only(true);

    assert_eq!(
        top.learner_mut().learn(&mut ec),
        Err(LearnError::TestOnlyExample)
    );
}
