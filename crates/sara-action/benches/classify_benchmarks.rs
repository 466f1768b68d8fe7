//! Benchmarks for intent classification and plan building.
//!
//! Classification runs on every utterance, so a miss on the last rule of the
//! table (the UNKNOWN fallback) is the worst case worth tracking.
//!
//! ```bash
//! cargo bench -p sara-action
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sara_action::{IntentClassifier, PlanBuilder};

/// A spread of commands hitting early, middle, and late rules.
const COMMANDS: &[&str] = &[
    "what time is it?",
    "open notepad",
    "increase the volume",
    "create a folder named Quarterly Reports",
    "search for rust async runtimes",
    "what's the weather in Lisbon",
];

const GIBBERISH: &str = "xyz random gibberish abc with nothing recognisable in it";

fn bench_classify(c: &mut Criterion) {
    let classifier = IntentClassifier::new();

    c.bench_function("classify_mixed_commands", |b| {
        b.iter(|| {
            for command in COMMANDS {
                black_box(classifier.classify(black_box(command)));
            }
        })
    });

    c.bench_function("classify_unknown_fallback", |b| {
        b.iter(|| black_box(classifier.classify(black_box(GIBBERISH))))
    });
}

fn bench_classify_and_plan(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let planner = PlanBuilder::new();

    c.bench_function("classify_and_plan", |b| {
        b.iter(|| {
            for command in COMMANDS {
                let intent = classifier.classify(black_box(command));
                black_box(planner.build(&intent));
            }
        })
    });
}

criterion_group!(benches, bench_classify, bench_classify_and_plan);
criterion_main!(benches);
