// core/tests/corpus_to_generation.rs
//
// End-to-end tests: corpus file on disk -> smoothed table -> generation.

use libbigram_core::{
    bigram_model, Greedy, Lookahead, ProbabilityTable, SequenceGenerator, Strategy, INIT, UNKNOWN,
};
use std::io::Write;
use std::sync::Arc;

fn write_corpus(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
    f
}

#[test]
fn test_worked_example_from_file() {
    let corpus = write_corpus(&["the cat sat", "", "the dog ran"]);
    let table = bigram_model(corpus.path()).unwrap();

    assert_eq!(table.vocabulary_size(), 6);
    for tok in ["the", "cat", "sat", "dog", "ran", UNKNOWN] {
        assert!(table.vocabulary().contains(tok), "missing {:?}", tok);
    }
    assert!((table.get_probability("the", "cat") - 0.25).abs() < 1e-12);

    for strategy in [Strategy::Greedy, Strategy::Lookahead] {
        let g = strategy.generate(&table, "the", 4);
        assert_eq!(g.len(), 4, "{}", strategy);
        assert_eq!(g.tokens[0], "the");
        assert!(g.log_prob.is_finite());
        assert!(!g.tokens.iter().any(|t| t == INIT));
    }
}

#[test]
fn test_generation_log_prob_matches_rescoring() {
    let corpus = write_corpus(&[
        "Lucy opened the wardrobe .",
        "Edmund followed Lucy into the wardrobe ,",
        "the snow was cold and the lamp post glowed .",
        "Aslan is on the move !",
    ]);
    let table = bigram_model(corpus.path()).unwrap();

    for g in [
        Greedy.generate(&table, "Lucy", 10),
        Lookahead.generate(&table, "Lucy", 10),
    ] {
        let rescored = table.score_sequence(&g.tokens);
        assert!((g.log_prob - rescored).abs() < 1e-9);
    }
}

#[test]
fn test_missing_corpus_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = bigram_model(dir.path().join("absent.txt")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_empty_corpus_file() {
    let corpus = write_corpus(&["", "   ", ""]);
    let table = bigram_model(corpus.path()).unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.vocabulary_size(), 1);

    // Only UNKNOWN exists; generation still honours the length contract
    let g = Greedy.generate(&table, "hello", 3);
    assert_eq!(g.tokens, vec!["hello", "", ""]);
}

#[test]
fn test_table_shared_across_threads() {
    let corpus = write_corpus(&["a b c d e", "b c a e d", "e d c b a"]);
    let table: Arc<ProbabilityTable> = Arc::new(bigram_model(corpus.path()).unwrap());

    let expected_greedy = Greedy.generate(&table, "a", 5);
    let expected_look = Lookahead.generate(&table, "a", 5);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let table = Arc::clone(&table);
                s.spawn(move || {
                    if i % 2 == 0 {
                        Greedy.generate(&table, "a", 5)
                    } else {
                        Lookahead.generate(&table, "a", 5)
                    }
                })
            })
            .collect();

        for (i, h) in handles.into_iter().enumerate() {
            let g = h.join().unwrap();
            if i % 2 == 0 {
                assert_eq!(g, expected_greedy);
            } else {
                assert_eq!(g, expected_look);
            }
        }
    });
}
