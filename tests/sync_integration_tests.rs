//! Integration tests for the shared fuzzy cache and corpus scoring under
//! concurrent use.

use anno_score::eval::{
    evaluate_entities, score_corpus, DocumentScore, EntityItem, EvalConfig, Tag,
};
use anno_score::similarity::FuzzyMatcher;
use std::sync::Arc;
use std::thread;

#[test]
fn test_fuzzy_matcher_concurrent_access() {
    let matcher = Arc::new(FuzzyMatcher::new(0.2));
    let words = ["москва", "москвы", "москве", "петербург", "петербурга"];
    let mut handles = vec![];

    for i in 0..8 {
        let matcher = Arc::clone(&matcher);
        handles.push(thread::spawn(move || {
            let a = words[i % words.len()];
            for b in words {
                let forward = matcher.matches(a, b);
                let backward = matcher.matches(b, a);
                assert_eq!(forward, backward);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("thread panicked");
    }
    // unordered pairs of distinct words, at most
    assert!(matcher.cached_pairs() <= words.len() * (words.len() - 1) / 2);
}

#[test]
fn test_shared_matcher_is_one_cache() {
    let first = FuzzyMatcher::shared();
    let second = FuzzyMatcher::default();
    first.matches("роснефть", "роснефти");
    assert!(second.cached_pairs() >= 1);
}

#[test]
fn test_corpus_scoring_matches_sequential_sum() {
    let config = EvalConfig::default();
    let documents: Vec<(Vec<EntityItem>, Vec<EntityItem>)> = (0..12)
        .map(|i| {
            let reference = vec![
                EntityItem::new(1, Tag::Person).with_attribute("surname", ["Иванов"]),
                EntityItem::new(2, Tag::Organization).with_attribute("name", ["Газпром"]),
            ];
            let system = if i % 3 == 0 {
                vec![EntityItem::new(1, Tag::Person).with_attribute("surname", ["Иванова"])]
            } else {
                reference.clone()
            };
            (reference, system)
        })
        .collect();

    let scores = score_corpus(&documents, |(reference, system)| {
        let alignment = evaluate_entities(reference, system, &config)?;
        Ok(DocumentScore::from_alignment("doc", &alignment))
    })
    .unwrap();

    assert_eq!(scores.documents.len(), 12);
    assert_eq!(scores.overall.n_std, 24);
    assert_eq!(scores.overall.n_test, 20);
    assert_eq!(scores.overall.tp_std, 20.0);
    assert_eq!(scores.overall.precision.get(), 1.0);
    assert_eq!(scores.by_tag[&Tag::Organization].n_test, 8);
}
