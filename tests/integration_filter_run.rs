//! End-to-end runner scenarios over the public API

use modguard::runner::{FilterStore, InMemoryFilterStore, InMemoryProfileSink, ProfileSink};
use modguard::vars::NamesVersion;
use modguard::{
    ComputeRegistry, ComputedVariable, Consequence, ConsequenceKind, Filter, FilterId,
    FilterOutcome, FilterRunner, Value, VariableHolder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn edit_event(old_wikitext: &str, new_wikitext: &str) -> VariableHolder {
    let mut vars = VariableHolder::new();
    vars.set("action", "edit");
    vars.set("user_name", "TestUser");
    vars.set("page_title", "Sandbox");
    vars.set("old_wikitext", old_wikitext);
    vars.set("new_wikitext", new_wikitext);
    vars
}

fn spam_filter() -> Filter {
    Filter::new(FilterId::local(1), "new_wikitext contains 'spam'")
        .with_consequence(Consequence::new(ConsequenceKind::Disallow))
}

#[test]
fn spam_edit_is_blocked_and_logged() {
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(vec![spam_filter()])));
    let result = runner
        .run("default", &mut edit_event("", "spam spam spam"))
        .unwrap();

    assert!(!result.is_allowed());
    assert_eq!(result.strongest, Some(ConsequenceKind::Disallow));
    assert_eq!(result.outcomes[&FilterId::local(1)], FilterOutcome::Matched);
    assert_eq!(result.log_records.len(), 1);
    assert_eq!(result.log_records[0].filter, FilterId::local(1));
    assert_eq!(
        result.log_records[0].consequences,
        vec![ConsequenceKind::Disallow]
    );
}

#[test]
fn disabled_spam_filter_allows_the_edit() {
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(vec![
        spam_filter().disabled(),
    ])));
    let result = runner
        .run("default", &mut edit_event("", "spam spam spam"))
        .unwrap();

    assert!(result.is_allowed());
    assert!(result.log_records.is_empty());
    assert_eq!(result.evaluated_count(), 0);
}

#[test]
fn clean_edit_passes() {
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(vec![spam_filter()])));
    let result = runner
        .run("default", &mut edit_event("", "a perfectly fine edit"))
        .unwrap();
    assert!(result.is_allowed());
    assert_eq!(
        result.outcomes[&FilterId::local(1)],
        FilterOutcome::NotMatched
    );
}

#[test]
fn lazy_facts_resolve_once_across_filters() {
    let computations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&computations);
    let mut registry = ComputeRegistry::new();
    registry.register("user-age", move |_cv, _holder| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Int(3))
    });

    let mut vars = edit_event("", "hello");
    vars.set_registry(Arc::new(registry));
    vars.set_lazy(
        "user_age",
        ComputedVariable::new("user-age", serde_json::Value::Null),
    );

    let filters = vec![
        Filter::new(FilterId::local(1), "user_age < '5'"),
        Filter::new(FilterId::local(2), "user_age > '1'"),
        Filter::new(FilterId::local(3), "user_age == 3"),
    ];
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(filters)));
    let result = runner.run("default", &mut vars).unwrap();

    assert_eq!(result.matched_count(), 3);
    assert_eq!(computations.load(Ordering::SeqCst), 1);
}

#[test]
fn short_circuit_never_forces_lazy_facts() {
    let mut registry = ComputeRegistry::new();
    registry.register("expensive", |_cv, _holder| {
        panic!("a short-circuited branch forced a lazy variable");
    });
    let mut vars = edit_event("", "hello");
    vars.set_registry(Arc::new(registry));
    vars.set_lazy(
        "page_age",
        ComputedVariable::new("expensive", serde_json::Value::Null),
    );

    let filters = vec![Filter::new(
        FilterId::local(1),
        "new_wikitext contains 'spam' & page_age > 100",
    )];
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(filters)));
    let result = runner.run("default", &mut vars).unwrap();
    assert_eq!(
        result.outcomes[&FilterId::local(1)],
        FilterOutcome::NotMatched
    );
}

#[test]
fn budget_overflow_is_deterministic() {
    let filters = vec![
        Filter::new(FilterId::local(1), "1+1+1+1+1+1 > 0"),
        Filter::new(FilterId::local(2), "true"),
    ];
    let store = Arc::new(InMemoryFilterStore::new(filters));

    let mut overflow_outcomes = Vec::new();
    for _ in 0..3 {
        let store_handle: Arc<dyn FilterStore> = store.clone();
        let runner = FilterRunner::new(store_handle).with_condition_limit(4);
        let result = runner.run("default", &mut edit_event("", "x")).unwrap();
        overflow_outcomes.push((result.overflowed, result.evaluated_count()));
    }
    assert!(overflow_outcomes.iter().all(|o| *o == overflow_outcomes[0]));
    assert!(overflow_outcomes[0].0);
}

#[test]
fn legacy_and_current_containers_agree() {
    let filters = vec![Filter::new(FilterId::local(1), "page_title == 'Sandbox'")];
    let store = Arc::new(InMemoryFilterStore::new(filters));

    let mut current = VariableHolder::new();
    current.set("page_title", "Sandbox");

    let mut legacy = VariableHolder::new();
    legacy.set_names_version(NamesVersion::Legacy);
    legacy.set("article_text", "Sandbox");

    let runner = FilterRunner::new(store);
    let from_current = runner.run("default", &mut current).unwrap();
    let from_legacy = runner.run("default", &mut legacy).unwrap();
    assert_eq!(from_current.outcomes, from_legacy.outcomes);
    assert_eq!(from_current.matched_count(), 1);
}

#[test]
fn profile_counters_accumulate() {
    let sink = Arc::new(InMemoryProfileSink::new());
    let filters = vec![
        spam_filter(),
        Filter::new(FilterId::local(2), "user_name == 'TestUser'")
            .with_consequence(Consequence::new(ConsequenceKind::Tag)),
    ];
    let sink_handle: Arc<dyn ProfileSink> = sink.clone();
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(filters)))
        .with_profile_sink(sink_handle);

    runner
        .run("default", &mut edit_event("", "spam"))
        .unwrap();
    runner
        .run("default", &mut edit_event("", "fine"))
        .unwrap();

    let profile = sink.snapshot("default").unwrap();
    assert_eq!(profile.runs, 2);
    assert_eq!(profile.total, 4);
    assert_eq!(profile.matched, 3);
    assert_eq!(profile.overflows, 0);
}

#[test]
fn groups_are_isolated() {
    let filters = vec![
        spam_filter().in_group("default"),
        Filter::new(FilterId::local(7), "true").in_group("move"),
    ];
    let runner = FilterRunner::new(Arc::new(InMemoryFilterStore::new(filters)));
    let result = runner
        .run("move", &mut edit_event("", "spam spam"))
        .unwrap();
    assert_eq!(result.evaluated_count(), 1);
    assert!(result.outcomes.contains_key(&FilterId::local(7)));
}
