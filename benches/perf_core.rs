use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use wordwise_engine::analyzers::{ConcisenessAnalyzer, PassiveAnalyzer};
use wordwise_engine::cache::{FileStorage, RewriteCache};
use wordwise_engine::render::{self, DocumentMap};
use wordwise_engine::suggest::reconcile::TextEdit;
use wordwise_engine::suggest::store::SuggestionStore;
use wordwise_engine::suggest::{Category, Suggestion, SuggestionDetail, SuggestionSource};

const PARAGRAPH: &str = "In order to ship on time we utilize a number of checklists. \
                         The plan was approved by the board prior to the launch. ";

fn synthetic_document(paragraphs: usize) -> String {
    PARAGRAPH.repeat(paragraphs)
}

/// A store holding a spelling suggestion on every word "the" plus the
/// rule-based findings for the document.
fn synthetic_store(text: &str) -> SuggestionStore {
    let mut store = SuggestionStore::new();
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;
    while start + 3 <= chars.len() {
        if chars[start..start + 3] == ['t', 'h', 'e'] {
            if let Some(s) = Suggestion::anchored(
                text,
                start,
                start + 3,
                SuggestionSource::Llm,
                SuggestionDetail::Spelling,
            ) {
                store.insert(s, text);
            }
        }
        start += 1;
    }
    let rules: Vec<Suggestion> = ConcisenessAnalyzer::new()
        .check(text)
        .into_iter()
        .chain(PassiveAnalyzer::new().check(text))
        .collect();
    for s in rules {
        store.insert(s, text);
    }
    store
}

fn bench_reconcile(c: &mut Criterion) {
    let text = synthetic_document(400);
    let store = synthetic_store(&text);
    let edited = format!("Draft: {}", text);
    let edit = TextEdit::new(0, 0, "Draft: ".chars().count());

    c.bench_function("reconcile_insert_at_start", |b| {
        b.iter(|| {
            let mut store = store.clone();
            black_box(store.apply_edit(black_box(&edit), &edited));
        });
    });

    c.bench_function("edit_between_snapshots", |b| {
        b.iter(|| black_box(TextEdit::between(black_box(&text), black_box(&edited))));
    });
}

fn bench_paint(c: &mut Criterion) {
    let text = synthetic_document(400);
    let store = synthetic_store(&text);
    let map = DocumentMap::flat(&text);

    c.bench_function("paint_visible_marks", |b| {
        b.iter(|| black_box(render::paint(&map, &store.visible())));
    });
}

fn bench_rewrite_cache(c: &mut Criterion) {
    let temp = tempfile::tempdir().expect("tempdir");
    let cache = RewriteCache::new(Arc::new(FileStorage::new(temp.path().join("cache.json"))));
    for i in 0..200 {
        cache.set(
            Category::Passive,
            &format!("Sentence {i} was written by someone."),
            &format!("Someone wrote sentence {i}."),
        );
    }

    c.bench_function("rewrite_cache_file_hit", |b| {
        b.iter(|| black_box(cache.get(Category::Passive, "Sentence 100 was written by someone.")));
    });
}

criterion_group!(perf_core, bench_reconcile, bench_paint, bench_rewrite_cache);
criterion_main!(perf_core);
