// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for full exports: store lookup, natural ordering,
// shortcode resolution and rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use quire_core::ExportConfig;
use quire_core::types::{Chapter, EntityKind, ExportRequest, StoryId};
use quire_export::Exporter;
use quire_store::MemoryStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Thirty chapters stored in reverse order, each naming a few entities.
fn story_store() -> MemoryStore {
    let paragraph = "<p>#{character:1} crossed #{location:2} carrying the \
                     <b>#{item:3}</b>, thinking of <i>#{lore:4}</i>.</p>"
        .repeat(15);
    (1..=30).rev().fold(
        MemoryStore::new()
            .with_story(1, "Bench Story")
            .with_entity(EntityKind::Character, 1, "Mara")
            .with_entity(EntityKind::Location, 2, "Saltmarsh")
            .with_entity(EntityKind::Item, 3, "Lantern"),
        |store, n| {
            store.with_chapter(
                Chapter::new(n, format!("Chapter {n}"), paragraph.clone()).in_story(StoryId(1)),
            )
        },
    )
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_export(c: &mut Criterion) {
    let store = story_store();
    let exporter = Exporter::new(&store, ExportConfig::default());
    let request = ExportRequest::story(1);

    c.bench_function("export docx (30 chapters)", |b| {
        b.iter(|| black_box(exporter.export("docx", black_box(&request))))
    });

    c.bench_function("export pdf (30 chapters)", |b| {
        b.iter(|| black_box(exporter.export("pdf", black_box(&request))))
    });
}

criterion_group!(benches, bench_export);
criterion_main!(benches);
