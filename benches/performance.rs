// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for pedalsteel
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Combination enumeration
//! - Full 25-fret chord searches, including a copedent with every control
//! - Cache hits against cold searches
//! - Split detection after an edit

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pedalsteel::copedent::presets::{self, LEVER_BANK};
use pedalsteel::copedent::{Control, Copedent, KneeLever, Mechanism, Pedal, SplitResolution};
use pedalsteel::engine::{
    control_combinations, decipher, find_chord_voicings, ChordQuery, VoicingCache,
};
use pedalsteel::music::ChordType;

fn bench_combinations(c: &mut Criterion) {
    let copedent = presets::emmons_e9().unwrap();
    c.bench_function("control_combinations_e9", |b| {
        b.iter(|| black_box(control_combinations(black_box(&copedent)).len()))
    });
}

/// Full search over frets 0-24 for several chord sizes
fn bench_full_search(c: &mut Criterion) {
    let copedent = presets::emmons_e9().unwrap();
    let mut group = c.benchmark_group("find_chord_voicings");

    for chord in [ChordType::Major, ChordType::Dominant7, ChordType::Dominant9] {
        let query = ChordQuery::new("E4", chord.intervals(), 0).unwrap();
        let id = BenchmarkId::new("e9_24_frets", format!("{:?}", chord));
        group.bench_with_input(id, &query, |b, query| {
            b.iter(|| find_chord_voicings(black_box(&copedent), query, 24, None).unwrap())
        });
    }

    group.finish();
}

/// 7 pedals, 12 active levers and 4 mechanisms allowed with everything
fn broad_copedent() -> Copedent {
    let e9 = presets::emmons_e9().unwrap();
    let open: Vec<_> = e9.strings().iter().map(|s| s.open_note).collect();
    let mut copedent = Copedent::new("broad", "Broad", &open);
    for i in 1..=7u32 {
        let pedal = Pedal::new(format!("P{i}"), format!("Pedal {i}")).unwrap();
        copedent
            .add_pedal(pedal.with_change(i * 3 % 10 + 1, 2).with_change(i * 7 % 10 + 1, -1))
            .unwrap();
    }
    for (n, id) in (0u32..).zip(LEVER_BANK) {
        let lever = KneeLever::new(id, id).unwrap();
        copedent
            .add_knee_lever(lever.with_change(n % 10 + 1, 1).with_change((n + 4) % 10 + 1, -1))
            .unwrap();
    }
    for k in 1..=4u32 {
        copedent
            .add_mechanism(Mechanism::new(format!("M{k}"), "Stop").with_change(k, 1))
            .unwrap();
    }
    let ids: Vec<String> = copedent.all_controls().map(|c| c.id().to_string()).collect();
    for k in 1..=4 {
        let mechanism = format!("M{k}");
        for other in ids.iter().filter(|id| **id != mechanism) {
            copedent.allow_combination(&mechanism, other).unwrap();
        }
    }
    copedent.resolve_all_unresolved(SplitResolution::Include);
    copedent
}

fn bench_broad_search(c: &mut Criterion) {
    let copedent = broad_copedent();
    let query = ChordQuery::new("E4", ChordType::Dominant9.intervals(), 3).unwrap();
    c.bench_function("find_chord_voicings_broad_24_frets", |b| {
        b.iter(|| find_chord_voicings(black_box(&copedent), &query, 24, None).unwrap())
    });
}

fn bench_cache(c: &mut Criterion) {
    let copedent = presets::emmons_e9().unwrap();
    let query = ChordQuery::new("A4", &[0, 4, 7], 3).unwrap();
    let cache = VoicingCache::new();
    cache.find_chord_voicings(&copedent, &query, 24, None).unwrap();

    c.bench_function("cache_hit", |b| {
        b.iter(|| cache.find_chord_voicings(black_box(&copedent), &query, 24, None).unwrap())
    });
}

fn bench_split_refresh(c: &mut Criterion) {
    let mut copedent = presets::emmons_e9().unwrap();
    c.bench_function("refresh_splits_e9", |b| {
        b.iter(|| {
            copedent.refresh_splits();
            black_box(copedent.splits().len())
        })
    });
}

fn bench_decipher(c: &mut Criterion) {
    let copedent = presets::emmons_e9().unwrap();
    let none: [&str; 0] = [];
    c.bench_function("decipher_fret_3", |b| {
        b.iter(|| decipher(black_box(&copedent), 3, &["P1", "P2"], &none, &none).unwrap())
    });
}

criterion_group!(
    benches,
    bench_combinations,
    bench_full_search,
    bench_broad_search,
    bench_cache,
    bench_split_refresh,
    bench_decipher,
);

criterion_main!(benches);
