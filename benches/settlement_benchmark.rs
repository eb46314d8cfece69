// ============================================================================
// Settlement Benchmarks
// ============================================================================
//
// Benchmark Categories:
// 1. Full Run - One month settled end to end at increasing site counts
// 2. Pairing Comparison - Same-period against peak substitution
// 3. Edit Reconciliation - FIFO unbanking over a deep deposit pool
// ============================================================================

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use energy_settlement::prelude::*;
use rust_decimal::Decimal;
use std::hint::black_box;
use std::sync::Arc;

fn month() -> MonthKey {
    MonthKey::new(6, 2024).unwrap()
}

fn build_input(producers: usize, consumers: usize) -> SettlementInput {
    let month = month();
    let mut input = SettlementInput::new(month);

    for i in 0..producers {
        let base = 200 + (i as i64 * 37) % 500;
        let kind = if i % 3 == 0 { ProducerKind::Solar } else { ProducerKind::Wind };
        input = input.with_production(ProductionUnit::new(
            format!("GEN-{i:03}"),
            format!("GCO-{}", i % 4),
            month,
            kind,
            i % 2 == 0,
            [base, base / 2, base / 3, base, base / 4],
        ));
    }

    let mut selection = ConsumerSelection::new();
    for i in 0..consumers {
        let demand = 80 + (i as i64 * 53) % 300;
        let site = format!("CON-{i:03}");
        selection = selection.with_priority(site.as_str(), (i % 7) as u32);
        input = input.with_consumption(ConsumptionUnit::new(
            site,
            format!("Consumer {i}"),
            "CCO",
            month,
            [demand, demand, demand / 2, demand, demand],
        ));
    }

    for g in 0..4 {
        input = input.with_shareholding(ShareholdingRecord::new(
            format!("GCO-{g}"),
            "CCO",
            Decimal::from(60 + g * 10),
        ));
    }

    input.with_selection(selection)
}

// ============================================================================
// Full Run
// ============================================================================

fn benchmark_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    let engine = SettlementEngineBuilder::new("bench")
        .with_residue_warnings(false)
        .build(Arc::new(NoOpEventHandler))
        .unwrap();

    for sites in [10, 50, 200].iter() {
        let input = build_input(*sites, *sites);
        group.bench_with_input(BenchmarkId::new("sites", sites), &input, |b, input| {
            b.iter(|| black_box(engine.settle(input).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Pairing Comparison
// ============================================================================

fn benchmark_pairing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairing");
    let input = build_input(50, 50);

    for kind in [PeriodPairingKind::SamePeriod, PeriodPairingKind::PeakSubstitution] {
        let config = SettlementConfig::new("bench", kind).with_residue_warnings(false);
        let engine = create_from_config(config, Arc::new(NoOpEventHandler)).unwrap();
        group.bench_function(engine.pairing_name().to_string(), |b| {
            b.iter(|| black_box(engine.settle(&input).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Edit Reconciliation
// ============================================================================

fn benchmark_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");
    let key = BankKey::new("CCO", "GEN-000", "CON-000");

    for deposits in [10, 100, 1000].iter() {
        let mut seeded = DepositLedger::new();
        for _ in 0..*deposits {
            seeded.deposit(&key, month(), Period::P1, 3);
        }
        let old = PeriodQuantities::new([(*deposits as i64) * 3, 0, 0, 0, 0]);

        group.bench_with_input(BenchmarkId::new("unbank_all", deposits), &seeded, |b, seeded| {
            b.iter(|| {
                let mut ledger = seeded.clone();
                black_box(energy_settlement::engine::reconcile_quantities(
                    key.clone(),
                    month(),
                    &old,
                    &PeriodQuantities::ZERO,
                    &mut ledger,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_run,
    benchmark_pairing,
    benchmark_reconciliation
);
criterion_main!(benches);
