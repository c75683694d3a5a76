// Crowdfunding hot-path benchmarks.
//
// Covers a single guarded contribution (checkpoint, ledger update, reward
// mint), campaign creation, and the refund sweep over many contributors.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use charity_contracts::{Crowdfunding, RewardToken};
use charity_protocol::{Address, ManualClock, NativeBank};

const START: u64 = 1_700_000_000;

fn deploy() -> (Crowdfunding, Arc<ManualClock>, Arc<NativeBank>) {
    let owner = Address::from_label("owner");
    let token = Arc::new(
        RewardToken::new(Address::from_label("token"), "SupportBadge", "RWD", 18, owner)
            .expect("owner is not null"),
    );
    let clock = Arc::new(ManualClock::new(START));
    let bank = Arc::new(NativeBank::new());
    let cf = Crowdfunding::new(
        Address::from_label("crowdfunding"),
        Arc::clone(&token),
        clock.clone(),
        bank.clone(),
    );
    token
        .set_minter(&owner, &cf.address())
        .expect("owner sets minter");
    (cf, clock, bank)
}

fn bench_contribute(c: &mut Criterion) {
    let (cf, _, _) = deploy();
    let creator = Address::from_label("creator");
    cf.create_campaign(&creator, "bench", u128::MAX, u64::MAX / 2, &creator)
        .expect("valid campaign");
    let alice = Address::from_label("alice");

    c.bench_function("crowdfunding/contribute", |b| {
        b.iter(|| cf.contribute(&alice, 0, 1_000).expect("contribution accepted"));
    });
}

fn bench_create_campaign(c: &mut Criterion) {
    let (cf, _, _) = deploy();
    let creator = Address::from_label("creator");

    c.bench_function("crowdfunding/create_campaign", |b| {
        b.iter(|| {
            cf.create_campaign(&creator, "Flood Relief", 1_000, 604_800, &creator)
                .expect("valid campaign")
        });
    });
}

fn bench_refund_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("crowdfunding/refund_sweep");

    for size in [10usize, 100, 1_000] {
        let contributors: Vec<Address> = (0..size)
            .map(|i| Address::from_label(&format!("contributor-{i}")))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &contributors, |b, contributors| {
            b.iter_batched(
                || {
                    let (cf, clock, bank) = deploy();
                    let creator = Address::from_label("creator");
                    cf.create_campaign(&creator, "sweep", u128::MAX, 60, &creator)
                        .expect("valid campaign");
                    for who in contributors {
                        cf.contribute(who, 0, 100).expect("contribution accepted");
                    }
                    bank.credit(&cf.address(), 100 * contributors.len() as u128)
                        .expect("escrow funded");
                    clock.advance(60);
                    cf.finalize_campaign(0).expect("finalized as failed");
                    cf
                },
                |cf| {
                    for who in contributors {
                        cf.refund(who, 0).expect("refund paid");
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_contribute,
    bench_create_campaign,
    bench_refund_sweep,
);
criterion_main!(benches);
