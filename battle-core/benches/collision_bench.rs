//! Collectible collision scan benchmark.
//!
//! The scan runs once per projectile per frame; this keeps an eye on the
//! worst case (a full field, no hit).

use archmage_core::collectible::{CollectibleField, CollectibleKind};
use archmage_core::config::BattleConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn full_field(count: usize) -> CollectibleField {
    let config = BattleConfig::default();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let mut field = CollectibleField::default();
    for i in 0..count {
        let kind = if i % 2 == 0 {
            CollectibleKind::ManaBall
        } else {
            CollectibleKind::HealOrb
        };
        field.spawn(kind, &config, &mut rng);
    }
    field
}

fn collision_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("collision_scan");
    for count in [16, 128, 1024] {
        group.bench_function(format!("miss_{count}"), |b| {
            let mut field = full_field(count);
            // Far outside every spawn region: full scan, no removal
            b.iter(|| black_box(field.test_collision(black_box(-500.0), -500.0, 10.0)));
        });
    }
    group.finish();
}

criterion_group!(benches, collision_scan);
criterion_main!(benches);
