// Performance benchmarks for system-alert-sound
//
// Run with: cargo bench
// View results in: target/criterion/report/index.html

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use system_alert_sound::{
    config::{ConfigStore, MemoryConfigStore, TomlConfigStore, SYSTEM_ALERT_VOLUME_KEY},
    AlertSoundPlayer, RecordingOutput,
};

const CONFIG: &str = r#"
[apps.osso.sound]
system_alert_volume = 1

[player]
max_sample_bytes = 4194304
"#;

/// Benchmark nested key lookup in the TOML store
fn bench_toml_lookup(c: &mut Criterion) {
    let store: TomlConfigStore = CONFIG.parse().expect("valid config");

    c.bench_function("toml_volume_lookup", |b| {
        b.iter(|| black_box(store.get_int(black_box(SYSTEM_ALERT_VOLUME_KEY))))
    });
}

/// Benchmark the full play path against a recording output
fn bench_play(c: &mut Criterion) {
    let mut group = c.benchmark_group("play");

    for volume in [0_i64, 1, 2] {
        let output = RecordingOutput::new();
        let player = AlertSoundPlayer::new(MemoryConfigStore::with_volume(volume), &output)
            .with_owner_name("bench");

        group.bench_with_input(BenchmarkId::from_parameter(volume), &volume, |b, _| {
            b.iter(|| {
                player.play(black_box("alert.wav"));
                output.clear();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_toml_lookup, bench_play);
criterion_main!(benches);
