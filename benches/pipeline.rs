use std::fs::File;
use std::io::Write;
use std::path::Path;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use school_climate::config::AliasConfig;
use school_climate::filter::{self, FilterSpec, Range};
use school_climate::io_utils::ReadOptions;
use school_climate::pipeline::{self, SourcePaths};
use school_climate::{groups, stats};
use tempfile::TempDir;

const SCHOOL_HEADER: &str = "CO_ENTIDADE,NO_ENTIDADE,TP_DEPENDENCIA,QT_SALAS_UTILIZADAS,QT_SALAS_UTILIZA_CLIMATIZADAS,NO_BAIRRO";
const PERFORMANCE_HEADER: &str = "Sigla da UF,Código da Escola,Taxa de Aprovação - 2023";

fn write_lines(path: &Path, header: &str, rows: impl Iterator<Item = String>) {
    let mut file = File::create(path).expect("create csv");
    writeln!(file, "{header}").expect("header");
    for row in rows {
        writeln!(file, "{row}").expect("row");
    }
}

fn generate_sources(schools: usize) -> (TempDir, SourcePaths) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let paths = SourcePaths {
        schools: temp_dir.path().join("escolas.csv"),
        early: temp_dir.path().join("iniciais.csv"),
        final_: temp_dir.path().join("finais.csv"),
    };
    write_lines(
        &paths.schools,
        SCHOOL_HEADER,
        (0..schools).map(|i| {
            let total = 6 + i % 20;
            let ac = (i * 7) % (total + 1);
            let dependency = if i % 5 == 0 { 2 } else { 3 };
            let neighborhood = ["Centro", "Tijuca", "Bangu", "Campo Grande"][i % 4];
            format!("{},Escola {i},{dependency},{total},{ac},{neighborhood}", 33_000_000 + i)
        }),
    );
    write_lines(
        &paths.early,
        PERFORMANCE_HEADER,
        (0..schools).map(|i| format!("RJ,{}.0,{:.1}", 33_000_000 + i, 4.0 + (i % 50) as f64 / 10.0)),
    );
    write_lines(
        &paths.final_,
        PERFORMANCE_HEADER,
        (0..schools)
            .filter(|i| i % 3 != 0)
            .map(|i| format!("RJ,{},{:.1}", 33_000_000 + i, 3.0 + (i % 40) as f64 / 10.0)),
    );
    (temp_dir, paths)
}

fn bench_pipeline(c: &mut Criterion) {
    let (temp_dir, paths) = generate_sources(20_000);
    let options = ReadOptions::default();
    let config = AliasConfig::default();
    let output = pipeline::process_files(&paths, &options, &config).expect("pipeline");
    let spec = FilterSpec {
        neighborhood: Some("Centro".to_string()),
        ac_percentage: Some(Range::new(25.0, 100.0).expect("range")),
        early_score: Some(Range::new(5.0, 10.0).expect("range")),
        ..FilterSpec::default()
    };

    let mut group = c.benchmark_group("school_pipeline");

    group.bench_function("load_and_reconcile", |b| {
        b.iter_batched(
            || (),
            |_| {
                pipeline::process_files(&paths, &options, &config).expect("pipeline");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("filter", |b| {
        b.iter(|| filter::apply(&output.schools, &spec));
    });

    group.bench_function("correlations_and_groups", |b| {
        b.iter(|| {
            let correlations = stats::analyze_correlations(&output.schools);
            let comparisons = groups::compare_high_low_ac(&output.schools);
            (correlations, comparisons)
        });
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
