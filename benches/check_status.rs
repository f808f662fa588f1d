//! 检测状态基准测试
//!
//! 测试请求头合并、状态汇总和报告序列化的性能

use criterion::{criterion_group, criterion_main, Criterion};
use health_vitals::check::http::merge_headers;
use health_vitals::health::{aggregate, CheckStatus, HealthReport};
use serde_json::json;
use std::hint::black_box;

fn create_statuses(count: usize) -> Vec<CheckStatus> {
    (0..count)
        .map(|i| CheckStatus {
            name: format!("check-{i}"),
            ok: i % 7 != 0,
            severity: (i % 3) as u8 + 1,
            check_output: if i % 7 != 0 {
                "success".to_string()
            } else {
                "HTTP 503 Service Unavailable".to_string()
            },
            last_updated: Some(chrono::Utc::now()),
            panic_guide: None,
            business_impact: None,
            technical_summary: None,
        })
        .collect()
}

/// 请求头合并基准测试
fn header_merge_benchmark(c: &mut Criterion) {
    let user_headers = json!({
        "pragma": "custom",
        "authorization": "Bearer token",
        "x-request-source": "health-vitals",
    });

    c.bench_function("merge_headers", |b| {
        b.iter(|| black_box(merge_headers(Some(black_box(&user_headers)))))
    });
}

/// 汇总与序列化基准测试
fn aggregate_benchmark(c: &mut Criterion) {
    let statuses = create_statuses(100);

    c.bench_function("aggregate_100_checks", |b| {
        b.iter(|| black_box(aggregate(black_box(&statuses))))
    });

    c.bench_function("report_serialization_100_checks", |b| {
        b.iter(|| {
            let report = HealthReport::from_checks(statuses.clone());
            black_box(report.to_json().unwrap())
        })
    });
}

criterion_group!(benches, header_merge_benchmark, aggregate_benchmark);
criterion_main!(benches);
