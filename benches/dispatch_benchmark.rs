use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use webframe::config::{BearerConfig, Config, SecurityConfig};
use webframe::dispatcher::Dispatcher;
use webframe::param::HttpRequestMethod;
use webframe::request::Request;
use webframe::response::Response;
use webframe::router::Router;
use webframe::session::MemorySessionStore;

fn dispatcher(routes: usize) -> Dispatcher {
    let mut router = Router::new();
    for i in 0..routes {
        router
            .get(&format!("/r{}/:id", i), |_, p| Ok(Response::text(200, p[0].clone())))
            .unwrap();
    }
    router
        .post("/api/items", |_, _| Ok(Response::text(201, "created")))
        .unwrap();

    let security = SecurityConfig {
        bearer: BearerConfig {
            enabled: true,
            tokens: vec!["secret-token-123".to_string()],
            exempt: vec!["/r*".to_string()],
        },
        ..SecurityConfig::default()
    };
    Dispatcher::new(
        Config::new().with_security(security),
        router,
        Arc::new(MemorySessionStore::new()),
    )
    .unwrap()
}

fn route_table_size_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_last_route");
    for size in [1usize, 10, 100] {
        let d = dispatcher(size);
        let path = format!("/r{}/abc", size - 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &path, |b, path| {
            b.iter(|| d.handle(Request::new(HttpRequestMethod::Get, black_box(path)), 0));
        });
    }
    group.finish();
}

fn bearer_post_benchmark(c: &mut Criterion) {
    let d = dispatcher(10);
    c.bench_function("dispatch_bearer_post", |b| {
        b.iter(|| {
            let request = Request::new(HttpRequestMethod::Post, "/api/items")
                .with_header("Authorization", "Bearer secret-token-123");
            d.handle(black_box(request), 0)
        });
    });
}

fn parse_and_dispatch_benchmark(c: &mut Criterion) {
    let d = dispatcher(10);
    let raw = b"GET /r3/hello?x=1 HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Bench\r\n\r\n";
    c.bench_function("parse_and_dispatch", |b| {
        b.iter(|| {
            let request = Request::try_from(black_box(raw), 0).unwrap();
            d.handle(request, 0).as_bytes()
        });
    });
}

criterion_group!(
    benches,
    route_table_size_benchmark,
    bearer_post_benchmark,
    parse_and_dispatch_benchmark
);
criterion_main!(benches);
