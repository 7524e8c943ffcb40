use criterion::{criterion_group, criterion_main, Criterion};
use std::{sync::Arc, time::Duration};

use service::auth::domain::{LoginInput, SignupInput};
use service::auth::notifier::mock::MockNotifier;
use service::auth::repository::mock::MockUserStore;
use service::auth::service::{AuthConfig, AuthService};

fn bench_login(c: &mut Criterion) {
    let cfg = AuthConfig {
        jwt_secret: "bench-secret-bench-secret-bench-secret".into(),
        jwt_expires_in: Duration::from_secs(3600),
        reset_token_ttl: Duration::from_secs(600),
    };
    let svc = AuthService::new(Arc::new(MockUserStore::default()), Arc::new(MockNotifier::default()), cfg);

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _ = rt.block_on(svc.signup(SignupInput {
        name: "Bench".into(),
        email: "bench@example.com".into(),
        password: "Benchmark1".into(),
        password_confirm: "Benchmark1".into(),
        photo: None,
    }));

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let _ = rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() })).unwrap();
        });
    });

    let token = rt
        .block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() }))
        .unwrap()
        .token;
    c.bench_function("auth_protect", |b| {
        b.iter(|| {
            let _ = rt.block_on(svc.protect(Some(&token))).unwrap();
        });
    });
}

criterion_group!(benches, bench_login);
criterion_main!(benches);
