use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::executor::block_on;
use futures::future::join_all;
use vector_load_protocol::logging::{init_tracing, TracingConfig};
use vector_load_protocol::*;

const HOT: VectorId = VectorId(0x10);
const FLAKY: VectorId = VectorId(0x20);

fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::default())?;

    let config = CoordinatorConfig::from_json(
        r#"{"retry_limit": 2, "request_timeout_ms": 2000, "failure_ttl_ms": 10000}"#,
    )?;
    let registry = registry::init();
    println!("Registered message types: {:?}", registry);

    let (transport, mut outbound) = FrameTransport::channel();
    let cache = Arc::new(InMemoryPageCache::new());
    let coordinator = LoadCoordinator::new(config, transport, cache.clone(), registry.clone())?;

    // Owner fails the first request for the flaky vector, then recovers.
    let flaky_calls = AtomicU32::new(0);
    let responder = LoadResponder::new(
        move |page: &VectorPageId| {
            if page.vector() == HOT {
                Ok(ResidentPageHandle(page.low() / 100))
            } else if page.vector() == FLAKY {
                if flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(FailureReason::OwnerOverloaded)
                } else {
                    Ok(ResidentPageHandle(900))
                }
            } else {
                Err(FailureReason::NotFound)
            }
        },
        registry.clone(),
    );

    let me = WorkerId(1);
    let page = |vector| {
        VectorPageId::new(vector, 0, 100).ok_or_else(|| anyhow::anyhow!("inverted page range"))
    };
    let hot = page(HOT)?;
    let flaky = page(FLAKY)?;
    let missing = page(VectorId(0x30))?;

    let mut pending = Vec::new();
    for _ in 0..4 {
        pending.push(coordinator.request_page(hot, me));
    }
    pending.push(coordinator.request_page(flaky, me));
    pending.push(coordinator.request_page(missing, me));

    // Pump frames until the owner has nothing left to answer.
    while let Ok(Some(bytes)) = outbound.try_next() {
        println!("-> {}", registry.describe(&bytes)?);
        if let Some(answer) = responder.respond_frame(&bytes)? {
            println!("<- {}", registry.describe(&answer)?);
            coordinator.on_frame(&answer);
        }
    }

    for (i, result) in block_on(join_all(pending)).into_iter().enumerate() {
        match result {
            Ok(handle) => println!("waiter {i}: {handle}"),
            Err(err) => println!("waiter {i}: {err}"),
        }
    }

    println!("Resident pages: {}", cache.len());
    println!("Stats: {:?}", coordinator.stats());
    Ok(())
}
