//! # Concurrent Access Flows
//!
//! Many callers sharing one engine: concurrent misses for a product must run the
//! pipeline once, distinct products must not block each other.

#[cfg(test)]
mod tests {
    use super::super::Harness;
    use av_verification_engine::{AuthenticityApi, EngineConfig};
    use futures::future::join_all;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_compute_once() {
        let h = Arc::new(Harness::with_products(&["WATCH-1"], EngineConfig::default()));
        h.ledger.set_latency(Duration::from_millis(20));

        let tasks = (0..8).map(|i| {
            let h = h.clone();
            tokio::spawn(async move {
                let caller = format!("caller-{i}");
                h.engine.verify("WATCH-1", Some(caller.as_str())).await
            })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(h.ledger.registration_checks().len(), 1);
        let first = &results[0];
        assert!(results.iter().all(|r| r == first));

        let stats = h.engine.cache().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_products_proceed_in_parallel() {
        let h = Arc::new(Harness::with_products(
            &["A", "B", "C", "D"],
            EngineConfig::default(),
        ));
        h.ledger.set_latency(Duration::from_millis(10));
        let started = tokio::time::Instant::now();

        let tasks = ["A", "B", "C", "D"].map(|id| {
            let h = h.clone();
            tokio::spawn(async move { h.engine.verify(id, None).await })
        });
        for joined in join_all(tasks).await {
            assert!(joined.unwrap().unwrap().is_authentic);
        }

        // Seven sequential port calls per product at 10 ms each.
        assert_eq!(started.elapsed(), Duration::from_millis(70));
    }

    #[tokio::test]
    async fn test_engine_shared_as_trait_object() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());
        let api: Arc<dyn AuthenticityApi> = Arc::new(h.engine);

        let result = api.verify("WATCH-1", None).await.unwrap();
        assert!(result.is_authentic);
        assert!(api.invalidate("WATCH-1"));
        assert!(!api.invalidate("WATCH-1"));
    }
}
