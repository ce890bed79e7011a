//! # Single-Product Verification Flows
//!
//! Scoring, caching, retry and certificate behaviour observed end to end.

#[cfg(test)]
mod tests {
    use super::super::{Harness, MANUFACTURER};
    use av_verification_engine::adapters::FIXTURE_EPOCH;
    use av_verification_engine::domain::{
        CERTIFICATE_VALIDITY_MS, DAY_MS, WARNING_NOT_REGISTERED,
    };
    use av_verification_engine::{
        AuthenticityApi, Cancellation, CertificateStatus, EngineConfig, EngineConfigBuilder,
        GatewayError, InMemoryLedger, ProductFixture, ProductStatus, VerificationError,
        VerificationOutcome,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_retries() -> EngineConfig {
        EngineConfigBuilder::new()
            .retry_base_delay_ms(1_000)
            .max_retries(3)
            .build()
            .unwrap()
    }

    /// Engine over a single fixture from a well-established manufacturer.
    fn harness_for(fixture: ProductFixture) -> Harness {
        let ledger = InMemoryLedger::with_products([fixture]);
        ledger.set_manufacturer_reputation(MANUFACTURER, 60);
        Harness::over(Arc::new(ledger), EngineConfig::default())
    }

    // =============================================================================
    // SCORING
    // =============================================================================

    #[tokio::test]
    async fn test_genuine_product_scores_full_marks() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());

        let result = h.engine.verify("WATCH-1", Some("0xretailer")).await.unwrap();

        assert!(result.is_authentic);
        assert_eq!(result.confidence_score, 100);
        let breakdown = result.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.gross(), 100);
        assert_eq!(breakdown.penalty, 0);
        assert!(result.data_integrity.hash_valid);
        assert!(result.data_integrity.supply_chain_intact);
        assert_eq!(result.product.as_ref().unwrap().manufacturer, MANUFACTURER);
    }

    #[tokio::test]
    async fn test_failed_checkpoint_and_counterfeit_history() {
        let ledger = InMemoryLedger::with_products([ProductFixture::genuine("BAG-1", MANUFACTURER)
            .with_failed_step()
            .with_prior_verification(VerificationOutcome::Verified)
            .with_prior_verification(VerificationOutcome::Counterfeit)]);
        ledger.set_manufacturer_reputation(MANUFACTURER, 60);
        let h = Harness::over(Arc::new(ledger), EngineConfig::default());

        let result = h.engine.verify("BAG-1", None).await.unwrap();

        assert_eq!(result.confidence_score, 50);
        assert!(!result.is_authentic);
        assert_eq!(result.warnings().len(), 2);
        assert!(!result.data_integrity.supply_chain_intact);
    }

    #[tokio::test]
    async fn test_malformed_hash_costs_hash_and_signature_points() {
        let ledger = InMemoryLedger::with_products([
            ProductFixture::genuine("SHOE-1", MANUFACTURER).with_hash("0x1234")
        ]);
        ledger.set_manufacturer_reputation(MANUFACTURER, 60);
        let h = Harness::over(Arc::new(ledger), EngineConfig::default());

        let result = h.engine.verify("SHOE-1", None).await.unwrap();

        assert_eq!(result.confidence_score, 65);
        assert!(!result.is_authentic);
        assert!(!result.data_integrity.hash_valid);
        assert!(!result.data_integrity.blockchain_confirmed);
    }

    #[tokio::test]
    async fn test_high_score_without_verified_status_is_rejected() {
        let ledger = InMemoryLedger::with_products([
            ProductFixture::genuine("PHONE-1", MANUFACTURER).with_status(ProductStatus::Unverified)
        ]);
        ledger.set_manufacturer_reputation(MANUFACTURER, 60);
        let h = Harness::over(Arc::new(ledger), EngineConfig::default());

        let result = h.engine.verify("PHONE-1", None).await.unwrap();

        assert_eq!(result.confidence_score, 100);
        assert!(!result.is_authentic);
    }

    #[tokio::test]
    async fn test_unregistered_product() {
        let h = Harness::with_products(&[], EngineConfig::default());

        let result = h.engine.verify("FAKE-1", None).await.unwrap();

        assert!(!result.is_authentic);
        assert_eq!(result.confidence_score, 0);
        assert!(result.product.is_none());
        assert!(result.supply_chain.is_empty());
        assert_eq!(result.warnings(), [WARNING_NOT_REGISTERED.to_string()]);
    }

    #[tokio::test]
    async fn test_low_confirmations_drop_to_lower_tier() {
        let h = harness_for(ProductFixture::genuine("RING-1", MANUFACTURER).with_confirmations(4));

        let result = h.engine.verify("RING-1", None).await.unwrap();

        assert_eq!(result.confidence_score, 90);
        assert!(result.is_authentic);
        assert_eq!(
            result.warnings(),
            ["Low blockchain confirmations (4)".to_string()]
        );
        assert!(result.data_integrity.blockchain_confirmed);
    }

    #[tokio::test]
    async fn test_too_few_confirmations_are_not_confirmed() {
        let h = harness_for(ProductFixture::genuine("RING-2", MANUFACTURER).with_confirmations(2));

        let result = h.engine.verify("RING-2", None).await.unwrap();

        assert_eq!(result.confidence_score, 85);
        assert!(!result.data_integrity.blockchain_confirmed);
        assert_eq!(
            result.warnings(),
            ["Insufficient blockchain confirmations (2)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_short_supply_chain_tiers() {
        let genuine = ProductFixture::genuine("LAMP-2", MANUFACTURER);
        let two_steps = genuine.supply_chain[..2].to_vec();
        let h = harness_for(genuine.with_supply_chain(two_steps));

        let result = h.engine.verify("LAMP-2", None).await.unwrap();

        assert_eq!(result.confidence_score, 85);
        assert!(result.is_authentic);
        assert!(result.data_integrity.supply_chain_intact);
        assert_eq!(
            result.warnings(),
            ["Supply chain has only 2 checkpoints".to_string()]
        );

        let genuine = ProductFixture::genuine("LAMP-3", MANUFACTURER);
        let three_steps = genuine.supply_chain[..3].to_vec();
        let h = harness_for(genuine.with_supply_chain(three_steps));

        let result = h.engine.verify("LAMP-3", None).await.unwrap();

        assert_eq!(result.confidence_score, 93);
    }

    #[tokio::test]
    async fn test_empty_supply_chain_is_not_intact() {
        let h = harness_for(
            ProductFixture::genuine("LAMP-0", MANUFACTURER).with_supply_chain(Vec::new()),
        );

        let result = h.engine.verify("LAMP-0", None).await.unwrap();

        assert_eq!(result.confidence_score, 75);
        assert!(result.supply_chain.is_empty());
        assert!(!result.data_integrity.supply_chain_intact);
    }

    #[tokio::test]
    async fn test_fewer_prior_verifications_lower_history_points() {
        let h = harness_for(
            ProductFixture::genuine("BELT-1", MANUFACTURER).with_verification_count(30),
        );

        let result = h.engine.verify("BELT-1", None).await.unwrap();

        assert_eq!(result.confidence_score, 95);
        assert_eq!(result.breakdown.as_ref().unwrap().historical_pattern, 5);
        assert!(result.warnings().is_empty());
    }

    #[tokio::test]
    async fn test_registration_older_than_five_years_is_flagged() {
        let h = harness_for(
            ProductFixture::genuine("VASE-1", MANUFACTURER)
                .registered_at(FIXTURE_EPOCH - 6 * 365 * DAY_MS),
        );

        let result = h.engine.verify("VASE-1", None).await.unwrap();

        // The warning carries no point cost.
        assert_eq!(result.confidence_score, 100);
        assert!(result.is_authentic);
        assert!(!result.data_integrity.timestamp_valid);
        assert_eq!(
            result.warnings(),
            ["Registration timestamp is outside the plausible range".to_string()]
        );
    }

    #[tokio::test]
    async fn test_registration_in_the_future_is_flagged() {
        let h = harness_for(
            ProductFixture::genuine("VASE-2", MANUFACTURER).registered_at(FIXTURE_EPOCH + DAY_MS),
        );

        let result = h.engine.verify("VASE-2", None).await.unwrap();

        assert!(!result.data_integrity.timestamp_valid);
        assert_eq!(result.warnings().len(), 1);
    }

    // =============================================================================
    // CACHE
    // =============================================================================

    #[tokio::test]
    async fn test_cache_hit_within_ttl_returns_same_timestamp() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());

        let first = h.engine.verify("WATCH-1", None).await.unwrap();
        let calls_after_first = h.ledger.call_count();

        h.clock.advance(4 * 60 * 1_000);
        let second = h.engine.verify("WATCH-1", None).await.unwrap();

        assert_eq!(second.verification_timestamp, first.verification_timestamp);
        assert_eq!(h.ledger.call_count(), calls_after_first);
        assert_eq!(h.engine.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_entry_past_ttl_is_recomputed() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());

        let first = h.engine.verify("WATCH-1", None).await.unwrap();
        h.clock.advance(5 * 60 * 1_000 + 1);
        let second = h.engine.verify("WATCH-1", None).await.unwrap();

        assert!(second.verification_timestamp > first.verification_timestamp);
        assert_eq!(h.engine.cache().stats().expired, 1);
    }

    #[tokio::test]
    async fn test_configured_ttl_is_honoured() {
        let config = EngineConfigBuilder::new().cache_ttl_secs(10).build().unwrap();
        let h = Harness::with_products(&["WATCH-1"], config);

        let first = h.engine.verify("WATCH-1", None).await.unwrap();
        h.clock.advance(10_001);
        let second = h.engine.verify("WATCH-1", None).await.unwrap();

        assert_ne!(second.verification_timestamp, first.verification_timestamp);
    }

    #[tokio::test]
    async fn test_ledger_change_visible_after_invalidate() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());
        assert!(h.engine.verify("WATCH-1", None).await.unwrap().is_authentic);

        h.ledger.insert(
            ProductFixture::genuine("WATCH-1", MANUFACTURER).with_status(ProductStatus::Counterfeit),
        );
        assert!(h.engine.verify("WATCH-1", None).await.unwrap().is_authentic);

        assert!(h.engine.invalidate("WATCH-1"));
        assert!(!h.engine.verify("WATCH-1", None).await.unwrap().is_authentic);
    }

    #[tokio::test]
    async fn test_deregistered_product_served_from_cache_until_invalidated() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());
        h.engine.verify("WATCH-1", None).await.unwrap();

        assert!(h.ledger.remove("WATCH-1").is_some());
        let cached = h.engine.verify("WATCH-1", None).await.unwrap();
        assert!(cached.is_authentic);

        h.engine.invalidate("WATCH-1");
        let fresh = h.engine.verify("WATCH-1", None).await.unwrap();
        assert_eq!(fresh.confidence_score, 0);
        assert_eq!(fresh.warnings(), [WARNING_NOT_REGISTERED.to_string()]);
    }

    // =============================================================================
    // RETRY
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_transient_failures() {
        let h = Harness::with_products(&["WATCH-1"], fast_retries());
        h.ledger.fail_next(2, GatewayError::Timeout(5_000));

        let result = h.engine.verify("WATCH-1", None).await.unwrap();

        assert!(result.is_authentic);
        let checks = h.ledger.registration_checks();
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[1].1 - checks[0].1, Duration::from_millis(1_000));
        assert_eq!(checks[2].1 - checks[1].1, Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_error_is_not_cached() {
        let h = Harness::with_products(&["WATCH-1"], fast_retries());
        h.ledger
            .fail_always("WATCH-1", GatewayError::Rpc("header not found".into()));

        let err = h.engine.verify("WATCH-1", None).await.unwrap_err();
        assert!(matches!(err, VerificationError::Gateway(GatewayError::Rpc(_))));

        h.ledger.heal("WATCH-1");
        let result = h.engine.verify("WATCH-1", None).await.unwrap();
        assert!(result.is_authentic);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_gateway_makes_exactly_max_attempts() {
        let h = Harness::with_products(&["WATCH-1"], fast_retries());
        h.ledger
            .fail_always("WATCH-1", GatewayError::Unavailable("rpc down".into()));

        let err = h.engine.verify("WATCH-1", None).await.unwrap_err();

        assert_eq!(
            err,
            VerificationError::Gateway(GatewayError::Unavailable("rpc down".into()))
        );
        assert_eq!(h.ledger.registration_checks().len(), 3);
        assert!(h.engine.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_is_distinct_error() {
        let h = Arc::new(Harness::with_products(&["WATCH-1"], fast_retries()));
        h.ledger
            .fail_always("WATCH-1", GatewayError::Unavailable("rpc down".into()));
        let (handle, cancel) = Cancellation::new();

        let harness = h.clone();
        let task = tokio::spawn(async move {
            harness
                .engine
                .verify_with_cancel("WATCH-1", None, &cancel)
                .await
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), Err(VerificationError::Cancelled));
        assert_eq!(h.ledger.registration_checks().len(), 1);
    }

    // =============================================================================
    // CERTIFICATES
    // =============================================================================

    #[tokio::test]
    async fn test_certificate_from_api() {
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());
        let api: &dyn AuthenticityApi = &h.engine;

        let result = api.verify("WATCH-1", None).await.unwrap();
        let certificate = api.certificate_of(&result);

        assert!(certificate.certificate_id.starts_with("CERT-"));
        assert_eq!(certificate.status, CertificateStatus::Authentic);
        assert_eq!(certificate.confidence_score, 100);
        assert_eq!(
            certificate.expires_at - certificate.issued_at,
            CERTIFICATE_VALIDITY_MS
        );
        assert_eq!(certificate.certificate_hash.len(), 66);
    }

    #[tokio::test]
    async fn test_seeded_certificates_repeat() {
        let a = Harness::with_products(&["WATCH-1"], EngineConfig::default());
        let b = Harness::with_products(&["WATCH-1"], EngineConfig::default());

        let result = a.engine.verify("WATCH-1", None).await.unwrap();

        assert_eq!(a.engine.certificate_of(&result), b.engine.certificate_of(&result));
    }

    #[tokio::test]
    async fn test_counterfeit_certificate() {
        let h = Harness::with_products(&[], EngineConfig::default());
        let result = h.engine.verify("FAKE-1", None).await.unwrap();

        let certificate = h.engine.certificate_of(&result);
        assert_eq!(certificate.status, CertificateStatus::Counterfeit);
        assert_eq!(certificate.confidence_score, 0);
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_verification_metrics_exported() {
        // Another test may have registered first.
        let _ = av_telemetry::register_metrics();
        let h = Harness::with_products(&["WATCH-1"], EngineConfig::default());

        h.engine.verify("WATCH-1", None).await.unwrap();
        h.engine.verify("WATCH-1", None).await.unwrap();

        let text = av_telemetry::encode_metrics().unwrap();
        assert!(text.contains("av_verifications_total"));
        assert!(text.contains("av_cache_hits_total"));
        assert!(av_telemetry::CACHE_HITS.get() >= 1.0);
    }
}
