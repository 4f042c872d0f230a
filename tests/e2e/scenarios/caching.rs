use crate::harness::{repo, Assertion, RecordUpdate, Scenario};
use folio_core::FetchFailureKind;

#[test]
fn test_second_load_hits_bundle() {
    Scenario::new("bundle_hit")
        .from_fixture("portfolio")
        .load()
        .assert_loaded(0, 5)
        .assert(Assertion::BundleHit(false))
        // 5 repositories, 5 training entries and the bundle
        .assert_cache_entries(11)
        .load()
        .assert(Assertion::BundleHit(true))
        .assert_loaded(5, 0)
        .assert(Assertion::LoadedCount(5))
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_update_refetches_only_changed_repository() {
    Scenario::new("partial_refetch")
        .from_fixture("portfolio")
        .load()
        .update_repository(
            "kernel",
            RecordUpdate::Readme("# Kernel\n\nNow with a slab allocator.".into()),
        )
        .load()
        .assert(Assertion::BundleHit(false))
        .assert_loaded(4, 1)
        .assert(Assertion::TrainingChanged(vec!["kernel".into()]))
        .load()
        .assert(Assertion::BundleHit(true))
        .run()
        .unwrap();
}

#[test]
fn test_metadata_change_keeps_training_text() {
    Scenario::new("metadata_only_change")
        .from_fixture("portfolio")
        .load()
        .wait_days(3)
        .update_repository("notes", RecordUpdate::Touch)
        .load()
        .assert_loaded(4, 1)
        .assert(Assertion::TrainingChanged(vec![]))
        .run()
        .unwrap();
}

#[test]
fn test_new_repository_joins_bundle() {
    let gateway = repo("ada", "gateway")
        .description("HTTP gateway")
        .language("Go", 4_000)
        .build();

    Scenario::new("new_repository_loaded")
        .from_fixture("portfolio")
        .load()
        .add_repository(gateway)
        .load()
        .assert_loaded(5, 1)
        .assert(Assertion::LoadedCount(6))
        .assert(Assertion::TrainingChanged(vec!["gateway".into()]))
        .assert(Assertion::CacheHasKey("repo:ada:gateway".into()))
        .run()
        .unwrap();
}

#[test]
fn test_corrupt_cached_payload_is_refetched() {
    Scenario::new("corrupt_cache_payload")
        .from_fixture("portfolio")
        .load()
        .corrupt_cached_repository("pipeline")
        .load()
        .assert(Assertion::BundleHit(false))
        .assert_loaded(4, 1)
        .assert(Assertion::LoadedCount(5))
        .load()
        .assert(Assertion::BundleHit(true))
        .run()
        .unwrap();
}

#[test]
fn test_cache_survives_restart() {
    Scenario::new("restart_persistence")
        .from_fixture("portfolio")
        .load()
        .restart()
        .load()
        .assert(Assertion::BundleHit(true))
        .assert_loaded(5, 0)
        .assert_cache_entries(11)
        .run()
        .unwrap();
}

#[test]
fn test_unreadable_record_is_reported() {
    Scenario::new("malformed_record")
        .from_fixture("portfolio")
        .corrupt_record("kernel")
        .load()
        .assert(Assertion::LoadedCount(4))
        .assert(Assertion::FetchFailed {
            name: "kernel".into(),
            kind: FetchFailureKind::Malformed,
        })
        .assert(Assertion::CacheMissingKey("repo:ada:kernel".into()))
        .assert(Assertion::CacheMissingKey("bundle:ada:all".into()))
        // Without a bundle the next load checks each repository again
        .load()
        .assert(Assertion::BundleHit(false))
        .assert_loaded(4, 0)
        .run()
        .unwrap();
}

#[test]
fn test_removed_repository_drops_out_of_ranking() {
    Scenario::new("removed_repository")
        .from_fixture("portfolio")
        .query("Python Flask")
        .assert_top("storefront")
        .remove_repository("storefront")
        .query("Python Flask")
        .assert(Assertion::FallbackUsed(true))
        .assert(Assertion::ContextNotContains("ada/storefront".into()))
        .run()
        .unwrap();
}
