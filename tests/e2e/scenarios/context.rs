use crate::harness::scenario::DEFAULT_OWNER;
use crate::harness::{repo, Assertion, RecordUpdate, Scenario};
use folio_core::{ContextBudget, DirectorySource, RelevanceEngine, Tier};

#[test]
fn test_context_tiers_follow_rank() {
    Scenario::new("context_tiers")
        .from_fixture("portfolio")
        .query("Python Rust TypeScript")
        .assert_top("pipeline")
        .assert(Assertion::ShortlistLen(3))
        .assert_tiers(&[Tier::Primary, Tier::Secondary, Tier::Mentioned])
        .assert_context_contains("## ada/pipeline (primary match)")
        .assert_context_contains("Other possibly relevant projects:")
        .assert(Assertion::ContextNotContains("ada/kernel".into()))
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_long_readme_is_truncated() {
    let readme = "word ".repeat(6_000);
    Scenario::new("long_readme")
        .with_repository(
            repo(DEFAULT_OWNER, "compiler")
                .description("Toy compiler for a Lisp dialect")
                .language("Rust", 20_000)
                .tech(&["LLVM"])
                .readme(&readme)
                .files(&["src/main.rs", "src/parser.rs"])
                .build(),
        )
        .query("Rust compiler")
        .assert_top("compiler")
        .assert_context_contains("[...]")
        .assert(Assertion::ContextWithinChars(12_000))
        .run()
        .unwrap();
}

#[test]
fn test_small_budget_is_respected() {
    let budget = ContextBudget {
        max_chars: 400,
        ..ContextBudget::default()
    };
    Scenario::new("small_budget")
        .from_fixture("portfolio")
        .with_budget(budget)
        .query("Python Rust TypeScript")
        .assert(Assertion::ContextWithinChars(400))
        .assert_context_contains("## ada/pipeline")
        .assert(Assertion::Custom(Box::new(|engine: &RelevanceEngine<DirectorySource>| {
            anyhow::ensure!(engine.config().context.max_chars == 400);
            Ok(())
        })))
        .run()
        .unwrap();
}

#[test]
fn test_fallback_context_carries_note() {
    Scenario::new("fallback_note")
        .from_fixture("portfolio")
        .query("favourite hiking trails")
        .assert(Assertion::FallbackUsed(true))
        .assert_context_contains("Note: no project clearly matched")
        .assert_tiers(&[Tier::Primary, Tier::Secondary, Tier::Mentioned])
        .run()
        .unwrap();
}

#[test]
fn test_context_after_readme_update() {
    Scenario::new("readme_update_reaches_context")
        .from_fixture("portfolio")
        .query("Rust streaming pipeline")
        .assert(Assertion::ContextNotContains("Parquet sink rewritten".into()))
        .update_repository(
            "pipeline",
            RecordUpdate::Readme("# Pipeline\n\nParquet sink rewritten.".into()),
        )
        .query("Rust streaming pipeline")
        .assert_context_contains("Parquet sink rewritten")
        .run()
        .unwrap();
}
