//! End-to-end scenarios for the folio relevance engine.

mod harness;
