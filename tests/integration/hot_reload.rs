use fermenator::supervisor::Supervisor;

use crate::fixtures::{inline_store, one_beer_spec};

#[tokio::test]
async fn assemble_disassemble_round_trip_is_clean() {
    let supervisor = Supervisor::new(inline_store(one_beer_spec()));
    supervisor.assemble().await.expect("valid spec assembles");
    tokio::time::sleep(std::time::Duration::from_millis(80)).await;
    supervisor.disassemble().await;
    // A second disassemble (e.g. a duplicate shutdown signal) must be a
    // harmless no-op rather than a panic.
    supervisor.disassemble().await;
}

#[tokio::test]
async fn reassemble_with_a_broken_spec_is_rejected_without_panicking() {
    let supervisor = Supervisor::new(inline_store(one_beer_spec()));
    supervisor.assemble().await.expect("valid spec assembles");

    let mut broken = one_beer_spec();
    broken
        .managers
        .get_mut("mgr1")
        .unwrap()
        .config
        .as_object_mut()
        .unwrap()
        .insert("active_heating_relay".into(), serde_json::json!("no_such_relay"));

    // reassemble() reloads from the *store*, not from `broken` directly —
    // this exercises that build_graph surfaces the referential-integrity
    // error as Err rather than silently tearing down the running graph.
    // (The Inline store here is fixed at construction, so we assert the
    // validation path directly through a fresh Supervisor instead.)
    let bad_store = inline_store(broken);
    let bad_supervisor = Supervisor::new(bad_store);
    assert!(bad_supervisor.assemble().await.is_err());

    supervisor.disassemble().await;
}
