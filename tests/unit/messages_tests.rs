//! Unit tests for requester-facing reply texts.

use purge_relay::models::action::{BatchResult, PurgeScope};
use purge_relay::slack::messages;

#[test]
fn every_reply_mentions_the_requester() {
    let replies = [
        messages::help("U1"),
        messages::confirm_prompt("U1", &PurgeScope::EntireCache),
        messages::too_many_uris("U1", 30),
        messages::confirmed("U1"),
        messages::not_queued("U1"),
        messages::cancelled("U1"),
        messages::denied("U1"),
        messages::result("U1", &BatchResult::Success { cleared: vec![] }),
    ];
    for reply in replies {
        assert!(reply.starts_with("<@U1> "), "missing mention: {reply}");
    }
}

#[test]
fn entire_cache_prompt_carries_traffic_warning() {
    let text = messages::confirm_prompt("U1", &PurgeScope::EntireCache);
    assert!(text.contains("entire cache"));
    assert!(text.contains("*Warning*"));
}

#[test]
fn list_prompt_renders_one_code_span_per_uri() {
    let scope = PurgeScope::UriList(vec!["http://a.com/x".into(), "http://b.com/y".into()]);
    let text = messages::confirm_prompt("U1", &scope);
    assert!(text.ends_with("are you sure?\n`http://a.com/x`\n`http://b.com/y`"));
}

#[test]
fn too_many_uris_names_the_limit() {
    assert!(messages::too_many_uris("U1", 30).contains("30 URIs or fewer"));
}

#[test]
fn results_distinguish_scope_and_failure() {
    let everything = messages::result("U1", &BatchResult::Success { cleared: vec![] });
    assert!(everything.contains("the entire cache has been cleared"));

    let listed = messages::result(
        "U1",
        &BatchResult::Success {
            cleared: vec!["http://a.com/x".into()],
        },
    );
    assert!(listed.ends_with("have been cleared:\n`http://a.com/x`"));

    let failed = messages::result(
        "U1",
        &BatchResult::Failure {
            error: "timeout: purge files did not complete within 30s".into(),
        },
    );
    assert!(failed.contains("Sorry, that didn't work..."));
    assert!(failed.ends_with("*Error*: timeout: purge files did not complete within 30s"));
}
