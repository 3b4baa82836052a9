//! End-to-end chat scenarios: request, confirmation, batch execution, and
//! result reporting through the full dispatcher and drain loop.

use std::time::Duration;

use super::test_helpers::{Harness, PurgeBehaviour, PurgeCall, ALICE, BOB, MALLORY, TICK, ZONE_ID};

#[tokio::test(start_paused = true)]
async fn listed_uris_are_confirmed_purged_and_reported() {
    let h = Harness::start(PurgeBehaviour::Succeed);

    h.say(ALICE, "clear cache http://a.com/x http://b.com/y").await;
    let prompt = h.notifier.texts().pop().expect("confirmation prompt");
    assert!(prompt.contains("`http://a.com/x`"));
    assert!(prompt.contains("`http://b.com/y`"));

    h.say(ALICE, "yes").await;
    tokio::time::sleep(TICK + Duration::from_secs(1)).await;

    assert_eq!(
        h.api.calls(),
        vec![PurgeCall::Files {
            zone_id: ZONE_ID.into(),
            uris: vec!["http://a.com/x".into(), "http://b.com/y".into()],
        }]
    );
    let texts = h.notifier.texts();
    assert_eq!(texts.len(), 3, "prompt, acknowledgement, result");
    assert!(texts[2].contains("the following items have been cleared"));
    assert!(texts[2].contains("`http://a.com/x`\n`http://b.com/y`"));
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn entire_cache_request_can_be_cancelled() {
    let h = Harness::start(PurgeBehaviour::Succeed);

    h.say(ALICE, "clear cache").await;
    assert!(h.notifier.texts()[0].contains("*Warning*"));

    h.say(ALICE, "no").await;
    tokio::time::sleep(TICK * 2).await;

    assert!(h.store.get(ALICE).await.is_none());
    assert!(h.api.calls().is_empty());
    let texts = h.notifier.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("I'll cancel that"));
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn disallowed_user_triggers_no_state_or_queue_activity() {
    let h = Harness::start(PurgeBehaviour::Succeed);

    h.say(MALLORY, "clear cache http://a.com/x").await;
    h.say(MALLORY, "yes").await;
    tokio::time::sleep(TICK * 2).await;

    assert_eq!(h.notifier.texts().len(), 2, "one denial per message");
    assert!(h.store.is_empty().await);
    assert!(h.api.calls().is_empty());
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn two_users_confirming_together_share_one_batch() {
    let h = Harness::start(PurgeBehaviour::Succeed);

    h.say(ALICE, "clear cache http://a.com/x").await;
    h.say(BOB, "clear cache").await;
    h.say(BOB, "yes").await;
    h.say(ALICE, "yes").await;
    tokio::time::sleep(TICK + Duration::from_secs(1)).await;

    assert_eq!(
        h.api.calls(),
        vec![
            PurgeCall::Everything {
                zone_id: ZONE_ID.into()
            },
            PurgeCall::Files {
                zone_id: ZONE_ID.into(),
                uris: vec!["http://a.com/x".into()],
            },
        ],
        "executed in confirmation order"
    );
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_purge_is_reported_to_requester() {
    let h = Harness::start(PurgeBehaviour::Fail("Authentication error (10000)".into()));

    h.say(ALICE, "clear cache").await;
    h.say(ALICE, "yes").await;
    tokio::time::sleep(TICK + Duration::from_secs(1)).await;

    let posts = h.notifier.posts();
    let (channel, text) = posts.last().expect("result posted");
    assert_eq!(channel, super::test_helpers::OPS_CHANNEL);
    assert!(text.starts_with("<@U_ALICE> Sorry, that didn't work..."));
    assert!(text.contains("*Error*: purge: Authentication error (10000)"));
    h.shutdown().await;
}
