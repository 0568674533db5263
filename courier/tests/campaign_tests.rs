//! Whole-campaign tests driven through the configuration file, the same way
//! the `courier` binary runs them.
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use courier::controller::SendOptions;
use pretty_assertions::assert_eq;
use support::CampaignHarness;

fn dry_run() -> SendOptions {
    SendOptions {
        dry_run: true,
        ..SendOptions::default()
    }
}

#[tokio::test]
async fn test_dry_run_sends_to_eligible_and_leaves_state_untouched() {
    let harness = CampaignHarness::builder()
        .recipient("100", "one@carrier.test")
        .recipient("200", "two@carrier.test")
        .recipient("300", "three@carrier.test")
        .already_sent("200")
        .build();

    let report = harness.courier().send(dry_run()).await.unwrap();

    assert_eq!(report.sent, vec!["100".to_string(), "300".to_string()]);
    assert_eq!(report.skipped.already_sent, 1);
    assert!(report.failures.is_empty());
    assert!(report.persisted);
    assert_eq!(report.state.len(), 3);

    assert_eq!(harness.sent_state(), vec!["200".to_string()]);
}

#[tokio::test]
async fn test_dry_run_skips_incomplete_and_undeliverable() {
    let harness = CampaignHarness::builder()
        .recipient("100", "one@carrier.test")
        .incomplete_recipient("200", "two@carrier.test")
        .recipient("300", "bounce@carrier.test")
        .undeliverable("bounce@carrier.test")
        .build();

    let report = harness.courier().send(dry_run()).await.unwrap();

    assert_eq!(report.sent, vec!["100".to_string()]);
    assert_eq!(report.skipped.undeliverable, 1);
    // The incomplete row has no documents and is dropped by the directory filter.
    assert_eq!(report.skipped.incomplete, 0);
}

#[tokio::test]
async fn test_overrides_cap_and_rotate_accounts() {
    let harness = CampaignHarness::builder()
        .login("bob@sender.test", "other-password")
        .recipient("1", "a@carrier.test")
        .recipient("2", "b@carrier.test")
        .recipient("3", "c@carrier.test")
        .build();

    let options = SendOptions {
        max_per_account: Some(1),
        ..dry_run()
    };
    let report = harness.courier().send(options).await.unwrap();

    assert_eq!(report.sent, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(report.sent_by("alice@sender.test"), 1);
    assert_eq!(report.sent_by("bob@sender.test"), 1);
    assert_eq!(report.unattempted, 1);
}

#[tokio::test]
async fn test_unknown_login_override_fails_before_sending() {
    let harness = CampaignHarness::builder()
        .recipient("1", "a@carrier.test")
        .build();

    let options = SendOptions {
        logins: vec!["nobody@sender.test".to_string()],
        ..dry_run()
    };

    assert!(harness.courier().send(options).await.is_err());
    assert!(harness.sent_state().is_empty());
}

#[tokio::test]
async fn test_check_reports_breakdown() {
    let harness = CampaignHarness::builder()
        .recipient("1", "a@carrier.test")
        .recipient("2", "b@carrier.test")
        .recipient("1", "again@carrier.test")
        .recipient("3", "bad@carrier.test")
        .already_sent("2")
        .undeliverable("bad@carrier.test")
        .build();

    let options = SendOptions {
        logins: vec![
            "alice@sender.test".to_string(),
            "ghost@sender.test".to_string(),
        ],
        ..SendOptions::default()
    };
    let report = harness.courier().check(&options).await.unwrap();

    assert_eq!(report.recipients, 4);
    assert_eq!(report.eligible, 1);
    assert_eq!(report.skipped.already_sent, 2);
    assert_eq!(report.skipped.undeliverable, 1);
    assert_eq!(report.history, 1);
    assert_eq!(report.accounts, vec!["alice@sender.test".to_string()]);
    assert_eq!(report.missing_accounts, vec!["ghost@sender.test".to_string()]);
}

#[tokio::test]
async fn test_sent_state_lists_history() {
    let harness = CampaignHarness::builder()
        .already_sent("9")
        .already_sent("4")
        .build();

    let state = harness.courier().sent_state().await.unwrap();

    assert_eq!(state.iter().collect::<Vec<_>>(), vec!["9", "4"]);
}

#[tokio::test]
async fn test_missing_sent_state_is_an_error_for_listing() {
    let harness = CampaignHarness::builder().build();
    assert!(harness.courier().sent_state().await.is_err());
}
