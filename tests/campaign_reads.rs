//! Read path: campaign list loading and commit discipline.

mod common;

use alloy::primitives::U256;
use common::{backer, client_with, creator, slot, wait_until, MockWallet, MAINNET_CHAIN_ID};
use crowdfund_client::campaigns::LoadOutcome;
use crowdfund_client::config::schema::SEPOLIA_CHAIN_ID;
use crowdfund_client::contract::CampaignId;
use crowdfund_client::status::CampaignStatus;
use crowdfund_client::wallet::connector::ConnectOutcome;
use crowdfund_client::{ClientError, ErrorKind};
use std::time::Duration;

const T: u32 = 1_700_000_000;

#[tokio::test]
async fn test_connect_loads_live_campaigns_in_order() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 5, T, T + 100));
    wallet.add_cancelled();
    wallet.add_campaign(slot(backer(), 20, 0, T + 10, T + 200));
    let client = client_with(&wallet);

    client.connect().await.unwrap();

    let snapshot = client.campaigns();
    let ids: Vec<_> = snapshot.campaigns.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![CampaignId(1), CampaignId(3)]);
    assert_eq!(snapshot.account, Some(creator()));
    assert_eq!(snapshot.get(CampaignId(3)).unwrap().goal, U256::from(20));
    // count + one read per slot
    assert_eq!(wallet.call_count("eth_call"), 4);
}

#[tokio::test]
async fn test_views_derive_status_for_connected_account() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 5, T, T + 100));
    wallet.add_campaign(slot(backer(), 10, 5, T + 1_000, T + 2_000));
    let client = client_with(&wallet);
    client.connect().await.unwrap();

    let views = client.campaign_views(u64::from(T) + 50);
    assert_eq!(views.len(), 2);

    let mine = &views[0].status;
    assert_eq!(mine.status, CampaignStatus::Active);
    assert_eq!(mine.progress_percent, 50);
    assert!(mine.is_creator);
    assert!(!mine.can_cancel);

    let theirs = &views[1].status;
    assert_eq!(theirs.status, CampaignStatus::Upcoming);
    assert!(!theirs.is_creator);
    assert!(!theirs.can_cancel);

    let later = client.campaign_views(u64::from(T) + 150);
    assert_eq!(later[0].status.status, CampaignStatus::Failed);
    assert!(later[0].status.can_refund);
}

#[tokio::test]
async fn test_failed_pass_keeps_previous_list() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    wallet.add_campaign(slot(creator(), 20, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    let before = client.campaigns();

    wallet.add_campaign(slot(backer(), 30, 0, T, T + 100));
    // count and slot 1 succeed, slot 2 fails
    wallet.configure(|b| b.fail_read_in = Some(3));

    let err = client.load_campaigns().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadFailure);
    assert_eq!(client.campaigns(), before);
    assert!(!client.board().is_loading());

    assert_eq!(client.load_campaigns().await.unwrap(), LoadOutcome::Committed(3));
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_load_is_skipped() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    wallet.configure(|b| b.read_delay = Duration::from_millis(20));
    wallet.clear_calls();

    let (first, second) = tokio::join!(client.load_campaigns(), client.load_campaigns());

    assert_eq!(first.unwrap(), LoadOutcome::Committed(1));
    assert_eq!(second.unwrap(), LoadOutcome::Skipped);
    assert_eq!(wallet.call_count("eth_call"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_load_outliving_its_session_is_discarded() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    let before = client.campaigns();

    wallet.add_campaign(slot(backer(), 20, 0, T, T + 100));
    wallet.configure(|b| b.read_delay = Duration::from_millis(20));

    let (outcome, _) = tokio::join!(client.load_campaigns(), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        client.connector().disconnect();
    });

    assert_eq!(outcome.unwrap(), LoadOutcome::Stale);
    assert_eq!(client.campaigns(), before);
}

#[tokio::test]
async fn test_load_requires_session() {
    let wallet = MockWallet::new(creator());
    let client = client_with(&wallet);

    assert_eq!(client.load_campaigns().await.unwrap_err(), ClientError::NotConnected);
    assert!(wallet.calls().is_empty());
}

#[tokio::test]
async fn test_disconnect_clears_list() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    assert_eq!(client.campaigns().len(), 1);

    client.disconnect();
    assert!(client.campaigns().is_empty());
}

#[tokio::test]
async fn test_pledged_amount_read() {
    let wallet = MockWallet::new(backer());
    wallet.add_campaign(slot(creator(), 10, 0, 0, u32::MAX));
    let client = client_with(&wallet);
    client.connect().await.unwrap();

    client.pledge(CampaignId(1), "2.5").await.unwrap();

    assert_eq!(
        client.my_pledge(CampaignId(1)).await.unwrap(),
        U256::from(2_500_000_000_000_000_000u128)
    );
    assert_eq!(
        client.pledged_amount(CampaignId(1), creator()).await.unwrap(),
        U256::ZERO
    );
}

#[tokio::test(start_paused = true)]
async fn test_load_across_reconnect_reads_for_new_account() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();

    wallet.configure(|b| b.read_delay = Duration::from_millis(20));

    let (outcome, reconnect) = tokio::join!(client.load_campaigns(), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        wallet.change_accounts(vec![backer()]);
        client.connect().await
    });

    assert!(matches!(reconnect.unwrap(), ConnectOutcome::Connected(_)));
    assert_eq!(outcome.unwrap(), LoadOutcome::Committed(1));
    let snapshot = client.campaigns();
    assert_eq!(snapshot.account, Some(backer()));
    assert_eq!(snapshot.session_epoch, client.connector().session().epoch());
}

#[tokio::test]
async fn test_connect_survives_failed_first_load() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    wallet.configure(|b| b.fail_read_in = Some(1));
    let client = client_with(&wallet);

    let outcome = client.connect().await.unwrap();

    assert!(matches!(outcome, ConnectOutcome::Connected(_)));
    assert!(client.connector().session().is_connected());
    assert!(client.campaigns().is_empty());
    assert_eq!(client.load_campaigns().await.unwrap(), LoadOutcome::Committed(1));
}

#[tokio::test]
async fn test_watch_clears_list_on_wrong_chain() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    let _watch = client.watch().unwrap();
    assert_eq!(client.campaigns().len(), 1);

    wallet.change_chain(MAINNET_CHAIN_ID);

    wait_until(|| client.campaigns().is_empty()).await;
    assert!(!client.connector().session().is_connected());
}

#[tokio::test]
async fn test_watch_reloads_after_account_switch() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    let _watch = client.watch().unwrap();

    wallet.change_accounts(vec![backer()]);

    wait_until(|| client.campaigns().account == Some(backer())).await;
    let snapshot = client.campaigns();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.session_epoch, client.connector().session().epoch());
}

#[tokio::test]
async fn test_watch_reloads_after_required_chain_notification() {
    let wallet = MockWallet::new(creator());
    wallet.add_campaign(slot(creator(), 10, 0, T, T + 100));
    let client = client_with(&wallet);
    client.connect().await.unwrap();
    let _watch = client.watch().unwrap();
    let loaded_epoch = client.campaigns().session_epoch;
    wallet.clear_calls();

    wallet.change_chain(SEPOLIA_CHAIN_ID);

    wait_until(|| client.campaigns().session_epoch > loaded_epoch).await;
    assert_eq!(client.campaigns().session_epoch, client.connector().session().epoch());
    assert_eq!(wallet.call_count("wallet_switchEthereumChain"), 1);
    assert_eq!(wallet.call_count("eth_requestAccounts"), 1);
    assert_eq!(client.campaigns().len(), 1);
}
