// State must survive a restart so a restocked item is not re-announced.

use std::sync::Arc;

use super::*;

#[tokio::test]
async fn test_state_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.sqlite3");

    {
        let store = StateStore::open(&path).await?;
        let first = store.update("target", "url:https://t/etb", "1375", StockStatus::InStock).await?;
        assert!(first.should_alert);
        store.close().await;
    }

    let store = StateStore::open(&path).await?;
    assert_eq!(store.get("target", "url:https://t/etb", "1375").await?, Some(StockStatus::InStock));

    let again = store.update("target", "url:https://t/etb", "1375", StockStatus::InStock).await?;
    assert!(!again.changed);
    assert!(!again.should_alert);
    Ok(())
}

#[tokio::test]
async fn test_restart_does_not_repeat_alert() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let item = url_item("gamestop", "Tin");
    let gamestop = ScriptedRetailer::new("gamestop", &["local-context"]);
    gamestop.set(&item, "local-context", StockStatus::InStock);

    let first_sink = Arc::new(CollectingSink::default());
    let checker = build_checker(test_config(&dir, vec![item.clone()]), vec![gamestop.clone()], first_sink.clone()).await?;
    checker.run_once().await?;
    checker.state().close().await;
    drop(checker);
    assert_eq!(first_sink.messages().len(), 1);

    let second_sink = Arc::new(CollectingSink::default());
    let checker = build_checker(test_config(&dir, vec![item]), vec![gamestop], second_sink.clone()).await?;
    checker.run_once().await?;
    assert!(second_sink.messages().is_empty());
    Ok(())
}
