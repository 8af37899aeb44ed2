use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use restock_watcher::ItemScheduler;
use super::*;

#[tokio::test]
async fn test_scheduler_runs_each_item_independently() -> anyhow::Result<()> {
    let a = url_item("target", "A");
    let b = url_item("target", "B");
    let target = ScriptedRetailer::new("target", &["1375"]);
    target.set(&a, "1375", StockStatus::OutOfStock);
    target.set(&b, "1375", StockStatus::InStock);

    let env = TestEnv::with_items(vec![target], vec![a.clone(), b.clone()]).await?;
    let checker = Arc::new(env.checker);
    let mut scheduler = ItemScheduler::new(checker.clone(), checker.watchlist().to_vec(), Duration::from_secs(180));

    let start = Instant::now();
    assert_eq!(scheduler.tick(start).await, 2);
    assert_eq!(scheduler.tick(start + Duration::from_secs(60)).await, 0);

    // Each single-item run replaces the snapshot with that item's records.
    let snapshot = SnapshotWriter::new(&checker.config().status_json).read().await?;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].label, "B");

    let rows = checker.state().dump().await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(env.sink.messages().len(), 1);

    let stats = scheduler.stats();
    assert_eq!(stats.completed_runs, 2);
    assert_eq!(stats.failed_runs, 0);
    Ok(())
}
