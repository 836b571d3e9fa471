use std::sync::Arc;
use std::time::Duration;

use crate::guard::{GuardExit, check_session, guard_session};

use super::{NOT_IN_GROUP, SessionArgs, init_store, open_session};

/// Follows the current group until it is removed.
///
/// Other processes write to the same database file, so the store is
/// re-checked every `interval_ms` to pick up their changes.
pub async fn run_watch(args: SessionArgs, interval_ms: u64) -> anyhow::Result<()> {
    let store = Arc::new(init_store(&args.data_dir)?);
    let mut session = open_session(&args)?;

    if check_session(&*store, &mut session)?.is_none() {
        anyhow::bail!(NOT_IN_GROUP);
    }

    let poller = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
            loop {
                ticker.tick().await;
                if let Err(e) = store.refresh_watches() {
                    tracing::warn!("Failed to refresh group: {}", e);
                }
            }
        })
    };

    let exit = guard_session(&*store, &mut session, |group| {
        println!("Group: \"{}\" ({})", group.name, group.key);
    })
    .await;
    poller.abort();

    match exit? {
        GuardExit::Removed => {
            println!("The group was removed.");
            println!("Run 'homepage create' or 'homepage join' to pick another group.");
            Ok(())
        }
        GuardExit::Disconnected => anyhow::bail!("Lost connection to the database."),
    }
}
