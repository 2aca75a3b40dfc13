//! Bounded concurrent patching for the housekeeping commands.

use std::sync::Arc;

use dayblock_core::{ApplyReport, PlannedPatch};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::client::NotionClient;
use crate::error::NotionError;

pub const DEFAULT_CONCURRENCY: usize = 8;

type PatchResult = (PlannedPatch, Result<(), NotionError>);

/// Fan the plans out with at most `concurrency` requests in flight and wait
/// for all of them. Each patch is sent once; failures are counted.
pub async fn patch_all(client: Arc<NotionClient>, plans: Vec<PlannedPatch>, concurrency: usize) -> ApplyReport {
    let concurrency = concurrency.max(1);
    let mut report = ApplyReport::default();
    let mut in_flight: JoinSet<PatchResult> = JoinSet::new();

    for plan in plans {
        let client = Arc::clone(&client);
        in_flight.spawn(async move {
            let result = client.patch(&plan.task_id, &plan.patch).await;
            (plan, result)
        });

        if in_flight.len() >= concurrency {
            collect_one(&mut in_flight, &mut report).await;
        }
    }

    while !in_flight.is_empty() {
        collect_one(&mut in_flight, &mut report).await;
    }

    report
}

async fn collect_one(in_flight: &mut JoinSet<PatchResult>, report: &mut ApplyReport) {
    let Some(joined) = in_flight.join_next().await else {
        return;
    };
    match joined {
        Ok((plan, Ok(()))) => {
            info!(task = %plan.task_name, patch = %plan.patch.describe(), "updated");
            report.applied += 1;
        }
        Ok((plan, Err(e))) => {
            error!(task = %plan.task_name, error = %e, "update failed");
            report.failed += 1;
        }
        Err(e) => {
            error!(error = %NotionError::from(e), "patch worker failed");
            report.failed += 1;
        }
    }
}
