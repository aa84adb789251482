//! Background scheduled tasks for the application.
//!
//! This module centralizes the recurring jobs (no-show sweep over ended
//! shifts, physical expiry of stale blacklist rows). Call `spawn_all` once
//! during startup to launch them.

use crate::services::{BlacklistService, NoShowService};

/// Spawn all background tasks.
///
/// Notes
/// - The no-show sweep is idempotent: a second pass over the same instant
///   finds nothing left in ORDERED state and does no further transitions.
/// - The blacklist sweep only keeps the table tidy; reads apply the lazy
///   expiry predicate regardless of whether it has run.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(
    noshow_service: NoShowService,
    blacklist_service: BlacklistService,
    noshow_interval_secs: u64,
    blacklist_interval_secs: u64,
) {
    // 定时扫描已结束班次的未取餐订单
    {
        let svc = noshow_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.run_sweep().await {
                    Ok(report) if report.processed > 0 => {
                        log::info!(
                            "No-show sweep: {} orders processed, {} users blacklisted",
                            report.processed,
                            report.blacklisted.len()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("No-show sweep failed: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(noshow_interval_secs)).await;
            }
        });
    }

    // 黑名单到期行物理翻转（读取始终用懒判定，不依赖本任务）
    {
        let svc = blacklist_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.expire_sweep().await {
                    Ok(n) if n > 0 => log::info!("Expired blacklist entries processed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Blacklist expiry sweep failed: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(blacklist_interval_secs)).await;
            }
        });
    }
}
