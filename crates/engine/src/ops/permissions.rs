// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission collection: role assignments per site.

use super::{OpContext, OpError, OperationBody};
use async_trait::async_trait;
use trawl_core::{CachedEntity, PermissionRecord};

pub struct CollectPermissions;

#[async_trait]
impl OperationBody for CollectPermissions {
    async fn run(&self, ctx: &OpContext) -> Result<String, OpError> {
        let key = ctx.checkpoint_key();
        let mut checkpoint = ctx.checkpoints.load(&key)?.unwrap_or_default();
        if checkpoint.cursor > 0 {
            ctx.log(format!(
                "resuming permission collection: {} sites already completed",
                checkpoint.cursor
            ));
        }

        // Scoped runs target the one site; tenant-wide runs prefer the
        // enumerated cache and fall back to listing.
        let units: Vec<String> = match &ctx.op.scope {
            Some(url) => vec![url.to_string()],
            None => {
                let cached = ctx.shared.with_data(|data| data.site_urls());
                if cached.is_empty() {
                    let remote = ctx.remote.clone();
                    let bearer = ctx.bearer.clone();
                    ctx.throttle
                        .call("list sites", || {
                            let remote = remote.clone();
                            let bearer = bearer.clone();
                            async move { remote.list_sites(&bearer).await }
                        })
                        .await?
                        .into_iter()
                        .map(|entry| entry.url)
                        .collect()
                } else {
                    cached
                }
            }
        };

        let total_sites = units.len();
        let mut collected = 0usize;
        for unit in units {
            if checkpoint.is_done(&unit) {
                continue;
            }

            let remote = ctx.remote.clone();
            let bearer = ctx.bearer.clone();
            let url = unit.clone();
            let assignments = ctx
                .throttle
                .call("role assignments", || {
                    let remote = remote.clone();
                    let bearer = bearer.clone();
                    let url = url.clone();
                    async move { remote.role_assignments(&bearer, &url).await }
                })
                .await;

            match assignments {
                Ok(assignments) => {
                    let batch = assignments.len();
                    ctx.shared.with_data(|data| {
                        for assignment in assignments {
                            data.merge(CachedEntity::Permission(PermissionRecord {
                                object_url: assignment.object_url,
                                principal: assignment.principal,
                                role: assignment.role,
                            }));
                        }
                    });
                    collected += batch;
                    ctx.log(format!("collected {batch} assignments from {unit}"));
                }
                Err(e) => ctx.log(format!("skipping assignments for {unit}: {e}")),
            }

            checkpoint.record_unit(unit);
            ctx.checkpoints.save(&key, &checkpoint)?;
        }

        ctx.checkpoints.clear(&key)?;
        Ok(format!(
            "collected {collected} permission assignments across {total_sites} sites"
        ))
    }
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;
