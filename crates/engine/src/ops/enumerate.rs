// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site enumeration: walk the tenant's site collections and cache one
//! record per site.

use super::{OpContext, OpError, OperationBody};
use async_trait::async_trait;
use trawl_core::{CachedEntity, SiteRecord};

pub struct EnumerateSites;

#[async_trait]
impl OperationBody for EnumerateSites {
    async fn run(&self, ctx: &OpContext) -> Result<String, OpError> {
        let key = ctx.checkpoint_key();
        let mut checkpoint = ctx.checkpoints.load(&key)?.unwrap_or_default();
        if checkpoint.cursor > 0 {
            ctx.log(format!(
                "resuming enumeration: {} sites already completed",
                checkpoint.cursor
            ));
        }

        // Listing is structural: if the tenant can't be listed there is
        // nothing to iterate, so throttle exhaustion fails the run.
        let units: Vec<String> = match &ctx.op.scope {
            Some(url) => vec![url.to_string()],
            None => {
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
            }
        };

        let total = units.len();
        let mut cached = 0usize;
        for unit in units {
            if checkpoint.is_done(&unit) {
                continue;
            }

            let remote = ctx.remote.clone();
            let bearer = ctx.bearer.clone();
            let url = unit.clone();
            let detail = ctx
                .throttle
                .call("site detail", || {
                    let remote = remote.clone();
                    let bearer = bearer.clone();
                    let url = url.clone();
                    async move { remote.site_detail(&bearer, &url).await }
                })
                .await;

            match detail {
                Ok(detail) => {
                    ctx.shared.with_data(|data| {
                        data.merge(CachedEntity::Site(SiteRecord {
                            url: detail.url,
                            title: detail.title,
                            template: detail.template,
                            storage_mb: detail.storage_mb,
                        }))
                    });
                    cached += 1;
                    ctx.log(format!("cached site {unit}"));
                }
                // Terminal for this unit only; the crawl moves on.
                Err(e) => ctx.log(format!("skipping site {unit}: {e}")),
            }

            checkpoint.record_unit(unit);
            ctx.checkpoints.save(&key, &checkpoint)?;
        }

        ctx.checkpoints.clear(&key)?;
        Ok(format!("enumerated {total} site collections ({cached} cached this run)"))
    }
}

#[cfg(test)]
#[path = "enumerate_tests.rs"]
mod tests;
