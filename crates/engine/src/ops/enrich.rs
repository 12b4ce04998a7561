// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity enrichment: resolve collected principals into full records.

use super::{OpContext, OpError, OperationBody};
use async_trait::async_trait;
use trawl_core::{CachedEntity, IdentityRecord};

pub struct EnrichIdentities;

#[async_trait]
impl OperationBody for EnrichIdentities {
    async fn run(&self, ctx: &OpContext) -> Result<String, OpError> {
        let key = ctx.checkpoint_key();
        let mut checkpoint = ctx.checkpoints.load(&key)?.unwrap_or_default();
        if checkpoint.cursor > 0 {
            ctx.log(format!(
                "resuming enrichment: {} principals already completed",
                checkpoint.cursor
            ));
        }

        let principals = ctx.shared.with_data(|data| data.principals());
        if principals.is_empty() {
            ctx.log("no principals collected yet; nothing to enrich");
            ctx.checkpoints.clear(&key)?;
            return Ok("enriched 0 identities".to_string());
        }

        let mut enriched = 0usize;
        for login in principals {
            if checkpoint.is_done(&login) {
                continue;
            }

            let remote = ctx.remote.clone();
            let bearer = ctx.bearer.clone();
            let principal = login.clone();
            let identity = ctx
                .throttle
                .call("identity", || {
                    let remote = remote.clone();
                    let bearer = bearer.clone();
                    let principal = principal.clone();
                    async move { remote.identity(&bearer, &principal).await }
                })
                .await;

            match identity {
                Ok(identity) => {
                    ctx.shared.with_data(|data| {
                        data.merge(CachedEntity::Identity(IdentityRecord {
                            login: identity.login,
                            display_name: identity.display_name,
                            email: identity.email,
                            source: identity.source,
                        }))
                    });
                    enriched += 1;
                }
                Err(e) => ctx.log(format!("skipping identity {login}: {e}")),
            }

            checkpoint.record_unit(login);
            ctx.checkpoints.save(&key, &checkpoint)?;
        }

        ctx.checkpoints.clear(&key)?;
        Ok(format!("enriched {enriched} identities"))
    }
}

#[cfg(test)]
#[path = "enrich_tests.rs"]
mod tests;
