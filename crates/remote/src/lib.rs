// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! trawl-remote: the engine's outward-facing seams.
//!
//! The [`RemoteApi`] adapter is what operation bodies call; every call
//! goes through [`Throttle`] for rate-limit protection, and the bearer
//! token it needs comes from [`Connector`]'s re-authentication chain.

mod api;
mod auth;
mod http;
mod throttle;

pub use api::{IdentityDetail, RemoteApi, RemoteError, RoleAssignment, SiteDetail, SiteEntry};
pub use auth::{AuthError, AuthFlows, AuthSession, AuthStrategy, Connector};
pub use http::{HttpAuthFlows, HttpRemote};
pub use throttle::{Throttle, ThrottleConfig};

#[cfg(any(test, feature = "test-support"))]
pub use api::fake::{FakeRemote, RemoteCall};
#[cfg(any(test, feature = "test-support"))]
pub use auth::fake::{FakeFlows, FlowAttempt};
#[cfg(any(test, feature = "test-support"))]
pub use throttle::fake::RecordingSink;
