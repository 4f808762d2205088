//! services/api/src/adapters/clock.rs
//!
//! Wall-clock adapter for the `Clock` port, backed by the tokio timer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use protein_designer_core::ports::Clock;
use std::time::Duration;

/// An adapter that implements the `Clock` port with `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
