use std::{collections::VecDeque, future::Future, time::Duration};

use shared::PositionFix;
use tokio::sync::mpsc;

use crate::error::LocationError;

/// Anything that can be asked for the device's current position.
///
/// Permission handling and provider availability stay with the implementor;
/// failures surface as [`LocationError`] and never end a session.
pub trait LocationSource: Send + 'static {
    fn current_fix(&mut self) -> impl Future<Output = Result<PositionFix, LocationError>> + Send;
}

/// Replays a fixed script of fixes and failures, one per request.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<PositionFix, LocationError>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<PositionFix, LocationError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn from_fixes(fixes: impl IntoIterator<Item = PositionFix>) -> Self {
        Self::new(fixes.into_iter().map(Ok))
    }

    /// Wait `delay` before answering each request, like a slow GPS.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LocationSource for ScriptedSource {
    async fn current_fix(&mut self) -> Result<PositionFix, LocationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(LocationError::Unavailable("script exhausted".into())))
    }
}

/// Adapts a push-based provider: each request takes the next fix from the channel.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<PositionFix>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<PositionFix>) -> Self {
        Self { receiver }
    }
}

impl LocationSource for ChannelSource {
    async fn current_fix(&mut self) -> Result<PositionFix, LocationError> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| LocationError::Unavailable("location stream closed".into()))
    }
}
