use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{
    github::{GraphQl, Query, Variables},
    wakatime::{StatsOutcome, StatsRange, TimeTracking},
};

type Handler = Box<dyn Fn(Query, &Variables) -> anyhow::Result<Value> + Send + Sync>;

/// In-memory GraphQL endpoint answering from a closure and recording calls.
pub struct FakeGraphQl {
    handler: Handler,
    calls: Mutex<Vec<(Query, Variables)>>,
}

impl FakeGraphQl {
    pub fn new(
        handler: impl Fn(Query, &Variables) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Query, Variables)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, query: Query) -> Vec<Variables> {
        self.calls()
            .into_iter()
            .filter(|(q, _)| *q == query)
            .map(|(_, variables)| variables)
            .collect()
    }
}

#[async_trait]
impl GraphQl for FakeGraphQl {
    async fn query(&self, query: Query, variables: &Variables) -> anyhow::Result<Value> {
        self.calls.lock().unwrap().push((query, variables.clone()));
        (self.handler)(query, variables)
    }
}

/// Delays every answer of the wrapped fake and tracks how many queries
/// were in flight at once.
pub struct SlowGraphQl {
    delay: Duration,
    inner: FakeGraphQl,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowGraphQl {
    pub fn new(delay: Duration, inner: FakeGraphQl) -> Self {
        Self {
            delay,
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphQl for SlowGraphQl {
    async fn query(&self, query: Query, variables: &Variables) -> anyhow::Result<Value> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.query(query, variables).await
    }
}

pub struct FakeTimeTracking(pub fn() -> anyhow::Result<StatsOutcome>);

#[async_trait]
impl TimeTracking for FakeTimeTracking {
    async fn fetch_stats(&self, _range: StatsRange) -> anyhow::Result<StatsOutcome> {
        (self.0)()
    }
}
