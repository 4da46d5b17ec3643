// poll.rs

use tokio::time::{interval, MissedTickBehavior};

use crate::*;

/// One scheduler step against the shared state.
///
/// Takes the registry first, then the sensors; nothing else holds both.
/// The clock is read once the registry is ours, so a wait on the lock never yields a stale `now`.
pub async fn push_once(state: &MyState, scheduler: &mut PushScheduler) -> Option<CycleReport> {
    let mut channels = state.channels.lock().await;
    let now = Instant::now();
    if !scheduler.schedule().is_due(now) {
        return None;
    }
    let mut sensors = state.sensors.lock().await;
    scheduler.tick(now, &mut channels, &mut **sensors)
}

/// Drives the push cycles. Wakes up once per poll quantum and never waits on a client.
pub async fn run_push_loop(state: Arc<MyState>) -> anyhow::Result<()> {
    let mut scheduler = PushScheduler::new(Instant::now(), state.config.push_interval());
    let mut ticker = interval(state.config.poll_quantum());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Push loop running: interval {} ms, poll quantum {} ms",
        state.config.push_interval_ms, state.config.poll_ms
    );
    loop {
        ticker.tick().await;
        if let Some(report) = push_once(&state, &mut scheduler).await {
            if report.dropped > 0 {
                let live = state.channels.lock().await.subscribed();
                info!("{} subscriber(s) gone, {live} still connected", report.dropped);
            }
        }
    }
}

pub async fn poll_uptime(state: Arc<MyState>) -> anyhow::Result<()> {
    loop {
        sleep(Duration::from_secs(2)).await;
        state
            .uptime
            .store(state.started.elapsed().as_secs(), Ordering::Relaxed);
    }
}


// EOF
