// bin/envsse.rs

use std::sync::Arc;

use envsse::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Hello.");
    info!("Starting up envsse v{FW_VERSION}.");

    let config = MyConfig::from_env()?;
    info!("My config:\n{config:#?}");

    // no sensor bus on this host
    warn!("Using simulated sensors.");
    let sensors: DynSensors = Box::new(SimulatedSensors::new());

    let state = MyState::new(config, sensors)?;
    let shared_state = Arc::new(state);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async move {
            info!("Entering main loop...");
            tokio::select! {
                r = poll_uptime(shared_state.clone()) => { error!("poll_uptime() ended: {r:?}"); }
                r = run_push_loop(shared_state.clone()) => { error!("run_push_loop() ended: {r:?}"); }
                r = run_api_server(shared_state.clone()) => { error!("run_api_server() ended: {r:?}"); }
            };
        });

    anyhow::bail!("main loop exited")
}

// EOF
