use env_logger::Env;
use failure::Error;
use log::{error, info};
use parking_dashboard::client::{Endpoint, StatusClient};
use parking_dashboard::config::{Config, View};
use parking_dashboard::state::AppState;
use parking_dashboard::{page, poller, push, view};
use std::process;
use tokio::sync::mpsc::channel;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting parking-dashboard");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = run(config).await {
        error!("Dashboard failed: {}", e);
        process::exit(1);
    }
    info!("Exiting main");
}

async fn run(config: Config) -> Result<(), Error> {
    let client = StatusClient::new(config.base_url()?, config.http_timeout)?;
    let (document, endpoint, period) = match config.view {
        View::Dashboard => (page::dashboard(), Endpoint::Dashboard, config.dashboard_poll),
        View::Parking => (
            page::parking(config.parking_spots),
            Endpoint::SpotMap,
            config.spot_poll,
        ),
    };
    info!("Rendering {:?} view from {}", config.view, config.host);

    let (tx, rx) = channel(8);
    let view_task = tokio::spawn(view::run(AppState::new(document), rx, config.highlight));
    let _poller = poller::spawn(client, endpoint, period, tx.clone());
    let push_task = if config.view == View::Dashboard && config.push_enabled {
        Some(tokio::spawn(push::run(
            config.live_url()?,
            config.push_reconnect,
            tx.clone(),
        )))
    } else {
        None
    };
    drop(tx);

    let push_done = async move {
        match push_task {
            Some(task) => task.await,
            None => futures::future::pending().await,
        }
    };
    tokio::select! {
        result = view_task => {
            match result {
                Ok(state) => info!("View stopped with snapshot {:?}", state.snapshot()),
                Err(e) => error!("View task failed: {}", e),
            }
        }
        result = push_done => {
            if let Err(e) = result {
                error!("Live channel task failed: {}", e);
            }
        }
    }
    Ok(())
}
