//! Account Server process entry point (`§2`, `§5`).
//!
//! Two cooperating tasks sharing one [`AppState`]: the link task reads
//! frames off the serial transport and dispatches them to completion
//! before reading the next one (`§5`'s "receive one, dispatch, reply,
//! then the next"); the operator console reads stdin concurrently. Both
//! share the store's own interior locking plus `AppState::save`'s guard,
//! so a `Q` snapshot and an operator `quit` snapshot never interleave.

use std::sync::Arc;

use atm_protocol::{FrameTransport, Request, Response, SerialTransport};
use atm_server::config::{AsArgs, AsConfig};
use atm_server::operator;
use atm_server::state::AppState;
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_env("ATM_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let args = AsArgs::parse();
    let config = AsConfig::resolve(args)?;

    let state = Arc::new(AppState::load(config.data_dir.clone())?);

    let operator_state = state.clone();
    let admin_password = config.admin_password.clone();
    let operator_task = tokio::spawn(async move {
        operator::run(operator_state, admin_password).await;
    });

    let link_task = tokio::spawn(run_link(state.clone(), config.serial_port.clone()));

    let _ = tokio::join!(operator_task, link_task);
    Ok(())
}

async fn run_link(state: Arc<AppState>, port: String) {
    let mut transport = match SerialTransport::open(&port) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, port, "could not open serial port, link task idle");
            return;
        }
    };

    info!(port, "link task ready");
    loop {
        match transport.receive().await {
            Ok(Some(frame)) => {
                if let Some(initiator) = atm_protocol::linecheck::recognize_lineok(&frame) {
                    if let Err(e) = atm_protocol::linecheck::echo(&mut transport, initiator).await {
                        warn!(error = %e, "failed to echo line check");
                    }
                    continue;
                }

                match Request::parse(&frame) {
                    Ok(Request::Quit) => {
                        state.save().await;
                    }
                    Ok(request) => {
                        if let Some(response) = state.dispatcher.dispatch(request).await {
                            if let Err(e) = transmit(&mut transport, &response).await {
                                warn!(error = %e, "failed to transmit response");
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "discarding malformed request frame"),
                }
            }
            Ok(None) => {
                info!("link closed");
                return;
            }
            Err(e) => {
                warn!(error = %e, "transport error, link task stopping");
                return;
            }
        }
    }
}

async fn transmit(transport: &mut SerialTransport, response: &Response) -> atm_protocol::Result<()> {
    transport.transmit_line(&response.encode()).await
}
