//! Request lifecycle controller.
//!
//! Turns UI commands into backend requests and emits events for presentation layers.

use crate::client::TrackingClient;
use crate::error::RequestFailure;
use crate::model::{InfoEvent, TrackEvent, TrackingSnapshot};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Register (when an item name is given) and then fetch.
    Submit {
        tracking_number: String,
        item_name: Option<String>,
    },
    /// Fetch the most recently submitted tracking number again.
    Refresh,
    Quit,
}

/// Register `tracking_number` if `item_name` is set, then fetch its snapshot.
pub(crate) async fn lookup(
    client: &TrackingClient,
    tracking_number: &str,
    item_name: Option<&str>,
    event_tx: Option<&UnboundedSender<TrackEvent>>,
) -> Result<TrackingSnapshot, RequestFailure> {
    let emit = |ev: TrackEvent| {
        if let Some(tx) = event_tx {
            let _ = tx.send(ev);
        }
    };

    if let Some(item_name) = item_name {
        emit(TrackEvent::Info(InfoEvent::Registering {
            tracking_number: tracking_number.to_string(),
        }));
        let ack = client.register(tracking_number, item_name).await?;
        tracing::info!(tracking_number, ack = %ack.0, "registered");
        emit(TrackEvent::Registered {
            tracking_number: tracking_number.to_string(),
        });
    }

    emit(TrackEvent::Info(InfoEvent::Fetching {
        tracking_number: tracking_number.to_string(),
    }));
    client.fetch(tracking_number).await
}

fn spawn_lookup(
    requests: &mut JoinSet<()>,
    client: &TrackingClient,
    tracking_number: String,
    item_name: Option<String>,
    event_tx: &UnboundedSender<TrackEvent>,
) {
    let client = client.clone();
    let event_tx = event_tx.clone();
    requests.spawn(async move {
        let res = lookup(&client, &tracking_number, item_name.as_deref(), Some(&event_tx)).await;
        let ev = match res {
            Ok(snapshot) => TrackEvent::Snapshot(Box::new(snapshot)),
            Err(e) => {
                tracing::warn!(tracking_number = %tracking_number, status = ?e.status(), error = %e, "request failed");
                TrackEvent::RequestFailed(e.to_string())
            }
        };
        let _ = event_tx.send(ev);
    });
}

/// Serve UI commands until `Quit` or until the command channel closes.
///
/// Every submission gets its own task. Responses are reported in completion
/// order; a slow earlier request can land after a later one.
pub(crate) async fn run_controller(
    client: TrackingClient,
    event_tx: UnboundedSender<TrackEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut requests = JoinSet::new();
    let mut last_tracking_number: Option<String> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit { tracking_number, item_name }) => {
                        let tracking_number = tracking_number.trim().to_string();
                        let item_name = item_name.filter(|n| !n.trim().is_empty());
                        last_tracking_number = Some(tracking_number.clone());
                        spawn_lookup(&mut requests, &client, tracking_number, item_name, &event_tx);
                    }
                    Some(UiCommand::Refresh) => match last_tracking_number.clone() {
                        Some(tracking_number) => {
                            spawn_lookup(&mut requests, &client, tracking_number, None, &event_tx);
                        }
                        None => {
                            let _ = event_tx.send(TrackEvent::Info(InfoEvent::Message(
                                "Nothing to refresh yet".into(),
                            )));
                        }
                    },
                    Some(UiCommand::Quit) | None => break,
                }
            }
            Some(joined) = requests.join_next(), if !requests.is_empty() => {
                if let Err(e) = joined {
                    let _ = event_tx.send(TrackEvent::RequestFailed(format!("request task failed: {e}")));
                }
            }
        }
    }

    requests.abort_all();
    Ok(())
}
