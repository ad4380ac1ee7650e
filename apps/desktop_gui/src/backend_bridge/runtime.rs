//! Backend worker: a dedicated thread with a tokio runtime draining the UI
//! command queue against `client_core` and pushing results back as events.

use std::thread;

use client_core::ProposalClient;
use crossbeam_channel::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn spawn_backend_thread(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            let mut client: Option<ProposalClient> = None;
            let mut event_task: Option<JoinHandle<()>> = None;

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Connect { server_url } => {
                        let connected = ProposalClient::new(&server_url);
                        match connected.fetch_pricing().await {
                            Ok(pricing) => {
                                let _ = ui_tx.try_send(UiEvent::Connected { pricing });
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Connect,
                                    err.to_string(),
                                )));
                                continue;
                            }
                        }

                        if let Some(task) = event_task.take() {
                            task.abort();
                        }
                        event_task = Some(spawn_event_watch(connected.clone(), ui_tx.clone()));
                        client = Some(connected);
                    }
                    BackendCommand::CreateProposal { request } => {
                        let Some(client) = client.as_ref() else {
                            report_disconnected(&ui_tx, UiErrorContext::CreateProposal);
                            continue;
                        };
                        match client.create_proposal(&request).await {
                            Ok(record) => {
                                let _ = ui_tx.try_send(UiEvent::ProposalCreated(record));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::CreateProposal,
                                    err.to_string(),
                                )));
                            }
                        }
                    }
                    BackendCommand::FetchProposal { proposal_id } => {
                        let Some(client) = client.as_ref() else {
                            report_disconnected(&ui_tx, UiErrorContext::LoadProposal);
                            continue;
                        };
                        match client.fetch_proposal(&proposal_id).await {
                            Ok(record) => {
                                let _ = ui_tx.try_send(UiEvent::ProposalLoaded(record));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::LoadProposal,
                                    err.to_string(),
                                )));
                            }
                        }
                    }
                    BackendCommand::AnswerProposal {
                        proposal_id,
                        accepted,
                    } => {
                        let Some(client) = client.as_ref() else {
                            report_disconnected(&ui_tx, UiErrorContext::Answer);
                            continue;
                        };
                        match client.answer_proposal(&proposal_id, accepted).await {
                            Ok(record) => {
                                let _ = ui_tx.try_send(UiEvent::AnswerRecorded(record));
                            }
                            Err(err) => {
                                // The card has already moved on; surface the
                                // failure in the status line only.
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Answer,
                                    err.to_string(),
                                )));
                            }
                        }
                    }
                }
            }

            if let Some(task) = event_task.take() {
                task.abort();
            }
        });
    });
}

fn spawn_event_watch(client: ProposalClient, ui_tx: Sender<UiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut subscription = match client.subscribe_events().await {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::warn!(%err, "live answer watch unavailable");
                return;
            }
        };
        while let Some(event) = subscription.next_event().await {
            if ui_tx.try_send(UiEvent::Server(event)).is_err() {
                break;
            }
        }
    })
}

fn report_disconnected(ui_tx: &Sender<UiEvent>, context: UiErrorContext) {
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
        context,
        "not connected to a proposal server",
    )));
}
