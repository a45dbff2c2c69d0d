//! Nakama command-line client
//!
//! Logs in with a device id, prints the account, and with `--realtime` joins a
//! chat room and stays there printing traffic until interrupted.

mod args;
mod logging;
mod shutdown;

use anyhow::Result;
use args::Args;
use clap::Parser;
use nakama_client::types::realtime::{ChannelType, DisconnectInfo};
use nakama_client::types::{Account, ChannelMessage, NotificationList};
use nakama_client::{Client, ClientConfig, NakamaError, RtClient, RtClientListener, RtError, Session};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{error, info, warn};

/// Progress reported by callbacks back into the main loop.
#[derive(Debug)]
enum Step {
    Authenticated(Session),
    Account(Account),
    Connected,
    Joined(String),
    Sent(String),
    Failed(String),
    Closed,
}

/// Prints server-pushed traffic.
struct ChatPrinter {
    steps: UnboundedSender<Step>,
}

impl RtClientListener for ChatPrinter {
    fn on_disconnect(&mut self, info: DisconnectInfo) {
        warn!("🔌 Socket closed: {} {} (remote: {})", info.code, info.reason, info.remote);
        let _ = self.steps.send(Step::Closed);
    }

    fn on_error(&mut self, error: RtError) {
        error!("❌ {}", error);
    }

    fn on_channel_message(&mut self, message: ChannelMessage) {
        info!("💬 [{}] {}: {}", message.channel_id, message.username, message.content);
    }

    fn on_notifications(&mut self, notifications: NotificationList) {
        for notification in notifications.notifications {
            info!("🔔 {}: {}", notification.subject, notification.content);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let startup_start = Instant::now();
    let args = Args::parse();

    let logging_ready = if args.json_logs {
        logging::setup_logging_with_format(&args, true)
    } else {
        logging::setup_logging(&args)
    };
    if let Err(e) = logging_ready {
        eprintln!("Failed to initialize logging: {e}");
        return Err(anyhow::anyhow!("Failed to initialize logging: {}", e));
    }

    info!("Starting Nakama client {}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::load_from_file(&args.config)
        .await
        .and_then(ClientConfig::apply_env)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", args.config.display(), e))?;
    info!("Configuration loaded from: {}", args.config.display());

    let runtime = tokio::runtime::Handle::current();
    let mut client = Client::with_reqwest(config.clone(), runtime.clone())?;
    let mut rt_client = if args.realtime {
        Some(RtClient::with_websocket(config.clone(), runtime)?)
    } else {
        None
    };

    let (steps, mut step_rx) = unbounded_channel();
    let device_id = args.device_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!("Authenticating device {}", device_id);
    client.authenticate_device(
        &device_id,
        args.username.as_deref(),
        true,
        &HashMap::new(),
        Some(reporter(&steps, Step::Authenticated)),
        Some(http_failure(&steps)),
    );

    let mut shutdown_receiver = shutdown::setup_shutdown_handler();
    let mut ticker = tokio::time::interval(config.tick_interval());
    info!("Startup complete in {:.2?}", startup_start.elapsed());

    let mut exit = Ok(());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                client.tick();
                if let Some(rt) = rt_client.as_mut() {
                    rt.tick();
                }
            }
            Some(step) = step_rx.recv() => {
                match handle_step(step, &args, &mut client, rt_client.as_mut(), &steps) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        exit = Err(e);
                        break;
                    }
                }
            }
            _ = &mut shutdown_receiver => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Some(rt) = rt_client.as_mut() {
        rt.disconnect();
    }
    client.disconnect();
    exit
}

/// Advances the flow by one step. Returns `Ok(false)` when there is nothing
/// left to do.
fn handle_step(
    step: Step,
    args: &Args,
    client: &mut Client,
    rt_client: Option<&mut RtClient>,
    steps: &UnboundedSender<Step>,
) -> Result<bool> {
    match step {
        Step::Authenticated(session) => {
            info!(
                "✅ Logged in as {} ({}){}",
                session.username(),
                session.user_id(),
                if session.is_created() { ", new account" } else { "" }
            );
            client.get_account(&session, Some(reporter(steps, Step::Account)), Some(http_failure(steps)));
            if let Some(rt) = rt_client {
                rt.set_listener(Some(Box::new(ChatPrinter { steps: steps.clone() })));
                let connected = steps.clone();
                rt.connect(
                    &session,
                    true,
                    Some(Box::new(move |()| {
                        let _ = connected.send(Step::Connected);
                    })),
                    Some(rt_failure(steps)),
                );
            }
            Ok(true)
        }
        Step::Account(account) => {
            info!("👤 {} wallet={} devices={}", account.user.username, account.wallet, account.devices.len());
            Ok(args.realtime)
        }
        Step::Connected => {
            if let Some(rt) = rt_client {
                let joined = steps.clone();
                rt.join_chat(
                    &args.room,
                    ChannelType::Room,
                    Some(false),
                    Some(false),
                    Some(Box::new(move |channel| {
                        let _ = joined.send(Step::Joined(channel.id));
                    })),
                    Some(rt_failure(steps)),
                );
            }
            Ok(true)
        }
        Step::Joined(channel_id) => {
            info!("✅ Joined {} as {}", args.room, channel_id);
            if let (Some(rt), Some(message)) = (rt_client, args.message.as_deref()) {
                let sent = steps.clone();
                rt.write_chat_message(
                    &channel_id,
                    message,
                    Some(Box::new(move |ack| {
                        let _ = sent.send(Step::Sent(ack.message_id));
                    })),
                    Some(rt_failure(steps)),
                );
            }
            Ok(true)
        }
        Step::Sent(message_id) => {
            info!("📝 Message {} delivered", message_id);
            Ok(true)
        }
        Step::Failed(reason) => Err(anyhow::anyhow!(reason)),
        Step::Closed => Ok(false),
    }
}

fn reporter<T: 'static>(steps: &UnboundedSender<Step>, wrap: fn(T) -> Step) -> nakama_client::Callback<T> {
    let steps = steps.clone();
    Box::new(move |value| {
        let _ = steps.send(wrap(value));
    })
}

fn http_failure(steps: &UnboundedSender<Step>) -> nakama_client::ErrorCallback {
    let steps = steps.clone();
    Box::new(move |error: NakamaError| {
        let _ = steps.send(Step::Failed(error.to_string()));
    })
}

fn rt_failure(steps: &UnboundedSender<Step>) -> nakama_client::RtErrorCallback {
    let steps = steps.clone();
    Box::new(move |error: RtError| {
        let _ = steps.send(Step::Failed(error.to_string()));
    })
}
