//! CLI for edge-filter
//!
//! Subcommands:
//! - `server`: run the edge hub with the temperature filter attached
//! - `simulate`: send telemetry to a running hub and print what comes back

use std::sync::{Arc, Mutex};

use clap::Parser;
use edge_filter::config::{Settings, load_config};
use edge_filter::filter::message::MessageBody;
use edge_filter::filter::{FilterEngine, ThresholdConfig};
use edge_filter::transport::hub::{Hub, HubPublisher, lock};
use edge_filter::transport::message::{ClientFrame, ServerFrame};
use edge_filter::transport::start_websocket_server;
use edge_filter::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "edge-filter")]
enum Command {
    /// Start the edge hub with the filter subscribed to its input route
    Server,
    /// Send simulated machine telemetry to a running hub
    Simulate {
        /// WebSocket URL of the hub (default: ws://127.0.0.1:8080)
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        /// Machine temperature to report
        #[arg(long)]
        temperature: f64,
        /// Number of messages to send
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            return;
        }
    };
    logging::init(&settings.logging.level);

    match cmd {
        Command::Server => {
            if let Err(e) = run_server(settings).await {
                error!("Server failed: {e}");
            }
        }
        Command::Simulate {
            url,
            temperature,
            count,
        } => {
            if let Err(e) = run_simulation(&url, &settings, temperature, count).await {
                error!("Simulation failed: {e}");
            }
        }
    }
}

async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let threshold = Arc::new(ThresholdConfig::new(settings.filter.temperature_threshold));
    let hub = Arc::new(Mutex::new(Hub::new()));
    let publisher = Arc::new(HubPublisher::new(hub.clone()));
    let engine = Arc::new(FilterEngine::new(
        threshold,
        publisher,
        &settings.filter.output_route,
    ));

    {
        let mut hub = lock(&hub);
        hub.subscribe_input(&settings.filter.input_route, engine.clone());
        hub.subscribe_config(engine.clone());
    }
    info!(
        "Filtering '{}' -> '{}' above {}",
        settings.filter.input_route,
        settings.filter.output_route,
        engine.threshold().get()
    );

    tokio::select! {
        result = start_websocket_server(settings.server_addr(), hub, settings.filter.max_in_flight) => {
            result?;
            error!("Edge hub exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received after {} message(s). Exiting gracefully.", engine.processed());
        }
    }

    Ok(())
}

async fn run_simulation(
    url: &str,
    settings: &Settings,
    temperature: f64,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    use edge_filter::filter::message::{Ambient, Machine};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    let subscribe = ClientFrame::Subscribe {
        route: settings.filter.output_route.clone(),
    };
    ws_stream
        .send(WsMessage::Text(serde_json::to_string(&subscribe)?.into()))
        .await?;

    for n in 0..count {
        let body = MessageBody {
            machine: Machine {
                temperature,
                pressure: Some(1.0),
            },
            ambient: Some(Ambient {
                temperature: Some(21.0),
                humidity: Some(25.0),
            }),
            time_created: Some(chrono::Utc::now().to_rfc3339()),
        };
        let send = ClientFrame::Send {
            route: settings.filter.input_route.clone(),
            payload: String::from_utf8(body.to_payload()?)?,
            properties: Default::default(),
            message_id: Some(format!("simulated-{n}")),
        };
        ws_stream
            .send(WsMessage::Text(serde_json::to_string(&send)?.into()))
            .await?;
    }

    let mut acks = 0;
    while acks < count {
        let Some(frame) = ws_stream.next().await else {
            break;
        };
        if let WsMessage::Text(text) = frame? {
            match serde_json::from_str::<ServerFrame>(&text)? {
                ServerFrame::Ack {
                    message_id,
                    outcome,
                } => {
                    acks += 1;
                    println!("Ack {message_id}: {outcome:?}");
                }
                ServerFrame::Message {
                    route, properties, ..
                } => println!("Alert on {route}: {properties:?}"),
                ServerFrame::Error { message } => println!("Hub error: {message}"),
            }
        }
    }

    Ok(())
}
