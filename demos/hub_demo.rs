//! In-process hub demo
//!
//! Run with: cargo run --example hub_demo
//!
//! A delivery client logs into the "orders" group of a hub. One viewer watches
//! live; a second viewer joins late and catches up from the replay buffer,
//! starting after the last id it claims to have seen.

use std::sync::Arc;
use std::time::Duration;

use loghub::client::{ClientConfig, DeliveryClient, HubDirectory, LocalConnector};
use loghub::entry::{EventData, LevelRegistry, LevelToken, LogLocation, SimpleEvent};
use loghub::hub::{BroadcastHub, HubMessage};
use loghub::HubConfig;

const HUB_URL: &str = "local://hub";
const GROUP: &str = "orders";

fn print_message(viewer: &str, message: &HubMessage) {
    match message {
        HubMessage::Initialize { loggers, entries } => {
            println!(
                "[{}] initialize: loggers={:?} backlog={:?}",
                viewer,
                loggers,
                entries.iter().map(|e| e.id).collect::<Vec<_>>()
            );
        }
        HubMessage::LoggedEvent(entry) => {
            println!("[{}] #{} {}", viewer, entry.id, entry.formatted_event);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("loghub=debug".parse()?)
                .add_directive("hub_demo=debug".parse()?),
        )
        .init();

    let hub = Arc::new(BroadcastHub::with_config(
        HubConfig::default().maximum_cached_entries(5),
    ));
    let directory = HubDirectory::new();
    directory.bind(HUB_URL, Arc::clone(&hub));

    // Live viewer
    let (live, mut live_rx) = hub.connect();
    live.subscribe_to_group(GROUP).await;
    let live_task = tokio::spawn(async move {
        while let Some(message) = live_rx.recv().await {
            print_message("live", &message);
        }
    });

    // Producer
    let levels = LevelRegistry::new();
    let client = DeliveryClient::new(
        ClientConfig::new(HUB_URL).group(GROUP),
        LocalConnector::new(directory),
    );

    for order in 1..=8 {
        let event = if order == 6 {
            SimpleEvent::new(LevelToken::ERROR, "orders.checkout", "payment declined")
                .with_exception("CardDeclined: insufficient funds")
                .with_location(LogLocation::new("Checkout", "charge", "checkout.rs", 88))
        } else {
            SimpleEvent::new(LevelToken::INFO, "orders.checkout", format!("order {} placed", order))
                .with_property("order", order.to_string())
        };

        let data = EventData::capture(&event, &levels);
        let text = format!("{} {} - {}", data.level.name, data.logger_name, data.message);
        client.append(text, data);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Late viewer that already saw up to #4; only #5.. are still cached
    let (late, mut late_rx) = hub.connect();
    late.subscribe_to_group_with_offset(GROUP, 4).await;
    if let Some(message) = late_rx.recv().await {
        print_message("late", &message);
    }

    if let Some(stats) = hub.group_stats(GROUP).await {
        println!("group {}: {:?}", GROUP, stats);
    }

    client.shutdown().await;
    live.disconnect().await;
    late.disconnect().await;

    drop(live);
    live_task.abort();

    Ok(())
}
