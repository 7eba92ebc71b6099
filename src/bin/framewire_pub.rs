#![forbid(unsafe_code)]

//! Demonstration publisher: builds one frame, encodes it, and publishes it
//! to the broker with at-least-once delivery.

use clap::Parser;
use framewire::config::ConfigLoader;
use framewire::publish::{BrokerPublisher, DeliveryGuarantee};
use framewire::telemetry::{PerformanceTimer, TelemetryCollector};
use framewire::{Frame, Tensor};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "framewire-pub")]
#[command(about = "Publish a demonstration frame envelope over MQTT")]
#[command(version)]
struct Cli {
    /// Broker host
    #[arg(long)]
    host: Option<String>,

    /// Broker port
    #[arg(long)]
    port: Option<u16>,

    /// Topic to publish to
    #[arg(long)]
    topic: Option<String>,

    /// Delivery guarantee: at-most-once, at-least-once, or exactly-once
    #[arg(long, default_value = "at-least-once")]
    guarantee: DeliveryGuarantee,

    /// Frame identifier
    #[arg(long, default_value = "run-001")]
    id: String,

    /// Frame label
    #[arg(long, default_value = "test-frame")]
    label: String,
}

/// A deterministic 4x3 float32 ramp standing in for captured data.
fn demo_tensor() -> Result<Tensor, framewire::TensorError> {
    let values: Vec<f32> = (0..12).map(|i| i as f32 * 0.5).collect();
    Tensor::from_f32(values, &[4, 3])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    let mut config = ConfigLoader::new("framewire-pub").load()?;
    if let Some(host) = cli.host {
        config.broker.host = host;
    }
    if let Some(port) = cli.port {
        config.broker.port = port;
    }
    if let Some(topic) = cli.topic {
        config.publish.topic = topic;
    }

    let mut telemetry = TelemetryCollector::new("framewire-pub");

    let frame = Frame::new(cli.id, cli.label, demo_tensor()?, "not for the wire");

    let mut publisher = BrokerPublisher::connect(&config).await?;

    let timer = PerformanceTimer::start("publish_frame");
    let result = publisher
        .publish_frame(&config.publish.topic, &frame, cli.guarantee)
        .await;
    telemetry.record_operation(timer.finish());

    match &result {
        Ok(receipt) => info!(
            topic = %receipt.topic,
            bytes = receipt.payload_bytes,
            acknowledged = receipt.acknowledged,
            latency_ms = receipt.latency.as_millis() as u64,
            "Frame published"
        ),
        Err(err) => {
            telemetry.record_error();
            error!(error = %err, "Publish failed");
        }
    }

    publisher.disconnect().await?;

    let metrics = telemetry.snapshot();
    info!(
        operations = metrics.operation_count,
        avg_ms = metrics.avg_operation_duration_ms,
        errors = metrics.error_count,
        "Session complete"
    );

    result?;
    Ok(())
}
