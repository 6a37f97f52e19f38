//! Sends a handful of messages over a stream whose transport dies every two
//! calls, watching the wrapper restart transparently in between.

use reconnecting_stream::{RestartConfig, RestartableBidiStream};
use reconnecting_stream_demos::FlakyFactory;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = RestartConfig::builder()
        .initial_backoff(Duration::from_millis(20))
        .max_backoff(Duration::from_millis(200))
        .multiplier(2.0)
        .on_attempt(|attempt, err| println!("reconnecting (attempt {}): {}", attempt, err))
        .on_success(|attempt| println!("reconnected after {} attempt(s)", attempt))
        .build()?;

    let stream = RestartableBidiStream::construct(
        CancellationToken::new(),
        FlakyFactory::new(2),
        config,
        "flaky-echo",
    )
    .await?;

    for i in 0..6 {
        let msg = format!("message-{}", i);
        stream.send(msg).await?;
        let reply = stream.receive().await?;
        println!("received: {}", reply);
    }

    println!("total restarts: {}", stream.retry_count().await);
    stream.close().await?;
    Ok(())
}
