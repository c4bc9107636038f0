//! Print the changes of an account.
//!
//! Without arguments the feed is polled from the latest cursor. With `stream` as first argument
//! changes are streamed for a minute instead.

use nylas_api::Api;
use nylas_api::delta::StopHandle;
use nylas_api::domain::SecretString;
use std::ops::ControlFlow;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let token = std::env::var("NYLAS_ACCESS_TOKEN").expect("NYLAS_ACCESS_TOKEN not set");
    let api = Api::builder()
        .access_token(SecretString::from(token))
        .build()
        .expect("failed to build api");

    let cursor = std::env::var("NYLAS_CURSOR")
        .map(Into::into)
        .or_else(|_| api.latest_cursor())
        .expect("failed to get cursor");
    println!("Starting from {cursor}");

    let deltas = api.deltas(cursor).exclude(["contact", "event"]);
    if std::env::args().nth(1).as_deref() == Some("stream") {
        let result = deltas.stream(Duration::from_secs(60), &StopHandle::new(), |delta| {
            println!("{:?} {} {:?}", delta.event, delta.record.object(), delta.record.id());
            ControlFlow::Continue(())
        });
        if let Err(e) = result {
            eprintln!("Stream failed: {e}");
        }
        return;
    }

    let mut poll = deltas.poll();
    for delta in poll.by_ref() {
        let delta = delta.expect("poll failed");
        println!("{:?} {} {:?}", delta.event, delta.record.object(), delta.record.id());
    }
    println!("Caught up at {}", poll.cursor());
}
