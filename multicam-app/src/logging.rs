//! Logging setup and routing.
//!
//! Events are written to stderr until a terminal operator attaches. While
//! attached, stderr output is muted and events are queued on a channel for
//! the operator to show in its status area.

use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{MakeWriter, OptionalWriter};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Shared switch between stderr output and an attached receiver.
#[derive(Clone, Default)]
pub struct LogRouter {
    sender: Arc<Mutex<Option<Sender<String>>>>,
}

impl LogRouter {
    /// Start queueing events; replaces any earlier receiver.
    pub fn attach(&self) -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut sender) = self.sender.lock() {
            *sender = Some(tx);
        }
        rx
    }

    /// Resume writing to stderr.
    pub fn detach(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            *sender = None;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sender.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    fn send(&self, line: String) {
        if let Ok(sender) = self.sender.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(line);
            }
        }
    }

    pub fn layer(&self) -> ChannelLayer {
        ChannelLayer {
            router: self.clone(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogRouter {
    type Writer = OptionalWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        if self.is_attached() {
            OptionalWriter::none()
        } else {
            OptionalWriter::some(io::stderr())
        }
    }
}

/// Layer that forwards formatted events to the attached receiver.
pub struct ChannelLayer {
    router: LogRouter,
}

impl<S> Layer<S> for ChannelLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !self.router.is_attached() {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.router
            .send(format!("{} {}", event.metadata().level(), visitor.finish()));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut parts = Vec::with_capacity(self.fields.len() + 1);
        if !self.message.is_empty() {
            parts.push(self.message);
        }
        parts.extend(self.fields);
        parts.join(" ")
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) -> LogRouter {
    let router = LogRouter::default();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(router.clone()),
        )
        .with(router.layer())
        .init();
    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::fmt::writer::EitherWriter;

    #[test]
    fn test_attach_and_detach() {
        let router = LogRouter::default();
        assert!(!router.is_attached());
        assert!(matches!(router.make_writer(), EitherWriter::A(_)));

        let _rx = router.attach();
        assert!(router.is_attached());
        assert!(matches!(router.make_writer(), EitherWriter::B(_)));

        router.detach();
        assert!(!router.is_attached());
    }

    #[test]
    fn test_events_queue_while_attached() {
        let router = LogRouter::default();
        let subscriber = tracing_subscriber::registry().with(router.layer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("dropped before attach");
            let rx = router.attach();
            tracing::info!("{:03} images captured", 4);
            tracing::warn!(camera = "SYN0001", "retrying with fallback");
            router.detach();
            tracing::info!("dropped after detach");

            let lines: Vec<String> = rx.try_iter().collect();
            assert_eq!(
                lines,
                vec![
                    "INFO 004 images captured",
                    "WARN retrying with fallback camera=SYN0001",
                ]
            );
        });
    }
}
