use crate::dom::Document;
use crate::engine::Engine;
use crate::error::Result;
use crate::scheduler::Signal;
use std::future::Future;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};

/// Drive an engine from a signal channel until `shutdown` resolves or every sender is gone.
///
/// Everything runs on the calling task: signals are fed in as they arrive and
/// the loop sleeps until the engine's next deadline in between.
pub async fn run_until<D, F>(engine: &mut Engine<D>, signals: &mut UnboundedReceiver<Signal>, shutdown: F) -> Result<()>
where
    D: Document,
    F: Future<Output = ()>,
{
    let origin = Instant::now();
    engine.start(origin.elapsed())?;
    tokio::pin!(shutdown);

    loop {
        let deadline = engine.next_deadline().map(|offset| origin + offset);

        tokio::select! {
            _ = &mut shutdown => break,
            signal = signals.recv() => match signal {
                Some(signal) => {
                    engine.signal(signal, origin.elapsed());
                }
                None => break,
            },
            _ = async {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            } => {}
        }

        engine.run_due(origin.elapsed());
    }

    engine.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WardenConfig;
    use crate::dom::{DomTree, ElementNode};
    use crate::policy::ApplyOutcome;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(start_paused = true)]
    async fn test_runs_first_tick_and_stops_when_senders_drop() {
        let mut engine = Engine::new(DomTree::new(ElementNode::new("html")), WardenConfig::default()).unwrap();
        let (tx, mut rx) = unbounded_channel::<Signal>();

        let feeder = async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(Signal::Mutation).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(tx);
        };

        let (result, ()) = tokio::join!(run_until(&mut engine, &mut rx, std::future::pending()), feeder);

        result.unwrap();
        assert!(!engine.is_running());
        assert_eq!(engine.stats().ticks, 2);
        assert_eq!(engine.last_outcome(), Some(ApplyOutcome::NoContainer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_future_stops_loop() {
        let mut engine = Engine::new(DomTree::new(ElementNode::new("html")), WardenConfig::default()).unwrap();
        let (_tx, mut rx) = unbounded_channel::<Signal>();

        run_until(&mut engine, &mut rx, tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert!(!engine.is_running());
        assert_eq!(engine.stats().ticks, 1);
    }
}
