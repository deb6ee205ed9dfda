//! Stream-mode plumbing: the merged event stream and its fan-in barrier.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures::{
    Stream, StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    domain::OutputFile,
    error::{BoilerplateError, BoilerplateResult},
};

/// One item of a stream-mode run.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Data(OutputFile),
    Error(BoilerplateError),
    /// Emitted exactly once, after every node has finished.
    End,
}

/// The merged output of every target in a run.
///
/// Files of one target arrive in order; files of different targets
/// interleave. Every error is forwarded. The final item is always
/// [`StreamEvent::End`].
pub struct FileStream {
    run_id: Uuid,
    events: UnboundedReceiver<StreamEvent>,
    cancel: CancellationToken,
    finished: bool,
}

impl FileStream {
    pub(crate) fn new(
        run_id: Uuid,
        events: UnboundedReceiver<StreamEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run_id,
            events,
            cancel,
            finished: false,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Stop every node before its next write.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain the stream, returning the written files or the first error.
    pub async fn into_result(self) -> BoilerplateResult<Vec<OutputFile>> {
        let mut files = Vec::new();
        let mut first_error = None;
        for event in self.collect_events().await {
            match event {
                StreamEvent::Data(file) => files.push(file),
                StreamEvent::Error(e) => {
                    first_error.get_or_insert(e);
                }
                StreamEvent::End => {}
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(files),
        }
    }

    /// Drain the stream into a list of every event, `End` included.
    pub async fn collect_events(self) -> Vec<StreamEvent> {
        self.collect::<Vec<_>>().await
    }
}

impl Stream for FileStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamEvent>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.events.poll_next_unpin(cx) {
            Poll::Ready(Some(StreamEvent::End)) => {
                self.finished = true;
                Poll::Ready(Some(StreamEvent::End))
            }
            Poll::Ready(None) => {
                // Every sender is gone without an End: a node task was lost.
                self.finished = true;
                Poll::Ready(Some(StreamEvent::End))
            }
            other => other,
        }
    }
}

/// Counting barrier shared by the node tasks of one run.
///
/// Each task holds one [`BarrierGuard`]; dropping the last guard emits
/// `End`. Dropping happens on unwind too, so a panicking plugin cannot
/// leave the stream open.
#[derive(Clone)]
pub(crate) struct Barrier {
    remaining: Arc<AtomicUsize>,
    events: UnboundedSender<StreamEvent>,
}

impl Barrier {
    pub(crate) fn new(count: usize, events: UnboundedSender<StreamEvent>) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(count)),
            events,
        }
    }

    pub(crate) fn guard(&self) -> BarrierGuard {
        BarrierGuard {
            barrier: self.clone(),
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

pub(crate) struct BarrierGuard {
    barrier: Barrier,
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        if self.barrier.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _ = self.barrier.events.unbounded_send(StreamEvent::End);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::path::PathBuf;

    fn output(name: &str) -> OutputFile {
        OutputFile {
            node: "t".into(),
            source: PathBuf::from(name),
            dest: PathBuf::from("out").join(name),
            contents: Vec::new(),
        }
    }

    #[tokio::test]
    async fn last_guard_emits_end() {
        let (tx, rx) = mpsc::unbounded();
        let barrier = Barrier::new(2, tx.clone());
        let first = barrier.guard();
        let second = barrier.guard();

        tx.unbounded_send(StreamEvent::Data(output("a"))).unwrap();
        drop(first);
        assert_eq!(barrier.remaining(), 1);
        drop(second);
        assert_eq!(barrier.remaining(), 0);

        let stream = FileStream::new(Uuid::new_v4(), rx, CancellationToken::new());
        let events = stream.collect_events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events.last(), Some(&StreamEvent::End));
    }

    #[tokio::test]
    async fn stream_stops_after_end() {
        let (tx, rx) = mpsc::unbounded();
        tx.unbounded_send(StreamEvent::End).unwrap();
        tx.unbounded_send(StreamEvent::Data(output("late"))).unwrap();
        let events = FileStream::new(Uuid::new_v4(), rx, CancellationToken::new())
            .collect_events()
            .await;
        assert_eq!(events, vec![StreamEvent::End]);
    }

    #[tokio::test]
    async fn into_result_returns_first_error() {
        let (tx, rx) = mpsc::unbounded();
        let first = BoilerplateError::internal("first");
        tx.unbounded_send(StreamEvent::Data(output("a"))).unwrap();
        tx.unbounded_send(StreamEvent::Error(first.clone())).unwrap();
        tx.unbounded_send(StreamEvent::Error(BoilerplateError::internal("second")))
            .unwrap();
        tx.unbounded_send(StreamEvent::End).unwrap();

        let result = FileStream::new(Uuid::new_v4(), rx, CancellationToken::new())
            .into_result()
            .await;
        assert_eq!(result.unwrap_err(), first);
    }
}
