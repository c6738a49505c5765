// THEORY:
// The parallel front-end serves callers that analyze many images (batch
// imports, uploads arriving over a socket) without blocking each other.
// The core transforms are pure, so parallelism here is plain fan-out:
//
// 1.  **Worker pool**: a dispatcher task round-robins analysis tasks over N
//     workers (N from the machine's CPU count), each owning its own
//     `VibePipeline`. Tasks carry their frame bytes and a oneshot reply
//     channel.
// 2.  **Sequence slot**: the most recent successfully produced
//     `NoteSequence` is published into a shared slot by whole-value
//     replacement. A playback consumer reading the slot sees either the old
//     sequence or the new one, never a partially rebuilt one.

use crate::core_modules::sequence::NoteSequence;
use crate::error::{Result, VibeError};
use crate::pipeline::{PipelineConfig, VibePipeline, VibeReport};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, oneshot};

/// An owned RGBA frame handed to the worker pool.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

struct AnalysisTask {
    frame: FrameBuffer,
    reply: oneshot::Sender<Result<VibeReport>>,
}

/// Shared holder of the most recently produced sequence.
///
/// Publishing replaces the whole `Arc`, so readers never observe a
/// half-built sequence; they either still hold the old one or get the new
/// one.
#[derive(Debug, Clone, Default)]
pub struct SequenceSlot {
    inner: Arc<RwLock<Option<Arc<NoteSequence>>>>,
}

impl SequenceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current sequence wholesale.
    pub async fn publish(&self, sequence: NoteSequence) {
        let mut slot = self.inner.write().await;
        *slot = Some(Arc::new(sequence));
    }

    /// The current sequence, if any image has been analyzed yet.
    pub async fn current(&self) -> Option<Arc<NoteSequence>> {
        self.inner.read().await.clone()
    }
}

/// A pool of analysis workers plus the shared sequence slot.
pub struct ParallelAnalyzer {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    slot: SequenceSlot,
}

impl ParallelAnalyzer {
    /// Spawn the dispatcher and one worker per CPU core.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let pipeline = VibePipeline::new(config)?;
        let worker_count = num_cpus::get().max(1);

        tracing::debug!(workers = worker_count, "starting analysis worker pool");
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        // Dispatcher: round-robin tasks over the workers.
        tokio::spawn(async move {
            let mut worker_index = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_index].send(task);
                worker_index = (worker_index + 1) % worker_senders.len();
            }
        });

        for mut worker_receiver in worker_receivers {
            let worker_pipeline = pipeline.clone();
            tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = worker_pipeline.analyze_raw(
                        task.frame.width,
                        task.frame.height,
                        &task.frame.data,
                    );
                    let _ = task.reply.send(result);
                }
            });
        }

        Ok(Self {
            task_sender,
            slot: SequenceSlot::new(),
        })
    }

    /// Analyze one frame on the pool. On success the produced sequence is
    /// published to the slot before the report is returned.
    pub async fn analyze(&self, frame: FrameBuffer) -> Result<VibeReport> {
        let (reply, receiver) = oneshot::channel();
        self.task_sender
            .send(AnalysisTask { frame, reply })
            .map_err(|_| VibeError::WorkerPool("failed to send task to worker pool"))?;

        let report = receiver
            .await
            .map_err(|_| VibeError::WorkerPool("worker dropped its reply channel"))??;

        self.slot.publish(report.sequence.clone()).await;
        Ok(report)
    }

    /// Analyze a batch of frames concurrently, preserving input order.
    pub async fn analyze_batch(&self, frames: Vec<FrameBuffer>) -> Vec<Result<VibeReport>> {
        join_all(frames.into_iter().map(|frame| self.analyze(frame))).await
    }

    /// A handle to the slot holding the most recent sequence, for playback
    /// consumers.
    pub fn sequence_slot(&self) -> SequenceSlot {
        self.slot.clone()
    }
}
