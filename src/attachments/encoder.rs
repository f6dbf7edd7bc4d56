//! Attachment encoding
//!
//! Turns blobs into self-describing `data:` URIs on worker threads. Jobs are
//! tagged with the attachment-set generation and the entry's position so the
//! store can place results and discard stale ones.

use crate::attachments::blob::ImageBlob;
use crate::{ComposerError, Result};
use base64::Engine;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Encode a blob as `data:<mime>;base64,<payload>`
pub fn encode_data_uri(blob: &ImageBlob, max_bytes: Option<usize>) -> Result<String> {
    let read_failure =
        |e: ComposerError| ComposerError::EncodingFailure(format!("{}: {}", blob.name, e));

    // Oversized files are rejected before they are loaded
    if let Some(limit) = max_bytes {
        check_size(blob, blob.size().map_err(read_failure)?, limit)?;
    }

    let bytes = blob.read().map_err(read_failure)?;
    if let Some(limit) = max_bytes {
        // The file may have grown after it was measured
        check_size(blob, bytes.len() as u64, limit)?;
    }

    let mime = blob.resolve_mime(&bytes);
    let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{};base64,{}", mime, payload))
}

fn check_size(blob: &ImageBlob, size: u64, limit: usize) -> Result<()> {
    if size > limit as u64 {
        return Err(ComposerError::EncodingFailure(format!(
            "{} is {} bytes, limit is {}",
            blob.name, size, limit
        )));
    }
    Ok(())
}

/// One entry of one generation, waiting to be encoded
#[derive(Clone, Debug)]
pub struct EncodeJob {
    pub generation: u64,
    pub index: usize,
    pub blob: ImageBlob,
}

impl EncodeJob {
    pub fn run(&self, max_bytes: Option<usize>) -> EncodeResult {
        EncodeResult {
            generation: self.generation,
            index: self.index,
            outcome: encode_data_uri(&self.blob, max_bytes),
        }
    }
}

/// Outcome of an [`EncodeJob`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeResult {
    pub generation: u64,
    pub index: usize,
    pub outcome: Result<String>,
}

/// Somewhere encode jobs can be sent; results come back on the store's channel
pub trait EncodeDispatcher: Send {
    fn dispatch(&self, job: EncodeJob) -> Result<()>;
}

/// Fixed pool of encoder threads sharing one job queue
pub struct EncoderPool {
    job_tx: Option<Sender<EncodeJob>>,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl EncoderPool {
    /// Spawn `workers` threads that encode jobs and report on `results_tx`
    pub fn start(
        workers: usize,
        max_bytes: Option<usize>,
        results_tx: Sender<EncodeResult>,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(ComposerError::ConfigError(
                "Encoder pool needs at least one worker".to_string(),
            ));
        }

        let (job_tx, job_rx) = unbounded::<EncodeJob>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(workers);

        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let results_tx = results_tx.clone();
            let shutdown = Arc::clone(&shutdown);

            let handle = std::thread::Builder::new()
                .name(format!("image-encoder-{}", worker))
                .spawn(move || {
                    debug!(worker, "Image encoder worker starting");
                    while let Ok(job) = job_rx.recv() {
                        if shutdown.load(Ordering::SeqCst) {
                            break;
                        }
                        let result = job.run(max_bytes);
                        if results_tx.send(result).is_err() {
                            // Store dropped
                            break;
                        }
                    }
                    debug!(worker, "Image encoder worker stopped");
                })?;
            handles.push(handle);
        }

        info!(workers, "Image encoder pool started");
        Ok(Self {
            job_tx: Some(job_tx),
            shutdown,
            workers: handles,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl EncodeDispatcher for EncoderPool {
    fn dispatch(&self, job: EncodeJob) -> Result<()> {
        match &self.job_tx {
            Some(tx) => tx
                .send(job)
                .map_err(|e| ComposerError::ChannelError(format!("Failed to queue encode job: {}", e))),
            None => Err(ComposerError::ChannelError(
                "Encoder pool is shut down".to_string(),
            )),
        }
    }
}

impl Drop for EncoderPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.job_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Image encoder worker panicked");
            }
        }
    }
}

/// Dispatcher that parks jobs until the caller completes them, in any order
#[derive(Clone)]
pub struct QueuedDispatcher {
    queue: Arc<Mutex<VecDeque<EncodeJob>>>,
}

impl EncodeDispatcher for QueuedDispatcher {
    fn dispatch(&self, job: EncodeJob) -> Result<()> {
        self.queue.lock().push_back(job);
        Ok(())
    }
}

/// Completes jobs parked by a [`QueuedDispatcher`]
#[derive(Clone)]
pub struct QueuedJobs {
    queue: Arc<Mutex<VecDeque<EncodeJob>>>,
    results_tx: Sender<EncodeResult>,
    max_bytes: Option<usize>,
}

impl QueuedDispatcher {
    /// Create a dispatcher plus the receiving end a store polls
    pub fn new(max_bytes: Option<usize>) -> (Self, QueuedJobs, Receiver<EncodeResult>) {
        let (results_tx, results_rx) = unbounded();
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let dispatcher = Self {
            queue: Arc::clone(&queue),
        };
        let jobs = QueuedJobs {
            queue,
            results_tx,
            max_bytes,
        };
        (dispatcher, jobs, results_rx)
    }
}

impl QueuedJobs {
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// `(generation, index)` of every parked job, oldest first
    pub fn pending(&self) -> Vec<(u64, usize)> {
        self.queue
            .lock()
            .iter()
            .map(|job| (job.generation, job.index))
            .collect()
    }

    /// Encode and report one specific job
    pub fn complete(&self, generation: u64, index: usize) -> bool {
        match self.take(generation, index) {
            Some(job) => {
                let _ = self.results_tx.send(job.run(self.max_bytes));
                true
            }
            None => false,
        }
    }

    /// Report one specific job as failed without encoding it
    pub fn fail(&self, generation: u64, index: usize, reason: &str) -> bool {
        match self.take(generation, index) {
            Some(job) => {
                let _ = self.results_tx.send(EncodeResult {
                    generation: job.generation,
                    index: job.index,
                    outcome: Err(ComposerError::EncodingFailure(reason.to_string())),
                });
                true
            }
            None => false,
        }
    }

    /// Encode every parked job in FIFO order
    pub fn complete_all(&self) -> usize {
        let jobs: Vec<EncodeJob> = self.queue.lock().drain(..).collect();
        let count = jobs.len();
        for job in jobs {
            let _ = self.results_tx.send(job.run(self.max_bytes));
        }
        count
    }

    fn take(&self, generation: u64, index: usize) -> Option<EncodeJob> {
        let mut queue = self.queue.lock();
        let position = queue
            .iter()
            .position(|job| job.generation == generation && job.index == index)?;
        queue.remove(position)
    }
}
