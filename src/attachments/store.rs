//! Pending attachment store
//!
//! Holds the ordered list of attachments for the next message and publishes
//! their encoded form. Every change to the list starts a new generation and
//! re-encodes every entry in parallel. The encoded list is published only
//! when all entries of the current generation have an outcome, and results
//! tagged with an older generation are discarded on arrival.

use crate::attachments::blob::ImageBlob;
use crate::attachments::encoder::{
    EncodeDispatcher, EncodeJob, EncodeResult, EncoderPool, QueuedDispatcher, QueuedJobs,
};
use crate::config::AttachmentConfig;
use crate::{ComposerError, Result};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An attachment waiting to be sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub id: Uuid,
    pub blob: ImageBlob,
    pub added_at: DateTime<Utc>,
}

impl Attachment {
    pub fn new(blob: ImageBlob) -> Self {
        Self {
            id: Uuid::new_v4(),
            blob,
            added_at: Utc::now(),
        }
    }
}

/// Encoding outcome for one attachment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedAttachment {
    pub id: Uuid,
    pub name: String,
    pub outcome: Result<String>,
}

impl EncodedAttachment {
    pub fn data_uri(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    pub fn error(&self) -> Option<&ComposerError> {
        self.outcome.as_ref().err()
    }
}

/// A fully encoded generation of the attachment list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedList {
    generation: u64,
    items: Vec<EncodedAttachment>,
}

impl EncodedList {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Every entry in attachment order, failed ones included
    pub fn items(&self) -> &[EncodedAttachment] {
        &self.items
    }

    /// Positions of failed entries
    pub fn failures(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.outcome.is_err())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Observable changes of the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentEvent {
    /// A generation finished encoding and is now visible
    Published {
        generation: u64,
        count: usize,
        failed: usize,
    },

    /// An entry of the published generation failed to encode
    EncodingFailed {
        index: usize,
        name: String,
        error: ComposerError,
    },
}

#[derive(Debug)]
struct Slot {
    id: Uuid,
    name: String,
    outcome: Option<Result<String>>,
}

#[derive(Debug)]
struct PendingBatch {
    generation: u64,
    slots: Vec<Slot>,
    remaining: usize,
}

/// Ordered attachments plus their asynchronous encoding pipeline
pub struct AttachmentStore {
    entries: Vec<Attachment>,
    generation: u64,
    pending: Option<PendingBatch>,
    published: EncodedList,
    dispatcher: Box<dyn EncodeDispatcher>,
    results_rx: Receiver<EncodeResult>,
    outbox: Vec<AttachmentEvent>,
}

impl AttachmentStore {
    /// Create a store backed by an [`EncoderPool`]
    pub fn new(config: &AttachmentConfig) -> Result<Self> {
        let (results_tx, results_rx) = unbounded();
        let pool = EncoderPool::start(config.encoder_workers, config.max_image_bytes, results_tx)?;
        Ok(Self::with_dispatcher(Box::new(pool), results_rx))
    }

    /// Create a store with a custom dispatcher; results must arrive on `results_rx`
    pub fn with_dispatcher(
        dispatcher: Box<dyn EncodeDispatcher>,
        results_rx: Receiver<EncodeResult>,
    ) -> Self {
        Self {
            entries: Vec::new(),
            generation: 0,
            pending: None,
            published: EncodedList::default(),
            dispatcher,
            results_rx,
            outbox: Vec::new(),
        }
    }

    /// Create a store whose jobs are completed manually through [`QueuedJobs`]
    pub fn with_queued_encoder(max_bytes: Option<usize>) -> (Self, QueuedJobs) {
        let (dispatcher, jobs, results_rx) = QueuedDispatcher::new(max_bytes);
        (Self::with_dispatcher(Box::new(dispatcher), results_rx), jobs)
    }

    pub fn entries(&self) -> &[Attachment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current generation of the attachment list
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the current generation is still being encoded
    pub fn is_encoding(&self) -> bool {
        self.pending.is_some()
    }

    /// Last fully encoded generation
    pub fn encoded(&self) -> &EncodedList {
        &self.published
    }

    /// Published outcomes of entries that are still attached, in order.
    /// Entries removed since the last publication are left out.
    pub fn visible(&self) -> Vec<(&Attachment, &EncodedAttachment)> {
        self.published
            .items
            .iter()
            .filter_map(|item| {
                self.entries
                    .iter()
                    .find(|entry| entry.id == item.id)
                    .map(|entry| (entry, item))
            })
            .collect()
    }

    /// Data URIs of the visible attachments
    pub fn images(&self) -> Vec<String> {
        self.visible()
            .into_iter()
            .filter_map(|(_, item)| item.data_uri().map(str::to_string))
            .collect()
    }

    /// Append files after the existing entries. Returns how many were added.
    pub fn append(&mut self, files: Vec<ImageBlob>) -> usize {
        if files.is_empty() {
            return 0;
        }

        let added = files.len();
        self.entries.extend(files.into_iter().map(Attachment::new));
        debug!(added, total = self.entries.len(), "Attachments appended");
        self.reencode();
        added
    }

    /// Remove the entry at `index`. Out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<Attachment> {
        if index >= self.entries.len() {
            warn!("{}", ComposerError::InvalidIndex(index));
            return None;
        }

        let removed = self.entries.remove(index);
        debug!(index, name = %removed.blob.name, "Attachment removed");
        self.reencode();
        Some(removed)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if self.entries.is_empty() && self.pending.is_none() && self.published.is_empty() {
            return;
        }
        self.entries.clear();
        self.reencode();
    }

    /// Apply encoding results that have arrived and return what changed
    pub fn poll(&mut self) -> Vec<AttachmentEvent> {
        while let Ok(result) = self.results_rx.try_recv() {
            self.apply(result);
        }
        std::mem::take(&mut self.outbox)
    }

    /// Block until the current generation is published or `timeout` passes
    pub fn wait_until_settled(&mut self, timeout: Duration) -> Vec<AttachmentEvent> {
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results_rx.recv_timeout(remaining) {
                Ok(result) => self.apply(result),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(generation = self.generation, "Timed out waiting for attachment encoding");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Attachment encoder disconnected");
                    break;
                }
            }
        }
        self.poll()
    }

    fn reencode(&mut self) {
        self.generation += 1;
        let generation = self.generation;

        if self.entries.is_empty() {
            self.pending = None;
            self.publish(generation, Vec::new());
            return;
        }

        let mut batch = PendingBatch {
            generation,
            slots: self
                .entries
                .iter()
                .map(|entry| Slot {
                    id: entry.id,
                    name: entry.blob.name.clone(),
                    outcome: None,
                })
                .collect(),
            remaining: self.entries.len(),
        };

        for (index, entry) in self.entries.iter().enumerate() {
            let job = EncodeJob {
                generation,
                index,
                blob: entry.blob.clone(),
            };
            if let Err(e) = self.dispatcher.dispatch(job) {
                warn!(index, "Could not dispatch encode job: {}", e);
                batch.slots[index].outcome = Some(Err(e));
                batch.remaining -= 1;
            }
        }

        debug!(generation, entries = self.entries.len(), "Encoding generation started");
        if batch.remaining == 0 {
            self.finish(batch);
        } else {
            self.pending = Some(batch);
        }
    }

    fn apply(&mut self, result: EncodeResult) {
        if result.generation != self.generation {
            debug!(
                stale = result.generation,
                current = self.generation,
                index = result.index,
                "Discarding stale encoding result"
            );
            return;
        }

        let Some(batch) = self.pending.as_mut() else {
            debug!(generation = result.generation, "Encoding result with no pending batch");
            return;
        };

        let Some(slot) = batch.slots.get_mut(result.index) else {
            warn!(index = result.index, "Encoding result for unknown position");
            return;
        };

        if slot.outcome.is_some() {
            debug!(index = result.index, "Duplicate encoding result ignored");
            return;
        }

        slot.outcome = Some(result.outcome);
        batch.remaining -= 1;

        if batch.remaining == 0 {
            if let Some(batch) = self.pending.take() {
                self.finish(batch);
            }
        }
    }

    fn finish(&mut self, batch: PendingBatch) {
        let items = batch
            .slots
            .into_iter()
            .map(|slot| EncodedAttachment {
                id: slot.id,
                name: slot.name,
                outcome: slot.outcome.unwrap_or_else(|| {
                    Err(ComposerError::EncodingFailure("no result".to_string()))
                }),
            })
            .collect();
        self.publish(batch.generation, items);
    }

    fn publish(&mut self, generation: u64, items: Vec<EncodedAttachment>) {
        let list = EncodedList { generation, items };

        for index in list.failures() {
            let item = &list.items[index];
            if let Some(error) = item.error() {
                warn!(index, name = %item.name, "Attachment failed to encode: {}", error);
                self.outbox.push(AttachmentEvent::EncodingFailed {
                    index,
                    name: item.name.clone(),
                    error: error.clone(),
                });
            }
        }

        let failed = list.failures().len();
        info!(generation, count = list.len(), failed, "Attachments published");
        self.outbox.push(AttachmentEvent::Published {
            generation,
            count: list.len(),
            failed,
        });
        self.published = list;
    }
}

impl std::fmt::Debug for AttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentStore")
            .field("entries", &self.entries.len())
            .field("generation", &self.generation)
            .field("encoding", &self.pending.is_some())
            .field("published", &self.published.generation)
            .finish()
    }
}
