//! Image attachments for the next message
//!
//! This module provides:
//! - Blob sources (in-memory bytes or files) with MIME detection
//! - Data-URI encoding on a worker pool
//! - The ordered attachment store with generation-checked publication

pub mod blob;
pub mod encoder;
pub mod store;

pub use blob::{BlobSource, ImageBlob};
pub use encoder::{
    encode_data_uri, EncodeDispatcher, EncodeJob, EncodeResult, EncoderPool, QueuedDispatcher,
    QueuedJobs,
};
pub use store::{Attachment, AttachmentEvent, AttachmentStore, EncodedAttachment, EncodedList};
