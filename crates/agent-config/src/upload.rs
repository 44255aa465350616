//! Upload queue: hands finished recordings off to whatever ships them
//! onward, without the recording path blocking on network I/O.
//!
//! Grounded in `models/upload_record.go`'s status/type string constants
//! and `uploader/upload.go`'s queue-then-drain shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Queued,
    UploadStarting,
    Uploading,
    UploadTransferred,
    UploadFinalized,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::UploadStarting => "UPLOAD_STARTING",
            Self::Uploading => "UPLOADING",
            Self::UploadTransferred => "UPLOAD_TRANSFERRED",
            Self::UploadFinalized => "UPLOAD_FINALIZED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRecordType {
    CfsAudio,
    Cad,
}

impl UploadRecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CfsAudio => "CFS_AUDIO",
            Self::Cad => "CAD",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub file_path: String,
    pub content_type: String,
    pub record_type: UploadRecordType,
    pub status: UploadStatus,
    pub details: String,
    pub begin_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl UploadRecord {
    pub fn new(
        file_path: impl Into<String>,
        record_type: UploadRecordType,
        begin_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            content_type: "audio/wav".to_string(),
            record_type,
            status: UploadStatus::Queued,
            details: String::new(),
            begin_time,
            end_time,
        }
    }
}

/// Hand-off point between a recorder finishing a file and whatever ships
/// it onward. Kept as a trait so the bounded in-memory channel used here
/// can later be swapped for a durable queue without touching callers.
#[async_trait]
pub trait UploadQueue: Send + Sync {
    async fn enqueue(&self, record: UploadRecord) -> Result<()>;
}

pub struct ChannelUploadQueue {
    sender: mpsc::Sender<UploadRecord>,
}

impl ChannelUploadQueue {
    /// Creates a bounded channel pair; `capacity` caps how many finished
    /// recordings may wait to be picked up before `enqueue` applies
    /// backpressure to the recorder that produced them.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<UploadRecord>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl UploadQueue for ChannelUploadQueue {
    async fn enqueue(&self, record: UploadRecord) -> Result<()> {
        self.sender
            .send(record)
            .await
            .map_err(|_| ConfigError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueued_record_is_received() {
        let (queue, mut receiver) = ChannelUploadQueue::new(4);
        let now = Utc::now();
        queue
            .enqueue(UploadRecord::new(
                "/tmp/call.wav",
                UploadRecordType::CfsAudio,
                now,
                now,
            ))
            .await
            .unwrap();

        let record = receiver.recv().await.unwrap();
        assert_eq!(record.file_path, "/tmp/call.wav");
        assert_eq!(record.status, UploadStatus::Queued);
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_reports_queue_closed() {
        let (queue, receiver) = ChannelUploadQueue::new(1);
        drop(receiver);
        let now = Utc::now();
        let err = queue
            .enqueue(UploadRecord::new(
                "/tmp/call.wav",
                UploadRecordType::Cad,
                now,
                now,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::QueueClosed));
    }
}
