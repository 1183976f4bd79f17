// prediction-ingestion/src/pipeline.rs
// ============================================================================
// Module: Ingestion Pipeline
// Description: Wires dedup, validation, transform, dataset-bucket append,
//              and threshold-triggered training enqueue into one consumer
//              entry point (spec §4.6).
// Purpose: Give every recognized event kind the same five-step treatment
//          spec.md prescribes, with per-key ordering preserved by requiring
//          callers to serialize delivery per entity key (spec §5) while this
//          type itself only needs `&self` (interior-mutability, matching the
//          rest of the workspace's trait-object composition style).
// Dependencies: prediction-core, prediction-drift, prediction-training
// ============================================================================

//! ## Overview
//! [`IngestionPipeline`] is the single entry point a consumer calls per
//! delivered envelope. It never panics on malformed input: duplicates are a
//! no-op, schema failures go to the dead-letter queue, and downstream sink
//! delivery failures are logged but never fail the ingest call (the dataset
//! bucket append already committed by that point; re-running it would
//! double count).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use prediction_core::core::ModelType;
use prediction_core::core::Timestamp;
use prediction_core::core::TrainingTrigger;
use prediction_drift::RetrainTrigger;
use prediction_training::RawRecord;

use crate::dedup::DedupRegistry;
use crate::event::EventEnvelope;
use crate::schema::DeadLetterQueue;
use crate::schema::ValidationError;
use crate::sink::SinkError;
use crate::sink::TrainingRecordSink;
use crate::transform::transform;

/// Default minimum dataset bucket size before a training trigger is
/// enqueued, applied to any model type without an explicit threshold.
pub const DEFAULT_MIN_DATASET_SIZE: u64 = 100;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// What happened to one delivered envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event id had already been processed for this entity; no-op.
    Duplicate,
    /// The envelope failed schema validation and was dead-lettered.
    Rejected(ValidationError),
    /// The event was appended to every target model type's bucket. Types
    /// whose bucket crossed its configured threshold are listed in
    /// `triggered`.
    Appended {
        /// Model types the event was appended to.
        appended_to: Vec<ModelType>,
        /// Model types whose bucket crossed its minimum size this call.
        triggered: Vec<ModelType>,
    },
}

// ============================================================================
// SECTION: Dataset Bucket
// ============================================================================

/// Per-(model type, date partition) accumulation of appended records, plus
/// an aggregate count per model type used for threshold evaluation (spec
/// §4.6 steps 4-5: "appends ... by model type and time partition" then
/// "counts; when the bucket crosses a configured minimum size").
#[derive(Default)]
struct DatasetBucket {
    partitions: HashMap<(ModelType, String), VecDeque<RawRecord>>,
    counts: HashMap<ModelType, u64>,
}

impl DatasetBucket {
    fn append(&mut self, model_type: ModelType, partition: String, record: RawRecord) -> u64 {
        self.partitions.entry((model_type, partition)).or_default().push_back(record);
        let count = self.counts.entry(model_type).or_insert(0);
        *count += 1;
        *count
    }

    fn reset_count(&mut self, model_type: ModelType) {
        self.counts.insert(model_type, 0);
    }

    /// Drains every record accumulated for `model_type` across all date
    /// partitions, for a caller about to build a dataset snapshot.
    fn drain(&mut self, model_type: ModelType) -> Vec<RawRecord> {
        let keys: Vec<(ModelType, String)> =
            self.partitions.keys().filter(|(mt, _)| *mt == model_type).cloned().collect();
        let mut drained = Vec::new();
        for key in keys {
            if let Some(records) = self.partitions.remove(&key) {
                drained.extend(records);
            }
        }
        drained
    }
}

/// Formats a timestamp's UTC date as a stable `YYYY-MM-DD` partition key.
fn partition_key(timestamp: Timestamp) -> String {
    let date = timestamp.as_offset_date_time().date();
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Ties dedup, validation, transform, append, and threshold-triggered
/// training enqueue together for one consumer.
pub struct IngestionPipeline<S, T> {
    dedup: Mutex<DedupRegistry>,
    dead_letters: Mutex<DeadLetterQueue>,
    bucket: Mutex<DatasetBucket>,
    thresholds: HashMap<ModelType, u64>,
    sink: S,
    trigger: T,
}

impl<S, T> IngestionPipeline<S, T>
where
    S: TrainingRecordSink,
    T: RetrainTrigger,
{
    /// Creates a pipeline delivering appended records to `sink` and
    /// requesting training through `trigger` once a type's bucket crosses
    /// its configured (or default) minimum size.
    #[must_use]
    pub fn new(sink: S, trigger: T, thresholds: HashMap<ModelType, u64>) -> Self {
        Self {
            dedup: Mutex::new(DedupRegistry::default()),
            dead_letters: Mutex::new(DeadLetterQueue::default()),
            bucket: Mutex::new(DatasetBucket::default()),
            thresholds,
            sink,
            trigger,
        }
    }

    /// Processes one delivered envelope through the full pipeline (spec
    /// §4.6 steps 1-5).
    pub fn ingest(&self, envelope: EventEnvelope) -> IngestOutcome {
        let entity_key = envelope.event.entity_key();
        let is_new = self
            .dedup
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .observe(&entity_key, &envelope.event_id);
        if !is_new {
            return IngestOutcome::Duplicate;
        }

        if let Err(reason) = crate::schema::validate(&envelope) {
            self.dead_letters
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(envelope, reason.clone());
            return IngestOutcome::Rejected(reason);
        }

        let partition = partition_key(envelope.occurred_at);
        let records = transform(&envelope);
        let mut appended_to = Vec::with_capacity(records.len());
        let mut triggered = Vec::new();
        for (model_type, record) in records {
            if let Err(err) = self.sink.deliver(model_type, &record) {
                self.log_sink_failure(model_type, &err);
            }
            let count = {
                let mut bucket = self.bucket.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                bucket.append(model_type, partition.clone(), record)
            };
            appended_to.push(model_type);
            let threshold = self.threshold_for(model_type);
            if count >= threshold {
                self.bucket.lock().unwrap_or_else(std::sync::PoisonError::into_inner).reset_count(model_type);
                self.trigger.request_retrain(model_type, TrainingTrigger::Event);
                triggered.push(model_type);
            }
        }
        IngestOutcome::Appended {
            appended_to,
            triggered,
        }
    }

    /// Drains every accumulated record for `model_type`, for a caller about
    /// to build a [`prediction_training::dataset`] snapshot.
    pub fn drain_bucket(&self, model_type: ModelType) -> Vec<RawRecord> {
        self.bucket.lock().unwrap_or_else(std::sync::PoisonError::into_inner).drain(model_type)
    }

    /// Returns the currently retained dead-lettered envelope count.
    #[must_use]
    pub fn dead_letter_count(&self) -> usize {
        self.dead_letters.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    fn threshold_for(&self, model_type: ModelType) -> u64 {
        self.thresholds.get(&model_type).copied().unwrap_or(DEFAULT_MIN_DATASET_SIZE)
    }

    fn log_sink_failure(&self, model_type: ModelType, err: &SinkError) {
        tracing::warn!(%model_type, %err, "training record sink delivery failed");
    }
}
