// prediction-ingestion/src/lib.rs
// ============================================================================
// Module: Prediction Ingestion Library
// Description: Consumes recognized upstream events, deduplicates,
//              validates, transforms, and appends them to per-model-type
//              training dataset buckets, enqueuing a training trigger once
//              a bucket crosses its configured minimum size (spec §4.6).
// Purpose: Provide the ingestion side of the prediction service: a closed
//          `DomainEvent` enum, secure source fetch for externally
//          referenced payloads, and a pipeline tying dedup/validate/
//          transform/append/trigger together.
// Dependencies: prediction-core, prediction-drift, prediction-training
// ============================================================================

//! ## Overview
//! This crate turns upstream domain events into training records. Large
//! event payloads may be referenced by a `file://`, `http(s)://`, or
//! `inline:` URI rather than embedded directly; [`source::EventSource`]
//! implementations resolve those references into bytes before
//! [`event::DomainEvent`] is parsed from them. Every delivered envelope
//! passes through [`pipeline::IngestionPipeline::ingest`], which
//! deduplicates, validates, transforms, appends, and (on crossing a
//! configured threshold) requests a training run for the affected model
//! type.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dedup;
pub mod event;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod source;
pub mod transform;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dedup::DedupRegistry;
pub use event::DomainEvent;
pub use event::EventEnvelope;
pub use pipeline::IngestOutcome;
pub use pipeline::IngestionPipeline;
pub use schema::DeadLetter;
pub use schema::DeadLetterQueue;
pub use schema::ValidationError;
pub use sink::CallbackSink;
pub use sink::ChannelSink;
pub use sink::LogSink;
pub use sink::SinkError;
pub use sink::TrainingRecordSink;
pub use source::EventSource;
pub use source::FileSource;
pub use source::HttpSource;
pub use source::InlineSource;
pub use source::SourceError;
pub use source::SourcePayload;
pub use transform::transform;
