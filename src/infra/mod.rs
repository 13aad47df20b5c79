// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Persistence used by the ml layer:
//
//   artifact.rs   - the exported model file: framing, header,
//                   version checks. What `load_learner` reads.
//
//   checkpoint.rs - per-epoch weight snapshots written with
//                   Burn's CompactRecorder, for resuming.
//
//   metrics.rs    - epoch history appended to a CSV file.
//
// Reference: Burn Book §5 (Records and Checkpointing)

/// Exported model artifact (single file)
pub mod artifact;

/// Per-epoch model checkpoints
pub mod checkpoint;

/// Training history CSV logger
pub mod metrics;
