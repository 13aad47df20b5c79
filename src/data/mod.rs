// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from a dataset name to tensor batches:
//
//   registry          → name → archive URL
//       │
//       ▼
//   fetch             → download + unzip into the local cache
//       │
//       ▼
//   ts_format         → parse .ts files into X / y
//       │
//       ▼
//   loader            → (X, y, splits)
//       │
//       ▼
//   transforms        → input / target / batch transforms
//       │
//       ▼
//   TsDataset         → implements Burn's Dataset trait
//       │
//       ▼
//   TsBatcher         → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Known regression datasets and where to download them
pub mod registry;

/// Blocking download and zip extraction
pub mod fetch;

/// Parser for the sktime / UEA .ts text format
pub mod ts_format;

/// Resolves a dataset name into X, y and splits
pub mod loader;

/// Input, target and batch transforms
pub mod transforms;

/// Implements Burn's Dataset trait for time series samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded random train/validation splits
pub mod splitter;
