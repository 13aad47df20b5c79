// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal
// (training or predicting). No model math or printing here.
//
// Reference: Clean Architecture pattern

// Load → fit_one_cycle → export
pub mod train_use_case;

// load_learner → get_x_preds on a validation split
pub mod predict_use_case;
