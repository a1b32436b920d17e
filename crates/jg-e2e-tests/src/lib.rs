//! End-to-end tests for the JOI code generator live under `tests/`.
//!
//! They drive the real router over the shipped `resources/` files with a
//! scripted generator in place of the language model.
