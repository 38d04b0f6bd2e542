//! End-to-end scenario tests for the guardian-protected execution
//! pipeline, covering the DKG/FROST and VDF cores plus the daemon and
//! configuration ambient stack wrapped around them. No library code of
//! its own; scenarios live under `tests/`.
