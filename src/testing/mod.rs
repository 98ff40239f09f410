//! Testability harness utilities.
//!
//! Synthetic recordings used by unit tests, integration tests and the CLI's
//! `synth` command. Nothing here touches audio hardware or the filesystem.

pub mod fixtures;
