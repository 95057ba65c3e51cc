//! Infrastructure layer - high-level I/O utilities built on the domain.
//!
//! This module provides a streaming wrapper around the sector buffer,
//! adding Read/Write/Seek capabilities for integration with file systems
//! and other byte-stream consumers.

pub mod streaming;
