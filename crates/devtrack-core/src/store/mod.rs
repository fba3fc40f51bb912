// # Package Store Implementations
//
// This module provides the in-process implementation of the PackageStore
// trait. The relational store lives in `devtrack-store-sqlite`.

pub mod memory;

pub use memory::MemoryPackageStore;
