//! Dialect ⇄ canonical conversions
//!
//! One module per dialect, each handling requests, responses, and streaming
//! chunks in both directions. Invariant: conversion either yields a complete
//! canonical value or a typed error — never a half-converted form.

pub mod anthropic;
pub mod openai;
pub mod titan;
