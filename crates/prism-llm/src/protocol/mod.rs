//! Wire-format types for each dialect
//!
//! Serde mirrors of the JSON each provider speaks. Conversion logic to and
//! from the canonical types lives in [`crate::convert`].

pub mod anthropic;
pub mod openai;
pub mod titan;
