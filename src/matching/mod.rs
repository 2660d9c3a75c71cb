// src/matching/mod.rs

pub mod brand;
pub mod cache;
pub mod category;
pub mod fuzzy;
pub mod normalize;
