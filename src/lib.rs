//! MerchMocker: logo mockups, natural-language edits and text-to-image
//! generation on top of Gemini / Imagen, driven through per-screen state.

pub mod config;
pub mod controllers;
pub mod encoder;
pub mod error;
pub mod gemini;
pub mod models;
pub mod routes;
pub mod shell;
#[cfg(test)]
mod testing;
