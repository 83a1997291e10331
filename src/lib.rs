//! # Résumé Tailor
//!
//! Tailor a résumé to job postings with an LLM and measure the effect with
//! sentence embeddings.
//!
//! The résumé is restructured once into a fixed JSON schema, then rewritten
//! per posting without changing that schema, rendered to PDF, and scored
//! against the posting before and after tailoring.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Résumé     │──▶│ Restructure  │──▶│   Resume   │
//! │ PDF/DOCX   │   │    (LLM)     │   │  (schema)  │
//! └────────────┘   └──────────────┘   └─────┬──────┘
//!                                           │
//! ┌────────────┐   ┌──────────────┐   ┌─────▼──────┐   ┌──────────┐
//! │ Job board  │──▶│ Descriptions │──▶│ Regenerate │──▶│   PDF    │
//! │  search    │   │              │   │   (LLM)    │   │ + score  │
//! └────────────┘   └──────────────┘   └────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tailor restructure cv.pdf --out cv.json     # schema JSON
//! tailor search "rust engineer" --location Berlin --limit 10
//! tailor score cv.pdf --job-id 3912345678     # 0-100 relevance
//! tailor run cv.pdf "rust engineer" --location Berlin --limit 5
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Listings, postings, and run reports |
//! | [`resume`] | The résumé schema |
//! | [`extract`] | Text extraction from PDF, DOCX, and text files |
//! | [`llm`] | Chat-completion clients |
//! | [`prompts`] | Prompt text |
//! | [`restructure`] | Free text to résumé schema, with caching |
//! | [`regen`] | Per-posting rewrite that keeps the schema |
//! | [`schema`] | Structure comparison and repair |
//! | [`render`] | PDF rendering |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`relevance`] | Embedding-based relevance score |
//! | [`assess`] | Seven-aspect LLM fit assessment |
//! | [`scraper`] | Job board search and descriptions |
//! | [`pipeline`] | End-to-end run |
//! | [`progress`] | Progress reporting on stderr |
//! | [`commands`] | CLI command implementations |

pub mod assess;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod regen;
pub mod relevance;
pub mod render;
pub mod restructure;
pub mod resume;
pub mod schema;
pub mod scraper;
