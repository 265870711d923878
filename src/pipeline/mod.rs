//! Pipeline stages for multi-document synthesis.
//!
//! Each submodule implements exactly one step so it can be tested alone and
//! swapped (e.g. a different text-generation backend) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ summarize ──▶ synthesize ──▶ render
//! (path/URL) (lopdf)    (1 call/doc)  (1 call)       (report PDF)
//!                          └──────── llm ───────┘
//! ```
//!
//! 1. [`input`]      read a local file or download a URL into memory
//! 2. [`extract`]    PDF bytes → normalised text; CPU-bound, run in
//!    `spawn_blocking` by the orchestrator
//! 3. [`summarize`]  one bounded summary per document
//! 4. [`synthesize`] one comparative analysis over all summaries
//! 5. [`render`]     lay out and serialise the report
//!
//! [`llm`] is the text-generation seam shared by steps 3 and 4;
//! [`postprocess`] cleans model text before it is split into report blocks.

pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
pub mod summarize;
pub mod synthesize;
