//! Pipeline stages for document compliance processing.
//!
//! Each submodule implements exactly one step; the orchestration that chains
//! them lives in [`crate::service`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ parse ──▶ extract ──▶ generate ──▶ grade
//! (path/URL/  (pdfium,   (LLM)      (LLM)       (LLM + local score)
//!  upload)     docx, txt)
//! ```
//!
//! 1. [`input`]: resolve a path, URL or upload to a local file
//! 2. [`parse`]: extract text; blocking work runs in `spawn_blocking`
//! 3. [`extract`]: pull named fields out of the text
//! 4. [`generate`]: draft an ISO template from the fields
//! 5. [`grade`]: judge the template against the rule catalog
//!
//! [`llm`] holds the [`llm::TextGenerator`] seam shared by steps 3–5.

pub mod extract;
pub mod generate;
pub mod grade;
pub mod input;
pub mod llm;
pub mod parse;
