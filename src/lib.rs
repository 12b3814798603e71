#![warn(missing_docs)]
//! Med-Scan - prescription scanning and health chat over hosted Gemini models.
//!
//! This crate forwards text prompts and optional images to Google's hosted
//! Gemini models, trying a fixed chain of model identifiers in order and
//! returning the first success. Prescription images can be run through a
//! deterministic enhancement pipeline first, and prompts are grounded on a
//! local JSON drug knowledge base when one is present.
//!
//! # Quick Start
//!
//! ```no_run
//! use medscan::{GeminiClient, PromptRequest, Responder};
//!
//! #[tokio::main]
//! async fn main() -> medscan::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let responder = Responder::new(client);
//!
//!     let reply = responder
//!         .respond(&PromptRequest::new("Is paracetamol safe with ibuprofen?"))
//!         .await?;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```
//!
//! # Scanning an image
//!
//! ```no_run
//! use medscan::{
//!     enhance_bytes, prompt, EnhanceProfile, GeminiClient, ImageAttachment, Knowledge,
//!     PromptRequest, Responder,
//! };
//!
//! #[tokio::main]
//! async fn main() -> medscan::Result<()> {
//!     let raw = std::fs::read("prescription.jpg")?;
//!     let enhanced = enhance_bytes(&raw, EnhanceProfile::Sharpen)?;
//!
//!     let kb = Knowledge::load();
//!     let request = PromptRequest::new(prompt::scan_prompt(&kb))
//!         .with_image(ImageAttachment::png(enhanced));
//!
//!     let responder = Responder::new(GeminiClient::builder().build()?);
//!     println!("{}", responder.respond(&request).await?.text);
//!     Ok(())
//! }
//! ```

mod error;
pub mod knowledge;
pub mod preprocess;
pub mod prompt;
pub mod responder;
pub mod session;
pub mod text;

pub use error::{MedScanError, Result};
pub use knowledge::{DrugEntry, Knowledge, ResolvedDrug, KNOWLEDGE_PATHS};
pub use preprocess::{enhance, enhance_bytes, EnhanceProfile};
pub use responder::{Responder, DEFAULT_MODEL_CHAIN};
pub use session::{ChatTurn, Role, ScanRecord, SessionState};
pub use text::providers::{GeminiClient, GeminiClientBuilder};
pub use text::{ImageAttachment, ImageFormat, ModelReply, PromptRequest, SamplingConfig, TextProvider};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{MedScanError, Result};
    pub use crate::knowledge::Knowledge;
    pub use crate::preprocess::EnhanceProfile;
    pub use crate::responder::Responder;
    pub use crate::session::SessionState;
    pub use crate::text::providers::GeminiClient;
    pub use crate::text::{PromptRequest, TextProvider};
}
