//! rungate: client-side engine for running hosted generative models.
//!
//! The crate turns a model's declared JSON input schema into a
//! validated, JSON-safe submission payload ([`form`], [`schema`]),
//! drives the submitted run through a bounded polling state machine to
//! a terminal outcome ([`execution`]), and keeps a locally cached
//! credit balance reconciled against the server ([`credits`]). The
//! network boundary is the [`client::JobClient`] trait; everything
//! else is injected so tests run against fakes.

pub mod client;
pub mod credits;
pub mod execution;
pub mod form;
pub mod schema;

pub use client::{CreditBalance, Generation, GenerationStatus, JobClient, RunMetadata};
pub use credits::CreditLedger;
pub use execution::{ExecutionController, PollConfig, RunState, Scheduler, TokioScheduler};
pub use form::{ControlKind, FormError, FormSession};
pub use schema::{InputProperty, InputSchema, InputValue};
