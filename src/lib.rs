//! Client for the mealworm meal-planning API.
//!
//! The interesting part is the streaming run pipeline: [`transport`] issues
//! authenticated requests, [`decoder`] turns the response body into UTF-8
//! fragments across chunk boundaries, and [`agents`] coordinates a run and
//! feeds fragments to a caller-supplied sink.

pub mod agents;
pub mod auth;
pub mod cli;
pub mod client;
pub mod credentials;
pub mod decoder;
pub mod error;
pub mod preferences;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use agents::{AbortHandle, AbortSignal, AgentsApi, FragmentStream, RunOutcome, abort_pair};
pub use client::{ClientConfig, MealwormClient};
pub use credentials::{CredentialStore, FileCredentials, MemoryCredentials};
pub use error::{ClientError, ClientResult, DecodeError, TransportError};
pub use protocol::RunRequest;
