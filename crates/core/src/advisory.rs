//! Advisory collaborator interface
//!
//! Simulation results can be handed to an external text-generation service that
//! writes a short management recommendation. The service itself lives outside this
//! crate; this module only fixes the prompt pair it receives and guarantees that a
//! failing service degrades to a readable message instead of an error.

use crate::simulation::SimulationResult;
use thiserror::Error;
use tracing::warn;

/// Persona and boundaries for the advisory model
pub const SYSTEM_PROMPT: &str = "You are the Senior Water Management Engineer for the WaterTwin AI system. \
Your task is to analyze simulation data and provide technical, actionable, and \
water-conservation focused strategic recommendations.";

/// Prefix of the message returned when the service fails
pub const DEGRADED_PREFIX: &str = "A technical issue occurred while generating the analysis report";

/// Failures of the external text-generation service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
    /// No service is configured (e.g. missing credentials).
    #[error("advisory service is not configured")]
    NotConfigured,

    /// The request failed in transport or at the service.
    #[error("advisory request failed: {0}")]
    RequestFailed(String),

    /// The service answered with no text.
    #[error("advisory service returned an empty response")]
    EmptyResponse,
}

/// External text-generation capability
pub trait TextGenerator {
    /// Produce free text for a system/user prompt pair
    ///
    /// # Errors
    /// Any service failure; callers convert it to a degraded message
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AdvisoryError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str, &str) -> Result<String, AdvisoryError>,
{
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AdvisoryError> {
        self(system_prompt, user_prompt)
    }
}

/// User prompt carrying the numbers from one simulation cycle
pub fn user_prompt(result: &SimulationResult) -> String {
    format!(
        "Analyze the following simulation data:\n\
         - Incoming Inflow: {} L\n\
         - Expected Overflow: {} L\n\
         - Predicted Fill Rate: {}%\n\
         \n\
         Please provide a technical report in exactly 3 short sentences.",
        *result.inflow_l, *result.overflow_l, *result.final_fill_pct
    )
}

/// Turns simulation results into recommendations via a [`TextGenerator`]
#[derive(Debug, Clone)]
pub struct Advisor<G> {
    generator: G,
}

impl<G: TextGenerator> Advisor<G> {
    /// Wrap a text generator
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Recommendation text for a result; never fails
    ///
    /// Service errors and empty answers come back as a message starting with
    /// [`DEGRADED_PREFIX`].
    pub fn strategic_advice(&self, result: &SimulationResult) -> String {
        let outcome = self
            .generator
            .generate(SYSTEM_PROMPT, &user_prompt(result))
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(AdvisoryError::EmptyResponse)
                } else {
                    Ok(text)
                }
            });

        match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!("Advisory service failed: {e}");
                format!("{DEGRADED_PREFIX}: {e}")
            }
        }
    }
}
