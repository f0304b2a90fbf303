// src/connectors/messages.rs
//! Response envelopes of the screener REST API.
use crate::types::{OhlcvCandle, Strategy, StrategyParameters, SymbolPerformance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StrategiesEnvelope {
    #[serde(default)]
    pub strategies: Vec<Strategy>,
}

/// `GET .../parameters` answers either with the bare map or wrapped
/// under `parameters` next to the strategy id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParametersEnvelope {
    Wrapped { parameters: StrategyParameters },
    Bare(StrategyParameters),
}

impl ParametersEnvelope {
    pub fn into_parameters(self) -> StrategyParameters {
        match self {
            ParametersEnvelope::Wrapped { parameters } => parameters,
            ParametersEnvelope::Bare(parameters) => parameters,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateParametersBody<'a> {
    pub user_id: i64,
    pub parameters: &'a StrategyParameters,
}

#[derive(Debug, Deserialize)]
pub struct OhlcvEnvelope {
    #[serde(default)]
    pub data: Vec<OhlcvCandle>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolPerformanceEnvelope {
    #[serde(default)]
    pub symbols: Vec<SymbolPerformance>,
}

/// Error body the service sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
