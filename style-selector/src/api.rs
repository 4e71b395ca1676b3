use serde::{Deserialize, Serialize};

use crate::catalog::InvalidCatalog;
use crate::initializer::MapInitialization;
use crate::selector::{MapConfig, SelectionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub config: MapConfig,
    #[serde(default)]
    pub prefetch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionResponse {
    Ok(Box<SelectionResult>),
    InvalidCatalog { message: String },
}

impl From<Result<SelectionResult, InvalidCatalog>> for SelectionResponse {
    fn from(result: Result<SelectionResult, InvalidCatalog>) -> Self {
        match result {
            Ok(selection) => Self::Ok(Box::new(selection)),
            Err(err) => Self::InvalidCatalog {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InitializationResponse {
    Ok(Box<MapInitialization>),
    InvalidCatalog { message: String },
}

impl From<Result<MapInitialization, InvalidCatalog>> for InitializationResponse {
    fn from(result: Result<MapInitialization, InvalidCatalog>) -> Self {
        match result {
            Ok(init) => Self::Ok(Box::new(init)),
            Err(err) => Self::InvalidCatalog {
                message: err.to_string(),
            },
        }
    }
}
