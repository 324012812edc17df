//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::{io::CircuitSchedule, model::CircuitInput, EngineOptions};

#[cfg(feature = "rest-api")]
pub use rest::{router, ApiState};

#[cfg(feature = "rest-api")]
mod rest {
    use axum::{
        extract::State,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use std::sync::Arc;

    use crate::{
        analyze_schedule, errors::CalcEngineError, memorial::CalculationMemorial,
        model::Vocabulary, tables::TableRepository, Dimensioner, DimensioningSummary,
    };

    use super::{BatchRequest, DimensionRequest, DimensionResponse};

    #[derive(Clone)]
    pub struct ApiState {
        pub tables: Arc<TableRepository>,
    }

    impl Default for ApiState {
        fn default() -> Self {
            Self {
                tables: Arc::new(TableRepository::builtin().clone()),
            }
        }
    }

    pub fn router(state: ApiState) -> Router {
        Router::new()
            .route("/api/dimension", post(dimension))
            .route("/api/dimension/batch", post(dimension_batch))
            .route("/api/vocabulary", get(vocabulary))
            .with_state(Arc::new(state))
    }

    async fn dimension(
        State(state): State<Arc<ApiState>>,
        Json(payload): Json<DimensionRequest>,
    ) -> Result<Json<DimensionResponse>, (StatusCode, String)> {
        let dimensioner = Dimensioner::new(&state.tables, payload.options);
        let result = dimensioner.dimension(&payload.circuit).map_err(map_err)?;
        let memorial = payload
            .explain
            .then(|| CalculationMemorial::build(&payload.circuit, &result));
        Ok(Json(DimensionResponse { result, memorial }))
    }

    async fn dimension_batch(
        State(state): State<Arc<ApiState>>,
        Json(payload): Json<BatchRequest>,
    ) -> Result<Json<DimensioningSummary>, (StatusCode, String)> {
        let dimensioner = Dimensioner::new(&state.tables, payload.options);
        analyze_schedule(&payload.schedule, &dimensioner)
            .map(Json)
            .map_err(map_err)
    }

    async fn vocabulary() -> Json<Vocabulary> {
        Json(Vocabulary::build())
    }

    fn map_err(err: CalcEngineError) -> (StatusCode, String) {
        let status = match err {
            CalcEngineError::InvalidConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRequest {
    pub circuit: CircuitInput,
    #[serde(default)]
    pub options: EngineOptions,
    /// Include the calculation memorial in the response.
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionResponse {
    pub result: crate::DimensioningResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorial: Option<crate::CalculationMemorial>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(flatten)]
    pub schedule: CircuitSchedule,
    #[serde(default)]
    pub options: EngineOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let circuit = serde_json::to_value(crate::test_support::sample_input()).unwrap();
        let request: DimensionRequest =
            serde_json::from_value(serde_json::json!({ "circuit": circuit })).unwrap();
        assert!(!request.explain);
        assert_eq!(request.options, EngineOptions::default());
    }

    #[test]
    fn batch_request_flattens_schedule() {
        let circuit = serde_json::to_value(crate::test_support::sample_input()).unwrap();
        let request: BatchRequest = serde_json::from_value(serde_json::json!({
            "name": "board",
            "circuits": [circuit],
            "options": { "lookup_policy": "next-tabulated" }
        }))
        .unwrap();
        assert_eq!(request.schedule.circuits.len(), 1);
        assert_eq!(
            request.options.lookup_policy,
            r_lvd_common::LookupPolicy::NextTabulated
        );
    }
}
