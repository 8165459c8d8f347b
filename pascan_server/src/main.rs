//! HTTP scoring endpoint.
//!
//! Trains the diagnostic model before binding the socket, then serves
//! it read-only from shared state: `POST /predict` takes the four named
//! band readings and returns the calibrated probability, the decision
//! threshold, and the risk verdict. Malformed requests get a 400 and
//! never disturb the model.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use log::info;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tower_http::cors::{Any, CorsLayer};

use pascan_core::synth::generate_default;
use pascan_core::{train, DiagnosticModel, RiskLabel, TrainConfig};

/// JSON field names for the four bands, in their fixed spectral order.
const BAND_FIELDS: [&str; pascan_core::BAND_COUNT] =
    ["carbonyl", "methyl", "hydroxyl_carbon", "hydroxyl_oxygen"];

#[derive(Debug, Serialize)]
struct PredictResponse {
    probability: f64,
    threshold: f64,
    result: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let dataset = generate_default();
    let model = match train(&dataset, &TrainConfig::default()) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("training failed, refusing to serve: {err}");
            std::process::exit(1);
        }
    };
    info!(
        "model ready: validation roc_auc {:.3}, threshold {:.3}",
        model.summary.roc_auc, model.threshold
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(Arc::new(model));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8711));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    println!("pascan_server listening on http://{addr}");
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "ok"
}

async fn predict(
    State(model): State<Arc<DiagnosticModel>>,
    Json(body): Json<JsonValue>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut readings = Vec::with_capacity(BAND_FIELDS.len());
    for field in BAND_FIELDS {
        match body.get(field).and_then(JsonValue::as_f64) {
            Some(value) => readings.push(value),
            None => {
                return Err(bad_request(format!(
                    "missing or non-numeric field '{field}'"
                )))
            }
        }
    }

    match model.score(&readings) {
        Ok(diagnosis) => {
            let result = match diagnosis.risk {
                RiskLabel::High => "High Risk of Cancer",
                RiskLabel::Low => "Low Risk of Cancer",
            };
            Ok(Json(PredictResponse {
                probability: diagnosis.probability,
                threshold: diagnosis.threshold,
                result: result.to_string(),
            }))
        }
        Err(err) => Err(bad_request(err.to_string())),
    }
}

fn bad_request(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_model() -> DiagnosticModel {
        use pascan_core::calibration::CalibrationConfig;
        use pascan_core::forest::ForestConfig;
        use pascan_core::stacking::StackingConfig;
        use pascan_core::synth::generate;

        let dataset = generate(240, 0.4, 0.15, 21);
        let config = TrainConfig {
            seed: 21,
            calibration: CalibrationConfig {
                stacking: StackingConfig {
                    forest: ForestConfig {
                        n_trees: 10,
                        ..ForestConfig::default()
                    },
                    ..StackingConfig::default()
                },
                ..CalibrationConfig::default()
            },
            ..TrainConfig::default()
        };
        train(&dataset, &config).expect("test dataset must train")
    }

    #[tokio::test]
    async fn predict_scores_a_complete_request() {
        let model = Arc::new(test_model());
        let body = json!({
            "carbonyl": 2.0,
            "methyl": 2.7,
            "hydroxyl_carbon": 3.3,
            "hydroxyl_oxygen": 4.1,
        });

        let response = predict(State(model.clone()), Json(body)).await.unwrap();
        assert!((0.0..=1.0).contains(&response.probability));
        assert_eq!(response.threshold, model.threshold);
        assert!(
            response.result == "High Risk of Cancer" || response.result == "Low Risk of Cancer"
        );
    }

    #[tokio::test]
    async fn predict_rejects_missing_fields() {
        let model = Arc::new(test_model());
        let body = json!({ "carbonyl": 2.0, "methyl": 2.7 });

        let (status, Json(err)) = predict(State(model), Json(body))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err.error.contains("hydroxyl_carbon"));
    }

    #[tokio::test]
    async fn predict_rejects_non_numeric_fields() {
        let model = Arc::new(test_model());
        let body = json!({
            "carbonyl": "not a number",
            "methyl": 2.7,
            "hydroxyl_carbon": 3.3,
            "hydroxyl_oxygen": 4.1,
        });

        let (status, _) = predict(State(model), Json(body)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
