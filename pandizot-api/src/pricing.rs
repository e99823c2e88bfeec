use axum::{extract::State, Json};
use pandizot_catalog::PriceQuery;
use pandizot_core::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

const DEFAULT_SPEAKER_COUNT: i64 = 4;

/// Counts arrive as plain JSON numbers; range checks happen here so a bad
/// value gets a 400 with a readable message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputePriceRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub speaker_type: Option<String>,
    pub speaker_count: Option<i64>,
    pub tweeter_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ComputePriceResponse {
    pub price: i64,
    pub message: String,
}

impl ComputePriceRequest {
    fn into_query(self) -> Result<PriceQuery, AppError> {
        let required = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let (Some(brand), Some(model), Some(speaker_type)) =
            (required(self.brand), required(self.model), required(self.speaker_type))
        else {
            return Err(AppError::ValidationError(
                "brand, model and speakerType are required".to_string(),
            ));
        };

        let speaker_count = self.speaker_count.unwrap_or(DEFAULT_SPEAKER_COUNT);
        let tweeter_count = self.tweeter_count.unwrap_or(0);

        if speaker_count < 1 {
            return Err(AppError::ValidationError("speakerCount must be at least 1".to_string()));
        }
        if tweeter_count < 0 {
            return Err(AppError::ValidationError("tweeterCount must not be negative".to_string()));
        }
        let speaker_count = u32::try_from(speaker_count)
            .map_err(|_| AppError::ValidationError("speakerCount is too large".to_string()))?;
        let tweeter_count = u32::try_from(tweeter_count)
            .map_err(|_| AppError::ValidationError("tweeterCount is too large".to_string()))?;

        Ok(PriceQuery { brand, model, speaker_type, speaker_count, tweeter_count })
    }
}

/// POST /api/pricing/compute
pub async fn compute_price(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ComputePriceRequest>,
) -> Result<Json<ComputePriceResponse>, AppError> {
    let query = req.into_query()?;

    let price = state.pricing.compute_price(&query).await.map_err(|e| match e {
        CoreError::StorageError(msg) => AppError::LookupFailed(msg),
        other => other.into(),
    })?;

    Ok(Json(ComputePriceResponse {
        price,
        message: "Price computed.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(speakers: Option<i64>, tweeters: Option<i64>) -> ComputePriceRequest {
        ComputePriceRequest {
            brand: Some("Volkswagen".to_string()),
            model: Some("Golf".to_string()),
            speaker_type: Some("4x20".to_string()),
            speaker_count: speakers,
            tweeter_count: tweeters,
        }
    }

    #[test]
    fn test_counts_default() {
        let query = request(None, None).into_query().unwrap();
        assert_eq!(query.speaker_count, 4);
        assert_eq!(query.tweeter_count, 0);
    }

    #[test]
    fn test_invalid_counts_rejected() {
        assert!(request(Some(0), None).into_query().is_err());
        assert!(request(Some(-3), None).into_query().is_err());
        assert!(request(Some(4), Some(-1)).into_query().is_err());
        assert!(request(Some(1), Some(0)).into_query().is_ok());
    }

    #[test]
    fn test_oversized_counts_rejected() {
        let too_many = i64::from(u32::MAX) + 1;

        match request(Some(too_many), None).into_query() {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "speakerCount is too large"),
            other => panic!("unexpected result: {:?}", other.map(|q| q.speaker_count)),
        }
        match request(Some(4), Some(too_many)).into_query() {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "tweeterCount is too large"),
            other => panic!("unexpected result: {:?}", other.map(|q| q.tweeter_count)),
        }
        match request(Some(0), None).into_query() {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "speakerCount must be at least 1"),
            other => panic!("unexpected result: {:?}", other.map(|q| q.speaker_count)),
        }

        let query = request(Some(i64::from(u32::MAX)), None).into_query().unwrap();
        assert_eq!(query.speaker_count, u32::MAX);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let req = ComputePriceRequest { model: Some("  ".to_string()), ..request(None, None) };
        assert!(matches!(req.into_query(), Err(AppError::ValidationError(_))));
    }
}
