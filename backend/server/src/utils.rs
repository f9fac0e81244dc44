use axum::body::Bytes;

use crate::{
    error::AppError::{self, MalformedPayload},
    models::VoteRequest,
};

pub fn get_vote_from_body(body: Bytes) -> Result<VoteRequest, AppError> {
    if body.is_empty() {
        return Ok(VoteRequest::default());
    }

    serde_json::from_slice(&body).map_err(|_| MalformedPayload)
}
