//! API Request and Response Types

use apistack_core::{Actor, ActorId, ActorNames};
use serde::{Deserialize, Serialize};

/// Body of create and update requests.
///
/// Both names default to empty so that a missing field is reported as
/// `MISSING_FIELD` by validation rather than as a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActorRequest {
    /// Actor first name
    #[serde(rename = "FirstName", alias = "first_name", default)]
    pub first_name: String,
    /// Actor last name
    #[serde(rename = "LastName", alias = "last_name", default)]
    pub last_name: String,
}

impl ActorRequest {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Trimmed name pair as stored.
    pub fn to_names(&self) -> ActorNames {
        ActorNames::new(self.first_name.trim(), self.last_name.trim())
    }
}

/// Response to a successful create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateActorResponse {
    /// Id assigned to the new actor
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: ActorId,
}

/// Response to a successful update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateActorResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: ActorId,
}

/// Response to a successful delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteActorResponse {
    pub message: String,
}

/// Response containing a list of actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListActorsResponse {
    /// Matching actors, possibly empty
    pub actors: Vec<Actor>,
}

/// Query string of the list endpoint.
///
/// Numbers are signed so that negative values reach validation and come
/// back as `INVALID_RANGE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListActorsParams {
    /// Case-insensitive substring matched against first or last name
    pub search: Option<String>,
    /// Maximum number of results (0 to 1000, 0 means no limit)
    pub limit: Option<i64>,
    /// Number of results to skip
    pub offset: Option<i64>,
    /// Sort by id descending when true
    pub order_by: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_request_accepts_both_spellings() -> Result<(), serde_json::Error> {
        let pascal: ActorRequest =
            serde_json::from_str(r#"{"FirstName":"Ada","LastName":"Lovelace"}"#)?;
        let snake: ActorRequest =
            serde_json::from_str(r#"{"first_name":"Ada","last_name":"Lovelace"}"#)?;
        assert_eq!(pascal, snake);
        assert_eq!(pascal.to_names(), ActorNames::new("Ada", "Lovelace"));
        Ok(())
    }

    #[test]
    fn test_actor_request_missing_fields_default_to_empty() -> Result<(), serde_json::Error> {
        let req: ActorRequest = serde_json::from_str(r#"{"FirstName":"Ada"}"#)?;
        assert_eq!(req.last_name, "");
        Ok(())
    }

    #[test]
    fn test_to_names_trims() {
        let req = ActorRequest::new("  Ada ", "Lovelace\n");
        assert_eq!(req.to_names(), ActorNames::new("Ada", "Lovelace"));
    }

    #[test]
    fn test_response_shapes() -> Result<(), serde_json::Error> {
        let created = serde_json::to_value(CreateActorResponse { id: ActorId::new(3) })?;
        assert_eq!(created, serde_json::json!({ "id": 3 }));

        let list = serde_json::to_value(ListActorsResponse { actors: vec![] })?;
        assert_eq!(list, serde_json::json!({ "actors": [] }));
        Ok(())
    }
}
