use crate::{
    db::DbPool,
    entities::group::{self, Entity as GroupEntity},
    entities::group_membership::{ActiveModel as MembershipActiveModel, Entity as MembershipEntity},
    entities::group_request::{
        self, ActiveModel as GroupRequestActiveModel, Entity as GroupRequestEntity,
        Model as GroupRequestModel, RequestStatus,
    },
    entities::user,
    errors::ServiceError,
    services::users::UserResponse,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, LoaderTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Response types for the group request workflow

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupRequestModel> for GroupRequestResponse {
    fn from(model: GroupRequestModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            group_id: model.group_id,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Slim group projection attached to listed requests
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub master: Uuid,
}

/// A pending request as seen by the group master, with the requesting user
/// and the group resolved
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupRequestListItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<UserResponse>,
    pub group: GroupSummary,
}

/// Service implementing the join-request workflow: request, list for the
/// master, accept, reject.
#[derive(Clone)]
pub struct GroupRequestService {
    db: Arc<DbPool>,
}

impl GroupRequestService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Files a join request for a user.
    ///
    /// Fails with NotFound when the group does not exist, Conflict when a
    /// request for the pair already exists, and UnprocessableEntity when the
    /// user already plays in the group. The unique `(user_id, group_id)`
    /// index backs the duplicate check under concurrency.
    #[instrument(skip(self), fields(group_id = %group_id, user_id = %user_id))]
    pub async fn request_join(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupRequestResponse, ServiceError> {
        let db = &*self.db;

        GroupEntity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        let existing = GroupRequestEntity::find()
            .filter(group_request::Column::UserId.eq(user_id))
            .filter(group_request::Column::GroupId.eq(group_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "group request already exists".to_string(),
            ));
        }

        let already_member = MembershipEntity::find_by_id((group_id, user_id))
            .one(db)
            .await?
            .is_some();
        if already_member {
            return Err(ServiceError::UnprocessableEntity(
                "user is already in the group".to_string(),
            ));
        }

        let now = Utc::now();
        let request_id = Uuid::new_v4();
        let model = GroupRequestActiveModel {
            id: Set(request_id),
            user_id: Set(user_id),
            group_id: Set(group_id),
            status: Set(RequestStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict("group request already exists".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        info!(request_id = %request_id, "Group request created");

        Ok(model.into())
    }

    /// Lists a group's requests for its master.
    ///
    /// The `master` parameter is required (UnprocessableEntity otherwise).
    /// When the group does not exist or its master differs from the supplied
    /// id the result is an empty list, not an error.
    #[instrument(skip(self), fields(group_id = %group_id))]
    pub async fn list_for_master(
        &self,
        group_id: Uuid,
        master: Option<Uuid>,
    ) -> Result<Vec<GroupRequestListItem>, ServiceError> {
        let master = master.ok_or_else(|| {
            ServiceError::UnprocessableEntity("master query parameter is required".to_string())
        })?;

        let db = &*self.db;

        let group = match GroupEntity::find_by_id(group_id)
            .filter(group::Column::Master.eq(master))
            .one(db)
            .await?
        {
            Some(group) => group,
            None => return Ok(Vec::new()),
        };

        let requests = GroupRequestEntity::find()
            .filter(group_request::Column::GroupId.eq(group_id))
            .order_by_asc(group_request::Column::CreatedAt)
            .all(db)
            .await?;

        let users = requests.load_one(user::Entity, db).await?;

        let items = requests
            .into_iter()
            .zip(users)
            .map(|(request, request_user)| GroupRequestListItem {
                id: request.id,
                user_id: request.user_id,
                group_id: request.group_id,
                status: request.status,
                created_at: request.created_at,
                updated_at: request.updated_at,
                user: request_user.map(Into::into),
                group: GroupSummary {
                    id: group.id,
                    name: group.name.clone(),
                    master: group.master,
                },
            })
            .collect();

        Ok(items)
    }

    /// Accepts a pending request: the status transition and the membership
    /// creation are one atomic unit.
    ///
    /// A request that is no longer pending (already accepted) is NotFound,
    /// so a second accept of the same id fails.
    #[instrument(skip(self), fields(group_id = %group_id, request_id = %request_id))]
    pub async fn accept(
        &self,
        group_id: Uuid,
        request_id: Uuid,
    ) -> Result<GroupRequestResponse, ServiceError> {
        let db = &*self.db;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, request_id = %request_id, "Failed to start transaction for request acceptance");
            ServiceError::DatabaseError(e)
        })?;

        GroupEntity::find_by_id(group_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        let request = GroupRequestEntity::find_by_id(request_id)
            .filter(group_request::Column::GroupId.eq(group_id))
            .filter(group_request::Column::Status.eq(RequestStatus::Pending))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(request_id = %request_id, "No pending request to accept");
                ServiceError::NotFound("group request".to_string())
            })?;

        let requesting_user = request.user_id;

        let mut active_model: GroupRequestActiveModel = request.into();
        active_model.status = Set(RequestStatus::Accepted);
        active_model.updated_at = Set(Utc::now());
        let accepted = active_model.update(&txn).await?;

        let membership_insert = MembershipActiveModel {
            group_id: Set(group_id),
            user_id: Set(requesting_user),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await;
        match membership_insert {
            Ok(_) => {}
            // The user can already be on the roster when a stale request is
            // accepted after a direct attach; accepting stays idempotent on
            // the membership side.
            Err(DbErr::RecordNotInserted) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
            Err(e) => return Err(ServiceError::DatabaseError(e)),
        }

        txn.commit().await?;

        info!(request_id = %accepted.id, user_id = %requesting_user, "Group request accepted");

        Ok(accepted.into())
    }

    /// Rejects a pending request by deleting it. Re-requesting later stays
    /// possible because no rejection record is kept.
    #[instrument(skip(self), fields(group_id = %group_id, request_id = %request_id))]
    pub async fn reject(&self, group_id: Uuid, request_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;

        GroupEntity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        let request = GroupRequestEntity::find_by_id(request_id)
            .filter(group_request::Column::GroupId.eq(group_id))
            .filter(group_request::Column::Status.eq(RequestStatus::Pending))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group request".to_string()))?;

        request.delete(db).await?;

        info!(request_id = %request_id, "Group request rejected");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_to_response_conversion() {
        let now = Utc::now();
        let model = GroupRequestModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let response: GroupRequestResponse = model.clone().into();
        assert_eq!(response.id, model.id);
        assert_eq!(response.user_id, model.user_id);
        assert_eq!(response.group_id, model.group_id);
        assert_eq!(response.status, RequestStatus::Pending);
    }

    #[test]
    fn request_status_serializes_in_upper_case() {
        let pending = serde_json::to_value(RequestStatus::Pending).unwrap();
        assert_eq!(pending, serde_json::json!("PENDING"));

        let accepted = serde_json::to_value(RequestStatus::Accepted).unwrap();
        assert_eq!(accepted, serde_json::json!("ACCEPTED"));
    }
}
