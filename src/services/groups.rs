use crate::{
    db::DbPool,
    entities::group::{self, ActiveModel as GroupActiveModel, Entity as GroupEntity, Model as GroupModel},
    entities::group_membership::{
        self, ActiveModel as MembershipActiveModel, Entity as MembershipEntity,
    },
    entities::group_request::{self, Entity as GroupRequestEntity},
    entities::user::{self, Entity as UserEntity, Model as UserModel},
    errors::ServiceError,
    services::users::UserResponse,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Func, Query},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the group service

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "schedule is required"))]
    pub schedule: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "chronic is required"))]
    pub chronic: String,
    pub master: Uuid,
}

/// Partial update; `master` is deliberately absent - ownership is not
/// reassignable through this operation.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<String>,
    pub location: Option<String>,
    pub chronic: Option<String>,
}

/// Composable listing filter; both fields may be combined.
#[derive(Debug, Default, Clone)]
pub struct GroupFilter {
    pub member_user_id: Option<Uuid>,
    pub search_term: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub location: String,
    pub chronic: String,
    pub master: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub players: Vec<UserResponse>,
    pub master_user: Option<UserResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupListResponse {
    pub groups: Vec<GroupResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing session groups and their player rosters
#[derive(Clone)]
pub struct GroupService {
    db: Arc<DbPool>,
}

impl GroupService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a group and attaches the master as its first player. Both
    /// writes happen in one transaction so a group can never exist without
    /// its master on the roster.
    #[instrument(skip(self, request), fields(master = %request.master))]
    pub async fn create_group(
        &self,
        request: CreateGroupRequest,
    ) -> Result<GroupResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let master_user = UserEntity::find_by_id(request.master)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;

        let now = Utc::now();
        let group_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for group creation");
            ServiceError::DatabaseError(e)
        })?;

        let group_model = GroupActiveModel {
            id: Set(group_id),
            name: Set(request.name),
            description: Set(request.description),
            schedule: Set(request.schedule),
            location: Set(request.location),
            chronic: Set(request.chronic),
            master: Set(request.master),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        MembershipActiveModel {
            group_id: Set(group_id),
            user_id: Set(request.master),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(group_id = %group_id, master = %group_model.master, "Group created");

        let master_response: UserResponse = master_user.into();
        Ok(Self::build_response(
            group_model,
            vec![master_response.clone()],
            Some(master_response),
        ))
    }

    /// Merges the mutable fields into an existing group
    #[instrument(skip(self, request), fields(group_id = %group_id))]
    pub async fn update_group(
        &self,
        group_id: Uuid,
        request: UpdateGroupRequest,
    ) -> Result<GroupResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db;

        let group = GroupEntity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        let mut active_model: GroupActiveModel = group.into();
        if let Some(name) = request.name {
            active_model.name = Set(name);
        }
        if let Some(description) = request.description {
            active_model.description = Set(description);
        }
        if let Some(schedule) = request.schedule {
            active_model.schedule = Set(schedule);
        }
        if let Some(location) = request.location {
            active_model.location = Set(location);
        }
        if let Some(chronic) = request.chronic {
            active_model.chronic = Set(chronic);
        }
        active_model.updated_at = Set(Utc::now());

        let updated = active_model.update(db).await?;

        info!(group_id = %group_id, "Group updated");

        self.hydrate_group(updated).await
    }

    /// Deletes a group together with its memberships and join requests
    #[instrument(skip(self), fields(group_id = %group_id))]
    pub async fn delete_group(&self, group_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;

        let group = GroupEntity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, group_id = %group_id, "Failed to start transaction for group deletion");
            ServiceError::DatabaseError(e)
        })?;

        GroupRequestEntity::delete_many()
            .filter(group_request::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await?;

        MembershipEntity::delete_many()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await?;

        group.delete(&txn).await?;

        txn.commit().await?;

        info!(group_id = %group_id, "Group deleted");

        Ok(())
    }

    /// Detaches a player from a group. The master can never be removed this
    /// way; removing a user who is not on the roster is a no-op.
    #[instrument(skip(self), fields(group_id = %group_id, player_id = %player_id))]
    pub async fn remove_member(
        &self,
        group_id: Uuid,
        player_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        let group = GroupEntity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        if player_id == group.master {
            return Err(ServiceError::BadRequest(
                "cannot remove master from group".to_string(),
            ));
        }

        let result = MembershipEntity::delete_many()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .filter(group_membership::Column::UserId.eq(player_id))
            .exec(db)
            .await?;

        info!(
            group_id = %group_id,
            player_id = %player_id,
            removed = result.rows_affected,
            "Player removal processed"
        );

        Ok(())
    }

    /// Lists groups in creation order, optionally narrowed to those a user
    /// plays in and/or those whose name or description contains a term
    /// (case-insensitive).
    #[instrument(skip(self))]
    pub async fn list_groups(
        &self,
        filter: GroupFilter,
        page: u64,
        per_page: u64,
    ) -> Result<GroupListResponse, ServiceError> {
        let db = &*self.db;

        let mut query = GroupEntity::find().order_by_asc(group::Column::CreatedAt);

        if let Some(member_id) = filter.member_user_id {
            let membership_subquery = Query::select()
                .column(group_membership::Column::GroupId)
                .from(MembershipEntity)
                .and_where(Expr::col(group_membership::Column::UserId).eq(member_id))
                .to_owned();
            query = query.filter(group::Column::Id.in_subquery(membership_subquery));
        }

        if let Some(term) = filter.search_term.as_deref() {
            let pattern = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            GroupEntity,
                            group::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            GroupEntity,
                            group::Column::Description,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let groups = paginator.fetch_page(page.saturating_sub(1)).await?;

        let players = groups
            .load_many_to_many(UserEntity, MembershipEntity, db)
            .await?;

        let master_ids: Vec<Uuid> = groups.iter().map(|g| g.master).collect();
        let masters: HashMap<Uuid, UserModel> = UserEntity::find()
            .filter(user::Column::Id.is_in(master_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let group_responses = groups
            .into_iter()
            .zip(players)
            .map(|(group, group_players)| {
                let master_user = masters.get(&group.master).cloned().map(Into::into);
                Self::build_response(
                    group,
                    group_players.into_iter().map(Into::into).collect(),
                    master_user,
                )
            })
            .collect();

        Ok(GroupListResponse {
            groups: group_responses,
            total,
            page,
            per_page,
        })
    }

    /// Verifies the group exists and the acting user is its master.
    /// Lookup failure takes precedence over the ownership check.
    pub async fn authorize_master(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let group = GroupEntity::find_by_id(group_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("group".to_string()))?;

        if group.master != user_id {
            return Err(ServiceError::Forbidden(
                "only the group master may perform this action".to_string(),
            ));
        }

        Ok(())
    }

    async fn hydrate_group(&self, group: GroupModel) -> Result<GroupResponse, ServiceError> {
        let db = &*self.db;

        let players = group
            .find_related(UserEntity)
            .all(db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let master_user = UserEntity::find_by_id(group.master)
            .one(db)
            .await?
            .map(Into::into);

        Ok(Self::build_response(group, players, master_user))
    }

    fn build_response(
        model: GroupModel,
        players: Vec<UserResponse>,
        master_user: Option<UserResponse>,
    ) -> GroupResponse {
        GroupResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            schedule: model.schedule,
            location: model.location,
            chronic: model.chronic,
            master: model.master,
            created_at: model.created_at,
            updated_at: model.updated_at,
            players,
            master_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group() -> GroupModel {
        let now = Utc::now();
        GroupModel {
            id: Uuid::new_v4(),
            name: "Curse of Strahd".to_string(),
            description: "Weekly gothic horror campaign".to_string(),
            schedule: "Fridays 19:00".to_string(),
            location: "Roll20".to_string(),
            chronic: "The party has just reached Vallaki".to_string(),
            master: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn build_response_carries_roster_and_master() {
        let group = sample_group();
        let group_id = group.id;
        let master_id = group.master;

        let master = UserResponse {
            id: master_id,
            username: "dm".to_string(),
            email: "dm@example.com".to_string(),
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response =
            GroupService::build_response(group, vec![master.clone()], Some(master.clone()));

        assert_eq!(response.id, group_id);
        assert_eq!(response.master, master_id);
        assert_eq!(response.players.len(), 1);
        assert_eq!(response.players[0].id, master_id);
        assert_eq!(response.master_user.unwrap().id, master_id);
    }

    #[test]
    fn create_request_requires_all_fields() {
        let request = CreateGroupRequest {
            name: String::new(),
            description: "d".to_string(),
            schedule: "s".to_string(),
            location: "l".to_string(),
            chronic: "c".to_string(),
            master: Uuid::new_v4(),
        };
        assert!(request.validate().is_err());
    }
}
