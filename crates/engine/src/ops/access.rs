use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, GroupRole, MemberStatus, ResultEngine, group_members, groups, profiles,
};

use super::Engine;

/// A membership row with its role/status strings parsed.
#[derive(Clone, Debug)]
pub(super) struct Membership {
    pub user_id: Uuid,
    pub status: MemberStatus,
}

impl TryFrom<group_members::Model> for Membership {
    type Error = EngineError;

    fn try_from(model: group_members::Model) -> Result<Self, Self::Error> {
        // No engine operation branches on the role yet, but a row with an
        // unknown role string is corrupt and must not pass authorization.
        GroupRole::try_from(model.role.as_str())?;
        Ok(Self {
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::InvalidId("invalid member id".to_string()))?,
            status: MemberStatus::try_from(model.status.as_str())?,
        })
    }
}

impl Engine {
    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))
    }

    async fn membership(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Option<Membership>> {
        let row =
            group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
                .one(db)
                .await?;
        row.map(Membership::try_from).transpose()
    }

    /// Read access: the user must have a membership row in the group,
    /// active or not (former members keep read access to their history).
    pub(super) async fn require_member_read(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Membership> {
        self.require_group(db, group_id).await?;
        self.membership(db, group_id, user_id)
            .await?
            .ok_or_else(|| EngineError::Unauthorized("not a member of this group".to_string()))
    }

    /// Write access: the acting user must be an **active** member.
    pub(super) async fn require_active_member(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Membership> {
        let membership = self.require_member_read(db, group_id, user_id).await?;
        if membership.status != MemberStatus::Active {
            return Err(EngineError::Unauthorized(
                "not an active member of this group".to_string(),
            ));
        }
        Ok(membership)
    }

    /// A payer or ower on a post must be a member of the post's group, but
    /// may be inactive: posts survive members leaving.
    pub(super) async fn require_participant(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        if self.membership(db, group_id, user_id).await?.is_none() {
            return Err(EngineError::KeyNotFound(
                "member not exists in group".to_string(),
            ));
        }
        Ok(())
    }

    /// Every membership row of the group, parsed, ordered by member id for
    /// deterministic output.
    pub(super) async fn group_roster(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<Membership>> {
        let rows: Vec<group_members::Model> = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .all(db)
            .await?;
        let mut roster = rows
            .into_iter()
            .map(Membership::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        roster.sort_by_key(|m| m.user_id);
        Ok(roster)
    }

    /// Display name for a member, falling back to the raw id when the
    /// profile is missing or empty.
    pub(super) async fn display_name(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<String> {
        let model = profiles::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?;
        Ok(match model {
            Some(model) => profiles::display_name(&model),
            None => user_id.to_string(),
        })
    }
}
