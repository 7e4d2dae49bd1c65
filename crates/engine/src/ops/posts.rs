use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Post, PostHistory, PostSplit, ResultEngine, post_history, post_splits, posts,
    util::parse_uuid,
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_post(
        &self,
        db: &DatabaseTransaction,
        post_id: Uuid,
    ) -> ResultEngine<posts::Model> {
        posts::Entity::find_by_id(post_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("post not exists".to_string()))
    }

    pub(super) async fn post_split_rows(
        &self,
        db: &DatabaseTransaction,
        post_id: Uuid,
    ) -> ResultEngine<Vec<PostSplit>> {
        let rows: Vec<post_splits::Model> = post_splits::Entity::find()
            .filter(post_splits::Column::PostId.eq(post_id.to_string()))
            .order_by_asc(post_splits::Column::Id)
            .all(db)
            .await?;
        rows.into_iter().map(PostSplit::try_from).collect()
    }

    /// Domain post with its splits attached.
    pub(super) async fn load_post(
        &self,
        db: &DatabaseTransaction,
        model: posts::Model,
    ) -> ResultEngine<Post> {
        let post_id = parse_uuid(&model.id, "post")?;
        let mut post = Post::try_from(model)?;
        post.splits = self.post_split_rows(db, post_id).await?;
        Ok(post)
    }

    /// Appends one audit entry for a post. History is append-only; nothing
    /// in the engine updates or deletes these rows.
    pub(super) async fn append_history(
        &self,
        db: &DatabaseTransaction,
        post_id: Uuid,
        editor_id: Uuid,
        changes: serde_json::Value,
        at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let entry = post_history::ActiveModel {
            id: ActiveValue::NotSet,
            post_id: ActiveValue::Set(post_id.to_string()),
            editor_id: ActiveValue::Set(editor_id.to_string()),
            changes: ActiveValue::Set(changes),
            created_at: ActiveValue::Set(at),
        };
        entry.insert(db).await?;
        Ok(())
    }

    /// Returns a post with its splits. The user must be a member of the
    /// post's group.
    pub async fn post(&self, post_id: Uuid, user_id: Uuid) -> ResultEngine<Post> {
        with_tx!(self, |db_tx| {
            let model = self.require_post(&db_tx, post_id).await?;
            let group_id = parse_uuid(&model.group_id, "group")?;
            self.require_member_read(&db_tx, group_id, user_id).await?;
            self.load_post(&db_tx, model).await
        })
    }

    /// The group's feed: every post, newest first, splits attached.
    pub async fn group_posts(&self, group_id: Uuid, user_id: Uuid) -> ResultEngine<Vec<Post>> {
        with_tx!(self, |db_tx| {
            self.require_member_read(&db_tx, group_id, user_id).await?;

            let models: Vec<posts::Model> = posts::Entity::find()
                .filter(posts::Column::GroupId.eq(group_id.to_string()))
                .order_by_desc(posts::Column::CreatedAt)
                .order_by_desc(posts::Column::Id)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(self.load_post(&db_tx, model).await?);
            }
            Ok(out)
        })
    }

    /// The audit trail of a post, oldest first.
    pub async fn post_history(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Vec<PostHistory>> {
        with_tx!(self, |db_tx| {
            let model = self.require_post(&db_tx, post_id).await?;
            let group_id = parse_uuid(&model.group_id, "group")?;
            self.require_member_read(&db_tx, group_id, user_id).await?;

            let rows: Vec<post_history::Model> = post_history::Entity::find()
                .filter(post_history::Column::PostId.eq(post_id.to_string()))
                .order_by_asc(post_history::Column::CreatedAt)
                .order_by_asc(post_history::Column::Id)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(PostHistory::try_from).collect()
        })
    }
}
