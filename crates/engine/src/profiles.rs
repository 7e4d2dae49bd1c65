//! Member profile entity.
//!
//! Profiles are owned by the account layer; the engine reads them for
//! display names only (simplification summaries).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Human-readable name for a profile, falling back to the id when the
/// profile carries no name.
pub(crate) fn display_name(model: &Model) -> String {
    let name = match (model.first_name.as_deref(), model.last_name.as_deref()) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.to_string(),
        (None, Some(last)) => last.to_string(),
        (None, None) => String::new(),
    };
    let name = name.trim().to_string();
    if name.is_empty() { model.id.clone() } else { name }
}
