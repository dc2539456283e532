//! Comment entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    #[sea_orm(indexed)]
    pub created: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for yatube_core::domain::Comment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            text: model.text,
            post_id: model.post_id,
            author_id: model.author_id,
            created: model.created.into(),
        }
    }
}

impl From<yatube_core::domain::Comment> for ActiveModel {
    fn from(comment: yatube_core::domain::Comment) -> Self {
        Self {
            id: Set(comment.id),
            text: Set(comment.text),
            post_id: Set(comment.post_id),
            author_id: Set(comment.author_id),
            created: Set(comment.created.into()),
        }
    }
}
