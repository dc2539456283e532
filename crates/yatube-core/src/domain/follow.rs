use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Follow edge: `user` receives `author`'s posts in their follow feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
}

impl Follow {
    /// Build an edge, refusing self-follows.
    pub fn between(user_id: Uuid, author_id: Uuid) -> Option<Self> {
        (user_id != author_id).then(|| Self {
            id: Uuid::new_v4(),
            user_id,
            author_id,
        })
    }
}
