use super::entities::User;
use serde::Serialize;
use ts_rs::TS;

// 用户响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserResponse {
    pub user: User,
}

// 讲师公开信息（课程详情、评价等处展示）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub photo_url: Option<String>,
    pub headline: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            photo_url: user.photo_url.clone(),
            headline: user.headline.clone(),
        }
    }
}
