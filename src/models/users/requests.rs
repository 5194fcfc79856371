use super::entities::SocialLinks;
use serde::Deserialize;
use ts_rs::TS;

// 个人资料更新请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub social_links: Option<SocialLinks>,
}

// 存储层使用的用户创建参数
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: super::entities::UserRole,
}
