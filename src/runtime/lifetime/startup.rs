use crate::cache::{ObjectCache, build_object_cache, register::get_object_cache_plugin};
use crate::errors::Result;
use crate::media::{MediaStore, create_media_store};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_random_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 默认管理员邮箱，可通过 ADMIN_EMAIL 覆盖
const DEFAULT_ADMIN_EMAIL: &str = "admin@coursehub.local";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub media: Arc<dyn MediaStore>,
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    match build_object_cache().await {
        Ok(cache) => Ok(cache),
        Err(e) => {
            warn!("Failed to create configured cache: {}", e);
            warn!("Falling back to Moka (in-memory) cache");
            let constructor = get_object_cache_plugin("moka").ok_or(e)?;
            Ok(Arc::from(constructor().await?))
        }
    }
}

/// 初始化管理员账号
///
/// 注册接口不允许创建管理员，因此库中没有管理员时在启动阶段创建一个。
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users_by_role(UserRole::Admin).await {
        Ok(count) if count > 0 => {
            debug!("Found {} admin account(s), skipping admin seed", count);
            return;
        }
        Ok(_) => {
            info!("No admin account found, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count admin accounts: {}, skipping admin seed", e);
            return;
        }
    }

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin = NewUser {
        name: "Administrator".to_string(),
        email,
        password_hash: Some(password_hash),
        role: UserRole::Admin,
    };

    match storage.create_user(admin).await {
        Ok(user) => info!(
            "Default admin account created (ID: {}, email: {})",
            user.id, user.email
        ),
        Err(e) => warn!("Failed to create admin account: {}", e),
    }
}

/// 准备服务器启动的上下文：存储、缓存、媒体存储与管理员账号
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    let media = create_media_store()
        .await
        .expect("Failed to initialize media store");
    warn!("Media store initialized");

    StartupContext {
        storage,
        cache,
        media,
    }
}
