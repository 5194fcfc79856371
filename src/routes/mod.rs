pub mod articles;

pub mod auth;

pub mod categories;

pub mod courses;

pub mod curriculum;

pub mod media;

pub mod purchases;

pub mod reviews;

pub mod search;

pub mod users;

pub use articles::configure_article_routes;
pub use auth::configure_auth_routes;
pub use categories::configure_category_routes;
pub use courses::configure_course_routes;
pub use curriculum::configure_curriculum_routes;
pub use media::configure_media_routes;
pub use purchases::configure_purchase_routes;
pub use reviews::configure_review_routes;
pub use search::configure_search_routes;
pub use users::configure_user_routes;
