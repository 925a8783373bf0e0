pub mod auth_service;
pub mod blog_service;
pub mod category_service;
pub mod comment_service;
pub mod email_service;
pub mod newsletter_service;
pub mod redis_service;
pub mod tag_service;
pub mod user_service;
