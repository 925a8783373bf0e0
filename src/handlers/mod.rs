pub mod auth_handler;
pub mod blog_handler;
pub mod category_handler;
pub mod comment_handler;
pub mod newsletter_handler;
pub mod tag_handler;
pub mod user_handler;
