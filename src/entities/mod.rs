pub mod blog;
pub mod blog_tag;
pub mod category;
pub mod comment;
pub mod newsletter_subscriber;
pub mod password_reset_token;
pub mod tag;
pub mod user;
