pub mod auth_model;
pub mod blog_model;
pub mod category_model;
pub mod comment_model;
pub mod newsletter_model;
pub mod tag_model;
pub mod user_model;
