pub mod api_response;
pub mod jwt_utils;
pub mod sanitize_utils;
pub mod slug_utils;
pub mod spam_utils;
pub mod validated_wrapper;
pub mod validator_utils;
