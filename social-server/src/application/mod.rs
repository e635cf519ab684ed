pub(crate) mod password;
pub(crate) mod post_service;
pub(crate) mod user_service;
