use std::sync::Arc;
use std::time::Instant;

use crate::application::post_service::PostService;
use crate::application::user_service::UserService;
use crate::data::health::StorageHealth;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) user_service: Arc<UserService>,
    pub(crate) post_service: Arc<PostService>,
    pub(crate) health: Arc<dyn StorageHealth>,
    pub(crate) started_at: Instant,
    pub(crate) environment: Arc<str>,
}

impl AppState {
    pub(crate) fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        health: Arc<dyn StorageHealth>,
        environment: &str,
    ) -> Self {
        Self {
            user_service: Arc::new(UserService::new(users.clone())),
            post_service: Arc::new(PostService::new(posts, users)),
            health,
            started_at: Instant::now(),
            environment: Arc::from(environment),
        }
    }
}
