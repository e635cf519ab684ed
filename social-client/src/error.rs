use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `social-client`.
pub enum SocialClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Операция требует идентификатор действующего пользователя.
    #[error("acting user is not set")]
    MissingActor,

    /// Некорректный запрос или ошибка валидации (400).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Действие запрещено, например правка чужого поста (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Запрошенный ресурс не найден (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Конфликт уникальности: логин или email заняты (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Хранилище сервера недоступно (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Прочие ошибки сервера.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP-статус ответа.
        status: u16,
        /// Сообщение из тела ответа.
        message: String,
    },
}

/// Результат операций `social-client`.
pub type SocialClientResult<T> = Result<T, SocialClientError>;

impl SocialClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("http status {status}"));
        match status {
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Self::InvalidRequest(message)
            }
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(message),
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            reqwest::StatusCode::CONFLICT => Self::Conflict(message),
            reqwest::StatusCode::SERVICE_UNAVAILABLE => Self::Unavailable(message),
            _ => Self::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }
}
