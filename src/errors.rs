use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum UxlogError {
    BufferUnavailable(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    DateParse(String),
    WorkerStopped(String),
}

impl UxlogError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            UxlogError::BufferUnavailable(_) => "E001",
            UxlogError::DatabaseConfig(_) => "E003",
            UxlogError::DatabaseConnection(_) => "E004",
            UxlogError::DatabaseOperation(_) => "E005",
            UxlogError::Validation(_) => "E007",
            UxlogError::NotFound(_) => "E008",
            UxlogError::Serialization(_) => "E009",
            UxlogError::DateParse(_) => "E012",
            UxlogError::WorkerStopped(_) => "E014",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            UxlogError::BufferUnavailable(_) => "Buffer Unavailable",
            UxlogError::DatabaseConfig(_) => "Database Configuration Error",
            UxlogError::DatabaseConnection(_) => "Database Connection Error",
            UxlogError::DatabaseOperation(_) => "Database Operation Error",
            UxlogError::Validation(_) => "Validation Error",
            UxlogError::NotFound(_) => "Resource Not Found",
            UxlogError::Serialization(_) => "Serialization Error",
            UxlogError::DateParse(_) => "Date Parse Error",
            UxlogError::WorkerStopped(_) => "Worker Stopped",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            UxlogError::BufferUnavailable(msg) => msg,
            UxlogError::DatabaseConfig(msg) => msg,
            UxlogError::DatabaseConnection(msg) => msg,
            UxlogError::DatabaseOperation(msg) => msg,
            UxlogError::Validation(msg) => msg,
            UxlogError::NotFound(msg) => msg,
            UxlogError::Serialization(msg) => msg,
            UxlogError::DateParse(msg) => msg,
            UxlogError::WorkerStopped(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            UxlogError::Validation(_) | UxlogError::Serialization(_) => StatusCode::BAD_REQUEST,
            UxlogError::NotFound(_) => StatusCode::NOT_FOUND,
            UxlogError::BufferUnavailable(_)
            | UxlogError::DatabaseConnection(_)
            | UxlogError::WorkerStopped(_) => StatusCode::SERVICE_UNAVAILABLE,
            UxlogError::DatabaseConfig(_)
            | UxlogError::DatabaseOperation(_)
            | UxlogError::DateParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for UxlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for UxlogError {}

// 便捷的构造函数
impl UxlogError {
    pub fn buffer_unavailable<T: Into<String>>(msg: T) -> Self {
        UxlogError::BufferUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        UxlogError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        UxlogError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        UxlogError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        UxlogError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        UxlogError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        UxlogError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        UxlogError::DateParse(msg.into())
    }

    pub fn worker_stopped<T: Into<String>>(msg: T) -> Self {
        UxlogError::WorkerStopped(msg.into())
    }

    /// 是否为可由降级路径恢复的临时故障
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UxlogError::BufferUnavailable(_) | UxlogError::DatabaseConnection(_)
        )
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for UxlogError {
    fn from(err: sea_orm::DbErr) -> Self {
        UxlogError::DatabaseOperation(err.to_string())
    }
}

impl From<redis::RedisError> for UxlogError {
    fn from(err: redis::RedisError) -> Self {
        UxlogError::BufferUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for UxlogError {
    fn from(err: serde_json::Error) -> Self {
        UxlogError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for UxlogError {
    fn from(err: chrono::ParseError) -> Self {
        UxlogError::DateParse(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for UxlogError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        UxlogError::BufferUnavailable("operation timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, UxlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = UxlogError::not_found("Project not found: 42");
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "E008");
        assert_eq!(err.message(), "Project not found: 42");
    }

    #[test]
    fn test_format_simple() {
        let err = UxlogError::validation("Invalid email format");
        assert_eq!(err.format_simple(), "Validation Error: Invalid email format");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_transient_errors() {
        assert!(UxlogError::buffer_unavailable("connection refused").is_transient());
        assert!(!UxlogError::not_found("missing").is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: UxlogError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, UxlogError::Serialization(_)));
    }
}
