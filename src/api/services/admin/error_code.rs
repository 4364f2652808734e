//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::UxlogError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 项目错误
/// - 3000-3099: 订阅错误
/// - 4000-4099: 统计错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 项目错误 2000-2099
    ProjectNotFound = 2000,
    ProjectInvalid = 2001,

    // 订阅错误 3000-3099
    EmailInvalid = 3000,

    // 统计错误 4000-4099
    StatisticsQueryFailed = 4000,
    StatisticsInvalidDays = 4001,
}

impl From<&UxlogError> for ErrorCode {
    fn from(err: &UxlogError) -> Self {
        match err {
            UxlogError::Validation(_) | UxlogError::Serialization(_) => ErrorCode::BadRequest,
            // 目前只有项目会返回 NotFound
            UxlogError::NotFound(_) => ErrorCode::ProjectNotFound,
            UxlogError::DateParse(_) => ErrorCode::StatisticsQueryFailed,
            UxlogError::BufferUnavailable(_)
            | UxlogError::DatabaseConnection(_)
            | UxlogError::WorkerStopped(_) => ErrorCode::ServiceUnavailable,
            UxlogError::DatabaseConfig(_) | UxlogError::DatabaseOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}
