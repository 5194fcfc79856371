//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，每个变体携带错误代码、类型名称和 HTTP 状态码。

use std::fmt;

use actix_web::http::StatusCode;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - status() 方法 - 返回对应的 HTTP 状态码
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_coursehub_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum CourseHubError {
            $($variant(String),)*
        }

        impl CourseHubError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(CourseHubError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(CourseHubError::$variant(_) => $type_name,)*
                }
            }

            /// 获取 HTTP 状态码
            pub fn status(&self) -> StatusCode {
                let raw: u16 = match self {
                    $(CourseHubError::$variant(_) => $status,)*
                };
                StatusCode::from_u16(raw).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(CourseHubError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl CourseHubError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        CourseHubError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_coursehub_errors! {
    CacheConnection("E001", "Cache Connection Error", 500),
    CachePluginNotFound("E002", "Cache Plugin Not Found", 500),
    DatabaseConfig("E003", "Database Configuration Error", 500),
    DatabaseConnection("E004", "Database Connection Error", 500),
    DatabaseOperation("E005", "Database Operation Error", 500),
    FileOperation("E006", "File Operation Error", 500),
    Validation("E007", "Validation Error", 400),
    NotFound("E008", "Resource Not Found", 404),
    Serialization("E009", "Serialization Error", 500),
    Authentication("E010", "Authentication Error", 401),
    Forbidden("E011", "Forbidden", 403),
    Conflict("E012", "Conflict", 409),
    Upstream("E013", "Upstream Service Error", 502),
}

impl CourseHubError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于服务端内部错误
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error() && !matches!(self, CourseHubError::Upstream(_))
    }
}

impl fmt::Display for CourseHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CourseHubError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for CourseHubError {
    fn from(err: sea_orm::DbErr) -> Self {
        CourseHubError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for CourseHubError {
    fn from(err: std::io::Error) -> Self {
        CourseHubError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CourseHubError {
    fn from(err: serde_json::Error) -> Self {
        CourseHubError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CourseHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CourseHubError::cache_connection("test").code(), "E001");
        assert_eq!(CourseHubError::database_config("test").code(), "E003");
        assert_eq!(CourseHubError::validation("test").code(), "E007");
        assert_eq!(CourseHubError::conflict("test").code(), "E012");
    }

    #[test]
    fn test_error_status() {
        assert_eq!(CourseHubError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(CourseHubError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(CourseHubError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(CourseHubError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(CourseHubError::upstream("x").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            CourseHubError::authentication("x").status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            CourseHubError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            CourseHubError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_internal_classification() {
        assert!(CourseHubError::database_operation("boom").is_internal());
        assert!(!CourseHubError::upstream("gateway").is_internal());
        assert!(!CourseHubError::not_found("course").is_internal());
    }

    #[test]
    fn test_format_simple() {
        let err = CourseHubError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}
