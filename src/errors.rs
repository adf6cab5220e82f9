//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_gitclassrooms_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum GitClassroomsError {
            $($variant(String),)*
        }

        impl GitClassroomsError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(GitClassroomsError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(GitClassroomsError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(GitClassroomsError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl GitClassroomsError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        GitClassroomsError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_gitclassrooms_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Io("E006", "IO Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E011", "Date Parse Error"),
    Gitlab("E014", "GitLab Error"),
}

impl GitClassroomsError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GitClassroomsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GitClassroomsError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GitClassroomsError {
    fn from(err: sea_orm::DbErr) -> Self {
        GitClassroomsError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GitClassroomsError {
    fn from(err: std::io::Error) -> Self {
        GitClassroomsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GitClassroomsError {
    fn from(err: serde_json::Error) -> Self {
        GitClassroomsError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for GitClassroomsError {
    fn from(err: chrono::ParseError) -> Self {
        GitClassroomsError::DateParse(err.to_string())
    }
}

impl From<crate::gitlab::GitLabError> for GitClassroomsError {
    fn from(err: crate::gitlab::GitLabError) -> Self {
        GitClassroomsError::Gitlab(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GitClassroomsError>;
