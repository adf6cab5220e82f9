//! GitClassrooms - 基于 GitLab 的编程课堂管理后端
//!
//! 课堂对应 GitLab 组，团队对应子组，作业项目从模板项目派生。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis），保存会话
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `gitlab`: GitLab REST 与 OAuth 客户端
//! - `middlewares`: 会话、课堂解析与权限中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理与后台任务
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod gitlab;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
