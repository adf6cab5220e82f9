//! SeaORM 实体定义
//!
//! 这些实体只在存储层内部使用，查询结果通过 `into_*` 转换为 models 中的业务类型。

pub mod prelude;

pub mod assignment_projects;
pub mod assignment_rubrics;
pub mod assignments;
pub mod classroom_invitations;
pub mod classrooms;
pub mod manual_grading_results;
pub mod manual_grading_rubrics;
pub mod teams;
pub mod user_classrooms;
pub mod users;
