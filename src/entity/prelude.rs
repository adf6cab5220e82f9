//! 预导入模块，方便使用

pub use super::assignment_projects::{
    ActiveModel as AssignmentProjectActiveModel, Entity as AssignmentProjects,
    Model as AssignmentProjectModel,
};
pub use super::assignment_rubrics::{
    ActiveModel as AssignmentRubricActiveModel, Entity as AssignmentRubrics,
};
pub use super::assignments::{
    ActiveModel as AssignmentActiveModel, Entity as Assignments, Model as AssignmentModel,
};
pub use super::classroom_invitations::{
    ActiveModel as InvitationActiveModel, Entity as ClassroomInvitations,
    Model as InvitationModel,
};
pub use super::classrooms::{
    ActiveModel as ClassroomActiveModel, Entity as Classrooms, Model as ClassroomModel,
};
pub use super::manual_grading_results::{
    ActiveModel as GradingResultActiveModel, Entity as ManualGradingResults,
};
pub use super::manual_grading_rubrics::{
    ActiveModel as RubricActiveModel, Entity as ManualGradingRubrics,
};
pub use super::teams::{ActiveModel as TeamActiveModel, Entity as Teams, Model as TeamModel};
pub use super::user_classrooms::{
    ActiveModel as UserClassroomActiveModel, Entity as UserClassrooms,
    Model as UserClassroomModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
