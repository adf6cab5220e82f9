use serde::Serialize;

/// 业务错误码，按领域分段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用 1000-1999
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    CsrfTokenInvalid = 1010,

    // 认证 2000-2999
    AuthFailed = 2000,
    OAuthStateMismatch = 2001,

    // 课堂 3000-3099
    ClassroomNotFound = 3000,
    ClassroomPermissionDenied = 3001,
    ClassroomArchived = 3002,
    ClassroomCreationFailed = 3003,
    ClassroomUpdateFailed = 3004,
    ClassroomDeleteFailed = 3005,
    ClassroomArchiveFailed = 3006,

    // 成员 3100-3199
    MemberNotFound = 3100,
    MemberUpdateFailed = 3101,
    MemberRemoveFailed = 3102,

    // 团队 4000-4999
    TeamNotFound = 4000,
    TeamCreationFailed = 4001,
    TeamFull = 4002,
    TeamLimitReached = 4003,
    TeamHasProjects = 4004,
    TeamUpdateFailed = 4005,
    AlreadyInTeam = 4006,

    // 作业 5000-5099
    AssignmentNotFound = 5000,
    AssignmentCreationFailed = 5001,
    AssignmentUpdateFailed = 5002,
    AssignmentLocked = 5003,
    AssignmentClosed = 5004,
    AssignmentAcceptFailed = 5005,
    TemplateProjectNotFound = 5006,

    // 作业项目 5100-5199
    ProjectNotFound = 5100,
    ProjectNotVisible = 5101,
    PipelineNotFound = 5102,
    ProjectNotAccepted = 5103,

    // 邀请 6000-6999
    InvitationNotFound = 6000,
    InvitationExpired = 6001,
    InvitationNotPending = 6002,
    InvitationEmailMismatch = 6003,
    InvitationCreationFailed = 6004,

    // 评分 7000-7999
    RubricNotFound = 7000,
    GradingFailed = 7001,
    ScoreOutOfRange = 7002,

    // GitLab 8000-8999
    GitLabError = 8000,
}
