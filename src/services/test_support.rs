//! 处理函数测试的公共夹具：内存存储、假 GitLab、记录邮件，以及一个由用户 1 拥有的课堂

use actix_web::{HttpMessage, HttpRequest, test::TestRequest, web};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::gitlab::testing::{FakeGitLab, FakeProvider};
use crate::gitlab::{GitLabApi, GitLabProvider};
use crate::middlewares::{ClassroomContext, UserGitLab};
use crate::models::{
    assignments::entities::Assignment,
    classrooms::{entities::Classroom, requests::NewClassroom},
    projects::entities::{AssignmentProject, ProjectStatus},
    teams::entities::Team,
    user_classrooms::entities::Role,
    users::entities::User,
};
use crate::services::mail::{Mailer, testing::RecordingMailer};
use crate::storage::Storage;
use crate::storage::sea_orm_storage::test_support::{
    gitlab_user, memory_storage, new_assignment, new_classroom,
};

pub(crate) const OWNER_ID: i64 = 1;

pub(crate) struct Fixture {
    pub storage: Arc<dyn Storage>,
    pub fake: Arc<FakeGitLab>,
    pub provider: Arc<dyn GitLabProvider>,
    pub mailer: Arc<RecordingMailer>,
    pub owner: User,
    pub classroom: Classroom,
}

impl Fixture {
    pub async fn new() -> Self {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let fake = FakeGitLab::new();
        let provider: Arc<dyn GitLabProvider> = Arc::new(FakeProvider(fake.clone()));

        let owner = storage
            .upsert_user(gitlab_user(OWNER_ID, "owner"))
            .await
            .unwrap();
        let group = fake.create_group("SE", "course").await.unwrap();
        let classroom = storage
            .create_classroom(NewClassroom {
                gitlab_group_id: group.id,
                gitlab_web_url: group.web_url,
                ..new_classroom(OWNER_ID, "SE")
            })
            .await
            .unwrap();

        Self {
            storage,
            fake,
            provider,
            mailer: Arc::new(RecordingMailer::default()),
            owner,
            classroom,
        }
    }

    pub fn gitlab(&self) -> Arc<dyn GitLabApi> {
        self.fake.clone()
    }

    pub async fn user(&self, id: i64) -> User {
        self.storage
            .upsert_user(gitlab_user(id, &format!("user{id}")))
            .await
            .unwrap()
    }

    pub async fn member(&self, id: i64, role: Role) -> User {
        let user = self.user(id).await;
        self.storage
            .add_member(self.classroom.id, id, role)
            .await
            .unwrap();
        user
    }

    pub async fn promote(&self, id: i64, role: Role) {
        self.storage
            .update_member_role(self.classroom.id, id, role)
            .await
            .unwrap();
    }

    /// 在假 GitLab 中建子组，并把给定用户作为学生加入团队
    pub async fn team(&self, name: &str, students: &[i64]) -> Team {
        let group = self
            .fake
            .create_sub_group(name, self.classroom.gitlab_group_id, "")
            .await
            .unwrap();
        let team = self
            .storage
            .create_team(self.classroom.id, name, group.id, &group.web_url)
            .await
            .unwrap();
        for id in students {
            self.member(*id, Role::Student).await;
            self.storage
                .update_member_team(self.classroom.id, *id, Some(team.id))
                .await
                .unwrap();
        }
        team
    }

    pub async fn assignment(&self, due_date: Option<DateTime<Utc>>) -> Assignment {
        self.storage
            .create_assignment(new_assignment(self.classroom.id, due_date))
            .await
            .unwrap()
    }

    pub async fn pending_project(&self, assignment: &Assignment, team: &Team) -> AssignmentProject {
        self.storage
            .create_assignment_projects(assignment.id, &[team.id])
            .await
            .unwrap()
            .remove(0)
    }

    pub async fn accepted_project(
        &self,
        assignment: &Assignment,
        team: &Team,
        gitlab_project_id: i64,
    ) -> AssignmentProject {
        let project = self.pending_project(assignment, team).await;
        self.storage
            .update_project_status(
                project.id,
                ProjectStatus::Accepted,
                Some(gitlab_project_id),
                Some(format!("https://gitlab.test/projects/{gitlab_project_id}")),
            )
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn reload_classroom(&self) -> Classroom {
        self.storage
            .get_classroom_by_id(self.classroom.id)
            .await
            .unwrap()
            .unwrap()
    }

    fn base_request(&self) -> TestRequest {
        let mailer: Arc<dyn Mailer> = self.mailer.clone();
        TestRequest::default()
            .app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(self.provider.clone()))
            .app_data(web::Data::new(mailer))
    }

    /// 已登录但没有课堂上下文的请求
    pub async fn user_request(&self, user_id: i64) -> HttpRequest {
        let user = self
            .storage
            .get_user_by_id(user_id)
            .await
            .unwrap()
            .unwrap();
        let req = self.base_request().to_http_request();
        req.extensions_mut().insert(user);
        req.extensions_mut().insert(UserGitLab(self.gitlab()));
        req
    }

    /// 以某个成员的身份访问当前课堂，相当于经过了 RequireSession 和 ResolveClassroom
    pub async fn request_as(&self, user_id: i64) -> HttpRequest {
        let req = self.user_request(user_id).await;
        let membership = self
            .storage
            .get_membership(self.classroom.id, user_id)
            .await
            .unwrap()
            .expect("caller is a member");
        req.extensions_mut().insert(ClassroomContext {
            classroom: self.reload_classroom().await,
            membership,
            gitlab: self.gitlab(),
        });
        req
    }

    pub async fn owner_request(&self) -> HttpRequest {
        self.request_as(OWNER_ID).await
    }
}

/// 读取响应体 JSON
pub(crate) async fn body_json(resp: actix_web::HttpResponse) -> serde_json::Value {
    let bytes = actix_web::body::to_bytes(resp.into_body())
        .await
        .unwrap_or_default();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// 读取响应体文本
pub(crate) async fn body_text(resp: actix_web::HttpResponse) -> String {
    let bytes = actix_web::body::to_bytes(resp.into_body())
        .await
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
