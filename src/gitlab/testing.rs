//! 测试用的内存 GitLab：记录每次调用，可在第 n 次调用某操作时注入失败

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::models::{
    AccessLevel, GitLabGroup, GitLabProject, GitLabUser, GroupAccessToken, Pipeline, Runner,
    TestReportSummary,
};
use super::{GitLabApi, GitLabError, GitLabProvider, GitLabResult};
use crate::models::classrooms::entities::Classroom;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub detail: String,
}

#[derive(Default)]
struct FakeState {
    next_id: i64,
    groups: HashMap<i64, GitLabGroup>,
    missing_groups: HashSet<i64>,
    group_members: HashMap<(i64, i64), AccessLevel>,
    project_levels: HashMap<(i64, i64), AccessLevel>,
    projects: HashMap<i64, GitLabProject>,
    pipelines: HashMap<i64, (Pipeline, TestReportSummary)>,
    calls: Vec<Call>,
    counts: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, (usize, u16)>,
}

#[derive(Default)]
pub struct FakeGitLab {
    state: Mutex<FakeState>,
    rotate_delay: Duration,
}

impl FakeGitLab {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 轮换令牌时先等待一段时间，用于并发测试
    pub fn with_rotate_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            rotate_delay: delay,
            ..Default::default()
        })
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// 第 `nth` 次（从 1 开始）调用 `op` 时返回 500
    pub fn fail_on(&self, op: &'static str, nth: usize) {
        self.fail_on_with_status(op, nth, 500);
    }

    pub fn fail_on_with_status(&self, op: &'static str, nth: usize, status: u16) {
        self.lock().failures.insert(op, (nth, status));
    }

    pub fn set_access_level(&self, project_id: i64, user_id: i64, level: AccessLevel) {
        self.lock()
            .project_levels
            .insert((project_id, user_id), level);
    }

    pub fn access_level(&self, project_id: i64, user_id: i64) -> AccessLevel {
        self.lock()
            .project_levels
            .get(&(project_id, user_id))
            .copied()
            .unwrap_or(AccessLevel::NoPermissions)
    }

    pub fn group_member_level(&self, group_id: i64, user_id: i64) -> Option<AccessLevel> {
        self.lock().group_members.get(&(group_id, user_id)).copied()
    }

    pub fn mark_group_missing(&self, group_id: i64) {
        self.lock().missing_groups.insert(group_id);
    }

    pub fn add_project(&self, project: GitLabProject) {
        self.lock().projects.insert(project.id, project);
    }

    pub fn set_pipeline(&self, project_id: i64, pipeline: Pipeline, summary: TestReportSummary) {
        self.lock()
            .pipelines
            .insert(project_id, (pipeline, summary));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(|c| c.op).collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().counts.get(op).copied().unwrap_or(0)
    }

    fn enter(&self, op: &'static str, detail: String) -> GitLabResult<()> {
        let mut state = self.lock();
        state.calls.push(Call { op, detail });
        let count = state.counts.entry(op).or_insert(0);
        *count += 1;
        let n = *count;
        match state.failures.get(op) {
            Some((nth, status)) if *nth == n => Err(GitLabError::api(
                *status,
                format!("injected failure on {op} call #{n}"),
            )),
            _ => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        1000 + state.next_id
    }

    fn group(&self, id: i64, name: &str, description: &str, parent_id: Option<i64>) -> GitLabGroup {
        GitLabGroup {
            id,
            name: name.to_string(),
            path: format!("group-{id}"),
            full_path: format!("group-{id}"),
            description: Some(description.to_string()),
            web_url: format!("https://gitlab.test/groups/group-{id}"),
            parent_id,
        }
    }

    fn token(&self, id: i64, name: &str, expires_at: NaiveDate) -> GroupAccessToken {
        GroupAccessToken {
            id,
            name: name.to_string(),
            token: format!("glpat-fake-{id}"),
            expires_at: Some(expires_at),
            created_at: Some(chrono::Utc::now()),
        }
    }
}

#[async_trait]
impl GitLabApi for FakeGitLab {
    async fn get_current_user(&self) -> GitLabResult<GitLabUser> {
        self.enter("get_current_user", String::new())?;
        // 测试中没有 OAuth 用户
        Err(GitLabError::api(401, "401 Unauthorized"))
    }

    async fn get_group_by_id(&self, group_id: i64) -> GitLabResult<GitLabGroup> {
        self.enter("get_group_by_id", group_id.to_string())?;
        if self.lock().missing_groups.contains(&group_id) {
            return Err(GitLabError::api(404, "404 Group Not Found"));
        }
        let known = self.lock().groups.get(&group_id).cloned();
        Ok(known.unwrap_or_else(|| self.group(group_id, "group", "", None)))
    }

    async fn create_group(&self, name: &str, description: &str) -> GitLabResult<GitLabGroup> {
        self.enter("create_group", name.to_string())?;
        let group = self.group(self.next_id(), name, description, None);
        self.lock().groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn create_sub_group(
        &self,
        name: &str,
        parent_id: i64,
        description: &str,
    ) -> GitLabResult<GitLabGroup> {
        self.enter("create_sub_group", format!("{parent_id}/{name}"))?;
        let group = self.group(self.next_id(), name, description, Some(parent_id));
        self.lock().groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn change_group_name(&self, group_id: i64, name: &str) -> GitLabResult<GitLabGroup> {
        self.enter("change_group_name", format!("{group_id}:{name}"))?;
        let mut state = self.lock();
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| GitLabError::api(404, "404 Group Not Found"))?;
        group.name = name.to_string();
        Ok(group.clone())
    }

    async fn change_group_description(
        &self,
        group_id: i64,
        description: &str,
    ) -> GitLabResult<GitLabGroup> {
        self.enter("change_group_description", format!("{group_id}:{description}"))?;
        let mut state = self.lock();
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| GitLabError::api(404, "404 Group Not Found"))?;
        group.description = Some(description.to_string());
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: i64) -> GitLabResult<()> {
        self.enter("delete_group", group_id.to_string())?;
        self.lock().groups.remove(&group_id);
        Ok(())
    }

    async fn add_user_to_group(
        &self,
        group_id: i64,
        user_id: i64,
        level: AccessLevel,
    ) -> GitLabResult<()> {
        self.enter("add_user_to_group", format!("{group_id}:{user_id}:{level}"))?;
        self.lock().group_members.insert((group_id, user_id), level);
        Ok(())
    }

    async fn remove_user_from_group(&self, group_id: i64, user_id: i64) -> GitLabResult<()> {
        self.enter("remove_user_from_group", format!("{group_id}:{user_id}"))?;
        self.lock().group_members.remove(&(group_id, user_id));
        Ok(())
    }

    async fn get_access_level_of_user_in_project(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> GitLabResult<AccessLevel> {
        self.enter(
            "get_access_level_of_user_in_project",
            format!("{project_id}:{user_id}"),
        )?;
        Ok(self.access_level(project_id, user_id))
    }

    async fn remove_user_from_project(&self, project_id: i64, user_id: i64) -> GitLabResult<()> {
        self.enter("remove_user_from_project", format!("{project_id}:{user_id}"))?;
        match self.lock().project_levels.remove(&(project_id, user_id)) {
            Some(_) => Ok(()),
            None => Err(GitLabError::api(404, "404 Not found")),
        }
    }

    async fn change_user_access_level_in_project(
        &self,
        project_id: i64,
        user_id: i64,
        level: AccessLevel,
    ) -> GitLabResult<()> {
        self.enter(
            "change_user_access_level_in_project",
            format!("{project_id}:{user_id}:{level}"),
        )?;
        self.set_access_level(project_id, user_id, level);
        Ok(())
    }

    async fn create_group_access_token(
        &self,
        group_id: i64,
        name: &str,
        _level: AccessLevel,
        expires_at: NaiveDate,
    ) -> GitLabResult<GroupAccessToken> {
        self.enter("create_group_access_token", group_id.to_string())?;
        Ok(self.token(self.next_id(), name, expires_at))
    }

    async fn rotate_group_access_token(
        &self,
        group_id: i64,
        token_id: i64,
        expires_at: NaiveDate,
    ) -> GitLabResult<GroupAccessToken> {
        self.enter("rotate_group_access_token", format!("{group_id}:{token_id}"))?;
        if !self.rotate_delay.is_zero() {
            tokio::time::sleep(self.rotate_delay).await;
        }
        Ok(self.token(self.next_id(), "rotated", expires_at))
    }

    async fn fork_project(
        &self,
        project_id: i64,
        namespace_id: i64,
        name: &str,
        description: &str,
    ) -> GitLabResult<GitLabProject> {
        self.enter("fork_project", format!("{project_id}->{namespace_id}:{name}"))?;
        let id = self.next_id();
        let project = GitLabProject {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            path_with_namespace: format!("group-{namespace_id}/project-{id}"),
            web_url: format!("https://gitlab.test/group-{namespace_id}/project-{id}"),
            default_branch: Some("main".to_string()),
        };
        self.lock().projects.insert(id, project.clone());
        Ok(project)
    }

    async fn get_project_by_id(&self, project_id: i64) -> GitLabResult<GitLabProject> {
        self.enter("get_project_by_id", project_id.to_string())?;
        self.lock()
            .projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| GitLabError::api(404, "404 Project Not Found"))
    }

    async fn get_all_projects(&self, search: &str) -> GitLabResult<Vec<GitLabProject>> {
        self.enter("get_all_projects", search.to_string())?;
        let needle = search.to_lowercase();
        let mut projects: Vec<GitLabProject> = self
            .lock()
            .projects
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    async fn get_project_latest_pipeline(
        &self,
        project_id: i64,
        _git_ref: Option<&str>,
    ) -> GitLabResult<Pipeline> {
        self.enter("get_project_latest_pipeline", project_id.to_string())?;
        self.lock()
            .pipelines
            .get(&project_id)
            .map(|(p, _)| p.clone())
            .ok_or_else(|| GitLabError::api(404, "404 Not found"))
    }

    async fn get_project_latest_pipeline_test_report_summary(
        &self,
        project_id: i64,
        _git_ref: Option<&str>,
    ) -> GitLabResult<TestReportSummary> {
        self.enter(
            "get_project_latest_pipeline_test_report_summary",
            project_id.to_string(),
        )?;
        self.lock()
            .pipelines
            .get(&project_id)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| GitLabError::api(404, "404 Not found"))
    }

    async fn get_available_runners_for_gitlab(&self) -> GitLabResult<Vec<Runner>> {
        self.enter("get_available_runners_for_gitlab", String::new())?;
        Ok(vec![runner(1, "instance_type")])
    }

    async fn get_available_runners_for_group(&self, group_id: i64) -> GitLabResult<Vec<Runner>> {
        self.enter("get_available_runners_for_group", group_id.to_string())?;
        Ok(vec![runner(2, "group_type")])
    }
}

fn runner(id: i64, runner_type: &str) -> Runner {
    Runner {
        id,
        description: Some(format!("runner {id}")),
        name: None,
        paused: false,
        is_shared: runner_type == "instance_type",
        runner_type: runner_type.to_string(),
        online: Some(true),
        status: "online".to_string(),
    }
}

/// 所有身份都返回同一个 [`FakeGitLab`]
pub struct FakeProvider(pub Arc<FakeGitLab>);

impl GitLabProvider for FakeProvider {
    fn for_user(&self, _access_token: &SecretString) -> Arc<dyn GitLabApi> {
        self.0.clone()
    }

    fn for_classroom(&self, _classroom: &Classroom) -> Arc<dyn GitLabApi> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_failure_hits_only_the_nth_call() {
        let fake = FakeGitLab::new();
        fake.fail_on("change_user_access_level_in_project", 2);

        assert!(
            fake.change_user_access_level_in_project(1, 1, AccessLevel::Reporter)
                .await
                .is_ok()
        );
        let err = fake
            .change_user_access_level_in_project(1, 2, AccessLevel::Reporter)
            .await
            .expect_err("second call fails");
        assert_eq!(err.status(), Some(500));
        assert!(
            fake.change_user_access_level_in_project(1, 3, AccessLevel::Reporter)
                .await
                .is_ok()
        );
        assert_eq!(fake.count("change_user_access_level_in_project"), 3);
        // 失败的调用不修改状态
        assert_eq!(fake.access_level(1, 2), AccessLevel::NoPermissions);
    }
}
