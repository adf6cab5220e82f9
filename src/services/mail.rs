//! 邮件通知
//!
//! 投递不在本服务内完成：[`OutboxMailer`] 只渲染邮件并写入日志。

use async_trait::async_trait;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::assignments::entities::Assignment;
use crate::models::classrooms::entities::Classroom;
use crate::models::invitations::entities::ClassroomInvitation;

/// 渲染好的邮件
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_classroom_invitation(
        &self,
        classroom: &Classroom,
        invitation: &ClassroomInvitation,
    ) -> Result<()>;

    async fn send_assignment_notification(
        &self,
        classroom: &Classroom,
        assignment: &Assignment,
        recipients: &[String],
    ) -> Result<()>;
}

pub struct OutboxMailer {
    sender: String,
    public_url: String,
    enabled: bool,
}

impl OutboxMailer {
    pub fn new(sender: &str, public_url: &str, enabled: bool) -> Self {
        Self {
            sender: sender.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
            enabled,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.mail.sender, &config.app.public_url, config.mail.enabled)
    }

    pub fn render_invitation(
        &self,
        classroom: &Classroom,
        invitation: &ClassroomInvitation,
    ) -> MailMessage {
        MailMessage {
            from: self.sender.clone(),
            to: invitation.email.clone(),
            subject: format!("Invitation to join {}", classroom.name),
            body: format!(
                "You have been invited to join the classroom \"{}\".\n\n\
                 Open {}/invitations/{} to accept or reject the invitation.\n\
                 The invitation expires on {}.",
                classroom.name,
                self.public_url,
                invitation.id,
                invitation.expiry_date.format("%Y-%m-%d %H:%M UTC"),
            ),
        }
    }

    pub fn render_assignment(
        &self,
        classroom: &Classroom,
        assignment: &Assignment,
        recipient: &str,
    ) -> MailMessage {
        let due = assignment
            .due_date
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "no due date".to_string());
        MailMessage {
            from: self.sender.clone(),
            to: recipient.to_string(),
            subject: format!("New assignment in {}: {}", classroom.name, assignment.name),
            body: format!(
                "Your team has been invited to the assignment \"{}\" (due: {}).\n\n\
                 Open {}/classrooms/{}/assignments/{} to accept it.",
                assignment.name, due, self.public_url, classroom.id, assignment.id,
            ),
        }
    }

    fn deliver(&self, message: &MailMessage) {
        if !self.enabled {
            return;
        }
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "Outgoing mail:\n{}",
            message.body
        );
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send_classroom_invitation(
        &self,
        classroom: &Classroom,
        invitation: &ClassroomInvitation,
    ) -> Result<()> {
        self.deliver(&self.render_invitation(classroom, invitation));
        Ok(())
    }

    async fn send_assignment_notification(
        &self,
        classroom: &Classroom,
        assignment: &Assignment,
        recipients: &[String],
    ) -> Result<()> {
        for recipient in recipients.iter().filter(|r| !r.is_empty()) {
            self.deliver(&self.render_assignment(classroom, assignment, recipient));
        }
        Ok(())
    }
}
