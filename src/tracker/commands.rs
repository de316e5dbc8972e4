use serde::{Deserialize, Serialize};

use crate::models::{PageContent, PageMetadata, Session, SiteVisit};

use super::{controller::TrackerController, state::FocusedPage, summary::SessionSummary};

/// Messages accepted from the UI/host layer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    StartSession {
        task: String,
        /// Page focused when the session starts, if the host knows it.
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    EndSession,
    GetCurrentSite,
    ToggleClassification,
    ReportContent {
        url: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        metadata: PageMetadata,
    },
    Navigate {
        url: String,
        #[serde(default)]
        title: String,
    },
    GetSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "response", rename_all = "camelCase")]
pub enum CommandResponse {
    SessionStarted {
        session: Session,
    },
    SessionEnded {
        summary: SessionSummary,
    },
    CurrentSite {
        site: Option<SiteVisit>,
    },
    Toggled {
        #[serde(rename = "isProductive")]
        is_productive: bool,
    },
    NoCurrentSite,
    ContentReported {
        accepted: bool,
    },
    Navigated {
        tracked: bool,
    },
    Summary {
        summary: SessionSummary,
    },
}

pub async fn handle_command(
    controller: &TrackerController,
    command: Command,
) -> Result<CommandResponse, String> {
    match command {
        Command::StartSession { task, url, title } => {
            let focused = url.map(|url| FocusedPage {
                url,
                title: title.unwrap_or_default(),
            });
            let session = controller
                .start_session(&task, focused)
                .await
                .map_err(|e| e.to_string())?;
            Ok(CommandResponse::SessionStarted { session })
        }
        Command::EndSession => Ok(CommandResponse::SessionEnded {
            summary: controller.end_session().await,
        }),
        Command::GetCurrentSite => Ok(CommandResponse::CurrentSite {
            site: controller.current_site().await,
        }),
        Command::ToggleClassification => Ok(match controller.toggle_classification().await {
            Some(is_productive) => CommandResponse::Toggled { is_productive },
            None => CommandResponse::NoCurrentSite,
        }),
        Command::ReportContent {
            url,
            title,
            content,
            metadata,
        } => {
            let accepted = controller
                .report_content(
                    &url,
                    PageContent {
                        title,
                        full_text: content,
                        metadata,
                    },
                )
                .await;
            Ok(CommandResponse::ContentReported { accepted })
        }
        Command::Navigate { url, title } => Ok(CommandResponse::Navigated {
            tracked: controller.navigate(&url, &title).await,
        }),
        Command::GetSummary => Ok(CommandResponse::Summary {
            summary: controller.summary().await,
        }),
    }
}
