// ABOUTME: Session gatekeeper: get-or-create of the session a turn runs in.
// ABOUTME: A backend that creates nothing is a consistency failure, never a silent None.

use a2adk_agent::{Session, SessionService};
use anyhow::{anyhow, Result};

pub async fn resolve(
    sessions: &dyn SessionService,
    app_name: &str,
    user_id: &str,
    session_id: &str,
) -> Result<Session> {
    if let Some(session) = sessions.get_session(app_name, user_id, session_id).await? {
        return Ok(session);
    }

    tracing::info!(app_name, user_id, session_id, "Creating session");
    sessions
        .create_session(app_name, user_id, Some(session_id), None)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "Session service created no session for {}/{}/{}",
                app_name,
                user_id,
                session_id
            )
        })
}
