// Terminal chat session: one conversation driven from stdin.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::conversation::{Conversation, Role};
use crate::orchestrator::TurnOrchestrator;

const HISTORY_COMMAND: &str = "/history";
const QUIT_COMMAND: &str = "/quit";

fn label(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::Assistant => "ShopBot",
        Role::User => "You",
    }
}

async fn write_message<W: AsyncWrite + Unpin>(out: &mut W, role: Role, content: &str) -> Result<()> {
    out.write_all(format!("{}: {}\n\n", label(role), content.trim_end()).as_bytes()).await?;
    Ok(())
}

/// Runs the chat until `/quit` or end of input and returns the final
/// conversation. Failed turns print a generic notice and the session goes on.
pub async fn run_chat<R, W>(orchestrator: &TurnOrchestrator, input: R, mut out: W) -> Result<Conversation>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut conversation = orchestrator.new_conversation();
    info!(session = %conversation.id, "Starting chat session");

    if let Some(greeting) = conversation.last() {
        write_message(&mut out, greeting.role, &greeting.content).await?;
    }
    out.flush().await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == QUIT_COMMAND {
            break;
        }
        if text == HISTORY_COMMAND {
            for message in conversation.messages() {
                write_message(&mut out, message.role, &message.content).await?;
            }
            out.flush().await?;
            continue;
        }

        match orchestrator.handle_turn(text, &mut conversation).await {
            Ok(reply) => write_message(&mut out, Role::Assistant, &reply).await?,
            Err(e) => {
                error!(error = %e, "Turn failed");
                out.write_all(format!("! {}\n\n", e.user_message()).as_bytes()).await?;
            }
        }
        out.flush().await?;
    }

    info!(log_len = conversation.len(), "Chat session finished");
    Ok(conversation)
}
