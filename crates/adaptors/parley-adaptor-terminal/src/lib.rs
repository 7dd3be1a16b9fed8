//! Terminal front end for Parley chat sessions
//!
//! Reads one line at a time, sends chat text through a [`ChatSession`] and
//! redraws the projected view after every change. Slash commands toggle the
//! thinking display and expand individual panels; see [`command::HELP_TEXT`].
//!
//! The transport call runs on its own task so the input loop stays live
//! while a reply is outstanding. Chat text typed during that time is refused.

pub mod command;
pub mod layout;

use command::{Command, HELP_TEXT};
use parley_core::{
    render_session, ChatReply, ChatRequest, ChatSession, Disclosure, ParleyError, Result, Role,
    Uuid, ViewOptions,
};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Notice printed when chat text arrives while a reply is outstanding
pub const BUSY_TEXT: &str = "Still waiting for the last reply, please hold on.";

#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Columns available for the transcript
    pub width: usize,
    /// Initial state of the show-thinking switch
    pub show_thinking: bool,
    /// Printed before each input line
    pub prompt: String,
    /// How long a reply's thinking stays on the indicator before the
    /// message itself is shown
    pub reveal_delay: Duration,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            width: 80,
            show_thinking: true,
            prompt: "> ".to_string(),
            reveal_delay: Duration::from_millis(500),
        }
    }
}

/// What the run loop should do after one input line
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Post this request on a background task
    Send(ChatRequest),
    /// View state changed; draw again
    Redraw,
    /// Print a notice
    Print(String),
    /// Probe the service and print the result
    Health,
    /// Leave the loop
    Quit,
    /// Nothing to do
    Idle,
}

pub struct TerminalChat {
    config: TerminalConfig,
    session: ChatSession,
    options: ViewOptions,
    disclosure: Disclosure,
}

impl TerminalChat {
    pub fn new(config: TerminalConfig, session: ChatSession) -> Self {
        let options = ViewOptions {
            show_thinking: config.show_thinking,
        };
        Self {
            config,
            session,
            options,
            disclosure: Disclosure::default(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    /// Current transcript as text
    pub fn screen(&self) -> String {
        let view = render_session(&self.session, self.options, &self.disclosure);
        layout::format_view(&view, self.config.width).join("\n")
    }

    fn message_at(&self, number: usize) -> Option<(Uuid, Role, bool, usize)> {
        let message = self.session.messages().get(number.checked_sub(1)?)?;
        Some((
            message.id,
            message.role,
            message.has_thinking(),
            message.tool_results.as_ref().map_or(0, Vec::len),
        ))
    }

    /// Interpret one input line
    pub fn handle_line(&mut self, line: &str) -> Step {
        match command::parse(line) {
            Command::Chat(text) => {
                if self.session.is_pending() {
                    return Step::Print(BUSY_TEXT.to_string());
                }
                match self.session.begin(&text) {
                    Ok(request) => Step::Send(request),
                    Err(err) => Step::Print(err.to_string()),
                }
            }
            Command::Empty => Step::Idle,
            Command::ToggleThinking => {
                let shown = self.options.toggle_thinking();
                debug!("show thinking: {}", shown);
                Step::Redraw
            }
            Command::Expand(number) => match self.message_at(number) {
                Some((id, role, true, _)) if role != Role::User && self.options.show_thinking => {
                    self.disclosure.toggle_thinking(id);
                    Step::Redraw
                }
                Some(_) if !self.options.show_thinking => {
                    Step::Print("Thinking is hidden, use /thinking to show it.".to_string())
                }
                Some(_) => Step::Print(format!("Message {} has no thinking process.", number)),
                None => Step::Print(format!("There is no message {}.", number)),
            },
            Command::Tool { message, tool } => match self.message_at(message) {
                Some((id, role, _, count))
                    if role != Role::User && tool <= count && self.options.show_thinking =>
                {
                    self.disclosure.toggle_tool(id, tool - 1);
                    Step::Redraw
                }
                Some(_) if !self.options.show_thinking => {
                    Step::Print("Thinking is hidden, use /thinking to show it.".to_string())
                }
                Some(_) => Step::Print(format!("Message {} has no tool {}.", message, tool)),
                None => Step::Print(format!("There is no message {}.", message)),
            },
            Command::Health => Step::Health,
            Command::Help => Step::Print(HELP_TEXT.to_string()),
            Command::Quit => Step::Quit,
            Command::Invalid(msg) => Step::Print(msg),
        }
    }

    /// Put a successful reply's thinking and tools on the in-flight
    /// indicator. Returns whether there is anything new to show.
    pub fn preview(&mut self, result: &Result<ChatReply>) -> Result<bool> {
        let Ok(reply) = result else {
            return Ok(false);
        };
        self.session.publish(reply)?;
        Ok(self.options.show_thinking && !self.session.side_channel().is_empty())
    }

    /// Settle the outstanding turn with the transport's result
    pub fn deliver(&mut self, result: Result<ChatReply>) -> Result<()> {
        self.session.complete(result).map(|_| ())
    }

    /// Probe the service and describe the result. A failed probe counts as
    /// unavailable.
    pub async fn check_health(&self) -> String {
        match self.session.transport().health().await {
            Ok(true) => "Chat service is healthy.".to_string(),
            Ok(false) => "Chat service is unavailable.".to_string(),
            Err(err) => {
                debug!("Health check failed: {}", err);
                "Chat service is unavailable.".to_string()
            }
        }
    }

    async fn draw<W: AsyncWrite + Unpin>(&self, output: &mut W) -> Result<()> {
        let rule = "-".repeat(self.config.width.max(20));
        let screen = self.screen();
        output.write_all(format!("{}\n", rule).as_bytes()).await?;
        if !screen.is_empty() {
            output.write_all(format!("{}\n", screen).as_bytes()).await?;
        }
        self.prompt(output).await
    }

    async fn prompt<W: AsyncWrite + Unpin>(&self, output: &mut W) -> Result<()> {
        if !self.session.is_pending() {
            output.write_all(self.config.prompt.as_bytes()).await?;
        }
        output.flush().await?;
        Ok(())
    }

    async fn print<W: AsyncWrite + Unpin>(&self, output: &mut W, text: &str) -> Result<()> {
        output.write_all(format!("{}\n", text).as_bytes()).await?;
        self.prompt(output).await
    }

    /// Drive the chat until `/quit` or end of input.
    ///
    /// At end of input an outstanding reply is still awaited and drawn.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(
            "Terminal chat started for {}",
            self.session.conversation_id()
        );
        let mut lines = input.lines();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Result<ChatReply>>();
        let mut input_closed = false;

        self.draw(&mut output).await?;

        loop {
            if input_closed && !self.session.is_pending() {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if !input_closed => {
                    let Some(line) = line? else {
                        input_closed = true;
                        continue;
                    };
                    match self.handle_line(&line) {
                        Step::Send(request) => {
                            let transport = self.session.transport();
                            let tx = reply_tx.clone();
                            tokio::spawn(async move {
                                let result = transport.post(&request).await;
                                let _ = tx.send(result);
                            });
                            self.draw(&mut output).await?;
                        }
                        Step::Redraw => self.draw(&mut output).await?,
                        Step::Print(text) => self.print(&mut output, &text).await?,
                        Step::Health => {
                            let status = self.check_health().await;
                            self.print(&mut output, &status).await?;
                        }
                        Step::Quit => break,
                        Step::Idle => self.prompt(&mut output).await?,
                    }
                }
                Some(result) = reply_rx.recv() => {
                    if self.preview(&result)? {
                        self.draw(&mut output).await?;
                        tokio::time::sleep(self.config.reveal_delay).await;
                    }
                    self.deliver(result)?;
                    self.draw(&mut output).await?;
                }
            }
        }

        if self.session.is_pending() {
            self.deliver(Err(ParleyError::cancelled("chat closed before the reply arrived")))?;
        }
        output.write_all(b"\n").await?;
        output.flush().await?;
        info!("Terminal chat ended");
        Ok(())
    }
}
