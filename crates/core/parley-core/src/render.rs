//! Message list projection
//!
//! [`render`] turns the session's messages into a [`ChatView`], a plain
//! tree that a front end draws. It holds no state; the only inputs besides
//! the messages are the "show agent thinking" switch ([`ViewOptions`]) and
//! which panels the user has expanded ([`Disclosure`]). Both belong to the
//! front end that owns the view.

use crate::session::{ChatSession, SideChannel};
use crate::types::{Message, Role, ScoreTier, ToolCall};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Label of the in-flight indicator
pub const TYPING_LABEL: &str = "Thinking...";

/// View-level switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Show reasoning traces and tool panels on assistant messages
    pub show_thinking: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_thinking: true,
        }
    }
}

impl ViewOptions {
    /// Flip the show-thinking switch
    pub fn toggle_thinking(&mut self) -> bool {
        self.show_thinking = !self.show_thinking;
        self.show_thinking
    }
}

/// Which panels are expanded. Everything starts collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disclosure {
    thinking: HashSet<Uuid>,
    tools: HashSet<(Uuid, usize)>,
}

impl Disclosure {
    /// Expand or collapse a message's reasoning trace; returns the new state
    pub fn toggle_thinking(&mut self, message: Uuid) -> bool {
        if !self.thinking.remove(&message) {
            self.thinking.insert(message);
            return true;
        }
        false
    }

    /// Expand or collapse one tool of a message; returns the new state
    pub fn toggle_tool(&mut self, message: Uuid, index: usize) -> bool {
        let key = (message, index);
        if !self.tools.remove(&key) {
            self.tools.insert(key);
            return true;
        }
        false
    }

    /// Whether a message's reasoning trace is expanded
    pub fn is_thinking_expanded(&self, message: Uuid) -> bool {
        self.thinking.contains(&message)
    }

    /// Whether one tool of a message is expanded
    pub fn is_tool_expanded(&self, message: Uuid, index: usize) -> bool {
        self.tools.contains(&(message, index))
    }
}

/// Horizontal placement of a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Left edge (assistant)
    Start,
    /// Right edge (user)
    End,
    /// Centered (system notices)
    Center,
}

impl From<Role> for Align {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Align::End,
            Role::Assistant => Align::Start,
            Role::System => Align::Center,
        }
    }
}

/// Projected message list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatView {
    /// Items top to bottom
    pub items: Vec<ViewItem>,
}

impl ChatView {
    /// Message bubbles only
    pub fn bubbles(&self) -> impl Iterator<Item = &BubbleView> {
        self.items.iter().filter_map(|item| match item {
            ViewItem::Bubble(b) => Some(b),
            ViewItem::Typing(_) => None,
        })
    }

    /// The in-flight indicator, if a request is pending
    pub fn typing(&self) -> Option<&TypingView> {
        self.items.iter().find_map(|item| match item {
            ViewItem::Typing(t) => Some(t),
            ViewItem::Bubble(_) => None,
        })
    }
}

/// One node of the view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewItem {
    /// A message
    Bubble(BubbleView),
    /// The in-flight indicator
    Typing(TypingView),
}

/// One message bubble
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleView {
    /// 1-based position in the message list, used by front-end commands
    pub number: usize,
    /// Message ID
    pub id: Uuid,
    /// Author
    pub role: Role,
    /// Placement
    pub align: Align,
    /// When the message was appended
    pub created_at: DateTime<Utc>,
    /// Message text
    pub text: String,
    /// Evaluation badges
    pub badges: Vec<Badge>,
    /// Reasoning trace panel
    pub thinking: Option<ThinkingPanel>,
    /// Tool panel
    pub tools: Option<ToolsPanel>,
}

/// One evaluation score
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    /// Metric name, capitalized for display
    pub label: String,
    /// Score in `[0, 10]`
    pub score: f64,
    /// Display band
    pub tier: ScoreTier,
}

impl Badge {
    /// `Label: score/10`
    pub fn caption(&self) -> String {
        format!("{}: {}/10", self.label, format_score(self.score))
    }
}

/// Reasoning trace disclosure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingPanel {
    /// Whether the trace is shown
    pub expanded: bool,
    /// Trace text; only present while expanded
    pub body: Option<String>,
}

impl ThinkingPanel {
    /// Text of the disclosure toggle
    pub fn toggle_label(&self) -> &'static str {
        if self.expanded {
            "Hide thinking process"
        } else {
            "Show thinking process"
        }
    }
}

/// Tools the assistant used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsPanel {
    /// One row per tool, in reply order
    pub rows: Vec<ToolRow>,
}

/// One tool in the tool panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRow {
    /// Tool name
    pub name: String,
    /// Whether details are shown
    pub expanded: bool,
    /// Pretty-printed parameters; only present while expanded
    pub parameters: Option<String>,
    /// Result text; only present while expanded and when the tool produced one
    pub result: Option<String>,
}

/// In-flight indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingView {
    /// Indicator text
    pub label: &'static str,
    /// Live reasoning trace, when shown
    pub thinking: Option<String>,
    /// Live tool names, when shown
    pub tools: Vec<String>,
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{:.1}", score)
    }
}

fn capitalize(metric: &str) -> String {
    let words: Vec<String> = metric
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}

fn tool_row(message: &Message, index: usize, tool: &ToolCall, disclosure: &Disclosure) -> ToolRow {
    let expanded = disclosure.is_tool_expanded(message.id, index);
    ToolRow {
        name: tool.name.clone(),
        expanded,
        parameters: expanded.then(|| tool.parameters_text()),
        result: (expanded && tool.has_result()).then(|| tool.result_text()),
    }
}

fn bubble(
    number: usize,
    message: &Message,
    options: ViewOptions,
    disclosure: &Disclosure,
) -> BubbleView {
    let side_channel_visible = options.show_thinking && message.role != Role::User;

    let thinking = message
        .thinking
        .as_ref()
        .filter(|_| side_channel_visible)
        .map(|trace| {
            let expanded = disclosure.is_thinking_expanded(message.id);
            ThinkingPanel {
                expanded,
                body: expanded.then(|| trace.clone()),
            }
        });

    let tools = message
        .tool_results
        .as_ref()
        .filter(|t| side_channel_visible && !t.is_empty())
        .map(|calls| ToolsPanel {
            rows: calls
                .iter()
                .enumerate()
                .map(|(i, tool)| tool_row(message, i, tool, disclosure))
                .collect(),
        });

    let badges = match (&message.evaluation, message.role) {
        (Some(scores), Role::Assistant | Role::System) => scores
            .ordered()
            .into_iter()
            .map(|(metric, score)| Badge {
                label: capitalize(metric),
                score,
                tier: ScoreTier::for_score(score),
            })
            .collect(),
        _ => Vec::new(),
    };

    BubbleView {
        number,
        id: message.id,
        role: message.role,
        align: message.role.into(),
        created_at: message.created_at,
        text: message.content.clone(),
        badges,
        thinking,
        tools,
    }
}

/// Project messages into a view.
///
/// Reasoning and tool panels appear on a non-user message only when the
/// message carries them and `options.show_thinking` is on. A pending
/// request adds a trailing [`TypingView`].
pub fn render(
    messages: &[Message],
    pending: bool,
    options: ViewOptions,
    disclosure: &Disclosure,
) -> ChatView {
    let mut items: Vec<ViewItem> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| ViewItem::Bubble(bubble(i + 1, m, options, disclosure)))
        .collect();

    if pending {
        items.push(ViewItem::Typing(TypingView {
            label: TYPING_LABEL,
            thinking: None,
            tools: Vec::new(),
        }));
    }

    ChatView { items }
}

/// Project a whole session, including the live side channel on the
/// in-flight indicator.
pub fn render_session(
    session: &ChatSession,
    options: ViewOptions,
    disclosure: &Disclosure,
) -> ChatView {
    let mut view = render(
        session.messages(),
        session.is_pending(),
        options,
        disclosure,
    );
    if options.show_thinking {
        attach_side_channel(&mut view, session.side_channel());
    }
    view
}

fn attach_side_channel(view: &mut ChatView, side: &SideChannel) {
    for item in view.items.iter_mut() {
        if let ViewItem::Typing(typing) = item {
            typing.thinking = side.thinking.clone();
            typing.tools = side.tool_calls.iter().map(|t| t.name.clone()).collect();
        }
    }
}
