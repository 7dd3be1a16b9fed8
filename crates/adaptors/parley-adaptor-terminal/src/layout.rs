//! Plain-text layout of a chat view

use chrono::Local;
use parley_core::{Align, BubbleView, ChatView, TypingView, ViewItem};

const INDENT: &str = "    ";

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                lines.push(head);
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn place(line: &str, align: Align, width: usize) -> String {
    let len = line.chars().count();
    let pad = width.saturating_sub(len);
    match align {
        Align::Start => line.to_string(),
        Align::End => format!("{}{}", " ".repeat(pad), line),
        Align::Center => format!("{}{}", " ".repeat(pad / 2), line),
    }
}

fn block(out: &mut Vec<String>, indent: &str, text: &str, width: usize) {
    let inner = width.saturating_sub(indent.len()).max(10);
    for line in wrap(text, inner) {
        out.push(format!("{}{}", indent, line));
    }
}

fn bubble_lines(bubble: &BubbleView, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let time = bubble.created_at.with_timezone(&Local).format("%H:%M");
    let header = match bubble.align {
        Align::End => format!("[{}] you · {}", bubble.number, time),
        Align::Start => format!("[{}] assistant · {}", bubble.number, time),
        Align::Center => format!("[{}] notice", bubble.number),
    };
    out.push(place(&header, bubble.align, width));

    let text_width = (width * 4 / 5).max(10);
    for line in wrap(&bubble.text, text_width) {
        out.push(place(&line, bubble.align, width));
    }

    if !bubble.badges.is_empty() {
        let captions: Vec<String> = bubble.badges.iter().map(|b| b.caption()).collect();
        block(&mut out, INDENT, &captions.join(" | "), width);
    }

    if let Some(panel) = &bubble.thinking {
        let marker = if panel.expanded { "v" } else { ">" };
        out.push(format!(
            "{}{} {} (/expand {})",
            INDENT,
            marker,
            panel.toggle_label(),
            bubble.number
        ));
        if let Some(body) = &panel.body {
            out.push(format!("{}  Agent Thinking Process", INDENT));
            block(&mut out, &format!("{}  ", INDENT), body, width);
        }
    }

    if let Some(tools) = &bubble.tools {
        out.push(format!("{}Tools Used:", INDENT));
        for (i, row) in tools.rows.iter().enumerate() {
            let marker = if row.expanded { "v" } else { ">" };
            out.push(format!(
                "{}  {} {} (/tool {} {})",
                INDENT,
                marker,
                row.name,
                bubble.number,
                i + 1
            ));
            let detail_indent = format!("{}      ", INDENT);
            if let Some(params) = &row.parameters {
                for line in params.lines() {
                    out.push(format!("{}{}", detail_indent, line));
                }
            }
            if let Some(result) = &row.result {
                out.push(format!("{}Result:", detail_indent));
                block(&mut out, &detail_indent, result, width);
            }
        }
    }

    out
}

fn typing_lines(typing: &TypingView, width: usize) -> Vec<String> {
    let mut out = vec![format!("... {}", typing.label)];
    if let Some(thinking) = &typing.thinking {
        block(&mut out, INDENT, thinking, width);
    }
    if !typing.tools.is_empty() {
        out.push(format!("{}Tools: {}", INDENT, typing.tools.join(", ")));
    }
    out
}

/// Lay out a whole view, one blank line between items
pub fn format_view(view: &ChatView, width: usize) -> Vec<String> {
    let width = width.max(20);
    let mut out = Vec::new();
    for (i, item) in view.items.iter().enumerate() {
        if i > 0 {
            out.push(String::new());
        }
        match item {
            ViewItem::Bubble(bubble) => out.extend(bubble_lines(bubble, width)),
            ViewItem::Typing(typing) => out.extend(typing_lines(typing, width)),
        }
    }
    out
}
