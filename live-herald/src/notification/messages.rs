//! User-facing message text (Telegram HTML).

use live_probe::{LiveRead, LiveState};

use crate::monitor::TransitionEvent;

/// Renders notification and status text for one watched stream.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    streamer_name: String,
    target_url: String,
}

impl MessageTemplates {
    pub fn new(streamer_name: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            streamer_name: streamer_name.into(),
            target_url: target_url.into(),
        }
    }

    pub fn transition(&self, event: TransitionEvent) -> String {
        let name = escape_html(&self.streamer_name);
        let url = escape_html(&self.target_url);
        match event {
            TransitionEvent::Started => {
                format!("🔴 <b>{name} is live on TikTok now!</b>\n\n{url}")
            }
            TransitionEvent::Ended => {
                format!("⚪️ <b>{name}'s TikTok live has ended.</b>\n\n{url}")
            }
        }
    }

    /// Reply to an on-demand status query.
    pub fn status(&self, read: &LiveRead) -> String {
        let name = escape_html(&self.streamer_name);
        let url = escape_html(&self.target_url);
        match read.state {
            LiveState::Live => format!("🔴 <b>{name} is live right now.</b>\n\n{url}"),
            LiveState::NotLive => format!("⚪️ {name} is not live at the moment.\n\n{url}"),
            LiveState::Unknown => {
                format!("❔ Live status unknown, try again shortly.\n\n{url}")
            }
        }
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
