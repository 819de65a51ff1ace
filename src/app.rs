use crate::chat::{ChatClient, ChatError, FALLBACK_ERROR_TEXT};
use crate::content;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

pub struct App {
    pub should_quit: bool,
    pub chat_open: bool,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub input_cursor: usize, // char position in input
    pub loading: bool,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of transcript area for scroll calculations
    pub chat_width: u16,  // Width of transcript area for wrap calculations
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub chat_task: Option<tokio::task::JoinHandle<Result<String, ChatError>>>,
    pub client: ChatClient,
}

impl App {
    pub fn new(client: ChatClient) -> Self {
        Self {
            should_quit: false,
            chat_open: false,
            messages: vec![ChatMessage {
                role: ChatRole::Assistant,
                content: content::GREETING.to_string(),
            }],
            input: String::new(),
            input_cursor: 0,
            loading: false,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            chat_task: None,
            client,
        }
    }

    pub fn open_chat(&mut self) {
        self.chat_open = true;
        self.scroll_chat_to_bottom();
    }

    pub fn close_chat(&mut self) {
        self.chat_open = false;
    }

    pub fn push_message(&mut self, role: ChatRole, content: String) {
        self.messages.push(ChatMessage { role, content });
        self.scroll_chat_to_bottom();
    }

    /// Start one exchange: append the raw input as a user message, clear the
    /// buffer, raise the loading flag, and hand back the trimmed text to send.
    /// Returns None (and changes nothing) while a request is outstanding or
    /// the input is blank.
    pub fn begin_submission(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        let outbound = self.input.trim().to_string();
        if outbound.is_empty() {
            return None;
        }

        let raw = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.loading = true;
        self.push_message(ChatRole::User, raw);
        Some(outbound)
    }

    /// Apply the outcome of an exchange: the answer text on success, the
    /// mapped error string on failure. Always drops the loading flag.
    pub fn complete_submission(&mut self, outcome: Result<String, ChatError>) {
        let text = match outcome {
            Ok(answer) => {
                tracing::debug!("answer received ({} chars)", answer.len());
                answer
            }
            Err(err) => {
                tracing::warn!("chat request failed: {err}");
                err.user_message()
            }
        };
        self.loading = false;
        self.push_message(ChatRole::Assistant, text);
    }

    /// Reap the spawned request once it finishes. A task that died without
    /// producing an outcome still clears the loading flag.
    pub async fn poll_chat_response(&mut self) {
        let finished = self
            .chat_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.chat_task.take() {
            match task.await {
                Ok(outcome) => self.complete_submission(outcome),
                Err(err) => {
                    tracing::error!("chat task died: {err}");
                    self.loading = false;
                    self.push_message(ChatRole::Assistant, FALLBACK_ERROR_TEXT.to_string());
                }
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the transcript so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        // Counted in usize; long transcripts overflow a u16 line count
        let mut total_lines: usize = 0;

        for msg in &self.messages {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += (char_count / wrap_width) + 1;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.loading {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height as usize
        } else {
            20
        };

        self.chat_scroll = total_lines
            .saturating_sub(visible_height)
            .try_into()
            .unwrap_or(u16::MAX);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }
}
