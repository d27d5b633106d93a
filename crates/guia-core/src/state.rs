//! UI-agnostic conversation state
//!
//! This module contains the message records shown in the chat and the
//! append-only conversation that owns them. Nothing here depends on a UI
//! framework or on the generation provider.

use std::fmt;
use uuid::Uuid;

/// Greeting every conversation starts with
pub const GREETING: &str = "Olá! Sou o assistente virtual do Guia Prático de Orientações da Fundação Faculdade de Medicina. Como posso ajudar?";

/// Opaque message identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A citation attached to a bot answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

impl Source {
    /// Text to show for this source; falls back to the uri when the title is blank
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.uri
        } else {
            &self.title
        }
    }
}

/// A single chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub sources: Vec<Source>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::User,
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn bot(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id: MessageId::new(),
            sender: Sender::Bot,
            text: text.into(),
            sources,
        }
    }
}

/// Ordered, append-only chat log seeded with the greeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::bot(GREETING, Vec::new())],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True once anything beyond the greeting has been said
    pub fn has_exchanges(&self) -> bool {
        self.messages.len() > 1
    }

    /// Plain-text transcript used by the share action.
    ///
    /// Bot turns are written as `Assistente: ...` followed by a `Fontes:`
    /// block when they carry sources, user turns as `Você: ...`. Turns are
    /// separated by a blank line.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(render_turn)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

fn render_turn(message: &Message) -> String {
    match message.sender {
        Sender::User => format!("Você: {}", message.text),
        Sender::Bot => {
            let mut turn = format!("Assistente: {}", message.text);
            if !message.sources.is_empty() {
                turn.push_str("\nFontes:\n");
                for source in &message.sources {
                    turn.push_str(&format!("- {} ({})\n", source.label(), source.uri));
                }
            }
            turn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(uri: &str, title: &str) -> Source {
        Source {
            uri: uri.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_new_conversation_has_only_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.has_exchanges());

        let seed = &conversation.messages()[0];
        assert_eq!(seed.sender, Sender::Bot);
        assert_eq!(seed.text, GREETING);
        assert!(seed.sources.is_empty());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("a");
        let b = Message::bot("b", Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_transcript_format() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("Olá"));
        conversation.push(Message::bot(
            "Oi! ...",
            vec![source("https://ffm.br/doc", "Doc")],
        ));

        let transcript = conversation.transcript();
        let lines: Vec<&str> = transcript.lines().collect();

        assert!(lines.contains(&"Você: Olá"));
        assert!(lines.contains(&"Assistente: Oi! ..."));
        assert!(lines.contains(&"Fontes:"));
        assert!(lines.contains(&"- Doc (https://ffm.br/doc)"));
        assert!(transcript.starts_with(&format!("Assistente: {}\n\nVocê: Olá\n\n", GREETING)));
    }

    #[test]
    fn test_transcript_source_without_title_uses_uri() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("pergunta"));
        conversation.push(Message::bot("resposta", vec![source("https://ffm.br/x", "")]));

        assert!(conversation
            .transcript()
            .contains("- https://ffm.br/x (https://ffm.br/x)"));
    }

    #[test]
    fn test_transcript_omits_sources_block_when_empty() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("pergunta"));
        conversation.push(Message::bot("resposta", Vec::new()));

        assert!(!conversation.transcript().contains("Fontes:"));
    }
}
