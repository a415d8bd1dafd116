use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    /// Label used when the turn is rendered into a prompt.
    pub fn role_label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Ai => "Assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self { sender: Sender::Ai, text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub sender: Sender,
    pub text: String,
    pub timestamp: i64,
}

impl From<StoredTurn> for Turn {
    fn from(stored: StoredTurn) -> Self {
        Turn { sender: stored.sender, text: stored.text }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub turns: Vec<StoredTurn>,
}

impl Conversation {
    pub fn history(&self) -> Vec<Turn> {
        self.turns.iter().cloned().map(Turn::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&Turn::ai("hello")).unwrap();
        assert_eq!(json, r#"{"sender":"ai","text":"hello"}"#);

        let turn: Turn = serde_json::from_str(r#"{"sender":"user","text":"Hi"}"#).unwrap();
        assert_eq!(turn, Turn::user("Hi"));
    }

    #[test]
    fn unknown_sender_is_rejected() {
        let parsed = serde_json::from_str::<Turn>(r#"{"sender":"system","text":"x"}"#);
        assert!(parsed.is_err());
    }
}
