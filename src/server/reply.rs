use uuid::Uuid;

/// Notice sent before closing an idle session.
pub const SESSION_TIMEOUT_NOTICE: &str = "session timeout, pop3 server signing off";

/// Generic reply for transient faults the client may retry.
pub const TEMPORARY_FAILURE: &str = "temporary failure, try again";

/// Reply status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// `+OK`
    Ok,
    /// `-ERR`
    Err,
}

impl ReplyStatus {
    fn prefix(self) -> &'static str {
        match self {
            ReplyStatus::Ok => "+OK",
            ReplyStatus::Err => "-ERR",
        }
    }
}

/// One protocol reply line, serialized as `<status> <text>\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub text: String,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Ok,
            text: text.into(),
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Err,
            text: text.into(),
        }
    }

    /// Greeting line sent on connect: the banner plus a unique token in
    /// angle brackets.
    pub fn greeting(banner: &str) -> Self {
        Self::ok(format!("{} <{}>", banner, Uuid::new_v4()))
    }

    /// Wire form of the reply, CRLF terminated.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.text.is_empty() {
            format!("{}\r\n", self.status.prefix()).into_bytes()
        } else {
            format!("{} {}\r\n", self.status.prefix(), self.text).into_bytes()
        }
    }
}
