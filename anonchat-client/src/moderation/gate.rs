use anonchat_core::ModerationVerdict;
use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

/// External content check run on every outgoing chat message.
#[async_trait]
pub trait ModerationGate: Send + Sync + 'static {
    async fn check(&self, text: &str) -> Result<ModerationVerdict>;
}

/// Run `gate` with the fail-open policy: a failing gate counts as safe.
pub async fn check_message(gate: &dyn ModerationGate, text: &str) -> ModerationVerdict {
    match gate.check(text).await {
        Ok(verdict) => verdict,
        Err(e) => {
            error!("Moderation check failed, letting message through: {:#}", e);
            ModerationVerdict::safe()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl ModerationGate for AllowAll {
    async fn check(&self, _text: &str) -> Result<ModerationVerdict> {
        Ok(ModerationVerdict::safe())
    }
}

/// Flags messages containing any of a fixed set of words (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct BlocklistGate {
    terms: Vec<String>,
}

impl BlocklistGate {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.into().to_lowercase())
                .filter(|term| !term.trim().is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl ModerationGate for BlocklistGate {
    async fn check(&self, text: &str) -> Result<ModerationVerdict> {
        let lowered = text.to_lowercase();
        let verdict = self
            .terms
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(|term| ModerationVerdict::unsafe_because(format!("contains \"{}\"", term)))
            .unwrap_or_else(ModerationVerdict::safe);
        Ok(verdict)
    }
}
