use anyhow::{anyhow, Result};
use guia_core::Clipboard;
use tracing::warn;

/// System clipboard. The handle is kept open for the whole session since
/// X11 drops the selection when its owner goes away.
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                warn!(error = %err, "system clipboard unavailable; sharing disabled");
                None
            }
        };
        Self { inner }
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let clipboard = self
            .inner
            .as_mut()
            .ok_or_else(|| anyhow!("no system clipboard"))?;
        clipboard.set_text(text)?;
        Ok(())
    }
}
