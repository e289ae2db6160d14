//! Embed-code generation and embedded-mode launch parameters
//!
//! The generator produces an opaque text snippet; it is never executed
//! here. Decoding is the inverse of the generator's query encoding, so a
//! persona survives the round trip through a third-party page.

use crate::config::PersonaConfig;

/// Query parameter keys understood at load time.
const MODE_KEY: &str = "mode";
const PURPOSE_KEY: &str = "purpose";
const KNOWLEDGE_KEY: &str = "simulatedUrlContent";
const QNA_KEY: &str = "customQnA";

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Please enter a website URL first")]
    MissingWebsiteUrl,
}

/// Parameters decoded from the widget's load-time query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    pub mode: Option<String>,
    pub purpose: Option<String>,
    pub knowledge_base: Option<String>,
    pub qna: Option<String>,
}

impl LaunchParams {
    /// Decode a query string (leading `?` optional). Unknown keys are
    /// ignored; undecodable values are kept verbatim.
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();

        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());

            match key {
                MODE_KEY => params.mode = Some(value),
                PURPOSE_KEY => params.purpose = Some(value),
                KNOWLEDGE_KEY => params.knowledge_base = Some(value),
                QNA_KEY => params.qna = Some(value),
                _ => {}
            }
        }

        params
    }

    /// Whether the widget was loaded inside another page. `clean` is the
    /// legacy spelling of `chat`.
    pub fn is_embedded(&self) -> bool {
        matches!(self.mode.as_deref(), Some("chat") | Some("clean"))
    }

    /// Apply URL overrides on top of a base persona. Fields absent from
    /// the query string keep their base value.
    pub fn overlay(&self, mut persona: PersonaConfig) -> PersonaConfig {
        if let Some(purpose) = &self.purpose {
            persona.purpose = purpose.clone();
        }
        if let Some(knowledge_base) = &self.knowledge_base {
            persona.knowledge_base = knowledge_base.clone();
        }
        if let Some(qna) = &self.qna {
            persona.qna = qna.clone();
        }
        persona
    }
}

/// URL the embedded iframe points at: the widget origin in chat mode with
/// the persona fields encoded as query parameters.
pub fn widget_url(origin: &str, persona: &PersonaConfig) -> String {
    format!(
        "{}?{}=chat&{}={}&{}={}&{}={}",
        origin.trim_end_matches('/'),
        MODE_KEY,
        PURPOSE_KEY,
        urlencoding::encode(&persona.purpose),
        KNOWLEDGE_KEY,
        urlencoding::encode(&persona.knowledge_base),
        QNA_KEY,
        urlencoding::encode(&persona.qna),
    )
}

/// Generate the embeddable snippet for a third-party page.
///
/// The script injects a floating toggle button and a hidden iframe, and
/// refuses to run inside the widget iframe itself (it checks both the
/// `mode` query parameter and window-vs-top identity).
pub fn embed_snippet(origin: &str, persona: &PersonaConfig) -> Result<String, EmbedError> {
    let website = persona
        .website_url
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if website.is_empty() {
        return Err(EmbedError::MissingWebsiteUrl);
    }

    let src = widget_url(origin, persona);

    Ok(format!(
        r#"<!-- Widgetlet chat for {website} -->
<script>
(function () {{
  if (window.top !== window.self) return;
  if (new URLSearchParams(window.location.search).get("{MODE_KEY}") === "chat") return;
  var frame = document.createElement("iframe");
  frame.src = "{src}";
  frame.style.cssText = "position:fixed;bottom:90px;right:20px;width:400px;height:600px;border:none;border-radius:10px;box-shadow:0 8px 24px rgba(0,0,0,0.25);display:none;z-index:99999;";
  var toggle = document.createElement("button");
  toggle.textContent = "\u{{1F4AC}}";
  toggle.setAttribute("aria-label", "Open chat");
  toggle.style.cssText = "position:fixed;bottom:20px;right:20px;width:56px;height:56px;border:none;border-radius:50%;background:#4f46e5;color:#fff;font-size:24px;cursor:pointer;z-index:99999;";
  toggle.addEventListener("click", function () {{
    frame.style.display = frame.style.display === "none" ? "block" : "none";
  }});
  document.body.appendChild(frame);
  document.body.appendChild(toggle);
}})();
</script>"#
    ))
}
