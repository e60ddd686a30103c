//! Content decoding helpers: base64 payloads, HTML bodies, attachment
//! detection.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// URL-safe alphabet, padding optional (Gmail message and attachment data).
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Standard alphabet, padding optional (Graph `contentBytes`).
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Wrap width for rendered HTML. Wide enough that a labeled line is never
/// split.
const HTML_TEXT_WIDTH: usize = 1_000;

/// Decodes URL-safe base64 into text.
pub fn decode_url_safe(data: &str) -> ProviderResult<String> {
    decode_with(&URL_SAFE_LENIENT, data)
}

/// Decodes standard base64 into text.
pub fn decode_standard(data: &str) -> ProviderResult<String> {
    decode_with(&STANDARD_LENIENT, data)
}

fn decode_with(engine: &GeneralPurpose, data: &str) -> ProviderResult<String> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = engine
        .decode(compact.as_bytes())
        .map_err(|e| ProviderError::decode(format!("invalid base64: {}", e)).with_source(e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Returns true for an attachment that carries calendar markup.
pub fn is_calendar_attachment(name: Option<&str>, mime_type: Option<&str>) -> bool {
    let by_name = name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".ics"));
    let by_type = mime_type.is_some_and(|m| {
        m.split(';')
            .next()
            .is_some_and(|base| base.trim().eq_ignore_ascii_case("text/calendar"))
    });
    by_name || by_type
}

/// Reduces an HTML body to plain text, one block element per line.
///
/// Labels and their values must end up on their own lines for the free-text
/// parser; inner whitespace is collapsed and blank lines dropped.
pub fn html_to_text(html: &str) -> String {
    let rendered =
        std::panic::catch_unwind(|| html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH));
    let text = match rendered {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            debug!(error = %e, "failed to render HTML body");
            return String::new();
        }
        Err(_) => {
            debug!("HTML renderer panicked");
            return String::new();
        }
    };

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
