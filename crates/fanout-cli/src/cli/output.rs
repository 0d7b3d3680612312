use super::config::Format;
use fanout::Report;

/// Renders a finished run for stdout.
pub fn render(report: &Report, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Text => Ok(format!(
            "Number of words: {}\nTime to process file: {:.6} seconds",
            report.matched,
            report.elapsed.as_secs_f64()
        )),
        Format::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}
