//! Report output - renders the report stream line by line.

use sensorgrid_protocols::{Report, ReportReceiver};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::OutputFormat;
use crate::error::Result;

/// Render one report as a single line, without the newline.
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => report.to_string(),
        OutputFormat::Json => serde_json::to_string(report)?,
    })
}

/// Write every report from `rx` to `out` until all senders are gone.
///
/// Lines are flushed as they come so the stream is live. Returns the number
/// of lines written.
pub async fn write_reports<W>(mut rx: ReportReceiver, format: OutputFormat, mut out: W) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut lines = 0;
    while let Some(report) = rx.recv().await {
        let mut line = render(&report, format)?;
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        lines += 1;
    }
    Ok(lines)
}
