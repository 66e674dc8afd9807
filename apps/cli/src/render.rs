//! Terminal output for progress events and results.

use std::io::Write;

use docupload_client::{DocumentReceipt, Transport, UploadConfig};
use docupload_transfer::{ChunkPlan, ProgressEvent, ProgressReporter, ProgressStage};

/// Output style selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    /// Human-readable lines on stderr.
    Text,
    /// One JSON object per line on stdout.
    Json,
}

impl Output {
    /// Builds a reporter printing every event in this style.
    pub(crate) fn reporter(self) -> ProgressReporter {
        ProgressReporter::new(move |event| {
            let line = match self {
                Output::Text => progress_line(&event),
                Output::Json => match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(_) => return,
                },
            };
            match self {
                Output::Text => eprintln!("{line}"),
                Output::Json => println!("{line}"),
            }
        })
    }

    pub(crate) fn receipt(self, receipt: &DocumentReceipt) -> anyhow::Result<()> {
        let mut out = std::io::stdout().lock();
        match self {
            Output::Text => writeln!(out, "{}", receipt_line(receipt))?,
            Output::Json => writeln!(out, "{}", serde_json::to_string(receipt)?)?,
        }
        Ok(())
    }
}

fn progress_line(event: &ProgressEvent) -> String {
    match event.stage {
        ProgressStage::Uploading => format!(
            "[{:>3}%] {} ({} / {})",
            event.percentage,
            event.message,
            human_bytes(event.loaded),
            human_bytes(event.total)
        ),
        _ => format!("[{:>3}%] {}", event.percentage, event.message),
    }
}

fn receipt_line(receipt: &DocumentReceipt) -> String {
    format!(
        "Uploaded {} as document {} via {} upload ({} passages, {:.1}s processing)",
        receipt.title,
        receipt.document_id,
        receipt.transport,
        receipt.passage_count,
        receipt.processing_time_seconds
    )
}

/// Describes how a file of `total_size` bytes would be uploaded.
pub(crate) fn plan_summary(
    file_name: &str,
    total_size: u64,
    config: &UploadConfig,
    plan: Option<ChunkPlan>,
) -> String {
    let transport = config.transport_for(total_size);
    let mut lines = vec![
        format!("file:       {file_name}"),
        format!("size:       {} ({total_size} bytes)", human_bytes(total_size)),
        format!("transport:  {transport}"),
    ];
    if let Some(plan) = plan {
        let label = match transport {
            Transport::Direct => "fallback:",
            Transport::Chunked => "chunks:",
        };
        let last = plan.chunk_len(plan.total_chunks() - 1);
        lines.push(format!(
            "{label:<11} {} x {} (last {})",
            plan.total_chunks(),
            human_bytes(plan.chunk_size()),
            human_bytes(last)
        ));
        lines.push(format!(
            "finalize:   timeout {}s",
            config.finalize_timeout(total_size).as_secs()
        ));
    }
    lines.join("\n")
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
