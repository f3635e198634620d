use crate::tools::definition::ToolResult;

const PREVIEW_CHARS: usize = 200;

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => {
            let mut out = s[..cut].to_string();
            out.push('…');
            out
        }
    }
}

/// Writes one audit line per executed tool call, in execution order.
pub fn log_tool_results(results: &[ToolResult]) {
    for r in results {
        let args_preview = truncate(&r.arguments.to_string(), PREVIEW_CHARS);
        let output_preview = truncate(&r.result, PREVIEW_CHARS);
        if r.is_completed() {
            tracing::info!(
                tool = %r.name,
                tool_call_id = %r.tool_call_id,
                duration_ms = r.duration_ms.unwrap_or_default(),
                "OK {} {} -> {}",
                r.name,
                args_preview,
                output_preview
            );
        } else {
            tracing::warn!(
                tool = %r.name,
                tool_call_id = %r.tool_call_id,
                duration_ms = r.duration_ms.unwrap_or_default(),
                "ERROR {} {} -> {}",
                r.name,
                args_preview,
                output_preview
            );
        }
    }
}
