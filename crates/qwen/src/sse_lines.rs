//! Incremental JSON-lines buffering for the upstream's own streaming
//! framing, mirroring the `drain_data_lines` idiom the provider layer uses
//! for standards-compliant SSE upstreams (newline-delimited here, instead
//! of blank-line-delimited `data:` events).

/// Drains complete, non-empty lines from `buffer`, leaving any trailing
/// partial line for the next call.
pub(crate) fn drain_json_lines(buffer: &mut String) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        let line = line.trim_end_matches('\n').trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_complete_lines_and_keeps_partial() {
        let mut buf = String::from("{\"a\":1}\n{\"b\":2}\npartial");
        let lines = drain_json_lines(&mut buf);
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(buf, "partial");
    }

    #[test]
    fn skips_blank_lines() {
        let mut buf = String::from("\n\n{\"a\":1}\n");
        let lines = drain_json_lines(&mut buf);
        assert_eq!(lines, vec!["{\"a\":1}"]);
    }
}
