// Some programs output linebreaks in Windows format, and most leave a
// trailing newline behind. Both get in the way when the output is spliced
// between tag lines, so command output is normalized to UNIX linebreaks
// with trailing blank space removed before formatting.
pub fn normalize_output(raw: &str) -> String {
    raw.replace("\r\n", "\n").trim_end().to_string()
}
