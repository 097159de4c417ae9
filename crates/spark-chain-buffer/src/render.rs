//! 分片链的人类可读转储，仅用于诊断，不构成稳定格式。

use core::fmt::Write as _;

use crate::{chain::FragmentChain, config::RenderConfig, fragment::Fragment};

/// 渲染整条链：首行为概要，其后每个分片一行。
pub(crate) fn render_chain(chain: &FragmentChain, config: &RenderConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Buffer: len={} fragments={}",
        chain.len(),
        chain.fragment_count()
    );
    for (index, fragment) in chain.fragments().iter().enumerate() {
        render_fragment(&mut out, index, fragment, config);
    }
    out
}

fn render_fragment(out: &mut String, index: usize, fragment: &Fragment, config: &RenderConfig) {
    let _ = write!(out, "  Fragment[{index}]");
    if config.show_offsets {
        let _ = write!(
            out,
            " @{}..{} of {}",
            fragment.offset(),
            fragment.offset() + fragment.len(),
            fragment.region().len()
        );
    }
    let shown = fragment.len().min(config.max_preview_bytes);
    let mut preview = vec![0u8; shown];
    let copied = fragment.copy_out(0, shown, &mut preview);
    preview.truncate(copied);

    out.push_str(": \"");
    if config.escape_non_printable {
        for byte in &preview {
            out.extend(core::ascii::escape_default(*byte).map(char::from));
        }
    } else {
        out.push_str(&String::from_utf8_lossy(&preview));
    }
    out.push('"');
    if fragment.len() > shown {
        let _ = write!(out, " ... (+{} bytes)", fragment.len() - shown);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rendering_lists_every_fragment() {
        let mut chain = FragmentChain::from("0123456789");
        let tail = chain.sub_buffer(2, 5);
        chain += &tail;
        let text = chain.to_string();
        assert_eq!(
            text,
            "Buffer: len=15 fragments=2\n  Fragment[0] @0..10 of 10: \"0123456789\"\n  Fragment[1] @2..7 of 10: \"23456\"\n"
        );
    }

    #[test]
    fn preview_is_truncated_and_escaped() {
        let chain = FragmentChain::from(b"ab\ncdef".to_vec());
        let config = RenderConfig {
            max_preview_bytes: 4,
            escape_non_printable: true,
            show_offsets: false,
        };
        assert_eq!(
            chain.render(&config),
            "Buffer: len=7 fragments=1\n  Fragment[0]: \"ab\\nc\" ... (+3 bytes)\n"
        );
    }

    #[test]
    fn escaping_covers_quotes_tabs_and_raw_bytes() {
        let chain = FragmentChain::from(b"\"\t\\\x01".to_vec());
        let config = RenderConfig {
            show_offsets: false,
            ..RenderConfig::default()
        };
        assert_eq!(
            chain.render(&config),
            "Buffer: len=4 fragments=1\n  Fragment[0]: \"\\\"\\t\\\\\\x01\"\n"
        );
    }
}
