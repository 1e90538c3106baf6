//! Markdown to speakable text
//!
//! Replies are markdown. Before handing text to a synthesizer the markup is
//! removed so it is not read out as punctuation.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Strip markdown markup, keeping the words a listener should hear
pub fn speakable_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut in_code_block = false;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                out.push_str(" Code block. ");
            }
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) if !in_code_block => out.push_str(&text),
            Event::Code(code) => out.push_str(&code),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => out.push(' '),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
