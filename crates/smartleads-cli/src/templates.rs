//! `preview` command: render a template with sample values.

use std::path::Path;

use anyhow::Context;
use smartleads_templates::{load_template, tokens, EmailTemplate, RenderedEmail};

/// Print `path` (or the stock template) rendered with preview values.
///
/// # Errors
///
/// Returns an error if the template file cannot be read or parsed.
pub(crate) fn run_preview(path: Option<&Path>) -> anyhow::Result<()> {
    let template = match path {
        Some(path) => load_template(path)
            .with_context(|| format!("loading template {}", path.display()))?,
        None => EmailTemplate::standard(),
    };

    println!("template: {}", template.name);
    let used = placeholders(&template);
    if !used.is_empty() {
        println!("placeholders: {}", used.join(", "));
    }
    println!();
    print!("{}", format_preview(&template.preview()));
    Ok(())
}

/// Distinct placeholder names across subject and bodies, in order of first use.
fn placeholders(template: &EmailTemplate) -> Vec<String> {
    let mut seen: Vec<&str> = Vec::new();
    let sources = [
        Some(template.subject.as_str()),
        Some(template.body_html.as_str()),
        template.body_text.as_deref(),
    ];
    for token in sources.into_iter().flatten().flat_map(tokens) {
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen.into_iter().map(|t| format!("{{{t}}}")).collect()
}

fn format_preview(email: &RenderedEmail) -> String {
    let mut out = format!("Subject: {}\n\n{}\n", email.subject, email.body_html);
    if let Some(text) = &email.body_text {
        out.push_str("\n--- text ---\n");
        out.push_str(text);
        out.push('\n');
    }
    out
}
