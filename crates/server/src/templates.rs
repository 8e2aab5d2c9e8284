//! Static HTML for the notebook page.

use std::fmt::Write;

use shared::protocol::{HelpSection, NotebookPage};

/// Render the page shell around a resolved notebook identity. The notebook
/// path and name arrive percent-escaped and are HTML-escaped again on
/// interpolation; the passes compose because percent-escaped text carries
/// no HTML metacharacters.
pub fn render_notebook_page(page: &NotebookPage) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    let _ = write!(html, "<title>{}</title>\n", escape(&page.notebook_name));
    let _ = write!(
        html,
        "<script type=\"text/javascript\" \
         src=\"{}?config=TeX-AMS_HTML-full&amp;delayStartupUntil=configured\" \
         charset=\"utf-8\"></script>\n",
        escape(&page.mathjax_url),
    );
    html.push_str("</head>\n");

    let _ = write!(
        html,
        "<body class=\"notebook_app\" data-notebook-path=\"{}\" \
         data-notebook-name=\"{}\" data-kill-kernel=\"{}\">\n",
        escape(&page.notebook_path),
        escape(&page.notebook_name),
        page.kill_kernel,
    );

    render_help_menu(&mut html, &page.sections);

    html.push_str("<div id=\"main-app\">\n");
    html.push_str("<div id=\"notebook_panel\">\n<div id=\"notebook\"></div>\n</div>\n");
    html.push_str("</div>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Render the help menu: one list per section, separated in the original
/// page by a divider.
fn render_help_menu(html: &mut String, sections: &[HelpSection]) {
    html.push_str("<div id=\"header\">\n<nav id=\"help_menu\">\n");
    for section in sections {
        html.push_str("<ul>\n");
        for link in &section.links {
            let target = if link.new_tab { " target=\"_blank\"" } else { "" };
            let _ = write!(
                html,
                "<li><a href=\"{}\"{}>{}</a></li>\n",
                escape(&link.url),
                target,
                escape(&link.label),
            );
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</nav>\n</div>\n");
}

/// Escape HTML special characters.
fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
