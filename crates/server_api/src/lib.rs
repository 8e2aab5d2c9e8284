use shared::{
    domain::{display_name, has_files_segment, normalize_path, ResourceKind},
    error::{ApiError, ErrorCode},
    escape::url_escape,
    protocol::{HelpLink, HelpSection, NotebookPage},
};
use storage::Storage;
use tracing::debug;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Outcome of resolving a `/notebooks/<path>` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookResolution {
    /// The path names a notebook; render the page for it.
    Render { path: String, name: String },
    /// The path names a plain file, or is an intentional file-route path
    /// that has no notebook record; hand it to the file-serving route.
    RedirectToFiles { path: String },
}

/// Classifies a request path against the document store.
///
/// The lookup fetches metadata only. A miss is an error unless the path
/// carries a literal `files` segment, which marks it as a file-route path
/// that is expected to miss here.
pub async fn resolve_notebook(
    ctx: &ApiContext,
    raw_path: &str,
) -> Result<NotebookResolution, ApiError> {
    let path = normalize_path(raw_path);
    let record = ctx.storage.get(path, false).await.map_err(internal)?;

    match record {
        None if has_files_segment(path) => {
            debug!(%path, "no notebook record for file-route path, delegating");
            Ok(NotebookResolution::RedirectToFiles {
                path: path.to_string(),
            })
        }
        None => Err(ApiError::new(
            ErrorCode::NotFound,
            format!("Notebook does not exist: {path}"),
        )),
        Some(record) => match record.kind {
            ResourceKind::File => Ok(NotebookResolution::RedirectToFiles {
                path: path.to_string(),
            }),
            ResourceKind::Notebook => Ok(NotebookResolution::Render {
                name: display_name(path).to_string(),
                path: path.to_string(),
            }),
        },
    }
}

/// Builds the render context for a resolved notebook. Path and name are
/// percent-escaped here; the kernel teardown flag is always false for a
/// freshly opened page.
pub fn notebook_page(path: &str, name: &str, mathjax_url: &str) -> NotebookPage {
    NotebookPage {
        notebook_path: url_escape(path),
        notebook_name: url_escape(name),
        kill_kernel: false,
        mathjax_url: mathjax_url.to_string(),
        sections: help_sections(),
    }
}

const HELP_SECTIONS: &[&[(&str, &str, bool)]] = &[
    &[
        ("http://ipython.org/documentation.html", "IPython Help", true),
        (
            "http://nbviewer.ipython.org/github/ipython/ipython/tree/2.x/examples/Index.ipynb",
            "Notebook Help",
            true,
        ),
    ],
    &[
        ("http://docs.python.org", "Python", true),
        (
            "http://help.github.com/articles/github-flavored-markdown",
            "Markdown",
            true,
        ),
        ("http://docs.scipy.org/doc/numpy/reference/", "NumPy", true),
        ("http://docs.scipy.org/doc/scipy/reference/", "SciPy", true),
        ("http://matplotlib.org/contents.html", "Matplotlib", true),
        ("http://docs.sympy.org/latest/index.html", "SymPy", true),
        ("http://pandas.pydata.org/pandas-docs/stable/", "pandas", true),
    ],
];

/// The static help menu shown on every notebook page.
pub fn help_sections() -> Vec<HelpSection> {
    HELP_SECTIONS
        .iter()
        .map(|links| HelpSection {
            links: links
                .iter()
                .map(|(url, label, new_tab)| HelpLink {
                    url: (*url).to_string(),
                    label: (*label).to_string(),
                    new_tab: *new_tab,
                })
                .collect(),
        })
        .collect()
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
