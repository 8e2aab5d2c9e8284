use serde::{Deserialize, Serialize};

/// One entry in the page's help menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpLink {
    pub url: String,
    pub label: String,
    pub new_tab: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpSection {
    pub links: Vec<HelpLink>,
}

/// Context handed to the notebook page template. Built once per request and
/// discarded after the response body is written; both path and name arrive
/// already percent-escaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookPage {
    pub notebook_path: String,
    pub notebook_name: String,
    pub kill_kernel: bool,
    pub mathjax_url: String,
    pub sections: Vec<HelpSection>,
}
